//! Flat skinning-matrix output for renderer upload

use crate::skeleton::Skeleton;
use marionette_core::{Mat4, MarionetteError, Result};

/// Upper bound on joints per skeleton; sized to a typical bone uniform array
pub const MAX_JOINTS: usize = 256;

pub const FLOATS_PER_MATRIX: usize = 16;

/// One column-major 4x4 matrix per joint, laid out back to back.
///
/// Joint `i` occupies floats `16 * i .. 16 * i + 16`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SkinningBuffer {
    data: Vec<f32>,
}

impl SkinningBuffer {
    /// A buffer of `joint_count` identity matrices
    pub fn new(joint_count: usize) -> Result<Self> {
        if joint_count > MAX_JOINTS {
            return Err(MarionetteError::TooManyJoints {
                count: joint_count,
                max: MAX_JOINTS,
            });
        }
        let mut data = Vec::with_capacity(joint_count * FLOATS_PER_MATRIX);
        for _ in 0..joint_count {
            data.extend_from_slice(&Mat4::IDENTITY.to_cols_array());
        }
        Ok(Self { data })
    }

    pub fn for_skeleton(skeleton: &Skeleton) -> Result<Self> {
        let mut buffer = Self::new(skeleton.joint_count())?;
        buffer.write_from(skeleton);
        Ok(buffer)
    }

    /// Copy every joint's animated matrix into its slot, resizing if needed
    pub fn write_from(&mut self, skeleton: &Skeleton) {
        self.data
            .resize(skeleton.joint_count() * FLOATS_PER_MATRIX, 0.0);
        for joint in skeleton.joints() {
            let offset = Self::offset_of(joint.id);
            self.data[offset..offset + FLOATS_PER_MATRIX]
                .copy_from_slice(&joint.animated_matrix().to_cols_array());
        }
    }

    pub fn offset_of(joint_id: usize) -> usize {
        joint_id * FLOATS_PER_MATRIX
    }

    pub fn joint_count(&self) -> usize {
        self.data.len() / FLOATS_PER_MATRIX
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Raw bytes, ready for a GPU buffer write
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.data)
    }

    /// Matrices as structured values, sharing the same memory
    pub fn matrices(&self) -> &[Mat4] {
        bytemuck::cast_slice(&self.data)
    }

    pub fn matrix(&self, joint_id: usize) -> Option<Mat4> {
        let offset = Self::offset_of(joint_id);
        let cols: &[f32; 16] = self
            .data
            .get(offset..offset + FLOATS_PER_MATRIX)?
            .try_into()
            .ok()?;
        Some(Mat4::from_cols_array(cols))
    }
}

//! A single node of a skeleton

use marionette_core::{Mat4, MarionetteError, Result};

/// One joint of a skeleton arena.
///
/// Parent and children are joint ids into the owning [`crate::Skeleton`];
/// a joint never owns its relatives, so the tree has no reference cycles.
#[derive(Debug, Clone)]
pub struct Joint {
    /// Stable index; also the joint's slot in the skinning buffer
    pub id: usize,
    /// Key used to match pose data
    pub name: String,
    pub(crate) parent: Option<usize>,
    pub(crate) children: Vec<usize>,
    /// Rest transform relative to the parent joint ("bone space")
    pub(crate) local_bind_matrix: Mat4,
    /// Inverse of the rest transform relative to the model origin
    pub(crate) inverse_bind_matrix: Mat4,
    /// Skinning matrix sent to the renderer, rewritten every update
    pub(crate) animated_matrix: Mat4,
}

impl Joint {
    /// `animated_matrix` starts as `compose(inverse_bind, local_bind)`; it is a
    /// placeholder until the first pose is applied.
    pub fn new(
        id: usize,
        name: impl Into<String>,
        local_bind_matrix: Mat4,
        inverse_bind_matrix: Mat4,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            parent: None,
            children: Vec::new(),
            local_bind_matrix,
            inverse_bind_matrix,
            animated_matrix: Mat4::compose(&inverse_bind_matrix, &local_bind_matrix),
        }
    }

    /// Derive this joint's inverse bind matrix from its parent's world bind
    /// matrix and return this joint's own world bind matrix for the children.
    ///
    /// Fails if the accumulated bind transform cannot be inverted.
    pub fn compute_inverse_bind_matrix(&mut self, parent_world_bind: &Mat4) -> Result<Mat4> {
        let world_bind = Mat4::compose(&self.local_bind_matrix, parent_world_bind);
        self.inverse_bind_matrix = world_bind.try_inverse().ok_or_else(|| {
            MarionetteError::SingularBindMatrix {
                joint: self.name.clone(),
                determinant: world_bind.determinant(),
            }
        })?;
        Ok(world_bind)
    }

    pub fn parent(&self) -> Option<usize> {
        self.parent
    }

    pub fn children(&self) -> &[usize] {
        &self.children
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    pub fn local_bind_matrix(&self) -> &Mat4 {
        &self.local_bind_matrix
    }

    pub fn inverse_bind_matrix(&self) -> &Mat4 {
        &self.inverse_bind_matrix
    }

    pub fn animated_matrix(&self) -> &Mat4 {
        &self.animated_matrix
    }
}

//! Joint-local transforms and whole-skeleton poses

use marionette_core::{Mat4, Quat, Vec3};
use std::collections::HashMap;

/// A joint's transform relative to its parent: translation plus rotation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointTransform {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Default for JointTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl JointTransform {
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
    };

    pub fn new(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }

    /// Split a rigid matrix into translation and rotation. Scale is dropped.
    pub fn from_matrix(m: &Mat4) -> Self {
        Self {
            position: m.translation(),
            rotation: Quat::from_mat4(m),
        }
    }

    /// `translation * rotation`: rotate about the joint origin, then translate
    pub fn local_matrix(&self) -> Mat4 {
        Mat4::compose(
            &self.rotation.to_mat4(),
            &Mat4::from_translation(self.position),
        )
    }

    /// Position lerp and quaternion nlerp; `step` is not clamped
    pub fn interpolate(a: &JointTransform, b: &JointTransform, step: f32) -> JointTransform {
        JointTransform {
            position: Vec3::lerp(a.position, b.position, step),
            rotation: Quat::interpolate(&a.rotation, &b.rotation, step),
        }
    }
}

/// One instant's local transforms, keyed by joint name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pose {
    transforms: HashMap<String, JointTransform>,
}

impl Pose {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a joint's transform, replacing any previous entry for that name
    pub fn insert(&mut self, joint: impl Into<String>, transform: JointTransform) {
        self.transforms.insert(joint.into(), transform);
    }

    pub fn with(mut self, joint: impl Into<String>, transform: JointTransform) -> Self {
        self.insert(joint, transform);
        self
    }

    pub fn get(&self, joint: &str) -> Option<&JointTransform> {
        self.transforms.get(joint)
    }

    pub fn contains(&self, joint: &str) -> bool {
        self.transforms.contains_key(joint)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &JointTransform)> {
        self.transforms.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }
}

impl FromIterator<(String, JointTransform)> for Pose {
    fn from_iter<I: IntoIterator<Item = (String, JointTransform)>>(iter: I) -> Self {
        Self {
            transforms: iter.into_iter().collect(),
        }
    }
}

/// A pose resolved against one skeleton: slot `i` belongs to joint id `i`.
///
/// `None` means the pose has no entry for that joint and it stays at its
/// bind transform.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedPose {
    transforms: Vec<Option<JointTransform>>,
}

impl ResolvedPose {
    /// A pose with no entries for `joint_count` joints (the bind pose)
    pub fn empty(joint_count: usize) -> Self {
        Self {
            transforms: vec![None; joint_count],
        }
    }

    pub fn get(&self, joint_id: usize) -> Option<&JointTransform> {
        self.transforms.get(joint_id).and_then(Option::as_ref)
    }

    pub fn set(&mut self, joint_id: usize, transform: JointTransform) {
        if joint_id >= self.transforms.len() {
            self.transforms.resize(joint_id + 1, None);
        }
        self.transforms[joint_id] = Some(transform);
    }

    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Option<&JointTransform>> {
        self.transforms.iter().map(Option::as_ref)
    }
}

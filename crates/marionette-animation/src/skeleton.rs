//! Joint hierarchy with bind pose and per-frame skinning matrices
//!
//! The pipeline:
//! 1. [`SkeletonBuilder`] collects joints and parent links
//! 2. `build()` validates the tree and derives every inverse bind matrix once,
//!    top-down from the root
//! 3. [`Skeleton::apply_pose`] walks the hierarchy root-to-leaf every frame:
//!    `world[i] = compose(local[i], world[parent[i]])`
//! 4. Final: `animated[i] = compose(inverse_bind[i], world[i])`

use crate::joint::Joint;
use crate::pose::ResolvedPose;
use crate::skinning::MAX_JOINTS;
use marionette_core::{Mat4, MarionetteError, Result};
use std::collections::{BTreeMap, HashMap};

/// Collects joints and links before a [`Skeleton`] exists.
///
/// Inverse bind matrices depend on every ancestor, so they are only derived
/// in [`SkeletonBuilder::build`], after the tree is complete.
#[derive(Debug, Default)]
pub struct SkeletonBuilder {
    name: String,
    joints: BTreeMap<usize, Joint>,
}

impl SkeletonBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            joints: BTreeMap::new(),
        }
    }

    /// Add an unattached joint with its parent-relative rest transform
    pub fn add_joint(
        &mut self,
        id: usize,
        name: impl Into<String>,
        local_bind_matrix: Mat4,
    ) -> Result<&mut Self> {
        let name = name.into();
        if self.joints.contains_key(&id) {
            return Err(MarionetteError::InvalidSkeleton(format!(
                "Duplicate joint id {} ('{}')",
                id, name
            )));
        }
        if self.joints.values().any(|j| j.name == name) {
            return Err(MarionetteError::InvalidSkeleton(format!(
                "Duplicate joint name '{}'",
                name
            )));
        }
        if !local_bind_matrix.is_finite() {
            return Err(MarionetteError::InvalidSkeleton(format!(
                "Joint '{}' has a non-finite bind transform",
                name
            )));
        }
        self.joints
            .insert(id, Joint::new(id, name, local_bind_matrix, Mat4::IDENTITY));
        Ok(self)
    }

    /// Make `child` (currently parentless) a child of `parent`
    pub fn attach(&mut self, parent: usize, child: usize) -> Result<&mut Self> {
        self.check_link(parent, child)?;
        if let Some(existing) = self.joints[&child].parent {
            return Err(MarionetteError::InvalidSkeleton(format!(
                "Joint {} already has parent {}",
                child, existing
            )));
        }
        self.link(parent, child);
        Ok(self)
    }

    /// Move `child` under `new_parent`, detaching it from its old parent
    pub fn reparent(&mut self, child: usize, new_parent: usize) -> Result<&mut Self> {
        self.check_link(new_parent, child)?;
        let old = self.joints[&child].parent;
        if let Some(old) = old {
            if let Some(old_parent) = self.joints.get_mut(&old) {
                old_parent.children.retain(|&c| c != child);
            }
        }
        self.link(new_parent, child);
        Ok(self)
    }

    fn check_link(&self, parent: usize, child: usize) -> Result<()> {
        for id in [parent, child] {
            if !self.joints.contains_key(&id) {
                return Err(MarionetteError::UnknownJoint(format!("id {}", id)));
            }
        }
        // Walk up from the new parent; meeting the child would close a loop
        let mut cursor = Some(parent);
        while let Some(id) = cursor {
            if id == child {
                return Err(MarionetteError::InvalidSkeleton(format!(
                    "Linking joint {} under {} would create a cycle",
                    child, parent
                )));
            }
            cursor = self.joints[&id].parent;
        }
        Ok(())
    }

    fn link(&mut self, parent: usize, child: usize) {
        if let Some(c) = self.joints.get_mut(&child) {
            c.parent = Some(parent);
        }
        if let Some(p) = self.joints.get_mut(&parent) {
            p.children.push(child);
        }
    }

    pub fn joint_count(&self) -> usize {
        self.joints.len()
    }

    /// Validate the hierarchy and derive inverse bind matrices.
    ///
    /// Requires dense ids `0..n`, exactly one root and every joint reachable
    /// from it. Fails fast on a singular bind transform.
    pub fn build(self) -> Result<Skeleton> {
        let count = self.joints.len();
        if count == 0 {
            return Err(MarionetteError::InvalidSkeleton(format!(
                "Skeleton '{}' has no joints",
                self.name
            )));
        }
        if count > MAX_JOINTS {
            return Err(MarionetteError::TooManyJoints {
                count,
                max: MAX_JOINTS,
            });
        }
        // BTreeMap keys are sorted, so dense ids means the last key is n - 1
        if let Some((&last, _)) = self.joints.last_key_value() {
            if last != count - 1 {
                return Err(MarionetteError::InvalidSkeleton(format!(
                    "Skeleton '{}' joint ids must be 0..{}, found id {}",
                    self.name, count, last
                )));
            }
        }

        let joints: Vec<Joint> = self.joints.into_values().collect();
        let roots: Vec<usize> = joints.iter().filter(|j| j.is_root()).map(|j| j.id).collect();
        let root = match roots.as_slice() {
            [root] => *root,
            [] => {
                return Err(MarionetteError::InvalidSkeleton(format!(
                    "Skeleton '{}' has no root joint",
                    self.name
                )))
            }
            _ => {
                return Err(MarionetteError::InvalidSkeleton(format!(
                    "Skeleton '{}' has {} root joints {:?}, expected one",
                    self.name,
                    roots.len(),
                    roots
                )))
            }
        };

        let traversal = depth_first_order(&joints, root);
        if traversal.len() != count {
            return Err(MarionetteError::InvalidSkeleton(format!(
                "Skeleton '{}' has {} joints unreachable from root '{}'",
                self.name,
                count - traversal.len(),
                joints[root].name
            )));
        }

        let ids_by_name = joints.iter().map(|j| (j.name.clone(), j.id)).collect();
        let mut skeleton = Skeleton {
            name: self.name,
            joints,
            root,
            ids_by_name,
            traversal,
            world_scratch: vec![Mat4::IDENTITY; count],
            animated_scratch: vec![Mat4::IDENTITY; count],
        };
        skeleton.compute_inverse_bind_matrices()?;
        Ok(skeleton)
    }
}

/// Ids in depth-first pre-order: every parent precedes its children
fn depth_first_order(joints: &[Joint], root: usize) -> Vec<usize> {
    let mut order = Vec::with_capacity(joints.len());
    let mut stack = vec![root];
    while let Some(id) = stack.pop() {
        order.push(id);
        // Reverse so the first child is visited first
        stack.extend(joints[id].children.iter().rev().copied());
    }
    order
}

/// A validated joint tree, stored as an arena indexed by joint id
#[derive(Debug, Clone)]
pub struct Skeleton {
    name: String,
    joints: Vec<Joint>,
    root: usize,
    ids_by_name: HashMap<String, usize>,
    traversal: Vec<usize>,
    world_scratch: Vec<Mat4>,
    animated_scratch: Vec<Mat4>,
}

impl Skeleton {
    pub fn builder(name: impl Into<String>) -> SkeletonBuilder {
        SkeletonBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn joint_count(&self) -> usize {
        self.joints.len()
    }

    /// All joints; position in the slice equals joint id
    pub fn joints(&self) -> &[Joint] {
        &self.joints
    }

    pub fn joint(&self, id: usize) -> Option<&Joint> {
        self.joints.get(id)
    }

    pub fn joint_id(&self, name: &str) -> Option<usize> {
        self.ids_by_name.get(name).copied()
    }

    pub fn joint_by_name(&self, name: &str) -> Option<&Joint> {
        self.joint_id(name).map(|id| &self.joints[id])
    }

    pub fn root(&self) -> &Joint {
        &self.joints[self.root]
    }

    /// Joint ids with every parent before its children
    pub fn traversal_order(&self) -> &[usize] {
        &self.traversal
    }

    /// Current animated matrices in joint-id order
    pub fn skinning_matrices(&self) -> impl Iterator<Item = &Mat4> {
        self.joints.iter().map(|j| &j.animated_matrix)
    }

    /// Accumulated rest transform of a joint relative to the model origin
    pub fn world_bind_matrix(&self, id: usize) -> Option<Mat4> {
        let mut joint = self.joints.get(id)?;
        let mut world = joint.local_bind_matrix;
        while let Some(parent) = joint.parent {
            joint = &self.joints[parent];
            world = Mat4::compose(&world, &joint.local_bind_matrix);
        }
        Some(world)
    }

    fn compute_inverse_bind_matrices(&mut self) -> Result<()> {
        // Traversal order guarantees the parent's world bind is ready
        let mut world_bind = vec![Mat4::IDENTITY; self.joints.len()];
        for &id in &self.traversal {
            let parent_world = match self.joints[id].parent {
                Some(parent) => world_bind[parent],
                None => Mat4::IDENTITY,
            };
            world_bind[id] = self.joints[id].compute_inverse_bind_matrix(&parent_world)?;
        }
        Ok(())
    }

    /// Apply a pose root-to-leaf and rewrite every joint's animated matrix.
    ///
    /// Joints without an entry in `pose` keep their bind transform. Results
    /// are staged first and only committed if all of them are finite; on
    /// failure the previous matrices are left untouched and `false` is
    /// returned.
    pub fn apply_pose(&mut self, pose: &ResolvedPose) -> bool {
        for &id in &self.traversal {
            let joint = &self.joints[id];
            let local = pose
                .get(id)
                .map(|t| t.local_matrix())
                .unwrap_or(joint.local_bind_matrix);
            let current = match joint.parent {
                Some(parent) => Mat4::compose(&local, &self.world_scratch[parent]),
                None => local,
            };
            self.world_scratch[id] = current;
            self.animated_scratch[id] = Mat4::compose(&joint.inverse_bind_matrix, &current);
        }

        if !self.animated_scratch.iter().all(Mat4::is_finite) {
            return false;
        }
        for (joint, animated) in self.joints.iter_mut().zip(&self.animated_scratch) {
            joint.animated_matrix = *animated;
        }
        true
    }

    /// Put every joint back at its rest pose (identity skinning)
    pub fn reset_to_bind_pose(&mut self) {
        let bind = ResolvedPose::empty(self.joint_count());
        self.apply_pose(&bind);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::JointTransform;
    use marionette_core::{Quat, Vec3};
    use std::f32::consts::FRAC_PI_2;

    fn up(y: f32) -> Mat4 {
        Mat4::from_translation(Vec3::new(0.0, y, 0.0))
    }

    /// root -> child -> grandchild, with the given local offsets along Y
    fn chain(offsets: [f32; 3]) -> Skeleton {
        let mut b = Skeleton::builder("chain");
        b.add_joint(0, "root", up(offsets[0])).unwrap();
        b.add_joint(1, "child", up(offsets[1])).unwrap();
        b.add_joint(2, "grandchild", up(offsets[2])).unwrap();
        b.attach(0, 1).unwrap();
        b.attach(1, 2).unwrap();
        b.build().unwrap()
    }

    #[test]
    fn grandchild_inverse_bind_cancels_accumulated_offset() {
        let skel = chain([0.0, 1.0, 1.0]);
        let ibm = skel.joint(2).unwrap().inverse_bind_matrix();
        assert!(ibm.approx_eq(&up(-2.0), 1e-6), "{:?}", ibm);
    }

    #[test]
    fn inverse_bind_includes_root_offset() {
        let skel = chain([1.0, 1.0, 1.0]);
        assert!(skel.joint(0).unwrap().inverse_bind_matrix().approx_eq(&up(-1.0), 1e-6));
        assert!(skel.joint(2).unwrap().inverse_bind_matrix().approx_eq(&up(-3.0), 1e-6));
    }

    #[test]
    fn root_inverse_bind_is_inverse_of_local() {
        let local = Mat4::from_translation_rotation_scale(
            Vec3::new(1.0, 2.0, 3.0),
            Quat::from_axis_angle(Vec3::Y, 0.7),
            Vec3::ONE,
        );
        let mut b = Skeleton::builder("single");
        b.add_joint(0, "root", local).unwrap();
        let skel = b.build().unwrap();
        let ibm = skel.root().inverse_bind_matrix();
        assert!(ibm.approx_eq(&local.inverse(), 1e-6));
    }

    #[test]
    fn inverse_bind_times_world_bind_is_identity() {
        let mut b = Skeleton::builder("arm");
        b.add_joint(0, "shoulder", Mat4::from_rotation_z(0.4)).unwrap();
        b.add_joint(
            1,
            "elbow",
            Mat4::compose(&Mat4::from_rotation_x(0.3), &up(2.0)),
        )
        .unwrap();
        b.attach(0, 1).unwrap();
        let skel = b.build().unwrap();
        let world = skel.world_bind_matrix(1).unwrap();
        let ibm = skel.joint(1).unwrap().inverse_bind_matrix();
        assert!(Mat4::compose(ibm, &world).approx_eq(&Mat4::IDENTITY, 1e-5));
    }

    #[test]
    fn bind_pose_yields_identity_skinning() {
        let mut skel = chain([1.0, 2.0, 0.5]);
        skel.reset_to_bind_pose();
        for joint in skel.joints() {
            assert!(joint.animated_matrix().approx_eq(&Mat4::IDENTITY, 1e-5));
        }
    }

    #[test]
    fn single_root_posed_at_bind_transform_has_no_net_skinning() {
        let local = up(1.5);
        let mut b = Skeleton::builder("single");
        b.add_joint(0, "root", local).unwrap();
        let mut skel = b.build().unwrap();

        let mut pose = ResolvedPose::empty(1);
        pose.set(0, JointTransform::from_matrix(&local));
        assert!(skel.apply_pose(&pose));

        let joint = skel.root();
        let expected = Mat4::compose(joint.inverse_bind_matrix(), joint.local_bind_matrix());
        assert!(joint.animated_matrix().approx_eq(&expected, 1e-6));
        assert!(joint.animated_matrix().approx_eq(&Mat4::IDENTITY, 1e-6));
    }

    #[test]
    fn identity_pose_leaves_inverse_bind() {
        let mut skel = chain([1.0, 0.0, 0.0]);
        let mut pose = ResolvedPose::empty(3);
        pose.set(0, JointTransform::IDENTITY);
        skel.apply_pose(&pose);
        let root = skel.root();
        assert!(root.animated_matrix().approx_eq(root.inverse_bind_matrix(), 1e-6));
    }

    #[test]
    fn posed_parent_moves_children() {
        let mut skel = chain([0.0, 1.0, 1.0]);
        let mut pose = ResolvedPose::empty(3);
        // Rotate the root a quarter turn about Z; the others hold bind pose
        pose.set(
            0,
            JointTransform::new(Vec3::ZERO, Quat::from_axis_angle(Vec3::Z, FRAC_PI_2)),
        );
        assert!(skel.apply_pose(&pose));
        // The grandchild's rest position (0, 2, 0) swings to (-2, 0, 0)
        let rest = Vec3::new(0.0, 2.0, 0.0);
        let moved = skel.joint(2).unwrap().animated_matrix().transform_point3(rest);
        assert!(moved.approx_eq(&Vec3::new(-2.0, 0.0, 0.0), 1e-5), "{:?}", moved);
    }

    #[test]
    fn non_finite_pose_is_not_committed() {
        let mut skel = chain([0.0, 1.0, 1.0]);
        skel.reset_to_bind_pose();
        let mut pose = ResolvedPose::empty(3);
        pose.set(
            1,
            JointTransform::new(Vec3::new(f32::NAN, 0.0, 0.0), Quat::IDENTITY),
        );
        assert!(!skel.apply_pose(&pose));
        for joint in skel.joints() {
            assert!(joint.animated_matrix().approx_eq(&Mat4::IDENTITY, 1e-5));
        }
    }

    #[test]
    fn traversal_visits_parents_first() {
        let mut b = Skeleton::builder("branch");
        for (id, name) in ["hips", "spine", "leg_l", "leg_r", "head"].iter().enumerate() {
            b.add_joint(id, *name, Mat4::IDENTITY).unwrap();
        }
        b.attach(0, 1).unwrap();
        b.attach(0, 2).unwrap();
        b.attach(0, 3).unwrap();
        b.attach(1, 4).unwrap();
        let skel = b.build().unwrap();
        assert_eq!(skel.traversal_order(), &[0, 1, 4, 2, 3]);
        assert_eq!(skel.joint_id("head"), Some(4));
        assert_eq!(skel.joint_by_name("leg_r").unwrap().parent(), Some(0));
    }

    #[test]
    fn reparent_moves_child_between_lists() {
        let mut b = Skeleton::builder("re");
        for id in 0..3 {
            b.add_joint(id, format!("j{}", id), Mat4::IDENTITY).unwrap();
        }
        b.attach(0, 1).unwrap();
        b.attach(0, 2).unwrap();
        b.reparent(2, 1).unwrap();
        let skel = b.build().unwrap();
        assert_eq!(skel.joint(0).unwrap().children(), &[1]);
        assert_eq!(skel.joint(1).unwrap().children(), &[2]);
        assert_eq!(skel.joint(2).unwrap().parent(), Some(1));
    }

    #[test]
    fn reject_cycles() {
        let mut b = Skeleton::builder("loop");
        b.add_joint(0, "a", Mat4::IDENTITY).unwrap();
        b.add_joint(1, "b", Mat4::IDENTITY).unwrap();
        b.attach(0, 1).unwrap();
        assert!(b.reparent(0, 1).is_err());
        assert!(b.attach(1, 1).is_err());
    }

    #[test]
    fn reject_double_attach() {
        let mut b = Skeleton::builder("twice");
        for id in 0..3 {
            b.add_joint(id, format!("j{}", id), Mat4::IDENTITY).unwrap();
        }
        b.attach(0, 2).unwrap();
        assert!(b.attach(1, 2).is_err());
    }

    #[test]
    fn reject_duplicates_and_gaps() {
        let mut b = Skeleton::builder("dup");
        b.add_joint(0, "a", Mat4::IDENTITY).unwrap();
        assert!(b.add_joint(0, "b", Mat4::IDENTITY).is_err());
        assert!(b.add_joint(1, "a", Mat4::IDENTITY).is_err());

        let mut gap = Skeleton::builder("gap");
        gap.add_joint(0, "a", Mat4::IDENTITY).unwrap();
        gap.add_joint(2, "c", Mat4::IDENTITY).unwrap();
        gap.attach(0, 2).unwrap();
        assert!(gap.build().is_err());
    }

    #[test]
    fn reject_multiple_roots_and_empty() {
        let mut b = Skeleton::builder("forest");
        b.add_joint(0, "a", Mat4::IDENTITY).unwrap();
        b.add_joint(1, "b", Mat4::IDENTITY).unwrap();
        let err = b.build().unwrap_err();
        assert!(err.to_string().contains("2 root joints"));

        assert!(Skeleton::builder("empty").build().is_err());
    }

    #[test]
    fn singular_bind_fails_build() {
        let mut b = Skeleton::builder("flat");
        b.add_joint(0, "root", Mat4::IDENTITY).unwrap();
        b.add_joint(1, "squashed", Mat4::from_scale(Vec3::new(1.0, 0.0, 1.0)))
            .unwrap();
        b.attach(0, 1).unwrap();
        let err = b.build().unwrap_err();
        assert!(matches!(err, MarionetteError::SingularBindMatrix { .. }));
    }
}

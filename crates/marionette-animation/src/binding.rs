//! Resolve a clip's joint names against one skeleton
//!
//! Clips address joints by name so they can be shared between rigs. Playback
//! works on ids, so every keyframe pose is resolved once when a clip starts
//! rather than on every frame.

use crate::clip::Animation;
use crate::pose::ResolvedPose;
use crate::skeleton::Skeleton;
use std::collections::BTreeSet;
use std::sync::Arc;

/// How well a clip's joint names matched a skeleton
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BindReport {
    pub clip: String,
    /// Skeleton joints no keyframe mentions; they hold their bind pose
    pub missing_joints: Vec<String>,
    /// Names in the clip that the skeleton does not have; ignored
    pub unknown_joints: Vec<String>,
}

impl BindReport {
    pub fn is_complete(&self) -> bool {
        self.missing_joints.is_empty() && self.unknown_joints.is_empty()
    }
}

/// An [`Animation`] with every keyframe resolved to joint ids
#[derive(Debug, Clone)]
pub struct BoundClip {
    animation: Arc<Animation>,
    poses: Vec<ResolvedPose>,
    report: BindReport,
}

impl BoundClip {
    pub fn bind(animation: Arc<Animation>, skeleton: &Skeleton) -> Self {
        let joint_count = skeleton.joint_count();
        let mut mentioned = vec![false; joint_count];
        let mut unknown = BTreeSet::new();

        let poses = animation
            .keyframes()
            .iter()
            .map(|keyframe| {
                let mut resolved = ResolvedPose::empty(joint_count);
                for (name, transform) in keyframe.pose.iter() {
                    match skeleton.joint_id(name) {
                        Some(id) => {
                            resolved.set(id, *transform);
                            mentioned[id] = true;
                        }
                        None => {
                            unknown.insert(name.to_string());
                        }
                    }
                }
                resolved
            })
            .collect();

        let missing_joints: Vec<String> = skeleton
            .joints()
            .iter()
            .filter(|j| !mentioned[j.id])
            .map(|j| j.name.clone())
            .collect();
        let report = BindReport {
            clip: animation.name().to_string(),
            missing_joints,
            unknown_joints: unknown.into_iter().collect(),
        };

        if !report.unknown_joints.is_empty() {
            log::warn!(
                "Clip '{}' names joints not in skeleton '{}': {:?}",
                report.clip,
                skeleton.name(),
                report.unknown_joints
            );
        }
        if !report.missing_joints.is_empty() {
            log::debug!(
                "Clip '{}' leaves {} joint(s) of '{}' at bind pose: {:?}",
                report.clip,
                report.missing_joints.len(),
                skeleton.name(),
                report.missing_joints
            );
        }
        log::debug!(
            "Bound clip '{}' ({} keyframes) to skeleton '{}'",
            report.clip,
            animation.keyframes().len(),
            skeleton.name()
        );

        Self {
            animation,
            poses,
            report,
        }
    }

    pub fn animation(&self) -> &Arc<Animation> {
        &self.animation
    }

    /// Resolved pose of keyframe `index`
    pub fn pose(&self, index: usize) -> Option<&ResolvedPose> {
        self.poses.get(index)
    }

    pub fn poses(&self) -> &[ResolvedPose] {
        &self.poses
    }

    pub fn report(&self) -> &BindReport {
        &self.report
    }
}

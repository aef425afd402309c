//! TOML-based skeleton and clip loading

use crate::clip::{Animation, Keyframe};
use crate::pose::{JointTransform, Pose};
use crate::skeleton::Skeleton;
use marionette_core::{Mat4, MarionetteError, Quat, Result, Vec3};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// On-disk form of a skeleton (`*.skel.toml`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkeletonDesc {
    pub name: String,
    #[serde(default)]
    pub joints: Vec<JointDesc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JointDesc {
    pub id: usize,
    pub name: String,
    #[serde(default)]
    pub parent: Option<usize>,
    #[serde(default)]
    pub translation: [f32; 3],
    /// Quaternion as `[x, y, z, w]`
    #[serde(default = "identity_rotation")]
    pub rotation: [f32; 4],
    #[serde(default = "unit_scale")]
    pub scale: [f32; 3],
}

impl JointDesc {
    pub fn local_bind_matrix(&self) -> Mat4 {
        Mat4::from_translation_rotation_scale(
            Vec3::from_array(self.translation),
            Quat::from_array(self.rotation),
            Vec3::from_array(self.scale),
        )
    }
}

/// On-disk form of a clip (`*.anim.toml`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClipDesc {
    pub name: String,
    pub length_in_seconds: f64,
    #[serde(default)]
    pub keyframes: Vec<KeyframeDesc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyframeDesc {
    pub timestamp: f64,
    #[serde(default)]
    pub pose: BTreeMap<String, JointTransformDesc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JointTransformDesc {
    #[serde(default)]
    pub position: [f32; 3],
    #[serde(default = "identity_rotation")]
    pub rotation: [f32; 4],
}

impl From<&JointTransformDesc> for JointTransform {
    fn from(desc: &JointTransformDesc) -> Self {
        JointTransform::new(
            Vec3::from_array(desc.position),
            Quat::from_array(desc.rotation),
        )
    }
}

fn identity_rotation() -> [f32; 4] {
    [0.0, 0.0, 0.0, 1.0]
}

fn unit_scale() -> [f32; 3] {
    [1.0, 1.0, 1.0]
}

/// Load and build a skeleton from a `.skel.toml` file.
///
/// ```toml
/// name = "arm"
///
/// [[joints]]
/// id = 0
/// name = "shoulder"
///
/// [[joints]]
/// id = 1
/// name = "elbow"
/// parent = 0
/// translation = [0.0, 1.0, 0.0]
/// rotation = [0.0, 0.0, 0.0, 1.0]
/// ```
pub fn load_skeleton_from_file(path: &Path) -> Result<Skeleton> {
    let content = read(path)?;
    load_skeleton_from_str(&content, path)
}

/// Parse a skeleton from TOML; `path` is only used in error messages
pub fn load_skeleton_from_str(content: &str, path: &Path) -> Result<Skeleton> {
    let desc: SkeletonDesc = toml::from_str(content).map_err(|e| {
        MarionetteError::TomlParseError(format!("Failed to parse {}: {}", path.display(), e))
    })?;
    skeleton_from_desc(&desc).map_err(|e| in_file(e, path))
}

pub fn skeleton_from_desc(desc: &SkeletonDesc) -> Result<Skeleton> {
    let mut builder = Skeleton::builder(desc.name.clone());
    for joint in &desc.joints {
        builder.add_joint(joint.id, joint.name.clone(), joint.local_bind_matrix())?;
    }
    for joint in &desc.joints {
        if let Some(parent) = joint.parent {
            builder.attach(parent, joint.id)?;
        }
    }
    builder.build()
}

/// Load a clip from a `.anim.toml` file.
///
/// ```toml
/// name = "wave"
/// length_in_seconds = 2.0
///
/// [[keyframes]]
/// timestamp = 0.0
///
/// [keyframes.pose.elbow]
/// position = [0.0, 1.0, 0.0]
/// rotation = [0.0, 0.0, 0.0, 1.0]
/// ```
pub fn load_clip_from_file(path: &Path) -> Result<Animation> {
    let content = read(path)?;
    load_clip_from_str(&content, path)
}

/// Parse a clip from TOML; `path` is only used in error messages
pub fn load_clip_from_str(content: &str, path: &Path) -> Result<Animation> {
    let desc: ClipDesc = toml::from_str(content).map_err(|e| {
        MarionetteError::TomlParseError(format!("Failed to parse {}: {}", path.display(), e))
    })?;
    clip_from_desc(&desc).map_err(|e| in_file(e, path))
}

pub fn clip_from_desc(desc: &ClipDesc) -> Result<Animation> {
    let keyframes = desc
        .keyframes
        .iter()
        .map(|k| {
            let pose: Pose = k
                .pose
                .iter()
                .map(|(name, t)| (name.clone(), JointTransform::from(t)))
                .collect();
            Keyframe::new(k.timestamp, pose)
        })
        .collect();
    Animation::new(desc.name.clone(), keyframes, desc.length_in_seconds)
}

fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| {
        MarionetteError::AssetError(format!("Failed to read {}: {}", path.display(), e))
    })
}

/// Prefix validation errors with the file they came from
fn in_file(err: MarionetteError, path: &Path) -> MarionetteError {
    let at = |msg: String| format!("{}: {}", path.display(), msg);
    match err {
        MarionetteError::InvalidSkeleton(msg) => MarionetteError::InvalidSkeleton(at(msg)),
        MarionetteError::InvalidClip(msg) => MarionetteError::InvalidClip(at(msg)),
        MarionetteError::UnknownJoint(msg) => MarionetteError::UnknownJoint(at(msg)),
        other => other,
    }
}

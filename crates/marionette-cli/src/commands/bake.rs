//! Clip baking command

use anyhow::{Context, Result};
use marionette_animation::loader::{load_clip_from_file, load_skeleton_from_file};
use marionette_animation::{Animation, Animator, FrameOutcome, Skeleton, SkinningBuffer};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

pub struct BakeArgs {
    pub skeleton: String,
    pub clip: String,
    pub fps: u32,
    pub frames: Option<u32>,
    pub format: String,
}

/// One sampled frame of skinning output
#[derive(Debug, Serialize)]
pub struct BakedFrame {
    pub frame: u32,
    pub time: f64,
    /// Column-major matrices, one per joint id
    pub matrices: Vec<[f32; 16]>,
}

#[derive(Debug, Serialize)]
pub struct BakedClip {
    pub skeleton: String,
    pub clip: String,
    pub fps: u32,
    pub joints: Vec<String>,
    pub frames: Vec<BakedFrame>,
}

pub fn run(args: BakeArgs) -> Result<()> {
    if args.fps == 0 {
        anyhow::bail!("--fps must be at least 1");
    }
    let skeleton = load_skeleton_from_file(Path::new(&args.skeleton))
        .with_context(|| format!("Failed to load skeleton {}", args.skeleton))?;
    let clip = load_clip_from_file(Path::new(&args.clip))
        .with_context(|| format!("Failed to load clip {}", args.clip))?;

    let baked = bake(skeleton, clip, args.fps, args.frames)?;

    match args.format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&baked)?),
        "text" => print!("{}", format_text(&baked)),
        other => anyhow::bail!("Unknown format: {}", other),
    }
    Ok(())
}

/// Sample `clip` at `1 / fps` second intervals, starting at time zero
pub fn bake(skeleton: Skeleton, clip: Animation, fps: u32, frames: Option<u32>) -> Result<BakedClip> {
    let dt = 1.0 / f64::from(fps);
    let frames = frames
        .unwrap_or_else(|| (clip.length_in_seconds() * f64::from(fps)).ceil() as u32)
        .max(1);

    let joints = skeleton.joints().iter().map(|j| j.name.clone()).collect();
    let skeleton_name = skeleton.name().to_string();
    let clip_name = clip.name().to_string();

    let mut animator = Animator::new(skeleton);
    let report = animator.do_animation(Arc::new(clip));
    if !report.is_complete() {
        log::info!(
            "Clip '{}': {} joint(s) at bind pose, {} unknown",
            report.clip,
            report.missing_joints.len(),
            report.unknown_joints.len()
        );
    }

    let mut buffer = SkinningBuffer::for_skeleton(animator.skeleton())?;
    let mut baked = Vec::with_capacity(frames as usize);
    for frame in 0..frames {
        let delta = if frame == 0 { 0.0 } else { dt };
        let outcome = animator.update(delta, f64::from(frame) * dt);
        if let FrameOutcome::HeldLastPose { time } = outcome {
            log::warn!("Frame {} at t={:.3} reused the previous pose", frame, time);
        }
        buffer.write_from(animator.skeleton());
        baked.push(BakedFrame {
            frame,
            time: animator.current_time(),
            matrices: buffer.matrices().iter().map(|m| m.to_cols_array()).collect(),
        });
    }

    Ok(BakedClip {
        skeleton: skeleton_name,
        clip: clip_name,
        fps,
        joints,
        frames: baked,
    })
}

fn format_text(baked: &BakedClip) -> String {
    let mut out = format!(
        "Clip '{}' on '{}' at {} fps ({} frames)\n",
        baked.clip,
        baked.skeleton,
        baked.fps,
        baked.frames.len()
    );
    for frame in &baked.frames {
        out.push_str(&format!("frame {} t={:.4}\n", frame.frame, frame.time));
        for (name, m) in baked.joints.iter().zip(&frame.matrices) {
            let rows: Vec<String> = (0..4)
                .map(|r| {
                    format!(
                        "[{:8.4} {:8.4} {:8.4} {:8.4}]",
                        m[r],
                        m[4 + r],
                        m[8 + r],
                        m[12 + r]
                    )
                })
                .collect();
            out.push_str(&format!("  {:<16} {}\n", name, rows.join(" ")));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use marionette_animation::{JointTransform, Keyframe, Pose};
    use marionette_core::{Mat4, Quat, Vec3};

    fn fixture() -> (Skeleton, Animation) {
        let mut b = Skeleton::builder("pair");
        b.add_joint(0, "root", Mat4::IDENTITY).unwrap();
        b.add_joint(1, "tip", Mat4::from_translation(Vec3::new(0.0, 1.0, 0.0)))
            .unwrap();
        b.attach(0, 1).unwrap();
        let at = |x: f32| {
            Pose::new().with(
                "root",
                JointTransform::new(Vec3::new(x, 0.0, 0.0), Quat::IDENTITY),
            )
        };
        let clip = Animation::new(
            "slide",
            vec![Keyframe::new(0.0, at(0.0)), Keyframe::new(1.0, at(2.0))],
            1.0,
        )
        .unwrap();
        (b.build().unwrap(), clip)
    }

    #[test]
    fn default_frame_count_covers_one_loop() {
        let (skeleton, clip) = fixture();
        let baked = bake(skeleton, clip, 4, None).unwrap();
        assert_eq!(baked.frames.len(), 4);
        assert_eq!(baked.joints, vec!["root".to_string(), "tip".to_string()]);

        let times: Vec<f64> = baked.frames.iter().map(|f| f.time).collect();
        assert_eq!(times, vec![0.0, 0.25, 0.5, 0.75]);

        // Root translation x sits at column-major index 12
        let x = baked.frames[2].matrices[0][12];
        assert!((x - 1.0).abs() < 1e-5);
    }

    #[test]
    fn text_lists_every_joint() {
        let (skeleton, clip) = fixture();
        let baked = bake(skeleton, clip, 2, Some(1)).unwrap();
        let text = format_text(&baked);
        assert!(text.contains("frame 0 t=0.0000"));
        assert!(text.contains("root"));
        assert!(text.contains("tip"));
    }

    #[test]
    fn json_has_flat_matrices() {
        let (skeleton, clip) = fixture();
        let baked = bake(skeleton, clip, 2, Some(1)).unwrap();
        let value = serde_json::to_value(&baked).unwrap();
        assert_eq!(value["frames"][0]["matrices"][1].as_array().unwrap().len(), 16);
    }
}

//! Per-model clip playback
//!
//! An [`Animator`] is either idle or playing one clip on a loop. Each update
//! advances the clock, brackets the time between two keyframes, blends them and
//! pushes the result through the skeleton.

use crate::binding::{BindReport, BoundClip};
use crate::clip::{Animation, Keyframe};
use crate::pose::{JointTransform, ResolvedPose};
use crate::skeleton::Skeleton;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Playing,
}

/// What a call to [`Animator::update`] did
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FrameOutcome {
    /// No clip; nothing changed
    Idle,
    /// A new pose was applied at `time`, `step` of the way between keyframes
    Animated { time: f64, step: f32 },
    /// The blended pose produced non-finite matrices and was discarded
    HeldLastPose { time: f64 },
}

/// Owns one model's skeleton and drives it from a looping clip
#[derive(Debug, Clone)]
pub struct Animator {
    skeleton: Skeleton,
    clip: Option<BoundClip>,
    current_time: f64,
}

impl Animator {
    /// An idle animator; the skeleton starts at its bind pose
    pub fn new(mut skeleton: Skeleton) -> Self {
        skeleton.reset_to_bind_pose();
        Self {
            skeleton,
            clip: None,
            current_time: 0.0,
        }
    }

    pub fn skeleton(&self) -> &Skeleton {
        &self.skeleton
    }

    pub fn state(&self) -> PlaybackState {
        if self.clip.is_some() {
            PlaybackState::Playing
        } else {
            PlaybackState::Idle
        }
    }

    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    pub fn animation(&self) -> Option<&Arc<Animation>> {
        self.clip.as_ref().map(BoundClip::animation)
    }

    pub fn bind_report(&self) -> Option<&BindReport> {
        self.clip.as_ref().map(BoundClip::report)
    }

    /// Start `animation` from time zero, replacing any current clip
    pub fn do_animation(&mut self, animation: Arc<Animation>) -> &BindReport {
        self.current_time = 0.0;
        self.clip
            .insert(BoundClip::bind(animation, &self.skeleton))
            .report()
    }

    /// Back to idle; the skeleton keeps its last matrices
    pub fn stop(&mut self) {
        self.clip = None;
    }

    /// Advance by `delta_time` seconds and re-pose the skeleton.
    ///
    /// `now` is accepted so the signature matches a frame driver; timing uses
    /// only `delta_time`.
    pub fn update(&mut self, delta_time: f64, _now: f64) -> FrameOutcome {
        let Some(clip) = self.clip.as_ref() else {
            return FrameOutcome::Idle;
        };
        let animation = clip.animation();

        self.current_time = increase_animation_time(
            self.current_time,
            delta_time,
            animation.length_in_seconds(),
        );
        let time = self.current_time;

        let keyframes = animation.keyframes();
        let (previous, next) = previous_and_next_frames(keyframes, time);
        let step = calculate_progression(&keyframes[previous], &keyframes[next], time);
        let pose = interpolate_poses(&clip.poses()[previous], &clip.poses()[next], step);

        if self.skeleton.apply_pose(&pose) {
            FrameOutcome::Animated { time, step }
        } else {
            log::warn!(
                "Clip '{}' produced non-finite matrices at t={:.3}; holding last pose",
                animation.name(),
                time
            );
            FrameOutcome::HeldLastPose { time }
        }
    }
}

/// `current + delta`, wrapped into the clip once it passes `length`.
///
/// A time landing exactly on `length` is kept. Negative results wrap from the
/// end; a non-finite delta leaves the time unchanged.
pub fn increase_animation_time(current: f64, delta: f64, length: f64) -> f64 {
    if !delta.is_finite() {
        log::debug!("Ignoring non-finite animation delta {}", delta);
        return current;
    }
    let time = current + delta;
    if time > length || time < 0.0 {
        time.rem_euclid(length)
    } else {
        time
    }
}

/// Indices of the keyframes bracketing `time`.
///
/// Previous is the last keyframe at or before `time`, next the first one
/// after it. Before the first keyframe both are the first; past the last
/// both are the last.
pub fn previous_and_next_frames(keyframes: &[Keyframe], time: f64) -> (usize, usize) {
    let next = keyframes.partition_point(|k| k.timestamp <= time);
    if next == 0 {
        (0, 0)
    } else if next == keyframes.len() {
        (next - 1, next - 1)
    } else {
        (next - 1, next)
    }
}

/// Fraction of the way from `previous` to `next`; 0 for an empty window
pub fn calculate_progression(previous: &Keyframe, next: &Keyframe, time: f64) -> f32 {
    let window = next.timestamp - previous.timestamp;
    if window <= 0.0 {
        return 0.0;
    }
    ((time - previous.timestamp) / window) as f32
}

/// Blend two resolved keyframe poses joint by joint.
///
/// Joints absent from `previous` are left empty and hold their bind pose;
/// joints absent from `next` keep the previous transform.
pub fn interpolate_poses(previous: &ResolvedPose, next: &ResolvedPose, step: f32) -> ResolvedPose {
    let mut blended = ResolvedPose::empty(previous.len());
    for (id, from) in previous.iter().enumerate() {
        let Some(from) = from else { continue };
        let transform = match next.get(id) {
            Some(to) => JointTransform::interpolate(from, to, step),
            None => *from,
        };
        blended.set(id, transform);
    }
    blended
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::Pose;
    use marionette_core::{Mat4, Quat, Vec3};

    fn skeleton() -> Skeleton {
        let mut b = Skeleton::builder("pair");
        b.add_joint(0, "root", Mat4::IDENTITY).unwrap();
        b.add_joint(1, "tip", Mat4::from_translation(Vec3::new(0.0, 1.0, 0.0)))
            .unwrap();
        b.attach(0, 1).unwrap();
        b.build().unwrap()
    }

    fn at(x: f32) -> JointTransform {
        JointTransform::new(Vec3::new(x, 0.0, 0.0), Quat::IDENTITY)
    }

    /// Root slides from x=0 at t=0 to x=4 at t=2
    fn slide() -> Arc<Animation> {
        let k0 = Keyframe::new(0.0, Pose::new().with("root", at(0.0)));
        let k1 = Keyframe::new(2.0, Pose::new().with("root", at(4.0)));
        Arc::new(Animation::new("slide", vec![k0, k1], 2.0).unwrap())
    }

    fn keys(times: &[f64]) -> Vec<Keyframe> {
        times.iter().map(|&t| Keyframe::new(t, Pose::new())).collect()
    }

    #[test]
    fn idle_update_is_noop() {
        let mut animator = Animator::new(skeleton());
        assert_eq!(animator.state(), PlaybackState::Idle);
        let before: Vec<Mat4> = animator.skeleton().skinning_matrices().copied().collect();
        assert_eq!(animator.update(0.5, 0.5), FrameOutcome::Idle);
        assert_eq!(animator.current_time(), 0.0);
        let after: Vec<Mat4> = animator.skeleton().skinning_matrices().copied().collect();
        assert_eq!(before, after);
    }

    #[test]
    fn new_animator_is_at_bind_pose() {
        let animator = Animator::new(skeleton());
        for m in animator.skeleton().skinning_matrices() {
            assert!(m.approx_eq(&Mat4::IDENTITY, 1e-6));
        }
    }

    #[test]
    fn midpoint_between_two_keyframes() {
        let mut animator = Animator::new(skeleton());
        animator.do_animation(slide());
        assert_eq!(animator.state(), PlaybackState::Playing);

        let outcome = animator.update(1.0, 1.0);
        assert_eq!(outcome, FrameOutcome::Animated { time: 1.0, step: 0.5 });

        // Root local is translate(2, 0, 0); root inverse bind is identity
        let root = animator.skeleton().root().animated_matrix();
        assert!(root.translation().approx_eq(&Vec3::new(2.0, 0.0, 0.0), 1e-6));
        // The tip rides along with its parent
        let tip = animator.skeleton().joint(1).unwrap().animated_matrix();
        assert!(tip.translation().approx_eq(&Vec3::new(2.0, 0.0, 0.0), 1e-6));
    }

    #[test]
    fn time_wraps_past_clip_length() {
        let mut animator = Animator::new(skeleton());
        animator.do_animation(slide());
        animator.update(1.5, 0.0);
        assert!((animator.current_time() - 1.5).abs() < 1e-9);
        animator.update(1.0, 0.0);
        assert!((animator.current_time() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn do_animation_restarts_from_zero() {
        let mut animator = Animator::new(skeleton());
        animator.do_animation(slide());
        animator.update(0.7, 0.0);
        let report = animator.do_animation(slide());
        assert_eq!(report.clip, "slide");
        assert_eq!(animator.current_time(), 0.0);
    }

    #[test]
    fn stop_returns_to_idle_and_keeps_matrices() {
        let mut animator = Animator::new(skeleton());
        animator.do_animation(slide());
        animator.update(1.0, 0.0);
        let posed = *animator.skeleton().root().animated_matrix();
        animator.stop();
        assert_eq!(animator.state(), PlaybackState::Idle);
        assert!(animator.animation().is_none());
        assert_eq!(animator.update(1.0, 0.0), FrameOutcome::Idle);
        assert_eq!(*animator.skeleton().root().animated_matrix(), posed);
    }

    #[test]
    fn missing_joint_holds_bind_pose() {
        let mut animator = Animator::new(skeleton());
        let report = animator.do_animation(slide());
        assert_eq!(report.missing_joints, vec!["tip".to_string()]);
        animator.update(2.0, 0.0);
        // Tip local stays at its bind offset; the parent moved it by x=4
        let tip = animator.skeleton().joint(1).unwrap().animated_matrix();
        assert!(tip.translation().approx_eq(&Vec3::new(4.0, 0.0, 0.0), 1e-5));
    }

    #[test]
    fn non_finite_keyframe_holds_last_pose() {
        let k0 = Keyframe::new(0.0, Pose::new().with("root", at(0.0)));
        let k1 = Keyframe::new(1.0, Pose::new().with("root", at(2.0)));
        let k2 = Keyframe::new(2.0, Pose::new().with("root", at(f32::NAN)));
        let clip = Animation::new("breaks", vec![k0, k1, k2], 3.0).unwrap();

        let mut animator = Animator::new(skeleton());
        animator.do_animation(Arc::new(clip));
        assert_eq!(
            animator.update(0.5, 0.5),
            FrameOutcome::Animated { time: 0.5, step: 0.5 }
        );
        let before: Vec<Mat4> = animator.skeleton().skinning_matrices().copied().collect();

        assert_eq!(
            animator.update(1.0, 1.5),
            FrameOutcome::HeldLastPose { time: 1.5 }
        );
        let after: Vec<Mat4> = animator.skeleton().skinning_matrices().copied().collect();
        assert_eq!(before, after);
        assert!(after[0].translation().approx_eq(&Vec3::new(1.0, 0.0, 0.0), 1e-6));
        // Time still advanced; only the pose was discarded
        assert_eq!(animator.current_time(), 1.5);
    }

    #[test]
    fn non_finite_delta_is_ignored() {
        assert_eq!(increase_animation_time(0.4, f64::NAN, 2.0), 0.4);
        assert_eq!(increase_animation_time(0.4, f64::INFINITY, 2.0), 0.4);
    }

    #[test]
    fn time_on_length_is_kept_and_negative_wraps() {
        assert_eq!(increase_animation_time(1.5, 0.5, 2.0), 2.0);
        assert!((increase_animation_time(0.25, -0.5, 2.0) - 1.75).abs() < 1e-9);
        assert!((increase_animation_time(1.0, 5.5, 2.0) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn bracket_interior_and_edges() {
        let frames = keys(&[0.5, 1.0, 1.5]);
        assert_eq!(previous_and_next_frames(&frames, 0.2), (0, 0));
        assert_eq!(previous_and_next_frames(&frames, 0.5), (0, 1));
        assert_eq!(previous_and_next_frames(&frames, 1.2), (1, 2));
        assert_eq!(previous_and_next_frames(&frames, 1.9), (2, 2));
    }

    #[test]
    fn before_first_keyframe_steps_zero() {
        let frames = keys(&[0.5, 1.0]);
        let (p, n) = previous_and_next_frames(&frames, 0.1);
        assert_eq!(calculate_progression(&frames[p], &frames[n], 0.1), 0.0);
    }

    #[test]
    fn progression_is_fraction_of_window() {
        let frames = keys(&[1.0, 3.0]);
        let step = calculate_progression(&frames[0], &frames[1], 1.5);
        assert!((step - 0.25).abs() < 1e-6);
    }

    #[test]
    fn duplicate_timestamps_step_to_later_frame() {
        let frames = keys(&[0.0, 1.0, 1.0, 2.0]);
        assert_eq!(previous_and_next_frames(&frames, 1.0), (2, 3));
    }

    #[test]
    fn interpolate_keeps_previous_when_next_missing() {
        let mut previous = ResolvedPose::empty(3);
        previous.set(0, at(0.0));
        previous.set(1, at(2.0));
        let mut next = ResolvedPose::empty(3);
        next.set(0, at(4.0));
        next.set(2, at(9.0));

        let blended = interpolate_poses(&previous, &next, 0.5);
        assert!(blended.get(0).unwrap().position.approx_eq(&Vec3::new(2.0, 0.0, 0.0), 1e-6));
        assert_eq!(blended.get(1), Some(&at(2.0)));
        assert!(blended.get(2).is_none());
    }
}

//! Keyframes and animation clips

use crate::pose::Pose;
use marionette_core::{MarionetteError, Result};

/// A full-skeleton pose at a point in time
#[derive(Debug, Clone, PartialEq)]
pub struct Keyframe {
    /// Seconds from clip start
    pub timestamp: f64,
    pub pose: Pose,
}

impl Keyframe {
    pub fn new(timestamp: f64, pose: Pose) -> Self {
        Self { timestamp, pose }
    }
}

/// A named, looping sequence of keyframes.
///
/// Fields are private: playback relies on the keyframe order checked in
/// [`Animation::new`] and must not observe later mutation.
#[derive(Debug, Clone, PartialEq)]
pub struct Animation {
    name: String,
    keyframes: Vec<Keyframe>,
    length_in_seconds: f64,
}

impl Animation {
    /// Validate and build a clip.
    ///
    /// Requires a finite positive length, at least one keyframe, and
    /// timestamps that are finite, within `[0, length]` and non-decreasing.
    pub fn new(
        name: impl Into<String>,
        keyframes: Vec<Keyframe>,
        length_in_seconds: f64,
    ) -> Result<Self> {
        let name = name.into();

        if !length_in_seconds.is_finite() || length_in_seconds <= 0.0 {
            return Err(MarionetteError::InvalidClip(format!(
                "Clip '{}' has non-positive length: {}",
                name, length_in_seconds
            )));
        }

        if keyframes.is_empty() {
            return Err(MarionetteError::InvalidClip(format!(
                "Clip '{}' has no keyframes",
                name
            )));
        }

        let mut previous = 0.0;
        for (i, keyframe) in keyframes.iter().enumerate() {
            let t = keyframe.timestamp;
            if !t.is_finite() || t < 0.0 || t > length_in_seconds {
                return Err(MarionetteError::InvalidClip(format!(
                    "Clip '{}' keyframe {} has timestamp {} outside [0, {}]",
                    name, i, t, length_in_seconds
                )));
            }
            if t < previous {
                return Err(MarionetteError::InvalidClip(format!(
                    "Clip '{}' keyframe {} at {} precedes keyframe {} at {}",
                    name,
                    i,
                    t,
                    i - 1,
                    previous
                )));
            }
            previous = t;
        }

        Ok(Self {
            name,
            keyframes,
            length_in_seconds,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn keyframes(&self) -> &[Keyframe] {
        &self.keyframes
    }

    pub fn length_in_seconds(&self) -> f64 {
        self.length_in_seconds
    }
}

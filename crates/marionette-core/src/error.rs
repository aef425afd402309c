//! Error types for Marionette

use thiserror::Error;

/// The main error type for Marionette operations
#[derive(Debug, Error)]
pub enum MarionetteError {
    #[error("Singular bind matrix for joint '{joint}' (determinant {determinant})")]
    SingularBindMatrix { joint: String, determinant: f32 },

    #[error("Invalid skeleton: {0}")]
    InvalidSkeleton(String),

    #[error("Invalid clip: {0}")]
    InvalidClip(String),

    #[error("Joint not found: {0}")]
    UnknownJoint(String),

    #[error("Clip not found: {0}")]
    UnknownClip(String),

    #[error("Model not found: {0}")]
    UnknownModel(String),

    #[error("Model is not skinned: {0}")]
    NotSkinned(String),

    #[error("Too many joints: {count} exceeds the limit of {max}")]
    TooManyJoints { count: usize, max: usize },

    #[error("Asset error: {0}")]
    AssetError(String),

    #[error("TOML parse error: {0}")]
    TomlParseError(String),

    #[error("Runtime error: {0}")]
    RuntimeError(String),
}

/// Result type alias for Marionette operations
pub type Result<T> = std::result::Result<T, MarionetteError>;

//! Marionette Core - Foundational types for the Marionette animation crates
//!
//! This crate provides the types every other Marionette crate depends on:
//! - `Vec3`, `Vec4`, `Quat`, `Mat4` - the transform math kernel
//! - `ModelId` - stable model identifiers
//! - Error types and Result alias

mod error;
mod id;
mod interop;
mod mat4;
mod quat;
mod types;

pub use error::{MarionetteError, Result};
pub use id::ModelId;
pub use mat4::{Mat4, SINGULAR_EPSILON};
pub use quat::Quat;
pub use types::{lerp, Vec3, Vec4};

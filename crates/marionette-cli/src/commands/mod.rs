//! CLI command implementations

pub mod bake;
pub mod inspect;
pub mod play;

//! Runtime system trait

use crate::clock::FrameTime;
use marionette_core::Result;

/// A system that can be ticked by the frame loop
///
/// Systems are updated in registration order, once per frame.
pub trait RuntimeSystem {
    /// Called once when the system is first registered
    fn initialize(&mut self) -> Result<()>;

    /// Called once per frame. All mutation of per-frame state happens here.
    fn update(&mut self, frame: &FrameTime) -> Result<()>;

    /// Called when the system is being shut down
    fn shutdown(&mut self) -> Result<()>;

    /// Human-readable name for this system
    fn name(&self) -> &str;
}

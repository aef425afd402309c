//! Marionette Runtime - Frame loop infrastructure
//!
//! Provides the frame loop building blocks:
//! - `GameClock` / `FrameTime`: per-frame delta and absolute time
//! - `RuntimeSystem`: trait for systems ticked by the frame loop
//! - `FrameDriver` / `FrameView`: update phase first, read phase after

mod clock;
mod frame;
mod system;

pub use clock::{FrameTime, GameClock, MAX_FRAME_DELTA};
pub use frame::{FrameDriver, FrameView};
pub use system::RuntimeSystem;

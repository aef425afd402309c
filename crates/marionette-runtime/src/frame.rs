//! Frame driver with explicit update and read phases
//!
//! `step` runs the update phase to completion and only then returns a
//! [`FrameView`]. The view borrows the driver, so nothing can mutate the
//! system while a consumer (e.g. the renderer) is reading this frame's output.

use crate::clock::{FrameTime, GameClock};
use crate::system::RuntimeSystem;
use marionette_core::{MarionetteError, Result};
use std::ops::Deref;

/// Drives one system through initialize / per-frame update / shutdown
pub struct FrameDriver<S: RuntimeSystem> {
    system: S,
    clock: GameClock,
    initialized: bool,
}

/// Read-phase access to a system after its update for `frame` has finished
pub struct FrameView<'a, S> {
    pub frame: FrameTime,
    system: &'a S,
}

impl<S> Deref for FrameView<'_, S> {
    type Target = S;
    fn deref(&self) -> &S {
        self.system
    }
}

impl<S: RuntimeSystem> FrameDriver<S> {
    pub fn new(system: S) -> Self {
        Self {
            system,
            clock: GameClock::new(),
            initialized: false,
        }
    }

    pub fn initialize(&mut self) -> Result<()> {
        if self.initialized {
            return Ok(());
        }
        self.system.initialize()?;
        self.initialized = true;
        log::debug!("Initialized system '{}'", self.system.name());
        Ok(())
    }

    /// Run one frame of `delta_time` seconds, then enter the read phase
    pub fn step(&mut self, delta_time: f64) -> Result<FrameView<'_, S>> {
        let frame = self.clock.advance(delta_time);
        self.run(frame)
    }

    /// Run one frame timed from the wall clock, then enter the read phase
    pub fn tick(&mut self) -> Result<FrameView<'_, S>> {
        let frame = self.clock.tick();
        self.run(frame)
    }

    fn run(&mut self, frame: FrameTime) -> Result<FrameView<'_, S>> {
        if !self.initialized {
            return Err(MarionetteError::RuntimeError(format!(
                "system '{}' stepped before initialize",
                self.system.name()
            )));
        }
        self.system.update(&frame)?;
        Ok(FrameView {
            frame,
            system: &self.system,
        })
    }

    /// Read access outside of a frame (e.g. before the first step)
    pub fn system(&self) -> &S {
        &self.system
    }

    /// Mutable access between frames, for setup such as starting a clip
    pub fn system_mut(&mut self) -> &mut S {
        &mut self.system
    }

    pub fn clock(&self) -> &GameClock {
        &self.clock
    }

    /// Shut the system down and hand it back
    pub fn shutdown(mut self) -> Result<S> {
        if self.initialized {
            self.system.shutdown()?;
        }
        Ok(self.system)
    }
}

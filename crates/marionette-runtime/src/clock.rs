//! Frame clock producing per-frame timing

use std::time::Instant;

/// Longest frame the clock will report, in seconds
pub const MAX_FRAME_DELTA: f64 = 0.25;

/// Timing handed to every system for one frame
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameTime {
    /// Seconds since the previous frame
    pub delta_time: f64,
    /// Seconds since the clock started
    pub now: f64,
    /// Number of frames produced so far, starting at 1
    pub frame: u64,
}

/// Tracks elapsed time between frames.
///
/// `tick` reads the wall clock; `advance` steps by an explicit amount for
/// headless baking and tests.
pub struct GameClock {
    /// Total elapsed time in seconds
    pub total_time: f64,
    /// Time since last frame in seconds
    pub delta_time: f64,
    /// Upper bound applied to wall-clock deltas
    pub max_delta: f64,
    frame: u64,
    last_instant: Instant,
    first_tick: bool,
}

impl Default for GameClock {
    fn default() -> Self {
        Self {
            total_time: 0.0,
            delta_time: 0.0,
            max_delta: MAX_FRAME_DELTA,
            frame: 0,
            last_instant: Instant::now(),
            first_tick: true,
        }
    }
}

impl GameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance from the wall clock. Call once per frame.
    pub fn tick(&mut self) -> FrameTime {
        let now = Instant::now();

        if self.first_tick {
            self.first_tick = false;
            self.last_instant = now;
            return self.advance(0.0);
        }

        let elapsed = now.duration_since(self.last_instant).as_secs_f64();
        self.last_instant = now;

        // Clamp so a stall doesn't fling animations forward
        self.advance(elapsed.min(self.max_delta))
    }

    /// Advance by exactly `delta_time` seconds
    pub fn advance(&mut self, delta_time: f64) -> FrameTime {
        self.delta_time = delta_time;
        self.total_time += delta_time;
        self.frame += 1;
        self.frame()
    }

    /// Timing of the most recent frame
    pub fn frame(&self) -> FrameTime {
        FrameTime {
            delta_time: self.delta_time,
            now: self.total_time,
            frame: self.frame,
        }
    }
}

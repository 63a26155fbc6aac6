//! Variable-timestep frame loop.
//!
//! Each frame runs one update with the measured frame time, clamped to
//! [`MAX_FRAME_TIME`]. Slower periodic work (chunk loading, position reports) hangs
//! off [`IntervalTimer`]s advanced by the same clamped delta.

use std::time::{Duration, Instant};

use tracing::warn;

/// Largest delta a single frame may simulate, in seconds.
pub const MAX_FRAME_TIME: f32 = 0.05;

/// Measures frame times and drives the per-frame update.
pub struct GameLoop {
    previous_time: Instant,
    total_sim_time: Duration,
    frame_count: u64,
}

impl GameLoop {
    pub fn new() -> Self {
        Self {
            previous_time: Instant::now(),
            total_sim_time: Duration::ZERO,
            frame_count: 0,
        }
    }

    /// Runs one frame using wall-clock time since the previous frame.
    ///
    /// `update_fn(dt, sim_time)` receives the clamped delta in seconds and
    /// the simulated time at the start of the frame.
    pub fn tick(&mut self, update_fn: impl FnOnce(f32, Duration)) {
        let current_time = Instant::now();
        let frame_time = current_time
            .duration_since(self.previous_time)
            .as_secs_f32();
        self.previous_time = current_time;
        self.advance(frame_time, update_fn);
    }

    /// Runs one frame with an explicit frame time in seconds.
    pub fn advance(&mut self, frame_time: f32, update_fn: impl FnOnce(f32, Duration)) {
        let mut dt = frame_time.max(0.0);
        if dt > MAX_FRAME_TIME {
            warn!(
                "Frame time {:.1}ms exceeds maximum, clamping to {:.1}ms",
                dt * 1000.0,
                MAX_FRAME_TIME * 1000.0
            );
            dt = MAX_FRAME_TIME;
        }

        update_fn(dt, self.total_sim_time);
        self.total_sim_time += Duration::from_secs_f32(dt);
        self.frame_count += 1;
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Sum of all clamped frame deltas.
    pub fn total_sim_time(&self) -> Duration {
        self.total_sim_time
    }
}

impl Default for GameLoop {
    fn default() -> Self {
        Self::new()
    }
}

/// Fires once the accumulated time exceeds its interval, then starts over
/// from zero.
#[derive(Clone, Debug)]
pub struct IntervalTimer {
    interval: f32,
    elapsed: f32,
}

impl IntervalTimer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval: interval.as_secs_f32(),
            elapsed: 0.0,
        }
    }

    /// Adds `dt` seconds. Returns `true` when the timer fires.
    pub fn advance(&mut self, dt: f32) -> bool {
        self.elapsed += dt;
        if self.elapsed > self.interval {
            self.elapsed = 0.0;
            return true;
        }
        false
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }
}

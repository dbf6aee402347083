//! Frame-gated interval timers
//!
//! Timers never sleep or read the wall clock themselves. The frame pump
//! measures elapsed time and feeds it in, which keeps the engine
//! deterministic under test.

use std::time::Duration;

/// Target frame rate of the authoritative update tick
pub const TARGET_FPS: u64 = 60;
pub const FRAME_INTERVAL: Duration = Duration::from_nanos(1_000_000_000 / TARGET_FPS);

/// Gravity interval while soft drop is held
pub const SOFT_DROP_INTERVAL: Duration = Duration::from_millis(30);

/// Cadence of the award letter animation
pub const LETTER_ROTATE_INTERVAL: Duration = Duration::from_millis(250);

/// Accumulates elapsed time and fires once it crosses an interval
#[derive(Debug, Clone)]
pub struct IntervalTimer {
    interval: Duration,
    elapsed: Duration,
    running: bool,
}

impl IntervalTimer {
    /// A stopped timer
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            elapsed: Duration::ZERO,
            running: false,
        }
    }

    /// Resume accumulating from where it left off
    pub fn start(&mut self) {
        self.running = true;
    }

    /// Stop accumulating; the accumulated time is kept
    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Drop any accumulated time and start
    pub fn restart(&mut self) {
        self.elapsed = Duration::ZERO;
        self.running = true;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = interval;
    }

    /// Feed elapsed time; returns `true` when the interval was crossed
    ///
    /// Fires at most once per call and discards the remainder, so a long
    /// stall never produces a burst of catch-up events.
    pub fn advance(&mut self, dt: Duration) -> bool {
        if !self.running {
            return false;
        }
        self.elapsed += dt;
        if self.elapsed >= self.interval {
            self.elapsed = Duration::ZERO;
            true
        } else {
            false
        }
    }
}

//! Render loop and telemetry timer state
//!
//! Neither type owns a thread. The host calls `advance` from its own frame
//! or timer callback; `stop` clears any pending time so no tick fires after
//! it returns.

use std::time::Duration;

/// Continuous rendering at the host's frame cadence
#[derive(Debug, Clone, Default)]
pub struct FrameLoop {
    running: bool,
    frames: u64,
}

impl FrameLoop {
    pub fn start(&mut self) {
        self.running = true;
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// One host callback: a frame is due only while running
    pub fn advance(&mut self, _dt: Duration) -> u32 {
        if !self.running {
            return 0;
        }
        self.frames += 1;
        1
    }
}

/// Fixed-interval timer driven by elapsed time
#[derive(Debug, Clone)]
pub struct IntervalTimer {
    interval: Duration,
    pending: Duration,
    running: bool,
}

impl IntervalTimer {
    /// A zero interval never fires
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            pending: Duration::ZERO,
            running: false,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn start(&mut self) {
        self.running = true;
    }

    pub fn stop(&mut self) {
        self.running = false;
        self.pending = Duration::ZERO;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Number of ticks that became due during `dt`
    pub fn advance(&mut self, dt: Duration) -> u32 {
        if !self.running || self.interval.is_zero() {
            return 0;
        }
        self.pending += dt;
        let mut due = 0;
        while self.pending >= self.interval {
            self.pending -= self.interval;
            due += 1;
        }
        due
    }
}

//! Frame clocks: the single time source sampled once per frame.

use std::{cell::Cell, rc::Rc};

use instant::Instant;

/// Monotonic elapsed-time source. Every animation formula is a function of the value
/// returned here, so a frame sees exactly one time.
pub trait FrameClock {
    /// Seconds since the clock started.
    fn elapsed(&self) -> f32;
}

/// Wall clock backed by `instant`, which maps to `performance.now()` on the web.
#[derive(Debug, Clone, Copy)]
pub struct InstantClock {
    start: Instant,
}

impl InstantClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for InstantClock {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameClock for InstantClock {
    fn elapsed(&self) -> f32 {
        self.start.elapsed().as_secs_f32()
    }
}

/// Clock advanced by hand. Clones share the same time, so a test can keep one handle
/// while the view owns another.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<f32>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, seconds: f32) {
        self.now.set(seconds);
    }

    pub fn advance(&self, seconds: f32) {
        self.now.set(self.now.get() + seconds);
    }
}

impl FrameClock for ManualClock {
    fn elapsed(&self) -> f32 {
        self.now.get()
    }
}

/// Time handed to the animation driver for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameTime {
    /// Seconds since the view started.
    pub elapsed: f32,
    /// Seconds since the previous rendered frame.
    pub delta: f32,
}

//! Decorative page state that runs next to the scene but never touches it.
//!
//! Every piece is advanced by [`tick`](DemoShell::tick) with the time since the last call,
//! from the event loop's fixed tick. None of it is tied to the render loop: stopping a
//! view leaves the shell running and vice versa.

use instant::Duration;
use log::debug;
use rand::{Rng, SeedableRng, rngs::SmallRng};

/// Fake extraction progress: jumps by a random amount every interval until it hits 100.
#[derive(Debug, Clone)]
pub struct ProgressSimulation {
    value: f32,
    running: bool,
    interval: Duration,
    since_step: Duration,
    max_step: f32,
    rng: SmallRng,
}

impl ProgressSimulation {
    pub fn new(seed: u64) -> Self {
        Self {
            value: 0.0,
            running: false,
            interval: Duration::from_millis(200),
            since_step: Duration::ZERO,
            max_step: 10.0,
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    /// Restarts from zero.
    pub fn start(&mut self) {
        self.value = 0.0;
        self.since_step = Duration::ZERO;
        self.running = true;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    pub fn percent(&self) -> u32 {
        self.value.round() as u32
    }

    pub fn tick(&mut self, dt: Duration) {
        if !self.running || self.interval.is_zero() {
            return;
        }
        self.since_step += dt;
        while self.running && self.since_step >= self.interval {
            self.since_step -= self.interval;
            self.value += self.rng.r#gen::<f32>() * self.max_step;
            if self.value >= 100.0 {
                self.value = 100.0;
                self.running = false;
                debug!("progress simulation finished");
            }
        }
    }
}

/// Highlights one of `count` steps, moving on every `period`.
#[derive(Debug, Clone)]
pub struct StepCycler {
    count: usize,
    current: usize,
    period: Duration,
    elapsed: Duration,
}

impl StepCycler {
    pub fn new(count: usize, period: Duration) -> Self {
        Self {
            count: count.max(1),
            current: 0,
            period,
            elapsed: Duration::ZERO,
        }
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn tick(&mut self, dt: Duration) {
        if self.period.is_zero() {
            return;
        }
        self.elapsed += dt;
        while self.elapsed >= self.period {
            self.elapsed -= self.period;
            self.current = (self.current + 1) % self.count;
        }
    }
}

/// On for `duration` at the start of every `period`, beginning after the first period.
#[derive(Debug, Clone)]
pub struct GlitchPulse {
    period: Duration,
    duration: Duration,
    elapsed: Duration,
}

impl GlitchPulse {
    pub fn new(period: Duration, duration: Duration) -> Self {
        Self {
            period,
            duration,
            elapsed: Duration::ZERO,
        }
    }

    pub fn tick(&mut self, dt: Duration) {
        self.elapsed += dt;
    }

    pub fn is_glitching(&self) -> bool {
        if self.elapsed < self.period || self.period.is_zero() {
            return false;
        }
        let into_period = self.elapsed.as_nanos() % self.period.as_nanos();
        into_period < self.duration.as_nanos()
    }
}

/// The landing page's timers bundled together.
#[derive(Debug, Clone)]
pub struct DemoShell {
    pub progress: ProgressSimulation,
    pub steps: StepCycler,
    pub glitch: GlitchPulse,
}

impl DemoShell {
    pub const STEPS: usize = 5;

    pub fn new(seed: u64) -> Self {
        Self {
            progress: ProgressSimulation::new(seed),
            steps: StepCycler::new(Self::STEPS, Duration::from_secs(3)),
            glitch: GlitchPulse::new(Duration::from_secs(3), Duration::from_millis(200)),
        }
    }

    pub fn tick(&mut self, dt: Duration) {
        self.progress.tick(dt);
        self.steps.tick(dt);
        self.glitch.tick(dt);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_stops_at_one_hundred() {
        let mut progress = ProgressSimulation::new(3);
        progress.tick(Duration::from_secs(10));
        assert_eq!(progress.value(), 0.0);

        progress.start();
        let mut last = 0.0;
        for _ in 0..1000 {
            progress.tick(Duration::from_millis(200));
            assert!(progress.value() >= last);
            last = progress.value();
        }
        assert!(!progress.is_running());
        assert_eq!(progress.percent(), 100);
    }

    #[test]
    fn steps_wrap_around() {
        let mut steps = StepCycler::new(5, Duration::from_secs(3));
        steps.tick(Duration::from_millis(2999));
        assert_eq!(steps.current(), 0);
        steps.tick(Duration::from_millis(1));
        assert_eq!(steps.current(), 1);
        steps.tick(Duration::from_secs(12));
        assert_eq!(steps.current(), 0);
    }

    #[test]
    fn glitch_is_a_short_pulse() {
        let mut glitch = GlitchPulse::new(Duration::from_secs(3), Duration::from_millis(200));
        glitch.tick(Duration::from_millis(100));
        assert!(!glitch.is_glitching());
        glitch.tick(Duration::from_millis(2950));
        assert!(glitch.is_glitching());
        glitch.tick(Duration::from_millis(200));
        assert!(!glitch.is_glitching());
    }
}

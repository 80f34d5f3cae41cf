use std::time::{Duration, Instant};

/// Source of per-frame timing. Abstracted so tests can drive the
/// simulation at a fixed, deterministic step instead of wall-clock time.
pub trait Clock: Send + Sync {
    /// Advances the clock and returns the elapsed time since the previous
    /// call (or since construction, for the first call).
    fn tick(&mut self) -> Duration;

    fn elapsed_total(&self) -> Duration;
}

pub struct SystemClock {
    start: Instant,
    last: Instant,
    total_at_last: Duration,
}

impl SystemClock {
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            start: now,
            last: now,
            total_at_last: Duration::ZERO,
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn tick(&mut self) -> Duration {
        let now = Instant::now();
        let delta = now.duration_since(self.last);
        self.last = now;
        self.total_at_last = now.duration_since(self.start);
        delta
    }

    fn elapsed_total(&self) -> Duration {
        self.total_at_last
    }
}

/// A clock that advances by a fixed step every tick, regardless of wall
/// time. Used in tests so frame-timed behavior is reproducible.
pub struct FixedClock {
    step: Duration,
    total: Duration,
}

impl FixedClock {
    pub fn new(step: Duration) -> Self {
        Self { step, total: Duration::ZERO }
    }
}

impl Clock for FixedClock {
    fn tick(&mut self) -> Duration {
        self.total += self.step;
        self.step
    }

    fn elapsed_total(&self) -> Duration {
        self.total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_clock_advances_by_exact_step() {
        let mut clock = FixedClock::new(Duration::from_millis(16));
        assert_eq!(clock.tick(), Duration::from_millis(16));
        assert_eq!(clock.tick(), Duration::from_millis(16));
        assert_eq!(clock.elapsed_total(), Duration::from_millis(32));
    }
}

//! Exponential backoff with a maximum elapsed time.
//!
//! Intervals grow by `multiplier` from `initial_interval` up to
//! `max_interval`, each one jittered by `randomization_factor` so many stages
//! retrying at once do not hit the pool manager in lockstep. Once the total
//! time since creation (or the last [`ExponentialBackoff::reset`]) plus the
//! next interval would exceed `max_elapsed_time`, the policy stops.

use std::time::{Duration, Instant};

use rand::Rng;

pub const DEFAULT_INITIAL_INTERVAL: Duration = Duration::from_millis(500);
pub const DEFAULT_MULTIPLIER: f64 = 1.5;
pub const DEFAULT_RANDOMIZATION_FACTOR: f64 = 0.5;
pub const DEFAULT_MAX_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub struct ExponentialBackoff {
    initial_interval: Duration,
    multiplier: f64,
    randomization_factor: f64,
    max_interval: Duration,
    max_elapsed_time: Duration,
    current_interval: Duration,
    start: Instant,
}

impl ExponentialBackoff {
    /// Policy with the default interval schedule, bounded by `max_elapsed_time`.
    #[must_use]
    pub fn new(max_elapsed_time: Duration) -> Self {
        Self {
            initial_interval: DEFAULT_INITIAL_INTERVAL,
            multiplier: DEFAULT_MULTIPLIER,
            randomization_factor: DEFAULT_RANDOMIZATION_FACTOR,
            max_interval: DEFAULT_MAX_INTERVAL,
            max_elapsed_time,
            current_interval: DEFAULT_INITIAL_INTERVAL,
            start: Instant::now(),
        }
    }

    #[must_use]
    pub fn with_initial_interval(mut self, interval: Duration) -> Self {
        self.initial_interval = interval;
        self.current_interval = interval;
        self
    }

    /// Growth factor per step. Values below 1.0 are treated as 1.0.
    #[must_use]
    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier.max(1.0);
        self
    }

    /// Jitter as a fraction of the interval, clamped to `[0, 1]`.
    #[must_use]
    pub fn with_randomization_factor(mut self, factor: f64) -> Self {
        self.randomization_factor = factor.clamp(0.0, 1.0);
        self
    }

    #[must_use]
    pub fn with_max_interval(mut self, interval: Duration) -> Self {
        self.max_interval = interval;
        self
    }

    #[must_use]
    pub fn max_elapsed_time(&self) -> Duration {
        self.max_elapsed_time
    }

    /// Restart the schedule and the elapsed-time clock.
    pub fn reset(&mut self) {
        self.current_interval = self.initial_interval;
        self.start = Instant::now();
    }

    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Next wait, or `None` once the elapsed budget is spent.
    pub fn next_backoff(&mut self) -> Option<Duration> {
        self.next_after(self.elapsed())
    }

    fn next_after(&mut self, elapsed: Duration) -> Option<Duration> {
        let next = self.randomized_interval();
        self.increment_current_interval();
        if elapsed.saturating_add(next) > self.max_elapsed_time {
            return None;
        }
        Some(next)
    }

    fn increment_current_interval(&mut self) {
        if self.current_interval >= self.max_interval {
            self.current_interval = self.max_interval;
            return;
        }
        self.current_interval = self
            .current_interval
            .mul_f64(self.multiplier)
            .min(self.max_interval);
    }

    fn randomized_interval(&self) -> Duration {
        if self.randomization_factor <= 0.0 {
            return self.current_interval;
        }
        let secs = self.current_interval.as_secs_f64();
        let delta = self.randomization_factor * secs;
        let jittered = rand::thread_rng().gen_range((secs - delta)..=(secs + delta));
        Duration::from_secs_f64(jittered.max(0.0))
    }
}

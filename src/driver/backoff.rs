//! Exponential backoff state machine used by the retry driver.

use std::time::{Duration, Instant};

use rand::{Rng, SeedableRng, rngs::StdRng};

use super::config::BackoffPolicy;

const MIN_SLEEP_MS: u64 = 10;

/// Tracks retry attempts and produces jittered delays.
///
/// The deadline is measured from the first failure after the last success.
/// The delay itself only falls back to `base` once deliveries have been
/// healthy for `reset_after`.
#[derive(Debug)]
pub struct BackoffState {
    policy: BackoffPolicy,
    current: Duration,
    failure_since: Option<Instant>,
    healthy_since: Option<Instant>,
    rng: StdRng,
}

impl BackoffState {
    /// Create a new state machine from the supplied policy.
    pub fn new(policy: BackoffPolicy) -> Self {
        Self {
            current: policy.base,
            failure_since: None,
            healthy_since: None,
            rng: StdRng::from_entropy(),
            policy,
        }
    }

    /// Record a successful delivery.
    pub fn record_success(&mut self, now: Instant) {
        self.failure_since = None;
        let since = *self.healthy_since.get_or_insert(now);
        if now.duration_since(since) >= self.policy.reset_after {
            self.current = self.policy.base;
        }
    }

    /// Calculate the next jittered sleep duration following a failure.
    ///
    /// Returns `None` once the deadline has passed.
    pub fn next_sleep(&mut self, now: Instant) -> Option<Duration> {
        self.healthy_since = None;
        let start = *self.failure_since.get_or_insert(now);

        if now.duration_since(start) >= self.policy.deadline {
            return None;
        }

        if now != start {
            self.current = self.current.saturating_mul(2).min(self.policy.cap);
        }

        let max_ms = self.current.as_millis().min(u128::from(u64::MAX)) as u64;
        let sleep_ms = match max_ms {
            0 => MIN_SLEEP_MS,
            1..=MIN_SLEEP_MS => max_ms,
            _ => self.rng.gen_range(MIN_SLEEP_MS..=max_ms),
        };
        Some(Duration::from_millis(sleep_ms))
    }

    /// Upper bound of the next delay before jitter.
    pub fn current(&self) -> Duration {
        self.current
    }
}

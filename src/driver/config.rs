//! Settings consumed by the retry driver.

use std::time::Duration;

use crate::{
    config::{ConfigError, TransportConfig},
    rate_limited_warner::DEFAULT_WARN_INTERVAL,
};

/// Default number of consecutive failures before a batch is abandoned.
pub const DEFAULT_MAX_FAILURE: u32 = 7;
/// Default base delay for exponential backoff retries.
pub const DEFAULT_BACKOFF_BASE: Duration = Duration::from_millis(100);
/// Default maximum delay for exponential backoff retries.
pub const DEFAULT_BACKOFF_CAP: Duration = Duration::from_secs(10);
/// Default duration of healthy deliveries that resets backoff state.
pub const DEFAULT_BACKOFF_RESET: Duration = Duration::from_secs(30);
/// Default absolute deadline for retrying one batch.
pub const DEFAULT_BACKOFF_DEADLINE: Duration = Duration::from_secs(120);

/// Exponential backoff policy for reconnection attempts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BackoffPolicy {
    pub base: Duration,
    pub cap: Duration,
    pub reset_after: Duration,
    pub deadline: Duration,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            base: DEFAULT_BACKOFF_BASE,
            cap: DEFAULT_BACKOFF_CAP,
            reset_after: DEFAULT_BACKOFF_RESET,
            deadline: DEFAULT_BACKOFF_DEADLINE,
        }
    }
}

/// Configuration of a [`TransportDriver`](super::TransportDriver).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DriverConfig {
    pub max_failure: u32,
    pub backoff: BackoffPolicy,
    pub warn_interval: Duration,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            max_failure: DEFAULT_MAX_FAILURE,
            backoff: BackoffPolicy::default(),
            warn_interval: DEFAULT_WARN_INTERVAL,
        }
    }
}

impl DriverConfig {
    /// Read `max_failure` and the `backoff_*_ms` keys, keeping defaults for
    /// absent keys.
    pub fn from_transport_config(config: &TransportConfig) -> Result<Self, ConfigError> {
        let mut driver = Self::default();
        if let Some(max_failure) = positive::<u32>(config, "max_failure")? {
            driver.max_failure = max_failure;
        }
        let backoff = &mut driver.backoff;
        for (key, slot) in [
            ("backoff_base_ms", &mut backoff.base),
            ("backoff_cap_ms", &mut backoff.cap),
            ("backoff_reset_after_ms", &mut backoff.reset_after),
            ("backoff_deadline_ms", &mut backoff.deadline),
        ] {
            if let Some(ms) = positive::<u64>(config, key)? {
                *slot = Duration::from_millis(ms);
            }
        }
        Ok(driver)
    }

    pub fn with_max_failure(mut self, max_failure: u32) -> Self {
        self.max_failure = max_failure;
        self
    }

    pub fn with_backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.backoff = backoff;
        self
    }
}

fn positive<T>(config: &TransportConfig, key: &str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr + Default + PartialEq,
{
    match config.parse_setting::<T>(key)? {
        Some(value) if value == T::default() => Err(ConfigError::InvalidValue {
            key: key.to_owned(),
            value: "0".to_owned(),
        }),
        parsed => Ok(parsed),
    }
}

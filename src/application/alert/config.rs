//! Alert dispatcher configuration.

use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;

/// Configuration for the alert dispatcher loop.
#[derive(Debug, Clone, Deserialize)]
pub struct DispatchConfig {
    /// Seconds between dispatch cycles.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    /// Maximum trades read from the store per cycle.
    #[serde(default = "default_batch_size")]
    pub batch_size: i64,
    /// Send attempts per alert before it is recorded as failed.
    #[serde(default = "default_send_max_attempts")]
    pub send_max_attempts: u32,
    /// Base delay between send attempts, multiplied by the attempt number.
    #[serde(default = "default_send_backoff_ms")]
    pub send_backoff_ms: u64,
    /// Upper bound on a single send.
    #[serde(default = "default_send_timeout_ms")]
    pub send_timeout_ms: u64,
    /// Full filter reload interval, independent of the reload signal.
    #[serde(default = "default_filter_refresh_secs")]
    pub filter_refresh_secs: u64,
    /// Trades older than this are suppressed instead of alerted.
    #[serde(default = "default_max_trade_age_secs")]
    pub max_trade_age_secs: u64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            batch_size: default_batch_size(),
            send_max_attempts: default_send_max_attempts(),
            send_backoff_ms: default_send_backoff_ms(),
            send_timeout_ms: default_send_timeout_ms(),
            filter_refresh_secs: default_filter_refresh_secs(),
            max_trade_age_secs: default_max_trade_age_secs(),
        }
    }
}

const fn default_poll_interval_secs() -> u64 {
    5
}

const fn default_batch_size() -> i64 {
    200
}

const fn default_send_max_attempts() -> u32 {
    3
}

const fn default_send_backoff_ms() -> u64 {
    1000
}

const fn default_send_timeout_ms() -> u64 {
    10_000
}

const fn default_filter_refresh_secs() -> u64 {
    300
}

const fn default_max_trade_age_secs() -> u64 {
    3600
}

impl DispatchConfig {
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    #[must_use]
    pub fn send_timeout(&self) -> Duration {
        Duration::from_millis(self.send_timeout_ms)
    }

    #[must_use]
    pub fn filter_refresh(&self) -> Duration {
        Duration::from_secs(self.filter_refresh_secs)
    }

    /// Validate numeric ranges.
    ///
    /// # Errors
    /// Returns the first invalid field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval_secs == 0 {
            return Err(invalid("dispatch.poll_interval_secs"));
        }
        if self.batch_size <= 0 {
            return Err(invalid("dispatch.batch_size"));
        }
        if self.send_max_attempts == 0 {
            return Err(invalid("dispatch.send_max_attempts"));
        }
        if self.send_timeout_ms == 0 {
            return Err(invalid("dispatch.send_timeout_ms"));
        }
        if self.filter_refresh_secs == 0 {
            return Err(invalid("dispatch.filter_refresh_secs"));
        }
        Ok(())
    }
}

fn invalid(field: &'static str) -> ConfigError {
    ConfigError::InvalidValue {
        field,
        reason: "must be greater than 0".into(),
    }
}

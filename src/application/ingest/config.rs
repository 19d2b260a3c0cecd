//! Ingestion scheduler configuration.

use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;

/// Configuration for the per-wallet ingestion scheduler.
#[derive(Debug, Clone, Deserialize)]
pub struct IngestionConfig {
    /// Seconds between polling rounds.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    /// Wallets polled concurrently at most.
    #[serde(default = "default_max_concurrent_polls")]
    pub max_concurrent_polls: usize,
    /// Pages fetched per wallet per poll once a cursor exists. A longer
    /// backlog is finished over the following polls.
    #[serde(default = "default_max_pages_per_poll")]
    pub max_pages_per_poll: u32,
    /// Pages fetched on a wallet's first poll (history backfill).
    #[serde(default = "default_initial_backfill_pages")]
    pub initial_backfill_pages: u32,
    /// First delay after a failed poll, doubled per consecutive failure.
    #[serde(default = "default_failure_backoff_initial_ms")]
    pub failure_backoff_initial_ms: u64,
    #[serde(default = "default_failure_backoff_max_ms")]
    pub failure_backoff_max_ms: u64,
    /// Seconds between sweeps of data left behind by removed wallets.
    #[serde(default = "default_orphan_sweep_interval_secs")]
    pub orphan_sweep_interval_secs: u64,
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            max_concurrent_polls: default_max_concurrent_polls(),
            max_pages_per_poll: default_max_pages_per_poll(),
            initial_backfill_pages: default_initial_backfill_pages(),
            failure_backoff_initial_ms: default_failure_backoff_initial_ms(),
            failure_backoff_max_ms: default_failure_backoff_max_ms(),
            orphan_sweep_interval_secs: default_orphan_sweep_interval_secs(),
        }
    }
}

const fn default_poll_interval_secs() -> u64 {
    10
}

const fn default_max_concurrent_polls() -> usize {
    8
}

const fn default_max_pages_per_poll() -> u32 {
    10
}

const fn default_initial_backfill_pages() -> u32 {
    1
}

const fn default_failure_backoff_initial_ms() -> u64 {
    2000
}

const fn default_failure_backoff_max_ms() -> u64 {
    300_000
}

const fn default_orphan_sweep_interval_secs() -> u64 {
    300
}

impl IngestionConfig {
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    #[must_use]
    pub fn orphan_sweep_interval(&self) -> Duration {
        Duration::from_secs(self.orphan_sweep_interval_secs)
    }

    /// Validate numeric ranges.
    ///
    /// # Errors
    /// Returns the first invalid field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("ingestion.poll_interval_secs", self.poll_interval_secs),
            ("ingestion.max_concurrent_polls", self.max_concurrent_polls as u64),
            ("ingestion.max_pages_per_poll", u64::from(self.max_pages_per_poll)),
            ("ingestion.initial_backfill_pages", u64::from(self.initial_backfill_pages)),
            ("ingestion.orphan_sweep_interval_secs", self.orphan_sweep_interval_secs),
        ];
        for (field, value) in positive {
            if value == 0 {
                return Err(ConfigError::InvalidValue {
                    field,
                    reason: "must be greater than 0".into(),
                });
            }
        }
        if self.failure_backoff_initial_ms > self.failure_backoff_max_ms {
            return Err(ConfigError::InvalidValue {
                field: "ingestion.failure_backoff_initial_ms",
                reason: "must not exceed failure_backoff_max_ms".into(),
            });
        }
        Ok(())
    }
}

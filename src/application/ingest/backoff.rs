//! Per-wallet failure backoff.

use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::domain::Address;

#[derive(Debug, Clone, Copy)]
struct FailureState {
    failures: u32,
    retry_at: Instant,
}

/// Tracks consecutive poll failures per wallet and when to try again.
///
/// The delay doubles with each failure up to `max`; a success clears it.
pub struct FailureBackoff {
    initial: Duration,
    max: Duration,
    state: DashMap<Address, FailureState>,
}

impl FailureBackoff {
    #[must_use]
    pub fn new(initial: Duration, max: Duration) -> Self {
        Self {
            initial,
            max,
            state: DashMap::new(),
        }
    }

    /// True while the wallet is still cooling down at `now`.
    #[must_use]
    pub fn is_waiting(&self, wallet: &Address, now: Instant) -> bool {
        self.state
            .get(wallet)
            .is_some_and(|entry| entry.retry_at > now)
    }

    /// Record a failure and return the delay before the next attempt.
    pub fn record_failure(&self, wallet: &Address, now: Instant) -> Duration {
        let mut entry = self.state.entry(wallet.clone()).or_insert(FailureState {
            failures: 0,
            retry_at: now,
        });
        entry.failures = entry.failures.saturating_add(1);
        let exponent = entry.failures.saturating_sub(1).min(20);
        let delay = self
            .initial
            .saturating_mul(1u32 << exponent)
            .min(self.max);
        entry.retry_at = now + delay;
        delay
    }

    pub fn record_success(&self, wallet: &Address) {
        self.state.remove(wallet);
    }

    #[must_use]
    pub fn failures(&self, wallet: &Address) -> u32 {
        self.state.get(wallet).map_or(0, |entry| entry.failures)
    }
}

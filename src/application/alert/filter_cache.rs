//! Dispatcher-owned cache of enabled alert configs.
//!
//! The cache is invalidated as a whole: when the reload signal moved past the
//! value last observed, or when the periodic refresh interval elapsed.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::domain::{AlertConfig, UserId};
use crate::error::Result;
use crate::port::{AlertConfigStore, ReloadSignal};

/// Enabled configs keyed by owner, with the reload marker they reflect.
pub struct FilterCache {
    configs: HashMap<UserId, AlertConfig>,
    /// Reload marker value observed before the last load.
    last_seen: Option<DateTime<Utc>>,
    loaded_at: Option<Instant>,
    refresh_every: Duration,
}

impl FilterCache {
    #[must_use]
    pub fn new(refresh_every: Duration) -> Self {
        Self {
            configs: HashMap::new(),
            last_seen: None,
            loaded_at: None,
            refresh_every,
        }
    }

    /// Reload configs if the reload signal advanced or the cache aged out.
    ///
    /// The marker is read before the configs, so a write that lands between
    /// the two reads is picked up again on the next call. Returns whether a
    /// reload happened.
    pub async fn refresh_if_needed(
        &mut self,
        signal: &dyn ReloadSignal,
        store: &dyn AlertConfigStore,
    ) -> Result<bool> {
        let marker = signal.current().await?;
        let observed = marker.as_ref().map(|m| m.requested_at);

        let signalled = match (observed, self.last_seen) {
            (Some(now), Some(seen)) => now > seen,
            (Some(_), None) => true,
            (None, _) => false,
        };
        let expired = self
            .loaded_at
            .map_or(true, |at| at.elapsed() >= self.refresh_every);

        if !signalled && !expired {
            return Ok(false);
        }

        let configs = store.list_enabled().await?;
        self.configs = configs
            .into_iter()
            .map(|config| (config.owner.clone(), config))
            .collect();
        self.last_seen = observed;
        self.loaded_at = Some(Instant::now());

        debug!(
            configs = self.configs.len(),
            signalled,
            requested_by = marker.as_ref().map(|m| m.requested_by.as_str()),
            "Alert filters reloaded"
        );
        Ok(true)
    }

    #[must_use]
    pub fn get(&self, owner: &UserId) -> Option<&AlertConfig> {
        self.configs.get(owner)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.configs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }

    #[must_use]
    pub fn last_seen(&self) -> Option<DateTime<Utc>> {
        self.last_seen
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;
    use crate::adapter::outbound::sqlite::store::test_store;
    use crate::domain::AlertConfigPatch;

    fn alice() -> UserId {
        UserId::parse("alice").unwrap()
    }

    fn enable() -> AlertConfigPatch {
        AlertConfigPatch {
            enabled: Some(true),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn first_refresh_always_loads() {
        let (_dir, store) = test_store();
        let mut cache = FilterCache::new(Duration::from_secs(300));

        assert!(cache.refresh_if_needed(&store, &store).await.unwrap());
        assert!(cache.is_empty());
        assert!(!cache.refresh_if_needed(&store, &store).await.unwrap());
    }

    #[tokio::test]
    async fn config_change_is_seen_on_next_refresh() {
        let (_dir, store) = test_store();
        let mut cache = FilterCache::new(Duration::from_secs(300));
        cache.refresh_if_needed(&store, &store).await.unwrap();

        store.upsert(&alice(), enable()).await.unwrap();
        assert!(cache.get(&alice()).is_none());

        assert!(cache.refresh_if_needed(&store, &store).await.unwrap());
        assert!(cache.get(&alice()).unwrap().enabled);

        store
            .upsert(
                &alice(),
                AlertConfigPatch {
                    min_notional_usd: Some(dec!(500)),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(cache.refresh_if_needed(&store, &store).await.unwrap());
        assert_eq!(cache.get(&alice()).unwrap().min_notional_usd, dec!(500));
    }

    #[tokio::test]
    async fn records_signal_value_it_observed() {
        let (_dir, store) = test_store();
        let marker = store.bump(&alice()).await.unwrap();
        let mut cache = FilterCache::new(Duration::from_secs(300));

        cache.refresh_if_needed(&store, &store).await.unwrap();
        assert_eq!(cache.last_seen(), Some(marker.requested_at));
    }

    #[tokio::test]
    async fn zero_interval_reloads_every_time() {
        let (_dir, store) = test_store();
        let mut cache = FilterCache::new(Duration::ZERO);

        assert!(cache.refresh_if_needed(&store, &store).await.unwrap());
        assert!(cache.refresh_if_needed(&store, &store).await.unwrap());
    }
}

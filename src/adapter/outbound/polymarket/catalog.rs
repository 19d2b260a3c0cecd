//! TTL-cached market metadata lookups.
//!
//! Market tags rarely change, while many trades hit the same markets, so
//! lookups are cached per condition id. Misses are cached too; failures are
//! not.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::debug;

use super::client::PolymarketClient;
use crate::domain::MarketMetadata;
use crate::error::Result;
use crate::port::outbound::market::MarketCatalog;

/// Entries kept before expired ones are swept.
const MAX_ENTRIES: usize = 10_000;

/// Source of uncached metadata.
#[async_trait]
pub trait MetadataSource: Send + Sync {
    async fn fetch(&self, condition_id: &str) -> Result<Option<MarketMetadata>>;
}

#[async_trait]
impl MetadataSource for PolymarketClient {
    async fn fetch(&self, condition_id: &str) -> Result<Option<MarketMetadata>> {
        self.fetch_market(condition_id).await
    }
}

/// Thread-safe metadata cache in front of a [`MetadataSource`].
pub struct CachedCatalog<S> {
    source: Arc<S>,
    /// Cached lookups with their insertion time.
    cache: DashMap<String, (Instant, Option<MarketMetadata>)>,
    ttl: Duration,
}

impl<S: MetadataSource> CachedCatalog<S> {
    #[must_use]
    pub fn new(source: Arc<S>, ttl: Duration) -> Self {
        Self {
            source,
            cache: DashMap::new(),
            ttl,
        }
    }

    fn cached(&self, condition_id: &str) -> Option<Option<MarketMetadata>> {
        let entry = self.cache.get(condition_id)?;
        let (inserted, metadata) = entry.value();
        (inserted.elapsed() < self.ttl).then(|| metadata.clone())
    }

    fn gc(&self) {
        let ttl = self.ttl;
        self.cache.retain(|_, (inserted, _)| inserted.elapsed() < ttl);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

#[async_trait]
impl<S: MetadataSource + 'static> MarketCatalog for CachedCatalog<S> {
    async fn lookup(&self, condition_id: &str) -> Result<Option<MarketMetadata>> {
        if let Some(hit) = self.cached(condition_id) {
            return Ok(hit);
        }

        let metadata = self.source.fetch(condition_id).await?;
        debug!(condition_id, found = metadata.is_some(), "Cached market metadata");
        self.cache
            .insert(condition_id.to_string(), (Instant::now(), metadata.clone()));

        if self.cache.len() > MAX_ENTRIES {
            self.gc();
        }
        Ok(metadata)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingSource {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl MetadataSource for CountingSource {
        async fn fetch(&self, condition_id: &str) -> Result<Option<MarketMetadata>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(Error::UpstreamTransient("down".into()));
            }
            if condition_id == "unknown" {
                return Ok(None);
            }
            Ok(Some(MarketMetadata::new(condition_id, "Title", None, vec![])))
        }
    }

    #[tokio::test]
    async fn repeated_lookups_hit_cache() {
        let source = Arc::new(CountingSource::default());
        let catalog = CachedCatalog::new(source.clone(), Duration::from_secs(60));

        assert!(catalog.lookup("0xabc").await.unwrap().is_some());
        assert!(catalog.lookup("0xabc").await.unwrap().is_some());
        assert!(catalog.lookup("unknown").await.unwrap().is_none());
        assert!(catalog.lookup("unknown").await.unwrap().is_none());

        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
        assert_eq!(catalog.len(), 2);
    }

    #[tokio::test]
    async fn expired_entries_are_refetched() {
        let source = Arc::new(CountingSource::default());
        let catalog = CachedCatalog::new(source.clone(), Duration::ZERO);

        catalog.lookup("0xabc").await.unwrap();
        catalog.lookup("0xabc").await.unwrap();

        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn failures_are_not_cached() {
        let source = Arc::new(CountingSource {
            fail: true,
            ..Default::default()
        });
        let catalog = CachedCatalog::new(source, Duration::from_secs(60));

        assert!(catalog.lookup("0xabc").await.is_err());
        assert!(catalog.is_empty());
    }
}

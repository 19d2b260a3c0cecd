//! Market metadata lookup port.

use async_trait::async_trait;

use crate::domain::MarketMetadata;
use crate::error::Result;

/// Resolves market metadata (title, slug, categories) by condition id.
#[async_trait]
pub trait MarketCatalog: Send + Sync {
    /// Metadata for a market, or `None` if the source does not know it.
    async fn lookup(&self, condition_id: &str) -> Result<Option<MarketMetadata>>;
}

/// Catalog that knows no markets. Every trade is treated as uncategorized.
pub struct NullCatalog;

#[async_trait]
impl MarketCatalog for NullCatalog {
    async fn lookup(&self, _condition_id: &str) -> Result<Option<MarketMetadata>> {
        Ok(None)
    }
}

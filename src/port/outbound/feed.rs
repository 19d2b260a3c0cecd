//! Upstream trade feed port.

use std::fmt;

use async_trait::async_trait;

use crate::domain::{Address, CursorPosition, Trade};
use crate::error::Result;

/// Opaque continuation token handed back by a feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageToken(String);

impl PageToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PageToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One page of a wallet's feed.
#[derive(Debug, Clone, Default)]
pub struct FeedPage {
    /// Trades newer than the requested cursor, in feed order.
    pub trades: Vec<Trade>,
    /// Token for the next page, or `None` when there is no more new data.
    pub next: Option<PageToken>,
}

/// Paginated per-wallet trade source.
///
/// Implementations return only trades strictly after `since` (the boundary
/// trade itself is skipped) and stop paginating once the cursor is crossed.
#[async_trait]
pub trait TradeFeed: Send + Sync {
    /// Fetch one page. Transient failures surface as
    /// [`Error::UpstreamTransient`](crate::error::Error::UpstreamTransient).
    async fn fetch_page(
        &self,
        wallet: &Address,
        since: Option<&CursorPosition>,
        page: Option<&PageToken>,
    ) -> Result<FeedPage>;
}

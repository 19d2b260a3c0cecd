//! Polymarket REST API client.
//!
//! Supports two API surfaces:
//! - **Data API** (`data-api.polymarket.com`): per-wallet trade history,
//!   newest first, paginated by `limit`/`offset`
//! - **Gamma API** (`gamma-api.polymarket.com`): market metadata with tags
//!
//! The Data API side implements [`TradeFeed`]; Gamma lookups back the
//! cached [`MarketCatalog`](crate::port::MarketCatalog) in `catalog`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client as HttpClient, StatusCode};
use tokio::time::sleep;
use tracing::{debug, warn};
use url::Url;

use super::dto::market::GammaMarket;
use super::dto::trade::DataApiTrade;
use super::settings::PolymarketConfig;
use crate::domain::{Address, CursorPosition, MarketMetadata, Trade};
use crate::error::{Error, Result};
use crate::port::outbound::feed::{FeedPage, PageToken, TradeFeed};

/// HTTP client for the Polymarket Data and Gamma APIs.
pub struct PolymarketClient {
    http: HttpClient,
    data_url: String,
    gamma_url: String,
    page_size: u32,
    retry_max_attempts: u32,
    retry_backoff_ms: u64,
}

impl PolymarketClient {
    #[must_use]
    pub fn from_config(config: &PolymarketConfig) -> Self {
        let http = HttpClient::builder()
            .timeout(Duration::from_millis(config.http.timeout_ms))
            .connect_timeout(Duration::from_millis(config.http.connect_timeout_ms))
            .build()
            .unwrap_or_else(|err| {
                warn!(error = %err, "Failed to build HTTP client, using defaults");
                HttpClient::new()
            });

        Self {
            http,
            data_url: config.data_api_url.trim_end_matches('/').to_string(),
            gamma_url: config.gamma_api_url.trim_end_matches('/').to_string(),
            page_size: config.page_size.max(1),
            retry_max_attempts: config.http.retry_max_attempts,
            retry_backoff_ms: config.http.retry_backoff_ms,
        }
    }

    /// GET and decode JSON, retrying timeouts, connection failures, 429 and 5xx.
    ///
    /// Exhausted retries surface as [`Error::UpstreamTransient`]; other HTTP
    /// errors and undecodable bodies as [`Error::Upstream`].
    async fn get_with_retry<T>(&self, url: &Url) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        let mut attempt = 0;
        let max_attempts = self.retry_max_attempts.max(1);

        loop {
            attempt += 1;
            let failure = match self.http.get(url.clone()).send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        match response.json::<T>().await {
                            Ok(parsed) => return Ok(parsed),
                            Err(err) if Self::should_retry(&err) => err.to_string(),
                            Err(err) => {
                                return Err(Error::Upstream(format!(
                                    "malformed response from {}: {err}",
                                    url.path()
                                )))
                            }
                        }
                    } else if Self::retryable_status(status) {
                        format!("HTTP {status} from {}", url.path())
                    } else {
                        return Err(Error::Upstream(format!(
                            "HTTP {status} from {}",
                            url.path()
                        )));
                    }
                }
                Err(err) if Self::should_retry(&err) => err.to_string(),
                Err(err) => return Err(err.into()),
            };

            if attempt >= max_attempts {
                return Err(Error::UpstreamTransient(failure));
            }
            self.backoff(attempt, max_attempts, &failure).await;
        }
    }

    fn should_retry(err: &reqwest::Error) -> bool {
        err.is_timeout() || err.is_connect()
    }

    fn retryable_status(status: StatusCode) -> bool {
        status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
    }

    async fn backoff(&self, attempt: u32, max_attempts: u32, failure: &str) {
        warn!(
            attempt,
            max_attempts,
            error = %failure,
            "HTTP request failed, retrying"
        );
        if self.retry_backoff_ms > 0 {
            sleep(Duration::from_millis(self.retry_backoff_ms * u64::from(attempt))).await;
        }
    }

    fn trades_url(&self, wallet: &Address, offset: u64) -> Result<Url> {
        let mut url = Url::parse(&format!("{}/trades", self.data_url))?;
        url.query_pairs_mut()
            .append_pair("user", wallet.as_str())
            .append_pair("limit", &self.page_size.to_string())
            .append_pair("offset", &offset.to_string());
        Ok(url)
    }

    /// Fetch metadata for one market from the Gamma API.
    ///
    /// Returns `None` when Gamma has no market for the condition id.
    pub async fn fetch_market(&self, condition_id: &str) -> Result<Option<MarketMetadata>> {
        let mut url = Url::parse(&format!("{}/markets", self.gamma_url))?;
        url.query_pairs_mut()
            .append_pair("condition_ids", condition_id)
            .append_pair("include_tag", "true")
            .append_pair("limit", "1");

        let markets: Vec<GammaMarket> = self.get_with_retry(&url).await?;
        let metadata = markets
            .into_iter()
            .next()
            .map(|m| m.into_metadata(condition_id));
        debug!(condition_id, found = metadata.is_some(), "Fetched market metadata");
        Ok(metadata)
    }
}

/// Build a feed page from one raw Data API response.
///
/// The Data API lists a wallet's trades newest first, so the cursor is
/// crossed as soon as an older trade or the boundary trade itself appears.
/// A short page means the history is exhausted.
fn page_from(
    raw: Vec<DataApiTrade>,
    wallet: &Address,
    since: Option<&CursorPosition>,
    offset: u64,
    page_size: u32,
) -> FeedPage {
    let received = raw.len();
    let mut crossed = false;

    let trades: Vec<Trade> = raw
        .into_iter()
        .filter_map(|r| r.into_trade(wallet))
        .filter(|trade| match since {
            None => true,
            // Trades sharing the boundary's timestamp may be listed on either
            // side of it, so only a strictly older trade ends the walk.
            Some(boundary) => {
                if trade.timestamp < boundary.timestamp {
                    crossed = true;
                    return false;
                }
                !(trade.timestamp == boundary.timestamp
                    && trade.tx_hash.as_str() == boundary.tx_hash)
            }
        })
        .collect();

    let full = received >= page_size as usize;
    let next = (full && !crossed).then(|| PageToken::new((offset + received as u64).to_string()));

    FeedPage { trades, next }
}

#[async_trait]
impl TradeFeed for PolymarketClient {
    async fn fetch_page(
        &self,
        wallet: &Address,
        since: Option<&CursorPosition>,
        page: Option<&PageToken>,
    ) -> Result<FeedPage> {
        let offset = match page {
            Some(token) => token
                .as_str()
                .parse::<u64>()
                .map_err(|_| Error::Upstream(format!("invalid page token '{token}'")))?,
            None => 0,
        };

        let url = self.trades_url(wallet, offset)?;
        let raw: Vec<DataApiTrade> = self.get_with_retry(&url).await?;
        debug!(wallet = %wallet, offset, received = raw.len(), "Fetched trade page");

        Ok(page_from(raw, wallet, since, offset, self.page_size))
    }
}

//! Polymarket API configuration.

use serde::Deserialize;

use crate::error::ConfigError;

/// Upper bound accepted by the Data API for `limit`.
pub const MAX_PAGE_SIZE: u32 = 500;

/// Polymarket endpoints and pagination.
#[derive(Debug, Clone, Deserialize)]
pub struct PolymarketConfig {
    /// Data API base URL (per-wallet trade history).
    #[serde(default = "default_data_api_url")]
    pub data_api_url: String,
    /// Gamma API base URL (market metadata and tags).
    #[serde(default = "default_gamma_api_url")]
    pub gamma_api_url: String,
    /// Trades requested per page.
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default)]
    pub http: PolymarketHttpConfig,
}

fn default_data_api_url() -> String {
    "https://data-api.polymarket.com".into()
}

fn default_gamma_api_url() -> String {
    "https://gamma-api.polymarket.com".into()
}

const fn default_page_size() -> u32 {
    100
}

impl Default for PolymarketConfig {
    fn default() -> Self {
        Self {
            data_api_url: default_data_api_url(),
            gamma_api_url: default_gamma_api_url(),
            page_size: default_page_size(),
            http: PolymarketHttpConfig::default(),
        }
    }
}

impl PolymarketConfig {
    /// Validate endpoint URLs and numeric ranges.
    ///
    /// # Errors
    /// Returns the first invalid field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("polymarket.data_api_url", &self.data_api_url),
            ("polymarket.gamma_api_url", &self.gamma_api_url),
        ] {
            url::Url::parse(value).map_err(|e| ConfigError::InvalidValue {
                field,
                reason: e.to_string(),
            })?;
        }
        if self.page_size == 0 || self.page_size > MAX_PAGE_SIZE {
            return Err(ConfigError::InvalidValue {
                field: "polymarket.page_size",
                reason: format!("must be between 1 and {MAX_PAGE_SIZE}"),
            });
        }
        if self.http.timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "polymarket.http.timeout_ms",
                reason: "must be greater than 0".into(),
            });
        }
        Ok(())
    }
}

/// Polymarket HTTP client configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct PolymarketHttpConfig {
    /// Request timeout in milliseconds.
    #[serde(default = "default_http_timeout_ms")]
    pub timeout_ms: u64,
    /// Connect timeout in milliseconds.
    #[serde(default = "default_http_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    /// Maximum number of attempts for transient failures.
    #[serde(default = "default_http_retry_max_attempts")]
    pub retry_max_attempts: u32,
    /// Backoff between retries in milliseconds.
    #[serde(default = "default_http_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
    /// How long market metadata stays cached, in seconds.
    #[serde(default = "default_metadata_ttl_secs")]
    pub metadata_ttl_secs: u64,
}

const fn default_http_timeout_ms() -> u64 {
    5000
}

const fn default_http_connect_timeout_ms() -> u64 {
    2000
}

const fn default_http_retry_max_attempts() -> u32 {
    3
}

const fn default_http_retry_backoff_ms() -> u64 {
    250
}

const fn default_metadata_ttl_secs() -> u64 {
    86_400
}

impl Default for PolymarketHttpConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_http_timeout_ms(),
            connect_timeout_ms: default_http_connect_timeout_ms(),
            retry_max_attempts: default_http_retry_max_attempts(),
            retry_backoff_ms: default_http_retry_backoff_ms(),
            metadata_ttl_secs: default_metadata_ttl_secs(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = PolymarketConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.page_size, 100);
        assert_eq!(config.http.metadata_ttl_secs, 86_400);
    }

    #[test]
    fn page_size_bounds() {
        let mut config = PolymarketConfig::default();
        config.page_size = 0;
        assert!(config.validate().is_err());
        config.page_size = MAX_PAGE_SIZE + 1;
        assert!(config.validate().is_err());
        config.page_size = MAX_PAGE_SIZE;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_malformed_url() {
        let config = PolymarketConfig {
            gamma_api_url: "not a url".into(),
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("gamma_api_url"));
    }
}

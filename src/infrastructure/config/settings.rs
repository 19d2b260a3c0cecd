//! Application configuration loading and validation.
//!
//! Provides the main [`Config`] struct that aggregates all application settings.
//! Configuration is loaded from a TOML file; secrets such as the Telegram bot
//! token come from the environment only.
//!
//! # Example
//!
//! ```no_run
//! use whalewatch::infrastructure::config::settings::Config;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load("config.toml")?;
//!     config.init_logging();
//!     Ok(())
//! }
//! ```

use std::path::Path;

use serde::Deserialize;

use super::logging::LoggingConfig;
use super::telegram::TelegramAppConfig;
use crate::adapter::outbound::polymarket::settings::PolymarketConfig;
use crate::application::alert::config::DispatchConfig;
use crate::application::ingest::config::IngestionConfig;
use crate::error::{ConfigError, Result};

/// Main application configuration.
///
/// Load from a TOML file using [`Config::load`] or parse directly with
/// [`Config::parse_toml`]. Every section is optional.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Path to SQLite database file.
    ///
    /// Defaults to "whalewatch.db" in the current directory.
    #[serde(default = "default_database_path")]
    pub database: String,

    /// Enable dry-run mode.
    ///
    /// When true, alerts are evaluated and recorded but only written to the
    /// log. Defaults to false.
    #[serde(default)]
    pub dry_run: bool,

    /// Logging and tracing configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Polymarket Data and Gamma API settings.
    #[serde(default)]
    pub polymarket: PolymarketConfig,

    /// Per-wallet polling schedule.
    #[serde(default)]
    pub ingestion: IngestionConfig,

    /// Alert evaluation and delivery.
    #[serde(default)]
    pub dispatch: DispatchConfig,

    /// Telegram notification configuration.
    #[serde(default)]
    pub telegram: TelegramAppConfig,
}

fn default_database_path() -> String {
    "whalewatch.db".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: default_database_path(),
            dry_run: false,
            logging: LoggingConfig::default(),
            polymarket: PolymarketConfig::default(),
            ingestion: IngestionConfig::default(),
            dispatch: DispatchConfig::default(),
            telegram: TelegramAppConfig::default(),
        }
    }
}

impl Config {
    /// Parse configuration from TOML content.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML content is malformed or validation fails.
    pub fn parse_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file cannot be read
    /// - The TOML content is malformed
    /// - Validation fails
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        Self::parse_toml(&content)
    }

    /// Validate configuration values.
    ///
    /// Checks that all required fields are present and values are within
    /// acceptable ranges.
    fn validate(&self) -> Result<()> {
        if self.database.trim().is_empty() {
            return Err(ConfigError::MissingField { field: "database" }.into());
        }
        self.logging.validate()?;
        self.polymarket.validate()?;
        self.ingestion.validate()?;
        self.dispatch.validate()?;
        self.telegram.validate()?;
        Ok(())
    }

    /// Initialize logging with the configured settings.
    pub fn init_logging(&self) {
        self.logging.init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::port::UpdateMode;

    #[test]
    fn empty_file_uses_defaults() {
        let config = Config::parse_toml("").unwrap();

        assert_eq!(config.database, "whalewatch.db");
        assert!(!config.dry_run);
        assert_eq!(config.logging.format, "pretty");
        assert_eq!(config.polymarket.page_size, 100);
        assert_eq!(config.ingestion.max_concurrent_polls, 8);
        assert_eq!(config.dispatch.batch_size, 200);
        assert!(!config.telegram.enabled);
    }

    #[test]
    fn sections_override_defaults() {
        let config = Config::parse_toml(
            r#"
            database = "/var/lib/whalewatch/data.db"
            dry_run = true

            [logging]
            level = "debug"
            format = "json"

            [polymarket]
            page_size = 250

            [polymarket.http]
            retry_max_attempts = 5

            [ingestion]
            poll_interval_secs = 30
            max_concurrent_polls = 2

            [dispatch]
            send_max_attempts = 4
            max_trade_age_secs = 0

            [telegram]
            enabled = true
            update_mode = "webhook"
            "#,
        )
        .unwrap();

        assert_eq!(config.database, "/var/lib/whalewatch/data.db");
        assert!(config.dry_run);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.polymarket.page_size, 250);
        assert_eq!(config.polymarket.http.retry_max_attempts, 5);
        assert_eq!(config.polymarket.http.timeout_ms, 5000);
        assert_eq!(config.ingestion.poll_interval_secs, 30);
        assert_eq!(config.ingestion.max_pages_per_poll, 10);
        assert_eq!(config.dispatch.send_max_attempts, 4);
        assert_eq!(config.dispatch.max_trade_age_secs, 0);
        assert!(config.telegram.enabled);
        assert_eq!(config.telegram.update_mode, UpdateMode::Webhook);
        assert_eq!(config.telegram.per_chat_min_interval_ms, 1000);
    }

    #[test]
    fn invalid_values_are_rejected() {
        for toml in [
            "[polymarket]\npage_size = 0",
            "[polymarket]\ndata_api_url = \"not a url\"",
            "[ingestion]\nmax_concurrent_polls = 0",
            "[dispatch]\nbatch_size = 0",
            "[logging]\nformat = \"xml\"",
            "database = \"\"",
        ] {
            let err = Config::parse_toml(toml).unwrap_err();
            assert!(matches!(err, Error::Config(_)), "{toml}: {err}");
        }
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let err = Config::parse_toml("dry_run = maybe").unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::Parse(_))));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = Config::load("/nonexistent/whalewatch.toml").unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::ReadFile(_))));
    }
}

//! Handler for the `check` command.

use std::path::Path;

use crate::cli::output;
use crate::error::Result;
use crate::infrastructure::bootstrap::open_storage;
use crate::infrastructure::config::settings::Config;

/// Validate configuration and open the database without starting the worker.
pub async fn execute(config_path: &Path) -> Result<()> {
    output::section(&format!("Checking configuration: {}", config_path.display()));

    let config = Config::load(config_path)?;
    output::ok("Configuration file is valid");
    output::key_value("Database", &config.database);
    output::key_value("Dry-run", config.dry_run);
    output::key_value("Data API", &config.polymarket.data_api_url);
    output::key_value("Poll every", format!("{}s", config.ingestion.poll_interval_secs));

    if config.telegram.enabled {
        if std::env::var("TELEGRAM_BOT_TOKEN").is_ok_and(|t| !t.trim().is_empty()) {
            output::ok("Telegram configured and enabled");
        } else {
            output::warn("Telegram enabled but TELEGRAM_BOT_TOKEN is not set");
        }
    } else {
        output::key_value("Telegram", "disabled");
    }

    let storage = open_storage(&config.database)?;
    output::ok("Database migrated");
    output::key_value("Trades", storage.trades.count_all().await?);
    output::key_value("Wallets", storage.wallets.active_addresses().await?.len());

    Ok(())
}

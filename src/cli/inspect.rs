//! Handlers for the read-only `trades` and `failed` commands.

use std::path::Path;

use crate::cli::{output, FailedArgs, TradesArgs};
use crate::error::Result;
use crate::infrastructure::bootstrap::{open_storage, Services};
use crate::infrastructure::config::settings::Config;

fn services(config_path: &Path) -> Result<Services> {
    let config = Config::load(config_path)?;
    let storage = open_storage(&config.database)?;
    Ok(Services::new(&storage))
}

/// Print a page of recent trades.
pub async fn execute_trades(config_path: &Path, args: &TradesArgs) -> Result<()> {
    let page = services(config_path)?
        .trades
        .list_recent(args.limit, args.offset, args.min_notional)
        .await?;

    output::section(&format!(
        "Trades {}-{} of {}",
        page.offset + 1,
        page.offset + page.trades.len() as i64,
        page.total
    ));
    if page.trades.is_empty() {
        output::none("trades");
    }
    page.trades.iter().for_each(output::trade_row);
    Ok(())
}

/// Print deliveries that ended failed.
pub async fn execute_failed(config_path: &Path, args: &FailedArgs) -> Result<()> {
    let failed = services(config_path)?
        .trades
        .failed_dispatches(args.limit)
        .await?;

    output::section(&format!("Failed alerts ({})", failed.len()));
    if failed.is_empty() {
        output::none("failed alerts");
    }
    failed.iter().for_each(output::failed_row);
    Ok(())
}

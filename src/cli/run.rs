//! Handler for the `run` command.

use std::path::Path;

use tokio::signal;
use tracing::{error, info};

use crate::cli::RunArgs;
use crate::error::Result;
use crate::infrastructure::bootstrap::Worker;
use crate::infrastructure::config::settings::Config;

/// Execute the run command: start the worker and wait for Ctrl-C.
pub async fn execute(config_path: &Path, args: &RunArgs) -> Result<()> {
    let mut config = Config::load(config_path)?;

    if args.dry_run {
        config.dry_run = true;
    }
    if args.json_logs {
        config.logging.format = "json".to_string();
    }

    config.init_logging();
    info!(
        database = %config.database,
        dry_run = config.dry_run,
        telegram = config.telegram.enabled,
        "whalewatch starting"
    );

    let worker = Worker::start(&config).await?;

    if let Err(e) = signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
    } else {
        info!("Shutdown signal received");
    }

    worker.shutdown().await;
    info!("whalewatch stopped");
    Ok(())
}

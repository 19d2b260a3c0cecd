//! Command-line interface definitions.

pub mod check;
pub mod inspect;
pub mod output;
pub mod run;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use rust_decimal::Decimal;

/// Whalewatch - prediction market wallet tracker and whale alerts.
#[derive(Parser, Debug)]
#[command(name = "whalewatch")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true, default_value = "config.toml")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the ingestion and alert worker (default)
    Run(RunArgs),

    /// Validate configuration and database without starting the worker
    Check,

    /// List recent trades, newest first
    Trades(TradesArgs),

    /// List alerts whose delivery failed
    Failed(FailedArgs),
}

/// Arguments for the `run` subcommand.
#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Log alerts instead of delivering them
    #[arg(long)]
    pub dry_run: bool,

    /// Emit JSON logs
    #[arg(long)]
    pub json_logs: bool,
}

/// Arguments for the `trades` subcommand.
#[derive(Args, Debug)]
pub struct TradesArgs {
    /// Maximum trades to show (1-1000)
    #[arg(short, long, default_value_t = 20)]
    pub limit: i64,

    /// Trades to skip
    #[arg(short, long, default_value_t = 0)]
    pub offset: i64,

    /// Only trades with at least this notional (USD)
    #[arg(long)]
    pub min_notional: Option<Decimal>,
}

/// Arguments for the `failed` subcommand.
#[derive(Args, Debug)]
pub struct FailedArgs {
    /// Maximum records to show
    #[arg(short, long, default_value_t = 20)]
    pub limit: i64,
}

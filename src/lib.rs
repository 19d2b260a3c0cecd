//! Whalewatch - prediction market wallet tracking and whale alerts.
//!
//! A long-running worker polls the Polymarket Data API for every tracked
//! wallet, stores new trades, and alerts users over Telegram when a trade
//! matches their filter.
//!
//! # Architecture
//!
//! The crate follows a hexagonal layout:
//!
//! - [`domain`] - Exchange-agnostic types: trades, cursors, alert filters
//! - [`port`] - Traits for storage, the trade feed, market metadata and
//!   notification channels
//! - [`adapter`] - SQLite (Diesel), Polymarket (reqwest) and Telegram
//!   (teloxide) implementations of the ports
//! - [`application`] - Ingestion scheduler, alert dispatcher and the use
//!   cases called by the account layer
//! - [`infrastructure`] - Configuration, logging and runtime wiring
//! - [`cli`] - Command-line entry points
//!
//! # Features
//!
//! - `telegram` - Deliver alerts through a Telegram bot (default)
//!
//! # Example
//!
//! ```no_run
//! use whalewatch::infrastructure::bootstrap::{open_storage, Services};
//! use whalewatch::domain::UserId;
//!
//! # async fn demo() -> whalewatch::error::Result<()> {
//! let storage = open_storage("whalewatch.db")?;
//! let services = Services::new(&storage);
//! let owner = UserId::parse("user-1")?;
//! services
//!     .wallets
//!     .add(&owner, "0x56687bf447db6ffa42ffe2204a05edaa20f55839")
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod adapter;
pub mod application;
pub mod cli;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod port;

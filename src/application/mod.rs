//! Application services (use cases).
//!
//! These services orchestrate domain logic and coordinate adapters
//! to implement the application's use cases: the two long-running worker
//! loops and the call surface used by the account/API layer.

pub mod alert;
pub mod alert_config;
pub mod binding;
pub mod ingest;
pub mod query;
pub mod wallet;

pub use alert::{AlertDispatcher, DispatchConfig, DispatchHandle};
pub use alert_config::AlertConfigService;
pub use binding::BindingService;
pub use ingest::{IngestionConfig, IngestionHandle, IngestionScheduler};
pub use query::{TradePage, TradeQueryService};
pub use wallet::WalletService;

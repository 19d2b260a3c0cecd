//! Whale alert evaluation and delivery.

pub mod config;
pub mod dispatcher;
pub mod filter_cache;
pub mod message;

pub use config::DispatchConfig;
pub use dispatcher::{AlertDispatcher, DispatchHandle, DispatchSummary};
pub use filter_cache::FilterCache;
pub use message::render_alert;

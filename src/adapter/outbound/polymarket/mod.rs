//! Polymarket integration: Data API trade feed and Gamma API market catalog.

pub mod catalog;
pub mod client;
pub mod dto;
pub mod settings;

pub use catalog::CachedCatalog;
pub use client::PolymarketClient;
pub use settings::{PolymarketConfig, PolymarketHttpConfig};

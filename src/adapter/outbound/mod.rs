//! Outbound adapters (driven side): implementations of outbound ports.

pub mod notifier;
pub mod polymarket;
pub mod sqlite;

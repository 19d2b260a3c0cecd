//! Outbound ports (driven side): interfaces implemented by outbound adapters.
//!
//! These contracts describe infrastructure dependencies such as storage,
//! the upstream trade feed, market metadata, and notifications.

pub mod feed;
pub mod market;
pub mod notifier;
pub mod store;

//! Notification channel port.
//!
//! This module defines the trait for delivering preformatted alert text to a
//! user's messaging endpoint.

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::Result;

/// How the channel adapter receives inbound updates from its platform.
///
/// Only affects how endpoints get bound; outbound delivery is identical.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateMode {
    /// The adapter pulls updates from the platform.
    #[default]
    Polling,
    /// The platform pushes updates to a registered webhook.
    Webhook,
}

/// Trait for alert delivery transports.
///
/// # Implementation Notes
///
/// - Implementations must be thread-safe (`Send + Sync`)
/// - No ordering is guaranteed across different endpoints
/// - `Ok(false)` means the endpoint permanently refused delivery (for example
///   the user blocked the bot); transient failures are returned as errors
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    /// Deliver `message` to `endpoint_id`.
    async fn send(&self, endpoint_id: &str, message: &str) -> Result<bool>;

    /// Short name used in logs.
    fn name(&self) -> &'static str;

    fn update_mode(&self) -> UpdateMode {
        UpdateMode::Polling
    }
}

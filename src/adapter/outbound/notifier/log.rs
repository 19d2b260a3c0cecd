//! Channel that writes alerts to the log instead of delivering them.

use async_trait::async_trait;
use tracing::info;

use crate::error::Result;
use crate::port::outbound::notifier::NotificationChannel;

/// Logs every alert and reports it as delivered.
///
/// Used in dry-run mode and when no messaging transport is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogChannel;

#[async_trait]
impl NotificationChannel for LogChannel {
    async fn send(&self, endpoint_id: &str, message: &str) -> Result<bool> {
        info!(endpoint = %endpoint_id, message = %message, "Alert (log channel)");
        Ok(true)
    }

    fn name(&self) -> &'static str {
        "log"
    }
}

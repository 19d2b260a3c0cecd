//! Telegram channel configuration.

use serde::Deserialize;

#[cfg(feature = "telegram")]
use crate::adapter::outbound::notifier::telegram::TelegramSettings;
use crate::error::ConfigError;
use crate::port::UpdateMode;

/// Telegram delivery configuration. The bot token comes from
/// `TELEGRAM_BOT_TOKEN`, never from the config file.
#[derive(Debug, Clone, Deserialize)]
pub struct TelegramAppConfig {
    /// Deliver alerts through Telegram instead of the log.
    #[serde(default)]
    pub enabled: bool,
    /// Minimum gap between messages to one chat (default: 1000).
    #[serde(default = "default_per_chat_min_interval_ms")]
    pub per_chat_min_interval_ms: u64,
    /// Minimum gap between any two messages (default: 34, about 30/s).
    #[serde(default = "default_global_min_interval_ms")]
    pub global_min_interval_ms: u64,
    #[serde(default)]
    pub update_mode: UpdateMode,
}

const fn default_per_chat_min_interval_ms() -> u64 {
    1000
}

const fn default_global_min_interval_ms() -> u64 {
    34
}

impl Default for TelegramAppConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            per_chat_min_interval_ms: default_per_chat_min_interval_ms(),
            global_min_interval_ms: default_global_min_interval_ms(),
            update_mode: UpdateMode::default(),
        }
    }
}

impl TelegramAppConfig {
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.per_chat_min_interval_ms < self.global_min_interval_ms {
            return Err(ConfigError::InvalidValue {
                field: "telegram.per_chat_min_interval_ms",
                reason: "must be >= global_min_interval_ms".into(),
            });
        }
        Ok(())
    }

    /// Runtime settings for the channel adapter.
    #[cfg(feature = "telegram")]
    #[must_use]
    pub fn settings(&self, bot_token: String) -> TelegramSettings {
        use std::time::Duration;

        TelegramSettings {
            bot_token,
            per_chat_min_interval: Duration::from_millis(self.per_chat_min_interval_ms),
            global_min_interval: Duration::from_millis(self.global_min_interval_ms),
            update_mode: self.update_mode,
        }
    }
}

//! Telegram delivery of preformatted HTML alerts.

use std::time::Duration;

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::ParseMode;
use teloxide::{ApiError, RequestError};
use tokio::time::sleep;
use tracing::{info, warn};

use super::throttle::SendThrottle;
use crate::error::{Error, Result};
use crate::port::outbound::notifier::{NotificationChannel, UpdateMode};

/// Times a single send is retried after Telegram answers `RetryAfter`.
const MAX_RETRY_AFTER: u32 = 3;

/// Runtime settings for the Telegram channel.
#[derive(Debug, Clone)]
pub struct TelegramSettings {
    /// Bot API token obtained from BotFather.
    pub bot_token: String,
    pub per_chat_min_interval: Duration,
    pub global_min_interval: Duration,
    pub update_mode: UpdateMode,
}

impl TelegramSettings {
    /// Read the bot token from `TELEGRAM_BOT_TOKEN`.
    ///
    /// Returns `None` when the variable is unset or blank.
    #[must_use]
    pub fn token_from_env() -> Option<String> {
        std::env::var("TELEGRAM_BOT_TOKEN")
            .ok()
            .filter(|t| !t.trim().is_empty())
    }
}

/// Delivers alerts to Telegram chats.
///
/// Endpoint ids are numeric chat ids. Chats that blocked the bot or no longer
/// exist are reported as rejected (`Ok(false)`).
pub struct TelegramChannel {
    bot: Bot,
    throttle: SendThrottle,
    update_mode: UpdateMode,
}

impl TelegramChannel {
    #[must_use]
    pub fn new(settings: &TelegramSettings) -> Self {
        info!(update_mode = ?settings.update_mode, "Telegram channel ready");
        Self {
            bot: Bot::new(&settings.bot_token),
            throttle: SendThrottle::new(
                settings.per_chat_min_interval,
                settings.global_min_interval,
            ),
            update_mode: settings.update_mode,
        }
    }
}

/// Errors meaning the chat will never accept messages from this bot.
fn is_endpoint_rejection(err: &ApiError) -> bool {
    matches!(
        err,
        ApiError::BotBlocked
            | ApiError::ChatNotFound
            | ApiError::UserDeactivated
            | ApiError::BotKicked
            | ApiError::BotKickedFromSupergroup
            | ApiError::CantInitiateConversation
            | ApiError::CantTalkWithBots
    )
}

#[async_trait]
impl NotificationChannel for TelegramChannel {
    async fn send(&self, endpoint_id: &str, message: &str) -> Result<bool> {
        let Ok(chat) = endpoint_id.trim().parse::<i64>() else {
            warn!(endpoint = %endpoint_id, "Telegram endpoint is not a chat id");
            return Ok(false);
        };

        let mut retries = 0;
        loop {
            self.throttle.wait(endpoint_id).await;

            let result = self
                .bot
                .send_message(ChatId(chat), message)
                .parse_mode(ParseMode::Html)
                .await;

            match result {
                Ok(_) => return Ok(true),
                Err(RequestError::RetryAfter(after)) if retries < MAX_RETRY_AFTER => {
                    retries += 1;
                    let delay = after.duration();
                    warn!(chat_id = chat, delay_secs = delay.as_secs(), "Telegram rate limited, backing off");
                    self.throttle.pause(delay);
                    sleep(delay).await;
                }
                Err(RequestError::Api(err)) if is_endpoint_rejection(&err) => {
                    warn!(chat_id = chat, error = %err, "Telegram chat rejected delivery");
                    return Ok(false);
                }
                Err(err) => return Err(Error::ChannelDelivery(err.to_string())),
            }
        }
    }

    fn name(&self) -> &'static str {
        "telegram"
    }

    fn update_mode(&self) -> UpdateMode {
        self.update_mode
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocked_and_missing_chats_are_rejections() {
        assert!(is_endpoint_rejection(&ApiError::BotBlocked));
        assert!(is_endpoint_rejection(&ApiError::ChatNotFound));
        assert!(!is_endpoint_rejection(&ApiError::MessageTextIsEmpty));
    }

    #[tokio::test]
    async fn non_numeric_endpoint_is_rejected_without_network() {
        let channel = TelegramChannel::new(&TelegramSettings {
            bot_token: "123:abc".into(),
            per_chat_min_interval: Duration::ZERO,
            global_min_interval: Duration::ZERO,
            update_mode: UpdateMode::Polling,
        });

        assert!(!channel.send("@someone", "hi").await.unwrap());
        assert_eq!(channel.name(), "telegram");
    }
}

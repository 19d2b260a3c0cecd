//! Send pacing for the Telegram Bot API limits.

use std::time::{Duration, Instant};

use dashmap::DashMap;
use parking_lot::Mutex;
use tokio::time::sleep;

/// Spaces sends per chat and globally.
///
/// Each call reserves the next free slot, so concurrent senders queue up
/// behind each other instead of bursting.
pub(super) struct SendThrottle {
    per_chat: Duration,
    global: Duration,
    next_global: Mutex<Option<Instant>>,
    next_per_chat: DashMap<String, Instant>,
}

impl SendThrottle {
    pub(super) fn new(per_chat: Duration, global: Duration) -> Self {
        Self {
            per_chat,
            global,
            next_global: Mutex::new(None),
            next_per_chat: DashMap::new(),
        }
    }

    /// Reserve a send slot for `chat` and return how long to wait for it.
    pub(super) fn reserve(&self, chat: &str, now: Instant) -> Duration {
        let chat_ready = self
            .next_per_chat
            .get(chat)
            .map_or(now, |entry| *entry.value())
            .max(now);

        let mut next_global = self.next_global.lock();
        let slot = chat_ready.max(next_global.unwrap_or(now));
        *next_global = Some(slot + self.global);
        self.next_per_chat
            .insert(chat.to_string(), slot + self.per_chat);

        slot.saturating_duration_since(now)
    }

    /// Wait until `chat` may be sent to.
    pub(super) async fn wait(&self, chat: &str) {
        let delay = self.reserve(chat, Instant::now());
        if !delay.is_zero() {
            sleep(delay).await;
        }
    }

    /// Push every slot back after Telegram asked us to slow down.
    pub(super) fn pause(&self, delay: Duration) {
        let resume = Instant::now() + delay;
        let mut next_global = self.next_global.lock();
        *next_global = Some(next_global.map_or(resume, |at| at.max(resume)));
    }
}

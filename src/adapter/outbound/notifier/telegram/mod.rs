//! Telegram alert delivery.
//!
//! Requires the `telegram` feature to be enabled.

pub mod channel;
mod throttle;

pub use channel::{TelegramChannel, TelegramSettings};

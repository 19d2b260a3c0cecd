//! Notification channel adapters.
//!
//! Implements the [`NotificationChannel`](crate::port::NotificationChannel)
//! port for Telegram and for plain structured logging.

pub mod log;

#[cfg(feature = "telegram")]
pub mod telegram;

pub use log::LogChannel;

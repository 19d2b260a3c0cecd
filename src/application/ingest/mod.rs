//! Trade ingestion from the upstream feed.

pub mod backoff;
pub mod config;
pub mod scheduler;

pub use config::IngestionConfig;
pub use scheduler::{CycleSummary, IngestionHandle, IngestionScheduler, PollReport};

use thiserror::Error;

use crate::domain::cursor::CursorPosition;
use crate::domain::error::ValidationError;
use crate::domain::id::Address;

/// Configuration-related errors with structured variants.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A cursor advance would move a wallet's position backwards.
    #[error("stale cursor for {address}: stored {stored}, attempted {attempted}")]
    StaleCursor {
        address: Address,
        stored: CursorPosition,
        attempted: CursorPosition,
    },

    /// Timeouts, rate limits and connection failures from the trade feed.
    #[error("upstream transient error: {0}")]
    UpstreamTransient(String),

    /// Non-retryable upstream failures (bad request, malformed payload).
    #[error("upstream error: {0}")]
    Upstream(String),

    #[error("channel delivery error: {0}")]
    ChannelDelivery(String),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("database error: {0}")]
    Database(String),

    #[error("parse error: {0}")]
    Parse(String),
}

impl Error {
    /// Whether retrying the failed operation may succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::UpstreamTransient(_) | Self::ChannelDelivery(_) | Self::Connection(_) => true,
            Self::Http(err) => err.is_timeout() || err.is_connect(),
            _ => false,
        }
    }
}

impl From<diesel::result::Error> for Error {
    fn from(err: diesel::result::Error) -> Self {
        Error::Database(err.to_string())
    }
}

impl From<diesel::r2d2::PoolError> for Error {
    fn from(err: diesel::r2d2::PoolError) -> Self {
        Error::Connection(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

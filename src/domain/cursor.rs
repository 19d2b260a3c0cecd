//! Ingestion progress markers.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::Address;
use super::trade::Trade;

/// Furthest point in a wallet's upstream feed that has been ingested.
///
/// Identified by the newest trade seen: its unix timestamp and hash. Only the
/// timestamp participates in ordering; the hash lets the feed adapter skip
/// the boundary trade on the next poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CursorPosition {
    /// Unix timestamp (seconds) of the newest ingested trade.
    pub timestamp: i64,
    /// Transaction hash of the newest ingested trade.
    pub tx_hash: String,
}

impl CursorPosition {
    pub fn new(timestamp: i64, tx_hash: impl Into<String>) -> Self {
        Self {
            timestamp,
            tx_hash: tx_hash.into(),
        }
    }

    /// Position of the newest trade in a batch, if any.
    #[must_use]
    pub fn newest_of(trades: &[Trade]) -> Option<Self> {
        trades
            .iter()
            .max_by_key(|t| t.timestamp)
            .map(|t| Self::new(t.timestamp, t.tx_hash.as_str()))
    }

    /// True when `self` lies strictly before `other` in the feed.
    #[must_use]
    pub fn is_older_than(&self, other: &Self) -> bool {
        self.timestamp < other.timestamp
    }
}

impl fmt::Display for CursorPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.timestamp, self.tx_hash)
    }
}

/// Stored cursor for one wallet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cursor {
    pub address: Address,
    /// `None` until the first successful poll ingests a trade.
    pub position: Option<CursorPosition>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering_uses_timestamp_only() {
        let a = CursorPosition::new(100, "0xa");
        let b = CursorPosition::new(100, "0xb");
        let c = CursorPosition::new(101, "0xc");
        assert!(!a.is_older_than(&b));
        assert!(!b.is_older_than(&a));
        assert!(a.is_older_than(&c));
        assert!(!c.is_older_than(&a));
    }

    #[test]
    fn display_includes_both_parts() {
        assert_eq!(CursorPosition::new(5, "0xff").to_string(), "5@0xff");
    }
}

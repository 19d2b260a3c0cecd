//! Ingested trades.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::ValidationError;
use super::id::{Address, TxHash};

/// Direction of a trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// Stable wire/storage name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Buy => "BUY",
            Self::Sell => "SELL",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Side {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "BUY" => Ok(Self::Buy),
            "SELL" => Ok(Self::Sell),
            _ => Err(ValidationError::UnknownSide {
                input: s.to_string(),
            }),
        }
    }
}

/// A single trade pulled from the upstream feed.
///
/// Immutable once stored; `tx_hash` is the natural key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trade {
    pub tx_hash: TxHash,
    pub wallet: Address,
    pub side: Side,
    /// Number of outcome shares.
    pub size: Decimal,
    /// Price per share, within [0, 1].
    pub price: Decimal,
    pub outcome: String,
    pub market_title: String,
    pub market_slug: String,
    /// Market condition identifier, used to resolve categories.
    pub condition_id: Option<String>,
    /// Unix timestamp in seconds.
    pub timestamp: i64,
}

impl Trade {
    /// Trade size multiplied by price, in USD.
    #[must_use]
    pub fn notional(&self) -> Decimal {
        self.size * self.price
    }

    /// Trade time as a UTC datetime, if the timestamp is representable.
    #[must_use]
    pub fn traded_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.timestamp, 0)
    }
}

/// A trade as persisted, with its insertion sequence number.
///
/// Sequence numbers increase strictly with insertion order and are used as the
/// dispatcher's consumption cursor and as the stable ordering tie-break.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredTrade {
    pub seq: i64,
    pub trade: Trade,
}

/// Result of a single trade upsert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpsertOutcome {
    /// False when a trade with the same hash already existed.
    pub inserted: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn trade(size: Decimal, price: Decimal) -> Trade {
        Trade {
            tx_hash: TxHash::new("0x01"),
            wallet: Address::parse("0x1111111111111111111111111111111111111111").unwrap(),
            side: Side::Buy,
            size,
            price,
            outcome: "Yes".into(),
            market_title: "Will it rain?".into(),
            market_slug: "will-it-rain".into(),
            condition_id: None,
            timestamp: 1_700_000_000,
        }
    }

    #[test]
    fn notional_is_size_times_price() {
        assert_eq!(trade(dec!(25000), dec!(0.5)).notional(), dec!(12500));
        assert_eq!(trade(dec!(1000), dec!(0.5)).notional(), dec!(500));
    }

    #[test]
    fn side_parses_case_insensitively() {
        assert_eq!("buy".parse::<Side>().unwrap(), Side::Buy);
        assert_eq!(" SELL ".parse::<Side>().unwrap(), Side::Sell);
        assert!(matches!(
            "hold".parse::<Side>(),
            Err(ValidationError::UnknownSide { .. })
        ));
    }

    #[test]
    fn traded_at_converts_unix_seconds() {
        let t = trade(dec!(1), dec!(0.1));
        assert_eq!(t.traded_at().unwrap().timestamp(), 1_700_000_000);
    }
}

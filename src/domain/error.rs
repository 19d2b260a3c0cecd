//! Validation errors for user-supplied domain input.
//!
//! Returned before any write happens, so a failed validation never leaves
//! partial state behind.

use rust_decimal::Decimal;
use thiserror::Error;

/// Errors raised when input violates a domain invariant.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Wallet address is not `0x` followed by 40 hex characters.
    #[error("invalid wallet address '{input}'")]
    InvalidAddress {
        /// The rejected input.
        input: String,
    },

    /// User identifier is empty.
    #[error("user id cannot be empty")]
    EmptyUserId,

    /// Side is neither BUY nor SELL.
    #[error("unknown trade side '{input}'")]
    UnknownSide {
        /// The rejected input.
        input: String,
    },

    /// Alert side set must contain at least one side.
    #[error("sides cannot be empty")]
    EmptySides,

    /// Minimum notional must be zero or greater.
    #[error("min notional must be >= 0, got {value}")]
    NegativeNotional {
        /// The invalid value.
        value: Decimal,
    },

    /// A price bound lies outside [0, 1].
    #[error("{field} must be within [0, 1], got {value}")]
    PriceOutOfRange {
        /// Which bound was invalid.
        field: &'static str,
        /// The invalid value.
        value: Decimal,
    },

    /// Price bounds are not strictly ordered.
    #[error("min price {min} must be less than max price {max}")]
    PriceRangeInverted {
        /// Lower bound.
        min: Decimal,
        /// Upper bound.
        max: Decimal,
    },

    /// Query page size is out of range.
    #[error("limit must be within 1..={max}, got {value}")]
    LimitOutOfRange {
        /// Requested limit.
        value: i64,
        /// Largest accepted limit.
        max: i64,
    },

    /// Query offset is negative.
    #[error("offset must be >= 0, got {value}")]
    NegativeOffset {
        /// Requested offset.
        value: i64,
    },

    /// Notification endpoint identifier is empty.
    #[error("endpoint id cannot be empty")]
    EmptyEndpoint,
}

//! Per-user whale alert criteria and their evaluation.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::ValidationError;
use super::id::UserId;
use super::trade::{Side, Trade};

/// Alert filter for one user. One per user, upserted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertConfig {
    pub owner: UserId,
    pub min_notional_usd: Decimal,
    pub min_price: Decimal,
    pub max_price: Decimal,
    pub sides: BTreeSet<Side>,
    /// Lowercased category names; empty means all categories.
    pub include_categories: BTreeSet<String>,
    /// Lowercased category names that always suppress.
    pub exclude_categories: BTreeSet<String>,
    pub enabled: bool,
    pub updated_at: DateTime<Utc>,
}

/// Partial update for an [`AlertConfig`]. `None` keeps the previous value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertConfigPatch {
    pub min_notional_usd: Option<Decimal>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub sides: Option<Vec<String>>,
    pub include_categories: Option<Vec<String>>,
    pub exclude_categories: Option<Vec<String>>,
    pub enabled: Option<bool>,
}

/// Why a trade did not pass a user's filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    Disabled,
    BelowNotional { notional: Decimal, min: Decimal },
    PriceOutOfRange { price: Decimal },
    SideExcluded(Side),
    CategoryNotIncluded,
    CategoryExcluded(String),
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disabled => f.write_str("alerts disabled"),
            Self::BelowNotional { notional, min } => {
                write!(f, "notional {notional} below {min}")
            }
            Self::PriceOutOfRange { price } => write!(f, "price {price} outside range"),
            Self::SideExcluded(side) => write!(f, "side {side} not selected"),
            Self::CategoryNotIncluded => f.write_str("no included category"),
            Self::CategoryExcluded(category) => write!(f, "category {category} excluded"),
        }
    }
}

/// Outcome of testing a trade against a filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterVerdict {
    Match,
    Reject(Rejection),
}

impl FilterVerdict {
    #[must_use]
    pub fn is_match(&self) -> bool {
        matches!(self, Self::Match)
    }
}

fn normalize_categories(values: Vec<String>) -> BTreeSet<String> {
    values
        .into_iter()
        .map(|c| c.trim().to_lowercase())
        .filter(|c| !c.is_empty())
        .collect()
}

impl AlertConfig {
    /// Default notional threshold in USD.
    pub const DEFAULT_MIN_NOTIONAL_USD: Decimal = Decimal::from_parts(10_000, 0, 0, false, 0);
    /// Default lower price bound (0.05).
    pub const DEFAULT_MIN_PRICE: Decimal = Decimal::from_parts(5, 0, 0, false, 2);
    /// Default upper price bound (0.95).
    pub const DEFAULT_MAX_PRICE: Decimal = Decimal::from_parts(95, 0, 0, false, 2);

    /// Defaults returned for users that never saved a config.
    #[must_use]
    pub fn defaults(owner: UserId) -> Self {
        Self {
            owner,
            min_notional_usd: Self::DEFAULT_MIN_NOTIONAL_USD,
            min_price: Self::DEFAULT_MIN_PRICE,
            max_price: Self::DEFAULT_MAX_PRICE,
            sides: BTreeSet::from([Side::Buy, Side::Sell]),
            include_categories: BTreeSet::new(),
            exclude_categories: BTreeSet::new(),
            enabled: false,
            updated_at: DateTime::<Utc>::UNIX_EPOCH,
        }
    }

    /// Apply a patch, returning the validated result without mutating `self`.
    ///
    /// # Errors
    /// Returns a [`ValidationError`] when any resulting field is out of range.
    pub fn apply(&self, patch: AlertConfigPatch) -> Result<Self, ValidationError> {
        let sides = match patch.sides {
            Some(raw) => raw
                .iter()
                .map(|s| s.parse::<Side>())
                .collect::<Result<BTreeSet<_>, _>>()?,
            None => self.sides.clone(),
        };

        let next = Self {
            owner: self.owner.clone(),
            min_notional_usd: patch.min_notional_usd.unwrap_or(self.min_notional_usd),
            min_price: patch.min_price.unwrap_or(self.min_price),
            max_price: patch.max_price.unwrap_or(self.max_price),
            sides,
            include_categories: patch
                .include_categories
                .map(normalize_categories)
                .unwrap_or_else(|| self.include_categories.clone()),
            exclude_categories: patch
                .exclude_categories
                .map(normalize_categories)
                .unwrap_or_else(|| self.exclude_categories.clone()),
            enabled: patch.enabled.unwrap_or(self.enabled),
            updated_at: self.updated_at,
        };
        next.validate()?;
        Ok(next)
    }

    /// Check every field invariant.
    ///
    /// # Errors
    /// Returns the first violated invariant.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.min_notional_usd < Decimal::ZERO {
            return Err(ValidationError::NegativeNotional {
                value: self.min_notional_usd,
            });
        }
        for (field, value) in [("min_price", self.min_price), ("max_price", self.max_price)] {
            if value < Decimal::ZERO || value > Decimal::ONE {
                return Err(ValidationError::PriceOutOfRange { field, value });
            }
        }
        if self.min_price >= self.max_price {
            return Err(ValidationError::PriceRangeInverted {
                min: self.min_price,
                max: self.max_price,
            });
        }
        if self.sides.is_empty() {
            return Err(ValidationError::EmptySides);
        }
        Ok(())
    }

    /// True when both configs would filter trades identically.
    #[must_use]
    pub fn same_filter(&self, other: &Self) -> bool {
        self.min_notional_usd == other.min_notional_usd
            && self.min_price == other.min_price
            && self.max_price == other.max_price
            && self.sides == other.sides
            && self.include_categories == other.include_categories
            && self.exclude_categories == other.exclude_categories
            && self.enabled == other.enabled
    }

    /// Test a trade against this filter. All predicates are conjunctive and
    /// the price range is inclusive on both ends.
    #[must_use]
    pub fn evaluate(&self, trade: &Trade, categories: &[String]) -> FilterVerdict {
        if !self.enabled {
            return FilterVerdict::Reject(Rejection::Disabled);
        }

        let notional = trade.notional();
        if notional < self.min_notional_usd {
            return FilterVerdict::Reject(Rejection::BelowNotional {
                notional,
                min: self.min_notional_usd,
            });
        }

        if trade.price < self.min_price || trade.price > self.max_price {
            return FilterVerdict::Reject(Rejection::PriceOutOfRange { price: trade.price });
        }

        if !self.sides.contains(&trade.side) {
            return FilterVerdict::Reject(Rejection::SideExcluded(trade.side));
        }

        let lowered: Vec<String> = categories.iter().map(|c| c.to_lowercase()).collect();

        if !self.include_categories.is_empty()
            && !lowered.iter().any(|c| self.include_categories.contains(c))
        {
            return FilterVerdict::Reject(Rejection::CategoryNotIncluded);
        }

        if let Some(excluded) = lowered
            .into_iter()
            .find(|c| self.exclude_categories.contains(c))
        {
            return FilterVerdict::Reject(Rejection::CategoryExcluded(excluded));
        }

        FilterVerdict::Match
    }
}

/// Process-wide "configs changed at T" marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReloadMarker {
    pub requested_at: DateTime<Utc>,
    pub requested_by: UserId,
}

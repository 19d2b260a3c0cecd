//! Read-only query surface over stored trades and deliveries.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::{DispatchRecord, Trade, ValidationError};
use crate::error::Result;
use crate::port::Storage;

/// Largest page size accepted by [`TradeQueryService::list_recent`].
pub const MAX_LIMIT: i64 = 1000;

/// One page of recent trades.
#[derive(Debug, Clone, Serialize)]
pub struct TradePage {
    pub trades: Vec<Trade>,
    /// Count of all stored trades, regardless of filter and paging.
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

#[derive(Clone)]
pub struct TradeQueryService {
    storage: Storage,
}

impl TradeQueryService {
    #[must_use]
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    /// Trades newest first.
    ///
    /// # Errors
    /// Rejects a limit outside `1..=1000`, a negative offset or a negative
    /// minimum notional before touching the store.
    pub async fn list_recent(
        &self,
        limit: i64,
        offset: i64,
        min_notional: Option<Decimal>,
    ) -> Result<TradePage> {
        if !(1..=MAX_LIMIT).contains(&limit) {
            return Err(ValidationError::LimitOutOfRange {
                value: limit,
                max: MAX_LIMIT,
            }
            .into());
        }
        if offset < 0 {
            return Err(ValidationError::NegativeOffset { value: offset }.into());
        }
        if let Some(value) = min_notional.filter(|v| *v < Decimal::ZERO) {
            return Err(ValidationError::NegativeNotional { value }.into());
        }

        let trades = self
            .storage
            .trades
            .list_recent(limit, offset, min_notional)
            .await?;
        let total = self.storage.trades.count_all().await?;

        Ok(TradePage {
            trades,
            total,
            limit,
            offset,
        })
    }

    /// Deliveries that ended `Failed`, newest first.
    pub async fn failed_dispatches(&self, limit: i64) -> Result<Vec<DispatchRecord>> {
        self.storage
            .dispatch_log
            .list_failed(limit.clamp(1, MAX_LIMIT))
            .await
    }
}

//! Persistence ports for cursors, trades, wallets, alert configs and
//! dispatch bookkeeping.
//!
//! A storage backend implements every trait here; [`Storage`] bundles one
//! backend behind the full capability set so callers never name the
//! concrete type.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::domain::{
    Address, AlertConfig, AlertConfigPatch, ChannelBinding, Claim, Cursor, CursorPosition,
    DispatchRecord, DispatchState, ReloadMarker, Removal, StoredTrade, Trade, TxHash,
    UpsertOutcome, UserId, WalletTarget,
};
use crate::error::Result;

/// Durable wallet → last-ingested-position mapping.
#[async_trait]
pub trait CursorStore: Send + Sync {
    /// Current cursor for a wallet, if one was ever created.
    async fn get(&self, address: &Address) -> Result<Option<Cursor>>;

    /// Move a wallet's cursor forward, creating it if absent.
    ///
    /// Advancing to an equal position is a no-op. Advancing to an older
    /// position fails with [`Error::StaleCursor`](crate::error::Error::StaleCursor)
    /// and leaves the stored cursor unchanged.
    async fn advance(&self, address: &Address, position: &CursorPosition) -> Result<()>;

    /// Delete a wallet's cursor. Returns whether one existed.
    async fn remove(&self, address: &Address) -> Result<bool>;

    /// Every address that currently has a cursor.
    async fn addresses(&self) -> Result<Vec<Address>>;
}

/// Counts from a batch upsert.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchUpsert {
    pub inserted: usize,
    pub duplicates: usize,
}

/// Durable, indexed log of ingested trades.
#[async_trait]
pub trait TradeStore: Send + Sync {
    /// Insert a trade keyed by hash; an existing hash is left untouched.
    async fn upsert(&self, trade: &Trade) -> Result<UpsertOutcome>;

    /// Upsert a batch atomically. Either every trade is durable or none is.
    async fn upsert_batch(&self, trades: &[Trade]) -> Result<BatchUpsert>;

    /// Trades ordered newest timestamp first, ties broken by insertion order.
    async fn list_recent(
        &self,
        limit: i64,
        offset: i64,
        min_notional: Option<Decimal>,
    ) -> Result<Vec<Trade>>;

    async fn count_all(&self) -> Result<i64>;

    /// Delete every trade of a wallet. Returns the number removed.
    async fn delete_by_wallet(&self, address: &Address) -> Result<usize>;

    /// Trades inserted after sequence number `seq`, oldest insertion first.
    async fn list_after(&self, seq: i64, limit: i64) -> Result<Vec<StoredTrade>>;

    /// Highest sequence number assigned so far (0 when empty).
    async fn head_seq(&self) -> Result<i64>;

    /// Distinct wallets with at least one stored trade.
    async fn wallets(&self) -> Result<Vec<Address>>;
}

/// Set of (user, address, active) tuples the ingester polls.
#[async_trait]
pub trait WalletRegistry: Send + Sync {
    /// Track a wallet for a user, reactivating a soft-deleted entry.
    async fn add(&self, owner: &UserId, address: &Address) -> Result<WalletTarget>;

    /// Stop tracking a wallet for a user. Returns whether a row was affected.
    async fn remove(&self, owner: &UserId, address: &Address, removal: Removal) -> Result<bool>;

    async fn list_for_owner(&self, owner: &UserId) -> Result<Vec<WalletTarget>>;

    /// Distinct addresses with at least one active target.
    async fn active_addresses(&self) -> Result<Vec<Address>>;

    /// Users with an active target for this address.
    async fn owners_tracking(&self, address: &Address) -> Result<Vec<UserId>>;
}

/// Per-user alert criteria.
#[async_trait]
pub trait AlertConfigStore: Send + Sync {
    /// Stored config, or defaults when the user never saved one.
    async fn get(&self, owner: &UserId) -> Result<AlertConfig>;

    /// Validate and apply a partial update.
    ///
    /// Nothing is written when validation fails. When the effective filter
    /// changes, the reload signal is bumped in the same transaction.
    async fn upsert(&self, owner: &UserId, patch: AlertConfigPatch) -> Result<AlertConfig>;

    /// Every config with `enabled = true`.
    async fn list_enabled(&self) -> Result<Vec<AlertConfig>>;
}

/// Singleton "configs changed at T" marker.
#[async_trait]
pub trait ReloadSignal: Send + Sync {
    /// Record a change. The stored timestamp is strictly increasing.
    async fn bump(&self, owner: &UserId) -> Result<ReloadMarker>;

    async fn current(&self) -> Result<Option<ReloadMarker>>;

    /// True if the signal was bumped after `last_seen`.
    async fn since(&self, last_seen: Option<DateTime<Utc>>) -> Result<bool> {
        let current = self.current().await?;
        Ok(match (current, last_seen) {
            (None, _) => false,
            (Some(_), None) => true,
            (Some(marker), Some(seen)) => marker.requested_at > seen,
        })
    }
}

/// At-most-once bookkeeping for (user, trade) deliveries, plus the
/// dispatcher's own consumption position over the trade store.
#[async_trait]
pub trait DispatchLog: Send + Sync {
    /// Claim a pair for delivery by recording it as `Sending`.
    async fn claim(&self, owner: &UserId, tx_hash: &TxHash) -> Result<Claim>;

    /// Record the terminal state of a claimed pair.
    async fn complete(
        &self,
        owner: &UserId,
        tx_hash: &TxHash,
        state: DispatchState,
        attempts: u32,
        error: Option<&str>,
    ) -> Result<()>;

    async fn record(&self, owner: &UserId, tx_hash: &TxHash) -> Result<Option<DispatchRecord>>;

    /// Resolve claims left `Sending` by a crashed run to `Failed`.
    async fn resolve_interrupted(&self) -> Result<usize>;

    /// Records in `Failed` state, newest first, for operators.
    async fn list_failed(&self, limit: i64) -> Result<Vec<DispatchRecord>>;

    /// Last trade sequence number the dispatcher fully processed.
    async fn position(&self) -> Result<Option<i64>>;

    /// Move the dispatcher position forward; lower values are ignored.
    async fn advance_position(&self, seq: i64) -> Result<()>;
}

/// Notification endpoint bindings maintained by the account layer.
#[async_trait]
pub trait ChannelBindings: Send + Sync {
    async fn bind(&self, binding: &ChannelBinding) -> Result<()>;

    /// Mark a binding inactive. Returns whether one existed.
    async fn deactivate(&self, owner: &UserId) -> Result<bool>;

    async fn binding(&self, owner: &UserId) -> Result<Option<ChannelBinding>>;
}

/// One storage backend exposed as the full capability set.
#[derive(Clone)]
pub struct Storage {
    pub cursors: Arc<dyn CursorStore>,
    pub trades: Arc<dyn TradeStore>,
    pub wallets: Arc<dyn WalletRegistry>,
    pub configs: Arc<dyn AlertConfigStore>,
    pub reload: Arc<dyn ReloadSignal>,
    pub dispatch_log: Arc<dyn DispatchLog>,
    pub bindings: Arc<dyn ChannelBindings>,
}

impl Storage {
    /// Wrap a backend implementing every store port.
    pub fn from_backend<B>(backend: Arc<B>) -> Self
    where
        B: CursorStore
            + TradeStore
            + WalletRegistry
            + AlertConfigStore
            + ReloadSignal
            + DispatchLog
            + ChannelBindings
            + 'static,
    {
        Self {
            cursors: backend.clone(),
            trades: backend.clone(),
            wallets: backend.clone(),
            configs: backend.clone(),
            reload: backend.clone(),
            dispatch_log: backend.clone(),
            bindings: backend,
        }
    }
}

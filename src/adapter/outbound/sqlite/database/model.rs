//! Database model types for Diesel ORM.

use diesel::prelude::*;

use super::schema::{
    alert_configs, channel_bindings, cursors, dispatch_log, reload_signal, trades,
    wallet_targets, worker_markers,
};

/// Database row for a tracked wallet.
#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = wallet_targets)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct WalletTargetRow {
    pub owner: String,
    pub address: String,
    pub active: bool,
    pub created_at: String,
}

/// Database row for a wallet's ingestion cursor.
#[derive(Queryable, Selectable, Insertable, AsChangeset, Debug, Clone)]
#[diesel(table_name = cursors)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[diesel(treat_none_as_null = true)]
pub struct CursorRow {
    pub address: String,
    pub position_ts: Option<i64>,
    pub position_tx: Option<String>,
    pub updated_at: String,
}

/// Database row for a trade (insertable, sequence assigned by SQLite).
#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = trades)]
pub struct NewTradeRow {
    pub tx_hash: String,
    pub wallet: String,
    pub side: String,
    pub size: String,
    pub price: String,
    pub notional: f64,
    pub outcome: String,
    pub market_title: String,
    pub market_slug: String,
    pub condition_id: Option<String>,
    pub traded_at: i64,
    pub ingested_at: String,
}

/// Database row for a trade (queryable).
#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = trades)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct TradeRow {
    pub seq: i64,
    pub tx_hash: String,
    pub wallet: String,
    pub side: String,
    pub size: String,
    pub price: String,
    pub notional: f64,
    pub outcome: String,
    pub market_title: String,
    pub market_slug: String,
    pub condition_id: Option<String>,
    pub traded_at: i64,
    pub ingested_at: String,
}

/// Database row for a user's alert config.
///
/// Decimals are stored as text to keep exact values; sets are JSON arrays.
#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = alert_configs)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct AlertConfigRow {
    pub owner: String,
    pub min_notional_usd: String,
    pub min_price: String,
    pub max_price: String,
    pub sides: String,
    pub include_categories: String,
    pub exclude_categories: String,
    pub enabled: bool,
    pub updated_at: String,
}

/// The singleton reload marker row.
#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = reload_signal)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ReloadSignalRow {
    pub id: i32,
    pub requested_at: String,
    pub requested_by: String,
}

/// Database row for a (user, trade) delivery record.
#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = dispatch_log)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct DispatchLogRow {
    pub owner: String,
    pub tx_hash: String,
    pub state: String,
    pub attempts: i32,
    pub last_error: Option<String>,
    pub recorded_at: String,
}

/// Database row for a notification endpoint binding.
#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = channel_bindings)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ChannelBindingRow {
    pub owner: String,
    pub endpoint_id: String,
    pub active: bool,
    pub updated_at: String,
}

/// Named consumption position of a background worker.
#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = worker_markers)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct WorkerMarkerRow {
    pub name: String,
    pub position: i64,
    pub updated_at: String,
}

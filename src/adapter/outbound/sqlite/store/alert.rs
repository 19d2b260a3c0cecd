use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::Duration;
use diesel::prelude::*;
use diesel::SqliteConnection;
use tracing::debug;

use super::{format_time, now, parse_decimal, parse_time, SqliteStore};
use crate::adapter::outbound::sqlite::database::model::{AlertConfigRow, ReloadSignalRow};
use crate::adapter::outbound::sqlite::database::schema::{alert_configs, reload_signal};
use crate::domain::{AlertConfig, AlertConfigPatch, ReloadMarker, Side, UserId};
use crate::error::{Error, Result};
use crate::port::outbound::store::{AlertConfigStore, ReloadSignal};

const SIGNAL_ROW: i32 = 1;

fn to_json<T: serde::Serialize>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(|e| Error::Parse(e.to_string()))
}

fn to_row(config: &AlertConfig) -> Result<AlertConfigRow> {
    Ok(AlertConfigRow {
        owner: config.owner.as_str().to_string(),
        min_notional_usd: config.min_notional_usd.to_string(),
        min_price: config.min_price.to_string(),
        max_price: config.max_price.to_string(),
        sides: to_json(&config.sides)?,
        include_categories: to_json(&config.include_categories)?,
        exclude_categories: to_json(&config.exclude_categories)?,
        enabled: config.enabled,
        updated_at: format_time(config.updated_at),
    })
}

fn from_row(row: AlertConfigRow) -> Result<AlertConfig> {
    let sides: BTreeSet<Side> =
        serde_json::from_str(&row.sides).map_err(|e| Error::Parse(e.to_string()))?;
    let include_categories: BTreeSet<String> = serde_json::from_str(&row.include_categories)
        .map_err(|e| Error::Parse(e.to_string()))?;
    let exclude_categories: BTreeSet<String> = serde_json::from_str(&row.exclude_categories)
        .map_err(|e| Error::Parse(e.to_string()))?;

    Ok(AlertConfig {
        owner: UserId::parse(row.owner)?,
        min_notional_usd: parse_decimal("min_notional_usd", &row.min_notional_usd)?,
        min_price: parse_decimal("min_price", &row.min_price)?,
        max_price: parse_decimal("max_price", &row.max_price)?,
        sides,
        include_categories,
        exclude_categories,
        enabled: row.enabled,
        updated_at: parse_time(&row.updated_at)?,
    })
}

fn marker_from_row(row: ReloadSignalRow) -> Result<ReloadMarker> {
    Ok(ReloadMarker {
        requested_at: parse_time(&row.requested_at)?,
        requested_by: UserId::parse(row.requested_by)?,
    })
}

/// Bump the reload marker on an open connection so callers can fold it into
/// their own transaction. The stored time is strictly increasing even when
/// the wall clock stalls or steps back.
fn bump_with_conn(conn: &mut SqliteConnection, owner: &UserId) -> Result<ReloadMarker> {
    let previous: Option<ReloadSignalRow> = reload_signal::table
        .find(SIGNAL_ROW)
        .first(conn)
        .optional()?;

    let mut requested_at = now();
    if let Some(row) = previous {
        let last = parse_time(&row.requested_at)?;
        if requested_at <= last {
            requested_at = last + Duration::microseconds(1);
        }
    }

    let row = ReloadSignalRow {
        id: SIGNAL_ROW,
        requested_at: format_time(requested_at),
        requested_by: owner.as_str().to_string(),
    };
    diesel::replace_into(reload_signal::table)
        .values(&row)
        .execute(conn)?;

    Ok(ReloadMarker {
        requested_at,
        requested_by: owner.clone(),
    })
}

#[async_trait]
impl AlertConfigStore for SqliteStore {
    async fn get(&self, owner: &UserId) -> Result<AlertConfig> {
        let mut conn = self.conn()?;
        let row: Option<AlertConfigRow> = alert_configs::table
            .find(owner.as_str())
            .first(&mut conn)
            .optional()
            .map_err(|e| Error::Database(e.to_string()))?;

        match row {
            Some(row) => from_row(row),
            None => Ok(AlertConfig::defaults(owner.clone())),
        }
    }

    async fn upsert(&self, owner: &UserId, patch: AlertConfigPatch) -> Result<AlertConfig> {
        let mut conn = self.conn()?;

        conn.immediate_transaction(|conn| {
            let current = match alert_configs::table
                .find(owner.as_str())
                .first::<AlertConfigRow>(conn)
                .optional()?
            {
                Some(row) => from_row(row)?,
                None => AlertConfig::defaults(owner.clone()),
            };

            let mut next = current.apply(patch)?;
            next.updated_at = now();

            diesel::replace_into(alert_configs::table)
                .values(&to_row(&next)?)
                .execute(conn)?;

            if !next.same_filter(&current) {
                let marker = bump_with_conn(conn, owner)?;
                debug!(owner = %owner, requested_at = %marker.requested_at, "Filter changed, reload signalled");
            }
            Ok(next)
        })
    }

    async fn list_enabled(&self) -> Result<Vec<AlertConfig>> {
        let mut conn = self.conn()?;
        let rows: Vec<AlertConfigRow> = alert_configs::table
            .filter(alert_configs::enabled.eq(true))
            .load(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;

        rows.into_iter().map(from_row).collect()
    }
}

#[async_trait]
impl ReloadSignal for SqliteStore {
    async fn bump(&self, owner: &UserId) -> Result<ReloadMarker> {
        let mut conn = self.conn()?;
        conn.immediate_transaction(|conn| bump_with_conn(conn, owner))
    }

    async fn current(&self) -> Result<Option<ReloadMarker>> {
        let mut conn = self.conn()?;
        let row: Option<ReloadSignalRow> = reload_signal::table
            .find(SIGNAL_ROW)
            .first(&mut conn)
            .optional()
            .map_err(|e| Error::Database(e.to_string()))?;

        row.map(marker_from_row).transpose()
    }
}

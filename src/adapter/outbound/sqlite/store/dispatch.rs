use async_trait::async_trait;
use diesel::prelude::*;
use tracing::warn;

use super::{format_time, now, parse_time, SqliteStore};
use crate::adapter::outbound::sqlite::database::model::{DispatchLogRow, WorkerMarkerRow};
use crate::adapter::outbound::sqlite::database::schema::{dispatch_log, worker_markers};
use crate::domain::{Claim, DispatchRecord, DispatchState, TxHash, UserId};
use crate::error::{Error, Result};
use crate::port::outbound::store::DispatchLog;

/// Marker name of the alert dispatcher's position over the trade store.
const DISPATCHER_MARKER: &str = "alert_dispatcher";

/// Error recorded on claims abandoned by a crashed run.
const INTERRUPTED: &str = "interrupted";

fn from_row(row: DispatchLogRow) -> Result<DispatchRecord> {
    Ok(DispatchRecord {
        owner: UserId::parse(row.owner)?,
        tx_hash: TxHash::new(row.tx_hash),
        state: row.state.parse().map_err(Error::Parse)?,
        attempts: u32::try_from(row.attempts).unwrap_or(0),
        last_error: row.last_error,
        recorded_at: parse_time(&row.recorded_at)?,
    })
}

#[async_trait]
impl DispatchLog for SqliteStore {
    async fn claim(&self, owner: &UserId, tx_hash: &TxHash) -> Result<Claim> {
        let row = DispatchLogRow {
            owner: owner.as_str().to_string(),
            tx_hash: tx_hash.as_str().to_string(),
            state: DispatchState::Sending.as_str().to_string(),
            attempts: 0,
            last_error: None,
            recorded_at: format_time(now()),
        };
        let mut conn = self.conn()?;

        conn.immediate_transaction(|conn| {
            let inserted = diesel::insert_or_ignore_into(dispatch_log::table)
                .values(&row)
                .execute(conn)?;
            if inserted > 0 {
                return Ok(Claim::Acquired);
            }

            let state: String = dispatch_log::table
                .find((owner.as_str(), tx_hash.as_str()))
                .select(dispatch_log::state)
                .first(conn)?;
            Ok(Claim::Existing(state.parse().map_err(Error::Parse)?))
        })
    }

    async fn complete(
        &self,
        owner: &UserId,
        tx_hash: &TxHash,
        state: DispatchState,
        attempts: u32,
        error: Option<&str>,
    ) -> Result<()> {
        let mut conn = self.conn()?;
        let updated = diesel::update(dispatch_log::table.find((owner.as_str(), tx_hash.as_str())))
            .set((
                dispatch_log::state.eq(state.as_str()),
                dispatch_log::attempts.eq(i32::try_from(attempts).unwrap_or(i32::MAX)),
                dispatch_log::last_error.eq(error),
                dispatch_log::recorded_at.eq(format_time(now())),
            ))
            .execute(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;

        if updated == 0 {
            warn!(owner = %owner, tx_hash = %tx_hash, state = %state, "Completed a dispatch that was never claimed");
        }
        Ok(())
    }

    async fn record(&self, owner: &UserId, tx_hash: &TxHash) -> Result<Option<DispatchRecord>> {
        let mut conn = self.conn()?;
        let row: Option<DispatchLogRow> = dispatch_log::table
            .find((owner.as_str(), tx_hash.as_str()))
            .first(&mut conn)
            .optional()
            .map_err(|e| Error::Database(e.to_string()))?;

        row.map(from_row).transpose()
    }

    async fn resolve_interrupted(&self) -> Result<usize> {
        let mut conn = self.conn()?;
        diesel::update(
            dispatch_log::table.filter(dispatch_log::state.eq(DispatchState::Sending.as_str())),
        )
        .set((
            dispatch_log::state.eq(DispatchState::Failed.as_str()),
            dispatch_log::last_error.eq(INTERRUPTED),
            dispatch_log::recorded_at.eq(format_time(now())),
        ))
        .execute(&mut conn)
        .map_err(|e| Error::Database(e.to_string()))
    }

    async fn list_failed(&self, limit: i64) -> Result<Vec<DispatchRecord>> {
        let mut conn = self.conn()?;
        let rows: Vec<DispatchLogRow> = dispatch_log::table
            .filter(dispatch_log::state.eq(DispatchState::Failed.as_str()))
            .order(dispatch_log::recorded_at.desc())
            .limit(limit)
            .load(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;

        rows.into_iter().map(from_row).collect()
    }

    async fn position(&self) -> Result<Option<i64>> {
        let mut conn = self.conn()?;
        worker_markers::table
            .find(DISPATCHER_MARKER)
            .select(worker_markers::position)
            .first(&mut conn)
            .optional()
            .map_err(|e| Error::Database(e.to_string()))
    }

    async fn advance_position(&self, seq: i64) -> Result<()> {
        let mut conn = self.conn()?;

        conn.immediate_transaction(|conn| {
            let current: Option<i64> = worker_markers::table
                .find(DISPATCHER_MARKER)
                .select(worker_markers::position)
                .first(conn)
                .optional()?;
            if current.is_some_and(|c| c >= seq) {
                return Ok(());
            }

            diesel::replace_into(worker_markers::table)
                .values(&WorkerMarkerRow {
                    name: DISPATCHER_MARKER.to_string(),
                    position: seq,
                    updated_at: format_time(now()),
                })
                .execute(conn)?;
            Ok::<(), Error>(())
        })
    }
}

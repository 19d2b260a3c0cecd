use async_trait::async_trait;
use diesel::prelude::*;

use super::{format_time, now, parse_time, SqliteStore};
use crate::adapter::outbound::sqlite::database::model::CursorRow;
use crate::adapter::outbound::sqlite::database::schema::cursors;
use crate::domain::{Address, Cursor, CursorPosition};
use crate::error::{Error, Result};
use crate::port::outbound::store::CursorStore;

fn position_of(row: &CursorRow) -> Option<CursorPosition> {
    match (row.position_ts, row.position_tx.as_ref()) {
        (Some(ts), Some(tx)) => Some(CursorPosition::new(ts, tx.as_str())),
        _ => None,
    }
}

fn from_row(row: CursorRow) -> Result<Cursor> {
    Ok(Cursor {
        address: Address::parse(&row.address)?,
        position: position_of(&row),
        updated_at: parse_time(&row.updated_at)?,
    })
}

#[async_trait]
impl CursorStore for SqliteStore {
    async fn get(&self, address: &Address) -> Result<Option<Cursor>> {
        let mut conn = self.conn()?;
        let row: Option<CursorRow> = cursors::table
            .find(address.as_str())
            .first(&mut conn)
            .optional()
            .map_err(|e| Error::Database(e.to_string()))?;

        row.map(from_row).transpose()
    }

    async fn advance(&self, address: &Address, position: &CursorPosition) -> Result<()> {
        let mut conn = self.conn()?;

        conn.immediate_transaction(|conn| {
            let stored: Option<CursorRow> = cursors::table
                .find(address.as_str())
                .first(conn)
                .optional()?;

            if let Some(current) = stored.as_ref().and_then(position_of) {
                if position.is_older_than(&current) {
                    return Err(Error::StaleCursor {
                        address: address.clone(),
                        stored: current,
                        attempted: position.clone(),
                    });
                }
                if !current.is_older_than(position) {
                    return Ok(());
                }
            }

            let row = CursorRow {
                address: address.as_str().to_string(),
                position_ts: Some(position.timestamp),
                position_tx: Some(position.tx_hash.clone()),
                updated_at: format_time(now()),
            };
            diesel::insert_into(cursors::table)
                .values(&row)
                .on_conflict(cursors::address)
                .do_update()
                .set(&row)
                .execute(conn)?;
            Ok(())
        })
    }

    async fn remove(&self, address: &Address) -> Result<bool> {
        let mut conn = self.conn()?;
        let deleted = diesel::delete(cursors::table.find(address.as_str()))
            .execute(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;

        Ok(deleted > 0)
    }

    async fn addresses(&self) -> Result<Vec<Address>> {
        let mut conn = self.conn()?;
        let raw: Vec<String> = cursors::table
            .select(cursors::address)
            .load(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;

        raw.iter()
            .map(|a| Address::parse(a).map_err(Error::from))
            .collect()
    }
}

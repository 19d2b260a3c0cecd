//! SQLite store implementation.
//!
//! One [`SqliteStore`] implements every storage port on a shared connection
//! pool. Each port lives in its own submodule; this module holds the pool
//! plumbing and the text encodings shared between them.

mod alert;
mod binding;
mod cursor;
mod dispatch;
mod trade;
mod wallet;

use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use diesel::r2d2::{ConnectionManager, PooledConnection};
use diesel::SqliteConnection;
use rust_decimal::Decimal;
use tracing::warn;

use crate::adapter::outbound::sqlite::database::connection::{configure_sqlite_connection, DbPool};
use crate::error::{Error, Result};

type PooledConn = PooledConnection<ConnectionManager<SqliteConnection>>;

/// SQLite-backed storage for cursors, trades, wallets, configs and
/// dispatch bookkeeping.
pub struct SqliteStore {
    /// Database connection pool.
    pool: DbPool,
}

impl SqliteStore {
    /// Create a new store with the given connection pool.
    ///
    /// The pool's database must already be migrated.
    #[must_use]
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn conn(&self) -> Result<PooledConn> {
        let mut conn = self
            .pool
            .get()
            .map_err(|e| Error::Connection(e.to_string()))?;
        if let Err(e) = configure_sqlite_connection(&mut conn) {
            warn!(error = %e, "Failed to configure SQLite connection");
        }
        Ok(conn)
    }
}

/// Current time truncated to the microsecond precision stored on disk.
fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

fn format_time(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_time(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| Error::Parse(e.to_string()))
}

fn parse_decimal(field: &str, raw: &str) -> Result<Decimal> {
    Decimal::from_str(raw).map_err(|e| Error::Parse(format!("{field}: {e}")))
}

#[cfg(test)]
pub(crate) fn test_store() -> (tempfile::TempDir, SqliteStore) {
    use crate::adapter::outbound::sqlite::database::connection::{create_pool, run_migrations};

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("test.db");
    let pool = create_pool(path.to_str().unwrap()).unwrap();
    run_migrations(&pool).unwrap();
    (dir, SqliteStore::new(pool))
}

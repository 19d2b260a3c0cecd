//! SQLite pool, migrations and per-connection pragmas.

use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::SqliteConnection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};

use crate::error::{Error, Result};

/// Migrations compiled in from `migrations/`.
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

pub type DbPool = Pool<ConnectionManager<SqliteConnection>>;

/// Pool size. The ingester, the dispatcher and the query surface each hold
/// at most a couple of connections at a time.
const POOL_SIZE: u32 = 5;

/// How long a writer waits on a locked database before giving up.
const BUSY_TIMEOUT_MS: u32 = 5_000;

fn connection_error(e: impl std::fmt::Display) -> Error {
    Error::Connection(e.to_string())
}

fn database_error(e: impl std::fmt::Display) -> Error {
    Error::Database(e.to_string())
}

/// Create a connection pool for a database file path (or `:memory:`).
///
/// # Errors
/// Returns an error if the pool cannot be created.
pub fn create_pool(path: &str) -> Result<DbPool> {
    Pool::builder()
        .max_size(POOL_SIZE)
        .build(ConnectionManager::<SqliteConnection>::new(path))
        .map_err(connection_error)
}

/// Apply every pending migration.
///
/// # Errors
/// Returns an error if a migration fails.
pub fn run_migrations(pool: &DbPool) -> Result<()> {
    let mut conn = pool.get().map_err(connection_error)?;
    conn.run_pending_migrations(MIGRATIONS)
        .map_err(connection_error)?;
    Ok(())
}

/// Switch the database file to WAL so readers never block the ingester.
///
/// The journal mode is persistent, so this only needs to run once per file.
///
/// # Errors
/// Returns an error if the pragma fails to apply.
pub fn enable_wal(pool: &DbPool) -> Result<()> {
    let mut conn = pool.get().map_err(connection_error)?;
    diesel::sql_query("PRAGMA journal_mode=WAL")
        .execute(&mut conn)
        .map_err(database_error)?;
    Ok(())
}

/// Set the busy timeout on a freshly checked-out connection so concurrent
/// wallet polls queue on the write lock instead of failing.
///
/// # Errors
/// Returns an error if the pragma fails to apply.
pub fn configure_sqlite_connection(conn: &mut SqliteConnection) -> Result<()> {
    diesel::sql_query(format!("PRAGMA busy_timeout={BUSY_TIMEOUT_MS}"))
        .execute(conn)
        .map_err(database_error)?;
    Ok(())
}

//! SQLite persistence adapter.
//!
//! The single storage backend: Diesel ORM over an r2d2 pool with embedded
//! migrations, implementing every store port on [`SqliteStore`].

pub mod database;
pub mod store;

pub use store::SqliteStore;

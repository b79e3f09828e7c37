//! Database layer: connection pool setup, repositories and row models.
//!
//! Persistence is SQLite via sqlx. Each entity has a repository struct in
//! [`handlers`] wrapping a connection, and request/response models in
//! [`models`]. Monetary amounts are stored as integer cents; zip code sets as
//! JSON arrays of strings.
//!
//! Writes that must be serialized (campaign approval slots, the
//! duplicate-application and open-verification invariants) rely on single
//! atomic statements and partial unique indexes rather than advisory locks -
//! see `handlers::applications` and the migration for the index definitions.

pub mod errors;
pub mod handlers;
pub mod models;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::time::Duration;

/// Open (creating if missing) the SQLite database at `path` and return a pool.
///
/// WAL mode keeps readers unblocked during writes; the busy timeout makes
/// concurrent writers queue instead of failing immediately.
pub async fn connect(path: impl AsRef<Path>) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5));

    SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
}

/// Get the adwrap database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

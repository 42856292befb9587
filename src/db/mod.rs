//! Database module for SQLite persistence.
//!
//! SQLite backs a small key-value table; the roster is one snapshot stored under a fixed key.

mod kv;
mod roster;

pub use kv::*;
pub use roster::*;

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};

use crate::errors::AppError;

fn connect_options(db_path: &Path) -> Result<SqliteConnectOptions, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", db_path.display()))?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .busy_timeout(Duration::from_secs(30));
    Ok(options)
}

/// Open (creating if needed) the database at `db_path` and run migrations.
pub async fn init_database(db_path: &Path) -> Result<SqlitePool, sqlx::Error> {
    if let Some(parent) = db_path.parent() {
        tokio::fs::create_dir_all(parent).await.ok();
    }

    let pool = SqlitePoolOptions::new()
        .max_connections(4)
        .connect_with(connect_options(db_path)?)
        .await?;

    migrate(&pool).await?;
    Ok(pool)
}

/// Roster-ready store on top of a freshly opened database.
pub async fn open_store(db_path: &Path) -> Result<SqliteStore, AppError> {
    let pool = init_database(db_path).await?;
    tracing::debug!("Opened key-value store at {}", db_path.display());
    Ok(SqliteStore::new(pool))
}

async fn migrate(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS kv_store (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            revision INTEGER NOT NULL DEFAULT 1,
            updated_at TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

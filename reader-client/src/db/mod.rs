//! Durable local store.
//!
//! An embedded SQLite database holding the offline submission queue,
//! the two cache snapshot collections, and the snapshot freshness
//! metadata. Everything the field device must not lose on power-off
//! goes through here.

pub mod queue;
pub mod snapshots;

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};

/// Open (creating if needed) the store at `path` and ensure the schema.
pub async fn open(path: impl AsRef<Path>) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::new()
        .filename(path.as_ref())
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .foreign_keys(true)
        .busy_timeout(Duration::from_secs(30));

    let pool = SqlitePoolOptions::new()
        .max_connections(4)
        .connect_with(options)
        .await?;

    init_schema(&pool).await?;
    Ok(pool)
}

/// In-memory store for tests. A single never-recycled connection keeps
/// the database alive for the pool's lifetime.
pub async fn open_in_memory() -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;

    init_schema(&pool).await?;
    Ok(pool)
}

async fn init_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS pending_readings (
            id                 INTEGER PRIMARY KEY AUTOINCREMENT,
            customer_id        INTEGER NOT NULL,
            current_reading    REAL NOT NULL,
            previous_reading   REAL NOT NULL,
            period_date        TEXT NOT NULL,
            amount             REAL NOT NULL,
            consumption        REAL NOT NULL,
            due_date           TEXT NOT NULL,
            base_charge        REAL NOT NULL,
            consumption_charge REAL NOT NULL,
            penalty            REAL NOT NULL,
            tax                REAL NOT NULL,
            arrears            REAL NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS snapshot_areas (
            key     TEXT PRIMARY KEY,
            payload TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS snapshot_customers (
            key     TEXT PRIMARY KEY,
            payload TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS cache_meta (
            key   TEXT PRIMARY KEY,
            value INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

//! Snapshot collection queries.
//!
//! Snapshots follow replace-all semantics: a save clears the
//! collection, bulk-inserts the new records and stamps the freshness
//! timestamp inside one transaction, so readers observe either the old
//! snapshot or the new one, never a partial mix.

use sqlx::SqlitePool;

/// The two snapshot collections. Keys are entity ids rendered as text
/// (plus the settings sentinel in the areas collection).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotTable {
    Areas,
    Customers,
}

impl SnapshotTable {
    fn table_name(self) -> &'static str {
        match self {
            SnapshotTable::Areas => "snapshot_areas",
            SnapshotTable::Customers => "snapshot_customers",
        }
    }

    /// Freshness metadata key for this collection.
    pub fn meta_key(self) -> &'static str {
        match self {
            SnapshotTable::Areas => "sync_areas_time",
            SnapshotTable::Customers => "sync_customers_time",
        }
    }
}

/// Atomically replace the collection contents and its freshness stamp.
pub async fn replace_all(
    pool: &SqlitePool,
    table: SnapshotTable,
    rows: &[(String, String)],
    stamp: i64,
) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query(&format!("DELETE FROM {}", table.table_name()))
        .execute(&mut *tx)
        .await?;

    for (key, payload) in rows {
        sqlx::query(&format!(
            "INSERT INTO {} (key, payload) VALUES (?1, ?2)",
            table.table_name()
        ))
        .bind(key)
        .bind(payload)
        .execute(&mut *tx)
        .await?;
    }

    sqlx::query(
        r#"
        INSERT INTO cache_meta (key, value) VALUES (?1, ?2)
        ON CONFLICT(key) DO UPDATE SET value = excluded.value
        "#,
    )
    .bind(table.meta_key())
    .bind(stamp)
    .execute(&mut *tx)
    .await?;

    tx.commit().await
}

/// All record payloads of a collection, in key order.
pub async fn load_payloads(
    pool: &SqlitePool,
    table: SnapshotTable,
) -> Result<Vec<String>, sqlx::Error> {
    let rows: Vec<(String,)> = sqlx::query_as(&format!(
        "SELECT payload FROM {} ORDER BY key",
        table.table_name()
    ))
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(|(p,)| p).collect())
}

/// Unix-seconds freshness stamp of a collection, if it was ever saved.
pub async fn freshness(
    pool: &SqlitePool,
    table: SnapshotTable,
) -> Result<Option<i64>, sqlx::Error> {
    let row: Option<(i64,)> = sqlx::query_as("SELECT value FROM cache_meta WHERE key = ?1")
        .bind(table.meta_key())
        .fetch_optional(pool)
        .await?;
    Ok(row.map(|(v,)| v))
}

//! Cache manager: snapshot persistence with daily expiry.
//!
//! Meter reading runs on a daily cycle, and yesterday's tariffs,
//! discounts or arrears may have changed, so a snapshot is only served
//! while its freshness stamp falls on the current calendar day. An
//! expired snapshot is reported as such — never silently served stale —
//! even though its rows physically remain in storage until the next
//! successful fetch replaces them.

use sqlx::SqlitePool;
use time::{OffsetDateTime, Time};

use reader_client::db::snapshots::{self, SnapshotTable};
use reader_client::domain::{AreaRecord, Customer};

use crate::error::ClientError;

/// Result of a snapshot load.
#[derive(Debug, Clone, PartialEq)]
pub enum SnapshotLoad<T> {
    Fresh(Vec<T>),
    /// Never saved, or saved before the start of today.
    Expired,
}

impl<T> SnapshotLoad<T> {
    pub fn is_expired(&self) -> bool {
        matches!(self, SnapshotLoad::Expired)
    }
}

#[derive(Clone)]
pub struct CacheManager {
    pool: SqlitePool,
}

impl CacheManager {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn save_areas(
        &self,
        records: &[AreaRecord],
        now: OffsetDateTime,
    ) -> Result<(), ClientError> {
        let rows = records
            .iter()
            .map(|r| Ok((r.key(), serde_json::to_string(r)?)))
            .collect::<Result<Vec<_>, serde_json::Error>>()?;
        snapshots::replace_all(&self.pool, SnapshotTable::Areas, &rows, now.unix_timestamp())
            .await?;
        Ok(())
    }

    pub async fn save_customers(
        &self,
        records: &[Customer],
        now: OffsetDateTime,
    ) -> Result<(), ClientError> {
        let rows = records
            .iter()
            .map(|c| Ok((c.id.to_string(), serde_json::to_string(c)?)))
            .collect::<Result<Vec<_>, serde_json::Error>>()?;
        snapshots::replace_all(
            &self.pool,
            SnapshotTable::Customers,
            &rows,
            now.unix_timestamp(),
        )
        .await?;
        Ok(())
    }

    pub async fn load_areas(
        &self,
        now: OffsetDateTime,
    ) -> Result<SnapshotLoad<AreaRecord>, ClientError> {
        self.load(SnapshotTable::Areas, now).await
    }

    pub async fn load_customers(
        &self,
        now: OffsetDateTime,
    ) -> Result<SnapshotLoad<Customer>, ClientError> {
        self.load(SnapshotTable::Customers, now).await
    }

    async fn load<T: serde::de::DeserializeOwned>(
        &self,
        table: SnapshotTable,
        now: OffsetDateTime,
    ) -> Result<SnapshotLoad<T>, ClientError> {
        let stamp = snapshots::freshness(&self.pool, table).await?;
        match stamp {
            Some(s) if is_fresh(s, now) => {}
            _ => {
                tracing::warn!(collection = table.meta_key(), "snapshot expired or missing");
                metrics::counter!("cache_expired_total").increment(1);
                return Ok(SnapshotLoad::Expired);
            }
        }

        let payloads = snapshots::load_payloads(&self.pool, table).await?;
        let records = payloads
            .iter()
            .map(|p| serde_json::from_str(p))
            .collect::<Result<Vec<T>, _>>()?;
        Ok(SnapshotLoad::Fresh(records))
    }
}

/// Fresh means stamped at or after the start of `now`'s calendar day.
fn is_fresh(stamp: i64, now: OffsetDateTime) -> bool {
    stamp >= now.replace_time(Time::MIDNIGHT).unix_timestamp()
}

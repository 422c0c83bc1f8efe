//! Offline submission queue queries.
//!
//! Rows are inserted when a submission cannot reach the server and
//! deleted only after a confirmed remote acceptance. There is no
//! update path.

use sqlx::SqlitePool;
use time::Date;

use crate::domain::{BillPayload, PendingSubmission};

#[derive(Debug, sqlx::FromRow)]
struct PendingRow {
    id: i64,
    customer_id: i64,
    current_reading: f64,
    previous_reading: f64,
    period_date: Date,
    amount: f64,
    consumption: f64,
    due_date: Date,
    base_charge: f64,
    consumption_charge: f64,
    penalty: f64,
    tax: f64,
    arrears: f64,
}

impl From<PendingRow> for PendingSubmission {
    fn from(r: PendingRow) -> Self {
        PendingSubmission {
            local_id: r.id,
            payload: BillPayload {
                customer_id: r.customer_id,
                current_reading: r.current_reading,
                previous_reading: r.previous_reading,
                period_date: r.period_date,
                amount: r.amount,
                consumption: r.consumption,
                due_date: r.due_date,
                base_charge: r.base_charge,
                consumption_charge: r.consumption_charge,
                penalty: r.penalty,
                tax: r.tax,
                arrears: r.arrears,
            },
        }
    }
}

/// Insert a submission and return its store-assigned local id.
pub async fn insert(pool: &SqlitePool, payload: &BillPayload) -> Result<i64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO pending_readings (
            customer_id, current_reading, previous_reading, period_date,
            amount, consumption, due_date, base_charge, consumption_charge,
            penalty, tax, arrears
        )
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
        "#,
    )
    .bind(payload.customer_id)
    .bind(payload.current_reading)
    .bind(payload.previous_reading)
    .bind(payload.period_date)
    .bind(payload.amount)
    .bind(payload.consumption)
    .bind(payload.due_date)
    .bind(payload.base_charge)
    .bind(payload.consumption_charge)
    .bind(payload.penalty)
    .bind(payload.tax)
    .bind(payload.arrears)
    .execute(pool)
    .await?;

    Ok(result.last_insert_rowid())
}

/// All queued submissions in insertion order.
pub async fn all(pool: &SqlitePool) -> Result<Vec<PendingSubmission>, sqlx::Error> {
    let rows = sqlx::query_as::<_, PendingRow>(
        r#"
        SELECT id, customer_id, current_reading, previous_reading, period_date,
               amount, consumption, due_date, base_charge, consumption_charge,
               penalty, tax, arrears
        FROM pending_readings
        ORDER BY id
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(PendingSubmission::from).collect())
}

/// Delete one acknowledged submission.
pub async fn delete(pool: &SqlitePool, local_id: i64) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM pending_readings WHERE id = ?1")
        .bind(local_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Number of queued submissions.
pub async fn count(pool: &SqlitePool) -> Result<u64, sqlx::Error> {
    let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM pending_readings")
        .fetch_one(pool)
        .await?;
    Ok(n as u64)
}

use anyhow::Result;
use reader_client::db::queue;
use sync_service::{config::AppConfig, observability};

/// Print every reading waiting in the offline queue.
///
/// Usage:
///   pending_report
#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    let cfg = AppConfig::load()?;
    let pool = reader_client::db::open(&cfg.store.path).await?;

    let items = queue::all(&pool).await?;
    if items.is_empty() {
        println!("offline queue is empty");
        return Ok(());
    }

    println!("{} pending reading(s):", items.len());
    for item in items {
        let p = &item.payload;
        println!(
            "  #{:<4} customer {:<6} {} reading {:>8.1} consumption {:>6.1} amount {:>10.2}",
            item.local_id, p.customer_id, p.period_date, p.current_reading, p.consumption, p.amount
        );
    }

    Ok(())
}

use anyhow::{bail, Result};
use std::sync::Arc;
use sync_service::{
    client::ReaderClient,
    config::AppConfig,
    connectivity::StaticConnectivity,
    observability,
    remote::HttpRemoteService,
    sync::{SyncOutcome, SyncTuning},
};

/// Drain the offline queue once and exit.
///
/// Usage:
///   drain_queue
#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    // Load configuration (READER_CONFIG can point to a device-specific file).
    let cfg = AppConfig::load()?;

    let pool = reader_client::db::open(&cfg.store.path).await?;
    let remote = Arc::new(HttpRemoteService::new(&cfg.remote));

    // A manual drain assumes the operator knows the link is up.
    let client = ReaderClient::new(
        pool,
        remote,
        Arc::new(StaticConnectivity::new(true)),
        SyncTuning::from(&cfg.sync),
    );

    match client.trigger_sync().await? {
        SyncOutcome::NothingToSync => {
            tracing::info!("queue is empty, nothing to drain");
        }
        SyncOutcome::AlreadyRunning => unreachable!("single-shot process"),
        SyncOutcome::Completed(report) => {
            tracing::info!(
                succeeded = report.succeeded,
                failed = report.failed,
                "drain finished"
            );
            if report.failed > 0 {
                bail!("{} readings could not be synced", report.failed);
            }
        }
    }

    Ok(())
}

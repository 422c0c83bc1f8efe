use anyhow::Result;
use std::{sync::Arc, time::Duration};
use sync_service::{
    client::ReaderClient,
    config::AppConfig,
    connectivity::{Connectivity, HttpProbe},
    notify::ClientEvent,
    observability,
    remote::HttpRemoteService,
    sync::SyncTuning,
};

#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    // Load configuration
    let cfg = AppConfig::load()?;

    let pool = reader_client::db::open(&cfg.store.path).await?;

    let remote = Arc::new(HttpRemoteService::new(&cfg.remote));
    let probe = Arc::new(HttpProbe::new(
        &cfg.remote,
        Duration::from_millis(cfg.probe.timeout_ms),
    )?);

    let client = Arc::new(ReaderClient::new(
        pool,
        remote,
        probe.clone(),
        SyncTuning::from(&cfg.sync),
    ));

    // Mirror engine events into the log; a UI would render these.
    let mut events = client.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                ClientEvent::Notice(n) => tracing::info!(kind = ?n.kind, "{}", n.message),
                ClientEvent::PendingCount(n) => tracing::info!(pending = n, "queue depth changed"),
                ClientEvent::DashboardInvalidated => tracing::debug!("dashboard invalidated"),
            }
        }
    });

    // A previous run may have left readings behind.
    if client.pending_count().await? > 0 {
        if let Err(e) = client.trigger_sync().await {
            tracing::error!(error = %e, "startup drain failed");
        }
    }

    watch_connectivity(client, probe, Duration::from_secs(cfg.probe.interval_secs)).await;
    Ok(())
}

/// Poll the probe and drain the queue on every offline-to-online edge.
async fn watch_connectivity(
    client: Arc<ReaderClient>,
    probe: Arc<HttpProbe>,
    interval: Duration,
) {
    let mut ticker = tokio::time::interval(interval);
    let mut was_online = probe.is_online().await;
    loop {
        ticker.tick().await;
        let online = probe.is_online().await;
        if online && !was_online {
            tracing::info!("connection restored, draining queue");
            if let Err(e) = client.trigger_sync().await {
                tracing::error!(error = %e, "drain after reconnect failed");
            }
        }
        was_online = online;
    }
}

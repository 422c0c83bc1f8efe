//! Reconciliation engine.
//!
//! Drains the offline queue into the remote `generate_bill` procedure.
//! At most one drain runs at a time; a trigger that finds one already
//! in flight returns immediately. A queued reading is deleted only
//! after the server acknowledged it, retried a bounded number of times
//! on retryable failures, and left in place otherwise.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use reader_client::db::queue;
use reader_client::zones;

use crate::cache::SnapshotLoad;
use crate::client::ReaderClient;
use crate::config::SyncConfig;
use crate::error::ClientError;
use crate::notify::NoticeKind;

#[derive(Debug, Clone)]
pub struct SyncTuning {
    /// Attempts per queued reading before it is left for the next run.
    pub max_attempts: u32,
    /// Pause before the first remote call, so a connection that just
    /// came up has settled.
    pub settle_delay: Duration,
    /// Pause between attempts on the same reading.
    pub retry_pause: Duration,
}

impl Default for SyncTuning {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            settle_delay: Duration::from_secs(1),
            retry_pause: Duration::from_millis(500),
        }
    }
}

impl From<&SyncConfig> for SyncTuning {
    fn from(cfg: &SyncConfig) -> Self {
        Self {
            max_attempts: cfg.max_attempts,
            settle_delay: Duration::from_millis(cfg.settle_delay_ms),
            retry_pause: Duration::from_millis(cfg.retry_pause_ms),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SyncReport {
    pub succeeded: u32,
    pub failed: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Another drain holds the flag; nothing was done.
    AlreadyRunning,
    /// The queue was empty.
    NothingToSync,
    Completed(SyncReport),
}

/// Clears the running flag even on an early `?` return.
struct RunningFlag<'a>(&'a AtomicBool);

impl Drop for RunningFlag<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl ReaderClient {
    /// Drain the offline queue once.
    pub async fn trigger_sync(&self) -> Result<SyncOutcome, ClientError> {
        if self
            .sync_running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!("drain already in flight, trigger ignored");
            return Ok(SyncOutcome::AlreadyRunning);
        }
        let _running = RunningFlag(&self.sync_running);

        let items = queue::all(&self.store).await?;
        if items.is_empty() {
            return Ok(SyncOutcome::NothingToSync);
        }

        tracing::info!(pending = items.len(), "starting queue drain");
        self.notifier
            .notice(NoticeKind::Info, format!("Syncing {} readings...", items.len()));
        tokio::time::sleep(self.tuning.settle_delay).await;

        let mut report = SyncReport::default();
        for item in &items {
            if self.push_one(item).await {
                queue::delete(&self.store, item.local_id).await?;
                metrics::counter!("queue_drained_total").increment(1);
                report.succeeded += 1;
            } else {
                report.failed += 1;
            }
        }

        self.publish_pending_count().await?;

        if report.succeeded > 0 {
            self.refresh_route_from_cache().await?;
            self.notifier.dashboard_invalidated();
        }

        tracing::info!(
            succeeded = report.succeeded,
            failed = report.failed,
            "queue drain finished"
        );
        match (report.succeeded, report.failed) {
            (s, 0) => self.notifier.notice(
                NoticeKind::Success,
                format!("Synced {s} readings successfully!"),
            ),
            (0, _) => self
                .notifier
                .notice(NoticeKind::Error, "Sync failed. Will retry later."),
            (s, f) => self
                .notifier
                .notice(NoticeKind::Warning, format!("Synced {s}, Failed {f}.")),
        }

        Ok(SyncOutcome::Completed(report))
    }

    /// Push one queued reading, retrying retryable failures up to the
    /// attempt cap. Returns whether the server acknowledged it.
    async fn push_one(&self, item: &reader_client::domain::PendingSubmission) -> bool {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.remote.generate_bill(&item.payload).await {
                Ok(bill_id) => {
                    tracing::info!(local_id = item.local_id, bill_id, "queued reading accepted");
                    return true;
                }
                Err(e) if !e.is_retryable() => {
                    tracing::warn!(
                        local_id = item.local_id,
                        error = %e,
                        "rejected outright, leaving in queue"
                    );
                    return false;
                }
                Err(e) if attempt < self.tuning.max_attempts => {
                    tracing::warn!(local_id = item.local_id, attempt, error = %e, "retrying");
                    tokio::time::sleep(self.tuning.retry_pause).await;
                }
                Err(e) => {
                    tracing::warn!(
                        local_id = item.local_id,
                        attempt,
                        error = %e,
                        "attempts exhausted, leaving in queue"
                    );
                    return false;
                }
            }
        }
    }

    /// After a successful drain the server holds newer state than the
    /// open route; fold the cached snapshot back into it.
    async fn refresh_route_from_cache(&self) -> Result<(), ClientError> {
        let SnapshotLoad::Fresh(customers) = self.cache.load_customers(self.now()).await? else {
            return Ok(());
        };
        let mut session = self.session.lock().await;
        if let Some(route) = session.as_mut().and_then(|s| s.open_route.as_mut()) {
            route.customers = zones::filter_to_zones(customers, &route.zones);
        }
        Ok(())
    }
}

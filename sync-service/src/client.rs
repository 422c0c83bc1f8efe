//! The core facade handed to the UI layer.
//!
//! `ReaderClient` owns the durable store, the cache manager, the remote
//! service handle and the session context. The submission pipeline,
//! the reconciliation engine and the dashboard assembly are implemented
//! in their own modules as further `impl` blocks on this type.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use sqlx::SqlitePool;
use time::OffsetDateTime;
use tokio::sync::broadcast;

use reader_client::db::queue;
use reader_client::domain::ReaderProfile;

use crate::cache::CacheManager;
use crate::connectivity::Connectivity;
use crate::error::ClientError;
use crate::notify::{ClientEvent, Notifier};
use crate::remote::RemoteService;
use crate::session::SessionContext;
use crate::sync::SyncTuning;

/// Source of "now". Injected so calendar-day logic is testable.
pub type Clock = Arc<dyn Fn() -> OffsetDateTime + Send + Sync>;

pub struct ReaderClient {
    pub(crate) store: SqlitePool,
    pub(crate) cache: CacheManager,
    pub(crate) remote: Arc<dyn RemoteService>,
    pub(crate) connectivity: Arc<dyn Connectivity>,
    pub(crate) notifier: Notifier,
    pub(crate) tuning: SyncTuning,
    pub(crate) session: tokio::sync::Mutex<Option<SessionContext>>,
    pub(crate) sync_running: AtomicBool,
    pub(crate) clock: Clock,
}

impl ReaderClient {
    pub fn new(
        store: SqlitePool,
        remote: Arc<dyn RemoteService>,
        connectivity: Arc<dyn Connectivity>,
        tuning: SyncTuning,
    ) -> Self {
        Self {
            cache: CacheManager::new(store.clone()),
            store,
            remote,
            connectivity,
            notifier: Notifier::default(),
            tuning,
            session: tokio::sync::Mutex::new(None),
            sync_running: AtomicBool::new(false),
            clock: Arc::new(OffsetDateTime::now_utc),
        }
    }

    /// Replace the wall clock, for deterministic tests.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Subscribe to user-visible events (notices, pending count,
    /// dashboard invalidation).
    pub fn subscribe(&self) -> broadcast::Receiver<ClientEvent> {
        self.notifier.subscribe()
    }

    /// Begin a session for an authenticated reader.
    pub async fn login(&self, profile: ReaderProfile) {
        tracing::info!(reader = %profile.full_name(), "session started");
        *self.session.lock().await = Some(SessionContext::new(profile));
    }

    /// Clear the session context. The offline queue and the snapshots
    /// survive logout; they belong to the device, not the session.
    pub async fn logout(&self) {
        tracing::info!("session cleared");
        *self.session.lock().await = None;
    }

    /// Number of submissions waiting in the offline queue.
    pub async fn pending_count(&self) -> Result<u64, ClientError> {
        Ok(queue::count(&self.store).await?)
    }

    pub(crate) fn now(&self) -> OffsetDateTime {
        (self.clock)()
    }

    /// Re-publish the pending count after a queue mutation.
    pub(crate) async fn publish_pending_count(&self) -> Result<u64, ClientError> {
        let count = queue::count(&self.store).await?;
        self.notifier.pending_count(count);
        Ok(count)
    }
}

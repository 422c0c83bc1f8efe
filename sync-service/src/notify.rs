//! User-visible events.
//!
//! The core never touches presentation state; it publishes events on a
//! broadcast channel and the UI renders them. Notices are de-duplicated
//! within a short window so a burst of identical failures produces one
//! message, not a stack.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use tokio::sync::broadcast;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    Notice(Notice),
    /// Number of submissions waiting in the offline queue.
    PendingCount(u64),
    /// Dashboard-derived data changed; re-pull it when convenient.
    DashboardInvalidated,
}

pub struct Notifier {
    tx: broadcast::Sender<ClientEvent>,
    recent: Mutex<VecDeque<(Instant, String)>>,
    window: Duration,
}

impl Notifier {
    pub fn new(window: Duration) -> Self {
        let (tx, _) = broadcast::channel(64);
        Self {
            tx,
            recent: Mutex::new(VecDeque::new()),
            window,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ClientEvent> {
        self.tx.subscribe()
    }

    /// Publish a notice unless the same message went out within the
    /// de-duplication window.
    pub fn notice(&self, kind: NoticeKind, message: impl Into<String>) {
        let message = message.into();
        {
            let mut recent = self.recent.lock().expect("notice lock poisoned");
            let now = Instant::now();
            recent.retain(|(at, _)| now.duration_since(*at) < self.window);
            if recent.iter().any(|(_, m)| *m == message) {
                tracing::debug!(%message, "duplicate notice suppressed");
                return;
            }
            recent.push_back((now, message.clone()));
        }
        // No subscribers is fine; events are advisory.
        let _ = self.tx.send(ClientEvent::Notice(Notice { kind, message }));
    }

    pub fn pending_count(&self, count: u64) {
        let _ = self.tx.send(ClientEvent::PendingCount(count));
    }

    pub fn dashboard_invalidated(&self) {
        let _ = self.tx.send(ClientEvent::DashboardInvalidated);
    }
}

impl Default for Notifier {
    fn default() -> Self {
        // Matches the on-screen lifetime of a toast.
        Self::new(Duration::from_secs(3))
    }
}

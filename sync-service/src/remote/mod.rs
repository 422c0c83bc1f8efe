//! Remote service contract.
//!
//! The backend is opaque to the core: a handful of read-only query
//! endpoints plus the authoritative `generate_bill` procedure. The
//! trait seam keeps the engine testable against scripted stubs; the
//! production implementation lives in [`http`].

pub mod http;

use async_trait::async_trait;
use time::Date;

use reader_client::domain::{Area, BillPayload, Customer, DailyBill, SystemSettings};

pub use http::HttpRemoteService;

/// Error code the backend emits when the connection drops mid-request.
pub const CONNECTION_DROPPED_CODE: &str = "PGRST301";

/// How a remote failure should be treated by retry logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteErrorKind {
    /// The connection went away mid-request; the device is effectively
    /// offline again.
    Disconnected,
    /// Server-side or network trouble that may clear up on its own.
    Transient,
    /// The request itself is bad; retrying it will never succeed.
    Structural,
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("remote call failed ({code:?}): {message}")]
pub struct RemoteError {
    pub kind: RemoteErrorKind,
    /// Error code as reported by the backend, when it sent one.
    pub code: Option<String>,
    pub message: String,
}

impl RemoteError {
    /// Classify a coded backend error. Codes in the `5xx` class are
    /// transient; the connection-dropped code maps to `Disconnected`;
    /// everything else is structural.
    pub fn from_code(code: impl Into<String>, message: impl Into<String>) -> Self {
        let code = code.into();
        let kind = if code == CONNECTION_DROPPED_CODE {
            RemoteErrorKind::Disconnected
        } else if code.starts_with('5') {
            RemoteErrorKind::Transient
        } else {
            RemoteErrorKind::Structural
        };
        Self {
            kind,
            code: Some(code),
            message: message.into(),
        }
    }

    /// A transport-level failure with no classifiable code.
    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            kind: RemoteErrorKind::Transient,
            code: None,
            message: message.into(),
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.kind != RemoteErrorKind::Structural
    }
}

/// The backend as the core sees it.
#[async_trait]
pub trait RemoteService: Send + Sync {
    /// The singleton tariff/policy record, if one exists.
    async fn fetch_settings(&self) -> Result<Option<SystemSettings>, RemoteError>;

    /// Area assignments, optionally filtered to one reader's staff id.
    async fn fetch_areas(&self, assigned_reader_id: Option<i64>) -> Result<Vec<Area>, RemoteError>;

    /// All active customers with their billing history already derived.
    async fn fetch_customers(&self) -> Result<Vec<Customer>, RemoteError>;

    /// Billings created on the given day, for route progress.
    async fn fetch_daily_bills(&self, on: Date) -> Result<Vec<DailyBill>, RemoteError>;

    /// Authoritative bill creation. Returns the server bill id.
    /// At-least-once: the caller may retry, duplicate suppression is a
    /// server concern.
    async fn generate_bill(&self, payload: &BillPayload) -> Result<i64, RemoteError>;
}

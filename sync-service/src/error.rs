use crate::remote::RemoteError;

/// Error taxonomy of the core.
///
/// `Validation` rejects bad input with no state change. `Storage` is a
/// hard failure: there is no fallback below the local store. Remote
/// failures carry their transient/structural classification inside
/// [`RemoteError`]; note that the submission pipeline converts every
/// remote failure into a queued submission rather than surfacing it.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("invalid reading: {0}")]
    Validation(String),

    #[error("no reader session; log in first")]
    NoSession,

    #[error("area {0} is not assigned to this reader")]
    UnknownArea(i64),

    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),

    #[error("snapshot decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error(transparent)]
    Remote(#[from] RemoteError),
}

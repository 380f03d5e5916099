//! Failure taxonomy for the sync engine.
//!
//! None of these escape the engine as panics or unhandled results: each is
//! folded back into save status or stream state by the component that
//! observed it.

use thiserror::Error;

/// A remote call that did not succeed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteFailure {
    /// The server answered with a non-success status.
    #[error("{detail}")]
    Status { status: u16, detail: String },

    /// The request never produced a response (connect, DNS, reset).
    #[error("transport error: {0}")]
    Transport(String),

    /// The response arrived but could not be understood.
    #[error("invalid response: {0}")]
    Decode(String),
}

impl RemoteFailure {
    /// Build a status failure, falling back to a generic message when the
    /// server did not send a `detail`.
    pub fn status(status: u16, detail: Option<String>) -> Self {
        let detail = detail
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| format!("Request failed: {status}"));
        RemoteFailure::Status { status, detail }
    }
}

/// Draft provisioning failed; no save is attempted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failed to create draft: {0}")]
pub struct CreateError(#[from] pub RemoteFailure);

/// Persisting the document failed; edits stay local and are retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failed to save document: {0}")]
pub struct UpdateError(#[from] pub RemoteFailure);

/// Opening or reading a generation stream failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StreamError {
    #[error("{0}")]
    Open(RemoteFailure),

    #[error("stream interrupted: {0}")]
    Interrupted(String),
}

impl From<RemoteFailure> for StreamError {
    fn from(failure: RemoteFailure) -> Self {
        StreamError::Open(failure)
    }
}

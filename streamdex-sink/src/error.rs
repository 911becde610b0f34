//! Error types for search backends.

use thiserror::Error;

/// Result type for backend operations.
pub type SinkResult<T> = Result<T, SinkError>;

/// Errors a backend call can surface. The dispatcher treats all of them
/// the same way: the call failed for this event on this backend.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("backend returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("backend rejected the request: {0}")]
    Rejected(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl SinkError {
    /// Returns the HTTP status code, if the backend answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            SinkError::Status { status, .. } => Some(*status),
            SinkError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Returns true if the request timed out before the backend answered.
    pub fn is_timeout(&self) -> bool {
        matches!(self, SinkError::Http(e) if e.is_timeout())
    }
}

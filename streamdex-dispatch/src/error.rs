//! Error types for event dispatch.

use streamdex_codec::DecodeError;
use streamdex_sink::SinkError;
use thiserror::Error;

/// Result type for dispatch operations.
pub type DispatchResult<T> = Result<T, DispatchError>;

/// Errors that can occur while turning an event into backend calls.
///
/// None of these abort a batch; they are recorded against the event that
/// caused them.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("invalid record: {0}")]
    Record(#[from] streamdex_types::Error),

    #[error("malformed source locator: {0}")]
    MalformedLocator(String),

    #[error("decode failed: {0}")]
    Decode(#[from] DecodeError),

    #[error("key field `{field}` missing for source `{source_name}`")]
    KeyFieldMissing { source_name: String, field: String },

    #[error("event has no key attributes")]
    EmptyKey,

    #[error("expected one or two key attributes, got {0}")]
    TooManyKeyAttributes(usize),

    #[error("{0} event has no new image")]
    MissingNewImage(streamdex_types::EventKind),

    #[error("backend `{backend}` failed: {source}")]
    Backend {
        backend: String,
        #[source]
        source: SinkError,
    },

    #[error("invalid table description: {0}")]
    Mapping(String),
}

impl DispatchError {
    pub(crate) fn backend(backend: &str, source: SinkError) -> Self {
        Self::Backend {
            backend: backend.to_string(),
            source,
        }
    }
}

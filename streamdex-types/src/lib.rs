//! Core type definitions for streamdex.
//!
//! This crate defines the types shared by every stage of the pipeline:
//! - Tagged attribute values as they appear on the change-stream wire
//! - Change events (insert / modify / remove) parsed from stream records
//! - The decoded document type handed to search backends
//! - The optional schema mapping that drives document identity
//!
//! Decoding tagged values into documents lives in `streamdex-codec`; this
//! crate only validates the wire shape.

mod event;
mod mapping;
mod tagged;

pub use event::{ChangeEvent, EventKind, StreamBatch};
pub use mapping::{DEFAULT_MAPPING_PATH, MappingEntry, SchemaMapping};
pub use tagged::{AttributeMap, TaggedValue};

/// A decoded, backend-ready document. Field order follows the wire.
pub type Document = serde_json::Map<String, serde_json::Value>;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while reading wire data.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unsupported attribute tag: {0}")]
    UnsupportedTag(String),

    #[error("invalid {tag} payload: {reason}")]
    InvalidPayload { tag: &'static str, reason: String },

    #[error("invalid stream record: {0}")]
    InvalidRecord(String),

    #[error("unknown event name: {0}")]
    UnknownEventName(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

//! Error types for decoding.

use thiserror::Error;

/// Result type for decode operations.
pub type DecodeResult<T> = Result<T, DecodeError>;

/// Errors that can occur while decoding tagged values.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The wire value was not a well-formed tagged value.
    #[error(transparent)]
    Wire(#[from] streamdex_types::Error),

    /// A number payload is neither an integer nor a finite float.
    #[error("not a number: {0:?}")]
    NumericParseFailure(String),
}

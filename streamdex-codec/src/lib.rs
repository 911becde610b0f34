//! Tagged attribute decoding for streamdex.
//!
//! Turns the tagged wire format of the change stream into plain JSON values:
//!
//! ```
//! use serde_json::json;
//! use streamdex_codec::decode_json;
//!
//! let value = decode_json(&json!({"M": {"_id": {"S": "x"}, "n": {"N": "3"}}}), false).unwrap();
//! assert_eq!(value, json!({"__id": "x", "n": 3}));
//! ```
//!
//! Numbers inside maps are always typed; numbers inside lists keep their
//! textual form unless the list element is itself a map.

mod decoder;
mod error;
pub mod sanitize;

pub use decoder::{decode, decode_json, decode_map, decode_record, parse_number};
pub use error::{DecodeError, DecodeResult};
pub use sanitize::{RESERVED_FIELDS, is_reserved, sanitize_field_name};

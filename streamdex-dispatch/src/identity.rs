//! Document identity derivation.
//!
//! A document's identifier is built from the decoded key attributes of its
//! change event. When the schema mapping knows the source, the named fields
//! are used in partition-then-sort order; otherwise the key attributes are
//! taken in wire order. Both paths join components with `|`.

use crate::error::{DispatchError, DispatchResult};
use serde_json::Value;
use streamdex_codec::sanitize_field_name;
use streamdex_types::{Document, SchemaMapping};

/// Separator between identity components.
pub const KEY_SEPARATOR: &str = "|";

/// Builds the document identifier for `keys` emitted by `source`.
pub fn build_identity(
    keys: &Document,
    source: &str,
    mapping: Option<&SchemaMapping>,
) -> DispatchResult<String> {
    if let Some(entry) = mapping.and_then(|m| m.get(source)) {
        let mut id = key_field(keys, source, &entry.primary_key)?;
        if let Some(sort_key) = &entry.sort_key {
            id.push_str(KEY_SEPARATOR);
            id.push_str(&key_field(keys, source, sort_key)?);
        }
        return Ok(id);
    }

    match keys.len() {
        0 => Err(DispatchError::EmptyKey),
        1 | 2 => Ok(keys
            .values()
            .map(render_key_value)
            .collect::<Vec<_>>()
            .join(KEY_SEPARATOR)),
        n => Err(DispatchError::TooManyKeyAttributes(n)),
    }
}

/// Renders one decoded key value as identity text.
///
/// Strings are used verbatim. Numbers use their shortest round-trip form
/// (`7`, `4.5`, `1.0`). Everything else is rendered as compact JSON.
#[must_use]
pub fn render_key_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

// Mapping entries name raw attributes; decoded keys carry sanitized names.
fn key_field(keys: &Document, source: &str, field: &str) -> DispatchResult<String> {
    keys.get(&*sanitize_field_name(field))
        .map(render_key_value)
        .ok_or_else(|| DispatchError::KeyFieldMissing {
            source_name: source.to_string(),
            field: field.to_string(),
        })
}

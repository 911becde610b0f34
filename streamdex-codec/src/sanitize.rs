//! Field-name escaping for search-engine metadata fields.
//!
//! Search engines reserve a handful of top-level field names for document
//! metadata. A source attribute with one of those names would collide with
//! the engine's own field, so it is renamed while decoding.

use std::borrow::Cow;

/// Field names the search engine reserves for itself.
pub const RESERVED_FIELDS: [&str; 12] = [
    "uid",
    "_id",
    "_type",
    "_source",
    "_all",
    "_parent",
    "_fieldnames",
    "_routing",
    "_index",
    "_size",
    "_timestamp",
    "_ttl",
];

/// Returns true if `name` is a reserved field name.
#[must_use]
pub fn is_reserved(name: &str) -> bool {
    RESERVED_FIELDS.contains(&name)
}

/// Rewrites a reserved field name so it no longer collides.
///
/// The first underscore is doubled (`_id` becomes `__id`). A reserved name with
/// no underscore gets one prepended (`uid` becomes `_uid`). Every other name is
/// returned unchanged.
#[must_use]
pub fn sanitize_field_name(name: &str) -> Cow<'_, str> {
    if !is_reserved(name) {
        return Cow::Borrowed(name);
    }
    match name.find('_') {
        Some(at) => {
            let mut escaped = String::with_capacity(name.len() + 1);
            escaped.push_str(&name[..=at]);
            escaped.push('_');
            escaped.push_str(&name[at + 1..]);
            Cow::Owned(escaped)
        }
        None => Cow::Owned(format!("_{name}")),
    }
}

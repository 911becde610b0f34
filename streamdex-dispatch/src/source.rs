//! Source-name extraction from table locators.

use crate::error::{DispatchError, DispatchResult};
use regex_lite::Regex;
use std::sync::LazyLock;

static TABLE_LOCATOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^arn:aws:dynamodb:[^:]*:[^:]*:table/([0-9A-Za-z_.-]+)/.+")
        .expect("table locator pattern is valid")
});

/// Extracts the lower-cased table name from a stream source locator.
///
/// `arn:aws:dynamodb:us-east-1:123456789012:table/Orders/stream/2024-01-01T00:00:00.000`
/// yields `orders`. The result is used both as the index name and as the
/// schema-mapping lookup key.
pub fn extract_source(locator: &str) -> DispatchResult<String> {
    TABLE_LOCATOR
        .captures(locator)
        .and_then(|caps| caps.get(1))
        .map(|name| name.as_str().to_lowercase())
        .ok_or_else(|| DispatchError::MalformedLocator(locator.to_string()))
}

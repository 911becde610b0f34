//! Search backend abstraction trait.
//!
//! Defines the common interface for every index the dispatcher writes to.

use crate::error::SinkResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use streamdex_types::Document;

/// Settings applied when an index is created on demand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexSettings {
    /// Coerce mismatched field values (e.g. `"5"` into a numeric field)
    /// instead of rejecting the document.
    pub coerce: bool,
    /// Additional `index.*` settings, passed through verbatim.
    pub extra: Map<String, Value>,
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self {
            coerce: true,
            extra: Map::new(),
        }
    }
}

impl IndexSettings {
    /// The create-index request body.
    #[must_use]
    pub fn to_body(&self) -> Value {
        let mut settings = Map::new();
        settings.insert("index.mapping.coerce".to_string(), Value::Bool(self.coerce));
        for (key, value) in &self.extra {
            settings.insert(key.clone(), value.clone());
        }
        json!({ "settings": settings })
    }
}

/// What a backend reports about itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterInfo {
    pub cluster_name: Option<String>,
    /// Engine family, e.g. `elasticsearch` or `opensearch`.
    pub distribution: String,
    pub version: Option<String>,
}

/// Abstract search index interface.
///
/// All calls are independent requests; a failure leaves no state behind.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Name used in logs and failure reports.
    fn name(&self) -> &str;

    /// Whether indices must be created explicitly before the first write.
    fn requires_index_creation(&self) -> bool {
        true
    }

    /// Writes `document` under `id`, replacing any existing document.
    async fn write_document(&self, index: &str, id: &str, document: &Document) -> SinkResult<()>;

    /// Deletes the document stored under `id`. Deleting a missing document succeeds.
    async fn delete_document(&self, index: &str, id: &str) -> SinkResult<()>;

    /// Returns true if `index` exists.
    async fn index_exists(&self, index: &str) -> SinkResult<bool>;

    /// Creates `index` with the given settings.
    async fn create_index(&self, index: &str, settings: &IndexSettings) -> SinkResult<()>;

    /// Describes the cluster behind this backend.
    async fn cluster_info(&self) -> SinkResult<ClusterInfo>;
}

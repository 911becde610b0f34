use crate::backend::SearchBackend;
use crate::elasticsearch::ElasticsearchBackend;
use crate::error::SinkResult;
use crate::opensearch::OpenSearchBackend;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Which engine family a backend speaks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    Elasticsearch,
    #[serde(alias = "open_search")]
    Opensearch,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Elasticsearch => f.write_str("elasticsearch"),
            Self::Opensearch => f.write_str("opensearch"),
        }
    }
}

/// Configuration for one search backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Name used in logs and failure reports.
    pub name: String,
    pub kind: BackendKind,
    /// Base URL of the cluster (e.g. `https://search.example.com`).
    pub endpoint: String,
    /// Per-request timeout (in seconds).
    pub timeout_secs: u64,
    /// Ask the backend to refresh the index after every write, so changes
    /// become searchable immediately.
    pub refresh: bool,
    /// Use the index name as the mapping type in document paths, for
    /// clusters that still require mapping types. Elasticsearch only.
    pub legacy_doc_type: bool,
    /// Check for the index and create it before every upsert.
    pub ensure_index: bool,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            kind: BackendKind::Elasticsearch,
            endpoint: "http://localhost:9200".to_string(),
            timeout_secs: 60,
            refresh: true,
            legacy_doc_type: false,
            ensure_index: true,
        }
    }
}

impl BackendConfig {
    /// A config for `kind` at `endpoint`, named after the kind.
    #[must_use]
    pub fn new(kind: BackendKind, endpoint: impl Into<String>) -> Self {
        Self {
            name: kind.to_string(),
            kind,
            endpoint: endpoint.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

/// Builds the backend described by `config`.
pub fn connect(config: &BackendConfig) -> SinkResult<Arc<dyn SearchBackend>> {
    Ok(match config.kind {
        BackendKind::Elasticsearch => Arc::new(ElasticsearchBackend::new(config.clone())?),
        BackendKind::Opensearch => Arc::new(OpenSearchBackend::new(config.clone())?),
    })
}

//! OpenSearch backend implementation.
//!
//! OpenSearch has no mapping types, so documents always live under `_doc`.

use crate::backend::{ClusterInfo, IndexSettings, SearchBackend};
use crate::config::BackendConfig;
use crate::error::SinkResult;
use crate::http::IndexClient;
use async_trait::async_trait;
use streamdex_types::Document;
use tracing::warn;

const DOC_TYPE: &str = "_doc";

/// OpenSearch backend.
pub struct OpenSearchBackend {
    config: BackendConfig,
    http: IndexClient,
}

impl OpenSearchBackend {
    /// Creates a new OpenSearch backend.
    pub fn new(config: BackendConfig) -> SinkResult<Self> {
        if config.legacy_doc_type {
            warn!(
                "Backend {} is OpenSearch; ignoring legacy_doc_type",
                config.name
            );
        }
        let http = IndexClient::new(&config)?;
        Ok(Self { config, http })
    }
}

#[async_trait]
impl SearchBackend for OpenSearchBackend {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn requires_index_creation(&self) -> bool {
        self.config.ensure_index
    }

    async fn write_document(&self, index: &str, id: &str, document: &Document) -> SinkResult<()> {
        self.http.write_document(index, DOC_TYPE, id, document).await
    }

    async fn delete_document(&self, index: &str, id: &str) -> SinkResult<()> {
        self.http.delete_document(index, DOC_TYPE, id).await
    }

    async fn index_exists(&self, index: &str) -> SinkResult<bool> {
        self.http.index_exists(index).await
    }

    async fn create_index(&self, index: &str, settings: &IndexSettings) -> SinkResult<()> {
        self.http.create_index(index, settings).await
    }

    async fn cluster_info(&self) -> SinkResult<ClusterInfo> {
        self.http.cluster_info("opensearch").await
    }
}

//! Elasticsearch backend implementation.
//!
//! Uses the document index API (`PUT /{index}/_doc/{id}`), which replaces the
//! whole document. Clusters that still need mapping types get the index name
//! as the type instead of `_doc` when `legacy_doc_type` is set.

use crate::backend::{ClusterInfo, IndexSettings, SearchBackend};
use crate::config::BackendConfig;
use crate::error::SinkResult;
use crate::http::IndexClient;
use async_trait::async_trait;
use streamdex_types::Document;

/// Elasticsearch backend.
pub struct ElasticsearchBackend {
    config: BackendConfig,
    http: IndexClient,
}

impl ElasticsearchBackend {
    /// Creates a new Elasticsearch backend.
    pub fn new(config: BackendConfig) -> SinkResult<Self> {
        let http = IndexClient::new(&config)?;
        Ok(Self { config, http })
    }

    /// The mapping type segment used in document paths for `index`.
    fn doc_type<'a>(&self, index: &'a str) -> &'a str {
        if self.config.legacy_doc_type {
            index
        } else {
            "_doc"
        }
    }
}

#[async_trait]
impl SearchBackend for ElasticsearchBackend {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn requires_index_creation(&self) -> bool {
        self.config.ensure_index
    }

    async fn write_document(&self, index: &str, id: &str, document: &Document) -> SinkResult<()> {
        self.http
            .write_document(index, self.doc_type(index), id, document)
            .await
    }

    async fn delete_document(&self, index: &str, id: &str) -> SinkResult<()> {
        self.http
            .delete_document(index, self.doc_type(index), id)
            .await
    }

    async fn index_exists(&self, index: &str) -> SinkResult<bool> {
        self.http.index_exists(index).await
    }

    async fn create_index(&self, index: &str, settings: &IndexSettings) -> SinkResult<()> {
        self.http.create_index(index, settings).await
    }

    async fn cluster_info(&self) -> SinkResult<ClusterInfo> {
        self.http.cluster_info("elasticsearch").await
    }
}

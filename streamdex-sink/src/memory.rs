//! In-memory backend.
//!
//! Keeps documents in process memory and records every call it receives.
//! Used for dry runs, where nothing should reach a real cluster, and for
//! exercising the dispatcher in tests.

use crate::backend::{ClusterInfo, IndexSettings, SearchBackend};
use crate::error::{SinkError, SinkResult};
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use streamdex_types::Document;
use tokio::sync::RwLock;
use tracing::info;

/// One call received by a [`MemoryBackend`].
#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    IndexExists { index: String },
    CreateIndex { index: String },
    Write { index: String, id: String, document: Document },
    Delete { index: String, id: String },
}

#[derive(Debug, Default)]
struct MemoryState {
    calls: Vec<BackendCall>,
    indices: BTreeSet<String>,
    documents: BTreeMap<(String, String), Document>,
    rejecting: bool,
}

/// In-memory search backend.
#[derive(Clone)]
pub struct MemoryBackend {
    name: String,
    requires_index: bool,
    state: Arc<RwLock<MemoryState>>,
}

impl MemoryBackend {
    /// Creates an empty backend.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            requires_index: true,
            state: Arc::new(RwLock::new(MemoryState::default())),
        }
    }

    /// Creates a backend that rejects every write and delete.
    pub fn rejecting(name: impl Into<String>) -> Self {
        let state = MemoryState {
            rejecting: true,
            ..Default::default()
        };
        Self {
            name: name.into(),
            requires_index: true,
            state: Arc::new(RwLock::new(state)),
        }
    }

    /// Turns off the index existence check before writes.
    pub fn without_index_creation(mut self) -> Self {
        self.requires_index = false;
        self
    }

    /// Starts or stops rejecting writes and deletes.
    pub async fn set_rejecting(&self, rejecting: bool) {
        self.state.write().await.rejecting = rejecting;
    }

    /// Every call received so far, in order.
    pub async fn calls(&self) -> Vec<BackendCall> {
        self.state.read().await.calls.clone()
    }

    /// Only the write and delete calls received so far.
    pub async fn mutations(&self) -> Vec<BackendCall> {
        self.state
            .read()
            .await
            .calls
            .iter()
            .filter(|c| matches!(c, BackendCall::Write { .. } | BackendCall::Delete { .. }))
            .cloned()
            .collect()
    }

    /// The document currently stored under `index`/`id`.
    pub async fn document(&self, index: &str, id: &str) -> Option<Document> {
        self.state
            .read()
            .await
            .documents
            .get(&(index.to_string(), id.to_string()))
            .cloned()
    }

    /// Number of documents stored across all indices.
    pub async fn document_count(&self) -> usize {
        self.state.read().await.documents.len()
    }

    pub async fn has_index(&self, index: &str) -> bool {
        self.state.read().await.indices.contains(index)
    }
}

#[async_trait]
impl SearchBackend for MemoryBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn requires_index_creation(&self) -> bool {
        self.requires_index
    }

    async fn write_document(&self, index: &str, id: &str, document: &Document) -> SinkResult<()> {
        let mut state = self.state.write().await;
        state.calls.push(BackendCall::Write {
            index: index.to_string(),
            id: id.to_string(),
            document: document.clone(),
        });
        if state.rejecting {
            return Err(SinkError::Rejected(format!("{} refused write {index}/{id}", self.name)));
        }
        state.indices.insert(index.to_string());
        state
            .documents
            .insert((index.to_string(), id.to_string()), document.clone());
        info!("[{}] indexed {}/{}", self.name, index, id);
        Ok(())
    }

    async fn delete_document(&self, index: &str, id: &str) -> SinkResult<()> {
        let mut state = self.state.write().await;
        state.calls.push(BackendCall::Delete {
            index: index.to_string(),
            id: id.to_string(),
        });
        if state.rejecting {
            return Err(SinkError::Rejected(format!("{} refused delete {index}/{id}", self.name)));
        }
        state.documents.remove(&(index.to_string(), id.to_string()));
        info!("[{}] deleted {}/{}", self.name, index, id);
        Ok(())
    }

    async fn index_exists(&self, index: &str) -> SinkResult<bool> {
        let mut state = self.state.write().await;
        state.calls.push(BackendCall::IndexExists {
            index: index.to_string(),
        });
        Ok(state.indices.contains(index))
    }

    async fn create_index(&self, index: &str, _settings: &IndexSettings) -> SinkResult<()> {
        let mut state = self.state.write().await;
        state.calls.push(BackendCall::CreateIndex {
            index: index.to_string(),
        });
        state.indices.insert(index.to_string());
        Ok(())
    }

    async fn cluster_info(&self) -> SinkResult<ClusterInfo> {
        Ok(ClusterInfo {
            cluster_name: Some(self.name.clone()),
            distribution: "memory".to_string(),
            version: None,
        })
    }
}

//! Search backends for streamdex.
//!
//! Every backend implements [`SearchBackend`], a small capability interface
//! covering what change replay needs: write a whole document, delete one,
//! and make sure the target index exists. Two HTTP implementations ship with
//! the crate plus an in-memory one:
//!
//! - [`ElasticsearchBackend`]: Elasticsearch, optionally with legacy mapping types
//! - [`OpenSearchBackend`]: OpenSearch
//! - [`MemoryBackend`]: records calls in memory, for dry runs and tests
//!
//! Backends are built from a [`BackendConfig`] with [`connect`].

mod backend;
mod config;
pub mod elasticsearch;
mod error;
mod http;
pub mod memory;
pub mod opensearch;

pub use backend::{ClusterInfo, IndexSettings, SearchBackend};
pub use config::{BackendConfig, BackendKind, connect};
pub use elasticsearch::ElasticsearchBackend;
pub use error::{SinkError, SinkResult};
pub use memory::{BackendCall, MemoryBackend};
pub use opensearch::OpenSearchBackend;

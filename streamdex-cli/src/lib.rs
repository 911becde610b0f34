//! Configuration and wiring for the `streamdex` binary.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use streamdex_dispatch::{Dispatcher, TableDescription, generate_mapping};
use streamdex_sink::{BackendConfig, BackendKind, IndexSettings, MemoryBackend, SearchBackend, connect};
use streamdex_types::{DEFAULT_MAPPING_PATH, SchemaMapping, StreamBatch};
use tracing::{info, warn};

/// Environment variable holding a single Elasticsearch endpoint, used when
/// the config file names no backend.
pub const ENDPOINT_ENV: &str = "ES_ENDPOINT";

/// Top-level configuration file.
///
/// ```toml
/// mapping_path = "lib/table_mapping.json"
///
/// [[backends]]
/// name = "primary"
/// kind = "elasticsearch"
/// endpoint = "https://search.example.com"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Schema mapping file. When unset, the conventional path is used if it exists.
    pub mapping_path: Option<PathBuf>,
    /// Backends in dispatch order.
    pub backends: Vec<BackendConfig>,
    /// Settings for indices created on demand.
    pub index_settings: IndexSettings,
}

impl AppConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).context("Failed to parse config")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml_str(&text)
    }

    /// Adds an Elasticsearch backend at `endpoint` when none is configured.
    #[must_use]
    pub fn with_endpoint_fallback(mut self, endpoint: Option<String>) -> Self {
        if self.backends.is_empty()
            && let Some(endpoint) = endpoint.filter(|e| !e.is_empty())
        {
            self.backends
                .push(BackendConfig::new(BackendKind::Elasticsearch, endpoint));
        }
        self
    }

    /// [`with_endpoint_fallback`](Self::with_endpoint_fallback) from `ES_ENDPOINT`.
    #[must_use]
    pub fn with_env_fallback(self) -> Self {
        self.with_endpoint_fallback(std::env::var(ENDPOINT_ENV).ok())
    }

    /// Loads the schema mapping.
    ///
    /// An explicitly configured file must exist. The conventional path is
    /// optional; without it identities fall back to positional keys.
    pub fn load_mapping(&self) -> Result<Option<SchemaMapping>> {
        match &self.mapping_path {
            Some(path) => SchemaMapping::load(path)
                .map(Some)
                .with_context(|| format!("Failed to load mapping {}", path.display())),
            None => SchemaMapping::load_optional(DEFAULT_MAPPING_PATH)
                .with_context(|| format!("Failed to load mapping {DEFAULT_MAPPING_PATH}")),
        }
    }
}

/// Builds a dispatcher over the configured backends.
pub fn build_dispatcher(config: &AppConfig, mapping: Option<SchemaMapping>) -> Result<Dispatcher> {
    let backends = config
        .backends
        .iter()
        .map(|backend| {
            connect(backend).with_context(|| format!("Failed to set up backend {}", backend.name))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Dispatcher::new(mapping.map(Arc::new))
        .with_backends(backends)
        .with_index_settings(config.index_settings.clone()))
}

/// Builds a dispatcher whose backends only record what they would do.
///
/// One in-memory backend stands in for each configured backend, or a single
/// one named `dry-run` when none is configured.
pub fn build_dry_run_dispatcher(
    config: &AppConfig,
    mapping: Option<SchemaMapping>,
) -> (Dispatcher, Vec<MemoryBackend>) {
    let mut stores: Vec<MemoryBackend> = config
        .backends
        .iter()
        .map(|backend| {
            let store = MemoryBackend::new(backend.name.clone());
            if backend.ensure_index {
                store
            } else {
                store.without_index_creation()
            }
        })
        .collect();
    if stores.is_empty() {
        stores.push(MemoryBackend::new("dry-run"));
    }

    let handles = stores
        .iter()
        .map(|store| Arc::new(store.clone()) as Arc<dyn SearchBackend>);
    let dispatcher = Dispatcher::new(mapping.map(Arc::new))
        .with_backends(handles)
        .with_index_settings(config.index_settings.clone());
    (dispatcher, stores)
}

/// Reads a `{"Records": [...]}` batch file.
pub fn read_batch(path: &Path) -> Result<StreamBatch> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read events file {}", path.display()))?;
    StreamBatch::from_json_str(&text)
        .with_context(|| format!("Failed to parse events file {}", path.display()))
}

/// Builds a schema mapping from `DescribeTable` output files.
pub fn mapping_from_files(describe: &[PathBuf], source_arns: &[String]) -> Result<SchemaMapping> {
    let descriptions = describe
        .iter()
        .map(|path| {
            let text = fs::read_to_string(path)
                .with_context(|| format!("Failed to read table description {}", path.display()))?;
            TableDescription::from_json_str(&text)
                .with_context(|| format!("Failed to parse table description {}", path.display()))
        })
        .collect::<Result<Vec<_>>>()?;

    let mapping = generate_mapping(&descriptions, source_arns)?;
    if mapping.is_empty() {
        warn!("Generated mapping is empty");
    }
    Ok(mapping)
}

/// Writes `mapping` to `path`, creating parent directories.
pub fn write_mapping(mapping: &SchemaMapping, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(path, mapping.to_json_pretty()?)
        .with_context(|| format!("Failed to write mapping {}", path.display()))?;
    info!("Wrote mapping for {} tables to {}", mapping.len(), path.display());
    Ok(())
}

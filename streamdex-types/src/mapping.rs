//! Schema mapping: which key attributes make up a document's identity.
//!
//! The mapping is produced offline (see `streamdex-dispatch::mapping_gen`),
//! loaded once at startup and never mutated afterwards. Its absence is a valid
//! state; identity derivation then falls back to positional keys.

use crate::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Conventional location of the mapping file, relative to the working directory.
pub const DEFAULT_MAPPING_PATH: &str = "lib/table_mapping.json";

/// Key layout of one source table.
///
/// Unknown fields in the file (such as a full table description) are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingEntry {
    /// Attribute holding the partition (hash) key.
    #[serde(rename = "PrimaryKey")]
    pub primary_key: String,
    /// Attribute holding the sort (range) key, if the table has one.
    #[serde(rename = "SortKey", default, skip_serializing_if = "Option::is_none")]
    pub sort_key: Option<String>,
}

impl MappingEntry {
    /// An entry for a table keyed only by a partition key.
    #[must_use]
    pub fn hash(primary_key: impl Into<String>) -> Self {
        Self {
            primary_key: primary_key.into(),
            sort_key: None,
        }
    }

    /// An entry for a table with a partition and a sort key.
    #[must_use]
    pub fn composite(primary_key: impl Into<String>, sort_key: impl Into<String>) -> Self {
        Self {
            primary_key: primary_key.into(),
            sort_key: Some(sort_key.into()),
        }
    }
}

/// Mapping from lower-cased source name to its key layout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SchemaMapping {
    entries: BTreeMap<String, MappingEntry>,
}

impl SchemaMapping {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an entry. The source name is lower-cased.
    pub fn insert(&mut self, source: &str, entry: MappingEntry) {
        self.entries.insert(source.to_lowercase(), entry);
    }

    /// Chainable form of [`insert`](Self::insert).
    #[must_use]
    pub fn with(mut self, source: &str, entry: MappingEntry) -> Self {
        self.insert(source, entry);
        self
    }

    /// Looks up an already normalized (lower-cased) source name.
    #[must_use]
    pub fn get(&self, source: &str) -> Option<&MappingEntry> {
        self.entries.get(source)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &MappingEntry)> {
        self.entries.iter().map(|(source, entry)| (source.as_str(), entry))
    }

    /// Parses a mapping file's contents, normalizing source names and
    /// treating an empty `SortKey` as absent.
    pub fn from_json_str(text: &str) -> Result<Self> {
        let raw: BTreeMap<String, MappingEntry> = serde_json::from_str(text)?;
        let mut mapping = Self::new();
        for (source, mut entry) in raw {
            if entry.sort_key.as_deref() == Some("") {
                entry.sort_key = None;
            }
            mapping.insert(&source, entry);
        }
        Ok(mapping)
    }

    /// Loads a mapping file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Loads a mapping file if it exists.
    pub fn load_optional(path: impl AsRef<Path>) -> Result<Option<Self>> {
        let path = path.as_ref();
        if !path.is_file() {
            return Ok(None);
        }
        Self::load(path).map(Some)
    }

    /// Pretty-printed JSON with sources in sorted order.
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

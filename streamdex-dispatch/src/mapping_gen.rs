//! Schema-mapping generation from table descriptions.
//!
//! Builds the mapping file offline from `DescribeTable` responses, so that
//! document identities follow each table's declared key schema rather than
//! the order in which key attributes happen to arrive.

use crate::error::{DispatchError, DispatchResult};
use crate::source::extract_source;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use streamdex_types::{MappingEntry, SchemaMapping};
use tracing::{debug, warn};

/// Role of an attribute in a table's primary key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum KeyType {
    Hash,
    Range,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct KeySchemaElement {
    pub attribute_name: String,
    pub key_type: KeyType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TableDetail {
    pub table_name: String,
    #[serde(default)]
    pub key_schema: Vec<KeySchemaElement>,
}

/// A `DescribeTable` response. Fields other than the key schema are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDescription {
    #[serde(rename = "Table")]
    pub table: TableDetail,
}

impl TableDescription {
    pub fn from_json_str(text: &str) -> DispatchResult<Self> {
        serde_json::from_str(text).map_err(|e| DispatchError::Mapping(e.to_string()))
    }

    /// The mapping entry for this table.
    pub fn entry(&self) -> DispatchResult<MappingEntry> {
        let find = |kind: KeyType| {
            self.table
                .key_schema
                .iter()
                .find(|element| element.key_type == kind)
                .map(|element| element.attribute_name.clone())
        };

        let primary_key = find(KeyType::Hash).ok_or_else(|| {
            DispatchError::Mapping(format!("table {} has no HASH key", self.table.table_name))
        })?;
        Ok(MappingEntry {
            primary_key,
            sort_key: find(KeyType::Range),
        })
    }
}

/// Builds a schema mapping from table descriptions.
///
/// When `source_arns` is non-empty, only tables named by one of those
/// stream locators are kept.
pub fn generate_mapping(
    descriptions: &[TableDescription],
    source_arns: &[String],
) -> DispatchResult<SchemaMapping> {
    let wanted = source_arns
        .iter()
        .map(|arn| extract_source(arn))
        .collect::<DispatchResult<BTreeSet<_>>>()?;

    let mut mapping = SchemaMapping::new();
    for description in descriptions {
        let source = description.table.table_name.to_lowercase();
        if !wanted.is_empty() && !wanted.contains(&source) {
            debug!("Skipping table {} (no event source)", description.table.table_name);
            continue;
        }
        mapping.insert(&source, description.entry()?);
    }

    for name in &wanted {
        if mapping.get(name).is_none() {
            warn!("No table description for event source {}", name);
        }
    }
    Ok(mapping)
}

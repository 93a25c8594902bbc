//! Remote planning platform collaborators.
//!
//! The transfer engine talks to the platform through two seams: a
//! [`ChunkSource`] serving an export's ordered text chunks, and a [`ListApi`]
//! offering bulk add/update/delete of list items. The HTTP implementations
//! live in [`http`]; tests use in-memory ones.

pub mod http;

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SyncError};

/// Source of an export's ordered text chunks.
#[async_trait]
pub trait ChunkSource: Send + Sync {
    /// Total number of chunks in the export.
    async fn chunk_count(&self) -> Result<usize>;

    /// Fetch one chunk's raw text by zero-based ordinal.
    async fn fetch_chunk(&self, ordinal: usize) -> Result<String>;
}

/// One list item as exchanged with the remote API.
///
/// Field names are the list's declared fields: `name`, `code`, property
/// names, and subset names.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemRecord {
    pub fields: BTreeMap<String, String>,
}

impl ItemRecord {
    pub fn new(fields: BTreeMap<String, String>) -> Self {
        Self { fields }
    }
}

/// Bulk operation to apply to a page of items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemAction {
    Add,
    Update,
    Delete,
}

impl ItemAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemAction::Add => "add",
            ItemAction::Update => "update",
            ItemAction::Delete => "delete",
        }
    }
}

/// Per-request counts and failures returned by a bulk item operation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ItemBatchResult {
    #[serde(default)]
    pub added: u64,
    #[serde(default)]
    pub updated: u64,
    #[serde(default)]
    pub deleted: u64,
    #[serde(default)]
    pub ignored: u64,
    #[serde(default)]
    pub failures: Vec<ItemFailure>,
}

/// One rejected item within a bulk request.
#[derive(Debug, Clone, Deserialize)]
pub struct ItemFailure {
    /// Index of the item within the request.
    #[serde(rename = "requestIndex")]
    pub request_index: usize,

    /// Failure classification string, e.g. "DUPLICATE".
    #[serde(rename = "failureType")]
    pub failure_type: String,
}

/// A list's declared structure, used to validate header mappings up front.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListSchema {
    #[serde(default)]
    pub properties: Vec<String>,
    #[serde(default)]
    pub subsets: Vec<String>,
}

impl ListSchema {
    /// Check that every mapped field names a real list field.
    ///
    /// `name` and `code` are built in; everything else must be a declared
    /// property or subset.
    pub fn validate_fields(&self, fields: &[String]) -> Result<()> {
        for field in fields {
            let known = field.eq_ignore_ascii_case("name")
                || field.eq_ignore_ascii_case("code")
                || self.properties.iter().any(|p| p.eq_ignore_ascii_case(field))
                || self.subsets.iter().any(|s| s.eq_ignore_ascii_case(field));
            if !known {
                return Err(SyncError::Mapping(format!(
                    "field '{}' is not declared by the list (properties: {}; subsets: {})",
                    field,
                    self.properties.join(", "),
                    self.subsets.join(", ")
                )));
            }
        }
        Ok(())
    }
}

/// Remote list-item API: schema retrieval and bulk add/update/delete.
#[async_trait]
pub trait ListApi: Send + Sync {
    /// The list's declared properties and subsets.
    async fn schema(&self) -> Result<ListSchema>;

    /// Apply one bulk operation to an ordered page of items.
    async fn apply_items(&self, action: ItemAction, items: &[ItemRecord])
        -> Result<ItemBatchResult>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_accepts_builtin_and_declared_fields() {
        let schema = ListSchema {
            properties: vec!["Color".into()],
            subsets: vec!["Active".into()],
        };
        let fields = vec![
            "name".to_string(),
            "Code".to_string(),
            "color".to_string(),
            "Active".to_string(),
        ];
        assert!(schema.validate_fields(&fields).is_ok());
    }

    #[test]
    fn test_schema_rejects_unknown_field() {
        let schema = ListSchema::default();
        let err = schema
            .validate_fields(&["Shape".to_string()])
            .unwrap_err();
        assert!(matches!(err, SyncError::Mapping(_)));
        assert!(err.to_string().contains("Shape"));
    }

    #[test]
    fn test_item_action_wire_names() {
        assert_eq!(ItemAction::Add.as_str(), "add");
        assert_eq!(ItemAction::Update.as_str(), "update");
        assert_eq!(ItemAction::Delete.as_str(), "delete");
    }
}

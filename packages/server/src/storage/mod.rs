//! Storage abstraction layer for the Redline server.
//!
//! The [`DocumentStore`] trait is a plain JSON document store addressed by
//! `(report_id, collection, doc_id)`, with whole-document inserts and
//! top-level field merges. It knows nothing about chapters; the
//! [`service`](crate::service) layer decides what goes in.
//!
//! # Implementations
//!
//! | Type | When to use |
//! |------|-------------|
//! | [`MemoryStore`] | Tests, conformance suite, ephemeral servers |
//! | [`SqliteStore`] | Production; durable single-file database |
//!
//! [`MemoryStore`]: memory::MemoryStore
//! [`SqliteStore`]: sqlite::SqliteStore

pub mod memory;
pub mod sqlite;

use async_trait::async_trait;
use serde_json::{Map, Value};

/// Collection holding chapter records.
pub const CHAPTERS: &str = "chapters";

// ---------------------------------------------------------------------------
// StorageError
// ---------------------------------------------------------------------------

/// Errors that storage operations can return.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The requested document does not exist.
    #[error("not found")]
    NotFound,

    /// A document with the same key already exists.
    #[error("conflict: {0}")]
    Conflict(String),

    /// An unexpected error in the underlying storage backend.
    #[error("internal storage error: {0}")]
    Internal(String),
}

// ---------------------------------------------------------------------------
// Keys
// ---------------------------------------------------------------------------

/// Address of one document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DocKey<'a> {
    pub report_id: &'a str,
    pub collection: &'a str,
    pub doc_id: &'a str,
}

impl<'a> DocKey<'a> {
    pub fn chapter(report_id: &'a str, chapter_id: &'a str) -> Self {
        Self {
            report_id,
            collection: CHAPTERS,
            doc_id: chapter_id,
        }
    }
}

/// Apply a top-level merge: every key in `fields` replaces the same key in
/// `doc`. Keys absent from `fields` are left alone.
pub fn merge_top_level(doc: &mut Value, fields: &Map<String, Value>) {
    if !doc.is_object() {
        *doc = Value::Object(Map::new());
    }
    if let Value::Object(obj) = doc {
        for (k, v) in fields {
            obj.insert(k.clone(), v.clone());
        }
    }
}

// ---------------------------------------------------------------------------
// DocumentStore trait
// ---------------------------------------------------------------------------

/// The persistence contract for a Redline server.
///
/// Implementations must be `Send + Sync + 'static` so they can be held in an
/// `Arc<dyn DocumentStore>`. Failed writes are reported, never retried here.
#[async_trait]
pub trait DocumentStore: Send + Sync + 'static {
    /// Fetch a document. `None` if absent.
    async fn get(&self, key: DocKey<'_>) -> Result<Option<Value>, StorageError>;

    /// Insert a new document. [`StorageError::Conflict`] if the key is taken.
    async fn create(&self, key: DocKey<'_>, doc: &Value) -> Result<(), StorageError>;

    /// Merge `fields` into an existing document and return the result.
    /// [`StorageError::NotFound`] if the document does not exist.
    async fn merge(
        &self,
        key: DocKey<'_>,
        fields: &Map<String, Value>,
    ) -> Result<Value, StorageError>;

    /// All documents of a collection, ordered by `doc_id`.
    async fn list(&self, report_id: &str, collection: &str) -> Result<Vec<Value>, StorageError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn merge_replaces_only_named_keys() {
        let mut doc = json!({ "a": 1, "b": { "x": 1 } });
        let fields = json!({ "b": { "y": 2 }, "c": 3 });
        merge_top_level(&mut doc, fields.as_object().unwrap());
        assert_eq!(doc, json!({ "a": 1, "b": { "y": 2 }, "c": 3 }));
    }

    #[test]
    fn merge_into_non_object_starts_fresh() {
        let mut doc = json!("corrupt");
        merge_top_level(&mut doc, json!({ "a": 1 }).as_object().unwrap());
        assert_eq!(doc, json!({ "a": 1 }));
    }
}

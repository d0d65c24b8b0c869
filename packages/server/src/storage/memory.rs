//! In-memory storage implementation.
//!
//! All data is held in RAM behind a [`RwLock`] and is lost when the process
//! exits. Use this for tests, the conformance suite, and ephemeral servers.
//!
//! Documents live in a [`BTreeMap`] keyed by `(report_id, collection,
//! doc_id)`, so listing a collection is a range scan in `doc_id` order.

use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use serde_json::{Map, Value};

use super::{merge_top_level, DocKey, DocumentStore, StorageError};

type Key = (String, String, String);

fn owned(key: DocKey<'_>) -> Key {
    (
        key.report_id.to_string(),
        key.collection.to_string(),
        key.doc_id.to_string(),
    )
}

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

/// Thread-safe, in-memory implementation of [`DocumentStore`].
pub struct MemoryStore {
    docs: RwLock<BTreeMap<Key, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            docs: RwLock::new(BTreeMap::new()),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, BTreeMap<Key, Value>>, StorageError> {
        self.docs
            .read()
            .map_err(|_| StorageError::Internal("memory store lock poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, BTreeMap<Key, Value>>, StorageError> {
        self.docs
            .write()
            .map_err(|_| StorageError::Internal("memory store lock poisoned".into()))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// DocumentStore impl
// ---------------------------------------------------------------------------

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, key: DocKey<'_>) -> Result<Option<Value>, StorageError> {
        Ok(self.read()?.get(&owned(key)).cloned())
    }

    async fn create(&self, key: DocKey<'_>, doc: &Value) -> Result<(), StorageError> {
        let mut docs = self.write()?;
        let k = owned(key);
        if docs.contains_key(&k) {
            return Err(StorageError::Conflict(format!(
                "{}/{} already exists",
                key.collection, key.doc_id
            )));
        }
        docs.insert(k, doc.clone());
        Ok(())
    }

    async fn merge(
        &self,
        key: DocKey<'_>,
        fields: &Map<String, Value>,
    ) -> Result<Value, StorageError> {
        let mut docs = self.write()?;
        let doc = docs.get_mut(&owned(key)).ok_or(StorageError::NotFound)?;
        merge_top_level(doc, fields);
        Ok(doc.clone())
    }

    async fn list(&self, report_id: &str, collection: &str) -> Result<Vec<Value>, StorageError> {
        let docs = self.read()?;
        let start = (report_id.to_string(), collection.to_string(), String::new());
        Ok(docs
            .range((Bound::Included(start), Bound::Unbounded))
            .take_while(|((r, c, _), _)| r == report_id && c == collection)
            .map(|(_, v)| v.clone())
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

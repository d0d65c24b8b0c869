//! SQLite-backed storage implementation.
//!
//! Uses `rusqlite` (with bundled SQLite) wrapped in an `Arc<Mutex<Connection>>`
//! to satisfy the `Send + Sync` requirements. All blocking calls are offloaded
//! to a thread-pool via `tokio::task::spawn_blocking`.
//!
//! # Schema
//!
//! - `documents`: one JSON blob per `(report_id, collection, doc_id)`, plus
//!   the time of the last write.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::{Map, Value};

use super::{merge_top_level, DocKey, DocumentStore, StorageError};

// ---------------------------------------------------------------------------
// Schema
// ---------------------------------------------------------------------------

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS documents (
    report_id   TEXT NOT NULL,
    collection  TEXT NOT NULL,
    doc_id      TEXT NOT NULL,
    data        TEXT NOT NULL,
    updated_at  TEXT NOT NULL,
    PRIMARY KEY (report_id, collection, doc_id)
);
";

// ---------------------------------------------------------------------------
// SqliteStore
// ---------------------------------------------------------------------------

/// SQLite-backed implementation of [`DocumentStore`].
///
/// Holds a single database connection protected by a `Mutex`. All operations
/// run inside `spawn_blocking` to avoid blocking the async runtime.
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open (or create) the SQLite database at `path` and apply the schema.
    pub fn open(path: &str) -> Result<Self, rusqlite::Error> {
        let conn = Connection::open(path)?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory SQLite database (data is lost when dropped).
    pub fn open_in_memory() -> Result<Self, rusqlite::Error> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run `f` against the connection on the blocking pool.
    async fn run<T, F>(&self, f: F) -> Result<T, StorageError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T, StorageError> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut conn = conn
                .lock()
                .map_err(|_| StorageError::Internal("sqlite connection lock poisoned".into()))?;
            f(&mut conn)
        })
        .await
        .map_err(|e| StorageError::Internal(format!("task join error: {e}")))?
    }
}

// ---------------------------------------------------------------------------
// Error conversions
// ---------------------------------------------------------------------------

fn map_err(e: rusqlite::Error) -> StorageError {
    StorageError::Internal(e.to_string())
}

fn map_json_err(e: serde_json::Error) -> StorageError {
    StorageError::Internal(format!("JSON error: {e}"))
}

fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Owned copy of a [`DocKey`] that can cross into `spawn_blocking`.
struct OwnedKey {
    report_id: String,
    collection: String,
    doc_id: String,
}

impl From<DocKey<'_>> for OwnedKey {
    fn from(k: DocKey<'_>) -> Self {
        Self {
            report_id: k.report_id.to_string(),
            collection: k.collection.to_string(),
            doc_id: k.doc_id.to_string(),
        }
    }
}

fn select_data(conn: &Connection, key: &OwnedKey) -> Result<Option<String>, StorageError> {
    conn.query_row(
        "SELECT data FROM documents
         WHERE report_id = ?1 AND collection = ?2 AND doc_id = ?3",
        params![key.report_id, key.collection, key.doc_id],
        |row| row.get::<_, String>(0),
    )
    .optional()
    .map_err(map_err)
}

// ---------------------------------------------------------------------------
// DocumentStore impl
// ---------------------------------------------------------------------------

#[async_trait]
impl DocumentStore for SqliteStore {
    async fn get(&self, key: DocKey<'_>) -> Result<Option<Value>, StorageError> {
        let key = OwnedKey::from(key);
        self.run(move |conn| match select_data(conn, &key)? {
            Some(data) => Ok(Some(serde_json::from_str(&data).map_err(map_json_err)?)),
            None => Ok(None),
        })
        .await
    }

    async fn create(&self, key: DocKey<'_>, doc: &Value) -> Result<(), StorageError> {
        let key = OwnedKey::from(key);
        let data = serde_json::to_string(doc).map_err(map_json_err)?;
        self.run(move |conn| {
            let inserted = conn
                .execute(
                    "INSERT OR IGNORE INTO documents
                         (report_id, collection, doc_id, data, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![key.report_id, key.collection, key.doc_id, data, now()],
                )
                .map_err(map_err)?;
            if inserted == 0 {
                return Err(StorageError::Conflict(format!(
                    "{}/{} already exists",
                    key.collection, key.doc_id
                )));
            }
            Ok(())
        })
        .await
    }

    async fn merge(
        &self,
        key: DocKey<'_>,
        fields: &Map<String, Value>,
    ) -> Result<Value, StorageError> {
        let key = OwnedKey::from(key);
        let fields = fields.clone();
        self.run(move |conn| {
            let tx = conn.transaction().map_err(map_err)?;
            let data = select_data(&tx, &key)?.ok_or(StorageError::NotFound)?;
            let mut doc: Value = serde_json::from_str(&data).map_err(map_json_err)?;
            merge_top_level(&mut doc, &fields);
            let data = serde_json::to_string(&doc).map_err(map_json_err)?;
            tx.execute(
                "UPDATE documents SET data = ?4, updated_at = ?5
                 WHERE report_id = ?1 AND collection = ?2 AND doc_id = ?3",
                params![key.report_id, key.collection, key.doc_id, data, now()],
            )
            .map_err(map_err)?;
            tx.commit().map_err(map_err)?;
            Ok(doc)
        })
        .await
    }

    async fn list(&self, report_id: &str, collection: &str) -> Result<Vec<Value>, StorageError> {
        let report_id = report_id.to_string();
        let collection = collection.to_string();
        self.run(move |conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT data FROM documents
                     WHERE report_id = ?1 AND collection = ?2
                     ORDER BY doc_id",
                )
                .map_err(map_err)?;
            let rows = stmt
                .query_map(params![report_id, collection], |row| row.get::<_, String>(0))
                .map_err(map_err)?;
            let mut docs = Vec::new();
            for row in rows {
                let data = row.map_err(map_err)?;
                docs.push(serde_json::from_str(&data).map_err(map_json_err)?);
            }
            Ok(docs)
        })
        .await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn create_and_get() {
        let s = SqliteStore::open_in_memory().unwrap();
        let key = DocKey::chapter("r1", "c1");
        s.create(key, &json!({ "id": "c1", "title": "Intro" })).await.unwrap();
        let got = s.get(key).await.unwrap().unwrap();
        assert_eq!(got["title"], "Intro");
        assert!(s.get(DocKey::chapter("r1", "c2")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn create_conflict() {
        let s = SqliteStore::open_in_memory().unwrap();
        let key = DocKey::chapter("r1", "c1");
        s.create(key, &json!({})).await.unwrap();
        let err = s.create(key, &json!({})).await.unwrap_err();
        assert!(matches!(err, StorageError::Conflict(_)));
    }

    #[tokio::test]
    async fn merge_is_top_level() {
        let s = SqliteStore::open_in_memory().unwrap();
        let key = DocKey::chapter("r1", "c1");
        s.create(key, &json!({ "title": "Intro", "chapter_versions": [1] }))
            .await
            .unwrap();
        let fields = json!({ "chapter_versions": [1, 2] });
        let merged = s.merge(key, fields.as_object().unwrap()).await.unwrap();
        assert_eq!(merged, json!({ "title": "Intro", "chapter_versions": [1, 2] }));
        assert_eq!(s.get(key).await.unwrap().unwrap(), merged);
    }

    #[tokio::test]
    async fn merge_missing_is_not_found() {
        let s = SqliteStore::open_in_memory().unwrap();
        let err = s
            .merge(DocKey::chapter("r1", "missing"), &Map::new())
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::NotFound));
    }

    #[tokio::test]
    async fn list_is_scoped_and_ordered() {
        let s = SqliteStore::open_in_memory().unwrap();
        for (r, id) in [("r1", "b"), ("r1", "a"), ("r2", "c")] {
            s.create(DocKey::chapter(r, id), &json!({ "id": id }))
                .await
                .unwrap();
        }
        let docs = s.list("r1", "chapters").await.unwrap();
        let ids: Vec<_> = docs.iter().map(|d| d["id"].as_str().unwrap()).collect();
        assert_eq!(ids, ["a", "b"]);
    }
}

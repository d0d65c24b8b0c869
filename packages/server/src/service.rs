//! Chapter persistence on top of a [`DocumentStore`].
//!
//! [`Chapters`] is the only place that reads and writes chapter records. A
//! mutation loads the record, runs an engine transition on the decoded
//! [`Chapter`], merges `current_version` and `chapter_versions` back into
//! the stored document and broadcasts the refresh the change calls for.
//! Metadata fields are written only by [`Chapters::patch`].
//!
//! Mutations of one chapter are serialised by a per-chapter async lock, so
//! the load-modify-merge cycle never interleaves with another writer on this
//! server.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use redline::{project, Chapter, EngineError, RefreshKind, SyncCause};
use redline_api::{ChapterPatch, ChapterRecord, CreateChapterRequest, OutboundEvent};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::AppError;
use crate::hub::EventHub;
use crate::storage::{DocKey, DocumentStore, StorageError, CHAPTERS};

type ChapterKey = (String, String);
type LockMap = HashMap<ChapterKey, Arc<tokio::sync::Mutex<()>>>;

fn lock_map(locks: &Mutex<LockMap>) -> MutexGuard<'_, LockMap> {
    locks.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Held for the duration of one chapter write.
struct ChapterGuard<'a> {
    locks: &'a Mutex<LockMap>,
    key: ChapterKey,
    guard: Option<tokio::sync::OwnedMutexGuard<()>>,
}

impl Drop for ChapterGuard<'_> {
    fn drop(&mut self) {
        self.guard.take();
        let mut locks = lock_map(self.locks);
        // Clones are only taken under the map lock, so a count of one means
        // nobody else holds or waits for this chapter.
        if locks.get(&self.key).is_some_and(|l| Arc::strong_count(l) == 1) {
            locks.remove(&self.key);
        }
    }
}

/// What a transition did to the chapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    /// Nothing changed; nothing is written.
    Skip,
    /// Written, but subscribers need not hear about it.
    Silent,
    /// Written and broadcast according to the cause's refresh kind.
    Broadcast(SyncCause),
}

impl From<SyncCause> for Change {
    fn from(cause: SyncCause) -> Self {
        Change::Broadcast(cause)
    }
}

/// Result of [`Chapters::mutate`].
#[derive(Debug, Clone)]
pub struct Mutation {
    pub record: ChapterRecord,
    pub change: Change,
    /// The event sent to subscribers, if any.
    pub outbound: Option<OutboundEvent>,
}

pub struct Chapters {
    store: Arc<dyn DocumentStore>,
    hub: Arc<EventHub>,
    locks: Mutex<LockMap>,
}

impl Chapters {
    pub fn new(store: Arc<dyn DocumentStore>, hub: Arc<EventHub>) -> Self {
        Self {
            store,
            hub,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Take the chapter's write lock. The map entry lives only as long as
    /// someone holds or waits for it.
    async fn lock_chapter(&self, report_id: &str, chapter_id: &str) -> ChapterGuard<'_> {
        let key = (report_id.to_string(), chapter_id.to_string());
        let lock = Arc::clone(self.lock_map().entry(key.clone()).or_default());
        ChapterGuard {
            locks: &self.locks,
            key,
            guard: Some(lock.lock_owned().await),
        }
    }

    fn lock_map(&self) -> MutexGuard<'_, LockMap> {
        lock_map(&self.locks)
    }

    #[cfg(test)]
    fn lock_count(&self) -> usize {
        self.lock_map().len()
    }

    // --- reads ---------------------------------------------------------------

    /// All chapters of a report, ordered by `position`, then `id`.
    ///
    /// Records that cannot be decoded at all are logged and left out.
    pub async fn list(&self, report_id: &str) -> Result<Vec<ChapterRecord>, AppError> {
        let docs = self.store.list(report_id, CHAPTERS).await?;
        let mut records: Vec<ChapterRecord> = docs
            .into_iter()
            .filter_map(|doc| match serde_json::from_value::<ChapterRecord>(doc) {
                Ok(r) => Some(r),
                Err(e) => {
                    warn!(report_id, "skipping undecodable chapter record: {e}");
                    None
                }
            })
            .collect();
        records.sort_by(|a, b| a.position.cmp(&b.position).then_with(|| a.id.cmp(&b.id)));
        Ok(records)
    }

    pub async fn get(&self, report_id: &str, chapter_id: &str) -> Result<ChapterRecord, AppError> {
        let doc = self
            .store
            .get(DocKey::chapter(report_id, chapter_id))
            .await?
            .ok_or_else(|| AppError::NotFound(format!("chapter {chapter_id} not found")))?;
        decode(chapter_id, doc)
    }

    // --- writes --------------------------------------------------------------

    /// Create a chapter holding one empty version.
    pub async fn create(
        &self,
        report_id: &str,
        req: CreateChapterRequest,
    ) -> Result<ChapterRecord, AppError> {
        let id = match req.id {
            Some(id) if id.trim().is_empty() => {
                return Err(AppError::BadRequest("chapter id must not be empty".into()))
            }
            Some(id) => id,
            None => uuid::Uuid::now_v7().to_string(),
        };

        let mut record = ChapterRecord::new(id, req.title);
        record.chapter_number = req.chapter_number;
        record.chapter_info = req.chapter_info;
        record.position = req.position;
        record.active_meta_info = req.active_meta_info;

        let doc = encode(&record)?;
        match self
            .store
            .create(DocKey::chapter(report_id, &record.id), &doc)
            .await
        {
            Ok(()) => Ok(record),
            Err(StorageError::Conflict(_)) => Err(AppError::Conflict(format!(
                "chapter {} already exists",
                record.id
            ))),
            Err(e) => Err(e.into()),
        }
    }

    /// Merge a metadata patch. Version fields are never touched.
    pub async fn patch(
        &self,
        report_id: &str,
        chapter_id: &str,
        patch: ChapterPatch,
    ) -> Result<ChapterRecord, AppError> {
        let _guard = self.lock_chapter(report_id, chapter_id).await;

        let mut record = self.get(report_id, chapter_id).await?;
        record.merge(patch);

        let doc = encode(&record)?;
        let fields = pick(
            &doc,
            &[
                "title",
                "chapter_number",
                "chapter_info",
                "position",
                "active_meta_info",
            ],
        );
        self.store
            .merge(DocKey::chapter(report_id, chapter_id), &fields)
            .await?;
        Ok(record)
    }

    /// Run `transition` against the chapter and persist the result.
    ///
    /// An error from `transition` aborts before anything is written. A
    /// [`Change::Skip`] also writes nothing.
    pub async fn mutate<F>(
        &self,
        report_id: &str,
        chapter_id: &str,
        transition: F,
    ) -> Result<Mutation, AppError>
    where
        F: FnOnce(&mut Chapter) -> Result<Change, EngineError>,
    {
        let _guard = self.lock_chapter(report_id, chapter_id).await;

        let mut record = self.get(report_id, chapter_id).await?;
        let mut chapter = record.to_chapter();
        let change = transition(&mut chapter)?;
        if change == Change::Skip {
            return Ok(Mutation {
                record,
                change,
                outbound: None,
            });
        }

        record.apply_chapter(&chapter);
        let doc = encode(&record)?;
        let fields = pick(&doc, &["current_version", "chapter_versions"]);
        self.store
            .merge(DocKey::chapter(report_id, chapter_id), &fields)
            .await?;

        let outbound = match change {
            Change::Broadcast(cause) => outbound_for(&chapter, cause.refresh()),
            _ => None,
        };
        if let Some(event) = &outbound {
            let delivered = self.hub.publish(report_id, chapter_id, event.clone());
            debug!(
                report_id,
                chapter_id,
                event = event.name(),
                delivered,
                "broadcast outbound event"
            );
        }

        Ok(Mutation {
            record,
            change,
            outbound,
        })
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn decode(chapter_id: &str, mut doc: Value) -> Result<ChapterRecord, AppError> {
    if let Value::Object(obj) = &mut doc {
        obj.entry("id")
            .or_insert_with(|| Value::String(chapter_id.to_string()));
    }
    serde_json::from_value(doc)
        .map_err(|e| AppError::Internal(format!("chapter {chapter_id} is not decodable: {e}")))
}

fn encode(record: &ChapterRecord) -> Result<Value, AppError> {
    serde_json::to_value(record).map_err(|e| AppError::Internal(format!("JSON error: {e}")))
}

fn pick(doc: &Value, keys: &[&str]) -> Map<String, Value> {
    keys.iter()
        .filter_map(|k| doc.get(*k).map(|v| (k.to_string(), v.clone())))
        .collect()
}

/// The event that brings a subscriber up to date with `chapter`.
pub fn outbound_for(chapter: &Chapter, refresh: RefreshKind) -> Option<OutboundEvent> {
    let current = chapter.current();
    let version = current.version;
    let content = project(&current.document);
    let formatted_content = current.document.clone();
    match refresh {
        RefreshKind::Full => Some(OutboundEvent::ForceRefresh {
            version,
            content,
            formatted_content,
        }),
        RefreshKind::Incremental => Some(OutboundEvent::EditorContentUpdate {
            version,
            content,
            formatted_content,
        }),
        RefreshKind::None => None,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

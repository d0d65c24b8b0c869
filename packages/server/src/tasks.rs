//! Bookkeeping for background chapter rewrites.
//!
//! At most one rewrite runs per chapter. While it is pending the chapter is
//! read-only for every other mutating route. The tracker holds the last
//! status per chapter and the [`AbortHandle`] of the running task, so a
//! `DELETE …/revise` can cancel it. A settled status is kept for
//! [`SETTLED_RETENTION`], after which the chapter reads as idle again.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use chrono::{SecondsFormat, Utc};
use redline_api::{ReviseState, ReviseStatus};
use tokio::task::AbortHandle;

use crate::error::AppError;

type ChapterKey = (String, String);

fn key(report_id: &str, chapter_id: &str) -> ChapterKey {
    (report_id.to_string(), chapter_id.to_string())
}

/// How long a done, failed or cancelled status stays readable.
pub const SETTLED_RETENTION: Duration = Duration::from_secs(15 * 60);

struct Entry {
    status: ReviseStatus,
    abort: Option<AbortHandle>,
    settled_at: Option<Instant>,
}

impl Entry {
    fn settle(&mut self, state: ReviseState) {
        self.status.state = state;
        self.abort = None;
        self.settled_at = Some(Instant::now());
    }
}

pub struct RevisionTracker {
    entries: Mutex<HashMap<ChapterKey, Entry>>,
    retention: Duration,
}

impl Default for RevisionTracker {
    fn default() -> Self {
        Self::with_retention(SETTLED_RETENTION)
    }
}

impl RevisionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_retention(retention: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            retention,
        }
    }

    /// The entry map with expired settled statuses removed.
    fn entries(&self) -> MutexGuard<'_, HashMap<ChapterKey, Entry>> {
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let retention = self.retention;
        entries.retain(|_, e| e.settled_at.map_or(true, |at| at.elapsed() < retention));
        entries
    }

    /// Reserve the chapter for a new rewrite and mint its task id.
    ///
    /// Fails with [`AppError::RevisionPending`] if one is already running.
    pub fn try_start(&self, report_id: &str, chapter_id: &str) -> Result<ReviseStatus, AppError> {
        let mut entries = self.entries();
        let k = key(report_id, chapter_id);
        if entries.get(&k).is_some_and(|e| e.status.is_pending()) {
            return Err(AppError::RevisionPending);
        }
        let status = ReviseStatus {
            state: ReviseState::Pending,
            task_id: Some(uuid::Uuid::now_v7().to_string()),
            started_at: Some(Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)),
            version: None,
            error: None,
        };
        entries.insert(
            k,
            Entry {
                status: status.clone(),
                abort: None,
                settled_at: None,
            },
        );
        Ok(status)
    }

    /// Remember how to abort task `task_id`.
    pub fn attach(&self, report_id: &str, chapter_id: &str, task_id: &str, abort: AbortHandle) {
        let mut entries = self.entries();
        match entries.get_mut(&key(report_id, chapter_id)) {
            Some(e) if e.status.is_pending() && e.status.task_id.as_deref() == Some(task_id) => {
                e.abort = Some(abort);
            }
            // cancelled or superseded before the spawn returned
            _ => abort.abort(),
        }
    }

    /// `true` while `task_id` is the chapter's pending rewrite.
    pub fn is_running(&self, report_id: &str, chapter_id: &str, task_id: &str) -> bool {
        self.entries()
            .get(&key(report_id, chapter_id))
            .is_some_and(|e| e.status.is_pending() && e.status.task_id.as_deref() == Some(task_id))
    }

    /// `true` while any rewrite is pending for the chapter.
    pub fn is_pending(&self, report_id: &str, chapter_id: &str) -> bool {
        self.entries()
            .get(&key(report_id, chapter_id))
            .is_some_and(|e| e.status.is_pending())
    }

    /// Record the outcome of task `task_id`. Ignored if the task is no
    /// longer the chapter's pending rewrite.
    pub fn finish(
        &self,
        report_id: &str,
        chapter_id: &str,
        task_id: &str,
        outcome: Result<u32, String>,
    ) {
        let mut entries = self.entries();
        let Some(e) = entries.get_mut(&key(report_id, chapter_id)) else {
            return;
        };
        if !e.status.is_pending() || e.status.task_id.as_deref() != Some(task_id) {
            return;
        }
        match outcome {
            Ok(version) => {
                e.status.version = Some(version);
                e.settle(ReviseState::Done);
            }
            Err(msg) => {
                e.status.error = Some(msg);
                e.settle(ReviseState::Failed);
            }
        }
    }

    /// Abort the pending rewrite, if any, and return the resulting status.
    pub fn cancel(&self, report_id: &str, chapter_id: &str) -> ReviseStatus {
        let mut entries = self.entries();
        let Some(e) = entries.get_mut(&key(report_id, chapter_id)) else {
            return ReviseStatus::idle();
        };
        if e.status.is_pending() {
            if let Some(abort) = e.abort.take() {
                abort.abort();
            }
            e.settle(ReviseState::Cancelled);
        }
        e.status.clone()
    }

    pub fn status(&self, report_id: &str, chapter_id: &str) -> ReviseStatus {
        self.entries()
            .get(&key(report_id, chapter_id))
            .map(|e| e.status.clone())
            .unwrap_or_else(ReviseStatus::idle)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! Chapter and version request/response bodies.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use redline::Affordances;

use crate::record::ChapterRecord;

// ---------------------------------------------------------------------------
// Chapters
// ---------------------------------------------------------------------------

/// Body of `POST /v1/reports/{report}/chapters`.
///
/// The chapter starts with one empty version. `id` is minted by the server
/// when absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CreateChapterRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    pub title: String,

    #[serde(default)]
    pub chapter_number: String,

    #[serde(default)]
    pub chapter_info: String,

    #[serde(default)]
    pub position: i64,

    #[serde(default)]
    pub active_meta_info: Map<String, Value>,
}

/// A chapter record together with its derived correction state.
///
/// Returned by every chapter and version route.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChapterView {
    #[serde(flatten)]
    pub record: ChapterRecord,

    pub correction_mode: bool,

    pub affordances: Affordances,
}

impl ChapterView {
    pub fn new(record: ChapterRecord) -> Self {
        let chapter = record.to_chapter();
        Self {
            correction_mode: chapter.correction_mode(),
            affordances: chapter.affordances(),
            record,
        }
    }
}

/// Response body for `GET /v1/reports/{report}/chapters`, ordered by
/// `position`, then `id`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChapterListResponse {
    pub items: Vec<ChapterRecord>,
}

// ---------------------------------------------------------------------------
// Versions
// ---------------------------------------------------------------------------

/// Body of `PUT …/versions/{n}`: replace a version's content.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SaveVersionRequest {
    /// Plain text to store. Projected from `formatted_content` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    /// The tree. Sanitized before storing.
    pub formatted_content: Value,
}

/// Body of `PUT …/current`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SetCurrentRequest {
    pub version: u32,
}

/// Body of `PUT …/versions/{n}/summary`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SummaryRequest {
    pub summary: String,
}

// ---------------------------------------------------------------------------
// Revision
// ---------------------------------------------------------------------------

/// Body of `POST …/revise`. Every field is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReviseRequest {
    /// Extra instructions appended to the assembled context.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,

    /// Write the result into a new version instead of the current one.
    #[serde(default)]
    pub into_new_version: bool,
}

/// Lifecycle of a chapter's background rewrite.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReviseState {
    Idle,
    Pending,
    Done,
    Failed,
    Cancelled,
}

/// Response of the `…/revise` routes.
///
/// ```json
/// { "task_id": "0195…", "state": "pending", "started_at": "2026-10-19T08:00:00Z" }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReviseStatus {
    pub state: ReviseState,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<String>,

    /// Version the result was written to, once done.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ReviseStatus {
    pub fn idle() -> Self {
        Self {
            state: ReviseState::Idle,
            task_id: None,
            started_at: None,
            version: None,
            error: None,
        }
    }

    /// `true` while the editing surface must stay read-only.
    pub fn is_pending(&self) -> bool {
        self.state == ReviseState::Pending
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn view_flattens_record() {
        let view = ChapterView::new(ChapterRecord::new("c1", "Intro"));
        let v = serde_json::to_value(&view).unwrap();
        assert_eq!(v["id"], "c1");
        assert_eq!(v["correction_mode"], false);
        assert_eq!(v["affordances"]["start_auto_creation"], true);
        let back: ChapterView = serde_json::from_value(v).unwrap();
        assert_eq!(back, view);
    }

    #[test]
    fn create_request_minimal() {
        let req: CreateChapterRequest = serde_json::from_value(json!({ "title": "Intro" })).unwrap();
        assert!(req.id.is_none());
        assert_eq!(req.position, 0);
    }

    #[test]
    fn revise_request_defaults() {
        let req: ReviseRequest = serde_json::from_value(json!({})).unwrap();
        assert_eq!(req, ReviseRequest::default());
    }

    #[test]
    fn idle_status_is_compact() {
        let v = serde_json::to_value(ReviseStatus::idle()).unwrap();
        assert_eq!(v, json!({ "state": "idle" }));
    }
}

//! Rewrite handlers: start, cancel and poll a background rewrite.
//!
//! `POST …/revise` snapshots the current version, assembles the rewrite
//! input (plain-text projection plus the title and accepted candidates as
//! context) and hands it to the configured [`Reviser`] in a detached task.
//! The route answers `202 Accepted` at once. While the task runs, every
//! other mutating route on the chapter answers `409 revision_pending`.
//!
//! On success the rewritten text is lifted into a tree and saved into the
//! version that is current at completion (or a new version, if asked), and
//! subscribers receive a `force-refresh`.
//!
//! [`Reviser`]: crate::reviser::Reviser

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use redline::{lift, project, revision_context, SyncCause};
use redline_api::{ReviseRequest, ReviseStatus};

use crate::error::AppError;

use super::AppState;

/// `POST /v1/reports/{report}/chapters/{chapter}/revise`
///
/// The body is optional; an empty body means default options.
pub async fn start(
    State(state): State<AppState>,
    Path((report_id, chapter_id)): Path<(String, String)>,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let req: ReviseRequest = if body.is_empty() {
        ReviseRequest::default()
    } else {
        serde_json::from_slice(&body).map_err(|e| AppError::InvalidJson(e.to_string()))?
    };

    let record = state.chapters.get(&report_id, &chapter_id).await?;
    let status = state.revisions.try_start(&report_id, &chapter_id)?;
    let task_id = status.task_id.clone().unwrap_or_default();

    let chapter = record.to_chapter();
    let current = chapter.current();
    let plain_text = project(&current.document);
    let mut context = revision_context(&current.document, chapter.title());
    if let Some(extra) = req.instructions.as_deref().filter(|s| !s.trim().is_empty()) {
        context.push_str("\n\n");
        context.push_str(extra);
    }

    tracing::info!(report_id, chapter_id, task_id, "rewrite started");
    let job = RevisionJob {
        state: state.clone(),
        report_id: report_id.clone(),
        chapter_id: chapter_id.clone(),
        task_id: task_id.clone(),
        into_new_version: req.into_new_version,
    };
    let handle = tokio::spawn(job.run(plain_text, context));
    state
        .revisions
        .attach(&report_id, &chapter_id, &task_id, handle.abort_handle());

    Ok((StatusCode::ACCEPTED, Json(status)))
}

/// `DELETE /v1/reports/{report}/chapters/{chapter}/revise`
///
/// Cancels the pending rewrite, if any. The chapter becomes editable again
/// and keeps its pre-rewrite content.
pub async fn cancel(
    State(state): State<AppState>,
    Path((report_id, chapter_id)): Path<(String, String)>,
) -> Result<Json<ReviseStatus>, AppError> {
    state.chapters.get(&report_id, &chapter_id).await?;
    let status = state.revisions.cancel(&report_id, &chapter_id);
    tracing::info!(report_id, chapter_id, state = ?status.state, "rewrite cancel requested");
    Ok(Json(status))
}

/// `GET /v1/reports/{report}/chapters/{chapter}/revise`
pub async fn status(
    State(state): State<AppState>,
    Path((report_id, chapter_id)): Path<(String, String)>,
) -> Result<Json<ReviseStatus>, AppError> {
    state.chapters.get(&report_id, &chapter_id).await?;
    Ok(Json(state.revisions.status(&report_id, &chapter_id)))
}

// ---------------------------------------------------------------------------
// Background task
// ---------------------------------------------------------------------------

struct RevisionJob {
    state: AppState,
    report_id: String,
    chapter_id: String,
    task_id: String,
    into_new_version: bool,
}

impl RevisionJob {
    async fn run(self, plain_text: String, context: String) {
        let outcome = self.revise_and_store(&plain_text, &context).await;
        match &outcome {
            Ok(version) => tracing::info!(
                report_id = %self.report_id,
                chapter_id = %self.chapter_id,
                task_id = %self.task_id,
                version,
                "rewrite stored"
            ),
            Err(e) => tracing::warn!(
                report_id = %self.report_id,
                chapter_id = %self.chapter_id,
                task_id = %self.task_id,
                "rewrite failed: {e}"
            ),
        }
        self.state
            .revisions
            .finish(&self.report_id, &self.chapter_id, &self.task_id, outcome);
    }

    async fn revise_and_store(&self, plain_text: &str, context: &str) -> Result<u32, String> {
        let revised = self
            .state
            .reviser
            .revise(plain_text, context)
            .await
            .map_err(|e| e.to_string())?;

        if !self
            .state
            .revisions
            .is_running(&self.report_id, &self.chapter_id, &self.task_id)
        {
            return Err("rewrite was cancelled".into());
        }

        let doc = lift(&revised);
        let into_new_version = self.into_new_version;
        let m = self
            .state
            .chapters
            .mutate(&self.report_id, &self.chapter_id, |ch| {
                let n = if into_new_version {
                    ch.create_version()
                } else {
                    ch.current_version()
                };
                ch.save_document(n, doc)?;
                Ok(SyncCause::Revision.into())
            })
            .await
            .map_err(|e| e.to_string())?;
        Ok(m.record.current_version)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use axum::http::StatusCode;
    use axum::Router;
    use serde_json::{json, Value};
    use tokio::sync::Notify;

    use crate::handlers::test_util::{build_app_with, seed_chapter, send};
    use crate::reviser::{ReviseError, Reviser};

    const BASE: &str = "/v1/reports/r1/chapters/c1";

    /// Uppercases the text once released.
    struct GatedReviser {
        gate: Arc<Notify>,
    }

    #[async_trait]
    impl Reviser for GatedReviser {
        async fn revise(&self, plain_text: &str, _context: &str) -> Result<String, ReviseError> {
            self.gate.notified().await;
            Ok(plain_text.to_uppercase())
        }
    }

    async fn setup() -> (Router, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        let app = build_app_with(Arc::new(GatedReviser {
            gate: Arc::clone(&gate),
        }));
        seed_chapter(&app, "c1", "Findings").await;
        send(
            &app,
            "PUT",
            &format!("{BASE}/versions/1"),
            Some(json!({ "formatted_content": { "type": "doc", "content": [
                { "type": "paragraph", "content": [
                    { "type": "text", "text": "revenue grew" },
                    { "type": "line_break" },
                    { "type": "text", "text": "costs fell" }
                ] }
            ] } })),
        )
        .await;
        (app, gate)
    }

    async fn wait_for_state(app: &Router, state: &str) -> Value {
        for _ in 0..200 {
            let (_, body) = send(app, "GET", &format!("{BASE}/revise"), None).await;
            if body["state"] == state {
                return body;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("rewrite never reached {state}");
    }

    #[tokio::test]
    async fn rewrite_replaces_current_version() {
        let (app, gate) = setup().await;
        let (status, body) = send(&app, "POST", &format!("{BASE}/revise"), None).await;
        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(body["state"], "pending");
        assert!(body["task_id"].is_string());

        gate.notify_one();
        let done = wait_for_state(&app, "done").await;
        assert_eq!(done["version"], 1);

        let (_, chapter) = send(&app, "GET", BASE, None).await;
        assert_eq!(chapter["chapter_versions"].as_array().unwrap().len(), 1);
        assert_eq!(
            chapter["chapter_versions"][0]["plain_content"],
            "REVENUE GREW\nCOSTS FELL"
        );
    }

    #[tokio::test]
    async fn rewrite_into_new_version() {
        let (app, gate) = setup().await;
        send(
            &app,
            "POST",
            &format!("{BASE}/revise"),
            Some(json!({ "into_new_version": true })),
        )
        .await;
        gate.notify_one();
        let done = wait_for_state(&app, "done").await;
        assert_eq!(done["version"], 2);

        let (_, chapter) = send(&app, "GET", BASE, None).await;
        assert_eq!(chapter["current_version"], 2);
        assert_eq!(chapter["chapter_versions"][0]["plain_content"], "revenue grew\ncosts fell");
    }

    #[tokio::test]
    async fn chapter_is_read_only_while_pending() {
        let (app, gate) = setup().await;
        send(&app, "POST", &format!("{BASE}/revise"), None).await;

        let (status, body) = send(&app, "POST", &format!("{BASE}/versions"), None).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "revision_pending");

        let (status, _) = send(&app, "POST", &format!("{BASE}/revise"), None).await;
        assert_eq!(status, StatusCode::CONFLICT);

        gate.notify_one();
        wait_for_state(&app, "done").await;
        let (status, _) = send(&app, "POST", &format!("{BASE}/versions"), None).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    #[tokio::test]
    async fn cancel_keeps_content() {
        let (app, _gate) = setup().await;
        send(&app, "POST", &format!("{BASE}/revise"), None).await;

        let (status, body) = send(&app, "DELETE", &format!("{BASE}/revise"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["state"], "cancelled");

        let (_, chapter) = send(&app, "GET", BASE, None).await;
        assert_eq!(
            chapter["chapter_versions"][0]["plain_content"],
            "revenue grew\ncosts fell"
        );
        let (status, _) = send(&app, "POST", &format!("{BASE}/versions"), None).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    #[tokio::test]
    async fn status_is_idle_before_any_rewrite() {
        let (app, _gate) = setup().await;
        let (status, body) = send(&app, "GET", &format!("{BASE}/revise"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "state": "idle" }));
    }
}

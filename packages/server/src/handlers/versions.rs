//! Version handlers: create, delete, save, summary, switch, confirm and
//! discard.
//!
//! Every route answers with the updated [`ChapterView`]. Routes that change
//! what the editing surface shows broadcast a `force-refresh`.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use redline::{sanitize, SyncCause};
use redline_api::{ChapterView, SaveVersionRequest, SetCurrentRequest, SummaryRequest};

use crate::{apply, error::AppError, service::Change};

use super::{ensure_editable, AppState};

/// `POST …/chapters/{chapter}/versions`: append an empty version and make
/// it current. Returns 201.
pub async fn create(
    State(state): State<AppState>,
    Path((report_id, chapter_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    ensure_editable(&state, &report_id, &chapter_id)?;
    let m = state
        .chapters
        .mutate(&report_id, &chapter_id, |ch| {
            ch.create_version();
            Ok(SyncCause::VersionCreated.into())
        })
        .await?;
    Ok((StatusCode::CREATED, Json(ChapterView::new(m.record))))
}

/// `DELETE …/chapters/{chapter}/versions/{n}`
///
/// Later versions are renumbered. Deleting the only version is a 409
/// `last_version`.
pub async fn delete(
    State(state): State<AppState>,
    Path((report_id, chapter_id, n)): Path<(String, String, u32)>,
) -> Result<Json<ChapterView>, AppError> {
    ensure_editable(&state, &report_id, &chapter_id)?;
    let m = state
        .chapters
        .mutate(&report_id, &chapter_id, |ch| {
            ch.delete_version(n)?;
            Ok(SyncCause::VersionDeleted.into())
        })
        .await?;
    tracing::info!(report_id, chapter_id, version = n, "version deleted");
    Ok(Json(ChapterView::new(m.record)))
}

/// `PUT …/chapters/{chapter}/versions/{n}`: replace a version's content.
///
/// The tree is sanitized first. The cached summary is cleared.
pub async fn save(
    State(state): State<AppState>,
    Path((report_id, chapter_id, n)): Path<(String, String, u32)>,
    body: Result<Json<SaveVersionRequest>, JsonRejection>,
) -> Result<Json<ChapterView>, AppError> {
    let Json(req) = body?;
    ensure_editable(&state, &report_id, &chapter_id)?;
    let doc = sanitize(&req.formatted_content);
    let m = state
        .chapters
        .mutate(&report_id, &chapter_id, |ch| {
            match req.content {
                Some(text) => ch.save(n, text, doc)?,
                None => ch.save_document(n, doc)?,
            }
            Ok(SyncCause::ContentUpdated.into())
        })
        .await?;
    Ok(Json(ChapterView::new(m.record)))
}

/// `PUT …/chapters/{chapter}/versions/{n}/summary`: cache a summary.
pub async fn set_summary(
    State(state): State<AppState>,
    Path((report_id, chapter_id, n)): Path<(String, String, u32)>,
    body: Result<Json<SummaryRequest>, JsonRejection>,
) -> Result<Json<ChapterView>, AppError> {
    let Json(req) = body?;
    let m = state
        .chapters
        .mutate(&report_id, &chapter_id, |ch| {
            ch.set_summary(n, req.summary)?;
            Ok(Change::Silent)
        })
        .await?;
    Ok(Json(ChapterView::new(m.record)))
}

/// `PUT …/chapters/{chapter}/current`: switch the current version.
pub async fn set_current(
    State(state): State<AppState>,
    Path((report_id, chapter_id)): Path<(String, String)>,
    body: Result<Json<SetCurrentRequest>, JsonRejection>,
) -> Result<Json<ChapterView>, AppError> {
    let Json(req) = body?;
    ensure_editable(&state, &report_id, &chapter_id)?;
    let m = state
        .chapters
        .mutate(&report_id, &chapter_id, |ch| {
            ch.set_current(req.version)?;
            Ok(SyncCause::VersionSwitch.into())
        })
        .await?;
    Ok(Json(ChapterView::new(m.record)))
}

/// `POST …/chapters/{chapter}/confirm`: accept every pending change in the
/// current version and leave correction mode.
pub async fn confirm(
    State(state): State<AppState>,
    Path((report_id, chapter_id)): Path<(String, String)>,
) -> Result<Json<ChapterView>, AppError> {
    ensure_editable(&state, &report_id, &chapter_id)?;
    let m = state
        .chapters
        .mutate(&report_id, &chapter_id, |ch| Ok(apply::confirm(ch)?.into()))
        .await?;
    Ok(Json(ChapterView::new(m.record)))
}

/// `POST …/chapters/{chapter}/discard`: drop every pending change in the
/// current version and leave correction mode.
pub async fn discard(
    State(state): State<AppState>,
    Path((report_id, chapter_id)): Path<(String, String)>,
) -> Result<Json<ChapterView>, AppError> {
    ensure_editable(&state, &report_id, &chapter_id)?;
    let m = state
        .chapters
        .mutate(&report_id, &chapter_id, |ch| Ok(apply::discard(ch)?.into()))
        .await?;
    Ok(Json(ChapterView::new(m.record)))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

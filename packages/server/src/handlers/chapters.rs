//! Chapter handlers: list, create, get and metadata patch.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use redline_api::{ChapterListResponse, ChapterPatch, ChapterView, CreateChapterRequest};

use crate::error::AppError;

use super::AppState;

/// `GET /v1/reports/{report}/chapters`
pub async fn list(
    State(state): State<AppState>,
    Path(report_id): Path<String>,
) -> Result<Json<ChapterListResponse>, AppError> {
    let items = state.chapters.list(&report_id).await?;
    Ok(Json(ChapterListResponse { items }))
}

/// `POST /v1/reports/{report}/chapters`: create a chapter with one empty
/// version. Returns 201.
pub async fn create(
    State(state): State<AppState>,
    Path(report_id): Path<String>,
    body: Result<Json<CreateChapterRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(req) = body?;
    let record = state.chapters.create(&report_id, req).await?;
    tracing::info!(report_id, chapter_id = %record.id, "chapter created");
    Ok((StatusCode::CREATED, Json(ChapterView::new(record))))
}

/// `GET /v1/reports/{report}/chapters/{chapter}`
pub async fn get_chapter(
    State(state): State<AppState>,
    Path((report_id, chapter_id)): Path<(String, String)>,
) -> Result<Json<ChapterView>, AppError> {
    let record = state.chapters.get(&report_id, &chapter_id).await?;
    Ok(Json(ChapterView::new(record)))
}

/// `PATCH /v1/reports/{report}/chapters/{chapter}`: merge metadata fields.
///
/// Allowed while a rewrite is pending: the rewrite only touches versions.
pub async fn patch(
    State(state): State<AppState>,
    Path((report_id, chapter_id)): Path<(String, String)>,
    body: Result<Json<ChapterPatch>, JsonRejection>,
) -> Result<Json<ChapterView>, AppError> {
    let Json(patch) = body?;
    let record = state.chapters.patch(&report_id, &chapter_id, patch).await?;
    Ok(Json(ChapterView::new(record)))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

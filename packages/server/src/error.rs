//! Application-level error type returned by handlers.
//!
//! All variants serialise to the [`ErrorResponse`] JSON format and map to
//! the appropriate HTTP status code.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use redline::EngineError;
use redline_api::{error::codes, ErrorResponse};

use crate::storage::StorageError;

/// An error that a handler can return; converts directly to an HTTP response.
#[derive(Debug)]
pub enum AppError {
    NotFound(String),
    /// The request body is not valid JSON for the route.
    InvalidJson(String),
    BadRequest(String),
    Conflict(String),
    /// Deleting the only remaining version.
    LastVersion,
    /// A rewrite is running; the chapter is read-only until it settles.
    RevisionPending,
    /// The store rejected a write. The caller's copy is still valid.
    Persistence(String),
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, codes::NOT_FOUND, msg),
            AppError::InvalidJson(msg) => (StatusCode::BAD_REQUEST, codes::INVALID_JSON, msg),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, codes::INVALID_PARAMETER, msg)
            }
            AppError::Conflict(msg) => (StatusCode::CONFLICT, codes::ID_CONFLICT, msg),
            AppError::LastVersion => (
                StatusCode::CONFLICT,
                codes::LAST_VERSION,
                "cannot delete the last remaining version".to_string(),
            ),
            AppError::RevisionPending => (
                StatusCode::CONFLICT,
                codes::REVISION_PENDING,
                "a rewrite is in progress for this chapter".to_string(),
            ),
            AppError::Persistence(msg) => {
                tracing::warn!("persistence failure: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    codes::PERSISTENCE_FAILED,
                    msg,
                )
            }
            AppError::Internal(msg) => {
                tracing::error!("internal error: {msg}");
                (StatusCode::INTERNAL_SERVER_ERROR, codes::INTERNAL_ERROR, msg)
            }
        };
        let body = ErrorResponse::new(code, message);
        (status, Json(body)).into_response()
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::NotFound(msg)
            | AppError::InvalidJson(msg)
            | AppError::BadRequest(msg)
            | AppError::Conflict(msg)
            | AppError::Persistence(msg)
            | AppError::Internal(msg) => f.write_str(msg),
            AppError::LastVersion => f.write_str("cannot delete the last remaining version"),
            AppError::RevisionPending => f.write_str("a rewrite is in progress for this chapter"),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(e: JsonRejection) -> Self {
        AppError::InvalidJson(e.body_text())
    }
}

impl From<StorageError> for AppError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::NotFound => AppError::NotFound("not found".into()),
            StorageError::Conflict(msg) => AppError::Conflict(msg),
            StorageError::Internal(msg) => AppError::Persistence(msg),
        }
    }
}

impl From<EngineError> for AppError {
    fn from(e: EngineError) -> Self {
        match e {
            EngineError::LastVersion => AppError::LastVersion,
            e if e.is_not_found() => AppError::NotFound(e.to_string()),
            e => AppError::BadRequest(e.to_string()),
        }
    }
}

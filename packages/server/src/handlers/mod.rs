//! HTTP request handlers for all Redline server endpoints.
//!
//! Each submodule covers a logical group of endpoints. Handlers are async
//! functions that receive Axum extractors and return
//! `Result<impl IntoResponse, AppError>`.
//!
//! The rewrite lock lives here, not in the service: every mutating route
//! except the rewrite task itself checks [`ensure_editable`] first.

pub mod chapters;
pub mod events;
pub mod health;
pub mod revise;
pub mod versions;

#[cfg(test)]
pub(crate) mod test_util;

use std::sync::Arc;

use crate::{
    config::ServerConfig, error::AppError, hub::EventHub, reviser::Reviser, service::Chapters,
    tasks::RevisionTracker,
};

/// Shared application state threaded through all Axum handlers via [`axum::extract::State`].
#[derive(Clone)]
pub struct AppState {
    pub chapters: Arc<Chapters>,
    /// Per-chapter outbound event channels, shared with `chapters`.
    pub hub: Arc<EventHub>,
    pub revisions: Arc<RevisionTracker>,
    pub reviser: Arc<dyn Reviser>,
    pub config: ServerConfig,
}

/// Refuse edits while a rewrite of the chapter is pending.
pub fn ensure_editable(state: &AppState, report_id: &str, chapter_id: &str) -> Result<(), AppError> {
    if state.revisions.is_pending(report_id, chapter_id) {
        return Err(AppError::RevisionPending);
    }
    Ok(())
}

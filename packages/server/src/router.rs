//! Assembles the Axum [`Router`] from all handler modules.

use std::sync::Arc;

use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::{
    config::ServerConfig,
    handlers::{chapters, events, health, revise, versions, AppState},
    hub::EventHub,
    reviser::Reviser,
    service::Chapters,
    storage::DocumentStore,
    tasks::RevisionTracker,
};

/// Build the complete application router with shared state.
pub fn build_router(
    store: Arc<dyn DocumentStore>,
    reviser: Arc<dyn Reviser>,
    config: ServerConfig,
) -> Router {
    let hub = Arc::new(EventHub::new(config.event_capacity));
    let state = AppState {
        chapters: Arc::new(Chapters::new(store, Arc::clone(&hub))),
        hub,
        revisions: Arc::new(RevisionTracker::new()),
        reviser,
        config,
    };

    Router::new()
        .route("/healthz", get(health::healthz))
        // Chapters
        .route(
            "/v1/reports/{report}/chapters",
            get(chapters::list).post(chapters::create),
        )
        .route(
            "/v1/reports/{report}/chapters/{chapter}",
            get(chapters::get_chapter).patch(chapters::patch),
        )
        // Versions
        .route(
            "/v1/reports/{report}/chapters/{chapter}/versions",
            post(versions::create),
        )
        .route(
            "/v1/reports/{report}/chapters/{chapter}/versions/{n}",
            put(versions::save).delete(versions::delete),
        )
        .route(
            "/v1/reports/{report}/chapters/{chapter}/versions/{n}/summary",
            put(versions::set_summary),
        )
        .route(
            "/v1/reports/{report}/chapters/{chapter}/current",
            put(versions::set_current),
        )
        .route(
            "/v1/reports/{report}/chapters/{chapter}/confirm",
            post(versions::confirm),
        )
        .route(
            "/v1/reports/{report}/chapters/{chapter}/discard",
            post(versions::discard),
        )
        // Sync events
        .route(
            "/v1/reports/{report}/chapters/{chapter}/events",
            get(events::stream).post(events::post_event),
        )
        // Rewrite
        .route(
            "/v1/reports/{report}/chapters/{chapter}/revise",
            get(revise::status).post(revise::start).delete(revise::cancel),
        )
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

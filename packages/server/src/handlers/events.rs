//! Sync event handlers.
//!
//! - `POST …/chapters/{chapter}/events` applies one inbound event from the
//!   editing surface to the current version.
//! - `GET …/chapters/{chapter}/events` streams outbound events as
//!   Server-Sent Events. Each SSE event carries the event name in `event:`
//!   and the JSON body in `data:`.
//!
//! An inbound event naming an entity or candidate that does not exist is a
//! logged no-op answered with `204 No Content`; the surface may hold a stale
//! tree and must not be punished for it.

use std::convert::Infallible;
use std::time::Duration;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    Json,
};
use redline_api::{EventAck, InboundEvent, OutboundEvent};
use tokio_stream::wrappers::{errors::BroadcastStreamRecvError, BroadcastStream};
use tokio_stream::{Stream, StreamExt};

use crate::{apply::apply_inbound, error::AppError, service::Change};

use super::{ensure_editable, AppState};

/// `POST /v1/reports/{report}/chapters/{chapter}/events`
pub async fn post_event(
    State(state): State<AppState>,
    Path((report_id, chapter_id)): Path<(String, String)>,
    body: Result<Json<InboundEvent>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(event) = body?;
    ensure_editable(&state, &report_id, &chapter_id)?;

    let m = state
        .chapters
        .mutate(&report_id, &chapter_id, |ch| {
            match apply_inbound(ch, &event) {
                Ok(cause) => Ok(cause.into()),
                Err(e) if e.is_not_found() => {
                    tracing::warn!(
                        report_id,
                        chapter_id,
                        event = event.name(),
                        "ignoring event: {e}"
                    );
                    Ok(Change::Skip)
                }
                Err(e) => Err(e),
            }
        })
        .await?;

    if m.change == Change::Skip {
        return Ok(StatusCode::NO_CONTENT.into_response());
    }
    tracing::debug!(report_id, chapter_id, event = event.name(), "event applied");
    Ok(Json(EventAck {
        version: m.record.current_version,
        outbound: m.outbound,
    })
    .into_response())
}

/// `GET /v1/reports/{report}/chapters/{chapter}/events`
///
/// A subscriber that fell behind the per-chapter buffer gets a `resync`
/// event in place of what it missed.
pub async fn stream(
    State(state): State<AppState>,
    Path((report_id, chapter_id)): Path<(String, String)>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    // 404 for chapters that do not exist
    state.chapters.get(&report_id, &chapter_id).await?;

    let rx = state.hub.subscribe(&report_id, &chapter_id);
    tracing::debug!(report_id, chapter_id, "event subscriber attached");

    let events = BroadcastStream::new(rx).map(|item| {
        let event = match item {
            Ok(event) => event,
            Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "event subscriber lagged; sending resync");
                OutboundEvent::Resync
            }
        };
        Ok(to_sse(&event))
    });

    Ok(Sse::new(events).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    ))
}

fn to_sse(event: &OutboundEvent) -> Event {
    Event::default()
        .event(event.name())
        .json_data(event)
        .unwrap_or_else(|e| {
            tracing::error!("failed to encode outbound event: {e}");
            Event::default().event(OutboundEvent::Resync.name()).data("{}")
        })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! Shared helpers for in-process handler tests.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use crate::config::ServerConfig;
use crate::reviser::{EchoReviser, Reviser};
use crate::router::build_router;
use crate::storage::{memory::MemoryStore, DocumentStore};

pub fn build_app() -> Router {
    build_app_with(Arc::new(EchoReviser))
}

pub fn build_app_with(reviser: Arc<dyn Reviser>) -> Router {
    let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
    build_router(store, reviser, ServerConfig::default())
}

/// Send one request and return the status and the JSON body (`Null` when
/// the body is empty).
pub async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut req = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(v) => {
            req = req.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&v).unwrap())
        }
        None => Body::empty(),
    };
    let resp = app.clone().oneshot(req.body(body).unwrap()).await.unwrap();
    let status = resp.status();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

/// Create chapter `id` in report `r1` and return its view.
pub async fn seed_chapter(app: &Router, id: &str, title: &str) -> Value {
    let (status, body) = send(
        app,
        "POST",
        "/v1/reports/r1/chapters",
        Some(serde_json::json!({ "id": id, "title": title })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body
}

/// A tree with one date entity and one undecided candidate.
pub fn annotated_tree() -> Value {
    serde_json::json!({
        "type": "doc",
        "content": [
            { "type": "paragraph", "content": [
                { "type": "text", "text": "2024-01-01", "entity": {
                    "entity_id": "e1", "entity_type": "date", "entity_category": "time",
                    "original_text": "2024-01-01" } },
                { "type": "text", "text": " ok" }
            ] },
            { "type": "selection_list", "entities": [
                { "entity_id": "s1", "original_text": "Berlin", "entity_category": "place" }
            ] }
        ]
    })
}

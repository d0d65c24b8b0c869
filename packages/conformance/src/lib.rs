//! Shared helpers for the Redline conformance test suite.
//!
//! Provides [`spawn_server`]: it binds a `TcpListener` on an ephemeral port,
//! wires up an in-process server backed by `MemoryStore`, and returns both
//! the local URL and the store so tests can seed records that the HTTP
//! layer would never write (legacy shapes, corrupt trees).

use std::sync::Arc;

use redline_server::{
    build_router, DocumentStore, EchoReviser, MemoryStore, Reviser, ServerConfig,
};

/// Start an ephemeral in-process server and return `(base_url, store)`.
///
/// The server runs in a background `tokio` task bound to an OS-assigned port
/// on `127.0.0.1`, with the echo reviser installed so rewrites complete
/// immediately and leave the text unchanged.
///
/// # Panics
///
/// Panics if the TCP listener cannot be bound or the server fails to start.
pub async fn spawn_server() -> (String, Arc<MemoryStore>) {
    spawn_server_with(Arc::new(EchoReviser)).await
}

/// Like [`spawn_server`], with a caller-supplied reviser.
pub async fn spawn_server_with(reviser: Arc<dyn Reviser>) -> (String, Arc<MemoryStore>) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("get local addr");
    let base_url = format!("http://{addr}");

    let mem_store = Arc::new(MemoryStore::new());
    let store: Arc<dyn DocumentStore> = Arc::clone(&mem_store) as Arc<dyn DocumentStore>;

    let config = ServerConfig {
        bind_addr: addr,
        event_capacity: 16,
        ..ServerConfig::default()
    };
    let router = build_router(store, reviser, config);

    tokio::spawn(async move {
        axum::serve(listener, router)
            .await
            .expect("conformance server error");
    });

    (base_url, mem_store)
}

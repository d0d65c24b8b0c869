//! `redline-server`: chapter sync and versioning service.
//!
//! # Quick start
//!
//! ```sh
//! # In-memory server on the default port:
//! redline-server
//!
//! # Persistent SQLite server:
//! REDLINE_DB=./redline.db redline-server
//!
//! # Custom bind address and a real rewrite service:
//! REDLINE_BIND=127.0.0.1:8080 REDLINE_REVISE_URL=http://llm.local/revise redline-server
//! ```
//!
//! # Environment variables
//!
//! See [`ServerConfig`] for the full list.

use std::sync::Arc;

use redline_server::{
    build_router, DocumentStore, EchoReviser, HttpReviser, MemoryStore, Reviser, ServerConfig,
    SqliteStore,
};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "redline_server=info,tower_http=debug".into()),
        )
        .init();

    let config = ServerConfig::from_env().unwrap_or_else(|e| {
        tracing::error!("invalid configuration: {e}");
        std::process::exit(2);
    });

    let store: Arc<dyn DocumentStore> = match &config.db_path {
        Some(path) => {
            tracing::info!("storage: SQLite at {path}");
            Arc::new(
                SqliteStore::open(path)
                    .unwrap_or_else(|e| panic!("failed to open SQLite database at {path}: {e}")),
            )
        }
        None => {
            tracing::info!("storage: in-memory (data will not survive restart)");
            Arc::new(MemoryStore::new())
        }
    };

    let reviser: Arc<dyn Reviser> = match &config.revise_url {
        Some(url) => {
            tracing::info!(
                "reviser: {url} (timeout {}s)",
                config.revise_timeout.as_secs()
            );
            Arc::new(
                HttpReviser::new(url.clone(), config.revise_timeout)
                    .unwrap_or_else(|e| panic!("failed to build HTTP client for {url}: {e}")),
            )
        }
        None => {
            tracing::info!("reviser: echo (no REDLINE_REVISE_URL set)");
            Arc::new(EchoReviser)
        }
    };

    let bind_addr = config.bind_addr;
    let app = build_router(store, reviser, config);

    tracing::info!("listening on {bind_addr}");
    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {bind_addr}: {e}"));

    axum::serve(listener, app).await.expect("server error");
}

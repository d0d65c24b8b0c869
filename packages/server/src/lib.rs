//! Public surface for the `redline-server` crate.
//!
//! Exposes the router builder, config, storage backends and revisers so that
//! external crates (e.g. the conformance test suite) can spin up an
//! in-process server without spawning a subprocess.

pub mod apply;
pub mod config;
pub mod error;
pub mod handlers;
pub mod hub;
pub mod reviser;
pub mod router;
pub mod service;
pub mod storage;
pub mod tasks;

pub use config::ServerConfig;
pub use reviser::{EchoReviser, HttpReviser, Reviser};
pub use router::build_router;
pub use storage::{memory::MemoryStore, sqlite::SqliteStore, DocumentStore};

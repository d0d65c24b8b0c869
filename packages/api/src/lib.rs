//! Request and response types for the Redline chapter service.
//!
//! This crate encodes the HTTP contract of `redline-server` as Rust types,
//! so that the server, the CLI and the conformance suite agree on one shape.
//!
//! # Endpoints covered
//!
//! | Method | Path (under `/v1/reports/{report}`) | Type |
//! |--------|------|------|
//! | GET | `/chapters` | → [`ChapterListResponse`] |
//! | POST | `/chapters` | [`CreateChapterRequest`] → [`ChapterView`] |
//! | GET | `/chapters/{chapter}` | → [`ChapterView`] |
//! | PATCH | `/chapters/{chapter}` | [`ChapterPatch`] → [`ChapterView`] |
//! | POST | `/chapters/{chapter}/versions` | → [`ChapterView`] |
//! | PUT | `/chapters/{chapter}/versions/{n}` | [`SaveVersionRequest`] → [`ChapterView`] |
//! | DELETE | `/chapters/{chapter}/versions/{n}` | → [`ChapterView`] |
//! | PUT | `/chapters/{chapter}/versions/{n}/summary` | [`SummaryRequest`] → [`ChapterView`] |
//! | PUT | `/chapters/{chapter}/current` | [`SetCurrentRequest`] → [`ChapterView`] |
//! | POST | `/chapters/{chapter}/confirm` | → [`ChapterView`] |
//! | POST | `/chapters/{chapter}/discard` | → [`ChapterView`] |
//! | POST | `/chapters/{chapter}/events` | [`InboundEvent`] → [`EventAck`] |
//! | GET | `/chapters/{chapter}/events` | SSE of [`OutboundEvent`] |
//! | POST / GET / DELETE | `/chapters/{chapter}/revise` | [`ReviseRequest`] → [`ReviseStatus`] |

pub mod chapter;
pub mod error;
pub mod event;
pub mod record;

pub use chapter::{
    ChapterListResponse, ChapterView, CreateChapterRequest, ReviseRequest, ReviseState,
    ReviseStatus, SaveVersionRequest, SetCurrentRequest, SummaryRequest,
};
pub use error::ErrorResponse;
pub use event::{EventAck, InboundEvent, OutboundEvent};
pub use record::{ChapterPatch, ChapterRecord, VersionRecord};

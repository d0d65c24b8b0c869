//! Annotated-document engine for entity-tagged report chapters.
//!
//! This crate holds the document model, the repair and normalisation of
//! untrusted trees, the entity and selection-list transitions, the
//! plain-text projection used as rewrite input, and the per-chapter version
//! history. It performs no I/O. It is the foundation for the
//! `redline-server` HTTP service, the `redline` CLI, the `redline-wasm`
//! bindings used by the editing surface, and the `redline-api` wire types.
//!
//! # Crate layout
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`types`] | Tree data types: [`Document`], [`Block`], [`Inline`], [`EntityMark`], [`SelectionList`] |
//! | [`validation`] | Structural invariant checks via [`validate_document`] |
//! | [`edit`] | Positional text replacement via [`replace_text`] |
//! | [`sanitize`] | Repair of loaded or received trees via [`sanitize()`] |
//! | [`entity`] | Delete / restore / replace transitions |
//! | [`selection`] | Candidate accept/reject bookkeeping |
//! | [`projection`] | [`project`], [`lift`], [`reconcile`] |
//! | [`version`] | [`Chapter`] version history |
//! | [`classify`] | [`classify()`] policy for [`VersionType`] |
//! | [`correction`] | Correction mode, confirm / discard |
//! | [`sync`] | [`EchoGuard`] and refresh policy |
//! | [`render`] | Human-readable text rendering |
//!
//! # Quick start
//!
//! ```rust,ignore
//! use redline::{sanitize, delete_entity, project};
//!
//! let doc = sanitize(&serde_json::from_str(stored_json)?);
//! let doc = delete_entity(&doc, "e1")?;
//! let text = project(&doc);
//! ```

pub mod classify;
pub mod correction;
pub mod edit;
pub mod entity;
pub mod error;
pub mod projection;
pub mod render;
pub mod sanitize;
pub mod selection;
pub mod sync;
pub mod types;
pub mod validation;
pub mod version;

pub use classify::classify;
pub use correction::{confirm_changes, correction_mode, discard_changes, Affordances};
pub use edit::replace_text;
pub use entity::{delete_entity, find_entity, replace_entity, replace_entity_with_custom, restore_entity};
pub use error::EngineError;
pub use projection::{lift, project, reconcile, revision_context};
pub use sanitize::{sanitize, sanitize_with_report, Repair};
pub use selection::{accepted_candidates, find_candidates, update_candidate, update_candidate_in};
pub use sync::{ChangeOrigin, EchoGuard, EchoState, RefreshKind, SyncCause};
pub use types::{
    walk, Block, Candidate, Document, EntityMark, EntityState, Inline, NodeRef, Paragraph,
    SelectionList, TextNode, TextPosition,
};
pub use validation::{validate_document, StructuralError};
pub use version::{Chapter, ChapterVersion, VersionType};

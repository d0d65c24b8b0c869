//! Sync events exchanged between the editing surface and the server.
//!
//! Inbound events are posted to `POST …/chapters/{chapter}/events`; outbound
//! events are streamed from `GET …/chapters/{chapter}/events` as SSE, with the
//! event name in the SSE `event:` field and the JSON body as `data:`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use redline::Document;

/// An edit relayed from the editing surface.
///
/// ```json
/// { "event": "entity-replace", "entity_id": "e1", "replacement": "2025-01-01", "original": "2024-01-01" }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum InboundEvent {
    /// The whole tree as the surface now has it. Saved into the current
    /// version after sanitizing.
    ContentUpdated {
        /// Plain text as the surface computed it. Ignored; the server
        /// projects the tree itself.
        #[serde(default)]
        content: String,
        formatted_content: Value,
    },

    EntityDeletion { entity_id: String },

    EntityRestore { entity_id: String },

    /// Replace an entity's text. When `original` is present the surface
    /// entered a custom value, and `original` is kept among the
    /// replacements.
    EntityReplace {
        entity_id: String,
        replacement: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        original: Option<String>,
    },

    SelectionEntityUpdate {
        entity_id: String,
        deleted: bool,
        confirmed: bool,
    },
}

impl InboundEvent {
    /// The wire name of this event.
    pub fn name(&self) -> &'static str {
        match self {
            InboundEvent::ContentUpdated { .. } => "content-updated",
            InboundEvent::EntityDeletion { .. } => "entity-deletion",
            InboundEvent::EntityRestore { .. } => "entity-restore",
            InboundEvent::EntityReplace { .. } => "entity-replace",
            InboundEvent::SelectionEntityUpdate { .. } => "selection-entity-update",
        }
    }
}

/// An update pushed to the editing surface.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum OutboundEvent {
    /// Replace the surface's tree wholesale. Sent after a rewrite, a version
    /// switch, and confirm/discard.
    ForceRefresh {
        version: u32,
        content: String,
        formatted_content: Document,
    },

    /// Patch the surface's tree after an entity or candidate change.
    EditorContentUpdate {
        version: u32,
        content: String,
        formatted_content: Document,
    },

    /// The subscriber missed events. Re-fetch the chapter.
    Resync,
}

impl OutboundEvent {
    pub fn name(&self) -> &'static str {
        match self {
            OutboundEvent::ForceRefresh { .. } => "force-refresh",
            OutboundEvent::EditorContentUpdate { .. } => "editor-content-update",
            OutboundEvent::Resync => "resync",
        }
    }
}

/// Response to an applied inbound event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EventAck {
    /// The version the event was applied to.
    pub version: u32,

    /// What was broadcast to subscribers, if anything.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outbound: Option<OutboundEvent>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! Chapter-level transitions driven by sync events and chapter actions.
//!
//! Every function here works on the chapter's current version, writes the
//! new tree back with [`Chapter::save_document`] (which reprojects,
//! reclassifies and clears the cached summary), and names the
//! [`SyncCause`] so the caller can pick the refresh to broadcast.

use redline::{
    confirm_changes, delete_entity, discard_changes, replace_entity, replace_entity_with_custom,
    restore_entity, sanitize, update_candidate_in, Chapter, Document, EngineError, SyncCause,
};
use redline_api::InboundEvent;

/// Apply one inbound event to the current version.
pub fn apply_inbound(chapter: &mut Chapter, event: &InboundEvent) -> Result<SyncCause, EngineError> {
    let doc = &chapter.current().document;
    let (next, cause) = match event {
        InboundEvent::ContentUpdated {
            formatted_content, ..
        } => (sanitize(formatted_content), SyncCause::ContentUpdated),
        InboundEvent::EntityDeletion { entity_id } => {
            (delete_entity(doc, entity_id)?, SyncCause::EntityDeleted)
        }
        InboundEvent::EntityRestore { entity_id } => {
            (restore_entity(doc, entity_id)?, SyncCause::EntityRestored)
        }
        InboundEvent::EntityReplace {
            entity_id,
            replacement,
            original: Some(original),
        } => (
            replace_entity_with_custom(doc, entity_id, replacement, original)?,
            SyncCause::EntityReplaced,
        ),
        InboundEvent::EntityReplace {
            entity_id,
            replacement,
            original: None,
        } => (
            replace_entity(doc, entity_id, replacement)?,
            SyncCause::EntityReplaced,
        ),
        InboundEvent::SelectionEntityUpdate {
            entity_id,
            deleted,
            confirmed,
        } => (
            update_candidate_in(doc, entity_id, *deleted, *confirmed)?,
            SyncCause::CandidateUpdated,
        ),
    };
    save_current(chapter, next)?;
    Ok(cause)
}

/// Accept every pending change in the current version.
pub fn confirm(chapter: &mut Chapter) -> Result<SyncCause, EngineError> {
    let next = confirm_changes(&chapter.current().document);
    save_current(chapter, next)?;
    Ok(SyncCause::ChangesConfirmed)
}

/// Drop every pending change in the current version.
pub fn discard(chapter: &mut Chapter) -> Result<SyncCause, EngineError> {
    let next = discard_changes(&chapter.current().document);
    save_current(chapter, next)?;
    Ok(SyncCause::ChangesDiscarded)
}

fn save_current(chapter: &mut Chapter, doc: Document) -> Result<(), EngineError> {
    let n = chapter.current_version();
    chapter.save_document(n, doc)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn chapter() -> Chapter {
        let raw = json!({
            "type": "doc",
            "content": [
                { "type": "paragraph", "content": [
                    { "type": "text", "text": "Stand " },
                    { "type": "text", "text": "2024-01-01",
                      "entity": { "entity_id": "e1", "entity_type": "date",
                                  "original_text": "2024-01-01", "replacements": [] } },
                    { "type": "text", "text": " ok" }
                ] },
                { "type": "selection_list", "entities": [
                    { "entity_id": "s1", "text": "Revenue", "category": "metric",
                      "deleted": false, "confirmed": false }
                ] }
            ]
        });
        let mut ch = Chapter::new("Findings");
        ch.save_document(1, sanitize(&raw)).unwrap();
        ch
    }

    fn event(v: serde_json::Value) -> InboundEvent {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn deletion_drops_span_from_projection() {
        let mut ch = chapter();
        let cause = apply_inbound(
            &mut ch,
            &event(json!({ "event": "entity-deletion", "entity_id": "e1" })),
        )
        .unwrap();
        assert_eq!(cause, SyncCause::EntityDeleted);
        assert_eq!(ch.current().plain_text, "Stand  ok");
    }

    #[test]
    fn custom_replace_keeps_original_in_history() {
        let mut ch = chapter();
        apply_inbound(
            &mut ch,
            &event(json!({ "event": "entity-replace", "entity_id": "e1",
                           "replacement": "2025-06-30", "original": "2024-01-01" })),
        )
        .unwrap();
        let mark = redline::find_entity(&ch.current().document, "e1").unwrap();
        assert_eq!(mark.original_text, "2024-01-01");
        assert!(mark.replacements.iter().any(|r| r == "2024-01-01"));
        assert!(ch.current().plain_text.contains("2025-06-30"));
    }

    #[test]
    fn unknown_entity_is_not_found_and_leaves_chapter() {
        let mut ch = chapter();
        let before = ch.clone();
        let err = apply_inbound(
            &mut ch,
            &event(json!({ "event": "entity-restore", "entity_id": "nope" })),
        )
        .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(ch, before);
    }

    #[test]
    fn candidate_update_and_confirm() {
        let mut ch = chapter();
        assert!(ch.correction_mode());
        let cause = apply_inbound(
            &mut ch,
            &event(json!({ "event": "selection-entity-update", "entity_id": "s1",
                           "deleted": false, "confirmed": true })),
        )
        .unwrap();
        assert_eq!(cause, SyncCause::CandidateUpdated);
        assert!(redline::find_candidates(&ch.current().document)[0].confirmed);

        assert_eq!(confirm(&mut ch).unwrap(), SyncCause::ChangesConfirmed);
        assert!(!ch.correction_mode());
    }

    #[test]
    fn content_update_is_sanitized() {
        let mut ch = chapter();
        apply_inbound(
            &mut ch,
            &event(json!({ "event": "content-updated", "content": "ignored",
                           "formatted_content": "not a tree" })),
        )
        .unwrap();
        assert_eq!(ch.current().plain_text, "");
        assert_eq!(ch.current().document, Document::empty());
    }
}

//! Entity lifecycle transitions.
//!
//! An entity is either active or deleted, and independently either in its
//! original wording or replaced. Every transition here is a pure function:
//! it takes a document, returns a new one, and leaves the input untouched.
//!
//! The same `entity_id` may annotate several disjoint spans when a value
//! recurs verbatim. Flag transitions ([`delete_entity`], [`restore_entity`])
//! apply to every span; replacement applies to the first span only, because a
//! value is replaced where the user interacted with it.

use std::collections::HashSet;

use crate::error::EngineError;
use crate::types::{Document, EntityMark, REPLACED_COLOR};

/// The first annotation carrying `entity_id`, in document order.
pub fn find_entity<'a>(doc: &'a Document, entity_id: &str) -> Option<&'a EntityMark> {
    doc.entities().find(|m| m.entity_id == entity_id)
}

/// Soft-delete every span annotated with `entity_id`.
pub fn delete_entity(doc: &Document, entity_id: &str) -> Result<Document, EngineError> {
    set_deleted(doc, entity_id, true)
}

/// Undo [`delete_entity`] on every span annotated with `entity_id`.
pub fn restore_entity(doc: &Document, entity_id: &str) -> Result<Document, EngineError> {
    set_deleted(doc, entity_id, false)
}

fn set_deleted(doc: &Document, entity_id: &str, deleted: bool) -> Result<Document, EngineError> {
    let mut out = doc.clone();
    let mut hits = 0usize;
    for mark in out
        .text_nodes_mut()
        .filter_map(|t| t.entity.as_mut())
        .filter(|m| m.entity_id == entity_id)
    {
        mark.deleted = deleted;
        hits += 1;
    }
    if hits == 0 {
        return Err(EngineError::EntityNotFound(entity_id.to_string()));
    }
    Ok(out)
}

/// Replace the first span annotated with `entity_id` by `new_text`.
///
/// The span's text before the call moves into `replacements` so the user can
/// cycle back to it. `entity_id` and `original_text` are preserved.
pub fn replace_entity(
    doc: &Document,
    entity_id: &str,
    new_text: &str,
) -> Result<Document, EngineError> {
    replace_inner(doc, entity_id, new_text, None)
}

/// Like [`replace_entity`], and additionally make sure `prior_text` is one of
/// the replacements afterwards.
///
/// Used when the user types a custom value: the text they replaced may never
/// have been offered as an alternative.
pub fn replace_entity_with_custom(
    doc: &Document,
    entity_id: &str,
    custom_text: &str,
    prior_text: &str,
) -> Result<Document, EngineError> {
    replace_inner(doc, entity_id, custom_text, Some(prior_text))
}

fn replace_inner(
    doc: &Document,
    entity_id: &str,
    new_text: &str,
    prior_text: Option<&str>,
) -> Result<Document, EngineError> {
    let mut out = doc.clone();
    let node = out
        .text_nodes_mut()
        .find(|t| t.entity.as_ref().is_some_and(|m| m.entity_id == entity_id))
        .ok_or_else(|| EngineError::EntityNotFound(entity_id.to_string()))?;

    let previous = node.text.clone();
    if let Some(mark) = node.entity.as_mut() {
        let mut history = std::mem::take(&mut mark.replacements);
        history.push(previous);
        if let Some(prior) = prior_text {
            history.push(prior.to_string());
        }
        mark.replacements = dedupe_history(history, new_text);
        mark.current_text = new_text.to_string();
        mark.display_text = new_text.to_string();
        mark.color = REPLACED_COLOR.to_string();
    }
    node.text = new_text.to_string();
    Ok(out)
}

// Keep first occurrences in order; never list the live text or an empty one.
fn dedupe_history(history: Vec<String>, live: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    history
        .into_iter()
        .filter(|r| !r.is_empty() && r != live && seen.insert(r.clone()))
        .collect()
}

// --- tests -------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Block, Inline, Paragraph, TextNode};

    fn annotated(id: &str, text: &str) -> Inline {
        Inline::Text(TextNode::annotated(EntityMark::new(id, "date", "time", text)))
    }

    fn doc(content: Vec<Inline>) -> Document {
        Document::new(vec![Block::Paragraph(Paragraph { content })])
    }

    fn marks<'a>(d: &'a Document, id: &'a str) -> Vec<&'a EntityMark> {
        d.entities().filter(|m| m.entity_id == id).collect()
    }

    #[test]
    fn delete_and_restore_touch_every_occurrence() {
        let d = doc(vec![annotated("e1", "X"), Inline::text(" and "), annotated("e1", "X")]);
        let deleted = delete_entity(&d, "e1").unwrap();
        assert!(marks(&deleted, "e1").iter().all(|m| m.deleted));
        // input untouched
        assert!(marks(&d, "e1").iter().all(|m| !m.deleted));

        let restored = restore_entity(&deleted, "e1").unwrap();
        assert_eq!(restored, d);
    }

    #[test]
    fn unknown_entity_is_not_found() {
        let d = doc(vec![Inline::text("plain")]);
        assert_eq!(
            delete_entity(&d, "nope"),
            Err(EngineError::EntityNotFound("nope".into()))
        );
        assert!(replace_entity(&d, "nope", "x").unwrap_err().is_not_found());
    }

    #[test]
    fn replace_preserves_identity() {
        let d = doc(vec![annotated("e1", "A")]);
        let out = replace_entity(&d, "e1", "foo").unwrap();
        let m = find_entity(&out, "e1").unwrap();
        assert_eq!(m.entity_id, "e1");
        assert_eq!(m.original_text, "A");
        assert_eq!(m.current_text, "foo");
        assert_eq!(m.display_text, "foo");
        assert_eq!(m.color, REPLACED_COLOR);
        assert_eq!(out.text_nodes().next().unwrap().text, "foo");
    }

    #[test]
    fn replacement_history_round_trip() {
        let d = doc(vec![annotated("e1", "A")]);
        let out = replace_entity(&d, "e1", "B").unwrap();
        let m = find_entity(&out, "e1").unwrap();
        assert!(m.replacements.contains(&"A".to_string()));
        assert!(!m.replacements.contains(&"B".to_string()));

        // cycling back removes the live text from the history again
        let back = replace_entity(&out, "e1", "A").unwrap();
        let m = find_entity(&back, "e1").unwrap();
        assert_eq!(m.replacements, ["B"]);
        assert!(!m.is_replaced());
    }

    #[test]
    fn replace_only_touches_first_occurrence() {
        let d = doc(vec![annotated("e1", "X"), Inline::text(" "), annotated("e1", "X")]);
        let out = replace_entity(&d, "e1", "Y").unwrap();
        let texts: Vec<_> = out.text_nodes().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, ["Y", " ", "X"]);
    }

    #[test]
    fn custom_replacement_records_prior_text() {
        let d = doc(vec![annotated("e1", "A")]);
        let out = replace_entity_with_custom(&d, "e1", "custom", "suggested").unwrap();
        let m = find_entity(&out, "e1").unwrap();
        assert_eq!(m.replacements, ["A", "suggested"]);
        assert_eq!(m.current_text, "custom");
    }

    #[test]
    fn custom_replacement_does_not_duplicate_prior() {
        let d = doc(vec![annotated("e1", "A")]);
        let out = replace_entity_with_custom(&d, "e1", "C", "A").unwrap();
        assert_eq!(find_entity(&out, "e1").unwrap().replacements, ["A"]);
    }

    #[test]
    fn deleted_and_replaced_are_independent() {
        let d = doc(vec![annotated("e1", "A")]);
        let out = delete_entity(&d, "e1").unwrap();
        let out = replace_entity(&out, "e1", "B").unwrap();
        let m = find_entity(&out, "e1").unwrap();
        assert!(m.deleted);
        assert!(m.is_replaced());
    }

    #[test]
    fn empty_texts_never_enter_history() {
        let mut mark = EntityMark::new("e1", "id", "", "");
        mark.display_text = String::new();
        let d = doc(vec![Inline::Text(TextNode::annotated(mark))]);
        let out = replace_entity(&d, "e1", "B").unwrap();
        assert!(find_entity(&out, "e1").unwrap().replacements.is_empty());
    }
}

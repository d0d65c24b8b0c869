//! Correction mode and its confirm/discard exits.
//!
//! A document is in correction mode while it holds a selection list or any
//! entity whose type marks a pending alternative. The mode is always derived,
//! never stored.

use serde::{Deserialize, Serialize};

use crate::types::{Block, Document};

/// Entity type given to a pending alternative once the user confirms it.
pub const CONFIRMED_ENTITY_TYPE: &str = "confirmed";

/// Entity type given to a pending alternative once the user discards it.
pub const ORIGINAL_ENTITY_TYPE: &str = "original";

/// `true` if `doc` holds a selection list or a pending alternative.
pub fn correction_mode(doc: &Document) -> bool {
    doc.selection_lists().next().is_some() || doc.entities().any(|m| m.is_pending())
}

/// Which chapter actions the editing surface should enable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Affordances {
    pub start_auto_creation: bool,
    pub confirm_changes: bool,
    pub discard_changes: bool,
}

impl Affordances {
    pub fn for_mode(correction_mode: bool) -> Self {
        Self {
            start_auto_creation: !correction_mode,
            confirm_changes: correction_mode,
            discard_changes: correction_mode,
        }
    }

    pub fn for_document(doc: &Document) -> Self {
        Self::for_mode(correction_mode(doc))
    }
}

/// Accept every pending alternative as it currently reads and drop all
/// selection lists. The result is never in correction mode.
pub fn confirm_changes(doc: &Document) -> Document {
    let mut out = without_selection_lists(doc);
    for node in out.text_nodes_mut() {
        if let Some(mark) = node.entity.as_mut().filter(|m| m.is_pending()) {
            mark.entity_type = CONFIRMED_ENTITY_TYPE.to_string();
        }
    }
    out
}

/// Revert every pending alternative to its original text and drop all
/// selection lists. The result is never in correction mode.
pub fn discard_changes(doc: &Document) -> Document {
    let mut out = without_selection_lists(doc);
    for node in out.text_nodes_mut() {
        if let Some(mark) = node.entity.as_mut().filter(|m| m.is_pending()) {
            mark.entity_type = ORIGINAL_ENTITY_TYPE.to_string();
            mark.current_text.clone_from(&mark.original_text);
            mark.display_text.clone_from(&mark.original_text);
            node.text.clone_from(&mark.original_text);
        }
    }
    out
}

fn without_selection_lists(doc: &Document) -> Document {
    let content: Vec<Block> = doc
        .content
        .iter()
        .filter(|b| matches!(b, Block::Paragraph(_)))
        .cloned()
        .collect();
    if content.is_empty() {
        return Document::empty();
    }
    Document::new(content)
}

// --- tests -------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::replace_entity;
    use crate::types::{Candidate, EntityMark, Inline, Paragraph, SelectionList, TextNode};

    fn pending_doc() -> Document {
        let mark = EntityMark::new("e1", "alternative", "", "old wording");
        let doc = Document::new(vec![
            Block::Paragraph(Paragraph {
                content: vec![Inline::Text(TextNode::annotated(mark)), Inline::text(".")],
            }),
            Block::SelectionList(SelectionList {
                entities: vec![Candidate::new("x", "Berlin", "place")],
            }),
        ]);
        replace_entity(&doc, "e1", "new wording").unwrap()
    }

    #[test]
    fn mode_follows_content() {
        assert!(!correction_mode(&Document::empty()));
        assert!(correction_mode(&pending_doc()));

        let list_only = Document::new(vec![Block::SelectionList(SelectionList::default())]);
        assert!(correction_mode(&list_only));
    }

    #[test]
    fn affordances_flip_with_mode() {
        let on = Affordances::for_mode(true);
        assert!(!on.start_auto_creation && on.confirm_changes && on.discard_changes);
        let off = Affordances::for_document(&Document::empty());
        assert!(off.start_auto_creation && !off.confirm_changes && !off.discard_changes);
    }

    #[test]
    fn confirm_keeps_current_text() {
        let out = confirm_changes(&pending_doc());
        assert!(!correction_mode(&out));
        let m = out.entities().next().unwrap();
        assert_eq!(m.entity_type, CONFIRMED_ENTITY_TYPE);
        assert_eq!(m.current_text, "new wording");
        assert_eq!(out.text_nodes().next().unwrap().text, "new wording");
        assert_eq!(out.selection_lists().count(), 0);
    }

    #[test]
    fn discard_reverts_to_original() {
        let out = discard_changes(&pending_doc());
        assert!(!correction_mode(&out));
        let m = out.entities().next().unwrap();
        assert_eq!(m.entity_type, ORIGINAL_ENTITY_TYPE);
        assert_eq!(m.display_text, "old wording");
        assert_eq!(out.text_nodes().next().unwrap().text, "old wording");
    }

    #[test]
    fn list_only_document_falls_back_to_default() {
        let doc = Document::new(vec![Block::SelectionList(SelectionList::default())]);
        assert_eq!(confirm_changes(&doc), Document::empty());
    }
}

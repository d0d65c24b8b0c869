use thiserror::Error;

use crate::types::{Block, Document, Inline};

/// Structural invariant violations found by [`validate_document`].
///
/// These never reach a user: the sanitizer repairs every one of them.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StructuralError {
    #[error("document has no blocks")]
    EmptyDocument,

    #[error("paragraph at block {0} has no content")]
    EmptyParagraph(usize),

    #[error("paragraph at block {block} has an empty text node at {index} alongside other content")]
    StrayEmptyText { block: usize, index: usize },

    #[error("text node at block {block}, index {index} contains a raw newline")]
    RawNewline { block: usize, index: usize },

    #[error("entity at block {block}, index {index} has an empty entity_id")]
    EmptyEntityId { block: usize, index: usize },

    #[error("entity {0:?} lists a replacement more than once or lists an empty replacement")]
    MalformedReplacements(String),

    #[error("selection list at block {block} repeats candidate {entity_id:?}")]
    DuplicateCandidate { block: usize, entity_id: String },

    #[error("position {offset} is outside block {block}")]
    PositionOutOfRange { block: usize, offset: usize },

    #[error("block {0} is not a paragraph")]
    NotAParagraph(usize),
}

/// Check `doc` against the schema invariants.
///
/// Returns the first violation found, walking blocks in order. A document
/// produced by [`sanitize`](crate::sanitize::sanitize) always passes.
pub fn validate_document(doc: &Document) -> Result<(), StructuralError> {
    if doc.content.is_empty() {
        return Err(StructuralError::EmptyDocument);
    }

    for (b, block) in doc.content.iter().enumerate() {
        match block {
            Block::Paragraph(p) => {
                if p.content.is_empty() {
                    return Err(StructuralError::EmptyParagraph(b));
                }
                let sole = p.content.len() == 1;
                for (i, inline) in p.content.iter().enumerate() {
                    let Inline::Text(t) = inline else { continue };
                    if t.text.contains('\n') {
                        return Err(StructuralError::RawNewline { block: b, index: i });
                    }
                    match &t.entity {
                        None if t.text.is_empty() && !sole => {
                            return Err(StructuralError::StrayEmptyText { block: b, index: i });
                        }
                        None => {}
                        Some(mark) => {
                            if mark.entity_id.is_empty() {
                                return Err(StructuralError::EmptyEntityId { block: b, index: i });
                            }
                            let mut seen = std::collections::HashSet::new();
                            if mark
                                .replacements
                                .iter()
                                .any(|r| r.is_empty() || !seen.insert(r.as_str()))
                            {
                                return Err(StructuralError::MalformedReplacements(
                                    mark.entity_id.clone(),
                                ));
                            }
                        }
                    }
                }
            }
            Block::SelectionList(list) => {
                let mut seen = std::collections::HashSet::new();
                for c in &list.entities {
                    if !seen.insert(c.entity_id.as_str()) {
                        return Err(StructuralError::DuplicateCandidate {
                            block: b,
                            entity_id: c.entity_id.clone(),
                        });
                    }
                }
            }
        }
    }

    Ok(())
}

// --- tests -------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Candidate, EntityMark, Paragraph, SelectionList, TextNode};

    fn para(content: Vec<Inline>) -> Block {
        Block::Paragraph(Paragraph { content })
    }

    #[test]
    fn empty_document_is_valid_minimal() {
        assert_eq!(validate_document(&Document::empty()), Ok(()));
    }

    #[test]
    fn no_blocks_rejected() {
        let doc = Document::new(vec![]);
        assert_eq!(validate_document(&doc), Err(StructuralError::EmptyDocument));
    }

    #[test]
    fn empty_paragraph_rejected() {
        let doc = Document::new(vec![para(vec![])]);
        assert_eq!(validate_document(&doc), Err(StructuralError::EmptyParagraph(0)));
    }

    #[test]
    fn stray_empty_text_rejected() {
        let doc = Document::new(vec![para(vec![Inline::text("a"), Inline::text("")])]);
        assert_eq!(
            validate_document(&doc),
            Err(StructuralError::StrayEmptyText { block: 0, index: 1 })
        );
    }

    #[test]
    fn raw_newline_rejected() {
        let doc = Document::new(vec![para(vec![Inline::text("a\nb")])]);
        assert!(matches!(
            validate_document(&doc),
            Err(StructuralError::RawNewline { .. })
        ));
    }

    #[test]
    fn duplicate_replacement_rejected() {
        let mut mark = EntityMark::new("e1", "date", "", "A");
        mark.replacements = vec!["B".into(), "B".into()];
        let doc = Document::new(vec![para(vec![Inline::Text(TextNode::annotated(mark))])]);
        assert_eq!(
            validate_document(&doc),
            Err(StructuralError::MalformedReplacements("e1".into()))
        );
    }

    #[test]
    fn duplicate_candidate_rejected() {
        let doc = Document::new(vec![Block::SelectionList(SelectionList {
            entities: vec![Candidate::new("x", "a", ""), Candidate::new("x", "b", "")],
        })]);
        assert!(matches!(
            validate_document(&doc),
            Err(StructuralError::DuplicateCandidate { .. })
        ));
    }

    #[test]
    fn recurring_entity_ids_are_legal() {
        let mark = EntityMark::new("e1", "id", "", "X");
        let doc = Document::new(vec![para(vec![
            Inline::Text(TextNode::annotated(mark.clone())),
            Inline::text(" "),
            Inline::Text(TextNode::annotated(mark)),
        ])]);
        assert_eq!(validate_document(&doc), Ok(()));
    }
}

//! Positional editing of paragraph content.

use crate::types::{Block, Document, Inline, TextNode};
use crate::validation::StructuralError;

/// Replace `length` characters starting at `pos` with `new_node`.
///
/// Text nodes that straddle either edge of the range are split. Both halves
/// keep the entity identity, but each half's `current_text` and
/// `display_text` become its own literal text, so a later
/// [`reconcile`](crate::reconcile) leaves the halves as they are. A line
/// break inside the range is removed whole. With `length == 0` this is a
/// plain insertion.
///
/// Fails with [`StructuralError::NotAParagraph`] or
/// [`StructuralError::PositionOutOfRange`] and leaves nothing half-applied.
pub fn replace_text(
    doc: &Document,
    pos: crate::types::TextPosition,
    length: usize,
    new_node: Inline,
) -> Result<Document, StructuralError> {
    let Some(block) = doc.content.get(pos.block) else {
        return Err(StructuralError::PositionOutOfRange {
            block: pos.block,
            offset: pos.offset,
        });
    };
    let Block::Paragraph(paragraph) = block else {
        return Err(StructuralError::NotAParagraph(pos.block));
    };
    let in_range = pos
        .offset
        .checked_add(length)
        .is_some_and(|end| end <= paragraph.char_len());
    if !in_range {
        return Err(StructuralError::PositionOutOfRange {
            block: pos.block,
            offset: pos.offset.saturating_add(length),
        });
    }

    let (mut left, rest) = split_at(&paragraph.content, pos.offset);
    let (_, right) = split_at(&rest, length);

    left.push(new_node);
    left.extend(right);
    let content = drop_stray_empty_text(left);

    let mut out = doc.clone();
    if let Some(Block::Paragraph(p)) = out.content.get_mut(pos.block) {
        p.content = content;
    }
    Ok(out)
}

// Split `nodes` at character offset `k`. A text node that straddles `k` is
// cut in two; pieces are never empty.
fn split_at(nodes: &[Inline], k: usize) -> (Vec<Inline>, Vec<Inline>) {
    let mut left = Vec::new();
    let mut right = Vec::new();
    let mut at = 0usize;

    for node in nodes {
        let len = node.char_len();
        if at + len <= k {
            left.push(node.clone());
        } else if at >= k {
            right.push(node.clone());
        } else if let Inline::Text(t) = node {
            let cut = k - at;
            let head: String = t.text.chars().take(cut).collect();
            let tail: String = t.text.chars().skip(cut).collect();
            left.push(Inline::Text(fragment(t, head)));
            right.push(Inline::Text(fragment(t, tail)));
        }
        at += len;
    }

    (left, right)
}

// A piece of `t` holding `text`. An annotated piece reads as its own text.
fn fragment(t: &TextNode, text: String) -> TextNode {
    let entity = t.entity.clone().map(|mut mark| {
        mark.current_text.clone_from(&text);
        mark.display_text.clone_from(&text);
        mark
    });
    TextNode { text, entity }
}

// Plain empty text nodes are only allowed as the sole content of a paragraph.
fn drop_stray_empty_text(content: Vec<Inline>) -> Vec<Inline> {
    let mut kept: Vec<Inline> = content
        .into_iter()
        .filter(|i| !matches!(i, Inline::Text(t) if t.text.is_empty() && t.entity.is_none()))
        .collect();
    if kept.is_empty() {
        kept.push(Inline::text(""));
    }
    kept
}

// --- tests -------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EntityMark, Paragraph, SelectionList, TextPosition};
    use crate::projection::{lift, project, reconcile};
    use crate::validation::validate_document;

    fn doc(content: Vec<Inline>) -> Document {
        Document::new(vec![Block::Paragraph(Paragraph { content })])
    }

    fn texts(d: &Document) -> Vec<String> {
        d.text_nodes().map(|t| t.text.clone()).collect()
    }

    #[test]
    fn replaces_inside_one_node() {
        let d = doc(vec![Inline::text("hello world")]);
        let out = replace_text(&d, TextPosition::new(0, 6), 5, Inline::text("there")).unwrap();
        assert_eq!(texts(&out), ["hello ", "there"]);
        assert_eq!(validate_document(&out), Ok(()));
    }

    #[test]
    fn replaces_across_a_line_break() {
        let d = doc(vec![Inline::text("ab"), Inline::LineBreak, Inline::text("cd")]);
        // "ab\ncd": remove "b\nc"
        let out = replace_text(&d, TextPosition::new(0, 1), 3, Inline::text("X")).unwrap();
        assert_eq!(texts(&out), ["a", "X", "d"]);
        let Block::Paragraph(p) = &out.content[0] else { panic!() };
        assert!(!p.content.contains(&Inline::LineBreak));
    }

    #[test]
    fn insertion_with_zero_length() {
        let d = doc(vec![Inline::text("ac")]);
        let out = replace_text(&d, TextPosition::new(0, 1), 0, Inline::LineBreak).unwrap();
        let Block::Paragraph(p) = &out.content[0] else { panic!() };
        assert_eq!(
            p.content,
            vec![Inline::text("a"), Inline::LineBreak, Inline::text("c")]
        );
    }

    #[test]
    fn split_annotated_node_keeps_annotation_on_both_halves() {
        let mark = EntityMark::new("e1", "id", "", "ABCD");
        let d = doc(vec![Inline::Text(TextNode::annotated(mark))]);
        let out = replace_text(&d, TextPosition::new(0, 2), 0, Inline::text("-")).unwrap();
        let ids: Vec<_> = out.entities().map(|m| m.entity_id.as_str()).collect();
        assert_eq!(ids, ["e1", "e1"]);
    }

    #[test]
    fn split_halves_survive_reconcile() {
        let mark = EntityMark::new("e1", "id", "", "ABCD");
        let d = doc(vec![Inline::Text(TextNode::annotated(mark))]);
        let out = replace_text(&d, TextPosition::new(0, 2), 0, Inline::text("-")).unwrap();
        assert_eq!(project(&out), "AB-CD");

        let halves: Vec<_> = out.entities().map(|m| m.display_text.as_str()).collect();
        assert_eq!(halves, ["AB", "CD"]);
        assert!(out.entities().all(|m| m.original_text == "ABCD"));

        let reconciled = reconcile(&out);
        assert_eq!(project(&reconciled), "AB-CD");
        assert_eq!(validate_document(&reconciled), Ok(()));
    }

    #[test]
    fn replacing_everything_with_empty_text_yields_minimal_paragraph() {
        let d = doc(vec![Inline::text("abc")]);
        let out = replace_text(&d, TextPosition::new(0, 0), 3, Inline::text("")).unwrap();
        assert_eq!(out, Document::empty());
    }

    #[test]
    fn out_of_range_is_rejected() {
        let d = doc(vec![Inline::text("abc")]);
        let err = replace_text(&d, TextPosition::new(0, 2), 5, Inline::text("x")).unwrap_err();
        assert!(matches!(err, StructuralError::PositionOutOfRange { .. }));
        let err = replace_text(&d, TextPosition::new(3, 0), 0, Inline::text("x")).unwrap_err();
        assert!(matches!(err, StructuralError::PositionOutOfRange { .. }));
    }

    #[test]
    fn overflowing_range_is_rejected() {
        let d = lift("abc");
        let err = replace_text(&d, TextPosition::new(0, usize::MAX), 1, Inline::text("x"))
            .unwrap_err();
        assert!(matches!(err, StructuralError::PositionOutOfRange { .. }));
        let err = replace_text(&d, TextPosition::new(0, 1), usize::MAX, Inline::text("x"))
            .unwrap_err();
        assert!(matches!(err, StructuralError::PositionOutOfRange { .. }));
    }

    #[test]
    fn selection_list_is_not_editable_text() {
        let d = Document::new(vec![Block::SelectionList(SelectionList::default())]);
        let err = replace_text(&d, TextPosition::new(0, 0), 0, Inline::text("x")).unwrap_err();
        assert_eq!(err, StructuralError::NotAParagraph(0));
    }
}

//! Conversion between annotated documents and plain text.
//!
//! [`project`] produces the exact string handed to the rewrite collaborator.
//! [`lift`] goes the other way and is deliberately lossy: entities are never
//! reconstructed from plain text.

use crate::selection::accepted_candidates;
use crate::types::{Block, Document, Inline, Paragraph, TextNode};

/// Flatten `doc` to plain text.
///
/// Line breaks and paragraph boundaries both become `\n`. Deleted entity
/// spans contribute nothing, and neither do selection lists. Trailing
/// newlines are trimmed.
pub fn project(doc: &Document) -> String {
    let mut out = String::new();
    let mut first = true;

    for p in doc.paragraphs() {
        if !first {
            out.push('\n');
        }
        first = false;
        for inline in &p.content {
            match inline {
                Inline::LineBreak => out.push('\n'),
                Inline::Text(t) => {
                    if !t.entity.as_ref().is_some_and(|m| m.deleted) {
                        out.push_str(&t.text);
                    }
                }
            }
        }
    }

    let trimmed = out.trim_end_matches('\n').len();
    out.truncate(trimmed);
    out
}

/// Build a document from plain text: one paragraph, one text node per
/// non-empty line, lines joined by line breaks.
///
/// Empty input gives [`Document::empty`].
pub fn lift(plain_text: &str) -> Document {
    let mut content = Vec::new();
    for (i, line) in plain_text.split('\n').enumerate() {
        if i > 0 {
            content.push(Inline::LineBreak);
        }
        let line = line.strip_suffix('\r').unwrap_or(line);
        if !line.is_empty() {
            content.push(Inline::text(line));
        }
    }
    if content.is_empty() {
        return Document::empty();
    }
    Document::new(vec![Block::Paragraph(Paragraph { content })])
}

/// Force the literal text of every annotated node back to its
/// `display_text`.
///
/// Repairs drift left behind by tools that edited raw node text without
/// going through the entity transitions.
pub fn reconcile(doc: &Document) -> Document {
    let mut out = doc.clone();
    for node in out.text_nodes_mut() {
        let TextNode { text, entity } = node;
        if let Some(mark) = entity {
            if *text != mark.display_text {
                text.clone_from(&mark.display_text);
            }
        }
    }
    out
}

/// The context string passed to the rewrite collaborator next to
/// [`project`]: the chapter title, then one line per accepted candidate.
pub fn revision_context(doc: &Document, title: &str) -> String {
    let mut out = String::from(title);
    for c in accepted_candidates(doc) {
        out.push('\n');
        if c.entity_category.is_empty() {
            out.push_str(&format!("- {}", c.original_text));
        } else {
            out.push_str(&format!("- {} ({})", c.original_text, c.entity_category));
        }
    }
    out
}

// --- tests -------------------------------------------------------------------

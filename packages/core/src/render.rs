//! Human-readable text rendering of [`Document`]s and [`Chapter`]s.
//!
//! The output is stable plain text for terminals and logs. It is not a
//! storage or wire format; only the JSON shape is normative.

use crate::types::{Block, Candidate, Document, EntityMark, Inline, Paragraph};
use crate::version::Chapter;

/// Render a document with its entity markers visible.
///
/// ```text
/// ¶ ⟦e1:date "2024-01-01"⟧ ok
///   next line
/// ¶ the ⟦e2:id ~A-17~⟧ entry, ⟦e3:phrase "new" was "old"⟧
///
/// Selection list (2)
///   [accepted]  x  "Berlin"  (place)
///   [open]      y  "Hamburg"  (place)
/// ```
pub fn render_document(doc: &Document) -> String {
    let mut out = String::new();

    for block in &doc.content {
        match block {
            Block::Paragraph(p) => {
                out.push_str("¶ ");
                out.push_str(&render_paragraph(p));
                out.push('\n');
            }
            Block::SelectionList(list) => {
                out.push('\n');
                out.push_str(&format!("Selection list ({})\n", list.entities.len()));
                for c in &list.entities {
                    out.push_str(&render_candidate(c));
                    out.push('\n');
                }
            }
        }
    }

    out
}

/// Render a chapter's version table.
///
/// ```text
/// Chapter "Findings"  3 versions
/// ──────────────────────────────
///   1  regular       "The inspection took place on the first of the month…"
/// * 2  technical     "12.5 13.1 14.0 mm"  [summary]
///   3  heading_only  ""
///
/// correction mode: off
/// ```
pub fn render_chapter(chapter: &Chapter) -> String {
    let n = chapter.versions().len();
    let header = format!(
        "Chapter \"{}\"  {} version{}",
        chapter.title(),
        n,
        if n == 1 { "" } else { "s" }
    );
    let rule = "─".repeat(header.chars().count());
    let mut out = format!("{}\n{}\n", header, rule);

    for v in chapter.versions() {
        let marker = if v.version == chapter.current_version() { '*' } else { ' ' };
        let excerpt = truncate(&v.plain_text.replace('\n', " "), 56);
        out.push_str(&format!(
            "{} {}  {:<12}  \"{}\"",
            marker, v.version, v.version_type, excerpt
        ));
        if !v.summary.is_empty() {
            out.push_str("  [summary]");
        }
        out.push('\n');
    }

    out.push('\n');
    if chapter.correction_mode() {
        out.push_str("correction mode: on (confirm / discard enabled)\n");
    } else {
        out.push_str("correction mode: off\n");
    }
    out
}

// --- helpers -----------------------------------------------------------------

fn render_paragraph(p: &Paragraph) -> String {
    let mut out = String::new();
    for inline in &p.content {
        match inline {
            Inline::LineBreak => out.push_str("\n  "),
            Inline::Text(t) => match &t.entity {
                None => out.push_str(&t.text),
                Some(mark) => out.push_str(&render_entity(mark, &t.text)),
            },
        }
    }
    out
}

fn render_entity(mark: &EntityMark, text: &str) -> String {
    let body = if mark.deleted {
        format!("~{}~", text)
    } else {
        format!("\"{}\"", text)
    };
    let was = if mark.is_replaced() {
        format!(" was \"{}\"", mark.original_text)
    } else {
        String::new()
    };
    format!("⟦{}:{} {}{}⟧", mark.entity_id, mark.entity_type, body, was)
}

fn render_candidate(c: &Candidate) -> String {
    let status = if c.is_accepted() {
        "[accepted]"
    } else if c.deleted {
        "[rejected]"
    } else {
        "[open]"
    };
    let category = if c.entity_category.is_empty() {
        String::new()
    } else {
        format!("  ({})", c.entity_category)
    };
    format!("  {:<10}  {}  \"{}\"{}", status, c.entity_id, c.original_text, category)
}

fn truncate(s: &str, max: usize) -> String {
    let s = s.trim();
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max - 1).collect();
        format!("{}…", head)
    }
}

// --- tests -------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{delete_entity, replace_entity};
    use crate::projection::lift;
    use crate::types::{SelectionList, TextNode};

    fn doc() -> Document {
        Document::new(vec![
            Block::Paragraph(Paragraph {
                content: vec![
                    Inline::Text(TextNode::annotated(EntityMark::new("e1", "date", "", "2024-01-01"))),
                    Inline::text(" ok"),
                ],
            }),
            Block::SelectionList(SelectionList {
                entities: vec![Candidate::new("x", "Berlin", "place")],
            }),
        ])
    }

    #[test]
    fn entities_are_marked() {
        let r = render_document(&doc());
        assert!(r.contains("⟦e1:date \"2024-01-01\"⟧ ok"));
        assert!(r.contains("Selection list (1)"));
        assert!(r.contains("[open]"));
        assert!(r.contains("(place)"));
    }

    #[test]
    fn deleted_and_replaced_entities() {
        let d = delete_entity(&doc(), "e1").unwrap();
        assert!(render_document(&d).contains("~2024-01-01~"));

        let d = replace_entity(&doc(), "e1", "2025-02-02").unwrap();
        assert!(render_document(&d).contains("\"2025-02-02\" was \"2024-01-01\""));
    }

    #[test]
    fn chapter_table_marks_current() {
        let mut ch = Chapter::new("Findings");
        ch.create_version();
        ch.save_document(2, lift("Second draft.")).unwrap();
        ch.set_current(2).unwrap();
        let r = render_chapter(&ch);
        assert!(r.contains("Chapter \"Findings\"  2 versions"));
        assert!(r.contains("* 2"));
        assert!(r.contains("  1  heading_only"));
        assert!(r.contains("correction mode: off"));
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("äöüäöü", 4), "äöü…");
        assert_eq!(truncate("short", 10), "short");
    }
}

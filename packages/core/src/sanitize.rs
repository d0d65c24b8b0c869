//! Repair and normalisation of untrusted document trees.
//!
//! Trees arrive from storage and from the editing surface as loose JSON. They
//! may carry misspelled field names, inline nodes the schema does not know,
//! stacked marks, raw newlines inside text, or the legacy selection-list shape
//! (a generic list block with the candidates tucked into its `attrs`). This
//! module is the only place that accepts any of that. Everything downstream
//! works on a [`Document`] that passes
//! [`validate_document`](crate::validation::validate_document).
//!
//! Sanitizing never fails. Input that cannot be salvaged yields
//! [`Document::empty`]. Sanitizing an already valid tree returns it unchanged.

use std::collections::HashSet;

use serde_json::{Map, Value};

use crate::types::{Block, Candidate, Document, EntityMark, Inline, Paragraph, SelectionList, TextNode};

/// Known mis-keyed fields and their canonical names.
///
/// Older clients wrote `entitiy_id`; a storage migration once produced the
/// camel-cased forms.
const FIELD_REPAIRS: &[(&str, &str)] = &[
    ("entitiy_id", "entity_id"),
    ("entityId", "entity_id"),
    ("entityType", "entity_type"),
    ("entityCategory", "entity_category"),
    ("originalText", "original_text"),
    ("currentText", "current_text"),
    ("displayText", "display_text"),
];

/// Generic list block types that may carry a legacy selection list.
const LEGACY_LIST_TYPES: &[&str] = &["bullet_list", "ordered_list", "bulletList", "list"];

/// `attrs` keys under which a legacy list carries its candidates.
const LEGACY_CANDIDATE_KEYS: &[&str] = &["selectionEntities", "selection_entities"];

/// One repair the sanitizer performed. Diagnostics only; the repaired
/// [`Document`] is always usable regardless of what is listed here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Repair {
    /// The whole tree arrived JSON-encoded inside a string.
    DecodedString,
    /// A bare array of blocks was wrapped in a `doc` root.
    WrappedBareContent,
    FieldRenamed { from: String, to: String },
    /// An inline node of an unknown type was removed from a paragraph.
    DroppedInline(String),
    /// A block of an unknown type was removed from the document.
    DroppedBlock(String),
    /// A legacy list block was rewritten into a `selection_list`.
    LegacySelectionList,
    /// A text node carried more than one entity mark; all but the first were
    /// dropped.
    StackedMarks,
    /// An entity annotation without a usable `entity_id` was stripped.
    DroppedEntity,
    DroppedCandidate,
    DedupedCandidates,
    DedupedReplacements(String),
    /// Raw newlines inside a text node were turned into line breaks.
    SplitNewlines,
    /// Empty text nodes next to real content were removed.
    DroppedEmptyText,
    /// A paragraph with no content received a single empty text node.
    FilledEmptyParagraph,
    /// Nothing could be salvaged; the default empty document was used.
    DefaultDocument,
}

/// Sanitize an untrusted tree into a schema-valid [`Document`].
pub fn sanitize(raw: &Value) -> Document {
    sanitize_with_report(raw).0
}

/// Like [`sanitize`], also returning every repair performed.
pub fn sanitize_with_report(raw: &Value) -> (Document, Vec<Repair>) {
    let mut repairs = Vec::new();
    let blocks = parse_root(raw, &mut repairs, 0);
    let doc = normalize_with(Document::new(blocks), &mut repairs);
    (doc, repairs)
}

/// Apply the structural normalisation to an already typed document.
///
/// This is the part of sanitizing that does not depend on the JSON shape:
/// raw newlines, stray empty text nodes, empty paragraphs, duplicated
/// replacements and candidates, and an empty block list.
pub fn normalize(doc: Document) -> Document {
    normalize_with(doc, &mut Vec::new())
}

/// Every selection-list candidate in `raw`, from canonical and legacy blocks
/// alike, in document order.
pub fn candidates_in_raw(raw: &Value) -> Vec<Candidate> {
    sanitize(raw)
        .selection_lists()
        .flat_map(|l| l.entities.iter().cloned())
        .collect()
}

// ---------------------------------------------------------------------------
// Lenient parsing
// ---------------------------------------------------------------------------

fn parse_root(raw: &Value, repairs: &mut Vec<Repair>, depth: u8) -> Vec<Block> {
    match raw {
        Value::String(s) if depth == 0 => match serde_json::from_str::<Value>(s) {
            Ok(inner) => {
                repairs.push(Repair::DecodedString);
                parse_root(&inner, repairs, depth + 1)
            }
            Err(_) => Vec::new(),
        },
        Value::Array(blocks) => {
            repairs.push(Repair::WrappedBareContent);
            parse_blocks(blocks, repairs)
        }
        Value::Object(obj) => {
            let mut obj = obj.clone();
            repair_fields(&mut obj, repairs);
            match obj.get("type").and_then(Value::as_str) {
                Some("doc") | None => match obj.get("content").and_then(Value::as_array) {
                    Some(blocks) => parse_blocks(blocks, repairs),
                    None => Vec::new(),
                },
                // A lone block where a document was expected.
                Some(_) => parse_block(&obj, repairs).into_iter().collect(),
            }
        }
        _ => Vec::new(),
    }
}

fn parse_blocks(blocks: &[Value], repairs: &mut Vec<Repair>) -> Vec<Block> {
    blocks
        .iter()
        .filter_map(|b| match b {
            Value::Object(obj) => {
                let mut obj = obj.clone();
                repair_fields(&mut obj, repairs);
                parse_block(&obj, repairs)
            }
            other => {
                repairs.push(Repair::DroppedBlock(type_name(other).into()));
                None
            }
        })
        .collect()
}

fn parse_block(obj: &Map<String, Value>, repairs: &mut Vec<Repair>) -> Option<Block> {
    let kind = obj.get("type").and_then(Value::as_str).unwrap_or("");
    match kind {
        "paragraph" => {
            let content = obj
                .get("content")
                .and_then(Value::as_array)
                .map(|items| {
                    items
                        .iter()
                        .filter_map(|i| parse_inline(i, repairs))
                        .collect()
                })
                .unwrap_or_default();
            Some(Block::Paragraph(Paragraph { content }))
        }
        "selection_list" | "selection-list" => {
            let items = obj
                .get("entities")
                .or_else(|| obj.get("attrs").and_then(|a| a.get("entities")))
                .and_then(Value::as_array);
            Some(Block::SelectionList(parse_candidates(items, repairs)))
        }
        k if LEGACY_LIST_TYPES.contains(&k) => {
            let attrs = obj.get("attrs").and_then(Value::as_object);
            let items = attrs.and_then(|a| {
                LEGACY_CANDIDATE_KEYS
                    .iter()
                    .find_map(|key| a.get(*key).and_then(Value::as_array))
            });
            match items {
                Some(items) => {
                    repairs.push(Repair::LegacySelectionList);
                    Some(Block::SelectionList(parse_candidates(Some(items), repairs)))
                }
                None => {
                    repairs.push(Repair::DroppedBlock(k.to_string()));
                    None
                }
            }
        }
        other => {
            repairs.push(Repair::DroppedBlock(other.to_string()));
            None
        }
    }
}

fn parse_inline(v: &Value, repairs: &mut Vec<Repair>) -> Option<Inline> {
    let Some(obj) = v.as_object() else {
        repairs.push(Repair::DroppedInline(type_name(v).into()));
        return None;
    };
    let mut obj = obj.clone();
    repair_fields(&mut obj, repairs);

    let kind = obj.get("type").and_then(Value::as_str).unwrap_or("");
    match kind {
        "text" => {
            let Some(text) = obj.get("text").and_then(Value::as_str) else {
                repairs.push(Repair::DroppedInline("text".into()));
                return None;
            };
            let entity = entity_source(&obj, repairs)
                .and_then(|attrs| parse_entity(&attrs, text, repairs));
            Some(Inline::Text(TextNode {
                text: text.to_string(),
                entity,
            }))
        }
        "line_break" | "hard_break" | "hardBreak" => Some(Inline::LineBreak),
        other => {
            repairs.push(Repair::DroppedInline(other.to_string()));
            None
        }
    }
}

// The annotation lives under `entity` in the canonical shape; the editing
// surface sends it as the first `entity` mark in a `marks` array.
fn entity_source(
    node: &Map<String, Value>,
    repairs: &mut Vec<Repair>,
) -> Option<Map<String, Value>> {
    if let Some(Value::Object(e)) = node.get("entity") {
        let mut e = e.clone();
        repair_fields(&mut e, repairs);
        return Some(e);
    }

    let marks = node.get("marks").and_then(Value::as_array)?;
    let mut entity_marks = marks.iter().filter_map(|m| {
        let m = m.as_object()?;
        (m.get("type").and_then(Value::as_str) == Some("entity"))
            .then(|| m.get("attrs").and_then(Value::as_object))
            .flatten()
    });
    let first = entity_marks.next()?.clone();
    if entity_marks.next().is_some() {
        repairs.push(Repair::StackedMarks);
    }
    let mut first = first;
    repair_fields(&mut first, repairs);
    Some(first)
}

fn parse_entity(
    attrs: &Map<String, Value>,
    text: &str,
    repairs: &mut Vec<Repair>,
) -> Option<EntityMark> {
    let Some(entity_id) = id_field(attrs, "entity_id") else {
        repairs.push(Repair::DroppedEntity);
        return None;
    };

    let display = str_field(attrs, "display_text");
    let current = str_field(attrs, "current_text");
    let display_text = display.or(current).unwrap_or(text).to_string();
    let current_text = current.or(display).unwrap_or(text).to_string();

    let replacements = attrs
        .get("replacements")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|r| r.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default();

    Some(EntityMark {
        entity_id,
        entity_type: str_field(attrs, "entity_type").unwrap_or_default().to_string(),
        entity_category: str_field(attrs, "entity_category")
            .unwrap_or_default()
            .to_string(),
        original_text: str_field(attrs, "original_text").unwrap_or(text).to_string(),
        current_text,
        display_text,
        color: str_field(attrs, "color").unwrap_or_default().to_string(),
        deleted: bool_field(attrs, "deleted"),
        replacements,
    })
}

fn parse_candidates(items: Option<&Vec<Value>>, repairs: &mut Vec<Repair>) -> SelectionList {
    let entities = items
        .map(|items| {
            items
                .iter()
                .filter_map(|item| {
                    let Some(obj) = item.as_object() else {
                        repairs.push(Repair::DroppedCandidate);
                        return None;
                    };
                    let mut obj = obj.clone();
                    repair_fields(&mut obj, repairs);
                    let Some(entity_id) = id_field(&obj, "entity_id") else {
                        repairs.push(Repair::DroppedCandidate);
                        return None;
                    };
                    Some(Candidate {
                        entity_id,
                        original_text: str_field(&obj, "original_text")
                            .or_else(|| str_field(&obj, "text"))
                            .unwrap_or_default()
                            .to_string(),
                        entity_category: str_field(&obj, "entity_category")
                            .unwrap_or_default()
                            .to_string(),
                        deleted: bool_field(&obj, "deleted"),
                        confirmed: bool_field(&obj, "confirmed"),
                    })
                })
                .collect()
        })
        .unwrap_or_default();
    SelectionList { entities }
}

// ---------------------------------------------------------------------------
// Structural normalisation
// ---------------------------------------------------------------------------

fn normalize_with(doc: Document, repairs: &mut Vec<Repair>) -> Document {
    let blocks: Vec<Block> = doc
        .content
        .into_iter()
        .map(|block| match block {
            Block::Paragraph(p) => Block::Paragraph(normalize_paragraph(p, repairs)),
            Block::SelectionList(l) => Block::SelectionList(dedupe_candidates(l, repairs)),
        })
        .collect();

    if blocks.is_empty() {
        repairs.push(Repair::DefaultDocument);
        return Document::empty();
    }
    Document::new(blocks)
}

fn normalize_paragraph(p: Paragraph, repairs: &mut Vec<Repair>) -> Paragraph {
    let mut content = Vec::with_capacity(p.content.len());

    for inline in p.content {
        let Inline::Text(mut t) = inline else {
            content.push(inline);
            continue;
        };

        if let Some(mark) = t.entity.as_mut() {
            if mark.entity_id.is_empty() {
                repairs.push(Repair::DroppedEntity);
                t.entity = None;
            } else {
                if flatten_newlines(mark) {
                    repairs.push(Repair::SplitNewlines);
                }
                dedupe_replacements(mark, repairs);
            }
        }

        if !t.text.contains('\n') {
            content.push(Inline::Text(t));
        } else if t.entity.is_some() {
            // An entity span stays one node.
            repairs.push(Repair::SplitNewlines);
            t.text = t.text.replace('\n', " ");
            content.push(Inline::Text(t));
        } else {
            repairs.push(Repair::SplitNewlines);
            for (i, piece) in t.text.split('\n').enumerate() {
                if i > 0 {
                    content.push(Inline::LineBreak);
                }
                if !piece.is_empty() {
                    content.push(Inline::text(piece));
                }
            }
        }
    }

    let is_empty_plain =
        |i: &Inline| matches!(i, Inline::Text(t) if t.text.is_empty() && t.entity.is_none());
    let empties = content.iter().filter(|i| is_empty_plain(i)).count();

    if content.is_empty() {
        repairs.push(Repair::FilledEmptyParagraph);
        return Paragraph::empty();
    }
    if empties == content.len() {
        if empties > 1 {
            repairs.push(Repair::DroppedEmptyText);
        }
        return Paragraph::empty();
    }
    if empties > 0 {
        repairs.push(Repair::DroppedEmptyText);
        content.retain(|i| !is_empty_plain(i));
    }
    Paragraph { content }
}

// An entity span cannot hold a line break, so none of the texts it may be
// reconciled to can either.
fn flatten_newlines(mark: &mut EntityMark) -> bool {
    let mut changed = false;
    let texts = [
        &mut mark.original_text,
        &mut mark.current_text,
        &mut mark.display_text,
    ];
    for text in texts.into_iter().chain(mark.replacements.iter_mut()) {
        if text.contains('\n') {
            *text = text.replace('\n', " ");
            changed = true;
        }
    }
    changed
}

fn dedupe_replacements(mark: &mut EntityMark, repairs: &mut Vec<Repair>) {
    let mut seen = HashSet::new();
    let before = mark.replacements.len();
    mark.replacements
        .retain(|r| !r.is_empty() && seen.insert(r.clone()));
    if mark.replacements.len() != before {
        repairs.push(Repair::DedupedReplacements(mark.entity_id.clone()));
    }
}

fn dedupe_candidates(mut list: SelectionList, repairs: &mut Vec<Repair>) -> SelectionList {
    let mut seen = HashSet::new();
    let before = list.entities.len();
    list.entities.retain(|c| seen.insert(c.entity_id.clone()));
    if list.entities.len() != before {
        repairs.push(Repair::DedupedCandidates);
    }
    list
}

// ---------------------------------------------------------------------------
// Field helpers
// ---------------------------------------------------------------------------

fn repair_fields(obj: &mut Map<String, Value>, repairs: &mut Vec<Repair>) {
    for (typo, canonical) in FIELD_REPAIRS {
        if obj.contains_key(*canonical) {
            continue;
        }
        if let Some(v) = obj.remove(*typo) {
            obj.insert((*canonical).to_string(), v);
            repairs.push(Repair::FieldRenamed {
                from: (*typo).to_string(),
                to: (*canonical).to_string(),
            });
        }
    }
}

fn str_field<'a>(obj: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    obj.get(key).and_then(Value::as_str)
}

// Ids occasionally arrive as numbers.
fn id_field(obj: &Map<String, Value>, key: &str) -> Option<String> {
    match obj.get(key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn bool_field(obj: &Map<String, Value>, key: &str) -> bool {
    match obj.get(key) {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => s == "true",
        _ => false,
    }
}

fn type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// --- tests -------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projection::{project, reconcile};
    use crate::validation::validate_document;
    use serde_json::json;

    fn valid_tree() -> Value {
        json!({
            "type": "doc",
            "content": [
                { "type": "paragraph", "content": [
                    { "type": "text", "text": "2024-01-01", "entity": {
                        "entity_id": "e1", "entity_type": "date", "entity_category": "time",
                        "original_text": "2024-01-01", "current_text": "2024-01-01",
                        "display_text": "2024-01-01", "color": "", "deleted": false
                    } },
                    { "type": "text", "text": " ok" },
                    { "type": "line_break" },
                    { "type": "text", "text": "end" }
                ] },
                { "type": "selection_list", "entities": [
                    { "entity_id": "x", "original_text": "Berlin", "entity_category": "place",
                      "deleted": false, "confirmed": false }
                ] }
            ]
        })
    }

    #[test]
    fn valid_tree_is_untouched() {
        let (doc, repairs) = sanitize_with_report(&valid_tree());
        assert!(repairs.is_empty(), "unexpected repairs: {repairs:?}");
        assert_eq!(serde_json::to_value(&doc).unwrap(), valid_tree());
    }

    fn messy_tree() -> Value {
        json!({
            "type": "doc",
            "content": [
                { "type": "heading", "content": [] },
                { "type": "paragraph", "content": [
                    { "type": "text", "text": "a\nb" },
                    { "type": "image" },
                    { "type": "text", "text": "" },
                    { "type": "hard_break" },
                    { "type": "text", "text": "X", "marks": [
                        { "type": "bold" },
                        { "type": "entity", "attrs": { "entitiy_id": "e9", "entity_type": "id",
                          "replacements": ["A", "A", ""] } },
                        { "type": "entity", "attrs": { "entity_id": "e10" } }
                    ] }
                ] },
                { "type": "paragraph" },
                { "type": "bullet_list", "attrs": { "selectionEntities": [
                    { "entity_id": "c1", "original_text": "one" },
                    { "entity_id": "c1", "original_text": "dup" },
                    { "original_text": "no id" }
                ] } }
            ]
        })
    }

    fn newline_entity_tree() -> Value {
        json!({ "type": "doc", "content": [ { "type": "paragraph", "content": [
            { "type": "text", "text": "a\nb", "entity": {
                "entity_id": "e1", "entity_type": "address",
                "original_text": "a\nb", "current_text": "a\nb", "display_text": "a\nb",
                "replacements": ["c\nd", "c d"]
            } }
        ] } ] })
    }

    #[test]
    fn sanitize_is_idempotent() {
        let legacy_list = json!({ "type": "doc", "content": [
            { "type": "bullet_list", "attrs": { "selection_entities": [
                { "entity_id": "x", "original_text": "Berlin", "confirmed": true }
            ] }, "content": [] }
        ] });
        let stacked_marks = json!({ "type": "doc", "content": [ { "type": "paragraph", "content": [
            { "type": "text", "text": "v", "marks": [
                { "type": "entity", "attrs": { "entity_id": "first" } },
                { "type": "entity", "attrs": { "entity_id": "second" } }
            ] }
        ] } ] });
        let cases = [
            ("valid", valid_tree()),
            ("messy", messy_tree()),
            ("encoded", Value::String(messy_tree().to_string())),
            ("legacy list", legacy_list),
            ("stacked marks", stacked_marks),
            ("entity newline", newline_entity_tree()),
            ("garbage", json!("not json")),
            ("empty", json!({})),
        ];
        for (name, raw) in cases {
            let once = sanitize(&raw);
            assert_eq!(validate_document(&once), Ok(()), "{name}");
            let twice = sanitize(&serde_json::to_value(&once).unwrap());
            assert_eq!(once, twice, "{name}");
            assert_eq!(normalize(once.clone()), once, "{name}");
            assert_eq!(validate_document(&reconcile(&once)), Ok(()), "{name}");
        }
    }

    #[test]
    fn entity_newlines_stay_out_after_reconcile() {
        let (doc, repairs) = sanitize_with_report(&newline_entity_tree());
        assert!(repairs.contains(&Repair::SplitNewlines));
        let mark = doc.entities().next().unwrap();
        assert_eq!(mark.display_text, "a b");
        assert_eq!(mark.current_text, "a b");
        assert_eq!(mark.original_text, "a b");
        assert_eq!(mark.replacements, ["c d"]);

        let reconciled = reconcile(&doc);
        assert_eq!(validate_document(&reconciled), Ok(()));
        assert_eq!(project(&reconciled), "a b");
    }

    #[test]
    fn garbage_yields_default_document() {
        for raw in [json!(null), json!(42), json!("not json"), json!({}), json!({"type": "doc"})] {
            let (doc, repairs) = sanitize_with_report(&raw);
            assert_eq!(doc, Document::empty(), "input {raw}");
            assert!(repairs.contains(&Repair::DefaultDocument));
        }
    }

    #[test]
    fn field_typo_is_repaired() {
        let raw = json!({ "type": "doc", "content": [ { "type": "paragraph", "content": [
            { "type": "text", "text": "A-1", "entity": { "entitiy_id": "e1", "entity_type": "id" } }
        ] } ] });
        let (doc, repairs) = sanitize_with_report(&raw);
        let mark = doc.entities().next().unwrap();
        assert_eq!(mark.entity_id, "e1");
        assert_eq!(mark.original_text, "A-1");
        assert_eq!(mark.display_text, "A-1");
        assert!(repairs.contains(&Repair::FieldRenamed {
            from: "entitiy_id".into(),
            to: "entity_id".into()
        }));
    }

    #[test]
    fn unknown_inline_nodes_are_dropped() {
        let raw = json!({ "type": "doc", "content": [ { "type": "paragraph", "content": [
            { "type": "text", "text": "keep" },
            { "type": "image", "attrs": { "src": "x.png" } },
            { "type": "mention" }
        ] } ] });
        let (doc, repairs) = sanitize_with_report(&raw);
        assert_eq!(doc.text_nodes().count(), 1);
        assert!(repairs.contains(&Repair::DroppedInline("image".into())));
        assert!(repairs.contains(&Repair::DroppedInline("mention".into())));
    }

    #[test]
    fn unknown_block_is_dropped_and_known_blocks_survive() {
        let raw = json!({ "type": "doc", "content": [
            { "type": "table", "content": [] },
            { "type": "paragraph", "content": [ { "type": "text", "text": "kept" } ] }
        ] });
        let doc = sanitize(&raw);
        assert_eq!(doc.content.len(), 1);
        assert_eq!(doc.text_nodes().next().unwrap().text, "kept");
    }

    #[test]
    fn legacy_selection_list_is_rewritten() {
        let raw = json!({ "type": "doc", "content": [
            { "type": "bullet_list", "attrs": { "selectionEntities": [
                { "entity_id": "x", "original_text": "Berlin", "confirmed": true }
            ] }, "content": [] }
        ] });
        let (doc, repairs) = sanitize_with_report(&raw);
        assert!(repairs.contains(&Repair::LegacySelectionList));
        let list = doc.selection_lists().next().unwrap();
        assert_eq!(list.entities.len(), 1);
        assert!(list.entities[0].confirmed);
        let v = serde_json::to_value(&doc).unwrap();
        assert_eq!(v["content"][0]["type"], "selection_list");
    }

    #[test]
    fn plain_bullet_list_without_candidates_is_dropped() {
        let raw = json!({ "type": "doc", "content": [ { "type": "bullet_list", "content": [] } ] });
        assert_eq!(sanitize(&raw), Document::empty());
    }

    #[test]
    fn stacked_marks_keep_first_entity() {
        let raw = json!({ "type": "doc", "content": [ { "type": "paragraph", "content": [
            { "type": "text", "text": "v", "marks": [
                { "type": "entity", "attrs": { "entity_id": "first" } },
                { "type": "entity", "attrs": { "entity_id": "second" } }
            ] }
        ] } ] });
        let (doc, repairs) = sanitize_with_report(&raw);
        assert_eq!(doc.entities().next().unwrap().entity_id, "first");
        assert_eq!(doc.entities().count(), 1);
        assert!(repairs.contains(&Repair::StackedMarks));
    }

    #[test]
    fn raw_newlines_become_line_breaks() {
        let raw = json!({ "type": "doc", "content": [ { "type": "paragraph", "content": [
            { "type": "text", "text": "a\n\nb" }
        ] } ] });
        let doc = sanitize(&raw);
        let Block::Paragraph(p) = &doc.content[0] else { panic!() };
        assert_eq!(
            p.content,
            vec![Inline::text("a"), Inline::LineBreak, Inline::LineBreak, Inline::text("b")]
        );
    }

    #[test]
    fn string_encoded_tree_is_decoded() {
        let raw = Value::String(valid_tree().to_string());
        let (doc, repairs) = sanitize_with_report(&raw);
        assert_eq!(repairs, vec![Repair::DecodedString]);
        assert_eq!(doc, sanitize(&valid_tree()));
    }

    #[test]
    fn candidates_in_raw_scans_both_shapes() {
        let raw = json!({ "type": "doc", "content": [
            { "type": "selection_list", "entities": [ { "entity_id": "a" } ] },
            { "type": "bullet_list", "attrs": { "selection_entities": [ { "entity_id": "b" } ] } }
        ] });
        let ids: Vec<String> = candidates_in_raw(&raw).into_iter().map(|c| c.entity_id).collect();
        assert_eq!(ids, ["a", "b"]);
    }

    #[test]
    fn entity_without_id_keeps_its_text() {
        let raw = json!({ "type": "doc", "content": [ { "type": "paragraph", "content": [
            { "type": "text", "text": "orphan", "entity": { "entity_type": "date" } }
        ] } ] });
        let (doc, repairs) = sanitize_with_report(&raw);
        let node = doc.text_nodes().next().unwrap();
        assert_eq!(node.text, "orphan");
        assert!(node.entity.is_none());
        assert!(repairs.contains(&Repair::DroppedEntity));
    }
}

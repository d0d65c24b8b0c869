//! Core data types for annotated documents.
//!
//! A [`Document`] is a `doc` root holding an ordered list of [`Block`]s. A
//! block is either a [`Paragraph`] of inline nodes or a [`SelectionList`] of
//! undecided [`Candidate`] entities. Inline nodes are [`TextNode`]s, which
//! may carry exactly one [`EntityMark`], and line breaks.
//!
//! All types serialise to and from a ProseMirror-like JSON shape:
//!
//! ```json
//! { "type": "doc", "content": [
//!     { "type": "paragraph", "content": [
//!         { "type": "text", "text": "2024-01-01", "entity": { "entity_id": "e1", ... } },
//!         { "type": "line_break" },
//!         { "type": "text", "text": " ok" }
//!     ] },
//!     { "type": "selection_list", "entities": [ { "entity_id": "x", ... } ] }
//! ] }
//! ```
//!
//! Values read from storage or received from a client should go through
//! [`sanitize`](crate::sanitize::sanitize) rather than straight through serde;
//! the sanitizer tolerates the malformed and legacy shapes that serde rejects.

use serde::{Deserialize, Serialize};

/// Colour given to an entity after it has been replaced.
pub const REPLACED_COLOR: &str = "#7e57c2";

/// Entity types that mark an annotation as a pending alternative produced by
/// the AI pipeline. Their presence puts the chapter into correction mode.
pub const PENDING_ENTITY_TYPES: &[&str] = &["alternative", "replacement"];

// ---------------------------------------------------------------------------
// Entity annotation
// ---------------------------------------------------------------------------

/// The annotation attached to an entity-tagged [`TextNode`].
///
/// `entity_id` and `original_text` never change once the annotation exists.
/// `current_text` and `display_text` move together on every replacement.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EntityMark {
    /// Stable identifier. Never reused within a document's lifetime.
    pub entity_id: String,

    /// Classification assigned by the extraction step (e.g. `"date"`).
    pub entity_type: String,

    /// Coarser grouping assigned by the extraction step.
    #[serde(default)]
    pub entity_category: String,

    /// Text at annotation creation.
    pub original_text: String,

    /// Text the entity currently stands for.
    pub current_text: String,

    /// Text rendered by the editing surface.
    pub display_text: String,

    /// Presentation hint for the editing surface.
    #[serde(default)]
    pub color: String,

    /// Soft-delete flag. Deleted text stays in the tree but is excluded from
    /// the plain-text projection.
    #[serde(default)]
    pub deleted: bool,

    /// Earlier texts the user can cycle back to, in display order and
    /// without duplicates.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub replacements: Vec<String>,
}

/// The externally meaningful lifecycle state of an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityState {
    Active,
    Deleted,
}

impl EntityMark {
    /// Create a fresh, active annotation whose texts all equal `text`.
    pub fn new(
        entity_id: impl Into<String>,
        entity_type: impl Into<String>,
        entity_category: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        let text = text.into();
        Self {
            entity_id: entity_id.into(),
            entity_type: entity_type.into(),
            entity_category: entity_category.into(),
            original_text: text.clone(),
            current_text: text.clone(),
            display_text: text,
            color: String::new(),
            deleted: false,
            replacements: Vec::new(),
        }
    }

    pub fn state(&self) -> EntityState {
        if self.deleted {
            EntityState::Deleted
        } else {
            EntityState::Active
        }
    }

    /// `true` once the entity's text differs from what was extracted.
    /// Independent of [`EntityMark::deleted`].
    pub fn is_replaced(&self) -> bool {
        self.current_text != self.original_text
    }

    /// `true` if the extraction step marked this entity as a pending
    /// alternative awaiting confirmation.
    pub fn is_pending(&self) -> bool {
        PENDING_ENTITY_TYPES.contains(&self.entity_type.as_str())
    }
}

// ---------------------------------------------------------------------------
// Inline nodes
// ---------------------------------------------------------------------------

/// A run of text, optionally tagged as an entity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TextNode {
    pub text: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity: Option<EntityMark>,
}

impl TextNode {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            entity: None,
        }
    }

    /// A text node whose literal text is the annotation's `display_text`.
    pub fn annotated(entity: EntityMark) -> Self {
        Self {
            text: entity.display_text.clone(),
            entity: Some(entity),
        }
    }

    /// Number of characters this node occupies in paragraph offsets.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// A node inside a [`Paragraph`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Inline {
    Text(TextNode),
    LineBreak,
}

impl Inline {
    pub fn text(text: impl Into<String>) -> Self {
        Inline::Text(TextNode::plain(text))
    }

    /// Characters this node occupies in paragraph offsets. A line break
    /// counts as one.
    pub fn char_len(&self) -> usize {
        match self {
            Inline::Text(t) => t.char_len(),
            Inline::LineBreak => 1,
        }
    }
}

// ---------------------------------------------------------------------------
// Blocks
// ---------------------------------------------------------------------------

/// An ordered run of inline nodes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Paragraph {
    #[serde(default)]
    pub content: Vec<Inline>,
}

impl Paragraph {
    /// A paragraph holding a single empty text node.
    pub fn empty() -> Self {
        Self {
            content: vec![Inline::text("")],
        }
    }

    pub fn char_len(&self) -> usize {
        self.content.iter().map(Inline::char_len).sum()
    }
}

/// A candidate entity waiting for an accept/reject decision.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Candidate {
    pub entity_id: String,

    #[serde(default)]
    pub original_text: String,

    #[serde(default)]
    pub entity_category: String,

    #[serde(default)]
    pub deleted: bool,

    #[serde(default)]
    pub confirmed: bool,
}

impl Candidate {
    pub fn new(
        entity_id: impl Into<String>,
        original_text: impl Into<String>,
        entity_category: impl Into<String>,
    ) -> Self {
        Self {
            entity_id: entity_id.into(),
            original_text: original_text.into(),
            entity_category: entity_category.into(),
            deleted: false,
            confirmed: false,
        }
    }

    /// Confirmed and not deleted: the candidate has been accepted into the
    /// document.
    pub fn is_accepted(&self) -> bool {
        self.confirmed && !self.deleted
    }
}

/// A block of candidate entities. Holds no nested blocks.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SelectionList {
    #[serde(default)]
    pub entities: Vec<Candidate>,
}

/// A top-level block of a [`Document`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Paragraph(Paragraph),
    SelectionList(SelectionList),
}

// ---------------------------------------------------------------------------
// Document
// ---------------------------------------------------------------------------

/// An annotated document: a `doc` root with an ordered list of blocks.
///
/// Cloning is the copy-on-write boundary: every transition in this crate
/// takes `&Document` and returns a new one.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(from = "DocumentRepr", into = "DocumentRepr")]
pub struct Document {
    pub content: Vec<Block>,
}

impl Document {
    pub fn new(content: Vec<Block>) -> Self {
        Self { content }
    }

    /// The minimal valid document: one paragraph holding one empty text node.
    pub fn empty() -> Self {
        Self {
            content: vec![Block::Paragraph(Paragraph::empty())],
        }
    }

    /// Iterate over every paragraph in document order.
    pub fn paragraphs(&self) -> impl Iterator<Item = &Paragraph> {
        self.content.iter().filter_map(|b| match b {
            Block::Paragraph(p) => Some(p),
            Block::SelectionList(_) => None,
        })
    }

    /// Iterate over every selection list in document order.
    pub fn selection_lists(&self) -> impl Iterator<Item = &SelectionList> {
        self.content.iter().filter_map(|b| match b {
            Block::SelectionList(l) => Some(l),
            Block::Paragraph(_) => None,
        })
    }

    /// Iterate over every text node in document order.
    pub fn text_nodes(&self) -> impl Iterator<Item = &TextNode> {
        self.paragraphs().flat_map(|p| {
            p.content.iter().filter_map(|i| match i {
                Inline::Text(t) => Some(t),
                Inline::LineBreak => None,
            })
        })
    }

    /// Mutable counterpart of [`Document::text_nodes`].
    pub(crate) fn text_nodes_mut(&mut self) -> impl Iterator<Item = &mut TextNode> {
        self.content
            .iter_mut()
            .filter_map(|b| match b {
                Block::Paragraph(p) => Some(p),
                Block::SelectionList(_) => None,
            })
            .flat_map(|p| {
                p.content.iter_mut().filter_map(|i| match i {
                    Inline::Text(t) => Some(t),
                    Inline::LineBreak => None,
                })
            })
    }

    /// Every entity annotation in document order, including repeats of the
    /// same `entity_id`.
    pub fn entities(&self) -> impl Iterator<Item = &EntityMark> {
        self.text_nodes().filter_map(|t| t.entity.as_ref())
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::empty()
    }
}

#[derive(Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum DocumentRepr {
    Doc {
        #[serde(default)]
        content: Vec<Block>,
    },
}

impl From<DocumentRepr> for Document {
    fn from(r: DocumentRepr) -> Self {
        match r {
            DocumentRepr::Doc { content } => Document { content },
        }
    }
}

impl From<Document> for DocumentRepr {
    fn from(d: Document) -> Self {
        DocumentRepr::Doc { content: d.content }
    }
}

// ---------------------------------------------------------------------------
// Traversal
// ---------------------------------------------------------------------------

/// A borrowed view of one node, handed to [`walk`] visitors.
#[derive(Debug, Clone, Copy)]
pub enum NodeRef<'a> {
    Doc(&'a Document),
    Block(&'a Block),
    Inline(&'a Inline),
    Candidate(&'a Candidate),
}

/// Visit every node of `doc` depth-first, in pre-order: the root, then each
/// block followed by its children.
pub fn walk<'a, F>(doc: &'a Document, mut visitor: F)
where
    F: FnMut(NodeRef<'a>),
{
    visitor(NodeRef::Doc(doc));
    for block in &doc.content {
        visitor(NodeRef::Block(block));
        match block {
            Block::Paragraph(p) => {
                for inline in &p.content {
                    visitor(NodeRef::Inline(inline));
                }
            }
            Block::SelectionList(l) => {
                for c in &l.entities {
                    visitor(NodeRef::Candidate(c));
                }
            }
        }
    }
}

/// A character position inside one paragraph block.
///
/// `offset` counts characters, with a line break occupying one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextPosition {
    pub block: usize,
    pub offset: usize,
}

impl TextPosition {
    pub fn new(block: usize, offset: usize) -> Self {
        Self { block, offset }
    }
}

// --- tests -------------------------------------------------------------------

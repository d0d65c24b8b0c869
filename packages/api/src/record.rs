//! The persisted chapter record.
//!
//! This is the shape a chapter has in the document store, addressed by
//! `(report_id, "chapters", chapter_id)`. Metadata fields (`title`,
//! `chapter_number`, `chapter_info`, `position`, `active_meta_info`) belong to
//! the surrounding application; the engine only reads `title` and rewrites
//! `current_version` and `chapter_versions`.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use redline::{sanitize, Chapter, ChapterVersion, VersionType};

fn default_current_version() -> u32 {
    1
}

fn default_version_type() -> VersionType {
    VersionType::HeadingOnly
}

// The stored type is recomputed on load, so an unknown or mistyped value
// must not make the record undecodable.
fn lenient_version_type<'de, D>(deserializer: D) -> Result<VersionType, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    Ok(VersionType::deserialize(raw).unwrap_or_else(|_| default_version_type()))
}

/// A chapter as stored.
///
/// # Example
///
/// ```json
/// {
///   "id": "019526b2-f68a-7c3e-a0b4-1d2e3f4a5b6c",
///   "title": "Findings",
///   "chapter_number": "3",
///   "chapter_info": "",
///   "position": 3,
///   "active_meta_info": { "author": "kw" },
///   "current_version": 1,
///   "chapter_versions": [
///     { "version": 1, "plain_content": "", "formatted_content": { "type": "doc", "content": [...] },
///       "summary": "", "type": "heading_only", "created_at": "2026-10-19T08:00:00Z" }
///   ]
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChapterRecord {
    pub id: String,

    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub chapter_number: String,

    #[serde(default)]
    pub chapter_info: String,

    #[serde(default)]
    pub position: i64,

    /// Free-form key/value metadata. Merged key by key on update.
    #[serde(default)]
    pub active_meta_info: Map<String, Value>,

    #[serde(default = "default_current_version")]
    pub current_version: u32,

    #[serde(default)]
    pub chapter_versions: Vec<VersionRecord>,
}

/// One stored version of a chapter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VersionRecord {
    pub version: u32,

    #[serde(default)]
    pub plain_content: String,

    /// The document tree as stored. Passed through the sanitizer on load, so
    /// it may be in any shape a past client wrote.
    #[serde(default)]
    pub formatted_content: Value,

    #[serde(default)]
    pub summary: String,

    /// Written for readers of the raw record. Recomputed on every load.
    #[serde(
        rename = "type",
        default = "default_version_type",
        deserialize_with = "lenient_version_type"
    )]
    pub version_type: VersionType,

    /// RFC 3339 timestamp.
    #[serde(default)]
    pub created_at: String,
}

impl VersionRecord {
    fn from_version(v: &ChapterVersion) -> Self {
        Self {
            version: v.version,
            plain_content: v.plain_text.clone(),
            formatted_content: serde_json::to_value(&v.document).unwrap_or(Value::Null),
            summary: v.summary.clone(),
            version_type: v.version_type,
            created_at: v.created_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }

    fn to_version(&self, title: &str) -> ChapterVersion {
        let created_at = DateTime::parse_from_rfc3339(&self.created_at)
            .map(|t| t.with_timezone(&Utc))
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
        ChapterVersion {
            version: self.version,
            plain_text: self.plain_content.clone(),
            document: sanitize(&self.formatted_content),
            summary: self.summary.clone(),
            version_type: redline::classify(&self.plain_content, title),
            created_at,
        }
    }
}

impl ChapterRecord {
    /// A new record holding one empty version.
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        let title = title.into();
        let mut record = Self {
            id: id.into(),
            title: title.clone(),
            chapter_number: String::new(),
            chapter_info: String::new(),
            position: 0,
            active_meta_info: Map::new(),
            current_version: 1,
            chapter_versions: Vec::new(),
        };
        record.apply_chapter(&Chapter::new(title));
        record
    }

    /// Load the version history into the engine. Every stored tree is
    /// sanitized and every broken invariant repaired.
    pub fn to_chapter(&self) -> Chapter {
        let versions = self
            .chapter_versions
            .iter()
            .map(|v| v.to_version(&self.title))
            .collect();
        Chapter::from_parts(self.title.clone(), versions, self.current_version)
    }

    /// Write the engine's version history back. Metadata is left alone.
    pub fn apply_chapter(&mut self, chapter: &Chapter) {
        self.current_version = chapter.current_version();
        self.chapter_versions = chapter
            .versions()
            .iter()
            .map(VersionRecord::from_version)
            .collect();
    }

    /// Merge a metadata patch. Absent fields are left alone; in
    /// `active_meta_info`, a `null` value removes the key.
    pub fn merge(&mut self, patch: ChapterPatch) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(n) = patch.chapter_number {
            self.chapter_number = n;
        }
        if let Some(info) = patch.chapter_info {
            self.chapter_info = info;
        }
        if let Some(position) = patch.position {
            self.position = position;
        }
        if let Some(meta) = patch.active_meta_info {
            for (k, v) in meta {
                if v.is_null() {
                    self.active_meta_info.remove(&k);
                } else {
                    self.active_meta_info.insert(k, v);
                }
            }
        }
    }
}

/// Body of `PATCH /v1/reports/{report}/chapters/{chapter}`: a partial
/// metadata update.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ChapterPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chapter_number: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chapter_info: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_meta_info: Option<Map<String, Value>>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! Per-chapter version history.
//!
//! A [`Chapter`] holds an ordered, never-empty list of [`ChapterVersion`]s
//! numbered `1..=n` without gaps, and a pointer to the current one. The
//! fields are private so that every change goes through the transitions
//! below, which keep both invariants.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::classify::classify;
use crate::correction::{correction_mode, Affordances};
use crate::error::EngineError;
use crate::projection::project;
use crate::types::Document;

/// Derived kind of a version's content. See [`classify`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VersionType {
    Regular,
    Technical,
    HeadingOnly,
}

impl fmt::Display for VersionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            VersionType::Regular => "regular",
            VersionType::Technical => "technical",
            VersionType::HeadingOnly => "heading_only",
        };
        f.pad(s)
    }
}

/// One stored snapshot of a chapter's content.
#[derive(Debug, Clone, PartialEq)]
pub struct ChapterVersion {
    /// 1-based position in the chapter's history.
    pub version: u32,
    pub plain_text: String,
    pub document: Document,
    /// Cached summary of this version. Empty when none has been produced
    /// since the last save.
    pub summary: String,
    pub version_type: VersionType,
    pub created_at: DateTime<Utc>,
}

impl ChapterVersion {
    /// An empty version: no text, the default document, no summary.
    pub fn empty(version: u32) -> Self {
        Self {
            version,
            plain_text: String::new(),
            document: Document::empty(),
            summary: String::new(),
            version_type: VersionType::HeadingOnly,
            created_at: Utc::now(),
        }
    }
}

/// A chapter's version history and current-version pointer.
#[derive(Debug, Clone, PartialEq)]
pub struct Chapter {
    title: String,
    versions: Vec<ChapterVersion>,
    current_version: u32,
}

impl Chapter {
    /// A new chapter with a single empty version.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            versions: vec![ChapterVersion::empty(1)],
            current_version: 1,
        }
    }

    /// Rebuild a chapter from stored parts, repairing whatever does not hold.
    ///
    /// Versions are ordered by their stored number and renumbered `1..=n`.
    /// The current pointer follows its version through the renumbering; if it
    /// names no stored version it falls back to the last one. An empty list
    /// gets a single synthesized empty version.
    pub fn from_parts(
        title: impl Into<String>,
        mut versions: Vec<ChapterVersion>,
        current_version: u32,
    ) -> Self {
        let title = title.into();
        if versions.is_empty() {
            return Self::new(title);
        }

        versions.sort_by_key(|v| v.version);
        let mut current = None;
        for (i, v) in versions.iter_mut().enumerate() {
            let renumbered = i as u32 + 1;
            if v.version == current_version && current.is_none() {
                current = Some(renumbered);
            }
            v.version = renumbered;
        }

        Self {
            current_version: current.unwrap_or(versions.len() as u32),
            title,
            versions,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn versions(&self) -> &[ChapterVersion] {
        &self.versions
    }

    pub fn current_version(&self) -> u32 {
        self.current_version
    }

    pub fn version(&self, n: u32) -> Option<&ChapterVersion> {
        self.versions.get(Self::index(n)?)
    }

    /// The version the current pointer refers to.
    pub fn current(&self) -> &ChapterVersion {
        // current_version is always in 1..=len
        &self.versions[self.current_version as usize - 1]
    }

    /// Append an empty version and make it current. Returns its number.
    pub fn create_version(&mut self) -> u32 {
        let n = self.versions.len() as u32 + 1;
        self.versions.push(ChapterVersion::empty(n));
        self.current_version = n;
        n
    }

    /// Remove version `n`; later versions move down by one.
    ///
    /// If `n` was current, the version now at slot `n` becomes current, or
    /// the last version when `n` was the last. A current pointer above `n`
    /// follows its version down. Deleting the only version is rejected and
    /// leaves the chapter unchanged.
    pub fn delete_version(&mut self, n: u32) -> Result<(), EngineError> {
        let idx = self.checked_index(n)?;
        if self.versions.len() == 1 {
            return Err(EngineError::LastVersion);
        }

        self.versions.remove(idx);
        for v in self.versions.iter_mut().skip(idx) {
            v.version -= 1;
        }

        let len = self.versions.len() as u32;
        if self.current_version == n {
            self.current_version = n.min(len);
        } else if self.current_version > n {
            self.current_version -= 1;
        }
        Ok(())
    }

    /// Point the chapter at version `n`.
    pub fn set_current(&mut self, n: u32) -> Result<(), EngineError> {
        self.checked_index(n)?;
        self.current_version = n;
        Ok(())
    }

    /// Replace version `n`'s content and reclassify it.
    ///
    /// The cached summary is always cleared: it described the old content.
    pub fn save(
        &mut self,
        n: u32,
        plain_text: impl Into<String>,
        document: Document,
    ) -> Result<(), EngineError> {
        let idx = self.checked_index(n)?;
        let title = self.title.clone();
        let v = &mut self.versions[idx];
        v.plain_text = plain_text.into();
        v.version_type = classify(&v.plain_text, &title);
        v.document = document;
        v.summary.clear();
        Ok(())
    }

    /// [`Chapter::save`] with the plain text projected from `document`.
    pub fn save_document(&mut self, n: u32, document: Document) -> Result<(), EngineError> {
        let plain = project(&document);
        self.save(n, plain, document)
    }

    /// Cache a summary for version `n`.
    pub fn set_summary(&mut self, n: u32, summary: impl Into<String>) -> Result<(), EngineError> {
        let idx = self.checked_index(n)?;
        self.versions[idx].summary = summary.into();
        Ok(())
    }

    /// Whether the current version is in correction mode.
    pub fn correction_mode(&self) -> bool {
        correction_mode(&self.current().document)
    }

    pub fn affordances(&self) -> Affordances {
        Affordances::for_mode(self.correction_mode())
    }

    fn index(n: u32) -> Option<usize> {
        (n as usize).checked_sub(1)
    }

    fn checked_index(&self, n: u32) -> Result<usize, EngineError> {
        Self::index(n)
            .filter(|i| *i < self.versions.len())
            .ok_or(EngineError::VersionNotFound(n))
    }
}

// --- tests -------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projection::lift;

    fn chapter_abc() -> Chapter {
        let mut ch = Chapter::new("Findings");
        ch.save(1, "a", lift("a")).unwrap();
        ch.create_version();
        ch.save(2, "b", lift("b")).unwrap();
        ch.create_version();
        ch.save(3, "c", lift("c")).unwrap();
        ch
    }

    fn texts(ch: &Chapter) -> Vec<(u32, &str)> {
        ch.versions()
            .iter()
            .map(|v| (v.version, v.plain_text.as_str()))
            .collect()
    }

    #[test]
    fn new_chapter_has_one_empty_version() {
        let ch = Chapter::new("Intro");
        assert_eq!(ch.versions().len(), 1);
        assert_eq!(ch.current_version(), 1);
        assert_eq!(ch.current().document, Document::empty());
        assert_eq!(ch.current().plain_text, "");
    }

    #[test]
    fn create_appends_and_becomes_current() {
        let mut ch = Chapter::new("Intro");
        assert_eq!(ch.create_version(), 2);
        assert_eq!(ch.current_version(), 2);
        assert_eq!(ch.current().summary, "");
    }

    #[test]
    fn deleting_current_middle_version() {
        let mut ch = chapter_abc();
        ch.set_current(2).unwrap();
        ch.delete_version(2).unwrap();
        assert_eq!(texts(&ch), [(1, "a"), (2, "c")]);
        assert_eq!(ch.current_version(), 2);
        assert_eq!(ch.current().plain_text, "c");
    }

    #[test]
    fn deleting_current_last_version_falls_back() {
        let mut ch = chapter_abc();
        ch.delete_version(3).unwrap();
        assert_eq!(ch.current_version(), 2);
        assert_eq!(ch.current().plain_text, "b");
    }

    #[test]
    fn current_pointer_follows_renumbering() {
        let mut ch = chapter_abc();
        ch.delete_version(1).unwrap();
        assert_eq!(texts(&ch), [(1, "b"), (2, "c")]);
        assert_eq!(ch.current().plain_text, "c");
    }

    #[test]
    fn last_version_is_protected() {
        let mut ch = Chapter::new("Intro");
        ch.save(1, "only", lift("only")).unwrap();
        let before = ch.clone();
        assert_eq!(ch.delete_version(1), Err(EngineError::LastVersion));
        assert_eq!(ch, before);
    }

    #[test]
    fn missing_versions_are_not_found() {
        let mut ch = chapter_abc();
        assert_eq!(ch.delete_version(0), Err(EngineError::VersionNotFound(0)));
        assert_eq!(ch.delete_version(4), Err(EngineError::VersionNotFound(4)));
        assert_eq!(ch.set_current(9), Err(EngineError::VersionNotFound(9)));
        assert!(ch.version(0).is_none());
    }

    #[test]
    fn save_resets_summary_and_reclassifies() {
        let mut ch = Chapter::new("Findings");
        ch.set_summary(1, "old summary").unwrap();
        let text = "The inspection took place on the first of the month. \
                    All findings were recorded.";
        ch.save(1, text, lift(text)).unwrap();
        assert_eq!(ch.current().summary, "");
        assert_eq!(ch.current().version_type, VersionType::Regular);
    }

    #[test]
    fn save_document_projects_plain_text() {
        let mut ch = Chapter::new("Intro");
        ch.save_document(1, lift("one\ntwo")).unwrap();
        assert_eq!(ch.current().plain_text, "one\ntwo");
    }

    #[test]
    fn from_parts_repairs_numbering() {
        let mut a = ChapterVersion::empty(4);
        a.plain_text = "a".into();
        let mut b = ChapterVersion::empty(9);
        b.plain_text = "b".into();
        let ch = Chapter::from_parts("Intro", vec![b, a], 9);
        assert_eq!(texts(&ch), [(1, "a"), (2, "b")]);
        assert_eq!(ch.current_version(), 2);

        let ch = Chapter::from_parts("Intro", vec![], 3);
        assert_eq!(ch.versions().len(), 1);
        assert_eq!(ch.current_version(), 1);
    }

    #[test]
    fn version_type_serialises_snake_case() {
        let v = serde_json::to_value(VersionType::HeadingOnly).unwrap();
        assert_eq!(v, "heading_only");
        assert_eq!(VersionType::Technical.to_string(), "technical");
    }
}

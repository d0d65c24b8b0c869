//! Version classification policy.
//!
//! The type of a chapter version is derived from its plain text and the
//! chapter title every time the version is saved. It is never edited
//! directly.
//!
//! Rules, first match wins:
//!
//! 1. No words at all, or fewer than [`HEADING_ONLY_MAX_WORDS`] words none of
//!    which ends a sentence: [`VersionType::HeadingOnly`].
//! 2. The title names an appendix-like section ([`TECHNICAL_TITLE_RE`]):
//!    [`VersionType::Technical`].
//! 3. More than [`TECHNICAL_DIGIT_RATIO`] of the words contain a digit
//!    (tables, measurement series, identifiers): [`VersionType::Technical`].
//! 4. Otherwise [`VersionType::Regular`].

use std::sync::LazyLock;

use regex::Regex;

use crate::version::VersionType;

/// Texts shorter than this many words, without a sentence terminator, are
/// treated as a bare heading.
pub const HEADING_ONLY_MAX_WORDS: usize = 12;

/// Share of digit-bearing words above which a text counts as technical.
pub const TECHNICAL_DIGIT_RATIO: f64 = 0.5;

/// Titles that mark appendix-like, technical sections.
pub const TECHNICAL_TITLE_RE: &str =
    r"(?i)\b(anhang|anlage|appendix|verzeichnis|deckblatt|inhalt|technical|technische?)\b";

static TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(TECHNICAL_TITLE_RE).expect("invalid technical title regex"));

/// Classify a version's plain text under the chapter `title`.
pub fn classify(text: &str, title: &str) -> VersionType {
    let words: Vec<&str> = text.split_whitespace().collect();

    if words.is_empty() {
        return VersionType::HeadingOnly;
    }
    if words.len() < HEADING_ONLY_MAX_WORDS && !words.iter().any(|w| ends_sentence(w)) {
        return VersionType::HeadingOnly;
    }

    if TITLE_RE.is_match(title) {
        return VersionType::Technical;
    }

    let digit_words = words
        .iter()
        .filter(|w| w.chars().any(|c| c.is_ascii_digit()))
        .count();
    if digit_words as f64 / words.len() as f64 > TECHNICAL_DIGIT_RATIO {
        return VersionType::Technical;
    }

    VersionType::Regular
}

// "3." numbers a heading; "done." ends a sentence.
fn ends_sentence(word: &str) -> bool {
    word.ends_with(['.', '!', '?']) && word.chars().any(char::is_alphabetic)
}

// --- tests -------------------------------------------------------------------

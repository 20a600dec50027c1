//! Placeholder scanning.
//!
//! A placeholder is the literal marker `{{key}}`. Matching is exact
//! substring equality on the whole marker: no trimming, no case folding,
//! and an unterminated `{{` never matches.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::model::{Document, Span};

pub const OPEN: &str = "{{";
pub const CLOSE: &str = "}}";

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{([^}]+)\}\}").expect("placeholder pattern is valid")
});

/// Builds the literal marker for `key`.
pub fn marker(key: &str) -> String {
    format!("{OPEN}{key}{CLOSE}")
}

/// One located marker in a paragraph's concatenated text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Occurrence<'k> {
    pub key: &'k str,
    pub span: Span,
}

/// Finds markers for a fixed set of candidate keys.
pub struct Scanner<'k> {
    markers: Vec<(&'k str, String)>,
}

impl<'k> Scanner<'k> {
    pub fn new(keys: impl IntoIterator<Item = &'k str>) -> Self {
        Self {
            markers: keys.into_iter().map(|k| (k, marker(k))).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    /// Returns the leftmost occurrence starting at or after byte `from`.
    ///
    /// When two keys match at the same offset the one listed first wins.
    pub fn find_next(&self, text: &str, from: usize) -> Option<Occurrence<'k>> {
        let haystack = text.get(from..)?;
        let mut best: Option<Occurrence<'k>> = None;
        for (key, marker) in &self.markers {
            let Some(at) = haystack.find(marker.as_str()) else {
                continue;
            };
            let start = from + at;
            if best.is_none_or(|b| start < b.span.start) {
                best = Some(Occurrence {
                    key: *key,
                    span: Span::new(start, start + marker.len()),
                });
            }
        }
        best
    }

    /// All non-overlapping occurrences, left to right.
    ///
    /// The spans are only valid against `text` as given; after one of them
    /// is substituted the rest must be found again.
    pub fn scan(&self, text: &str) -> Vec<Occurrence<'k>> {
        let mut found = Vec::new();
        let mut from = 0;
        while let Some(occurrence) = self.find_next(text, from) {
            from = occurrence.span.end;
            found.push(occurrence);
        }
        found
    }

    pub fn contains_any(&self, text: &str) -> bool {
        self.find_next(text, 0).is_some()
    }
}

/// Names of every `{{...}}` marker in `text`, whether or not any record
/// supplies it.
pub fn placeholder_names(text: &str) -> impl Iterator<Item = &str> {
    PLACEHOLDER
        .captures_iter(text)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str())
}

/// Sorted set of placeholder names used anywhere in `document`.
pub fn template_placeholders(document: &Document) -> BTreeSet<String> {
    let mut names = BTreeSet::new();
    document.for_each_paragraph(&mut |p| {
        names.extend(placeholder_names(&p.text()).map(str::to_string));
    });
    names
}

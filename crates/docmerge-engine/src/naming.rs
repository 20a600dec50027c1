//! Output naming for generated documents.

use std::collections::HashSet;

use crate::record::Record;

/// Field names tried, in order, when naming an output.
pub const DEFAULT_NAME_KEYS: &[&str] = &["name", "Name"];

/// Base name (no extension) for the document generated from `record`.
///
/// The first key of `name_keys` whose value is present and not blank
/// wins; otherwise the name is positional, `output_<index + 1>`.
pub fn output_name<S: AsRef<str>>(record: &Record, name_keys: &[S], index: usize) -> String {
    name_keys
        .iter()
        .filter_map(|key| record.get(key.as_ref()))
        .map(str::trim)
        .find(|value| !value.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("output_{}", index + 1))
}

/// Replaces characters that are not allowed in file names with `_`.
pub fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let cleaned = cleaned.trim().trim_end_matches('.');
    if cleaned.is_empty() {
        "_".to_string()
    } else {
        cleaned.to_string()
    }
}

/// Hands out file names that are unique within one batch.
///
/// Comparison ignores case so the names stay distinct on case-insensitive
/// file systems and inside archives.
#[derive(Debug, Default)]
pub struct UniqueNames {
    seen: HashSet<String>,
}

impl UniqueNames {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `stem.extension`, or `stem (n).extension` if taken.
    pub fn claim(&mut self, stem: &str, extension: &str) -> String {
        let stem = sanitize_file_name(stem);
        let mut candidate = format!("{stem}.{extension}");
        let mut n = 2;
        while !self.seen.insert(candidate.to_lowercase()) {
            candidate = format!("{stem} ({n}).{extension}");
            n += 1;
        }
        candidate
    }
}

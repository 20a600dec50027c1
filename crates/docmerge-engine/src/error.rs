/// Failures surfaced by the merge engine.
///
/// Substitution-level anomalies (a key with no value, a paragraph whose
/// runs can't anchor a placeholder) are not represented here: they leave
/// the text untouched instead of failing.
#[derive(Debug, thiserror::Error)]
pub enum MergeError {
    #[error("Malformed template: {reason}")]
    MalformedTemplate { reason: String },
    #[error("Record {} failed: {reason}", .index + 1)]
    Record {
        /// Zero-based position of the record in the input.
        index: usize,
        reason: String,
    },
    #[error("Duplicate field name: {0}")]
    DuplicateField(String),
    #[error("Unknown column: {0}")]
    UnknownColumn(String),
}

impl MergeError {
    pub fn malformed(reason: impl Into<String>) -> Self {
        MergeError::MalformedTemplate {
            reason: reason.into(),
        }
    }
}

pub mod error;
pub mod format;
pub mod io;
pub mod merge;
pub mod model;
pub mod naming;
pub mod record;
pub mod scan;
pub mod splice;
pub mod walk;

#[cfg(test)]
pub mod tests;

// Re-export key types for easier usage
pub use error::MergeError;
pub use format::{FontSize, Format};
pub use io::{
    IoError,
    docx::{DocxTemplate, TemplateSummary},
};
pub use merge::{Generated, MergeOptions, MergeReport, Merger, RecordOutcome, TemplateSource};
pub use model::{Block, Cell, Document, Paragraph, Row, Run, RunOrigin, SourceId, Span, Table};
pub use record::Record;
pub use walk::{WalkOptions, WalkStats, Walker};

//! Record-to-document driver.
//!
//! Each record is merged into its own fresh copy of the template, so
//! records share no mutable state and may be processed in any order or in
//! parallel. A failing record is reported in the [`MergeReport`] and the
//! batch carries on with the next one.

use std::borrow::Cow;

use crate::error::MergeError;
use crate::model::Document;
use crate::naming::{DEFAULT_NAME_KEYS, output_name};
use crate::record::Record;
use crate::walk::{WalkOptions, WalkStats, Walker};

/// Supplies independent copies of a template.
pub trait TemplateSource {
    /// Returns a copy that shares nothing mutable with the template or
    /// with copies handed out earlier.
    fn fresh_copy(&self) -> Result<Document, MergeError>;
}

impl TemplateSource for Document {
    fn fresh_copy(&self) -> Result<Document, MergeError> {
        Ok(self.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOptions {
    /// Field names tried in order when naming outputs.
    pub name_keys: Vec<String>,
    /// Restrict substitution to these fields; `None` uses every field.
    pub columns: Option<Vec<String>>,
    pub walk: WalkOptions,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            name_keys: DEFAULT_NAME_KEYS.iter().map(|k| k.to_string()).collect(),
            columns: None,
            walk: WalkOptions::default(),
        }
    }
}

/// A populated document for one record.
#[derive(Debug, Clone)]
pub struct Generated {
    /// Zero-based position of the record in the input.
    pub index: usize,
    /// Suggested base name, without extension.
    pub name: String,
    pub document: Document,
    pub stats: WalkStats,
}

/// What became of one record: a document, or a [`MergeError::Record`].
pub type RecordOutcome = Result<Generated, MergeError>;

/// Outcome of a batch, one entry per input record, in input order.
#[derive(Debug, Default)]
pub struct MergeReport {
    pub outcomes: Vec<RecordOutcome>,
}

impl MergeReport {
    pub fn generated(&self) -> impl Iterator<Item = &Generated> {
        self.outcomes.iter().filter_map(|o| o.as_ref().ok())
    }

    pub fn failures(&self) -> impl Iterator<Item = &MergeError> {
        self.outcomes.iter().filter_map(|o| o.as_ref().err())
    }

    pub fn succeeded(&self) -> usize {
        self.generated().count()
    }

    pub fn failed(&self) -> usize {
        self.failures().count()
    }

    pub fn into_generated(self) -> Vec<Generated> {
        self.outcomes.into_iter().filter_map(Result::ok).collect()
    }
}

pub struct Merger<'t, T: TemplateSource + ?Sized> {
    template: &'t T,
    options: MergeOptions,
}

impl<'t, T: TemplateSource + ?Sized> Merger<'t, T> {
    pub fn new(template: &'t T, options: MergeOptions) -> Self {
        Self { template, options }
    }

    pub fn options(&self) -> &MergeOptions {
        &self.options
    }

    /// Merges one record into a fresh copy of the template.
    pub fn generate(&self, index: usize, record: &Record) -> Result<Generated, MergeError> {
        let record = match &self.options.columns {
            Some(columns) => Cow::Owned(record.select(columns).map_err(|e| {
                MergeError::Record {
                    index,
                    reason: e.to_string(),
                }
            })?),
            None => Cow::Borrowed(record),
        };
        let mut document = self
            .template
            .fresh_copy()
            .map_err(|e| MergeError::Record {
                index,
                reason: e.to_string(),
            })?;

        let stats = Walker::new(&record, self.options.walk).walk(&mut document);
        let name = output_name(&record, &self.options.name_keys, index);
        log::debug!(
            "record {index} -> {name}: {} replaced, {} skipped, {} cell fallbacks",
            stats.replaced,
            stats.skipped,
            stats.cell_fallbacks
        );

        Ok(Generated {
            index,
            name,
            document,
            stats,
        })
    }

    /// Merges every record, in order. Never stops early.
    pub fn run<I>(&self, records: I) -> MergeReport
    where
        I: IntoIterator<Item = Record>,
    {
        let outcomes = records
            .into_iter()
            .enumerate()
            .map(|(index, record)| self.generate_logged(index, &record))
            .collect();
        let report = MergeReport { outcomes };
        log::info!(
            "merged {} record(s), {} failed",
            report.succeeded(),
            report.failed()
        );
        report
    }

    /// Like [`Merger::run`], spreading records over the rayon thread pool.
    /// Outcomes keep input order.
    #[cfg(feature = "parallel")]
    pub fn run_parallel(&self, records: &[Record]) -> MergeReport
    where
        T: Sync,
    {
        use rayon::prelude::*;

        let outcomes = records
            .par_iter()
            .enumerate()
            .map(|(index, record)| self.generate_logged(index, record))
            .collect();
        MergeReport { outcomes }
    }

    fn generate_logged(&self, index: usize, record: &Record) -> RecordOutcome {
        let outcome = self.generate(index, record);
        if let Err(e) = &outcome {
            log::warn!("{e}");
        }
        outcome
    }
}

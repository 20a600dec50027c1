//! Applies placeholder substitution across a whole document.

use crate::format::Format;
use crate::model::{Block, Cell, Document, Paragraph, Run, Table, concat_runs};
use crate::record::Record;
use crate::scan::Scanner;
use crate::splice::splice;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalkOptions {
    /// Rewrite a whole table cell when a placeholder only appears once the
    /// cell's paragraphs are concatenated.
    pub cell_fallback: bool,
}

impl Default for WalkOptions {
    fn default() -> Self {
        Self {
            cell_fallback: true,
        }
    }
}

/// Counters collected while walking one document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WalkStats {
    /// Occurrences replaced by run splicing.
    pub replaced: usize,
    /// Occurrences left verbatim because no anchor run could be found.
    pub skipped: usize,
    /// Cells rewritten wholesale by the cell fallback.
    pub cell_fallbacks: usize,
}

impl WalkStats {
    fn absorb(&mut self, other: WalkStats) {
        self.replaced += other.replaced;
        self.skipped += other.skipped;
        self.cell_fallbacks += other.cell_fallbacks;
    }
}

/// Substitutes one record's values into documents.
///
/// Paragraphs are independent. Within a paragraph occurrences are handled
/// left to right and the text is scanned again after every splice, since
/// each replacement shifts the offsets of everything after it. Scanning
/// resumes after the inserted value, so a value that itself looks like a
/// marker is never expanded.
pub struct Walker<'r> {
    record: &'r Record,
    scanner: Scanner<'r>,
    options: WalkOptions,
}

impl<'r> Walker<'r> {
    pub fn new(record: &'r Record, options: WalkOptions) -> Self {
        Self {
            record,
            scanner: Scanner::new(record.keys()),
            options,
        }
    }

    pub fn walk(&self, document: &mut Document) -> WalkStats {
        let mut stats = WalkStats::default();
        self.walk_blocks(&mut document.blocks, &mut stats);
        stats
    }

    /// Returns the rewritten runs, or `None` if nothing was replaced.
    pub fn substitute_runs(&self, runs: &[Run]) -> (Option<Vec<Run>>, WalkStats) {
        let mut stats = WalkStats::default();
        let mut current: Option<Vec<Run>> = None;
        let mut from = 0;
        loop {
            let runs_now = current.as_deref().unwrap_or(runs);
            let text = concat_runs(runs_now);
            let Some(occurrence) = self.scanner.find_next(&text, from) else {
                break;
            };
            let value = self.value_of(occurrence.key);
            match splice(runs_now, occurrence.span, value) {
                Some(next) => {
                    from = occurrence.span.start + value.len();
                    stats.replaced += 1;
                    current = Some(next);
                }
                None => {
                    log::debug!(
                        "no anchor run for {{{{{}}}}} at {}..{}, left unchanged",
                        occurrence.key,
                        occurrence.span.start,
                        occurrence.span.end
                    );
                    from = occurrence.span.end;
                    stats.skipped += 1;
                }
            }
        }
        (current, stats)
    }

    pub fn substitute_paragraph(&self, paragraph: &mut Paragraph) -> WalkStats {
        let (runs, stats) = self.substitute_runs(&paragraph.runs);
        if let Some(runs) = runs {
            paragraph.runs = runs;
        }
        stats
    }

    fn walk_blocks(&self, blocks: &mut [Block], stats: &mut WalkStats) {
        for block in blocks {
            match block {
                Block::Paragraph(p) => stats.absorb(self.substitute_paragraph(p)),
                Block::Table(table) => self.walk_table(table, stats),
            }
        }
    }

    fn walk_table(&self, table: &mut Table, stats: &mut WalkStats) {
        for cell in table.rows.iter_mut().flat_map(|r| r.cells.iter_mut()) {
            self.walk_cell(cell, stats);
        }
    }

    fn walk_cell(&self, cell: &mut Cell, stats: &mut WalkStats) {
        let mut own = WalkStats::default();
        for block in &mut cell.blocks {
            match block {
                Block::Paragraph(p) => own.absorb(self.substitute_paragraph(p)),
                Block::Table(table) => self.walk_table(table, stats),
            }
        }
        if self.options.cell_fallback && own.replaced == 0 && self.rewrite_cell(cell) {
            own.cell_fallbacks += 1;
        }
        stats.absorb(own);
    }

    /// Replaces the cell's whole text with its substituted aggregate text.
    ///
    /// The result is a single run in the cell's first paragraph carrying
    /// the format and origin of the cell's first run; the cell's other
    /// paragraphs are removed. Nested tables are kept.
    fn rewrite_cell(&self, cell: &mut Cell) -> bool {
        let aggregate = cell.aggregate_text();
        if !self.scanner.contains_any(&aggregate) {
            return false;
        }
        let text = self.replace_text(&aggregate);
        let format = cell.first_run().map(Format::snapshot).unwrap_or_default();
        let origin = cell.first_run().and_then(|run| run.origin);
        log::debug!("cell fallback rewrote {aggregate:?} as {text:?}");

        let mut first = true;
        cell.blocks.retain_mut(|block| match block {
            Block::Paragraph(p) if first => {
                first = false;
                p.runs = if text.is_empty() {
                    Vec::new()
                } else {
                    vec![Run {
                        origin,
                        ..Run::new(text.as_str(), format.clone())
                    }]
                };
                true
            }
            Block::Paragraph(_) => false,
            Block::Table(_) => true,
        });
        true
    }

    fn replace_text(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        let mut from = 0;
        while let Some(occurrence) = self.scanner.find_next(text, from) {
            out.push_str(&text[from..occurrence.span.start]);
            out.push_str(self.value_of(occurrence.key));
            from = occurrence.span.end;
        }
        out.push_str(&text[from..]);
        out
    }

    fn value_of(&self, key: &str) -> &'r str {
        self.record.get(key).unwrap_or_default()
    }
}

//! In-memory rich-text model the engine operates on.
//!
//! A [`Document`] is a sequence of blocks: paragraphs and tables. Table
//! cells hold blocks of their own, so tables nest. A [`Paragraph`] is an
//! ordered list of [`Run`]s; concatenating the run texts yields the
//! paragraph's visible text, and every offset in this crate is a byte
//! offset into that concatenation.

use crate::format::Format;

/// A byte range `[start, end)` into a paragraph's concatenated text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Span {
    /// Inclusive start byte offset.
    pub start: usize,
    /// Exclusive end byte offset.
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Returns the length in bytes. Uses saturating subtraction for safety.
    #[must_use]
    pub fn len(self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Returns true if the span is empty (start >= end).
    #[must_use]
    pub fn is_empty(self) -> bool {
        self.len() == 0
    }

    /// True if `offset` falls inside `[start, end)`.
    pub fn contains(self, offset: usize) -> bool {
        self.start <= offset && offset < self.end
    }
}

/// A contiguous piece of text sharing one format.
///
/// Equality compares text and format only; `origin` is bookkeeping for
/// serializers.
#[derive(Debug, Clone, Default)]
pub struct Run {
    pub text: String,
    pub format: Format,
    /// The template run this text was cut from, if any. Splicing copies it
    /// onto every fragment of that run.
    pub origin: Option<RunOrigin>,
}

impl Run {
    pub fn new(text: impl Into<String>, format: Format) -> Self {
        Self {
            text: text.into(),
            format,
            origin: None,
        }
    }

    /// A run that inherits every attribute.
    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(text, Format::default())
    }

    pub fn with_origin(mut self, origin: RunOrigin) -> Self {
        self.origin = Some(origin);
        self
    }
}

impl PartialEq for Run {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text && self.format == other.format
    }
}

impl Eq for Run {}

/// Handle assigned by a template source so a serializer can find the
/// original paragraph again after the engine has rewritten its runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceId(pub usize);

/// Position of a template run: its paragraph and its index among that
/// paragraph's runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RunOrigin {
    pub paragraph: SourceId,
    pub index: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Paragraph {
    pub runs: Vec<Run>,
    pub source: Option<SourceId>,
}

impl Paragraph {
    pub fn new(runs: Vec<Run>) -> Self {
        Self { runs, source: None }
    }

    pub fn with_source(mut self, source: SourceId) -> Self {
        self.source = Some(source);
        self
    }

    /// The paragraph's visible text: all run texts in order.
    pub fn text(&self) -> String {
        concat_runs(&self.runs)
    }

    /// Iterates runs together with their span in the concatenated text.
    pub fn run_spans(&self) -> RunSpans<'_> {
        run_spans(&self.runs)
    }
}

/// Concatenates run texts in order.
pub fn concat_runs(runs: &[Run]) -> String {
    let mut text = String::with_capacity(runs.iter().map(|r| r.text.len()).sum());
    for run in runs {
        text.push_str(&run.text);
    }
    text
}

/// Iterates `runs` together with each run's span in the concatenated text.
pub fn run_spans(runs: &[Run]) -> RunSpans<'_> {
    RunSpans {
        runs: runs.iter(),
        offset: 0,
    }
}

pub struct RunSpans<'a> {
    runs: std::slice::Iter<'a, Run>,
    offset: usize,
}

impl<'a> Iterator for RunSpans<'a> {
    type Item = (Span, &'a Run);

    fn next(&mut self) -> Option<Self::Item> {
        let run = self.runs.next()?;
        let start = self.offset;
        self.offset += run.text.len();
        Some((Span::new(start, self.offset), run))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Paragraph(Paragraph),
    Table(Table),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Table {
    pub rows: Vec<Row>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Row {
    pub cells: Vec<Cell>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Cell {
    pub blocks: Vec<Block>,
}

impl Cell {
    pub fn new(blocks: Vec<Block>) -> Self {
        Self { blocks }
    }

    /// The cell's own paragraphs, excluding those of nested tables.
    pub fn paragraphs(&self) -> impl Iterator<Item = &Paragraph> {
        self.blocks.iter().filter_map(|b| match b {
            Block::Paragraph(p) => Some(p),
            Block::Table(_) => None,
        })
    }

    /// All runs of the cell's own paragraphs concatenated, with no
    /// separator between paragraphs.
    pub fn aggregate_text(&self) -> String {
        self.paragraphs().map(Paragraph::text).collect()
    }

    /// The first run of the cell's own paragraphs, if any.
    pub fn first_run(&self) -> Option<&Run> {
        self.paragraphs().flat_map(|p| p.runs.iter()).next()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Document {
    pub blocks: Vec<Block>,
}

impl Document {
    pub fn new(blocks: Vec<Block>) -> Self {
        Self { blocks }
    }

    /// Number of top-level paragraphs (table contents excluded).
    pub fn paragraph_count(&self) -> usize {
        self.blocks
            .iter()
            .filter(|b| matches!(b, Block::Paragraph(_)))
            .count()
    }

    /// Number of top-level tables.
    pub fn table_count(&self) -> usize {
        self.blocks
            .iter()
            .filter(|b| matches!(b, Block::Table(_)))
            .count()
    }

    /// Visits every paragraph in document order, descending into table
    /// cells depth-first.
    pub fn for_each_paragraph<'a>(&'a self, f: &mut impl FnMut(&'a Paragraph)) {
        visit_blocks(&self.blocks, f);
    }

    /// Full visible text, one line per paragraph.
    pub fn text(&self) -> String {
        let mut lines = Vec::new();
        self.for_each_paragraph(&mut |p| lines.push(p.text()));
        lines.join("\n")
    }
}

fn visit_blocks<'a>(blocks: &'a [Block], f: &mut impl FnMut(&'a Paragraph)) {
    for block in blocks {
        match block {
            Block::Paragraph(p) => f(p),
            Block::Table(table) => {
                for cell in table.rows.iter().flat_map(|r| r.cells.iter()) {
                    visit_blocks(&cell.blocks, f);
                }
            }
        }
    }
}

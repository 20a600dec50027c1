//! Run splicing: replacing one placeholder occurrence inside a run list.
//!
//! The splice is a pure transformation `(runs, span, replacement) → runs`.
//! Given the span of a marker in the paragraph's concatenated text it
//! partitions every run into the part before the span and the part after
//! it, drops whatever lies inside, and inserts the replacement exactly
//! once, at the position of the *anchor run* (the run holding the
//! marker's first byte).
//!
//! The replacement takes the anchor run's format even when the marker's
//! later characters were formatted differently, so for
//! `["Hello {{na" (bold), "me}}!" (not bold)]` the value is bold and the
//! trailing `!` stays not bold. Text outside the span keeps the format of
//! the run it came from. Every fragment also keeps its run's `origin`,
//! and the replacement takes the anchor's, so a serializer can put each
//! piece back where its text came from. Empty fragments are never emitted.

use crate::format::Format;
use crate::model::{Run, RunOrigin, Span, run_spans};

/// Index of the run containing byte `offset`, skipping empty runs.
pub fn anchor_index(runs: &[Run], offset: usize) -> Option<usize> {
    run_spans(runs).position(|(sp, _)| sp.contains(offset))
}

/// Replaces the text covered by `span` with `replacement`.
///
/// Returns `None`, leaving the caller's runs untouched, when no run
/// contains `span.start` (empty paragraph, or a span past the end of the
/// text) or when `span` is inverted or extends beyond the text.
pub fn splice(runs: &[Run], span: Span, replacement: &str) -> Option<Vec<Run>> {
    let total: usize = runs.iter().map(|r| r.text.len()).sum();
    if span.start > span.end || span.end > total {
        return None;
    }
    let anchor = anchor_index(runs, span.start)?;
    let anchor_format = Format::snapshot(&runs[anchor]);
    let anchor_origin = runs[anchor].origin;

    let mut out = Vec::with_capacity(runs.len() + 2);
    for (i, (run_span, run)) in run_spans(runs).enumerate() {
        if run_span.start < span.start {
            let cut = span.start.min(run_span.end) - run_span.start;
            push_fragment(&mut out, &run.text[..cut], &run.format, run.origin);
        }
        if i == anchor {
            push_fragment(&mut out, replacement, &anchor_format, anchor_origin);
        }
        if run_span.end > span.end {
            let from = span.end.max(run_span.start) - run_span.start;
            push_fragment(&mut out, &run.text[from..], &run.format, run.origin);
        }
    }
    Some(out)
}

fn push_fragment(out: &mut Vec<Run>, text: &str, format: &Format, origin: Option<RunOrigin>) {
    if !text.is_empty() {
        out.push(Run {
            origin,
            ..Run::new(text, format.clone())
        });
    }
}

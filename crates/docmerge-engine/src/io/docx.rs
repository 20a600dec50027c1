//! WordprocessingML packages as a template source and an output sink.
//!
//! Only `word/document.xml` is interpreted. Every other part of the
//! package is carried through to the output byte for byte.
//!
//! A `w:r` element becomes a [`Run`] when all of its content is text:
//! `w:t`, `w:tab` and line breaks. Runs holding anything else (drawings,
//! field characters, footnote references, page breaks) stay in the XML
//! untouched and are invisible to the engine. When a paragraph comes back
//! changed, its text runs are regenerated: each model run goes back into
//! the slot of the template run it was cut from, with that run's `w:rPr`,
//! so opaque runs keep their place between the pieces of text around them.

use std::collections::{BTreeSet, HashMap};
use std::io::{Cursor, Read, Write};
use std::path::Path;

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use super::xml::{self, XmlDocument, XmlElement, XmlNode};
use super::{IoError, read_bytes, write_bytes};
use crate::error::MergeError;
use crate::format::{FontSize, Format};
use crate::merge::TemplateSource;
use crate::model::{Block, Cell, Document, Paragraph, Row, Run, RunOrigin, SourceId, Table};
use crate::scan::template_placeholders;

pub const DOCUMENT_PART: &str = "word/document.xml";

/// A loaded `.docx` template.
#[derive(Debug, Clone)]
pub struct DocxTemplate {
    parts: Vec<(String, Vec<u8>)>,
    xml: XmlDocument,
    model: Document,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateSummary {
    pub paragraphs: usize,
    pub tables: usize,
    pub placeholders: BTreeSet<String>,
}

impl DocxTemplate {
    pub fn open(path: &Path) -> Result<Self, IoError> {
        let bytes = read_bytes(path)?;
        log::debug!("Loaded template {} ({} bytes)", path.display(), bytes.len());
        Ok(Self::from_bytes(&bytes)?)
    }

    /// Any failure to read the package is reported as a malformed template.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, MergeError> {
        let parts = read_parts(bytes)
            .map_err(|e| MergeError::malformed(format!("not a readable package: {e}")))?;
        let (_, document_xml) = parts
            .iter()
            .find(|(name, _)| name == DOCUMENT_PART)
            .ok_or_else(|| MergeError::malformed(format!("missing {DOCUMENT_PART}")))?;
        let xml = xml::parse(document_xml)
            .map_err(|e| MergeError::malformed(format!("{DOCUMENT_PART}: {e}")))?;
        let body = xml
            .root
            .child("w:body")
            .ok_or_else(|| MergeError::malformed("document has no w:body"))?;

        let mut next = 0;
        let model = Document::new(read_blocks(body, &mut next));
        Ok(Self { parts, xml, model })
    }

    /// A deep copy of the template's model; the template itself is never
    /// mutated.
    pub fn document(&self) -> Document {
        self.model.clone()
    }

    pub fn summary(&self) -> TemplateSummary {
        TemplateSummary {
            paragraphs: self.model.paragraph_count(),
            tables: self.model.table_count(),
            placeholders: template_placeholders(&self.model),
        }
    }

    /// Serialize `document` back into a package shaped like the template.
    ///
    /// Paragraphs are matched to the template by their [`SourceId`].
    /// Template paragraphs with no counterpart in `document` are dropped.
    pub fn render(&self, document: &Document) -> Result<Vec<u8>, IoError> {
        let mut index = HashMap::new();
        index_paragraphs(&document.blocks, &mut index);

        let mut xml = self.xml.clone();
        let body = xml
            .root
            .child_mut("w:body")
            .ok_or_else(|| MergeError::malformed("document has no w:body"))?;
        let mut next = 0;
        rewrite_blocks(body, &mut next, &index);
        let document_xml = xml::write(&xml)?;

        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, data) in &self.parts {
            let options =
                SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
            writer.start_file(name.as_str(), options)?;
            if name == DOCUMENT_PART {
                writer.write_all(&document_xml)?;
            } else {
                writer.write_all(data)?;
            }
        }
        Ok(writer.finish()?.into_inner())
    }

    pub fn save(&self, document: &Document, path: &Path) -> Result<(), IoError> {
        write_bytes(path, &self.render(document)?)
    }
}

impl TemplateSource for DocxTemplate {
    fn fresh_copy(&self) -> Result<Document, MergeError> {
        Ok(self.document())
    }
}

fn read_parts(bytes: &[u8]) -> Result<Vec<(String, Vec<u8>)>, IoError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    let mut parts = Vec::with_capacity(archive.len());
    for i in 0..archive.len() {
        let mut file = archive.by_index(i)?;
        if file.is_dir() {
            continue;
        }
        let mut data = Vec::new();
        file.read_to_end(&mut data)?;
        parts.push((file.name().to_string(), data));
    }
    Ok(parts)
}

// Reading. `next` numbers paragraphs in document order; rewriting walks
// the XML in the same order so the numbers line up.

fn read_blocks(parent: &XmlElement, next: &mut usize) -> Vec<Block> {
    let mut blocks = Vec::new();
    for element in parent.elements() {
        if element.is("w:p") {
            let id = SourceId(*next);
            *next += 1;
            let runs = read_runs(element)
                .into_iter()
                .enumerate()
                .map(|(index, run)| {
                    run.with_origin(RunOrigin {
                        paragraph: id,
                        index,
                    })
                })
                .collect();
            blocks.push(Block::Paragraph(Paragraph::new(runs).with_source(id)));
        } else if element.is("w:tbl") {
            blocks.push(Block::Table(read_table(element, next)));
        }
    }
    blocks
}

fn read_table(tbl: &XmlElement, next: &mut usize) -> Table {
    let rows = tbl
        .elements()
        .filter(|e| e.is("w:tr"))
        .map(|tr| Row {
            cells: tr
                .elements()
                .filter(|e| e.is("w:tc"))
                .map(|tc| Cell::new(read_blocks(tc, next)))
                .collect(),
        })
        .collect();
    Table { rows }
}

/// The text runs of a `w:p`, in order.
pub fn read_runs(p: &XmlElement) -> Vec<Run> {
    p.elements()
        .filter(|e| e.is("w:r"))
        .filter_map(read_run)
        .collect()
}

/// `None` if the run holds anything besides text.
pub fn read_run(r: &XmlElement) -> Option<Run> {
    let mut text = String::new();
    let mut format = Format::default();
    for child in r.elements() {
        match child.name.as_str() {
            "w:rPr" => format = read_format(child),
            "w:t" => text.push_str(&child.text()),
            "w:tab" => text.push('\t'),
            "w:br" if child.attr("w:type").is_none_or(|t| t == "textWrapping") => {
                text.push('\n')
            }
            "w:cr" => text.push('\n'),
            "w:lastRenderedPageBreak" => {}
            _ => return None,
        }
    }
    Some(Run::new(text, format))
}

pub fn read_format(rpr: &XmlElement) -> Format {
    let mut format = Format::default();
    for prop in rpr.elements() {
        match prop.name.as_str() {
            "w:rFonts" => {
                format.font_name = ["w:ascii", "w:hAnsi", "w:eastAsia", "w:cs"]
                    .iter()
                    .find_map(|key| prop.attr(key))
                    .map(str::to_string);
            }
            "w:sz" => {
                format.font_size = prop
                    .attr("w:val")
                    .and_then(|v| v.parse().ok())
                    .map(FontSize::from_half_points);
            }
            "w:b" => format.bold = Some(toggle(prop)),
            "w:i" => format.italic = Some(toggle(prop)),
            "w:u" => format.underline = Some(prop.attr("w:val").unwrap_or("single").to_string()),
            "w:color" => format.color = prop.attr("w:val").map(str::to_string),
            "w:highlight" => format.highlight = prop.attr("w:val").map(str::to_string),
            _ => {}
        }
    }
    format
}

fn toggle(prop: &XmlElement) -> bool {
    !matches!(prop.attr("w:val"), Some("0" | "false" | "off"))
}

// Writing.

/// A `w:rPr` for `format`, properties in schema order. `None` when every
/// attribute is inherited.
pub fn format_element(format: &Format) -> Option<XmlElement> {
    if format.is_inherited() {
        return None;
    }
    let mut rpr = XmlElement::new("w:rPr");
    if let Some(name) = &format.font_name {
        rpr = rpr.with_child(
            XmlElement::new("w:rFonts")
                .with_attr("w:ascii", name)
                .with_attr("w:hAnsi", name)
                .with_attr("w:cs", name),
        );
    }
    if let Some(bold) = format.bold {
        rpr = rpr.with_child(toggle_element("w:b", bold));
    }
    if let Some(italic) = format.italic {
        rpr = rpr.with_child(toggle_element("w:i", italic));
    }
    if let Some(color) = &format.color {
        rpr = rpr.with_child(XmlElement::new("w:color").with_attr("w:val", color));
    }
    if let Some(size) = format.font_size {
        rpr = rpr.with_child(
            XmlElement::new("w:sz").with_attr("w:val", size.half_points().to_string()),
        );
    }
    if let Some(highlight) = &format.highlight {
        rpr = rpr.with_child(XmlElement::new("w:highlight").with_attr("w:val", highlight));
    }
    if let Some(underline) = &format.underline {
        rpr = rpr.with_child(XmlElement::new("w:u").with_attr("w:val", underline));
    }
    Some(rpr)
}

fn toggle_element(name: &str, on: bool) -> XmlElement {
    let element = XmlElement::new(name);
    if on {
        element
    } else {
        element.with_attr("w:val", "0")
    }
}

/// A `w:r` carrying `text`; tabs and newlines become `w:tab` and `w:br`.
pub fn run_element(text: &str, rpr: Option<XmlElement>) -> XmlElement {
    let mut r = XmlElement::new("w:r");
    if let Some(rpr) = rpr {
        r = r.with_child(rpr);
    }
    let mut pending = String::new();
    for c in text.chars() {
        match c {
            '\t' | '\n' => {
                flush_text(&mut r, &mut pending);
                let name = if c == '\t' { "w:tab" } else { "w:br" };
                r.children.push(XmlNode::Element(XmlElement::new(name)));
            }
            _ => pending.push(c),
        }
    }
    flush_text(&mut r, &mut pending);
    r
}

fn flush_text(r: &mut XmlElement, pending: &mut String) {
    if pending.is_empty() {
        return;
    }
    let t = XmlElement::new("w:t")
        .with_attr("xml:space", "preserve")
        .with_text(std::mem::take(pending));
    r.children.push(XmlNode::Element(t));
}

fn index_paragraphs<'a>(blocks: &'a [Block], index: &mut HashMap<SourceId, &'a Paragraph>) {
    for block in blocks {
        match block {
            Block::Paragraph(p) => {
                if let Some(id) = p.source {
                    index.insert(id, p);
                }
            }
            Block::Table(table) => {
                for cell in table.rows.iter().flat_map(|row| &row.cells) {
                    index_paragraphs(&cell.blocks, index);
                }
            }
        }
    }
}

fn rewrite_blocks(
    parent: &mut XmlElement,
    next: &mut usize,
    index: &HashMap<SourceId, &Paragraph>,
) {
    parent.children.retain_mut(|node| {
        let XmlNode::Element(element) = node else {
            return true;
        };
        if element.is("w:p") {
            let id = SourceId(*next);
            *next += 1;
            match index.get(&id) {
                Some(paragraph) => {
                    rewrite_paragraph(element, paragraph);
                    true
                }
                None => false,
            }
        } else {
            if element.is("w:tbl") {
                for tr in element.elements_mut().filter(|e| e.is("w:tr")) {
                    for tc in tr.elements_mut().filter(|e| e.is("w:tc")) {
                        rewrite_blocks(tc, next, index);
                    }
                }
            }
            true
        }
    });
}

fn rewrite_paragraph(p: &mut XmlElement, paragraph: &Paragraph) {
    if read_runs(p) == paragraph.runs {
        return;
    }

    // `None` marks the slot of a template text run; `rprs` holds that
    // run's properties.
    let mut layout: Vec<Option<XmlNode>> = Vec::with_capacity(p.children.len());
    let mut rprs: Vec<Option<XmlElement>> = Vec::new();
    for node in p.children.drain(..) {
        match node {
            XmlNode::Element(r) if r.is("w:r") && read_run(&r).is_some() => {
                rprs.push(r.child("w:rPr").cloned());
                layout.push(None);
            }
            node => layout.push(Some(node)),
        }
    }

    let mut placed: Vec<Vec<XmlElement>> = vec![Vec::new(); rprs.len()];
    let mut trailing = Vec::new();
    let mut slot = 0;
    for (origin, run) in coalesce(paragraph, rprs.len()) {
        let rpr = match origin {
            Some(index) => {
                slot = slot.max(index);
                source_rpr(rprs[index].as_ref(), &run.format)
            }
            None => format_element(&run.format),
        };
        let element = run_element(&run.text, rpr);
        match placed.get_mut(slot) {
            Some(runs) => runs.push(element),
            // A paragraph that had no text runs gets the new ones at the end.
            None => trailing.push(element),
        }
    }

    let mut placed = placed.into_iter();
    for node in layout {
        match node {
            Some(node) => p.children.push(node),
            None => p
                .children
                .extend(placed.next().into_iter().flatten().map(XmlNode::Element)),
        }
    }
    p.children.extend(trailing.into_iter().map(XmlNode::Element));
}

/// The paragraph's runs paired with the index of the template text run
/// each came from. Neighbours cut from the same run with the same format
/// are joined back together.
fn coalesce(paragraph: &Paragraph, slots: usize) -> Vec<(Option<usize>, Run)> {
    let mut out: Vec<(Option<usize>, Run)> = Vec::with_capacity(paragraph.runs.len());
    for run in &paragraph.runs {
        let origin = run
            .origin
            .filter(|o| Some(o.paragraph) == paragraph.source && o.index < slots)
            .map(|o| o.index);
        if let Some((last_origin, last)) = out.last_mut()
            && origin.is_some()
            && *last_origin == origin
            && last.format == run.format
        {
            last.text.push_str(&run.text);
            continue;
        }
        out.push((origin, run.clone()));
    }
    out
}

/// The template run's own `w:rPr` when it still describes `format`, so
/// properties outside the model (styles, language, spacing) survive.
fn source_rpr(rpr: Option<&XmlElement>, format: &Format) -> Option<XmlElement> {
    match rpr {
        Some(rpr) if read_format(rpr) == *format => Some(rpr.clone()),
        _ => format_element(format),
    }
}

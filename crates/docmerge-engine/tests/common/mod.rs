// Helpers shared by the integration tests. Not every test file uses every
// helper, hence the dead_code allowances.
use std::io::{Cursor, Read, Write};

use docmerge_engine::{Block, Document, Run};
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#;

const RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

/// A `.docx` whose `word/document.xml` is `tests/fixtures/<name>.xml`.
#[allow(dead_code)]
pub fn fixture_docx(name: &str) -> Vec<u8> {
    let document = std::fs::read_to_string(format!(
        "{}/tests/fixtures/{name}.xml",
        env!("CARGO_MANIFEST_DIR")
    ))
    .unwrap();
    package(&[
        ("[Content_Types].xml", CONTENT_TYPES),
        ("_rels/.rels", RELS),
        ("word/document.xml", &document),
    ])
}

#[allow(dead_code)]
pub fn package(parts: &[(&str, &str)]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, content) in parts {
        writer
            .start_file(*name, SimpleFileOptions::default())
            .unwrap();
        writer.write_all(content.as_bytes()).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

/// Names and contents of every entry in a zip, in archive order.
#[allow(dead_code)]
pub fn entries(bytes: &[u8]) -> Vec<(String, Vec<u8>)> {
    let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
    (0..archive.len())
        .map(|i| {
            let mut file = archive.by_index(i).unwrap();
            let mut content = Vec::new();
            file.read_to_end(&mut content).unwrap();
            (file.name().to_string(), content)
        })
        .collect()
}

#[allow(dead_code)]
pub fn part(bytes: &[u8], name: &str) -> String {
    let (_, content) = entries(bytes)
        .into_iter()
        .find(|(n, _)| n == name)
        .unwrap();
    String::from_utf8(content).unwrap()
}

/// Every paragraph in document order, one line per run, blank line
/// between paragraphs.
#[allow(dead_code)]
pub fn describe(document: &Document) -> String {
    let mut paragraphs = Vec::new();
    document.for_each_paragraph(&mut |p| paragraphs.push(describe_runs(&p.runs)));
    paragraphs.join("\n\n")
}

#[allow(dead_code)]
pub fn describe_runs(runs: &[Run]) -> String {
    if runs.is_empty() {
        return "(empty)".to_string();
    }
    runs.iter()
        .map(|r| format!("{:?} {}", r.text, r.format))
        .collect::<Vec<_>>()
        .join("\n")
}

#[allow(dead_code)]
pub fn top_level_paragraph(document: &Document, index: usize) -> &[Run] {
    let mut paragraphs = document.blocks.iter().filter_map(|b| match b {
        Block::Paragraph(p) => Some(p.runs.as_slice()),
        Block::Table(_) => None,
    });
    paragraphs.nth(index).unwrap()
}

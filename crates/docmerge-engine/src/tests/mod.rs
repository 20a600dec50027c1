//! Shared helpers for unit tests.

use std::io::{Cursor, Write};

use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::format::Format;
use crate::model::{Block, Cell, Paragraph, Row, Run, Table};

pub fn plain(text: &str) -> Run {
    Run::plain(text)
}

pub fn bold(text: &str) -> Run {
    Run::new(text, Format::default().with_bold(true))
}

pub fn not_bold(text: &str) -> Run {
    Run::new(text, Format::default().with_bold(false))
}

pub fn paragraph(runs: Vec<Run>) -> Paragraph {
    Paragraph::new(runs)
}

pub fn table(rows: Vec<Vec<Cell>>) -> Block {
    Block::Table(Table {
        rows: rows.into_iter().map(|cells| Row { cells }).collect(),
    })
}

pub fn cell_of(paragraphs: Vec<Vec<Run>>) -> Cell {
    Cell::new(
        paragraphs
            .into_iter()
            .map(|runs| Block::Paragraph(Paragraph::new(runs)))
            .collect(),
    )
}

/// One line per run: the quoted text followed by its format.
pub fn describe(runs: &[Run]) -> String {
    runs.iter()
        .map(|r| format!("{:?} {}", r.text, r.format))
        .collect::<Vec<_>>()
        .join("\n")
}

/// A zip package holding the given `(name, content)` parts.
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

/// A minimal `.docx` whose body is `body`.
pub fn docx_bytes(body: &str) -> Vec<u8> {
    let document = format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">"#,
            "<w:body>{}</w:body></w:document>",
        ),
        body
    );
    package(&[
        ("[Content_Types].xml", CONTENT_TYPES),
        ("_rels/.rels", RELS),
        ("word/document.xml", &document),
    ])
}

const CONTENT_TYPES: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
    r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#,
    r#"<Default Extension="xml" ContentType="application/xml"/>"#,
    r#"<Override PartName="/word/document.xml" "#,
    r#"ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>"#,
    "</Types>",
);

const RELS: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    r#"<Relationship Id="rId1" "#,
    r#"Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" "#,
    r#"Target="word/document.xml"/>"#,
    "</Relationships>",
);

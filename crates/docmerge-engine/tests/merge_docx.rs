use docmerge_engine::io::{archive, docx::DOCUMENT_PART, records};
use docmerge_engine::naming::UniqueNames;
use docmerge_engine::{
    DocxTemplate, FontSize, Format, MergeError, MergeOptions, Merger, Record, Run, WalkOptions,
};
use pretty_assertions::assert_eq;

mod common;

fn record(pairs: &[(&str, &str)]) -> Record {
    Record::from_pairs(pairs.iter().copied()).unwrap()
}

/// Merge one record and read the rendered package back in.
fn merge_and_reopen(template: &DocxTemplate, record: &Record) -> (Vec<u8>, DocxTemplate) {
    let merger = Merger::new(template, MergeOptions::default());
    let generated = merger.generate(0, record).unwrap();
    let bytes = template.render(&generated.document).unwrap();
    let reopened = DocxTemplate::from_bytes(&bytes).unwrap();
    (bytes, reopened)
}

#[test]
fn letter_keeps_formatting_around_replacements() {
    let template = DocxTemplate::from_bytes(&common::fixture_docx("letter")).unwrap();

    let (bytes, reopened) =
        merge_and_reopen(&template, &record(&[("name", "Ada"), ("city", "Paris")]));

    insta::assert_snapshot!(common::describe(&reopened.document()), @r#"
    "Dear Ada" {size=16pt,bold}
    "," {}

    "Your order ships to " {}
    "Paris" {italic}
    "." {}

    "{{unknown}} stays as it is." {}
    "#);
    let xml = common::part(&bytes, DOCUMENT_PART);
    assert!(xml.contains(r#"<w:pStyle w:val="Title"/>"#));
    assert!(xml.contains("<w:sectPr/>"));
}

#[test]
fn invoice_tables_nested_cells_and_fallback() {
    let template = DocxTemplate::from_bytes(&common::fixture_docx("invoice")).unwrap();
    let rec = record(&[
        ("company", "Acme & Sons"),
        ("date", "2024-03-01"),
        ("amount", "€1,200"),
        ("ref", "R-7"),
        ("paid", "yes"),
    ]);

    let (bytes, reopened) = merge_and_reopen(&template, &rec);

    insta::assert_snapshot!(common::describe(&reopened.document()), @r#"
    "Invoice for Acme & Sons" {font=Arial,color=1F3864}
    "\t2024-03-01" {}

    "Amount" {bold}

    "€1,200" {highlight=yellow}

    "Ref R-7" {}

    (empty)

    "Paid: yes" {}

    (empty)
    "#);
    let xml = common::part(&bytes, DOCUMENT_PART);
    assert!(xml.contains(r#"<w:tblStyle w:val="TableGrid"/>"#));
    assert!(xml.contains(r#"<w:tcW w:w="2000" w:type="dxa"/>"#));
    assert!(xml.find("<w:drawing/>").unwrap() < xml.find("Paid: yes").unwrap());
    assert!(!xml.contains("unt}}"));
}

#[test]
fn generation_statistics() {
    let template = DocxTemplate::from_bytes(&common::fixture_docx("invoice")).unwrap();
    let merger = Merger::new(&template, MergeOptions::default());

    let generated = merger
        .generate(
            0,
            &record(&[("company", "A"), ("amount", "1"), ("paid", "no")]),
        )
        .unwrap();

    assert_eq!(generated.stats.replaced, 2);
    assert_eq!(generated.stats.cell_fallbacks, 1);
    assert_eq!(generated.stats.skipped, 0);
}

#[test]
fn disabled_cell_fallback_leaves_split_cell_text() {
    let template = DocxTemplate::from_bytes(&common::fixture_docx("invoice")).unwrap();
    let options = MergeOptions {
        walk: WalkOptions {
            cell_fallback: false,
        },
        ..MergeOptions::default()
    };
    let merger = Merger::new(&template, options);

    let generated = merger
        .generate(0, &record(&[("amount", "1")]))
        .unwrap();
    let bytes = template.render(&generated.document).unwrap();

    let xml = common::part(&bytes, DOCUMENT_PART);
    assert!(xml.contains("{{amo"));
    assert!(xml.contains("unt}}"));
}

#[test]
fn placeholder_like_values_are_not_expanded() {
    let template = DocxTemplate::from_bytes(&common::fixture_docx("letter")).unwrap();

    let (_, reopened) =
        merge_and_reopen(&template, &record(&[("name", "{{city}}"), ("city", "Paris")]));

    let heading = Format::default()
        .with_size(FontSize::from_points(16))
        .with_bold(true);
    let document = reopened.document();
    assert_eq!(
        common::top_level_paragraph(&document, 0),
        [
            Run::new("Dear {{city}}", heading),
            Run::new(",", Format::default()),
        ]
    );
}

#[test]
fn summary_of_fixture_templates() {
    let letter = DocxTemplate::from_bytes(&common::fixture_docx("letter")).unwrap();
    let invoice = DocxTemplate::from_bytes(&common::fixture_docx("invoice")).unwrap();

    let letter = letter.summary();
    let invoice = invoice.summary();

    assert_eq!(letter.paragraphs, 3);
    assert_eq!(letter.tables, 0);
    assert_eq!(
        letter.placeholders.iter().collect::<Vec<_>>(),
        ["city", "name", "unknown"]
    );
    assert_eq!(invoice.paragraphs, 2);
    assert_eq!(invoice.tables, 1);
    assert_eq!(
        invoice.placeholders.iter().collect::<Vec<_>>(),
        ["amount", "company", "date", "paid", "ref"]
    );
}

#[test]
fn csv_batch_into_archive() {
    let template = DocxTemplate::from_bytes(&common::fixture_docx("letter")).unwrap();
    let data = "name,city\nAda,Paris\n,Rome\nAda,Oslo\n";
    let records = records::parse_csv(data.as_bytes()).unwrap();
    let merger = Merger::new(&template, MergeOptions::default());

    let report = merger.run(records);

    let mut names = UniqueNames::new();
    let outputs: Vec<(String, Vec<u8>)> = report
        .generated()
        .map(|g| {
            (
                names.claim(&g.name, "docx"),
                template.render(&g.document).unwrap(),
            )
        })
        .collect();
    let bytes = archive::write_zip(
        outputs
            .iter()
            .map(|(name, content)| (name.as_str(), content.as_slice())),
    )
    .unwrap();

    let entries = common::entries(&bytes);
    let entry_names: Vec<_> = entries.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(entry_names, ["Ada.docx", "output_2.docx", "Ada (2).docx"]);
    let third = DocxTemplate::from_bytes(&entries[2].1).unwrap();
    assert!(third.document().text().contains("ships to Oslo."));
}

#[test]
fn broken_templates_are_rejected_before_any_record() {
    let no_document = common::package(&[("word/styles.xml", "<w:styles/>")]);

    let result = DocxTemplate::from_bytes(&no_document);

    assert!(matches!(result, Err(MergeError::MalformedTemplate { .. })));
}

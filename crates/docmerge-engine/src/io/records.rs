//! Record sources: CSV files and the first sheet of a workbook.
//!
//! Both sources share the same table shape. The first row names the
//! fields and every following row with at least one non-empty cell
//! becomes a [`Record`] in column order.

use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

use calamine::{Data, DataType, Reader, open_workbook_auto};
use chrono::{NaiveDateTime, NaiveTime};

use super::{IoError, read_bytes};
use crate::error::MergeError;
use crate::record::Record;

const SPREADSHEET_EXTENSIONS: [&str; 5] = ["xlsx", "xlsm", "xlsb", "xls", "ods"];

/// Read records from `path`, choosing the reader by file extension.
pub fn read_records(path: &Path) -> Result<Vec<Record>, IoError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    let records = match extension.as_str() {
        "csv" => read_csv(path)?,
        ext if SPREADSHEET_EXTENSIONS.contains(&ext) => read_spreadsheet(path)?,
        _ => return Err(IoError::UnsupportedFormat(path.to_path_buf())),
    };
    log::info!("Read {} records from {}", records.len(), path.display());
    Ok(records)
}

pub fn read_csv(path: &Path) -> Result<Vec<Record>, IoError> {
    let bytes = read_bytes(path)?;
    parse_csv(bytes.as_slice())
}

pub fn parse_csv<R: Read>(input: R) -> Result<Vec<Record>, IoError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(input);
    let mut rows = Vec::new();
    for row in reader.records() {
        let row = row?;
        rows.push(row.iter().map(str::to_string).collect());
    }
    Ok(records_from_rows(rows)?)
}

pub fn read_spreadsheet(path: &Path) -> Result<Vec<Record>, IoError> {
    if !path.exists() {
        return Err(IoError::NotFound(path.to_path_buf()));
    }
    let spreadsheet_error = |reason: String| IoError::Spreadsheet {
        path: path.to_path_buf(),
        reason,
    };

    let mut workbook = open_workbook_auto(path).map_err(|e| spreadsheet_error(e.to_string()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| spreadsheet_error("workbook has no sheets".to_string()))?
        .map_err(|e| spreadsheet_error(e.to_string()))?;

    let rows = range
        .rows()
        .map(|row| row.iter().map(display_value).collect())
        .collect();
    Ok(records_from_rows(rows)?)
}

/// The text a spreadsheet application would show for `cell`.
pub fn display_value(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => display_float(*f),
        Data::Bool(true) => "TRUE".to_string(),
        Data::Bool(false) => "FALSE".to_string(),
        Data::DateTime(dt) => cell
            .as_datetime()
            .map(display_datetime)
            .unwrap_or_else(|| display_float(dt.as_f64())),
        Data::DateTimeIso(s) => cell
            .as_datetime()
            .map(display_datetime)
            .unwrap_or_else(|| s.clone()),
        Data::DurationIso(s) => s.clone(),
        Data::Error(e) => e.to_string(),
    }
}

fn display_float(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        (value as i64).to_string()
    } else {
        value.to_string()
    }
}

fn display_datetime(value: NaiveDateTime) -> String {
    if value.time() == NaiveTime::MIN {
        value.format("%Y-%m-%d").to_string()
    } else {
        value.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

/// Turn a header row plus data rows into records.
///
/// Blank header cells become `Unnamed: <index>`; a repeated name gets a
/// `.1`, `.2`, ... suffix. Short rows are padded with empty values and
/// cells past the last header are dropped.
pub fn records_from_rows(rows: Vec<Vec<String>>) -> Result<Vec<Record>, MergeError> {
    let mut rows = rows.into_iter();
    let Some(header) = rows.next() else {
        return Ok(Vec::new());
    };
    let names = header_names(header);

    rows.filter(|row| row.iter().any(|cell| !cell.trim().is_empty()))
        .map(|row| {
            let mut cells = row.into_iter();
            Record::from_pairs(
                names
                    .iter()
                    .map(|name| (name.clone(), cells.next().unwrap_or_default())),
            )
        })
        .collect()
}

fn header_names(header: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut names = Vec::with_capacity(header.len());
    for (i, cell) in header.into_iter().enumerate() {
        let base = match cell.trim_start_matches('\u{feff}').trim() {
            "" => format!("Unnamed: {i}"),
            name => name.to_string(),
        };
        let mut name = base.clone();
        let mut n = 1;
        while !seen.insert(name.clone()) {
            name = format!("{base}.{n}");
            n += 1;
        }
        names.push(name);
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use std::fs;
    use tempfile::TempDir;

    fn rows(source: &[&[&str]]) -> Vec<Vec<String>> {
        source
            .iter()
            .map(|row| row.iter().map(|c| c.to_string()).collect())
            .collect()
    }

    fn pairs(record: &Record) -> Vec<(&str, &str)> {
        record.iter().collect()
    }

    #[test]
    fn test_parse_csv_in_column_order() {
        let input = "name,city\nAda,London\nGrace,Arlington\n";

        let records = parse_csv(input.as_bytes()).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(pairs(&records[0]), [("name", "Ada"), ("city", "London")]);
        assert_eq!(
            pairs(&records[1]),
            [("name", "Grace"), ("city", "Arlington")]
        );
    }

    #[test]
    fn test_parse_csv_pads_short_rows_and_skips_blank_ones() {
        let input = "name,city,zip\nAda\n,,\n\nGrace,Arlington,22201,extra\n";

        let records = parse_csv(input.as_bytes()).unwrap();

        assert_eq!(
            pairs(&records[0]),
            [("name", "Ada"), ("city", ""), ("zip", "")]
        );
        assert_eq!(
            pairs(&records[1]),
            [("name", "Grace"), ("city", "Arlington"), ("zip", "22201")]
        );
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_parse_csv_strips_byte_order_mark() {
        let input = "\u{feff}name\nAda\n";

        let records = parse_csv(input.as_bytes()).unwrap();

        assert_eq!(records[0].get("name"), Some("Ada"));
    }

    #[test]
    fn test_parse_csv_quoted_fields() {
        let input = "name,address\n\"Lovelace, Ada\",\"1 \"\"Main\"\" St\"\n";

        let records = parse_csv(input.as_bytes()).unwrap();

        assert_eq!(records[0].get("name"), Some("Lovelace, Ada"));
        assert_eq!(records[0].get("address"), Some("1 \"Main\" St"));
    }

    #[test]
    fn test_header_only_gives_no_records() {
        assert!(parse_csv("name,city\n".as_bytes()).unwrap().is_empty());
        assert!(parse_csv("".as_bytes()).unwrap().is_empty());
    }

    #[test]
    fn test_blank_and_repeated_headers() {
        let records = records_from_rows(rows(&[
            &["name", "", "name", "name", " "],
            &["a", "b", "c", "d", "e"],
        ]))
        .unwrap();

        let keys: Vec<_> = records[0].keys().collect();
        assert_eq!(keys, ["name", "Unnamed: 1", "name.1", "name.2", "Unnamed: 4"]);
    }

    #[rstest]
    #[case::empty(Data::Empty, "")]
    #[case::string(Data::String("Ada".to_string()), "Ada")]
    #[case::int(Data::Int(42), "42")]
    #[case::integral_float(Data::Float(42.0), "42")]
    #[case::negative_integral_float(Data::Float(-3.0), "-3")]
    #[case::fractional_float(Data::Float(2.5), "2.5")]
    #[case::bool_true(Data::Bool(true), "TRUE")]
    #[case::bool_false(Data::Bool(false), "FALSE")]
    #[case::iso_date(Data::DateTimeIso("2024-03-01T00:00:00".to_string()), "2024-03-01")]
    #[case::iso_datetime(
        Data::DateTimeIso("2024-03-01T09:30:05".to_string()),
        "2024-03-01 09:30:05"
    )]
    #[case::iso_unparseable(Data::DateTimeIso("March".to_string()), "March")]
    fn test_display_value(#[case] cell: Data, #[case] expected: &str) {
        assert_eq!(display_value(&cell), expected);
    }

    #[test]
    fn test_read_records_dispatches_on_extension() {
        let dir = TempDir::new().unwrap();
        let csv = dir.path().join("people.CSV");
        fs::write(&csv, "name\nAda\n").unwrap();
        let text = dir.path().join("people.txt");
        fs::write(&text, "name\nAda\n").unwrap();

        assert_eq!(read_records(&csv).unwrap().len(), 1);
        assert!(matches!(
            read_records(&text),
            Err(IoError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_read_missing_sources() {
        let dir = TempDir::new().unwrap();

        let csv = read_records(&dir.path().join("missing.csv"));
        let sheet = read_records(&dir.path().join("missing.xlsx"));

        assert!(matches!(csv, Err(IoError::NotFound(_))));
        assert!(matches!(sheet, Err(IoError::NotFound(_))));
    }

    #[test]
    fn test_read_spreadsheet_rejects_garbage() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.xlsx");
        fs::write(&path, "not a workbook").unwrap();

        assert!(matches!(
            read_spreadsheet(&path),
            Err(IoError::Spreadsheet { .. })
        ));
    }
}

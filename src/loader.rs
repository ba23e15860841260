//! Tabular loading for uploaded exports.
//!
//! An upload is either delimited text or a spreadsheet container; the two are
//! told apart by their leading magic bytes. Both paths produce a [`RowSet`]:
//! one header list plus positional records, with fully blank rows removed.

use std::io::Cursor;

use calamine::{Data, Reader, open_workbook_auto_from_rs};
use chrono::{NaiveDateTime, Timelike};
use encoding_rs::{Encoding, UTF_8};
use log::{debug, warn};
use serde::Serialize;

use crate::{error::LoadError, io_utils};

const ZIP_MAGIC: &[u8] = b"PK";
const OLE_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceFormat {
    Delimited,
    Workbook,
}

#[derive(Debug, Clone, Copy)]
pub struct LoadOptions {
    pub delimiter: u8,
    pub encoding: &'static Encoding,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            delimiter: io_utils::DEFAULT_CSV_DELIMITER,
            encoding: UTF_8,
        }
    }
}

/// Ordered rows keyed positionally by a shared header list.
///
/// Header names are kept exactly as found, duplicates included; registration
/// exports carry two "State" columns and both must stay addressable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowSet {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl RowSet {
    /// Builds a row set, padding short records and truncating long ones to the
    /// header width.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let width = headers.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, String::new());
                row
            })
            .collect();
        Self { headers, rows }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    pub(crate) fn into_parts(self) -> (Vec<String>, Vec<Vec<String>>) {
        (self.headers, self.rows)
    }
}

pub fn detect_format(bytes: &[u8]) -> SourceFormat {
    if bytes.starts_with(ZIP_MAGIC) || bytes.starts_with(OLE_MAGIC) {
        SourceFormat::Workbook
    } else {
        SourceFormat::Delimited
    }
}

pub fn load_rows(bytes: &[u8], options: &LoadOptions) -> Result<RowSet, LoadError> {
    let format = detect_format(bytes);
    debug!("Loading {} byte(s) as {format:?}", bytes.len());
    match format {
        SourceFormat::Delimited => load_delimited(bytes, options),
        SourceFormat::Workbook => load_workbook(bytes),
    }
}

pub(crate) fn is_blank_row(row: &[String]) -> bool {
    row.iter().all(|value| value.trim().is_empty())
}

fn load_delimited(bytes: &[u8], options: &LoadOptions) -> Result<RowSet, LoadError> {
    let text = io_utils::decode_bytes(bytes, options.encoding);
    let mut reader = io_utils::open_csv_reader(text.as_bytes(), options.delimiter);
    let headers = reader
        .headers()
        .map_err(|err| LoadError::Delimited(err.to_string()))?
        .iter()
        .map(str::to_string)
        .collect::<Vec<_>>();

    let mut rows = Vec::new();
    let mut first_error = None;
    let mut skipped = 0usize;
    for (row_idx, record) in reader.records().enumerate() {
        match record {
            Ok(record) => {
                let row = record.iter().map(str::to_string).collect::<Vec<_>>();
                if !is_blank_row(&row) {
                    rows.push(row);
                }
            }
            Err(err) => {
                debug!("Skipping malformed row {}: {err}", row_idx + 2);
                skipped += 1;
                first_error.get_or_insert_with(|| err.to_string());
            }
        }
    }

    if rows.is_empty()
        && let Some(message) = first_error
    {
        return Err(LoadError::Delimited(message));
    }
    if skipped > 0 {
        warn!("Skipped {skipped} malformed row(s) while reading delimited text");
    }
    Ok(RowSet::new(headers, rows))
}

fn load_workbook(bytes: &[u8]) -> Result<RowSet, LoadError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|err| LoadError::Workbook(err.to_string()))?;
    let range = match workbook.worksheet_range_at(0) {
        Some(range) => range.map_err(|err| LoadError::Workbook(err.to_string()))?,
        None => return Ok(RowSet::default()),
    };

    let mut sheet_rows = range.rows();
    let headers = match sheet_rows.next() {
        Some(first) => first.iter().map(cell_text).collect::<Vec<_>>(),
        None => return Ok(RowSet::default()),
    };
    let rows = sheet_rows
        .map(|row| row.iter().map(cell_text).collect::<Vec<_>>())
        .filter(|row| !is_blank_row(row))
        .collect();
    Ok(RowSet::new(headers, rows))
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(n) => {
            if n.fract() == 0.0 && n.abs() < 1e15 {
                format!("{}", *n as i64)
            } else {
                n.to_string()
            }
        }
        Data::Int(n) => n.to_string(),
        Data::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
        Data::Error(e) => format!("#{e:?}"),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(format_datetime)
            .unwrap_or_else(|| dt.as_f64().to_string()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
    }
}

fn format_datetime(dt: NaiveDateTime) -> String {
    if dt.num_seconds_from_midnight() == 0 {
        dt.format("%Y-%m-%d").to_string()
    } else {
        dt.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn magic_bytes_select_workbook() {
        assert_eq!(detect_format(b"PK\x03\x04rest"), SourceFormat::Workbook);
        assert_eq!(
            detect_format(&[0xD0, 0xCF, 0x11, 0xE0, 0xA1]),
            SourceFormat::Workbook
        );
        assert_eq!(detect_format(b"ID,Name\n"), SourceFormat::Delimited);
        assert_eq!(detect_format(b""), SourceFormat::Delimited);
    }

    #[test]
    fn row_set_pads_and_truncates_to_header_width() {
        let rows = RowSet::new(
            vec!["a".into(), "b".into()],
            vec![vec!["1".into()], vec!["1".into(), "2".into(), "3".into()]],
        );
        assert_eq!(rows.rows()[0], vec!["1".to_string(), String::new()]);
        assert_eq!(rows.rows()[1], vec!["1".to_string(), "2".to_string()]);
    }

    #[test]
    fn delimited_rows_skip_blank_lines_and_blank_cells() {
        let text = b"ID,Name\n1,Ann\n\n , \n2,Bo\n";
        let rows = load_rows(text, &LoadOptions::default()).expect("load");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows.rows()[1][1], "Bo");
    }

    #[test]
    fn header_only_text_yields_no_rows() {
        let rows = load_rows(b"ID,Name\n", &LoadOptions::default()).expect("load");
        assert!(rows.is_empty());
        assert_eq!(rows.column_count(), 2);
    }

    #[test]
    fn corrupt_workbook_is_a_parse_error() {
        let err = load_rows(b"PK\x03\x04not really a zip", &LoadOptions::default())
            .expect_err("corrupt zip");
        assert!(matches!(err, LoadError::Workbook(_)));
    }

    #[test]
    fn cell_text_renders_integral_floats_without_fraction() {
        assert_eq!(cell_text(&Data::Float(1990.0)), "1990");
        assert_eq!(cell_text(&Data::Float(12.5)), "12.5");
        assert_eq!(cell_text(&Data::Bool(true)), "TRUE");
        assert_eq!(cell_text(&Data::Empty), "");
    }
}

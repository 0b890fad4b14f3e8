//! Tabular file decoding
//!
//! Converts raw upload bytes of a declared kind into an ordered stream of
//! header-keyed field mappings. Structural extraction only: no business
//! validation happens here. A row the decoder cannot read (bad encoding,
//! wrong shape) is surfaced as a per-row anomaly so one bad line does not
//! abort the batch; a file the decoder cannot read at all is `Corrupt`.

use std::collections::HashMap;
use std::io::{Read, Seek};

use calamine::{open_workbook_auto_from_rs, Data, Reader as SheetReader};
use thiserror::Error;

/// Decoder errors
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Declared file kind is not one the decoder understands
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    /// No structure could be extracted from the file
    #[error("Corrupt file: {0}")]
    Corrupt(String),
}

/// Supported upload kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    /// Delimited text with a header row (.csv)
    Csv,
    /// Spreadsheet workbook, first sheet only (.xlsx / .xls)
    Spreadsheet,
}

impl FileFormat {
    /// Determine the format from the declared upload name.
    ///
    /// Matching is by extension, case-insensitive. Anything else fails with
    /// `UnsupportedFormat` before a single row is read.
    pub fn from_name(name: &str) -> Result<Self, DecodeError> {
        let ext = name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "csv" => Ok(FileFormat::Csv),
            "xlsx" | "xls" => Ok(FileFormat::Spreadsheet),
            _ => Err(DecodeError::UnsupportedFormat(name.to_string())),
        }
    }
}

/// Column name → raw string value for one row
pub type FieldMap = HashMap<String, String>;

/// A per-row structural problem (wrong shape, bad encoding)
#[derive(Debug, Clone)]
pub struct RowAnomaly(pub String);

/// One decoded row: its 0-based data-row index plus either its fields or
/// the anomaly that made it unreadable
#[derive(Debug)]
pub struct DecodedRow {
    pub index: usize,
    pub fields: Result<FieldMap, RowAnomaly>,
}

/// Ordered stream of decoded rows
pub type RowStream = Box<dyn Iterator<Item = DecodedRow> + Send>;

/// Decode `data` according to `format`.
///
/// CSV decoding is lazy: rows are pulled from the underlying reader as the
/// stream is consumed, so file size is not bounded by memory. Spreadsheet
/// decoding materializes the first sheet (the workbook container requires
/// random access) but still hands back the same stream shape.
pub fn decode<R>(data: R, format: FileFormat) -> Result<RowStream, DecodeError>
where
    R: Read + Seek + Send + 'static + Clone,
{
    match format {
        FileFormat::Csv => decode_csv(data),
        FileFormat::Spreadsheet => decode_spreadsheet(data),
    }
}

fn decode_csv<R>(data: R) -> Result<RowStream, DecodeError>
where
    R: Read + Send + 'static,
{
    // flexible: rows with the wrong column count still decode; the missing
    // columns simply never appear in the row's field map and the normalizer
    // reports them
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(data);

    let headers = reader
        .headers()
        .map_err(|e| DecodeError::Corrupt(format!("cannot read header row: {}", e)))?
        .clone();

    let rows = reader
        .into_records()
        .enumerate()
        .map(move |(index, result)| DecodedRow {
            index,
            fields: match result {
                Ok(record) => Ok(headers
                    .iter()
                    .zip(record.iter())
                    .map(|(header, value)| (header.to_string(), value.to_string()))
                    .collect()),
                Err(e) => Err(RowAnomaly(e.to_string())),
            },
        });

    Ok(Box::new(rows))
}

fn decode_spreadsheet<R>(data: R) -> Result<RowStream, DecodeError>
where
    R: Read + Seek + Send + 'static + Clone,
{
    let mut workbook = open_workbook_auto_from_rs(data)
        .map_err(|e| DecodeError::Corrupt(format!("cannot open workbook: {}", e)))?;

    // First sheet only; sheet row order is preserved
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| DecodeError::Corrupt("workbook has no sheets".to_string()))?
        .map_err(|e| DecodeError::Corrupt(format!("cannot read first sheet: {}", e)))?;

    let mut rows = range.rows();
    let headers: Vec<Option<String>> = match rows.next() {
        Some(header_row) => header_row.iter().map(cell_value).collect(),
        None => Vec::new(),
    };

    let decoded: Vec<FieldMap> = rows
        .filter(|row| row.iter().any(|cell| !matches!(cell, Data::Empty)))
        .map(|row| {
            headers
                .iter()
                .zip(row.iter())
                .filter_map(|(header, cell)| {
                    let header = header.as_ref()?;
                    Some((header.clone(), cell_value(cell)?))
                })
                .collect()
        })
        .collect();

    Ok(Box::new(decoded.into_iter().enumerate().map(
        |(index, fields)| DecodedRow {
            index,
            fields: Ok(fields),
        },
    )))
}

/// Render one spreadsheet cell as the string the normalizer will see.
/// Empty cells become absent keys rather than empty strings.
fn cell_value(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty => None,
        Data::String(s) => Some(s.clone()),
        // Whole-valued floats render without the trailing ".0" so numeric
        // phone columns survive the spreadsheet round trip
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => Some(format!("{}", *f as i64)),
        Data::Float(f) => Some(f.to_string()),
        Data::Int(i) => Some(i.to_string()),
        Data::Bool(b) => Some(b.to_string()),
        Data::DateTime(dt) => Some(dt.as_f64().to_string()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Some(s.clone()),
        Data::Error(e) => Some(format!("{:?}", e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn format_detection() {
        assert_eq!(FileFormat::from_name("leads.csv").unwrap(), FileFormat::Csv);
        assert_eq!(
            FileFormat::from_name("LEADS.XLSX").unwrap(),
            FileFormat::Spreadsheet
        );
        assert_eq!(
            FileFormat::from_name("old.xls").unwrap(),
            FileFormat::Spreadsheet
        );
        assert!(matches!(
            FileFormat::from_name("leads.pdf"),
            Err(DecodeError::UnsupportedFormat(_))
        ));
        assert!(matches!(
            FileFormat::from_name("no-extension"),
            Err(DecodeError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn csv_rows_keyed_by_header_in_order() {
        let data = "FirstName,Phone,Notes\nAsha,555-0101,vip\nBen,555-0102,\n";
        let rows: Vec<DecodedRow> =
            decode(Cursor::new(data.as_bytes().to_vec()), FileFormat::Csv)
                .unwrap()
                .collect();

        assert_eq!(rows.len(), 2);
        let first = rows[0].fields.as_ref().unwrap();
        assert_eq!(first.get("FirstName").map(String::as_str), Some("Asha"));
        assert_eq!(first.get("Phone").map(String::as_str), Some("555-0101"));
        assert_eq!(first.get("Notes").map(String::as_str), Some("vip"));
        assert_eq!(rows[1].index, 1);
    }

    #[test]
    fn csv_short_row_yields_partial_field_map() {
        let data = "FirstName,Phone\nAsha\nBen,555-0102\n";
        let rows: Vec<DecodedRow> =
            decode(Cursor::new(data.as_bytes().to_vec()), FileFormat::Csv)
                .unwrap()
                .collect();

        let short = rows[0].fields.as_ref().unwrap();
        assert_eq!(short.get("FirstName").map(String::as_str), Some("Asha"));
        assert!(!short.contains_key("Phone"));

        let full = rows[1].fields.as_ref().unwrap();
        assert_eq!(full.get("Phone").map(String::as_str), Some("555-0102"));
    }

    #[test]
    fn csv_bad_encoding_is_a_row_anomaly_not_an_abort() {
        let mut data = b"FirstName,Phone\n".to_vec();
        data.extend_from_slice(&[0xFF, 0xFE, b',', b'5', b'5', b'5', b'\n']);
        data.extend_from_slice(b"Ben,555-0102\n");

        let rows: Vec<DecodedRow> =
            decode(Cursor::new(data), FileFormat::Csv).unwrap().collect();

        assert_eq!(rows.len(), 2);
        assert!(rows[0].fields.is_err());
        let ok = rows[1].fields.as_ref().unwrap();
        assert_eq!(ok.get("FirstName").map(String::as_str), Some("Ben"));
    }

    #[test]
    fn spreadsheet_garbage_is_corrupt() {
        let result = decode(
            Cursor::new(b"definitely not a workbook".to_vec()),
            FileFormat::Spreadsheet,
        );
        assert!(matches!(result, Err(DecodeError::Corrupt(_))));
    }

    #[test]
    fn spreadsheet_first_sheet_with_header_row() {
        let mut workbook = rust_xlsxwriter::Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, "FirstName").unwrap();
        sheet.write_string(0, 1, "Phone").unwrap();
        sheet.write_string(0, 2, "Notes").unwrap();
        sheet.write_string(1, 0, "Asha").unwrap();
        sheet.write_number(1, 1, 5550101.0).unwrap();
        sheet.write_string(1, 2, "vip").unwrap();
        sheet.write_string(2, 0, "Ben").unwrap();
        sheet.write_string(2, 1, "555-0102").unwrap();
        let bytes = workbook.save_to_buffer().unwrap();

        let rows: Vec<DecodedRow> = decode(Cursor::new(bytes), FileFormat::Spreadsheet)
            .unwrap()
            .collect();

        assert_eq!(rows.len(), 2);
        let first = rows[0].fields.as_ref().unwrap();
        assert_eq!(first.get("FirstName").map(String::as_str), Some("Asha"));
        assert_eq!(first.get("Phone").map(String::as_str), Some("5550101"));
        let second = rows[1].fields.as_ref().unwrap();
        assert_eq!(second.get("Phone").map(String::as_str), Some("555-0102"));
        assert!(!second.contains_key("Notes"));
    }
}

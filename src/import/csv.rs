//! CSV and TSV import.
//!
//! Records are read with the `csv` crate in flexible mode, so rows may differ
//! in length. With type detection on, each trimmed field becomes the first
//! of boolean, number, date or text that it parses as.

use crate::common::error::{Error, Result};
use crate::sheet::style::number_format::datetime_to_serial;
use crate::sheet::{Style, Workbook};
use chrono::{NaiveDate, NaiveDateTime};
use encoding_rs::Encoding;
use std::borrow::Cow;
use std::path::Path;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Number formats given to detected dates.
const DATE_FORMAT: &str = "yyyy-mm-dd";
const DATETIME_FORMAT: &str = "yyyy-mm-dd hh:mm:ss";

/// Delimiters tried when none is set, in order of preference on a tie.
const DELIMITER_CANDIDATES: [u8; 4] = [b'\t', b';', b',', b'|'];
const SNIFF_LINES: usize = 10;

/// Options for [`load_csv`] and [`read_csv`].
#[derive(Debug, Clone)]
pub struct CsvLoadOptions {
    /// Field separator; `None` picks the likeliest of tab, `;`, `,` and `|`
    pub delimiter: Option<u8>,
    pub quote: u8,
    /// Escape byte inside quoted fields; `None` means doubled quotes
    pub escape: Option<u8>,
    /// Text encoding; `None` reads UTF-8 and falls back to Windows-1252
    pub encoding: Option<&'static Encoding>,
    /// Records dropped before loading starts
    pub skip_rows: usize,
    /// Load the first record as text, without type detection
    pub has_header: bool,
    pub auto_detect_types: bool,
    /// chrono format strings, tried in order
    pub date_formats: Vec<String>,
    /// Exact spellings read as TRUE
    pub true_values: Vec<String>,
    /// Exact spellings read as FALSE
    pub false_values: Vec<String>,
}

impl Default for CsvLoadOptions {
    fn default() -> Self {
        let strings = |list: &[&str]| -> Vec<String> { list.iter().map(|s| s.to_string()).collect() };
        Self {
            delimiter: Some(b','),
            quote: b'"',
            escape: None,
            encoding: None,
            skip_rows: 0,
            has_header: false,
            auto_detect_types: true,
            date_formats: strings(&[
                "%Y-%m-%d",
                "%Y/%m/%d",
                "%d-%m-%Y",
                "%d/%m/%Y",
                "%m-%d-%Y",
                "%m/%d/%Y",
                "%Y-%m-%d %H:%M:%S",
                "%Y/%m/%d %H:%M:%S",
                "%d-%m-%Y %H:%M:%S",
                "%d/%m/%Y %H:%M:%S",
            ]),
            true_values: strings(&["true", "yes", "1", "True", "Yes", "TRUE", "YES"]),
            false_values: strings(&["false", "no", "0", "False", "No", "FALSE", "NO"]),
        }
    }
}

impl CsvLoadOptions {
    /// Tab-separated input.
    pub fn tsv() -> Self {
        Self {
            delimiter: Some(b'\t'),
            ..Self::default()
        }
    }

    /// Classify one field.
    fn detect<'a>(&self, field: &'a str, date1904: bool) -> Field<'a> {
        let value = field.trim();
        if value.is_empty() {
            return Field::Empty;
        }
        if self.true_values.iter().any(|t| t == value) {
            return Field::Boolean(true);
        }
        if self.false_values.iter().any(|f| f == value) {
            return Field::Boolean(false);
        }
        if let Ok(n) = fast_float2::parse::<f64, _>(value)
            && n.is_finite()
        {
            return Field::Number(n);
        }
        for format in &self.date_formats {
            let with_time = format.contains("%H") || format.contains("%I");
            let parsed = if with_time {
                NaiveDateTime::parse_from_str(value, format).ok()
            } else {
                NaiveDate::parse_from_str(value, format)
                    .ok()
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
            };
            if let Some(serial) = parsed.and_then(|dt| datetime_to_serial(dt, date1904)) {
                return Field::Date { serial, with_time };
            }
        }
        Field::Text(value)
    }
}

#[derive(Debug, PartialEq)]
enum Field<'a> {
    Empty,
    Text(&'a str),
    Number(f64),
    Boolean(bool),
    Date { serial: f64, with_time: bool },
}

/// Replace the cells of `sheet_name` with the records of `bytes`.
///
/// Row and column settings of the sheet are kept. Returns the number of
/// rows loaded.
pub fn load_csv(workbook: &mut Workbook, sheet_name: &str, bytes: &[u8], options: &CsvLoadOptions) -> Result<u32> {
    let text = decode(bytes, options.encoding);
    let delimiter = options.delimiter.unwrap_or_else(|| sniff_delimiter(&text));
    let mut reader = ::csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .quote(options.quote)
        .escape(options.escape)
        .double_quote(options.escape.is_none())
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let date1904 = workbook.date1904();
    let date_style = Style::new().with_number_format(DATE_FORMAT);
    let datetime_style = Style::new().with_number_format(DATETIME_FORMAT);
    let mut sheet = workbook.worksheet_mut(sheet_name)?;
    sheet.clear_cells();

    let mut row = 0u32;
    for (index, record) in reader.records().enumerate() {
        let record = record.map_err(csv_error)?;
        if index < options.skip_rows {
            continue;
        }
        let as_text = !options.auto_detect_types || (options.has_header && index == options.skip_rows);
        for (col, field) in record.iter().enumerate() {
            let col = col as u32;
            let field = if as_text {
                if field.is_empty() { Field::Empty } else { Field::Text(field) }
            } else {
                options.detect(field, date1904)
            };
            match field {
                Field::Empty => {},
                Field::Text(text) => sheet.set_value_at(row, col, text)?,
                Field::Number(n) => sheet.set_value_at(row, col, n)?,
                Field::Boolean(b) => sheet.set_value_at(row, col, b)?,
                Field::Date { serial, with_time } => {
                    let style = if with_time { &datetime_style } else { &date_style };
                    sheet.set_cell_at(row, col, serial, style)?;
                },
            }
        }
        row += 1;
    }
    log::debug!("loaded {row} CSV rows into '{sheet_name}'");
    Ok(row)
}

/// New single-sheet workbook holding the records of `bytes`.
pub fn read_csv(bytes: &[u8], options: &CsvLoadOptions) -> Result<Workbook> {
    let mut workbook = Workbook::new();
    load_csv(&mut workbook, "Sheet1", bytes, options)?;
    Ok(workbook)
}

/// Read a CSV file into a new workbook.
pub fn read_csv_path<P: AsRef<Path>>(path: P, options: &CsvLoadOptions) -> Result<Workbook> {
    let bytes = std::fs::read(path)?;
    read_csv(&bytes, options)
}

fn decode<'a>(bytes: &'a [u8], encoding: Option<&'static Encoding>) -> Cow<'a, str> {
    if let Some(encoding) = encoding {
        // BOM sniffing strips a leading BOM as well
        let (text, _, had_errors) = encoding.decode(bytes);
        if had_errors {
            log::warn!("CSV input has bytes invalid in {}, replaced", encoding.name());
        }
        return text;
    }
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(text) => Cow::Borrowed(text),
        Err(_) => {
            log::debug!("CSV input is not UTF-8, decoding as Windows-1252");
            encoding_rs::WINDOWS_1252.decode_without_bom_handling(bytes).0
        },
    }
}

/// The candidate splitting the first lines into the most equal-width records.
fn sniff_delimiter(text: &str) -> u8 {
    let lines: Vec<&str> = text.lines().take(SNIFF_LINES).collect();
    let mut best = (b',', 0usize);
    for delimiter in DELIMITER_CANDIDATES {
        let widths: Vec<usize> = lines
            .iter()
            .map(|line| {
                ::csv::ReaderBuilder::new()
                    .delimiter(delimiter)
                    .has_headers(false)
                    .flexible(true)
                    .from_reader(line.as_bytes())
                    .records()
                    .next()
                    .and_then(|r| r.ok())
                    .map_or(1, |r| r.len())
            })
            .collect();
        let Some(&first) = widths.first() else {
            break;
        };
        if first <= 1 {
            continue;
        }
        let score = widths.iter().filter(|&&w| w == first).count() * first;
        if score > best.1 {
            best = (delimiter, score);
        }
    }
    best.0
}

fn csv_error(err: ::csv::Error) -> Error {
    Error::Io(std::io::Error::other(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheet::ResolvedValue;

    fn value<'a>(wb: &'a Workbook, reference: &str) -> Option<ResolvedValue<'a>> {
        let sheet = wb.worksheet("Sheet1").unwrap();
        let (row, col) = crate::sheet::parse_ref(reference).unwrap();
        sheet.cell_ref(wb, row, col).unwrap().map(|cell| cell.value)
    }

    #[test]
    fn test_detects_types() {
        let csv = b"name,qty,price,active,day,stamp\nWidget,3,2.50,yes, 2024-01-15 ,2024-01-15 12:00:00\nGadget,-1e3,n/a,0,15/01/2024,\n";
        let options = CsvLoadOptions {
            has_header: true,
            ..CsvLoadOptions::default()
        };
        let wb = read_csv(csv, &options).unwrap();
        assert_eq!(value(&wb, "A1"), Some(ResolvedValue::Text("name")));
        assert_eq!(value(&wb, "B1"), Some(ResolvedValue::Text("qty")));
        assert_eq!(value(&wb, "B2"), Some(ResolvedValue::Number(3.0)));
        assert_eq!(value(&wb, "C2"), Some(ResolvedValue::Number(2.5)));
        assert_eq!(value(&wb, "D2"), Some(ResolvedValue::Boolean(true)));
        assert_eq!(value(&wb, "E2"), Some(ResolvedValue::Number(45306.0)));
        assert_eq!(value(&wb, "F2"), Some(ResolvedValue::Number(45306.5)));
        assert_eq!(value(&wb, "B3"), Some(ResolvedValue::Number(-1000.0)));
        assert_eq!(value(&wb, "C3"), Some(ResolvedValue::Text("n/a")));
        assert_eq!(value(&wb, "D3"), Some(ResolvedValue::Boolean(false)));
        assert_eq!(value(&wb, "E3"), Some(ResolvedValue::Number(45306.0)));
        assert_eq!(value(&wb, "F3"), None);

        let sheet = wb.worksheet("Sheet1").unwrap();
        let day = sheet.cell_ref(&wb, 1, 4).unwrap().unwrap();
        assert!(day.style.is_date());
        assert_eq!(day.style.number_format, DATE_FORMAT);
        let stamp = sheet.cell_ref(&wb, 1, 5).unwrap().unwrap();
        assert_eq!(stamp.style.number_format, DATETIME_FORMAT);
    }

    #[test]
    fn test_bom_skip_rows_and_plain_text() {
        let csv = b"\xEF\xBB\xBFexported by tool\n 007 ,TRUE,\"a, b\"\n";
        let options = CsvLoadOptions {
            skip_rows: 1,
            auto_detect_types: false,
            ..CsvLoadOptions::default()
        };
        let wb = read_csv(csv, &options).unwrap();
        assert_eq!(value(&wb, "A1"), Some(ResolvedValue::Text(" 007 ")));
        assert_eq!(value(&wb, "B1"), Some(ResolvedValue::Text("TRUE")));
        assert_eq!(value(&wb, "C1"), Some(ResolvedValue::Text("a, b")));
        assert_eq!(wb.worksheet("Sheet1").unwrap().cell_count(), 3);
    }

    #[test]
    fn test_windows_1252_and_sniffed_delimiter() {
        let csv = b"caf\xe9;prix\nth\xe9;4,5\n";
        let options = CsvLoadOptions {
            delimiter: None,
            ..CsvLoadOptions::default()
        };
        let wb = read_csv(csv, &options).unwrap();
        assert_eq!(value(&wb, "A1"), Some(ResolvedValue::Text("café")));
        assert_eq!(value(&wb, "A2"), Some(ResolvedValue::Text("thé")));
        assert_eq!(value(&wb, "B2"), Some(ResolvedValue::Text("4,5")));
    }

    #[test]
    fn test_explicit_encoding() {
        let mut utf16 = vec![0xFF, 0xFE];
        for unit in "a\tb\n1\t2\n".encode_utf16() {
            utf16.extend_from_slice(&unit.to_le_bytes());
        }
        let options = CsvLoadOptions {
            encoding: Some(encoding_rs::UTF_16LE),
            ..CsvLoadOptions::tsv()
        };
        let wb = read_csv(&utf16, &options).unwrap();
        assert_eq!(value(&wb, "B1"), Some(ResolvedValue::Text("b")));
        assert_eq!(value(&wb, "B2"), Some(ResolvedValue::Number(2.0)));
    }

    #[test]
    fn test_load_replaces_cells_and_keeps_layout() {
        let mut wb = Workbook::new();
        wb.add_worksheet("Data").unwrap();
        {
            let mut sheet = wb.worksheet_mut("Data").unwrap();
            sheet.set_value("Z99", "stale").unwrap();
            sheet.set_column_width(0, 30.0).unwrap();
        }
        let rows = load_csv(&mut wb, "data", b"1\n2\n3", &CsvLoadOptions::default()).unwrap();
        assert_eq!(rows, 3);
        let sheet = wb.worksheet("Data").unwrap();
        assert_eq!(sheet.cell_count(), 3);
        assert!(sheet.cell("Z99").unwrap().is_none());
        assert_eq!(sheet.column(0).unwrap().width, Some(30.0));
        assert!(matches!(load_csv(&mut wb, "Missing", b"1", &CsvLoadOptions::default()), Err(Error::SheetNotFound(_))));
    }

    #[test]
    fn test_sniff_delimiter() {
        assert_eq!(sniff_delimiter("a\tb\tc\n1\t2\t3"), b'\t');
        assert_eq!(sniff_delimiter("a;b\n1,5;2,5"), b';');
        assert_eq!(sniff_delimiter("a|b|c\nd|e|f"), b'|');
        assert_eq!(sniff_delimiter("single"), b',');
        assert_eq!(sniff_delimiter(""), b',');
    }
}

//! CSV and TSV export.

use super::value_rows;
use crate::common::error::{Error, Result};
use crate::sheet::{Workbook, Worksheet};

/// Options for [`to_csv`].
#[derive(Debug, Clone)]
pub struct CsvOptions {
    /// Field separator, `b'\t'` for TSV
    pub delimiter: u8,
    /// Quote every field instead of only those that need it
    pub quote_all: bool,
    /// Terminate records with `\r\n` instead of `\n`
    pub crlf: bool,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            quote_all: false,
            crlf: false,
        }
    }
}

impl CsvOptions {
    /// Tab-separated output.
    pub fn tsv() -> Self {
        Self {
            delimiter: b'\t',
            ..Self::default()
        }
    }
}

/// Render a worksheet as CSV text.
///
/// Records run from the first row down to the last row holding a value.
/// Each record ends at its own last value, so records may differ in length;
/// rows without values become empty lines.
pub fn to_csv(sheet: &Worksheet, workbook: &Workbook, options: &CsvOptions) -> Result<String> {
    let terminator: &[u8] = if options.crlf { b"\r\n" } else { b"\n" };
    let mut builder = ::csv::WriterBuilder::new();
    builder
        .delimiter(options.delimiter)
        .flexible(true)
        .quote_style(if options.quote_all {
            ::csv::QuoteStyle::Always
        } else {
            ::csv::QuoteStyle::Necessary
        })
        .terminator(if options.crlf {
            ::csv::Terminator::CRLF
        } else {
            ::csv::Terminator::Any(b'\n')
        });

    let mut out = Vec::new();
    let mut next_row = 0u32;
    for (row, values) in value_rows(sheet, workbook)? {
        // csv writes `""` for an empty record, so gap lines go in directly
        for _ in next_row..row {
            out.extend_from_slice(terminator);
        }
        let width = values.last().map_or(0, |(col, _)| *col as usize + 1);
        let mut record = vec![String::new(); width];
        for (col, value) in values {
            record[col as usize] = value.to_text();
        }
        let mut writer = builder.from_writer(&mut out);
        writer.write_record(&record).map_err(csv_error)?;
        writer.flush()?;
        next_row = row + 1;
    }

    String::from_utf8(out).map_err(|e| Error::InvalidOperation(format!("CSV output is not UTF-8: {e}")))
}

fn csv_error(err: ::csv::Error) -> Error {
    Error::Io(std::io::Error::other(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Workbook {
        let mut wb = Workbook::new();
        {
            let mut sheet = wb.worksheet_mut("Sheet1").unwrap();
            sheet.set_value("A1", "name").unwrap();
            sheet.set_value("B1", "note").unwrap();
            sheet.set_value("A2", "Widget, large").unwrap();
            sheet.set_value("B2", "says \"hi\"").unwrap();
            sheet.set_value("C4", 2.5).unwrap();
        }
        wb
    }

    #[test]
    fn test_csv_quoting_and_gaps() {
        let wb = sample();
        let csv = to_csv(wb.worksheet("Sheet1").unwrap(), &wb, &CsvOptions::default()).unwrap();
        assert_eq!(csv, "name,note\n\"Widget, large\",\"says \"\"hi\"\"\"\n\n,,2.5\n");
    }

    #[test]
    fn test_tsv_crlf() {
        let wb = sample();
        let options = CsvOptions {
            crlf: true,
            ..CsvOptions::tsv()
        };
        let tsv = to_csv(wb.worksheet("Sheet1").unwrap(), &wb, &options).unwrap();
        assert!(tsv.starts_with("name\tnote\r\nWidget, large\t"));
        assert!(tsv.ends_with("\r\n\r\n\t\t2.5\r\n"));
    }

    #[test]
    fn test_quote_all() {
        let mut wb = Workbook::new();
        wb.worksheet_mut("Sheet1").unwrap().set_value("B1", true).unwrap();
        let options = CsvOptions {
            quote_all: true,
            ..CsvOptions::default()
        };
        let csv = to_csv(wb.worksheet("Sheet1").unwrap(), &wb, &options).unwrap();
        assert_eq!(csv, "\"\",\"TRUE\"\n");
    }

    #[test]
    fn test_formula_exports_cached_value() {
        let mut wb = Workbook::new();
        wb.worksheet_mut("Sheet1")
            .unwrap()
            .set_formula_with_result("A1", "=1+1", crate::sheet::CachedValue::Number(2.0))
            .unwrap();
        let csv = to_csv(wb.worksheet("Sheet1").unwrap(), &wb, &CsvOptions::default()).unwrap();
        assert_eq!(csv, "2\n");
    }
}

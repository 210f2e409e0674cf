//! Markdown (GitHub pipe table) export.

use super::value_rows;
use crate::common::error::Result;
use crate::sheet::address::column_letters;
use crate::sheet::{Workbook, Worksheet};
use std::fmt::Write as _;

/// Options for [`to_markdown`].
#[derive(Debug, Clone)]
pub struct MarkdownOptions {
    /// Use the first used row as the table header. Otherwise column letters
    /// form the header and every row is data.
    pub header_row: bool,
}

impl Default for MarkdownOptions {
    fn default() -> Self {
        Self { header_row: true }
    }
}

impl MarkdownOptions {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn with_header_row(mut self, header_row: bool) -> Self {
        self.header_row = header_row;
        self
    }
}

/// Render the used area of a worksheet as a pipe table.
///
/// An empty sheet renders as an empty string.
pub fn to_markdown(sheet: &Worksheet, workbook: &Workbook, options: &MarkdownOptions) -> Result<String> {
    let rows = value_rows(sheet, workbook)?;
    let (Some((first_row, _)), Some((last_row, _))) = (rows.first(), rows.last()) else {
        return Ok(String::new());
    };
    let (first_row, last_row) = (*first_row, *last_row);
    let first_col = rows
        .iter()
        .filter_map(|(_, values)| values.first().map(|(col, _)| *col))
        .min()
        .unwrap_or(0);
    let last_col = rows
        .iter()
        .filter_map(|(_, values)| values.last().map(|(col, _)| *col))
        .max()
        .unwrap_or(first_col);
    let width = (last_col - first_col + 1) as usize;

    let mut grid = vec![vec![String::new(); width]; (last_row - first_row + 1) as usize];
    for (row, values) in rows {
        for (col, value) in values {
            grid[(row - first_row) as usize][(col - first_col) as usize] = escape_cell(&value.to_text());
        }
    }

    let mut out = String::new();
    let mut body = grid.iter();
    if options.header_row {
        if let Some(header) = body.next() {
            write_row(&mut out, header)?;
        }
    } else {
        let letters: Vec<String> = (first_col..=last_col).map(column_letters).collect();
        write_row(&mut out, &letters)?;
    }
    out.push('|');
    for _ in 0..width {
        out.push_str(" --- |");
    }
    out.push('\n');
    for row in body {
        write_row(&mut out, row)?;
    }
    Ok(out)
}

fn write_row(out: &mut String, cells: &[String]) -> Result<()> {
    out.push('|');
    for cell in cells {
        write!(out, " {cell} |")?;
    }
    out.push('\n');
    Ok(())
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|").replace("\r\n", "<br>").replace('\n', "<br>")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Workbook {
        let mut wb = Workbook::new();
        {
            let mut sheet = wb.worksheet_mut("Sheet1").unwrap();
            sheet.set_value("B2", "Item").unwrap();
            sheet.set_value("C2", "Qty").unwrap();
            sheet.set_value("B3", "a|b").unwrap();
            sheet.set_value("C3", 3).unwrap();
            sheet.set_value("B4", "line1\nline2").unwrap();
        }
        wb
    }

    #[test]
    fn test_header_row() {
        let wb = sample();
        let md = to_markdown(wb.worksheet("Sheet1").unwrap(), &wb, &MarkdownOptions::new()).unwrap();
        assert_eq!(
            md,
            "| Item | Qty |\n| --- | --- |\n| a\\|b | 3 |\n| line1<br>line2 |  |\n"
        );
    }

    #[test]
    fn test_letter_header() {
        let wb = sample();
        let options = MarkdownOptions::new().with_header_row(false);
        let md = to_markdown(wb.worksheet("Sheet1").unwrap(), &wb, &options).unwrap();
        assert!(md.starts_with("| B | C |\n| --- | --- |\n| Item | Qty |\n"));
    }

    #[test]
    fn test_empty_sheet() {
        let wb = Workbook::new();
        let md = to_markdown(wb.worksheet("Sheet1").unwrap(), &wb, &MarkdownOptions::default()).unwrap();
        assert!(md.is_empty());
    }
}

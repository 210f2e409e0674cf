//! Text views of a workbook.
//!
//! Exporters only use the public read API of [`crate::sheet`]: resolved
//! cell values, never raw shared-string or style indices. Formula cells
//! export their cached result.

pub mod csv;
pub mod json;
pub mod markdown;

pub use self::csv::{CsvOptions, to_csv};
pub use self::json::{to_json, to_json_value};
pub use self::markdown::{MarkdownOptions, to_markdown};

use crate::common::error::Result;
use crate::sheet::{ResolvedValue, Workbook, Worksheet};

/// Non-empty cell values of a sheet grouped by row, rows ascending.
pub(crate) fn value_rows<'a>(
    sheet: &'a Worksheet,
    workbook: &'a Workbook,
) -> Result<Vec<(u32, Vec<(u32, ResolvedValue<'a>)>)>> {
    let mut rows: Vec<(u32, Vec<(u32, ResolvedValue<'a>)>)> = Vec::new();
    for cell in sheet.cells(workbook) {
        let cell = cell?;
        if matches!(cell.value, ResolvedValue::Empty) {
            continue;
        }
        match rows.last_mut() {
            Some((row, values)) if *row == cell.row => values.push((cell.col, cell.value)),
            _ => rows.push((cell.row, vec![(cell.col, cell.value)])),
        }
    }
    Ok(rows)
}

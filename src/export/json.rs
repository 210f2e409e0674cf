//! JSON export.
//!
//! The document maps each sheet name to an array with one object per row
//! that holds values, keyed by A1 reference:
//!
//! ```json
//! { "Sheet1": [ { "A1": "Hello", "B1": 42 } ] }
//! ```

use super::value_rows;
use crate::common::error::{Error, Result};
use crate::sheet::{ResolvedValue, Workbook, format_ref};
use serde::Serialize;
use serde_json::{Map, Value};

/// JSON form of a single cell value. Errors export as their code text.
#[derive(Serialize)]
#[serde(untagged)]
enum JsonCell<'a> {
    Number(f64),
    Text(&'a str),
    Boolean(bool),
}

fn json_cell<'a>(value: &ResolvedValue<'a>) -> Option<JsonCell<'a>> {
    match *value {
        ResolvedValue::Empty => None,
        ResolvedValue::Number(n) => Some(JsonCell::Number(n)),
        ResolvedValue::Text(s) => Some(JsonCell::Text(s)),
        ResolvedValue::Boolean(b) => Some(JsonCell::Boolean(b)),
        ResolvedValue::Error(e) => Some(JsonCell::Text(e.as_str())),
    }
}

/// Build the JSON document for every worksheet, in tab order.
pub fn to_json_value(workbook: &Workbook) -> Result<Value> {
    let mut document = Map::new();
    for sheet in workbook.worksheets() {
        let mut rows = Vec::new();
        for (row, values) in value_rows(sheet, workbook)? {
            let mut object = Map::new();
            for (col, value) in values {
                let json = serde_json::to_value(json_cell(&value)).map_err(json_error)?;
                object.insert(format_ref(row, col), json);
            }
            rows.push(Value::Object(object));
        }
        document.insert(sheet.name().to_string(), Value::Array(rows));
    }
    Ok(Value::Object(document))
}

/// Pretty-printed JSON text for every worksheet.
pub fn to_json(workbook: &Workbook) -> Result<String> {
    serde_json::to_string_pretty(&to_json_value(workbook)?).map_err(json_error)
}

fn json_error(err: serde_json::Error) -> Error {
    Error::InvalidOperation(format!("JSON serialization failed: {err}"))
}

//! Cell values.

use crate::sheet::address::CellRange;
use crate::sheet::style::Style;
use std::fmt;

/// Excel error values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    Null,
    Div0,
    Value,
    Ref,
    Name,
    Num,
    NA,
}

impl ErrorCode {
    pub const ALL: [ErrorCode; 7] = [
        ErrorCode::Null,
        ErrorCode::Div0,
        ErrorCode::Value,
        ErrorCode::Ref,
        ErrorCode::Name,
        ErrorCode::Num,
        ErrorCode::NA,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::Null => "#NULL!",
            ErrorCode::Div0 => "#DIV/0!",
            ErrorCode::Value => "#VALUE!",
            ErrorCode::Ref => "#REF!",
            ErrorCode::Name => "#NAME?",
            ErrorCode::Num => "#NUM!",
            ErrorCode::NA => "#N/A",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|code| code.as_str() == s)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The last computed result stored alongside a formula.
#[derive(Debug, Clone, PartialEq)]
pub enum CachedValue {
    Number(f64),
    Text(String),
    Boolean(bool),
    Error(ErrorCode),
}

/// Value stored in a cell.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    #[default]
    Empty,
    Number(f64),
    /// Index into the workbook shared string table
    Text(u32),
    /// String stored in the cell itself
    InlineText(String),
    Boolean(bool),
    Error(ErrorCode),
    /// Formula text without the leading `=`
    Formula {
        formula: String,
        cached: Option<CachedValue>,
        /// Range an array formula spills into; set on its top-left cell only
        array: Option<CellRange>,
    },
}

impl CellValue {
    #[inline]
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }
}

/// A cell: value plus cell-format index (0 = default style).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Cell {
    pub value: CellValue,
    pub style: u32,
}

impl Cell {
    pub fn new(value: CellValue, style: u32) -> Self {
        Self { value, style }
    }
}

/// A value written through the mutation API.
///
/// Text is interned into the shared string table when it is stored.
/// Formula text may carry a leading `=`, which is stripped.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Empty,
    Number(f64),
    Text(String),
    Boolean(bool),
    Error(ErrorCode),
    Formula(String),
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<ErrorCode> for Value {
    fn from(e: ErrorCode) -> Self {
        Value::Error(e)
    }
}

/// A cell value with shared strings resolved.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ResolvedValue<'a> {
    Empty,
    Number(f64),
    Text(&'a str),
    Boolean(bool),
    Error(ErrorCode),
}

impl ResolvedValue<'_> {
    /// Plain text rendering, as used by the text exporters.
    pub fn to_text(&self) -> String {
        match self {
            ResolvedValue::Empty => String::new(),
            ResolvedValue::Number(n) => format_number(*n),
            ResolvedValue::Text(s) => (*s).to_string(),
            ResolvedValue::Boolean(true) => "TRUE".to_string(),
            ResolvedValue::Boolean(false) => "FALSE".to_string(),
            ResolvedValue::Error(e) => e.as_str().to_string(),
        }
    }
}

impl<'a> From<&'a CachedValue> for ResolvedValue<'a> {
    fn from(value: &'a CachedValue) -> Self {
        match value {
            CachedValue::Number(n) => ResolvedValue::Number(*n),
            CachedValue::Text(s) => ResolvedValue::Text(s),
            CachedValue::Boolean(b) => ResolvedValue::Boolean(*b),
            CachedValue::Error(e) => ResolvedValue::Error(*e),
        }
    }
}

/// A non-empty cell as seen through the read API.
#[derive(Debug, Clone, Copy)]
pub struct CellRef<'a> {
    pub row: u32,
    pub col: u32,
    pub value: ResolvedValue<'a>,
    pub style: &'a Style,
    /// Formula text for formula cells
    pub formula: Option<&'a str>,
}

/// Shortest text that parses back to the same `f64`; integral values print
/// without a fractional part.
pub fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        let mut buf = itoa::Buffer::new();
        return buf.format(n as i64).to_string();
    }
    let mut buf = ryu::Buffer::new();
    buf.format(n).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        for code in ErrorCode::ALL {
            assert_eq!(ErrorCode::parse(code.as_str()), Some(code));
        }
        assert_eq!(ErrorCode::Div0.to_string(), "#DIV/0!");
        assert_eq!(ErrorCode::parse("#BOGUS"), None);
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(42.0), "42");
        assert_eq!(format_number(-3.0), "-3");
        assert_eq!(format_number(0.1), "0.1");
        assert_eq!(format_number(1.5e20), "1.5e20");
    }
}

//! A1-style cell references.
//!
//! Rows and columns are zero-based everywhere in the model; the one-based
//! letter/number form only exists at this boundary.

use crate::common::error::{Error, Result};

/// Number of rows in a worksheet (`1..=1048576` in A1 notation).
pub const MAX_ROWS: u32 = 1_048_576;

/// Number of columns in a worksheet (`A..=XFD`).
pub const MAX_COLS: u32 = 16_384;

/// A rectangular block of cells: top-left corner plus size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellRange {
    /// Top-left `(row, col)`.
    pub origin: (u32, u32),
    /// `(rows, cols)`, both at least 1.
    pub extent: (u32, u32),
}

impl CellRange {
    /// Build a range from two corners in any order.
    pub fn from_corners(a: (u32, u32), b: (u32, u32)) -> Self {
        let (r0, r1) = (a.0.min(b.0), a.0.max(b.0));
        let (c0, c1) = (a.1.min(b.1), a.1.max(b.1));
        Self {
            origin: (r0, c0),
            extent: (r1 - r0 + 1, c1 - c0 + 1),
        }
    }

    /// Bottom-right `(row, col)`, inclusive.
    #[inline]
    pub fn last(&self) -> (u32, u32) {
        (
            self.origin.0 + self.extent.0 - 1,
            self.origin.1 + self.extent.1 - 1,
        )
    }

    #[inline]
    pub fn is_single_cell(&self) -> bool {
        self.extent == (1, 1)
    }

    pub fn contains(&self, row: u32, col: u32) -> bool {
        let (last_row, last_col) = self.last();
        (self.origin.0..=last_row).contains(&row) && (self.origin.1..=last_col).contains(&col)
    }

    pub fn intersects(&self, other: &CellRange) -> bool {
        let (a_row, a_col) = self.last();
        let (b_row, b_col) = other.last();
        self.origin.0 <= b_row
            && other.origin.0 <= a_row
            && self.origin.1 <= b_col
            && other.origin.1 <= a_col
    }
}

impl std::fmt::Display for CellRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&format_range(self))
    }
}

/// Convert a zero-based column index to letters (`0` → `A`, `26` → `AA`).
pub fn column_letters(col: u32) -> String {
    let mut buf = [0u8; 8];
    let mut pos = buf.len();
    let mut n = col as u64 + 1;
    while n > 0 {
        n -= 1;
        pos -= 1;
        buf[pos] = b'A' + (n % 26) as u8;
        n /= 26;
    }
    // Only ASCII letters were written
    String::from_utf8_lossy(&buf[pos..]).into_owned()
}

/// Convert column letters (any case) to a zero-based index.
pub fn column_index(letters: &str) -> Result<u32> {
    if letters.is_empty() || letters.len() > 3 {
        return Err(Error::InvalidAddress(letters.to_string()));
    }
    let mut value: u32 = 0;
    for b in letters.bytes() {
        if !b.is_ascii_alphabetic() {
            return Err(Error::InvalidAddress(letters.to_string()));
        }
        value = value * 26 + u32::from(b.to_ascii_uppercase() - b'A') + 1;
    }
    let col = value - 1;
    if col >= MAX_COLS {
        return Err(Error::InvalidAddress(letters.to_string()));
    }
    Ok(col)
}

/// Parse a single reference such as `B7` or `$b$7` into `(row, col)`.
pub fn parse_ref(s: &str) -> Result<(u32, u32)> {
    let invalid = || Error::InvalidAddress(s.to_string());
    let bytes = s.as_bytes();

    let mut pos = usize::from(bytes.first() == Some(&b'$'));
    let letters_start = pos;
    while pos < bytes.len() && bytes[pos].is_ascii_alphabetic() {
        pos += 1;
    }
    let letters = &s[letters_start..pos];
    if letters.is_empty() {
        return Err(invalid());
    }

    if bytes.get(pos) == Some(&b'$') {
        pos += 1;
    }
    let digits = &bytes[pos..];
    // Rejects empty runs, trailing letters and a leading zero in one go
    if digits.is_empty() || digits[0] == b'0' || !digits.iter().all(u8::is_ascii_digit) {
        return Err(invalid());
    }
    let row_number: u32 = atoi_simd::parse::<u32, false, false>(digits).map_err(|_| invalid())?;
    if row_number > MAX_ROWS {
        return Err(invalid());
    }

    let col = column_index(letters).map_err(|_| invalid())?;
    Ok((row_number - 1, col))
}

/// Format `(row, col)` as an uppercase A1 reference.
pub fn format_ref(row: u32, col: u32) -> String {
    let mut out = column_letters(col);
    let mut buf = itoa::Buffer::new();
    out.push_str(buf.format(row as u64 + 1));
    out
}

/// Parse `A1` or `A1:C10` (corners in any order).
pub fn parse_range(s: &str) -> Result<CellRange> {
    match s.split_once(':') {
        Some((first, second)) => {
            let a = parse_ref(first)?;
            let b = parse_ref(second)?;
            Ok(CellRange::from_corners(a, b))
        },
        None => {
            let origin = parse_ref(s)?;
            Ok(CellRange {
                origin,
                extent: (1, 1),
            })
        },
    }
}

/// Format a range, collapsing single cells to a plain reference.
pub fn format_range(range: &CellRange) -> String {
    let start = format_ref(range.origin.0, range.origin.1);
    if range.is_single_cell() {
        return start;
    }
    let (row, col) = range.last();
    format!("{start}:{}", format_ref(row, col))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_column_letters() {
        assert_eq!(column_letters(0), "A");
        assert_eq!(column_letters(25), "Z");
        assert_eq!(column_letters(26), "AA");
        assert_eq!(column_letters(701), "ZZ");
        assert_eq!(column_letters(702), "AAA");
        assert_eq!(column_letters(MAX_COLS - 1), "XFD");
    }

    #[test]
    fn test_parse_ref() {
        assert_eq!(parse_ref("A1").unwrap(), (0, 0));
        assert_eq!(parse_ref("b7").unwrap(), (6, 1));
        assert_eq!(parse_ref("$C$3").unwrap(), (2, 2));
        assert_eq!(parse_ref("XFD1048576").unwrap(), (MAX_ROWS - 1, MAX_COLS - 1));
    }

    #[test]
    fn test_parse_ref_rejects_malformed() {
        for bad in ["", "A", "1", "A0", "A01", "1A", "A1B", "XFE1", "A1048577", "A-1", "A 1"] {
            assert!(
                matches!(parse_ref(bad), Err(Error::InvalidAddress(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_parse_range_normalises_corners() {
        let range = parse_range("C10:A1").unwrap();
        assert_eq!(range.origin, (0, 0));
        assert_eq!(range.extent, (10, 3));
        assert_eq!(format_range(&range), "A1:C10");

        let single = parse_range("B2").unwrap();
        assert_eq!(single.extent, (1, 1));
        assert_eq!(single.to_string(), "B2");
    }

    #[test]
    fn test_range_intersection() {
        let a = parse_range("A1:B2").unwrap();
        let b = parse_range("B2:C3").unwrap();
        let c = parse_range("C1:D1").unwrap();
        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
        assert!(b.contains(2, 2));
        assert!(!b.contains(0, 0));
    }

    proptest! {
        #[test]
        fn prop_format_parse_roundtrip(row in 0..MAX_ROWS, col in 0..MAX_COLS) {
            let text = format_ref(row, col);
            prop_assert_eq!(parse_ref(&text).unwrap(), (row, col));
            prop_assert_eq!(parse_ref(&text.to_ascii_lowercase()).unwrap(), (row, col));
        }

        #[test]
        fn prop_column_roundtrip(col in 0..MAX_COLS) {
            prop_assert_eq!(column_index(&column_letters(col)).unwrap(), col);
        }
    }
}

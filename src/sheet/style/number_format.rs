//! Number format definitions and utilities.
//!
//! Excel reserves format ids 0-163 for built-in formats; only the
//! locale-independent subset has a fixed code. Custom codes are numbered
//! from [`FIRST_CUSTOM_FORMAT_ID`].

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use phf::phf_map;

/// First id available for workbook-defined number formats.
pub const FIRST_CUSTOM_FORMAT_ID: u32 = 164;

/// The `General` format code (id 0).
pub const GENERAL: &str = "General";

static BUILTIN_FORMATS: phf::Map<u32, &'static str> = phf_map! {
    0u32 => "General",
    1u32 => "0",
    2u32 => "0.00",
    3u32 => "#,##0",
    4u32 => "#,##0.00",
    5u32 => "$#,##0_);($#,##0)",
    6u32 => "$#,##0_);[Red]($#,##0)",
    7u32 => "$#,##0.00_);($#,##0.00)",
    8u32 => "$#,##0.00_);[Red]($#,##0.00)",
    9u32 => "0%",
    10u32 => "0.00%",
    11u32 => "0.00E+00",
    12u32 => "# ?/?",
    13u32 => "# ??/??",
    14u32 => "mm-dd-yy",
    15u32 => "d-mmm-yy",
    16u32 => "d-mmm",
    17u32 => "mmm-yy",
    18u32 => "h:mm AM/PM",
    19u32 => "h:mm:ss AM/PM",
    20u32 => "h:mm",
    21u32 => "h:mm:ss",
    22u32 => "m/d/yy h:mm",
    37u32 => "#,##0_);(#,##0)",
    38u32 => "#,##0_);[Red](#,##0)",
    39u32 => "#,##0.00_);(#,##0.00)",
    40u32 => "#,##0.00_);[Red](#,##0.00)",
    41u32 => r#"_(* #,##0_);_(* (#,##0);_(* "-"_);_(@_)"#,
    42u32 => r#"_($* #,##0_);_($* (#,##0);_($* "-"_);_(@_)"#,
    43u32 => r#"_(* #,##0.00_);_(* (#,##0.00);_(* "-"??_);_(@_)"#,
    44u32 => r#"_($* #,##0.00_);_($* (#,##0.00);_($* "-"??_);_(@_)"#,
    45u32 => "mm:ss",
    46u32 => "[h]:mm:ss",
    47u32 => "mm:ss.0",
    48u32 => "##0.0E+0",
    49u32 => "@",
};

static BUILTIN_IDS: phf::Map<&'static str, u32> = phf_map! {
    "General" => 0u32,
    "0" => 1u32,
    "0.00" => 2u32,
    "#,##0" => 3u32,
    "#,##0.00" => 4u32,
    "$#,##0_);($#,##0)" => 5u32,
    "$#,##0_);[Red]($#,##0)" => 6u32,
    "$#,##0.00_);($#,##0.00)" => 7u32,
    "$#,##0.00_);[Red]($#,##0.00)" => 8u32,
    "0%" => 9u32,
    "0.00%" => 10u32,
    "0.00E+00" => 11u32,
    "# ?/?" => 12u32,
    "# ??/??" => 13u32,
    "mm-dd-yy" => 14u32,
    "d-mmm-yy" => 15u32,
    "d-mmm" => 16u32,
    "mmm-yy" => 17u32,
    "h:mm AM/PM" => 18u32,
    "h:mm:ss AM/PM" => 19u32,
    "h:mm" => 20u32,
    "h:mm:ss" => 21u32,
    "m/d/yy h:mm" => 22u32,
    "#,##0_);(#,##0)" => 37u32,
    "#,##0_);[Red](#,##0)" => 38u32,
    "#,##0.00_);(#,##0.00)" => 39u32,
    "#,##0.00_);[Red](#,##0.00)" => 40u32,
    r#"_(* #,##0_);_(* (#,##0);_(* "-"_);_(@_)"# => 41u32,
    r#"_($* #,##0_);_($* (#,##0);_($* "-"_);_(@_)"# => 42u32,
    r#"_(* #,##0.00_);_(* (#,##0.00);_(* "-"??_);_(@_)"# => 43u32,
    r#"_($* #,##0.00_);_($* (#,##0.00);_($* "-"??_);_(@_)"# => 44u32,
    "mm:ss" => 45u32,
    "[h]:mm:ss" => 46u32,
    "mm:ss.0" => 47u32,
    "##0.0E+0" => 48u32,
    "@" => 49u32,
};

/// The number format of a style.
///
/// Either a format code, or a reserved built-in id whose code depends on the
/// reader's locale (27-36, 50-163) and so is kept as the bare id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NumberFormat(Repr);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Repr {
    Code(String),
    Builtin(u32),
}

impl NumberFormat {
    /// Format with an explicit code.
    pub fn code(code: impl Into<String>) -> Self {
        Self(Repr::Code(code.into()))
    }

    /// Format for a reserved id, or `None` for custom ids (164 and up).
    ///
    /// Ids with a fixed code resolve to that code, so
    /// `NumberFormat::from_id(10) == NumberFormat::code("0.00%")`.
    pub fn from_id(id: u32) -> Option<Self> {
        match builtin_format_code(id) {
            Some(code) => Some(Self::code(code)),
            None if id < FIRST_CUSTOM_FORMAT_ID => Some(Self(Repr::Builtin(id))),
            None => None,
        }
    }

    /// The format code, if known.
    pub fn as_code(&self) -> Option<&str> {
        match &self.0 {
            Repr::Code(code) => Some(code),
            Repr::Builtin(_) => None,
        }
    }

    /// The reserved id when the format is built in.
    pub fn builtin_id(&self) -> Option<u32> {
        match &self.0 {
            Repr::Code(code) => builtin_format_id(code),
            Repr::Builtin(id) => Some(*id),
        }
    }

    /// How the format is stored in `styles.xml`.
    pub(crate) fn key(&self) -> FormatKey<'_> {
        match &self.0 {
            Repr::Builtin(id) => FormatKey::Reserved(*id),
            Repr::Code(code) => match builtin_format_id(code) {
                Some(id) => FormatKey::Reserved(id),
                None => FormatKey::Custom(code),
            },
        }
    }

    pub fn is_general(&self) -> bool {
        self.builtin_id() == Some(0)
    }

    /// True when the format displays dates or times.
    pub fn is_date(&self) -> bool {
        match &self.0 {
            Repr::Code(code) => is_date_format(code),
            Repr::Builtin(id) => matches!(id, 27..=36 | 50..=58),
        }
    }
}

/// A reserved `numFmtId`, or a code that needs a `<numFmt>` entry.
pub(crate) enum FormatKey<'a> {
    Reserved(u32),
    Custom(&'a str),
}

impl Default for NumberFormat {
    fn default() -> Self {
        Self::code(GENERAL)
    }
}

impl From<&str> for NumberFormat {
    fn from(code: &str) -> Self {
        Self::code(code)
    }
}

impl From<String> for NumberFormat {
    fn from(code: String) -> Self {
        Self::code(code)
    }
}

impl PartialEq<str> for NumberFormat {
    fn eq(&self, other: &str) -> bool {
        self.as_code() == Some(other)
    }
}

impl PartialEq<&str> for NumberFormat {
    fn eq(&self, other: &&str) -> bool {
        self.as_code() == Some(*other)
    }
}

/// Get the format code for a built-in number format ID.
///
/// Returns `None` for ids without a fixed code (locale-specific or custom).
pub fn builtin_format_code(id: u32) -> Option<&'static str> {
    BUILTIN_FORMATS.get(&id).copied()
}

/// Built-in id for a format code, if the code is one of the fixed built-ins.
pub fn builtin_format_id(code: &str) -> Option<u32> {
    BUILTIN_IDS.get(code).copied()
}

/// Check if a format code represents a date/time format.
///
/// Only the first section is inspected. Quoted text, escaped characters and
/// bracketed locale/color tokens are skipped, and elapsed-time formats such
/// as `[h]:mm:ss` are not dates.
pub fn is_date_format(format: &str) -> bool {
    let mut escaped = false;
    let mut is_quote = false;
    let mut brackets = 0u8;
    let mut prev = ' ';
    let mut hms = false;
    let mut ap = false;

    for s in format.chars() {
        match (s, escaped, is_quote, ap, brackets) {
            (_, true, ..) => escaped = false,
            ('_' | '\\', ..) => escaped = true,
            ('"', _, true, _, _) => is_quote = false,
            (_, _, true, _, _) => (),
            ('"', _, _, _, _) => is_quote = true,
            (';', ..) => return false,
            ('[', ..) => brackets += 1,
            (']', .., 1) if hms => return false,
            (']', ..) => brackets = brackets.saturating_sub(1),
            ('a' | 'A', _, _, false, 0) => ap = true,
            ('p' | 'm' | '/' | 'P' | 'M', _, _, true, 0) => return true,
            ('d' | 'm' | 'h' | 'y' | 's' | 'D' | 'M' | 'H' | 'Y' | 'S', _, _, false, 0) => {
                return true;
            },
            _ => {
                if !(hms && s.eq_ignore_ascii_case(&prev)) {
                    hms = prev == '[' && matches!(s, 'm' | 'h' | 's' | 'M' | 'H' | 'S');
                }
            },
        }
        prev = s;
    }
    false
}

fn epoch(date1904: bool) -> Option<NaiveDateTime> {
    let date = if date1904 {
        NaiveDate::from_ymd_opt(1904, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(1899, 12, 30)?
    };
    Some(date.and_time(NaiveTime::MIN))
}

/// Convert a serial date to a timestamp, rounded to the millisecond.
pub fn serial_to_datetime(serial: f64, date1904: bool) -> Option<NaiveDateTime> {
    if !serial.is_finite() {
        return None;
    }
    let millis = (serial * 86_400_000.0).round();
    if millis.abs() > i64::MAX as f64 {
        return None;
    }
    epoch(date1904)?.checked_add_signed(Duration::milliseconds(millis as i64))
}

/// Convert a timestamp to a serial date.
pub fn datetime_to_serial(value: NaiveDateTime, date1904: bool) -> Option<f64> {
    let delta = value.signed_duration_since(epoch(date1904)?);
    Some(delta.num_milliseconds() as f64 / 86_400_000.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_date_format() {
        assert!(is_date_format("DD/MM/YY"));
        assert!(is_date_format("H:MM:SS;@"));
        assert!(is_date_format("m\"M\"d\"D\";@"));
        assert!(is_date_format("ha/p\\\\m"));
        assert!(is_date_format("yyyy-mm-dd"));

        assert!(!is_date_format("#,##0.00"));
        assert!(!is_date_format("\"$\"#,##0_);[Red](\"$\"#,##0)"));
        assert!(!is_date_format("0_ ;[Red]\\-0\\ "));
        assert!(!is_date_format("\\Y000000"));
        assert!(!is_date_format("#,##0.0####\" YMD\""));
        assert!(!is_date_format("[h]:mm:ss"));
        assert!(!is_date_format("[ss]"));
    }

    #[test]
    fn test_number_format_ids() {
        assert_eq!(NumberFormat::from_id(10), Some(NumberFormat::code("0.00%")));
        let locale = NumberFormat::from_id(58).unwrap();
        assert_eq!(locale.as_code(), None);
        assert_eq!(locale.builtin_id(), Some(58));
        assert!(locale.is_date());
        assert!(!NumberFormat::from_id(40).unwrap().is_date());
        assert_eq!(NumberFormat::from_id(164), None);
        assert_eq!(NumberFormat::code("0.000").builtin_id(), None);
        assert!(NumberFormat::default().is_general());
        assert_eq!(NumberFormat::default(), "General");
    }

    #[test]
    fn test_builtin_tables_agree() {
        for (id, code) in BUILTIN_FORMATS.entries() {
            assert_eq!(builtin_format_id(code), Some(*id), "{code}");
        }
        assert_eq!(builtin_format_code(14), Some("mm-dd-yy"));
        assert_eq!(builtin_format_code(27), None);
        assert_eq!(builtin_format_id("0.000"), None);
    }

    #[test]
    fn test_serial_dates() {
        let dt = serial_to_datetime(45_292.5, false).unwrap();
        assert_eq!(dt.to_string(), "2024-01-01 12:00:00");
        assert_eq!(datetime_to_serial(dt, false), Some(45_292.5));

        let dt1904 = serial_to_datetime(0.0, true).unwrap();
        assert_eq!(dt1904.to_string(), "1904-01-01 00:00:00");
        assert!(serial_to_datetime(f64::NAN, false).is_none());
    }
}

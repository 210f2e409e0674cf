use std::fmt;
use std::hash::{Hash, Hasher};

/// ARGB color value.
///
/// Stored as four components; the alpha channel is `FF` for ordinary opaque
/// colors written by Excel.
///
/// # Examples
///
/// ```rust
/// use litchi_xlsx::sheet::style::Argb;
///
/// let red = Argb::from_hex("FF0000").unwrap();
/// assert_eq!(red.to_hex(), "FF0000");
/// assert_eq!(red.to_argb_hex(), "FFFF0000");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Argb {
    pub a: u8,
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Argb {
    #[inline]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { a: 0xFF, r, g, b }
    }

    /// Parse `RRGGBB` or `AARRGGBB`, with or without a leading `#`.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim_start_matches('#');
        let component = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
        match hex.len() {
            6 => Some(Self::new(component(0)?, component(2)?, component(4)?)),
            8 => Some(Self {
                a: component(0)?,
                r: component(2)?,
                g: component(4)?,
                b: component(6)?,
            }),
            _ => None,
        }
    }

    /// Uppercase hex, `RRGGBB` when opaque and `AARRGGBB` otherwise.
    pub fn to_hex(&self) -> String {
        if self.a == 0xFF {
            format!("{:02X}{:02X}{:02X}", self.r, self.g, self.b)
        } else {
            self.to_argb_hex()
        }
    }

    /// Uppercase `AARRGGBB`, the form stored in the file.
    pub fn to_argb_hex(&self) -> String {
        format!("{:02X}{:02X}{:02X}{:02X}", self.a, self.r, self.g, self.b)
    }
}

impl fmt::Display for Argb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// A SpreadsheetML color reference.
#[derive(Debug, Clone, Copy)]
pub enum Color {
    /// Explicit ARGB value
    Rgb(Argb),
    /// Theme palette slot with an optional lighten/darken tint
    Theme { index: u32, tint: Option<f64> },
    /// Legacy indexed palette entry
    Indexed(u32),
    /// System automatic color
    Auto,
}

impl Color {
    /// Explicit color from `RRGGBB` or `AARRGGBB`.
    pub fn rgb(hex: &str) -> Option<Self> {
        Argb::from_hex(hex).map(Color::Rgb)
    }

    #[inline]
    pub const fn theme(index: u32) -> Self {
        Color::Theme { index, tint: None }
    }

    /// Hex form of an explicit color, `None` for theme/indexed/auto.
    pub fn rgb_hex(&self) -> Option<String> {
        match self {
            Color::Rgb(argb) => Some(argb.to_hex()),
            _ => None,
        }
    }
}

impl PartialEq for Color {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Color::Rgb(a), Color::Rgb(b)) => a == b,
            (Color::Theme { index: a, tint: ta }, Color::Theme { index: b, tint: tb }) => {
                a == b && ta.map(f64::to_bits) == tb.map(f64::to_bits)
            },
            (Color::Indexed(a), Color::Indexed(b)) => a == b,
            (Color::Auto, Color::Auto) => true,
            _ => false,
        }
    }
}

impl Eq for Color {}

impl Hash for Color {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Color::Rgb(argb) => argb.hash(state),
            Color::Theme { index, tint } => {
                index.hash(state);
                tint.map(f64::to_bits).hash(state);
            },
            Color::Indexed(idx) => idx.hash(state),
            Color::Auto => {},
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_forms() {
        assert_eq!(Color::rgb("ff0000").unwrap().rgb_hex().as_deref(), Some("FF0000"));
        assert_eq!(Color::rgb("FFFF0000"), Color::rgb("FF0000"));
        assert_eq!(Color::rgb("80FF0000").unwrap().rgb_hex().as_deref(), Some("80FF0000"));
        assert!(Color::rgb("F00").is_none());
        assert!(Color::rgb("GG0000").is_none());
    }

    #[test]
    fn test_theme_tint_equality() {
        let a = Color::Theme { index: 1, tint: Some(-0.25) };
        let b = Color::Theme { index: 1, tint: Some(-0.25) };
        assert_eq!(a, b);
        assert_ne!(a, Color::theme(1));
    }
}

//! Font information and definitions.

use super::Color;
use std::hash::{Hash, Hasher};

/// Underline style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Underline {
    #[default]
    None,
    Single,
    Double,
    SingleAccounting,
    DoubleAccounting,
}

impl Underline {
    pub fn as_str(&self) -> &'static str {
        match self {
            Underline::None => "none",
            Underline::Single => "single",
            Underline::Double => "double",
            Underline::SingleAccounting => "singleAccounting",
            Underline::DoubleAccounting => "doubleAccounting",
        }
    }

    /// Parse the `val` of `<u>`; a bare `<u/>` means single.
    pub fn parse(value: Option<&str>) -> Option<Self> {
        match value {
            None | Some("single") => Some(Underline::Single),
            Some("double") => Some(Underline::Double),
            Some("singleAccounting") => Some(Underline::SingleAccounting),
            Some("doubleAccounting") => Some(Underline::DoubleAccounting),
            Some("none") => Some(Underline::None),
            Some(_) => None,
        }
    }
}

/// Superscript/subscript positioning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VerticalAlignRun {
    #[default]
    Baseline,
    Superscript,
    Subscript,
}

impl VerticalAlignRun {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerticalAlignRun::Baseline => "baseline",
            VerticalAlignRun::Superscript => "superscript",
            VerticalAlignRun::Subscript => "subscript",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "baseline" => Some(VerticalAlignRun::Baseline),
            "superscript" => Some(VerticalAlignRun::Superscript),
            "subscript" => Some(VerticalAlignRun::Subscript),
            _ => None,
        }
    }
}

/// Font information.
///
/// Defines the visual appearance of text in cells including
/// typeface, size, color, and text decoration.
#[derive(Debug, Clone)]
pub struct Font {
    /// Font name/family (e.g., "Calibri", "Arial")
    pub name: String,
    /// Font size in points
    pub size: f64,
    pub bold: bool,
    pub italic: bool,
    pub underline: Underline,
    pub strike: bool,
    pub vert_align: VerticalAlignRun,
    pub color: Option<Color>,
    /// Font family (1=Roman, 2=Swiss, 3=Modern, 4=Script, 5=Decorative)
    pub family: Option<u32>,
    /// Font scheme (major, minor)
    pub scheme: Option<String>,
}

impl Default for Font {
    /// Calibri 11 in theme color 1, the workbook body font.
    fn default() -> Self {
        Self {
            name: "Calibri".to_string(),
            size: 11.0,
            bold: false,
            italic: false,
            underline: Underline::None,
            strike: false,
            vert_align: VerticalAlignRun::Baseline,
            color: Some(Color::theme(1)),
            family: Some(2),
            scheme: Some("minor".to_string()),
        }
    }
}

impl Font {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if the font has any special formatting.
    #[inline]
    pub fn has_formatting(&self) -> bool {
        self.bold || self.italic || self.strike || self.underline != Underline::None
    }
}

impl PartialEq for Font {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.size.to_bits() == other.size.to_bits()
            && self.bold == other.bold
            && self.italic == other.italic
            && self.underline == other.underline
            && self.strike == other.strike
            && self.vert_align == other.vert_align
            && self.color == other.color
            && self.family == other.family
            && self.scheme == other.scheme
    }
}

impl Eq for Font {}

impl Hash for Font {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.size.to_bits().hash(state);
        self.bold.hash(state);
        self.italic.hash(state);
        self.underline.hash(state);
        self.strike.hash(state);
        self.vert_align.hash(state);
        self.color.hash(state);
        self.family.hash(state);
        self.scheme.hash(state);
    }
}

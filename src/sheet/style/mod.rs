//! Cell styles and the workbook style table.
//!
//! A [`Style`] is a plain value: number format code, font, fill, border,
//! alignment and protection. Cells refer to styles by index into the
//! workbook's [`StyleTable`].
//!
//! The table interns in two levels, the way `styles.xml` is laid out:
//!
//! - number formats, fonts, fills and borders each live in their own
//!   [`InternTable`];
//! - every cell format (`xf`) is a tuple of indices into those tables plus
//!   alignment and protection, interned again in the `xf` table.
//!
//! Equal styles therefore always resolve to the same cell-format index, and
//! an index once handed out is never renumbered.

mod alignment;
mod border;
mod color;
mod fill;
mod font;
pub mod number_format;

pub use alignment::{Alignment, HorizontalAlignment, VerticalAlignment};
pub use border::{Border, BorderLineStyle, BorderSide};
pub use color::{Argb, Color};
pub use fill::{Fill, GradientFill, GradientStop, GradientType, PatternType};
pub use font::{Font, Underline, VerticalAlignRun};
pub use number_format::{FIRST_CUSTOM_FORMAT_ID, GENERAL, NumberFormat};

use crate::common::error::Result;
use crate::sheet::intern::InternTable;
use number_format::FormatKey;

/// Cell protection flags (effective only when the sheet is protected).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Protection {
    pub locked: bool,
    pub hidden: bool,
}

impl Default for Protection {
    fn default() -> Self {
        Self {
            locked: true,
            hidden: false,
        }
    }
}

/// Complete formatting of a cell.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Style {
    /// Number format, e.g. `General` or `0.00%`
    pub number_format: NumberFormat,
    pub font: Font,
    pub fill: Fill,
    pub border: Border,
    pub alignment: Alignment,
    pub protection: Protection,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            number_format: NumberFormat::default(),
            font: Font::default(),
            fill: Fill::None,
            border: Border::default(),
            alignment: Alignment::default(),
            protection: Protection::default(),
        }
    }
}

impl Style {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_number_format(mut self, format: impl Into<NumberFormat>) -> Self {
        self.number_format = format.into();
        self
    }

    pub fn with_font(mut self, font: Font) -> Self {
        self.font = font;
        self
    }

    pub fn with_fill(mut self, fill: Fill) -> Self {
        self.fill = fill;
        self
    }

    pub fn with_border(mut self, border: Border) -> Self {
        self.border = border;
        self
    }

    pub fn with_alignment(mut self, alignment: Alignment) -> Self {
        self.alignment = alignment;
        self
    }

    pub fn with_protection(mut self, protection: Protection) -> Self {
        self.protection = protection;
        self
    }

    /// True when the number format displays dates or times.
    pub fn is_date(&self) -> bool {
        self.number_format.is_date()
    }
}

/// One `cellXfs` record: indices into the sub-tables plus inline settings.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CellXf {
    pub num_fmt_id: u32,
    pub font_id: u32,
    pub fill_id: u32,
    pub border_id: u32,
    pub alignment: Alignment,
    pub protection: Protection,
}

/// Workbook-scoped style storage.
#[derive(Debug, Clone)]
pub struct StyleTable {
    /// Custom number format codes; id = `FIRST_CUSTOM_FORMAT_ID + index`
    num_fmts: InternTable<String>,
    fonts: InternTable<Font>,
    fills: InternTable<Fill>,
    borders: InternTable<Border>,
    xfs: InternTable<CellXf>,
    /// Resolved style for each xf, same indexing
    styles: Vec<Style>,
}

impl StyleTable {
    /// Table holding only the default style at index 0.
    pub fn new() -> Self {
        Self::from_styles(Vec::new())
    }

    /// Build a table whose cell-format indices match `styles` positionally.
    ///
    /// Used on load: cells in the file refer to `cellXfs` by position, so
    /// those positions are kept even when two entries resolve to the same
    /// style. An empty list yields the default table.
    pub fn from_styles(mut styles: Vec<Style>) -> Self {
        if styles.is_empty() {
            styles.push(Style::default());
        }

        let mut table = Self {
            num_fmts: InternTable::new(),
            fonts: InternTable::new(),
            fills: InternTable::new(),
            borders: InternTable::new(),
            xfs: InternTable::new(),
            styles: Vec::new(),
        };

        // Excel requires fill 0 = none and fill 1 = gray125
        table.fonts.intern(styles[0].font.clone());
        table.fills.intern(Fill::None);
        table.fills.intern(Fill::gray125());
        table.borders.intern(styles[0].border.clone());

        let xfs: Vec<CellXf> = styles.iter().map(|style| table.xf_for(style)).collect();
        table.xfs = InternTable::from_entries(xfs);
        table.styles = styles;
        table
    }

    fn xf_for(&mut self, style: &Style) -> CellXf {
        let num_fmt_id = match style.number_format.key() {
            FormatKey::Reserved(id) => id,
            FormatKey::Custom(code) => FIRST_CUSTOM_FORMAT_ID + self.num_fmts.intern(code.to_string()),
        };
        CellXf {
            num_fmt_id,
            font_id: self.fonts.intern(style.font.clone()),
            fill_id: self.fills.intern(style.fill.clone()),
            border_id: self.borders.intern(style.border.clone()),
            alignment: style.alignment.clone(),
            protection: style.protection,
        }
    }

    /// Cell-format index for `style`, adding it if needed.
    pub fn intern(&mut self, style: &Style) -> u32 {
        let xf = self.xf_for(style);
        let idx = self.xfs.intern(xf);
        if idx as usize == self.styles.len() {
            self.styles.push(style.clone());
        }
        idx
    }

    /// Resolved style for a cell-format index.
    pub fn get(&self, index: u32) -> Result<&Style> {
        // xfs and styles grow together
        self.xfs.get(index)?;
        Ok(&self.styles[index as usize])
    }

    /// The default style (index 0).
    pub fn default_style(&self) -> &Style {
        &self.styles[0]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.styles.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
    }

    /// Custom number formats as `(id, code)` in id order.
    pub fn custom_number_formats(&self) -> impl Iterator<Item = (u32, &str)> {
        self.num_fmts
            .iter()
            .enumerate()
            .map(|(i, code)| (FIRST_CUSTOM_FORMAT_ID + i as u32, code.as_str()))
    }

    pub fn fonts(&self) -> &InternTable<Font> {
        &self.fonts
    }

    pub fn fills(&self) -> &InternTable<Fill> {
        &self.fills
    }

    pub fn borders(&self) -> &InternTable<Border> {
        &self.borders
    }

    pub fn cell_xfs(&self) -> &InternTable<CellXf> {
        &self.xfs
    }
}

impl Default for StyleTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn bold_red() -> Style {
        let font = Font {
            bold: true,
            color: Color::rgb("FF0000"),
            ..Font::default()
        };
        Style::new().with_font(font)
    }

    #[test]
    fn test_default_table() {
        let table = StyleTable::new();
        assert_eq!(table.len(), 1);
        assert_eq!(table.fonts().len(), 1);
        assert_eq!(table.fills().len(), 2);
        assert_eq!(*table.fills().get(1).unwrap(), Fill::gray125());
        assert_eq!(table.borders().len(), 1);
        assert_eq!(table.get(0).unwrap(), &Style::default());
        assert_eq!(table.default_style().font.name, "Calibri");
    }

    #[test]
    fn test_intern_dedupes_by_value() {
        let mut table = StyleTable::new();
        assert_eq!(table.intern(&Style::default()), 0);
        let a = table.intern(&bold_red());
        let b = table.intern(&bold_red());
        assert_eq!(a, 1);
        assert_eq!(a, b);
        assert!(table.get(a).unwrap().font.bold);
    }

    #[test]
    fn test_number_format_ids() {
        let mut table = StyleTable::new();
        let pct = table.intern(&Style::new().with_number_format("0.00%"));
        let custom = table.intern(&Style::new().with_number_format("0.000"));
        assert_eq!(table.cell_xfs().get(pct).unwrap().num_fmt_id, 10);
        assert_eq!(table.cell_xfs().get(custom).unwrap().num_fmt_id, 164);
        let locale = NumberFormat::from_id(58).unwrap();
        let dated = table.intern(&Style::new().with_number_format(locale));
        assert_eq!(table.cell_xfs().get(dated).unwrap().num_fmt_id, 58);
        let customs: Vec<_> = table.custom_number_formats().collect();
        assert_eq!(customs, [(164, "0.000")]);
    }

    #[test]
    fn test_from_styles_keeps_positions() {
        let styles = vec![Style::default(), bold_red(), Style::default()];
        let mut table = StyleTable::from_styles(styles);
        assert_eq!(table.len(), 3);
        assert_eq!(table.get(2).unwrap(), &Style::default());
        assert_eq!(table.intern(&Style::default()), 0);
        assert!(table.get(3).is_err());
    }

    fn arb_style() -> impl Strategy<Value = Style> {
        (any::<bool>(), any::<bool>(), 0u8..4, 0usize..3, prop::sample::select(vec!["General", "0.00", "0.0%"]))
            .prop_map(|(bold, italic, color, fmt, code)| {
                let font = Font {
                    bold,
                    italic,
                    color: Some(Color::Rgb(Argb::new(color * 60, 0, 0))),
                    ..Font::default()
                };
                let fill = match fmt {
                    0 => Fill::None,
                    1 => Fill::solid(Color::theme(4)),
                    _ => Fill::gray125(),
                };
                Style::new()
                    .with_font(font)
                    .with_fill(fill)
                    .with_number_format(code)
            })
    }

    proptest! {
        #[test]
        fn prop_interning_respects_equality(a in arb_style(), b in arb_style()) {
            let mut table = StyleTable::new();
            let ia = table.intern(&a);
            let ib = table.intern(&b);
            prop_assert_eq!(a == b, ia == ib);
            prop_assert_eq!(table.get(ia).unwrap(), &a);
            prop_assert_eq!(table.get(ib).unwrap(), &b);
        }
    }
}

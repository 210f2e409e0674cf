//! Print settings: page setup, margins, headers and footers.
//!
//! Each part maps onto one worksheet element (`printOptions`, `pageMargins`,
//! `pageSetup`, `headerFooter`). A part left as `None` is not written.

use crate::common::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    /// Printer default
    #[default]
    Default,
    Portrait,
    Landscape,
}

impl Orientation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Orientation::Default => "default",
            Orientation::Portrait => "portrait",
            Orientation::Landscape => "landscape",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "default" => Some(Orientation::Default),
            "portrait" => Some(Orientation::Portrait),
            "landscape" => Some(Orientation::Landscape),
            _ => None,
        }
    }
}

/// Order pages are numbered in when the sheet spans both directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PageOrder {
    #[default]
    DownThenOver,
    OverThenDown,
}

impl PageOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            PageOrder::DownThenOver => "downThenOver",
            PageOrder::OverThenDown => "overThenDown",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "downThenOver" => Some(PageOrder::DownThenOver),
            "overThenDown" => Some(PageOrder::OverThenDown),
            _ => None,
        }
    }
}

/// Where cell comments are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PrintComments {
    #[default]
    None,
    AtEnd,
    AsDisplayed,
}

impl PrintComments {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrintComments::None => "none",
            PrintComments::AtEnd => "atEnd",
            PrintComments::AsDisplayed => "asDisplayed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "none" => Some(PrintComments::None),
            "atEnd" => Some(PrintComments::AtEnd),
            "asDisplayed" => Some(PrintComments::AsDisplayed),
            _ => None,
        }
    }
}

/// How error values are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PrintErrors {
    #[default]
    Displayed,
    Blank,
    Dash,
    NA,
}

impl PrintErrors {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrintErrors::Displayed => "displayed",
            PrintErrors::Blank => "blank",
            PrintErrors::Dash => "dash",
            PrintErrors::NA => "NA",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "displayed" => Some(PrintErrors::Displayed),
            "blank" => Some(PrintErrors::Blank),
            "dash" => Some(PrintErrors::Dash),
            "NA" => Some(PrintErrors::NA),
            _ => None,
        }
    }
}

/// `pageSetup` plus the fit-to-page switch stored in `sheetPr`.
#[derive(Debug, Clone, PartialEq)]
pub struct PageSetup {
    /// Paper size code, 1 = Letter, 9 = A4
    pub paper_size: u32,
    /// Print scale in percent (10-400), used unless `fit_to_page` is set
    pub scale: u32,
    pub first_page_number: Option<u32>,
    /// Scale the print to `fit_to_width` x `fit_to_height` pages
    pub fit_to_page: bool,
    /// Pages across; 0 means as many as needed
    pub fit_to_width: u32,
    /// Pages down; 0 means as many as needed
    pub fit_to_height: u32,
    pub page_order: PageOrder,
    pub orientation: Orientation,
    pub use_printer_defaults: bool,
    pub black_and_white: bool,
    pub draft: bool,
    pub cell_comments: PrintComments,
    pub errors: PrintErrors,
    pub horizontal_dpi: Option<u32>,
    pub vertical_dpi: Option<u32>,
    pub copies: u32,
    /// Relationship id of the printer settings part, kept as read
    pub printer_settings: Option<String>,
}

impl Default for PageSetup {
    fn default() -> Self {
        Self {
            paper_size: 1,
            scale: 100,
            first_page_number: None,
            fit_to_page: false,
            fit_to_width: 1,
            fit_to_height: 1,
            page_order: PageOrder::DownThenOver,
            orientation: Orientation::Default,
            use_printer_defaults: true,
            black_and_white: false,
            draft: false,
            cell_comments: PrintComments::None,
            errors: PrintErrors::Displayed,
            horizontal_dpi: None,
            vertical_dpi: None,
            copies: 1,
            printer_settings: None,
        }
    }
}

impl PageSetup {
    pub fn set_scale(&mut self, percent: u32) -> Result<()> {
        if !(10..=400).contains(&percent) {
            return Err(Error::InvalidOperation(format!("print scale {percent}% outside 10..=400")));
        }
        self.scale = percent;
        self.fit_to_page = false;
        Ok(())
    }

    /// Fit the print onto `width` pages across and `height` pages down.
    pub fn fit_to_pages(&mut self, width: u32, height: u32) {
        self.fit_to_page = true;
        self.fit_to_width = width;
        self.fit_to_height = height;
    }
}

/// Page margins in inches.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageMargins {
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
    pub header: f64,
    pub footer: f64,
}

impl Default for PageMargins {
    fn default() -> Self {
        Self {
            left: 0.7,
            right: 0.7,
            top: 0.75,
            bottom: 0.75,
            header: 0.3,
            footer: 0.3,
        }
    }
}

/// Header and footer text, in Excel's `&L`/`&C`/`&R` code syntax.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderFooter {
    pub different_odd_even: bool,
    pub different_first: bool,
    pub scale_with_doc: bool,
    pub align_with_margins: bool,
    pub odd_header: Option<String>,
    pub odd_footer: Option<String>,
    pub even_header: Option<String>,
    pub even_footer: Option<String>,
    pub first_header: Option<String>,
    pub first_footer: Option<String>,
}

impl Default for HeaderFooter {
    fn default() -> Self {
        Self {
            different_odd_even: false,
            different_first: false,
            scale_with_doc: true,
            align_with_margins: true,
            odd_header: None,
            odd_footer: None,
            even_header: None,
            even_footer: None,
            first_header: None,
            first_footer: None,
        }
    }
}

impl HeaderFooter {
    /// Child elements in schema order with their text.
    pub(crate) fn parts(&self) -> [(&'static str, Option<&str>); 6] {
        [
            ("oddHeader", self.odd_header.as_deref()),
            ("oddFooter", self.odd_footer.as_deref()),
            ("evenHeader", self.even_header.as_deref()),
            ("evenFooter", self.even_footer.as_deref()),
            ("firstHeader", self.first_header.as_deref()),
            ("firstFooter", self.first_footer.as_deref()),
        ]
    }

    /// Text slot for a child element name.
    pub(crate) fn part_mut(&mut self, name: &[u8]) -> Option<&mut Option<String>> {
        Some(match name {
            b"oddHeader" => &mut self.odd_header,
            b"oddFooter" => &mut self.odd_footer,
            b"evenHeader" => &mut self.even_header,
            b"evenFooter" => &mut self.even_footer,
            b"firstHeader" => &mut self.first_header,
            b"firstFooter" => &mut self.first_footer,
            _ => return None,
        })
    }
}

/// `printOptions`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrintOptions {
    pub horizontal_centered: bool,
    pub vertical_centered: bool,
    /// Print row and column headings
    pub headings: bool,
    pub grid_lines: bool,
    pub grid_lines_set: bool,
}

impl Default for PrintOptions {
    fn default() -> Self {
        Self {
            horizontal_centered: false,
            vertical_centered: false,
            headings: false,
            grid_lines: false,
            grid_lines_set: true,
        }
    }
}

/// All print settings of a worksheet.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PrintLayout {
    pub options: Option<PrintOptions>,
    pub margins: Option<PageMargins>,
    pub setup: Option<PageSetup>,
    pub header_footer: Option<HeaderFooter>,
}

impl PrintLayout {
    pub fn is_empty(&self) -> bool {
        self.options.is_none() && self.margins.is_none() && self.setup.is_none() && self.header_footer.is_none()
    }
}

//! Worksheet window settings (`sheetView`).

use crate::common::error::{Error, Result};
use crate::sheet::address::{self, format_ref};

/// Smallest and largest zoom Excel accepts, in percent.
pub const ZOOM_RANGE: std::ops::RangeInclusive<u16> = 10..=400;

/// Layout the sheet is shown in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    #[default]
    Normal,
    PageBreakPreview,
    PageLayout,
}

impl ViewMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViewMode::Normal => "normal",
            ViewMode::PageBreakPreview => "pageBreakPreview",
            ViewMode::PageLayout => "pageLayout",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "normal" => Some(ViewMode::Normal),
            "pageBreakPreview" => Some(ViewMode::PageBreakPreview),
            "pageLayout" => Some(ViewMode::PageLayout),
            _ => None,
        }
    }
}

/// Active cell and selected ranges of the active pane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    /// `(row, col)` of the active cell
    pub active_cell: (u32, u32),
    /// Space-separated ranges, e.g. `A1:B4 D2`
    pub sqref: String,
}

impl Selection {
    /// Select a single cell.
    pub fn cell(reference: &str) -> Result<Self> {
        let active_cell = address::parse_ref(reference)?;
        Ok(Self {
            active_cell,
            sqref: format_ref(active_cell.0, active_cell.1),
        })
    }

    /// Select `sqref` with `active` as the active cell.
    pub fn ranges(active: &str, sqref: &str) -> Result<Self> {
        let active_cell = address::parse_ref(active)?;
        for range in sqref.split_ascii_whitespace() {
            address::parse_range(range)?;
        }
        if sqref.trim().is_empty() {
            return Err(Error::InvalidAddress(sqref.to_string()));
        }
        Ok(Self {
            active_cell,
            sqref: sqref.split_ascii_whitespace().collect::<Vec<_>>().join(" "),
        })
    }
}

/// Display settings of a worksheet window.
///
/// Frozen panes and the selected tab are kept on the worksheet and
/// workbook; everything else `sheetView` carries lives here.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetView {
    pub show_grid_lines: bool,
    pub show_row_col_headers: bool,
    pub show_formulas: bool,
    pub show_zeros: bool,
    pub show_outline_symbols: bool,
    pub show_ruler: bool,
    pub show_white_space: bool,
    pub right_to_left: bool,
    pub window_protection: bool,
    pub view: ViewMode,
    /// Indexed colour of the grid lines; `None` uses the automatic colour
    pub grid_color: Option<u32>,
    /// Top-left visible cell
    pub top_left_cell: Option<(u32, u32)>,
    /// Current zoom in percent
    pub zoom_scale: u16,
    pub zoom_scale_normal: Option<u16>,
    pub zoom_scale_page_layout_view: Option<u16>,
    pub zoom_scale_sheet_layout_view: Option<u16>,
    pub selection: Option<Selection>,
}

impl Default for SheetView {
    fn default() -> Self {
        Self {
            show_grid_lines: true,
            show_row_col_headers: true,
            show_formulas: false,
            show_zeros: true,
            show_outline_symbols: true,
            show_ruler: true,
            show_white_space: true,
            right_to_left: false,
            window_protection: false,
            view: ViewMode::Normal,
            grid_color: None,
            top_left_cell: None,
            zoom_scale: 100,
            zoom_scale_normal: None,
            zoom_scale_page_layout_view: None,
            zoom_scale_sheet_layout_view: None,
            selection: None,
        }
    }
}

impl SheetView {
    /// Set the zoom for the current view mode.
    pub fn set_zoom(&mut self, percent: u16) -> Result<()> {
        if !ZOOM_RANGE.contains(&percent) {
            return Err(Error::InvalidOperation(format!("zoom {percent}% outside 10..=400")));
        }
        self.zoom_scale = percent;
        match self.view {
            ViewMode::Normal => self.zoom_scale_normal = Some(percent),
            ViewMode::PageBreakPreview => self.zoom_scale_sheet_layout_view = Some(percent),
            ViewMode::PageLayout => self.zoom_scale_page_layout_view = Some(percent),
        }
        Ok(())
    }

    /// Select a cell or ranges; `None` resets to `A1`.
    pub fn select(&mut self, selection: Option<Selection>) {
        self.selection = selection;
    }
}

//! Worksheet data: sparse cells plus sheet-level layout settings.

use crate::common::error::{Error, Result};
use crate::ooxml::opc::{PackURI, Relationship};
use crate::sheet::address::{self, CellRange, MAX_COLS, MAX_ROWS};
use crate::sheet::cell::{Cell, CellRef, CellValue, ResolvedValue};
use crate::sheet::page_setup::PrintLayout;
use crate::sheet::protection::SheetProtection;
use crate::sheet::style::Color;
use crate::sheet::view::SheetView;
use crate::sheet::workbook::Workbook;
use std::collections::BTreeMap;

/// Tab visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SheetVisibility {
    #[default]
    Visible,
    Hidden,
    /// Hidden and not listed in Excel's unhide dialog
    VeryHidden,
}

impl SheetVisibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            SheetVisibility::Visible => "visible",
            SheetVisibility::Hidden => "hidden",
            SheetVisibility::VeryHidden => "veryHidden",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "visible" => Some(SheetVisibility::Visible),
            "hidden" => Some(SheetVisibility::Hidden),
            "veryHidden" => Some(SheetVisibility::VeryHidden),
            _ => None,
        }
    }
}

/// Width and visibility of one column.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ColumnInfo {
    /// Width in characters of the default font
    pub width: Option<f64>,
    pub hidden: bool,
}

/// Height and visibility of one row.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RowInfo {
    /// Height in points
    pub height: Option<f64>,
    pub hidden: bool,
}

/// Frozen rows above and columns left of the scrolling area.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreezePanes {
    pub rows: u32,
    pub cols: u32,
}

/// A top-level XML element kept verbatim because the model does not cover it.
///
/// `order` is the element's position in the schema sequence so it can be
/// written back in a valid place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RetainedElement {
    pub order: u8,
    pub xml: String,
}

/// Content of a loaded worksheet part that is carried through unchanged.
#[derive(Debug, Clone, Default)]
pub(crate) struct RetainedSheetContent {
    /// Part name the sheet was loaded from
    pub part_name: Option<PackURI>,
    pub elements: Vec<RetainedElement>,
    /// Root attributes needed by `elements` (`xmlns:*`, `mc:Ignorable`)
    pub root_attributes: Vec<(String, String)>,
    /// Relationships of the sheet part, ids unchanged
    pub rels: Vec<Relationship>,
}

#[derive(Debug, Clone)]
pub struct Worksheet {
    name: String,
    visibility: SheetVisibility,
    cells: BTreeMap<(u32, u32), Cell>,
    columns: BTreeMap<u32, ColumnInfo>,
    rows: BTreeMap<u32, RowInfo>,
    merges: Vec<CellRange>,
    freeze: Option<FreezePanes>,
    view: SheetView,
    print: PrintLayout,
    protection: Option<SheetProtection>,
    tab_color: Option<Color>,
    default_row_height: Option<f64>,
    default_column_width: Option<f64>,
    pub(crate) retained: RetainedSheetContent,
}

impl Worksheet {
    /// Empty worksheet. The name must already be validated by the workbook.
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            visibility: SheetVisibility::Visible,
            cells: BTreeMap::new(),
            columns: BTreeMap::new(),
            rows: BTreeMap::new(),
            merges: Vec::new(),
            freeze: None,
            view: SheetView::default(),
            print: PrintLayout::default(),
            protection: None,
            tab_color: None,
            default_row_height: None,
            default_column_width: None,
            retained: RetainedSheetContent::default(),
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn set_name(&mut self, name: String) {
        self.name = name;
    }

    #[inline]
    pub fn visibility(&self) -> SheetVisibility {
        self.visibility
    }

    pub fn set_visibility(&mut self, visibility: SheetVisibility) {
        self.visibility = visibility;
    }

    /// Stored cell at `(row, col)`.
    pub fn cell_at(&self, row: u32, col: u32) -> Option<&Cell> {
        self.cells.get(&(row, col))
    }

    /// Stored cell at an A1 reference.
    pub fn cell(&self, reference: &str) -> Result<Option<&Cell>> {
        let (row, col) = address::parse_ref(reference)?;
        Ok(self.cell_at(row, col))
    }

    /// Stored cells in row-major order.
    pub fn raw_cells(&self) -> impl Iterator<Item = ((u32, u32), &Cell)> {
        self.cells.iter().map(|(pos, cell)| (*pos, cell))
    }

    /// Number of stored cells.
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Insert or replace a cell. Empty unstyled cells are removed.
    pub(crate) fn put_cell(&mut self, row: u32, col: u32, cell: Cell) {
        if cell.value.is_empty() && cell.style == 0 {
            self.cells.remove(&(row, col));
        } else {
            self.cells.insert((row, col), cell);
        }
    }

    /// Remove every cell, keeping row, column and sheet settings.
    pub fn clear_cells(&mut self) {
        self.cells.clear();
    }

    /// Remove a cell, returning what was stored.
    pub fn clear_cell(&mut self, row: u32, col: u32) -> Option<Cell> {
        self.cells.remove(&(row, col))
    }

    /// Cells in row-major order with shared strings and styles resolved.
    ///
    /// Yields [`Error::IndexOutOfRange`] for a cell whose string or style
    /// index is not in `workbook`, which happens only when a sheet is paired
    /// with a workbook it does not belong to.
    pub fn cells<'a>(&'a self, workbook: &'a Workbook) -> impl Iterator<Item = Result<CellRef<'a>>> {
        self.cells
            .iter()
            .map(move |(&(row, col), cell)| resolve_cell(row, col, cell, workbook))
    }

    /// Resolved view of one cell.
    pub fn cell_ref<'a>(&'a self, workbook: &'a Workbook, row: u32, col: u32) -> Result<Option<CellRef<'a>>> {
        self.cells
            .get(&(row, col))
            .map(|cell| resolve_cell(row, col, cell, workbook))
            .transpose()
    }

    /// Bounding range of all stored cells, `None` for an empty sheet.
    pub fn dimension(&self) -> Option<CellRange> {
        let (&(first_row, _), _) = self.cells.first_key_value()?;
        let (&(last_row, _), _) = self.cells.last_key_value()?;
        let (min_col, max_col) = self
            .cells
            .keys()
            .fold((u32::MAX, 0), |(lo, hi), &(_, col)| (lo.min(col), hi.max(col)));
        Some(CellRange::from_corners((first_row, min_col), (last_row, max_col)))
    }

    // Columns and rows

    pub fn set_column_width(&mut self, col: u32, width: f64) -> Result<()> {
        check_col(col)?;
        if !(0.0..=255.0).contains(&width) {
            return Err(Error::InvalidOperation(format!("column width {width} outside 0..=255")));
        }
        self.columns.entry(col).or_default().width = Some(width);
        Ok(())
    }

    pub fn set_column_hidden(&mut self, col: u32, hidden: bool) -> Result<()> {
        check_col(col)?;
        self.columns.entry(col).or_default().hidden = hidden;
        Ok(())
    }

    pub fn column(&self, col: u32) -> Option<&ColumnInfo> {
        self.columns.get(&col)
    }

    pub fn columns(&self) -> impl Iterator<Item = (u32, &ColumnInfo)> {
        self.columns.iter().map(|(col, info)| (*col, info))
    }

    pub(crate) fn set_column_info(&mut self, col: u32, info: ColumnInfo) {
        self.columns.insert(col, info);
    }

    pub fn set_row_height(&mut self, row: u32, height: f64) -> Result<()> {
        check_row(row)?;
        if !(0.0..=409.0).contains(&height) {
            return Err(Error::InvalidOperation(format!("row height {height} outside 0..=409")));
        }
        self.rows.entry(row).or_default().height = Some(height);
        Ok(())
    }

    pub fn set_row_hidden(&mut self, row: u32, hidden: bool) -> Result<()> {
        check_row(row)?;
        self.rows.entry(row).or_default().hidden = hidden;
        Ok(())
    }

    pub fn row(&self, row: u32) -> Option<&RowInfo> {
        self.rows.get(&row)
    }

    pub fn rows(&self) -> impl Iterator<Item = (u32, &RowInfo)> {
        self.rows.iter().map(|(row, info)| (*row, info))
    }

    pub(crate) fn set_row_info(&mut self, row: u32, info: RowInfo) {
        self.rows.insert(row, info);
    }

    pub fn default_row_height(&self) -> Option<f64> {
        self.default_row_height
    }

    pub fn set_default_row_height(&mut self, height: Option<f64>) {
        self.default_row_height = height;
    }

    pub fn default_column_width(&self) -> Option<f64> {
        self.default_column_width
    }

    pub fn set_default_column_width(&mut self, width: Option<f64>) {
        self.default_column_width = width;
    }

    // Merged cells

    /// Merge a range such as `A1:C3`. Overlapping an existing merge fails.
    pub fn merge_cells(&mut self, range: &str) -> Result<CellRange> {
        let range = address::parse_range(range)?;
        self.add_merge(range)?;
        Ok(range)
    }

    pub(crate) fn add_merge(&mut self, range: CellRange) -> Result<()> {
        if range.is_single_cell() {
            return Err(Error::InvalidAddress(format!("{range} is a single cell")));
        }
        if let Some(existing) = self.merges.iter().find(|m| m.intersects(&range)) {
            return Err(Error::InvalidAddress(format!("{range} overlaps merged range {existing}")));
        }
        self.merges.push(range);
        Ok(())
    }

    /// Remove the merge exactly matching `range`. Returns whether one existed.
    pub fn unmerge_cells(&mut self, range: &str) -> Result<bool> {
        let range = address::parse_range(range)?;
        let before = self.merges.len();
        self.merges.retain(|m| *m != range);
        Ok(self.merges.len() != before)
    }

    pub fn merged_ranges(&self) -> &[CellRange] {
        &self.merges
    }

    // Views and protection

    /// Freeze `rows` rows and `cols` columns. `(0, 0)` removes the freeze.
    pub fn freeze_panes(&mut self, rows: u32, cols: u32) -> Result<()> {
        if rows >= MAX_ROWS || cols >= MAX_COLS {
            return Err(Error::InvalidAddress(format!("freeze at {rows} rows, {cols} columns")));
        }
        self.freeze = (rows > 0 || cols > 0).then_some(FreezePanes { rows, cols });
        Ok(())
    }

    pub fn frozen_panes(&self) -> Option<FreezePanes> {
        self.freeze
    }

    /// Grid lines, headings, zoom and selection of the sheet window.
    pub fn view(&self) -> &SheetView {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut SheetView {
        &mut self.view
    }

    pub fn print_layout(&self) -> &PrintLayout {
        &self.print
    }

    pub fn print_layout_mut(&mut self) -> &mut PrintLayout {
        &mut self.print
    }

    /// Turn on protection, hashing `password` with the legacy sheet hash.
    pub fn protect(&mut self, password: Option<&str>) -> &mut SheetProtection {
        self.protection.insert(SheetProtection::new(password))
    }

    pub fn unprotect(&mut self) {
        self.protection = None;
    }

    pub fn protection(&self) -> Option<&SheetProtection> {
        self.protection.as_ref()
    }

    pub(crate) fn set_protection(&mut self, protection: Option<SheetProtection>) {
        self.protection = protection;
    }

    pub fn tab_color(&self) -> Option<&Color> {
        self.tab_color.as_ref()
    }

    pub fn set_tab_color(&mut self, color: Option<Color>) {
        self.tab_color = color;
    }
}

fn check_row(row: u32) -> Result<()> {
    if row >= MAX_ROWS {
        return Err(Error::InvalidAddress(format!("row index {row}")));
    }
    Ok(())
}

fn check_col(col: u32) -> Result<()> {
    if col >= MAX_COLS {
        return Err(Error::InvalidAddress(format!("column index {col}")));
    }
    Ok(())
}

fn resolve_cell<'a>(row: u32, col: u32, cell: &'a Cell, workbook: &'a Workbook) -> Result<CellRef<'a>> {
    let style = workbook.style(cell.style)?;
    let (value, formula) = match &cell.value {
        CellValue::Empty => (ResolvedValue::Empty, None),
        CellValue::Number(n) => (ResolvedValue::Number(*n), None),
        CellValue::Text(idx) => (ResolvedValue::Text(workbook.shared_string(*idx)?), None),
        CellValue::InlineText(text) => (ResolvedValue::Text(text), None),
        CellValue::Boolean(b) => (ResolvedValue::Boolean(*b), None),
        CellValue::Error(e) => (ResolvedValue::Error(*e), None),
        CellValue::Formula { formula, cached, .. } => (
            cached.as_ref().map_or(ResolvedValue::Empty, ResolvedValue::from),
            Some(formula.as_str()),
        ),
    };
    Ok(CellRef {
        row,
        col,
        value,
        style,
        formula,
    })
}

//! The workbook model.
//!
//! A [`Workbook`] owns its worksheets in tab order together with the two
//! workbook-scoped tables every cell refers into: the shared string table and
//! the style table. Cells are never edited through raw indices; the
//! [`WorksheetMut`] handle returned by [`Workbook::worksheet_mut`] interns text
//! and styles as values are stored, so indices in the sheets always resolve.
//!
//! # Example
//!
//! ```rust
//! use litchi_xlsx::sheet::{Font, Style, Workbook};
//!
//! let mut wb = Workbook::new();
//! let mut sheet = wb.worksheet_mut("Sheet1")?;
//! sheet.set_value("A1", "Hello")?;
//! sheet.set_value("B1", 42)?;
//! let bold = Style::new().with_font(Font { bold: true, ..Font::default() });
//! sheet.set_style("A2", &bold)?;
//!
//! let first = wb.worksheet("Sheet1")?.cells(&wb).next().unwrap()?;
//! assert_eq!(first.value.to_text(), "Hello");
//! # Ok::<(), litchi_xlsx::Error>(())
//! ```

use crate::common::error::{Error, Result};
use crate::ooxml::opc::{Part, Relationship};
use crate::sheet::address::{self, CellRange};
use crate::sheet::cell::{CachedValue, Cell, CellValue, Value};
use crate::sheet::properties::DocumentProperties;
use crate::sheet::protection::WorkbookProtection;
use crate::sheet::shared_strings::SharedStringTable;
use crate::sheet::style::{Style, StyleTable};
use crate::sheet::worksheet::{RetainedElement, Worksheet};
use std::ops::{Deref, DerefMut};

/// Longest worksheet name Excel accepts.
pub const MAX_SHEET_NAME_LEN: usize = 31;

const FORBIDDEN_NAME_CHARS: [char; 7] = ['[', ']', ':', '*', '?', '/', '\\'];

/// A named formula or range (`definedName`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefinedName {
    pub name: String,
    /// Formula text without a leading `=`, e.g. `Sheet1!$A$1:$B$4`
    pub refers_to: String,
    /// Tab index of the sheet the name is scoped to
    pub local_sheet: Option<u32>,
    pub hidden: bool,
}

/// Package content carried through load and save unchanged.
#[derive(Debug, Clone, Default)]
pub(crate) struct RetainedContent {
    /// Content type of the workbook part (macro-enabled, template, ...)
    pub workbook_content_type: Option<String>,
    /// Parts the codec does not produce, each with its own relationships
    pub parts: Vec<Part>,
    /// Workbook relationships to retained parts, ids unchanged
    pub workbook_rels: Vec<Relationship>,
    /// Package relationships other than the generated ones
    pub package_rels: Vec<Relationship>,
    /// `workbook.xml` elements the model does not cover
    pub workbook_elements: Vec<RetainedElement>,
    pub workbook_root_attributes: Vec<(String, String)>,
}

#[derive(Debug, Clone)]
pub struct Workbook {
    sheets: Vec<Worksheet>,
    shared_strings: SharedStringTable,
    styles: StyleTable,
    defined_names: Vec<DefinedName>,
    properties: DocumentProperties,
    date1904: bool,
    active_sheet: u32,
    protection: Option<WorkbookProtection>,
    pub(crate) retained: RetainedContent,
}

impl Default for Workbook {
    fn default() -> Self {
        Self::new()
    }
}

impl Workbook {
    /// A workbook with a single empty sheet named `Sheet1`.
    pub fn new() -> Self {
        let mut wb = Self::empty(SharedStringTable::new(), StyleTable::new());
        wb.sheets.push(Worksheet::new("Sheet1"));
        wb
    }

    /// Workbook without sheets, filled in by the reader.
    pub(crate) fn empty(shared_strings: SharedStringTable, styles: StyleTable) -> Self {
        Self {
            sheets: Vec::new(),
            shared_strings,
            styles,
            defined_names: Vec::new(),
            properties: DocumentProperties::default(),
            date1904: false,
            active_sheet: 0,
            protection: None,
            retained: RetainedContent::default(),
        }
    }

    /// Append a loaded sheet, checking its name like any other.
    pub(crate) fn push_loaded_sheet(&mut self, sheet: Worksheet) -> Result<()> {
        self.check_new_name(sheet.name(), None)?;
        self.sheets.push(sheet);
        Ok(())
    }

    // Read API

    /// Worksheets in tab order.
    pub fn worksheets(&self) -> &[Worksheet] {
        &self.sheets
    }

    pub fn sheet_names(&self) -> impl Iterator<Item = &str> {
        self.sheets.iter().map(Worksheet::name)
    }

    /// Worksheet by name (case-insensitive).
    pub fn worksheet(&self, name: &str) -> Result<&Worksheet> {
        let idx = self.sheet_index(name)?;
        Ok(&self.sheets[idx])
    }

    pub fn worksheet_at(&self, index: usize) -> Option<&Worksheet> {
        self.sheets.get(index)
    }

    /// Tab index of the sheet called `name`.
    pub fn sheet_index(&self, name: &str) -> Result<usize> {
        self.position(name)
            .ok_or_else(|| Error::SheetNotFound(name.to_string()))
    }

    fn position(&self, name: &str) -> Option<usize> {
        let key = name.to_lowercase();
        self.sheets.iter().position(|s| s.name().to_lowercase() == key)
    }

    /// Text of shared string `index`.
    pub fn shared_string(&self, index: u32) -> Result<&str> {
        self.shared_strings.text(index)
    }

    pub fn shared_strings(&self) -> &SharedStringTable {
        &self.shared_strings
    }

    /// Style at cell-format index `index`.
    pub fn style(&self, index: u32) -> Result<&Style> {
        self.styles.get(index)
    }

    pub fn styles(&self) -> &StyleTable {
        &self.styles
    }

    pub fn defined_names(&self) -> &[DefinedName] {
        &self.defined_names
    }

    pub fn properties(&self) -> &DocumentProperties {
        &self.properties
    }

    pub fn properties_mut(&mut self) -> &mut DocumentProperties {
        &mut self.properties
    }

    /// Whether dates use the 1904 epoch.
    pub fn date1904(&self) -> bool {
        self.date1904
    }

    pub fn set_date1904(&mut self, date1904: bool) {
        self.date1904 = date1904;
    }

    /// Tab index of the sheet shown when the file is opened.
    pub fn active_sheet(&self) -> u32 {
        self.active_sheet
    }

    pub fn set_active_sheet(&mut self, name: &str) -> Result<()> {
        self.active_sheet = self.sheet_index(name)? as u32;
        Ok(())
    }

    pub(crate) fn set_active_index(&mut self, index: u32) {
        self.active_sheet = index.min(self.sheets.len().saturating_sub(1) as u32);
    }

    /// Lock the workbook structure, hashing `password` with the legacy hash.
    pub fn protect(&mut self, password: Option<&str>) -> &mut WorkbookProtection {
        self.protection.insert(WorkbookProtection::new(password))
    }

    pub fn unprotect(&mut self) {
        self.protection = None;
    }

    pub fn protection(&self) -> Option<&WorkbookProtection> {
        self.protection.as_ref()
    }

    pub(crate) fn set_protection(&mut self, protection: Option<WorkbookProtection>) {
        self.protection = protection;
    }

    /// Index of `style` in the style table, adding it if needed.
    pub fn intern_style(&mut self, style: &Style) -> u32 {
        self.styles.intern(style)
    }

    // Sheet management

    /// Mutable handle to a worksheet by name.
    pub fn worksheet_mut(&mut self, name: &str) -> Result<WorksheetMut<'_>> {
        let idx = self.sheet_index(name)?;
        Ok(self.handle(idx))
    }

    pub fn worksheet_mut_at(&mut self, index: usize) -> Option<WorksheetMut<'_>> {
        (index < self.sheets.len()).then(|| self.handle(index))
    }

    fn handle(&mut self, index: usize) -> WorksheetMut<'_> {
        WorksheetMut {
            sheet: &mut self.sheets[index],
            shared_strings: &mut self.shared_strings,
            styles: &mut self.styles,
        }
    }

    /// Append a new empty sheet.
    pub fn add_worksheet(&mut self, name: &str) -> Result<WorksheetMut<'_>> {
        let index = self.sheets.len();
        self.insert_worksheet(index, name)
    }

    /// Insert a new empty sheet at tab position `index`.
    pub fn insert_worksheet(&mut self, index: usize, name: &str) -> Result<WorksheetMut<'_>> {
        if index > self.sheets.len() {
            return Err(Error::InvalidOperation(format!(
                "insert position {index} beyond {} sheets",
                self.sheets.len()
            )));
        }
        self.check_new_name(name, None)?;
        self.sheets.insert(index, Worksheet::new(name));
        self.shift_sheet_refs(|i| if i >= index as u32 { Some(i + 1) } else { Some(i) });
        Ok(self.handle(index))
    }

    /// Remove a sheet. The last remaining sheet cannot be removed.
    ///
    /// Defined names scoped to the removed sheet are dropped with it.
    pub fn remove_worksheet(&mut self, name: &str) -> Result<Worksheet> {
        let index = self.sheet_index(name)?;
        if self.sheets.len() == 1 {
            return Err(Error::InvalidOperation("a workbook needs at least one worksheet".into()));
        }
        let removed = self.sheets.remove(index);
        let index = index as u32;
        self.shift_sheet_refs(|i| match i.cmp(&index) {
            std::cmp::Ordering::Less => Some(i),
            std::cmp::Ordering::Equal => None,
            std::cmp::Ordering::Greater => Some(i - 1),
        });
        Ok(removed)
    }

    /// Rename a sheet. Formulas referring to the old name are not rewritten.
    pub fn rename_worksheet(&mut self, old: &str, new: &str) -> Result<()> {
        let index = self.sheet_index(old)?;
        self.check_new_name(new, Some(index))?;
        self.sheets[index].set_name(new.to_string());
        Ok(())
    }

    /// Move a sheet to tab position `to`.
    pub fn move_worksheet(&mut self, name: &str, to: usize) -> Result<()> {
        let from = self.sheet_index(name)?;
        if to >= self.sheets.len() {
            return Err(Error::InvalidOperation(format!(
                "move target {to} beyond {} sheets",
                self.sheets.len()
            )));
        }
        let sheet = self.sheets.remove(from);
        self.sheets.insert(to, sheet);

        let (from, to) = (from as u32, to as u32);
        self.shift_sheet_refs(|i| {
            Some(if i == from {
                to
            } else if from < to && i > from && i <= to {
                i - 1
            } else if to < from && i >= to && i < from {
                i + 1
            } else {
                i
            })
        });
        Ok(())
    }

    /// Remap tab indices held by defined names and the active sheet.
    fn shift_sheet_refs(&mut self, map: impl Fn(u32) -> Option<u32>) {
        self.defined_names.retain_mut(|dn| match dn.local_sheet {
            None => true,
            Some(i) => match map(i) {
                Some(j) => {
                    dn.local_sheet = Some(j);
                    true
                },
                None => false,
            },
        });
        let active = map(self.active_sheet).unwrap_or(0);
        self.set_active_index(active);
    }

    /// Validate `name` for a sheet at `skip` (being renamed) or a new sheet.
    fn check_new_name(&self, name: &str, skip: Option<usize>) -> Result<()> {
        validate_sheet_name(name)?;
        let key = name.to_lowercase();
        let clash = self
            .sheets
            .iter()
            .enumerate()
            .any(|(i, s)| Some(i) != skip && s.name().to_lowercase() == key);
        if clash {
            return Err(Error::DuplicateSheetName(name.to_string()));
        }
        Ok(())
    }

    // Defined names

    /// Add or replace a defined name.
    ///
    /// `local_sheet` scopes the name to one sheet; names are unique per
    /// scope, compared case-insensitively.
    pub fn define_name(&mut self, name: &str, refers_to: &str, local_sheet: Option<&str>) -> Result<()> {
        validate_defined_name(name)?;
        let local_sheet = match local_sheet {
            Some(sheet) => Some(self.sheet_index(sheet)? as u32),
            None => None,
        };
        let defined = DefinedName {
            name: name.to_string(),
            refers_to: refers_to.strip_prefix('=').unwrap_or(refers_to).to_string(),
            local_sheet,
            hidden: false,
        };
        self.push_defined_name(defined);
        Ok(())
    }

    pub(crate) fn push_defined_name(&mut self, defined: DefinedName) {
        let key = defined.name.to_lowercase();
        match self
            .defined_names
            .iter_mut()
            .find(|d| d.local_sheet == defined.local_sheet && d.name.to_lowercase() == key)
        {
            Some(existing) => *existing = defined,
            None => self.defined_names.push(defined),
        }
    }
}

/// Check Excel's worksheet naming rules.
pub fn validate_sheet_name(name: &str) -> Result<()> {
    let invalid = name.is_empty()
        || name.chars().count() > MAX_SHEET_NAME_LEN
        || name.contains(FORBIDDEN_NAME_CHARS)
        || name.starts_with('\'')
        || name.ends_with('\'');
    if invalid {
        return Err(Error::InvalidSheetName(name.to_string()));
    }
    Ok(())
}

fn validate_defined_name(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid_start = chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_' || c == '\\');
    let valid_rest = chars.all(|c| c.is_alphanumeric() || matches!(c, '_' | '.' | '\\'));
    // Names that read as cell references are ambiguous in formulas
    if !valid_start || !valid_rest || address::parse_ref(name).is_ok() {
        return Err(Error::InvalidOperation(format!("invalid defined name {name:?}")));
    }
    Ok(())
}

/// Mutable access to one worksheet together with the workbook tables.
///
/// Dereferences to [`Worksheet`] for layout settings (columns, merges,
/// freeze panes, protection).
pub struct WorksheetMut<'a> {
    sheet: &'a mut Worksheet,
    shared_strings: &'a mut SharedStringTable,
    styles: &'a mut StyleTable,
}

impl WorksheetMut<'_> {
    /// Store a value at an A1 reference, keeping the cell's style.
    pub fn set_value(&mut self, reference: &str, value: impl Into<Value>) -> Result<()> {
        let (row, col) = address::parse_ref(reference)?;
        self.set_value_at(row, col, value)
    }

    pub fn set_value_at(&mut self, row: u32, col: u32, value: impl Into<Value>) -> Result<()> {
        check_position(row, col)?;
        let value = self.to_cell_value(value.into())?;
        let style = self.sheet.cell_at(row, col).map_or(0, |c| c.style);
        self.sheet.put_cell(row, col, Cell::new(value, style));
        Ok(())
    }

    /// Apply a style to a cell, keeping its value.
    pub fn set_style(&mut self, reference: &str, style: &Style) -> Result<()> {
        let (row, col) = address::parse_ref(reference)?;
        self.set_style_at(row, col, style)
    }

    pub fn set_style_at(&mut self, row: u32, col: u32, style: &Style) -> Result<()> {
        check_position(row, col)?;
        let index = self.styles.intern(style);
        self.apply_style(row, col, index);
        Ok(())
    }

    fn apply_style(&mut self, row: u32, col: u32, index: u32) {
        if index == 0 && self.sheet.cell_at(row, col).is_none() {
            return;
        }
        let value = self.sheet.clear_cell(row, col).map(|c| c.value).unwrap_or_default();
        self.sheet.put_cell(row, col, Cell::new(value, index));
    }

    /// Store a value and a style in one step.
    pub fn set_cell(&mut self, reference: &str, value: impl Into<Value>, style: &Style) -> Result<()> {
        let (row, col) = address::parse_ref(reference)?;
        self.set_cell_at(row, col, value, style)
    }

    pub fn set_cell_at(&mut self, row: u32, col: u32, value: impl Into<Value>, style: &Style) -> Result<()> {
        check_position(row, col)?;
        let value = self.to_cell_value(value.into())?;
        let index = self.styles.intern(style);
        self.sheet.put_cell(row, col, Cell::new(value, index));
        Ok(())
    }

    /// Apply a style to every cell of a range such as `A1:C3`.
    pub fn set_range_style(&mut self, range: &str, style: &Style) -> Result<()> {
        let range: CellRange = address::parse_range(range)?;
        let index = self.styles.intern(style);
        let ((r0, c0), (r1, c1)) = (range.origin, range.last());
        for row in r0..=r1 {
            for col in c0..=c1 {
                self.apply_style(row, col, index);
            }
        }
        Ok(())
    }

    /// Remove a cell's value and style.
    pub fn clear(&mut self, reference: &str) -> Result<()> {
        let (row, col) = address::parse_ref(reference)?;
        self.sheet.clear_cell(row, col);
        Ok(())
    }

    fn to_cell_value(&mut self, value: Value) -> Result<CellValue> {
        Ok(match value {
            Value::Empty => CellValue::Empty,
            Value::Number(n) => CellValue::Number(check_finite(n)?),
            Value::Text(text) => CellValue::Text(self.shared_strings.intern(&text)),
            Value::Boolean(b) => CellValue::Boolean(b),
            Value::Error(e) => CellValue::Error(e),
            Value::Formula(text) => CellValue::Formula {
                formula: text.strip_prefix('=').unwrap_or(&text).to_string(),
                cached: None,
                array: None,
            },
        })
    }

    /// Store a formula together with its last computed result.
    pub fn set_formula_with_result(&mut self, reference: &str, formula: &str, cached: CachedValue) -> Result<()> {
        let (row, col) = address::parse_ref(reference)?;
        check_position(row, col)?;
        if let CachedValue::Number(n) = &cached {
            check_finite(*n)?;
        }
        let style = self.sheet.cell_at(row, col).map_or(0, |c| c.style);
        let value = CellValue::Formula {
            formula: formula.strip_prefix('=').unwrap_or(formula).to_string(),
            cached: Some(cached),
            array: None,
        };
        self.sheet.put_cell(row, col, Cell::new(value, style));
        Ok(())
    }

    /// Store an array (CSE) formula over `range`.
    ///
    /// The formula lives in the range's top-left cell; other cells of the
    /// range are cleared of values and keep their styles.
    pub fn set_array_formula(&mut self, range: &str, formula: &str) -> Result<()> {
        let range = address::parse_range(range)?;
        let ((r0, c0), (r1, c1)) = (range.origin, range.last());
        for row in r0..=r1 {
            for col in c0..=c1 {
                let style = self.sheet.cell_at(row, col).map_or(0, |c| c.style);
                self.sheet.put_cell(row, col, Cell::new(CellValue::Empty, style));
            }
        }
        let style = self.sheet.cell_at(r0, c0).map_or(0, |c| c.style);
        let value = CellValue::Formula {
            formula: formula.strip_prefix('=').unwrap_or(formula).to_string(),
            cached: None,
            array: Some(range),
        };
        self.sheet.put_cell(r0, c0, Cell::new(value, style));
        Ok(())
    }
}

fn check_position(row: u32, col: u32) -> Result<()> {
    if row >= address::MAX_ROWS || col >= address::MAX_COLS {
        return Err(Error::InvalidAddress(format!("({row}, {col})")));
    }
    Ok(())
}

fn check_finite(n: f64) -> Result<f64> {
    if !n.is_finite() {
        return Err(Error::InvalidOperation(format!("{n} cannot be stored in a cell")));
    }
    Ok(n)
}

impl Deref for WorksheetMut<'_> {
    type Target = Worksheet;

    fn deref(&self) -> &Worksheet {
        self.sheet
    }
}

impl DerefMut for WorksheetMut<'_> {
    fn deref_mut(&mut self) -> &mut Worksheet {
        self.sheet
    }
}

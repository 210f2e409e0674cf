//! In-memory workbook model.
//!
//! # Quick Start
//!
//! ```rust
//! use litchi_xlsx::sheet::Workbook;
//!
//! let mut workbook = Workbook::new();
//! workbook.add_worksheet("Data")?.set_value("A1", 3.5)?;
//!
//! for sheet in workbook.worksheets() {
//!     for cell in sheet.cells(&workbook) {
//!         let cell = cell?;
//!         println!("{}!{} = {}", sheet.name(), litchi_xlsx::sheet::format_ref(cell.row, cell.col), cell.value.to_text());
//!     }
//! }
//! # Ok::<(), litchi_xlsx::Error>(())
//! ```
//!
//! # Architecture
//!
//! - [`Workbook`] owns worksheets, the [`SharedStringTable`] and the [`StyleTable`]
//! - [`Worksheet`] stores cells sparsely in row-major order
//! - [`WorksheetMut`] edits a sheet and interns strings and styles on the way in

pub mod address;
pub mod cell;
pub mod intern;
pub mod page_setup;
pub mod properties;
pub mod protection;
pub mod shared_strings;
pub mod style;
pub mod view;
pub mod workbook;
pub mod worksheet;

pub use address::{CellRange, MAX_COLS, MAX_ROWS, format_range, format_ref, parse_range, parse_ref};
pub use cell::{CachedValue, Cell, CellRef, CellValue, ErrorCode, ResolvedValue, Value};
pub use intern::InternTable;
pub use page_setup::{
    HeaderFooter, Orientation, PageMargins, PageOrder, PageSetup, PrintComments, PrintErrors, PrintLayout, PrintOptions,
};
pub use properties::DocumentProperties;
pub use protection::{ProtectionFlags, SheetProtection, WorkbookProtection, hash_legacy_password};
pub use shared_strings::{SharedString, SharedStringTable};
pub use style::{
    Alignment, Argb, Border, BorderLineStyle, BorderSide, Color, Fill, Font, GradientFill, GradientStop, GradientType,
    HorizontalAlignment, NumberFormat, PatternType, Protection, Style, StyleTable, Underline, VerticalAlignment,
};
pub use view::{Selection, SheetView, ViewMode};
pub use workbook::{DefinedName, Workbook, WorksheetMut, validate_sheet_name};
pub use worksheet::{ColumnInfo, FreezePanes, RowInfo, SheetVisibility, Worksheet};

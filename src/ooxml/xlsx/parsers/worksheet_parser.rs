//! Parser for Excel worksheet XML files.
//!
//! Reads cells, column and row settings, merged ranges, the sheet view,
//! print settings, the tab colour and sheet protection into a [`Worksheet`].
//! Top-level elements the model does not cover (drawings, hyperlinks,
//! conditional formats, ...) are kept as source text at their schema
//! position.
//!
//! Shared formulas are expanded: each dependent cell receives the master
//! formula with its relative references moved by the cell's offset.

use super::styles_parser::parse_color;
use super::{ElementOrder, Problems, capture_element, open_reader, position, root_attributes};
use crate::common::error::Result;
use crate::common::xml::{Attrs, append_general_ref, append_text};
use crate::ooxml::xlsx::schema::WORKSHEET_ELEMENTS;
use crate::sheet::address::{self, CellRange, MAX_COLS, MAX_ROWS};
use crate::sheet::cell::{CachedValue, Cell, CellValue, ErrorCode};
use crate::sheet::page_setup::{
    HeaderFooter, Orientation, PageMargins, PageOrder, PageSetup, PrintComments, PrintErrors, PrintOptions,
};
use crate::sheet::protection::{PROTECTION_ATTRIBUTES, ProtectionFlags, SheetProtection};
use crate::sheet::style::number_format::datetime_to_serial;
use crate::sheet::view::{Selection, SheetView, ViewMode};
use crate::sheet::worksheet::{ColumnInfo, RetainedElement, RowInfo, Worksheet};
use chrono::NaiveDateTime;
use quick_xml::events::Event;
use std::collections::HashMap;

/// Index bounds the cells are checked against.
#[derive(Debug, Clone, Copy)]
pub struct SheetContext {
    pub shared_strings: usize,
    pub cell_formats: usize,
    pub date1904: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Section {
    None,
    SheetPr,
    SheetViews,
    Cols,
    SheetData,
    MergeCells,
    HeaderFooter,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum TextTarget {
    None,
    Value,
    Formula,
    Inline,
}

#[derive(Debug, Default)]
struct FormulaBuilder {
    text: String,
    kind: Option<String>,
    shared_index: Option<u32>,
    reference: Option<String>,
}

#[derive(Debug)]
struct CellBuilder {
    row: u32,
    col: u32,
    style: u32,
    kind: Option<String>,
    value: Option<String>,
    formula: Option<FormulaBuilder>,
    inline: Option<String>,
}

struct SheetParser {
    sheet: Worksheet,
    problems: Problems,
    context: SheetContext,
    section: Section,
    next_row: u32,
    next_col: u32,
    row: u32,
    cell: Option<CellBuilder>,
    target: TextTarget,
    in_phonetic: bool,
    /// Shared formula masters: `si` -> (row, col, formula)
    shared: HashMap<u32, (u32, u32, String)>,
    /// `sheetView` elements seen; only the first is modelled
    views: u32,
    active_pane: Option<String>,
    /// Open `headerFooter` child collecting text
    header_footer_part: Option<Vec<u8>>,
}

pub fn parse_worksheet(part: &str, bytes: &[u8], name: &str, context: SheetContext) -> Result<Worksheet> {
    let (xml, mut reader) = open_reader(part, bytes)?;
    let mut parser = SheetParser {
        sheet: Worksheet::new(name),
        problems: Problems::new(part),
        context,
        section: Section::None,
        next_row: 0,
        next_col: 0,
        row: 0,
        cell: None,
        target: TextTarget::None,
        in_phonetic: false,
        shared: HashMap::new(),
        views: 0,
        active_pane: None,
        header_footer_part: None,
    };
    let mut order = ElementOrder::new(&WORKSHEET_ELEMENTS);
    let mut depth = 0usize;

    loop {
        let before = position(&reader);
        let event = match reader.read_event() {
            Ok(event) => event,
            Err(err) => {
                let at = reader.error_position();
                parser.problems.push(format!("XML error at byte {at}: {err}"));
                break;
            },
        };
        match event {
            Event::Start(e) if depth == 0 => {
                parser.sheet.retained.root_attributes = root_attributes(&e);
                depth = 1;
            },
            Event::Start(e) if depth == 1 => {
                let name = e.local_name();
                let slot = order.of(name.as_ref());
                let section = match name.as_ref() {
                    b"sheetPr" => Section::SheetPr,
                    b"sheetViews" => Section::SheetViews,
                    b"cols" => Section::Cols,
                    b"sheetData" => Section::SheetData,
                    b"mergeCells" => Section::MergeCells,
                    b"headerFooter" => {
                        parser.top_level(name.as_ref(), &Attrs::from_start(&e));
                        Section::HeaderFooter
                    },
                    b"dimension" | b"sheetFormatPr" | b"sheetProtection" | b"printOptions" | b"pageMargins"
                    | b"pageSetup" => {
                        parser.top_level(name.as_ref(), &Attrs::from_start(&e));
                        Section::None
                    },
                    _ => {
                        match capture_element(xml, &mut reader, &e, before) {
                            Ok(text) => parser.sheet.retained.elements.push(RetainedElement { order: slot, xml: text }),
                            Err(err) => {
                                parser.problems.push(format!("XML error: {err}"));
                                break;
                            },
                        }
                        continue;
                    },
                };
                parser.section = section;
                depth = 2;
            },
            Event::Empty(e) if depth == 1 => {
                let name = e.local_name();
                let slot = order.of(name.as_ref());
                match name.as_ref() {
                    b"sheetPr" | b"sheetViews" | b"cols" | b"sheetData" | b"mergeCells" => {},
                    b"dimension" | b"sheetFormatPr" | b"sheetProtection" | b"printOptions" | b"pageMargins"
                    | b"pageSetup" | b"headerFooter" => {
                        parser.top_level(name.as_ref(), &Attrs::from_start(&e));
                    },
                    _ => parser.sheet.retained.elements.push(RetainedElement {
                        order: slot,
                        xml: xml[before..position(&reader)].to_string(),
                    }),
                }
            },
            Event::Start(e) => {
                parser.start(e.local_name().as_ref(), &Attrs::from_start(&e), false);
                depth += 1;
            },
            Event::Empty(e) => {
                let name = e.local_name();
                parser.start(name.as_ref(), &Attrs::from_start(&e), true);
                parser.end(name.as_ref());
            },
            Event::Text(e) => {
                if let Some(buf) = parser.text_buffer() {
                    append_text(buf, &e);
                }
            },
            Event::CData(e) => {
                if let Some(buf) = parser.text_buffer() {
                    append_text(buf, &e);
                }
            },
            Event::GeneralRef(e) => {
                if let Some(buf) = parser.text_buffer() {
                    append_general_ref(buf, &e);
                }
            },
            Event::End(e) => {
                depth = depth.saturating_sub(1);
                if depth == 1 {
                    parser.section = Section::None;
                } else {
                    parser.end(e.local_name().as_ref());
                }
            },
            Event::Eof => break,
            _ => {},
        }
    }

    let SheetParser { sheet, problems, .. } = parser;
    problems.finish(sheet)
}

impl SheetParser {
    /// Modelled top-level elements without children of interest.
    fn top_level(&mut self, name: &[u8], attrs: &Attrs) {
        match name {
            b"sheetFormatPr" => {
                let row_height = self.problems.check(attrs.parse::<f64>("defaultRowHeight"));
                let col_width = self.problems.check(attrs.parse::<f64>("defaultColWidth"));
                self.sheet.set_default_row_height(row_height);
                self.sheet.set_default_column_width(col_width);
            },
            b"sheetProtection" => {
                let protection = parse_protection(attrs);
                self.sheet.set_protection(Some(protection));
            },
            b"printOptions" => {
                self.sheet.print_layout_mut().options = Some(PrintOptions {
                    horizontal_centered: attrs.flag("horizontalCentered").unwrap_or(false),
                    vertical_centered: attrs.flag("verticalCentered").unwrap_or(false),
                    headings: attrs.flag("headings").unwrap_or(false),
                    grid_lines: attrs.flag("gridLines").unwrap_or(false),
                    grid_lines_set: attrs.flag("gridLinesSet").unwrap_or(true),
                });
            },
            b"pageMargins" => {
                let defaults = PageMargins::default();
                let mut margin = |name: &str, default: f64| self.problems.check(attrs.parse::<f64>(name)).unwrap_or(default);
                let margins = PageMargins {
                    left: margin("left", defaults.left),
                    right: margin("right", defaults.right),
                    top: margin("top", defaults.top),
                    bottom: margin("bottom", defaults.bottom),
                    header: margin("header", defaults.header),
                    footer: margin("footer", defaults.footer),
                };
                self.sheet.print_layout_mut().margins = Some(margins);
            },
            b"pageSetup" => self.page_setup(attrs),
            b"headerFooter" => {
                self.sheet.print_layout_mut().header_footer = Some(HeaderFooter {
                    different_odd_even: attrs.flag("differentOddEven").unwrap_or(false),
                    different_first: attrs.flag("differentFirst").unwrap_or(false),
                    scale_with_doc: attrs.flag("scaleWithDoc").unwrap_or(true),
                    align_with_margins: attrs.flag("alignWithMargins").unwrap_or(true),
                    ..HeaderFooter::default()
                });
            },
            // dimension is recomputed on save
            _ => {},
        }
    }

    fn page_setup(&mut self, attrs: &Attrs) {
        let mut setup = PageSetup {
            fit_to_page: self.sheet.print_layout().setup.as_ref().is_some_and(|s| s.fit_to_page),
            ..PageSetup::default()
        };
        let mut number = |name: &str| self.problems.check(attrs.parse::<u32>(name));
        setup.paper_size = number("paperSize").unwrap_or(setup.paper_size);
        setup.scale = number("scale").unwrap_or(setup.scale);
        setup.first_page_number = number("firstPageNumber");
        setup.fit_to_width = number("fitToWidth").unwrap_or(setup.fit_to_width);
        setup.fit_to_height = number("fitToHeight").unwrap_or(setup.fit_to_height);
        setup.horizontal_dpi = number("horizontalDpi");
        setup.vertical_dpi = number("verticalDpi");
        setup.copies = number("copies").unwrap_or(setup.copies);
        if !attrs.flag("useFirstPageNumber").unwrap_or(false) {
            setup.first_page_number = None;
        }
        setup.use_printer_defaults = attrs.flag("usePrinterDefaults").unwrap_or(true);
        setup.black_and_white = attrs.flag("blackAndWhite").unwrap_or(false);
        setup.draft = attrs.flag("draft").unwrap_or(false);
        if let Some(value) = attrs.get("orientation") {
            match Orientation::parse(value) {
                Some(orientation) => setup.orientation = orientation,
                None => log::warn!("ignoring unknown orientation {value:?}"),
            }
        }
        if let Some(value) = attrs.get("pageOrder") {
            match PageOrder::parse(value) {
                Some(order) => setup.page_order = order,
                None => log::warn!("ignoring unknown page order {value:?}"),
            }
        }
        if let Some(value) = attrs.get("cellComments") {
            match PrintComments::parse(value) {
                Some(comments) => setup.cell_comments = comments,
                None => log::warn!("ignoring unknown cellComments {value:?}"),
            }
        }
        if let Some(value) = attrs.get("errors") {
            match PrintErrors::parse(value) {
                Some(errors) => setup.errors = errors,
                None => log::warn!("ignoring unknown print errors {value:?}"),
            }
        }
        setup.printer_settings = attrs.get("id").map(str::to_string);
        self.sheet.print_layout_mut().setup = Some(setup);
    }

    fn sheet_view(&mut self, attrs: &Attrs) {
        self.views += 1;
        if self.views > 1 {
            return;
        }
        let mut view = SheetView {
            show_grid_lines: attrs.flag("showGridLines").unwrap_or(true),
            show_row_col_headers: attrs.flag("showRowColHeaders").unwrap_or(true),
            show_formulas: attrs.flag("showFormulas").unwrap_or(false),
            show_zeros: attrs.flag("showZeros").unwrap_or(true),
            show_outline_symbols: attrs.flag("showOutlineSymbols").unwrap_or(true),
            show_ruler: attrs.flag("showRuler").unwrap_or(true),
            show_white_space: attrs.flag("showWhiteSpace").unwrap_or(true),
            right_to_left: attrs.flag("rightToLeft").unwrap_or(false),
            window_protection: attrs.flag("windowProtection").unwrap_or(false),
            ..SheetView::default()
        };
        if let Some(value) = attrs.get("view") {
            match ViewMode::parse(value) {
                Some(mode) => view.view = mode,
                None => log::warn!("ignoring unknown sheet view {value:?}"),
            }
        }
        let color_id = self.problems.check(attrs.parse::<u32>("colorId"));
        if !attrs.flag("defaultGridColor").unwrap_or(true) {
            view.grid_color = color_id;
        }
        if let Some(reference) = attrs.get("topLeftCell") {
            match address::parse_ref(reference) {
                Ok(pos) => view.top_left_cell = Some(pos),
                Err(err) => self.problems.push(err.to_string()),
            }
        }
        let mut zoom = |name: &str| self.problems.check(attrs.parse::<u16>(name)).filter(|z| *z != 0);
        view.zoom_scale = zoom("zoomScale").unwrap_or(100);
        view.zoom_scale_normal = zoom("zoomScaleNormal");
        view.zoom_scale_page_layout_view = zoom("zoomScalePageLayoutView");
        view.zoom_scale_sheet_layout_view = zoom("zoomScaleSheetLayoutView");
        *self.sheet.view_mut() = view;
    }

    /// Keeps the selection of the active pane.
    fn selection(&mut self, attrs: &Attrs) {
        if self.views > 1 {
            return;
        }
        let pane = attrs.get("pane").unwrap_or("topLeft");
        if pane != self.active_pane.as_deref().unwrap_or("topLeft") {
            return;
        }
        let active = attrs.get("activeCell").unwrap_or("A1");
        let selection = match attrs.get("sqref") {
            Some(sqref) => Selection::ranges(active, sqref),
            None => Selection::cell(active),
        };
        match selection {
            Ok(selection) => self.sheet.view_mut().select(Some(selection)),
            Err(err) => self.problems.push(err.to_string()),
        }
    }

    fn text_buffer(&mut self) -> Option<&mut String> {
        if self.section == Section::HeaderFooter {
            let part = self.header_footer_part.as_deref()?;
            let header_footer = self.sheet.print_layout_mut().header_footer.as_mut()?;
            return header_footer.part_mut(part).map(|text| text.get_or_insert_with(String::new));
        }
        if self.in_phonetic {
            return None;
        }
        let cell = self.cell.as_mut()?;
        match self.target {
            TextTarget::None => None,
            TextTarget::Value => Some(cell.value.get_or_insert_with(String::new)),
            TextTarget::Formula => cell.formula.as_mut().map(|f| &mut f.text),
            TextTarget::Inline => Some(cell.inline.get_or_insert_with(String::new)),
        }
    }

    fn start(&mut self, name: &[u8], attrs: &Attrs, is_empty: bool) {
        match (self.section, name) {
            (Section::SheetPr, b"tabColor") => {
                let color = parse_color(attrs, &mut self.problems);
                self.sheet.set_tab_color(color);
            },
            (Section::SheetPr, b"pageSetUpPr") => {
                if attrs.flag("fitToPage").unwrap_or(false) {
                    let layout = self.sheet.print_layout_mut();
                    layout.setup.get_or_insert_with(PageSetup::default).fit_to_page = true;
                }
            },
            (Section::SheetViews, b"sheetView") => self.sheet_view(attrs),
            (Section::SheetViews, b"pane") => self.pane(attrs),
            (Section::SheetViews, b"selection") => self.selection(attrs),
            (Section::HeaderFooter, part) => {
                if let Some(header_footer) = self.sheet.print_layout_mut().header_footer.as_mut()
                    && let Some(text) = header_footer.part_mut(part)
                {
                    text.get_or_insert_with(String::new);
                    self.header_footer_part = Some(part.to_vec());
                }
            },
            (Section::Cols, b"col") => self.column(attrs),
            (Section::MergeCells, b"mergeCell") => match attrs.get("ref") {
                Some(range) => match address::parse_range(range) {
                    Ok(range) => {
                        if let Err(err) = self.sheet.add_merge(range) {
                            self.problems.push(err.to_string());
                        }
                    },
                    Err(err) => self.problems.push(err.to_string()),
                },
                None => self.problems.push("mergeCell without ref"),
            },
            (Section::SheetData, b"row") => self.row(attrs),
            (Section::SheetData, b"c") => {
                self.cell = self.begin_cell(attrs);
                if is_empty {
                    self.finish_cell();
                }
            },
            (Section::SheetData, b"v") => self.target = TextTarget::Value,
            (Section::SheetData, b"f") => {
                if let Some(cell) = self.cell.as_mut() {
                    cell.formula = Some(FormulaBuilder {
                        text: String::new(),
                        kind: attrs.get("t").map(str::to_string),
                        shared_index: self.problems.check(attrs.parse("si")),
                        reference: attrs.get("ref").map(str::to_string),
                    });
                }
                self.target = TextTarget::Formula;
            },
            (Section::SheetData, b"is") => {
                if let Some(cell) = self.cell.as_mut() {
                    cell.inline.get_or_insert_with(String::new);
                }
            },
            (Section::SheetData, b"t") if self.cell.is_some() => self.target = TextTarget::Inline,
            (Section::SheetData, b"rPh") => self.in_phonetic = true,
            _ => {},
        }
    }

    fn end(&mut self, name: &[u8]) {
        if self.section == Section::HeaderFooter {
            self.header_footer_part = None;
            return;
        }
        if self.section != Section::SheetData {
            return;
        }
        match name {
            b"v" | b"f" | b"t" => self.target = TextTarget::None,
            b"rPh" => self.in_phonetic = false,
            b"c" => self.finish_cell(),
            _ => {},
        }
    }

    fn pane(&mut self, attrs: &Attrs) {
        if self.views > 1 {
            return;
        }
        self.active_pane = Some(attrs.get("activePane").unwrap_or("topLeft").to_string());
        if !matches!(attrs.get("state"), Some("frozen" | "frozenSplit")) {
            return;
        }
        let cols = self.problems.check(attrs.parse::<f64>("xSplit")).unwrap_or(0.0);
        let rows = self.problems.check(attrs.parse::<f64>("ySplit")).unwrap_or(0.0);
        if let Err(err) = self.sheet.freeze_panes(rows as u32, cols as u32) {
            self.problems.push(err.to_string());
        }
    }

    fn column(&mut self, attrs: &Attrs) {
        let min = self.problems.check(attrs.parse::<u32>("min"));
        let max = self.problems.check(attrs.parse::<u32>("max"));
        let (Some(min), Some(max)) = (min, max) else {
            self.problems.push("col without min or max");
            return;
        };
        if min == 0 || min > max || max > MAX_COLS {
            self.problems.push(format!("col range {min}..{max} is not valid"));
            return;
        }
        let info = ColumnInfo {
            width: self.problems.check(attrs.parse::<f64>("width")),
            hidden: attrs.flag("hidden").unwrap_or(false),
        };
        if info.width.is_none() && !info.hidden {
            return;
        }
        for col in min - 1..max {
            self.sheet.set_column_info(col, info);
        }
    }

    fn row(&mut self, attrs: &Attrs) {
        self.row = match self.problems.check(attrs.parse::<u32>("r")) {
            Some(r) if (1..=MAX_ROWS).contains(&r) => r - 1,
            Some(r) => {
                self.problems.push(format!("row number {r} out of range"));
                self.next_row
            },
            None => self.next_row,
        };
        self.next_row = self.row + 1;
        self.next_col = 0;

        let height = self.problems.check(attrs.parse::<f64>("ht"));
        let info = RowInfo {
            height: height.filter(|_| attrs.flag("customHeight").unwrap_or(false)),
            hidden: attrs.flag("hidden").unwrap_or(false),
        };
        if info.height.is_some() || info.hidden {
            self.sheet.set_row_info(self.row, info);
        }
    }

    fn begin_cell(&mut self, attrs: &Attrs) -> Option<CellBuilder> {
        let (row, col) = match attrs.get("r") {
            Some(reference) => match address::parse_ref(reference) {
                Ok(pos) => pos,
                Err(err) => {
                    self.problems.push(err.to_string());
                    return None;
                },
            },
            None if self.next_col < MAX_COLS => (self.row, self.next_col),
            None => {
                self.problems.push(format!("too many cells in row {}", self.row + 1));
                return None;
            },
        };
        self.next_col = col + 1;

        let style = self.problems.check(attrs.parse::<u32>("s")).unwrap_or(0);
        if style as usize >= self.context.cell_formats {
            self.problems.push(format!(
                "cell {} style index {style} out of range ({} cell formats)",
                address::format_ref(row, col),
                self.context.cell_formats
            ));
        }
        Some(CellBuilder {
            row,
            col,
            style,
            kind: attrs.get("t").map(str::to_string),
            value: None,
            formula: None,
            inline: None,
        })
    }

    fn finish_cell(&mut self) {
        self.target = TextTarget::None;
        let Some(cell) = self.cell.take() else {
            return;
        };
        let reference = address::format_ref(cell.row, cell.col);
        let value = match self.cell_value(&cell) {
            Ok(value) => value,
            Err(problem) => {
                self.problems.push(format!("cell {reference}: {problem}"));
                return;
            },
        };
        self.sheet.put_cell(cell.row, cell.col, Cell::new(value, cell.style));
    }

    fn cell_value(&mut self, cell: &CellBuilder) -> std::result::Result<CellValue, String> {
        let kind = cell.kind.as_deref().unwrap_or("n");
        let raw = cell.value.as_deref();

        if let Some(formula) = &cell.formula
            && let Some(text) = self.formula_text(cell, formula)?
        {
            let cached = match raw {
                None | Some("") => None,
                Some(v) => Some(match kind {
                    "str" | "inlineStr" => CachedValue::Text(v.to_string()),
                    "b" => CachedValue::Boolean(parse_bool(v)?),
                    "e" => CachedValue::Error(parse_error(v)?),
                    _ => CachedValue::Number(parse_number(v)?),
                }),
            };
            let array = match (formula.kind.as_deref(), formula.reference.as_deref()) {
                (Some("array"), Some(range)) => Some(address::parse_range(range).map_err(|e| e.to_string())?),
                (Some("array"), None) => Some(CellRange::from_corners((cell.row, cell.col), (cell.row, cell.col))),
                _ => None,
            };
            return Ok(CellValue::Formula {
                formula: text,
                cached,
                array,
            });
        }

        Ok(match (kind, raw) {
            ("inlineStr", _) => CellValue::InlineText(cell.inline.clone().unwrap_or_default()),
            ("s", Some(v)) => {
                let index = v
                    .trim()
                    .parse::<u32>()
                    .map_err(|_| format!("shared string index {v:?} is not a number"))?;
                if index as usize >= self.context.shared_strings {
                    return Err(format!(
                        "shared string index {index} out of range ({} strings)",
                        self.context.shared_strings
                    ));
                }
                CellValue::Text(index)
            },
            ("str", Some(v)) => CellValue::InlineText(v.to_string()),
            ("b", Some(v)) => CellValue::Boolean(parse_bool(v)?),
            ("e", Some(v)) => CellValue::Error(parse_error(v)?),
            ("d", Some(v)) => {
                let serial = parse_iso_datetime(v)
                    .and_then(|dt| datetime_to_serial(dt, self.context.date1904))
                    .ok_or_else(|| format!("date value {v:?} is not valid"))?;
                CellValue::Number(serial)
            },
            ("n", Some(v)) => CellValue::Number(parse_number(v)?),
            ("s" | "str" | "b" | "e" | "d" | "n", None) => CellValue::Empty,
            (other, _) => return Err(format!("unknown cell type {other:?}")),
        })
    }

    /// Formula text of a cell, expanding shared formulas.
    fn formula_text(
        &mut self,
        cell: &CellBuilder,
        formula: &FormulaBuilder,
    ) -> std::result::Result<Option<String>, String> {
        match formula.kind.as_deref() {
            Some("shared") => {
                let si = formula.shared_index.ok_or("shared formula without si")?;
                if !formula.text.is_empty() {
                    self.shared.insert(si, (cell.row, cell.col, formula.text.clone()));
                    return Ok(Some(formula.text.clone()));
                }
                let (row, col, master) = self
                    .shared
                    .get(&si)
                    .ok_or_else(|| format!("shared formula {si} used before its master cell"))?;
                let drow = i64::from(cell.row) - i64::from(*row);
                let dcol = i64::from(cell.col) - i64::from(*col);
                Ok(Some(shift_formula(master, drow, dcol)))
            },
            Some("dataTable") => Ok(None),
            _ => Ok(Some(formula.text.clone())),
        }
    }
}

fn parse_bool(v: &str) -> std::result::Result<bool, String> {
    match v.trim() {
        "1" | "true" => Ok(true),
        "0" | "false" => Ok(false),
        other => Err(format!("boolean value {other:?} is not valid")),
    }
}

fn parse_error(v: &str) -> std::result::Result<ErrorCode, String> {
    ErrorCode::parse(v.trim()).ok_or_else(|| format!("error value {v:?} is not valid"))
}

fn parse_number(v: &str) -> std::result::Result<f64, String> {
    fast_float2::parse::<f64, _>(v.trim()).map_err(|_| format!("number {v:?} is not valid"))
}

fn parse_iso_datetime(v: &str) -> Option<NaiveDateTime> {
    let v = v.trim().trim_end_matches('Z');
    NaiveDateTime::parse_from_str(v, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .or_else(|| {
            chrono::NaiveDate::parse_from_str(v, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

fn parse_protection(attrs: &Attrs) -> SheetProtection {
    let mut flags = ProtectionFlags::empty();
    for (name, flag) in PROTECTION_ATTRIBUTES {
        let set = attrs
            .flag(name)
            .unwrap_or(ProtectionFlags::SCHEMA_DEFAULTS.contains(flag));
        flags.set(flag, set);
    }
    let hash_attributes = attrs
        .iter()
        .filter(|(name, _)| matches!(*name, "algorithmName" | "hashValue" | "saltValue" | "spinCount"))
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect();
    SheetProtection {
        password_hash: attrs.get("password").map(str::to_ascii_uppercase),
        flags,
        hash_attributes,
    }
}

/// Move the relative references of `formula` by `drow` rows and `dcol`
/// columns. References pushed off the sheet become `#REF!`.
///
/// String literals and quoted sheet names are copied unchanged. Whole-row
/// and whole-column references (`A:A`, `1:1`) are not moved.
pub(crate) fn shift_formula(formula: &str, drow: i64, dcol: i64) -> String {
    let bytes = formula.as_bytes();
    let mut out = String::with_capacity(formula.len() + 8);
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            quote @ (b'"' | b'\'') => {
                let start = i;
                i += 1;
                while i < bytes.len() {
                    if bytes[i] == quote {
                        // doubled quote is an escaped quote
                        if bytes.get(i + 1) == Some(&quote) {
                            i += 2;
                            continue;
                        }
                        i += 1;
                        break;
                    }
                    i += 1;
                }
                out.push_str(&formula[start..i]);
            },
            b if is_token_byte(b) => {
                let start = i;
                while i < bytes.len() && is_token_byte(bytes[i]) {
                    i += 1;
                }
                let token = &formula[start..i];
                let next = bytes.get(i).copied();
                let prev = start.checked_sub(1).map(|p| bytes[p]);
                let is_reference = !matches!(next, Some(b'(' | b'!')) && !matches!(prev, Some(b'[' | b'.'));
                match is_reference.then(|| shift_reference(token, drow, dcol)).flatten() {
                    Some(shifted) => out.push_str(&shifted),
                    None => out.push_str(token),
                }
            },
            _ => {
                let ch_len = formula[i..].chars().next().map_or(1, char::len_utf8);
                out.push_str(&formula[i..i + ch_len]);
                i += ch_len;
            },
        }
    }
    out
}

#[inline]
fn is_token_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'_' | b'.' | b'$' | b'\\')
}

/// Shift one `[$]COL[$]ROW` token, `None` when the token is not a reference.
fn shift_reference(token: &str, drow: i64, dcol: i64) -> Option<String> {
    let bytes = token.as_bytes();
    let mut i = 0;
    let col_abs = bytes.first() == Some(&b'$');
    if col_abs {
        i += 1;
    }
    let letters_start = i;
    while i < bytes.len() && bytes[i].is_ascii_alphabetic() {
        i += 1;
    }
    let letters = &token[letters_start..i];
    if letters.is_empty() || letters.len() > 3 {
        return None;
    }
    let row_abs = bytes.get(i) == Some(&b'$');
    if row_abs {
        i += 1;
    }
    let digits = &token[i..];
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) || digits.starts_with('0') {
        return None;
    }
    let col = address::column_index(letters).ok()?;
    let row: u32 = digits.parse().ok()?;
    if row == 0 || row > MAX_ROWS {
        return None;
    }

    let new_col = if col_abs { i64::from(col) } else { i64::from(col) + dcol };
    let new_row = if row_abs { i64::from(row) - 1 } else { i64::from(row) - 1 + drow };
    if !(0..i64::from(MAX_COLS)).contains(&new_col) || !(0..i64::from(MAX_ROWS)).contains(&new_row) {
        return Some("#REF!".to_string());
    }

    let mut shifted = String::with_capacity(token.len() + 1);
    if col_abs {
        shifted.push('$');
    }
    shifted.push_str(&address::column_letters(new_col as u32));
    if row_abs {
        shifted.push('$');
    }
    let mut buf = itoa::Buffer::new();
    shifted.push_str(buf.format(new_row + 1));
    Some(shifted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::error::Error;
    use crate::sheet::style::Color;

    const PART: &str = "/xl/worksheets/sheet1.xml";
    const CONTEXT: SheetContext = SheetContext {
        shared_strings: 2,
        cell_formats: 3,
        date1904: false,
    };

    fn wrap(body: &str) -> Vec<u8> {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">{body}</worksheet>"#
        )
        .into_bytes()
    }

    #[test]
    fn test_cell_types() {
        let xml = wrap(
            r#"<sheetData>
<row r="1"><c r="A1" t="s"><v>1</v></c><c r="B1"><v>42.5</v></c><c r="C1" t="b"><v>1</v></c><c r="D1" t="e"><v>#DIV/0!</v></c></row>
<row r="3"><c r="A3" t="inlineStr"><is><t>inline &amp; text</t></is></c><c r="B3" s="2"/><c r="C3"><f>SUM(B1:B2)</f><v>42.5</v></c><c r="D3" t="str"><f>"x"&amp;"y"</f><v>xy</v></c></row>
</sheetData>"#,
        );
        let sheet = parse_worksheet(PART, &xml, "Sheet1", CONTEXT).unwrap();
        assert_eq!(sheet.cell("A1").unwrap().unwrap().value, CellValue::Text(1));
        assert_eq!(sheet.cell("B1").unwrap().unwrap().value, CellValue::Number(42.5));
        assert_eq!(sheet.cell("C1").unwrap().unwrap().value, CellValue::Boolean(true));
        assert_eq!(sheet.cell("D1").unwrap().unwrap().value, CellValue::Error(ErrorCode::Div0));
        assert_eq!(
            sheet.cell("A3").unwrap().unwrap().value,
            CellValue::InlineText("inline & text".into())
        );
        assert_eq!(sheet.cell("B3").unwrap().unwrap(), &Cell::new(CellValue::Empty, 2));
        assert_eq!(
            sheet.cell("C3").unwrap().unwrap().value,
            CellValue::Formula {
                formula: "SUM(B1:B2)".into(),
                cached: Some(CachedValue::Number(42.5)),
                array: None,
            }
        );
        assert_eq!(
            sheet.cell("D3").unwrap().unwrap().value,
            CellValue::Formula {
                formula: "\"x\"&\"y\"".into(),
                cached: Some(CachedValue::Text("xy".into())),
                array: None,
            }
        );
    }

    #[test]
    fn test_cells_without_references() {
        let xml = wrap(r#"<sheetData><row><c><v>1</v></c><c><v>2</v></c></row><row><c><v>3</v></c></row></sheetData>"#);
        let sheet = parse_worksheet(PART, &xml, "Sheet1", CONTEXT).unwrap();
        assert_eq!(sheet.cell_at(0, 1).unwrap().value, CellValue::Number(2.0));
        assert_eq!(sheet.cell_at(1, 0).unwrap().value, CellValue::Number(3.0));
    }

    #[test]
    fn test_shared_formulas_expand() {
        let xml = wrap(
            r#"<sheetData>
<row r="2"><c r="B2"><f t="shared" ref="B2:B4" si="0">A2*$C$1+A$1</f><v>1</v></c></row>
<row r="3"><c r="B3"><f t="shared" si="0"/><v>2</v></c></row>
<row r="4"><c r="B4"><f t="shared" si="0"/></c></row>
</sheetData>"#,
        );
        let sheet = parse_worksheet(PART, &xml, "Sheet1", CONTEXT).unwrap();
        let formula = |r: &str| match &sheet.cell(r).unwrap().unwrap().value {
            CellValue::Formula { formula, .. } => formula.clone(),
            other => panic!("not a formula: {other:?}"),
        };
        assert_eq!(formula("B2"), "A2*$C$1+A$1");
        assert_eq!(formula("B3"), "A3*$C$1+A$1");
        assert_eq!(formula("B4"), "A4*$C$1+A$1");
    }

    #[test]
    fn test_layout_and_retained_elements() {
        let xml = wrap(
            r#"<sheetPr><tabColor rgb="FF00B050"/><pageSetUpPr fitToPage="1"/></sheetPr>
<dimension ref="A1:B2"/>
<sheetViews><sheetView tabSelected="1" workbookViewId="0"><pane ySplit="1" topLeftCell="A2" activePane="bottomLeft" state="frozen"/></sheetView></sheetViews>
<sheetFormatPr defaultRowHeight="15"/>
<cols><col min="2" max="3" width="20.5" customWidth="1"/><col min="5" max="5" width="9" hidden="1"/></cols>
<sheetData><row r="4" ht="30" customHeight="1"/><row r="6" hidden="1"/></sheetData>
<sheetProtection password="CC1A" sheet="1" objects="1" sort="0"/>
<mergeCells count="1"><mergeCell ref="A1:B2"/></mergeCells>
<hyperlinks><hyperlink ref="A1" r:id="rId1"/></hyperlinks>
<pageMargins left="0.7" right="0.7" top="0.75" bottom="0.75" header="0.3" footer="0.3"/>
<drawing r:id="rId2"/>"#,
        );
        let sheet = parse_worksheet(PART, &xml, "Sheet1", CONTEXT).unwrap();
        assert_eq!(sheet.tab_color().and_then(Color::rgb_hex).as_deref(), Some("00B050"));
        assert_eq!(sheet.frozen_panes().map(|f| (f.rows, f.cols)), Some((1, 0)));
        assert_eq!(sheet.default_row_height(), Some(15.0));
        assert_eq!(sheet.column(1).unwrap().width, Some(20.5));
        assert_eq!(sheet.column(2).unwrap().width, Some(20.5));
        assert!(sheet.column(4).unwrap().hidden);
        assert_eq!(sheet.column(4).unwrap().width, Some(9.0));
        assert_eq!(sheet.row(3).unwrap().height, Some(30.0));
        assert!(sheet.row(5).unwrap().hidden);

        let protection = sheet.protection().unwrap();
        assert_eq!(protection.password_hash.as_deref(), Some("CC1A"));
        assert!(protection.flags.contains(ProtectionFlags::SHEET | ProtectionFlags::OBJECTS));
        assert!(!protection.flags.contains(ProtectionFlags::SORT));
        assert!(protection.flags.contains(ProtectionFlags::FORMAT_CELLS));

        assert_eq!(sheet.merged_ranges().len(), 1);
        assert_eq!(sheet.print_layout().margins, Some(PageMargins::default()));
        assert!(sheet.print_layout().setup.as_ref().unwrap().fit_to_page);
        let retained: Vec<_> = sheet.retained.elements.iter().map(|el| el.order).collect();
        assert_eq!(retained, [18, 29]);
        assert_eq!(sheet.retained.elements[1].xml, r#"<drawing r:id="rId2"/>"#);
    }

    #[test]
    fn test_array_formula_range() {
        let xml = wrap(
            r#"<sheetData><row r="1"><c r="B1"><f t="array" ref="B1:B2">A1:A2*2</f><v>2</v></c><c r="C1"><f t="array">SUM(A1:A2*A1:A2)</f><v>5</v></c></row>
<row r="2"><c r="B2"><v>4</v></c></row></sheetData>"#,
        );
        let sheet = parse_worksheet(PART, &xml, "Sheet1", CONTEXT).unwrap();
        let array = |r: &str| match &sheet.cell(r).unwrap().unwrap().value {
            CellValue::Formula { array, .. } => array.map(|range| address::format_range(&range)),
            other => panic!("not a formula: {other:?}"),
        };
        assert_eq!(array("B1").as_deref(), Some("B1:B2"));
        assert_eq!(array("C1").as_deref(), Some("C1"));
        assert_eq!(sheet.cell("B2").unwrap().unwrap().value, CellValue::Number(4.0));
    }

    #[test]
    fn test_sheet_view_settings() {
        let xml = wrap(
            r#"<sheetViews><sheetView showGridLines="0" showRowColHeaders="0" rightToLeft="1" view="pageLayout" zoomScale="150" zoomScalePageLayoutView="150" defaultGridColor="0" colorId="10" workbookViewId="0">
<pane xSplit="1" ySplit="2" topLeftCell="B3" activePane="bottomRight" state="frozen"/>
<selection pane="topRight" activeCell="B1" sqref="B1"/>
<selection pane="bottomLeft" activeCell="A5" sqref="A5"/>
<selection pane="bottomRight" activeCell="C4" sqref="C4:D6 F2"/>
</sheetView><sheetView workbookViewId="1" zoomScale="50"/></sheetViews>
<sheetData/>"#,
        );
        let sheet = parse_worksheet(PART, &xml, "Sheet1", CONTEXT).unwrap();
        let view = sheet.view();
        assert!(!view.show_grid_lines);
        assert!(!view.show_row_col_headers);
        assert!(view.right_to_left);
        assert!(view.show_zeros);
        assert_eq!(view.view, ViewMode::PageLayout);
        assert_eq!(view.zoom_scale, 150);
        assert_eq!(view.zoom_scale_page_layout_view, Some(150));
        assert_eq!(view.grid_color, Some(10));
        let selection = view.selection.as_ref().unwrap();
        assert_eq!(selection.active_cell, (3, 2));
        assert_eq!(selection.sqref, "C4:D6 F2");
        assert_eq!(sheet.frozen_panes().map(|f| (f.rows, f.cols)), Some((2, 1)));
    }

    #[test]
    fn test_print_settings() {
        let xml = wrap(
            r#"<sheetData/>
<printOptions horizontalCentered="1" gridLines="1"/>
<pageMargins left="0.25" right="0.25" top="1" bottom="1" header="0.5" footer="0.5"/>
<pageSetup paperSize="9" orientation="landscape" fitToHeight="0" firstPageNumber="3" useFirstPageNumber="1" errors="dash" r:id="rId1"/>
<headerFooter differentFirst="1"><oddHeader>&amp;C&amp;"Arial,Bold"Report</oddHeader><firstFooter>&amp;RPage &amp;P</firstFooter></headerFooter>"#,
        );
        let sheet = parse_worksheet(PART, &xml, "Sheet1", CONTEXT).unwrap();
        let layout = sheet.print_layout();
        let options = layout.options.unwrap();
        assert!(options.horizontal_centered && options.grid_lines && !options.headings);
        assert_eq!(layout.margins.unwrap().left, 0.25);
        assert_eq!(layout.margins.unwrap().header, 0.5);

        let setup = layout.setup.as_ref().unwrap();
        assert_eq!(setup.paper_size, 9);
        assert_eq!(setup.orientation, Orientation::Landscape);
        assert_eq!((setup.fit_to_width, setup.fit_to_height), (1, 0));
        assert_eq!(setup.first_page_number, Some(3));
        assert_eq!(setup.errors, PrintErrors::Dash);
        assert_eq!(setup.printer_settings.as_deref(), Some("rId1"));

        let header_footer = layout.header_footer.as_ref().unwrap();
        assert!(header_footer.different_first);
        assert_eq!(header_footer.odd_header.as_deref(), Some("&C&\"Arial,Bold\"Report"));
        assert_eq!(header_footer.first_footer.as_deref(), Some("&RPage &P"));
        assert_eq!(header_footer.even_header, None);
        assert!(sheet.retained.elements.is_empty());
    }

    #[test]
    fn test_collects_all_problems() {
        let xml = wrap(
            r#"<sheetData><row r="1"><c r="A1" t="s"><v>7</v></c><c r="B1" s="9"><v>1</v></c><c r="C1"><v>abc</v></c><c r="1A"><v>1</v></c></row></sheetData>
<mergeCells><mergeCell ref="A1:B2"/><mergeCell ref="B2:C3"/></mergeCells>"#,
        );
        match parse_worksheet(PART, &xml, "Sheet1", CONTEXT).unwrap_err() {
            Error::MalformedPart { part, problems } => {
                assert_eq!(part, PART);
                assert_eq!(problems.len(), 5, "{problems:?}");
            },
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_shift_formula() {
        assert_eq!(shift_formula("A1+B$2*$C3", 1, 1), "B2+C$2*$C4");
        assert_eq!(shift_formula("SUM(A1:A3)", 2, 0), "SUM(A3:A5)");
        assert_eq!(shift_formula("\"A1\"&Sheet2!A1", 1, 0), "\"A1\"&Sheet2!A2");
        assert_eq!(shift_formula("'My A1'!B1", 0, 1), "'My A1'!C1");
        assert_eq!(shift_formula("LOG10(A1)", 1, 0), "LOG10(A2)");
        assert_eq!(shift_formula("A1", -1, 0), "#REF!");
        assert_eq!(shift_formula("Total_2024+1.5", 1, 1), "Total_2024+1.5");
    }
}

//! Worksheet part writer.
//!
//! Elements are emitted in `CT_Worksheet` order. Each schema slot first gets
//! the generated element for that slot (if any), then the retained elements
//! read from the same slot, so drawings, hyperlinks, conditional formats and
//! the like land back where they came from.

use super::{XML_DECLARATION, write_color, write_root_attributes, write_text_element};
use crate::common::error::Result;
use crate::common::xml::push_escaped;
use crate::ooxml::opc::constants::namespace;
use crate::ooxml::xlsx::schema::WORKSHEET_ELEMENTS;
use crate::sheet::address::{column_letters, format_range, format_ref};
use crate::sheet::cell::{CachedValue, Cell, CellValue, format_number};
use crate::sheet::page_setup::{HeaderFooter, PageSetup, PrintOptions};
use crate::sheet::protection::{PROTECTION_ATTRIBUTES, ProtectionFlags, SheetProtection};
use crate::sheet::view::{SheetView, ViewMode};
use crate::sheet::worksheet::{ColumnInfo, FreezePanes, RowInfo, Worksheet};
use std::fmt::Write as FmtWrite;

/// Excel's default row height in points, written when the sheet has none.
const DEFAULT_ROW_HEIGHT: f64 = 15.0;

/// Serialize one worksheet. `selected` marks the active tab.
pub fn write_worksheet(sheet: &Worksheet, selected: bool) -> Result<String> {
    let mut xml = String::with_capacity(1024 + sheet.cell_count() * 32);
    xml.push_str(XML_DECLARATION);
    write!(
        xml,
        r#"<worksheet xmlns="{}" xmlns:r="{}""#,
        namespace::SML_MAIN,
        namespace::OFC_RELATIONSHIPS
    )?;
    write_root_attributes(&mut xml, &sheet.retained.root_attributes);
    xml.push('>');

    let mut retained: Vec<_> = sheet.retained.elements.iter().collect();
    retained.sort_by_key(|el| el.order);
    let mut retained = retained.into_iter().peekable();

    for slot in 0..WORKSHEET_ELEMENTS.len() as u8 {
        write_generated(&mut xml, sheet, slot, selected)?;
        while let Some(element) = retained.next_if(|el| el.order <= slot) {
            xml.push_str(&element.xml);
        }
    }
    for element in retained {
        xml.push_str(&element.xml);
    }

    xml.push_str("</worksheet>");
    Ok(xml)
}

fn write_generated(xml: &mut String, sheet: &Worksheet, slot: u8, selected: bool) -> Result<()> {
    match WORKSHEET_ELEMENTS[slot as usize] {
        "sheetPr" => {
            let fit_to_page = sheet.print_layout().setup.as_ref().is_some_and(|s| s.fit_to_page);
            if sheet.tab_color().is_some() || fit_to_page {
                xml.push_str("<sheetPr>");
                if let Some(color) = sheet.tab_color() {
                    write_color(xml, "tabColor", color)?;
                }
                if fit_to_page {
                    xml.push_str(r#"<pageSetUpPr fitToPage="1"/>"#);
                }
                xml.push_str("</sheetPr>");
            }
        },
        "dimension" => match sheet.dimension() {
            Some(range) => write!(xml, r#"<dimension ref="{}"/>"#, format_range(&range))?,
            None => xml.push_str(r#"<dimension ref="A1"/>"#),
        },
        "sheetViews" => write_sheet_view(xml, sheet.view(), sheet.frozen_panes(), selected)?,
        "sheetFormatPr" => {
            let height = sheet.default_row_height().unwrap_or(DEFAULT_ROW_HEIGHT);
            write!(xml, r#"<sheetFormatPr defaultRowHeight="{}""#, format_number(height))?;
            if let Some(width) = sheet.default_column_width() {
                write!(xml, r#" defaultColWidth="{}""#, format_number(width))?;
            }
            xml.push_str("/>");
        },
        "cols" => write_cols(xml, sheet)?,
        "sheetData" => write_sheet_data(xml, sheet)?,
        "sheetProtection" => {
            if let Some(protection) = sheet.protection() {
                write_protection(xml, protection)?;
            }
        },
        "mergeCells" => {
            let merges = sheet.merged_ranges();
            if !merges.is_empty() {
                write!(xml, r#"<mergeCells count="{}">"#, merges.len())?;
                for range in merges {
                    write!(xml, r#"<mergeCell ref="{}"/>"#, format_range(range))?;
                }
                xml.push_str("</mergeCells>");
            }
        },
        "printOptions" => {
            if let Some(options) = &sheet.print_layout().options {
                write_print_options(xml, options);
            }
        },
        "pageMargins" => {
            if let Some(m) = &sheet.print_layout().margins {
                write!(
                    xml,
                    r#"<pageMargins left="{}" right="{}" top="{}" bottom="{}" header="{}" footer="{}"/>"#,
                    format_number(m.left),
                    format_number(m.right),
                    format_number(m.top),
                    format_number(m.bottom),
                    format_number(m.header),
                    format_number(m.footer)
                )?;
            }
        },
        "pageSetup" => {
            if let Some(setup) = &sheet.print_layout().setup {
                write_page_setup(xml, setup)?;
            }
        },
        "headerFooter" => {
            if let Some(header_footer) = &sheet.print_layout().header_footer {
                write_header_footer(xml, header_footer);
            }
        },
        _ => {},
    }
    Ok(())
}

/// Writes `attr="1"` or `attr="0"` when `value` differs from the schema default.
fn push_flag(xml: &mut String, attr: &str, value: bool, default: bool) {
    if value != default {
        xml.push(' ');
        xml.push_str(attr);
        xml.push_str(if value { r#"="1""# } else { r#"="0""# });
    }
}

fn write_sheet_view(xml: &mut String, view: &SheetView, freeze: Option<FreezePanes>, selected: bool) -> Result<()> {
    xml.push_str("<sheetViews><sheetView");
    push_flag(xml, "windowProtection", view.window_protection, false);
    push_flag(xml, "showFormulas", view.show_formulas, false);
    push_flag(xml, "showGridLines", view.show_grid_lines, true);
    push_flag(xml, "showRowColHeaders", view.show_row_col_headers, true);
    push_flag(xml, "showZeros", view.show_zeros, true);
    push_flag(xml, "rightToLeft", view.right_to_left, false);
    push_flag(xml, "tabSelected", selected, false);
    push_flag(xml, "showRuler", view.show_ruler, true);
    push_flag(xml, "showOutlineSymbols", view.show_outline_symbols, true);
    push_flag(xml, "defaultGridColor", view.grid_color.is_none(), true);
    push_flag(xml, "showWhiteSpace", view.show_white_space, true);
    if view.view != ViewMode::Normal {
        write!(xml, r#" view="{}""#, view.view.as_str())?;
    }
    if let Some((row, col)) = view.top_left_cell {
        write!(xml, r#" topLeftCell="{}""#, format_ref(row, col))?;
    }
    if let Some(color) = view.grid_color {
        write!(xml, r#" colorId="{color}""#)?;
    }
    if view.zoom_scale != 100 {
        write!(xml, r#" zoomScale="{}""#, view.zoom_scale)?;
    }
    let zooms = [
        ("zoomScaleNormal", view.zoom_scale_normal),
        ("zoomScalePageLayoutView", view.zoom_scale_page_layout_view),
        ("zoomScaleSheetLayoutView", view.zoom_scale_sheet_layout_view),
    ];
    for (attr, zoom) in zooms {
        if let Some(zoom) = zoom {
            write!(xml, r#" {attr}="{zoom}""#)?;
        }
    }
    xml.push_str(r#" workbookViewId="0""#);

    let active_pane = match freeze {
        Some(FreezePanes { rows, cols }) => {
            let active_pane = match (rows > 0, cols > 0) {
                (true, true) => "bottomRight",
                (true, false) => "bottomLeft",
                _ => "topRight",
            };
            xml.push_str("><pane");
            if cols > 0 {
                write!(xml, r#" xSplit="{cols}""#)?;
            }
            if rows > 0 {
                write!(xml, r#" ySplit="{rows}""#)?;
            }
            write!(
                xml,
                r#" topLeftCell="{}" activePane="{active_pane}" state="frozen"/>"#,
                format_ref(rows, cols)
            )?;
            Some(active_pane)
        },
        None if view.selection.is_some() => {
            xml.push('>');
            None
        },
        None => {
            xml.push_str("/></sheetViews>");
            return Ok(());
        },
    };

    xml.push_str("<selection");
    if let Some(pane) = active_pane {
        write!(xml, r#" pane="{pane}""#)?;
    }
    if let Some(selection) = &view.selection {
        let (row, col) = selection.active_cell;
        write!(xml, r#" activeCell="{}" sqref=""#, format_ref(row, col))?;
        push_escaped(xml, &selection.sqref);
        xml.push('"');
    }
    xml.push_str("/></sheetView></sheetViews>");
    Ok(())
}

fn write_print_options(xml: &mut String, options: &PrintOptions) {
    xml.push_str("<printOptions");
    push_flag(xml, "horizontalCentered", options.horizontal_centered, false);
    push_flag(xml, "verticalCentered", options.vertical_centered, false);
    push_flag(xml, "headings", options.headings, false);
    push_flag(xml, "gridLines", options.grid_lines, false);
    push_flag(xml, "gridLinesSet", options.grid_lines_set, true);
    xml.push_str("/>");
}

/// `pageSetup`, non-default attributes only.
fn write_page_setup(xml: &mut String, setup: &PageSetup) -> std::fmt::Result {
    xml.push_str("<pageSetup");
    let defaults = PageSetup::default();
    let numbers = [
        ("paperSize", setup.paper_size, defaults.paper_size),
        ("scale", setup.scale, defaults.scale),
    ];
    for (attr, value, default) in numbers {
        if value != default {
            write!(xml, r#" {attr}="{value}""#)?;
        }
    }
    if let Some(first) = setup.first_page_number {
        write!(xml, r#" firstPageNumber="{first}""#)?;
    }
    let fits = [
        ("fitToWidth", setup.fit_to_width, defaults.fit_to_width),
        ("fitToHeight", setup.fit_to_height, defaults.fit_to_height),
    ];
    for (attr, value, default) in fits {
        if value != default {
            write!(xml, r#" {attr}="{value}""#)?;
        }
    }
    if setup.page_order != defaults.page_order {
        write!(xml, r#" pageOrder="{}""#, setup.page_order.as_str())?;
    }
    if setup.orientation != defaults.orientation {
        write!(xml, r#" orientation="{}""#, setup.orientation.as_str())?;
    }
    push_flag(xml, "usePrinterDefaults", setup.use_printer_defaults, true);
    push_flag(xml, "blackAndWhite", setup.black_and_white, false);
    push_flag(xml, "draft", setup.draft, false);
    if setup.cell_comments != defaults.cell_comments {
        write!(xml, r#" cellComments="{}""#, setup.cell_comments.as_str())?;
    }
    push_flag(xml, "useFirstPageNumber", setup.first_page_number.is_some(), false);
    if setup.errors != defaults.errors {
        write!(xml, r#" errors="{}""#, setup.errors.as_str())?;
    }
    if let Some(dpi) = setup.horizontal_dpi {
        write!(xml, r#" horizontalDpi="{dpi}""#)?;
    }
    if let Some(dpi) = setup.vertical_dpi {
        write!(xml, r#" verticalDpi="{dpi}""#)?;
    }
    if setup.copies != defaults.copies {
        write!(xml, r#" copies="{}""#, setup.copies)?;
    }
    if let Some(id) = &setup.printer_settings {
        write!(xml, r#" r:id="{id}""#)?;
    }
    xml.push_str("/>");
    Ok(())
}

fn write_header_footer(xml: &mut String, header_footer: &HeaderFooter) {
    xml.push_str("<headerFooter");
    push_flag(xml, "differentOddEven", header_footer.different_odd_even, false);
    push_flag(xml, "differentFirst", header_footer.different_first, false);
    push_flag(xml, "scaleWithDoc", header_footer.scale_with_doc, true);
    push_flag(xml, "alignWithMargins", header_footer.align_with_margins, true);
    xml.push('>');
    for (name, text) in header_footer.parts() {
        if let Some(text) = text {
            write_text_element(xml, name, text);
        }
    }
    xml.push_str("</headerFooter>");
}

/// `<cols>`, with runs of equal adjacent columns collapsed into one `<col>`.
fn write_cols(xml: &mut String, sheet: &Worksheet) -> Result<()> {
    let mut runs: Vec<(u32, u32, ColumnInfo)> = Vec::new();
    for (col, info) in sheet.columns() {
        match runs.last_mut() {
            Some((_, last, run_info)) if *last + 1 == col && run_info == info => *last = col,
            _ => runs.push((col, col, *info)),
        }
    }
    if runs.is_empty() {
        return Ok(());
    }

    xml.push_str("<cols>");
    for (first, last, info) in runs {
        write!(xml, r#"<col min="{}" max="{}""#, first + 1, last + 1)?;
        if let Some(width) = info.width {
            write!(xml, r#" width="{}" customWidth="1""#, format_number(width))?;
        }
        if info.hidden {
            xml.push_str(r#" hidden="1""#);
        }
        xml.push_str("/>");
    }
    xml.push_str("</cols>");
    Ok(())
}

/// Rows ascending; a row is written when it has cells or custom settings.
fn write_sheet_data(xml: &mut String, sheet: &Worksheet) -> Result<()> {
    let mut infos = sheet.rows().peekable();
    let mut cells = sheet.raw_cells().peekable();
    let mut any = false;

    loop {
        let row = match (infos.peek(), cells.peek()) {
            (None, None) => break,
            (Some((row, _)), None) => *row,
            (None, Some(((row, _), _))) => *row,
            (Some((a, _)), Some(((b, _), _))) => (*a).min(*b),
        };
        if !any {
            xml.push_str("<sheetData>");
            any = true;
        }

        let info = infos.next_if(|(r, _)| *r == row).map(|(_, info)| info);
        write_row_start(xml, row, info)?;
        let mut empty = true;
        while let Some(((_, col), cell)) = cells.next_if(|((r, _), _)| *r == row) {
            if empty {
                xml.push('>');
                empty = false;
            }
            write_cell(xml, row, col, cell)?;
        }
        xml.push_str(if empty { "/>" } else { "</row>" });
    }

    xml.push_str(if any { "</sheetData>" } else { "<sheetData/>" });
    Ok(())
}

fn write_row_start(xml: &mut String, row: u32, info: Option<&RowInfo>) -> std::fmt::Result {
    write!(xml, r#"<row r="{}""#, row + 1)?;
    if let Some(info) = info {
        if let Some(height) = info.height {
            write!(xml, r#" ht="{}" customHeight="1""#, format_number(height))?;
        }
        if info.hidden {
            xml.push_str(r#" hidden="1""#);
        }
    }
    Ok(())
}

fn write_cell(xml: &mut String, row: u32, col: u32, cell: &Cell) -> std::fmt::Result {
    write!(xml, r#"<c r="{}{}""#, column_letters(col), row + 1)?;
    if cell.style != 0 {
        write!(xml, r#" s="{}""#, cell.style)?;
    }

    match &cell.value {
        CellValue::Empty => xml.push_str("/>"),
        CellValue::Number(n) => write!(xml, "><v>{}</v></c>", format_number(*n))?,
        CellValue::Text(index) => write!(xml, r#" t="s"><v>{index}</v></c>"#)?,
        CellValue::InlineText(text) => {
            xml.push_str(r#" t="inlineStr"><is>"#);
            write_text_element(xml, "t", text);
            xml.push_str("</is></c>");
        },
        CellValue::Boolean(b) => write!(xml, r#" t="b"><v>{}</v></c>"#, u8::from(*b))?,
        CellValue::Error(code) => write!(xml, r#" t="e"><v>{}</v></c>"#, code.as_str())?,
        CellValue::Formula { formula, cached, array } => {
            match cached {
                Some(CachedValue::Text(_)) => xml.push_str(r#" t="str""#),
                Some(CachedValue::Boolean(_)) => xml.push_str(r#" t="b""#),
                Some(CachedValue::Error(_)) => xml.push_str(r#" t="e""#),
                Some(CachedValue::Number(_)) | None => {},
            }
            match array {
                Some(range) => write!(xml, r#"><f t="array" ref="{}">"#, format_range(range))?,
                None => xml.push_str("><f>"),
            }
            push_escaped(xml, formula);
            xml.push_str("</f>");
            match cached {
                Some(CachedValue::Number(n)) => write!(xml, "<v>{}</v>", format_number(*n))?,
                Some(CachedValue::Text(text)) => write_text_element(xml, "v", text),
                Some(CachedValue::Boolean(b)) => write!(xml, "<v>{}</v>", u8::from(*b))?,
                Some(CachedValue::Error(code)) => write!(xml, "<v>{}</v>", code.as_str())?,
                None => {},
            }
            xml.push_str("</c>");
        },
    }
    Ok(())
}

/// `sheetProtection`, writing only the flags that differ from the schema defaults.
fn write_protection(xml: &mut String, protection: &SheetProtection) -> std::fmt::Result {
    xml.push_str("<sheetProtection");
    if let Some(hash) = &protection.password_hash {
        write!(xml, r#" password="{hash}""#)?;
    }
    for (key, value) in &protection.hash_attributes {
        write!(xml, r#" {key}=""#)?;
        push_escaped(xml, value);
        xml.push('"');
    }
    for (attr, bit) in PROTECTION_ATTRIBUTES {
        let set = protection.flags.contains(bit);
        if set != ProtectionFlags::SCHEMA_DEFAULTS.contains(bit) {
            write!(xml, r#" {attr}="{}""#, u8::from(set))?;
        }
    }
    xml.push_str("/>");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ooxml::xlsx::parsers::worksheet_parser::{SheetContext, parse_worksheet};
    use crate::ooxml::xlsx::schema::order_of;
    use crate::sheet::address::parse_range;
    use crate::sheet::cell::ErrorCode;
    use crate::sheet::page_setup::{Orientation, PageMargins};
    use crate::sheet::style::Color;
    use crate::sheet::view::Selection;
    use crate::sheet::worksheet::RetainedElement;

    const PART: &str = "/xl/worksheets/sheet1.xml";

    const CONTEXT: SheetContext = SheetContext {
        shared_strings: 4,
        cell_formats: 3,
        date1904: false,
    };

    fn slot_of(name: &str) -> u8 {
        order_of(&WORKSHEET_ELEMENTS, name)
    }

    fn sample() -> Worksheet {
        let mut sheet = Worksheet::new("Data");
        sheet.put_cell(0, 0, Cell::new(CellValue::Text(0), 0));
        sheet.put_cell(0, 1, Cell::new(CellValue::Number(42.5), 2));
        sheet.put_cell(0, 2, Cell::new(CellValue::InlineText(" x < y ".into()), 0));
        sheet.put_cell(1, 0, Cell::new(CellValue::Boolean(true), 0));
        sheet.put_cell(1, 1, Cell::new(CellValue::Error(ErrorCode::Div0), 0));
        sheet.put_cell(
            1,
            2,
            Cell::new(
                CellValue::Formula {
                    formula: "CONCAT(A1,\"&\")".into(),
                    cached: Some(CachedValue::Text("a&".into())),
                    array: None,
                },
                0,
            ),
        );
        sheet.put_cell(3, 3, Cell::new(CellValue::Empty, 1));
        sheet
    }

    #[test]
    fn test_sheet_data_layout() {
        let mut sheet = sample();
        sheet.set_row_height(2, 30.0).unwrap();
        let xml = write_worksheet(&sheet, true).unwrap();
        assert!(xml.contains(r#"<dimension ref="A1:D4"/>"#));
        assert!(xml.contains(r#"<sheetView tabSelected="1" workbookViewId="0"/>"#));
        assert!(xml.contains(r#"<c r="A1" t="s"><v>0</v></c><c r="B1" s="2"><v>42.5</v></c>"#));
        assert!(xml.contains(r#"<c r="C1" t="inlineStr"><is><t xml:space="preserve"> x &lt; y </t></is></c>"#));
        assert!(xml.contains(r#"<c r="C2" t="str"><f>CONCAT(A1,&quot;&amp;&quot;)</f><v>a&amp;</v></c>"#));
        assert!(xml.contains(r#"<row r="3" ht="30" customHeight="1"/><row r="4"><c r="D4" s="1"/></row>"#));
    }

    #[test]
    fn test_reparse_matches_model() {
        let mut sheet = sample();
        sheet.set_column_width(1, 20.0).unwrap();
        sheet.set_column_width(2, 20.0).unwrap();
        sheet.set_column_hidden(5, true).unwrap();
        sheet.merge_cells("E1:F2").unwrap();
        sheet.freeze_panes(1, 2).unwrap();
        sheet.set_tab_color(Color::rgb("00FF00"));
        sheet.protect(Some("abc"));

        let xml = write_worksheet(&sheet, false).unwrap();
        assert!(xml.contains(r#"<col min="2" max="3" width="20" customWidth="1"/><col min="6" max="6" hidden="1"/>"#));
        assert!(xml.contains(r#"<pane xSplit="2" ySplit="1" topLeftCell="C2" activePane="bottomRight" state="frozen"/>"#));

        let back = parse_worksheet(PART, xml.as_bytes(), "Data", CONTEXT).unwrap();
        let cells: Vec<_> = back.raw_cells().collect();
        let expected: Vec<_> = sheet.raw_cells().collect();
        assert_eq!(cells, expected);
        assert_eq!(back.merged_ranges(), sheet.merged_ranges());
        assert_eq!(back.frozen_panes(), sheet.frozen_panes());
        assert_eq!(back.tab_color(), sheet.tab_color());
        assert_eq!(back.protection(), sheet.protection());
        assert_eq!(back.column(2), sheet.column(2));
        assert_eq!(back.column(5), sheet.column(5));
    }

    #[test]
    fn test_retained_elements_keep_schema_slots() {
        let mut sheet = sample();
        sheet.merge_cells("E1:F2").unwrap();
        sheet.retained.root_attributes = vec![("xmlns:mc".into(), "urn:mc".into()), ("mc:Ignorable".into(), "x14ac".into())];
        sheet.retained.elements = vec![
            RetainedElement { order: slot_of("drawing"), xml: r#"<drawing r:id="rId1"/>"#.into() },
            RetainedElement { order: slot_of("hyperlinks"), xml: "<hyperlinks/>".into() },
            RetainedElement { order: slot_of("conditionalFormatting"), xml: "<conditionalFormatting/>".into() },
        ];

        let xml = write_worksheet(&sheet, false).unwrap();
        assert!(xml.contains(r#" xmlns:mc="urn:mc" mc:Ignorable="x14ac">"#));
        let at = |needle: &str| xml.find(needle).unwrap();
        assert!(at("</sheetData>") < at("<mergeCells"));
        assert!(at("<mergeCells") < at("<conditionalFormatting/>"));
        assert!(at("<conditionalFormatting/>") < at("<hyperlinks/>"));
        assert!(at("<hyperlinks/>") < at("<drawing "));
        assert!(xml.ends_with(r#"<drawing r:id="rId1"/></worksheet>"#));
    }

    #[test]
    fn test_array_formula_keeps_range() {
        let mut sheet = Worksheet::new("Data");
        let formula = CellValue::Formula {
            formula: "A1:A3*2".into(),
            cached: Some(CachedValue::Number(2.0)),
            array: Some(parse_range("B1:B3").unwrap()),
        };
        sheet.put_cell(0, 1, Cell::new(formula, 0));
        sheet.put_cell(1, 1, Cell::new(CellValue::Number(4.0), 0));

        let xml = write_worksheet(&sheet, false).unwrap();
        assert!(xml.contains(r#"<c r="B1"><f t="array" ref="B1:B3">A1:A3*2</f><v>2</v></c>"#));
        let back = parse_worksheet(PART, xml.as_bytes(), "Data", CONTEXT).unwrap();
        assert_eq!(back.cell_at(0, 1), sheet.cell_at(0, 1));
        assert_eq!(back.cell_at(1, 1), sheet.cell_at(1, 1));
    }

    #[test]
    fn test_sheet_view_survives_resave() {
        let source = r#"<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetViews><sheetView showGridLines="0" zoomScale="150" zoomScaleNormal="150" workbookViewId="0"><selection activeCell="C3" sqref="C3:D4"/></sheetView></sheetViews><sheetData/></worksheet>"#;
        let sheet = parse_worksheet(PART, source.as_bytes(), "Data", CONTEXT).unwrap();
        let xml = write_worksheet(&sheet, true).unwrap();
        assert!(xml.contains(
            r#"<sheetView showGridLines="0" tabSelected="1" zoomScale="150" zoomScaleNormal="150" workbookViewId="0"><selection activeCell="C3" sqref="C3:D4"/></sheetView>"#
        ));
        let back = parse_worksheet(PART, xml.as_bytes(), "Data", CONTEXT).unwrap();
        assert_eq!(back.view(), sheet.view());
    }

    #[test]
    fn test_frozen_view_keeps_selection() {
        let mut sheet = Worksheet::new("Data");
        sheet.freeze_panes(1, 0).unwrap();
        sheet.view_mut().show_row_col_headers = false;
        sheet.view_mut().set_zoom(80).unwrap();
        sheet.view_mut().select(Some(Selection::cell("A7").unwrap()));

        let xml = write_worksheet(&sheet, false).unwrap();
        assert!(xml.contains(
            r#"<sheetView showRowColHeaders="0" zoomScale="80" zoomScaleNormal="80" workbookViewId="0"><pane ySplit="1" topLeftCell="A2" activePane="bottomLeft" state="frozen"/><selection pane="bottomLeft" activeCell="A7" sqref="A7"/></sheetView>"#
        ));
        let back = parse_worksheet(PART, xml.as_bytes(), "Data", CONTEXT).unwrap();
        assert_eq!(back.view(), sheet.view());
        assert_eq!(back.frozen_panes(), sheet.frozen_panes());
    }

    #[test]
    fn test_print_layout_slots() {
        let mut sheet = sample();
        sheet.merge_cells("E1:F2").unwrap();
        let layout = sheet.print_layout_mut();
        layout.options = Some(PrintOptions {
            grid_lines: true,
            ..PrintOptions::default()
        });
        layout.margins = Some(PageMargins {
            left: 0.5,
            ..PageMargins::default()
        });
        let mut setup = PageSetup {
            paper_size: 9,
            orientation: Orientation::Landscape,
            ..PageSetup::default()
        };
        setup.fit_to_pages(1, 0);
        layout.setup = Some(setup);
        layout.header_footer = Some(HeaderFooter {
            odd_footer: Some("&CPage &P of &N".into()),
            ..HeaderFooter::default()
        });
        sheet.retained.elements = vec![RetainedElement { order: slot_of("drawing"), xml: r#"<drawing r:id="rId1"/>"#.into() }];

        let xml = write_worksheet(&sheet, false).unwrap();
        assert!(xml.contains(r#"<sheetPr><pageSetUpPr fitToPage="1"/></sheetPr>"#));
        assert!(xml.contains(
            r#"</mergeCells><printOptions gridLines="1"/><pageMargins left="0.5" right="0.7" top="0.75" bottom="0.75" header="0.3" footer="0.3"/><pageSetup paperSize="9" fitToHeight="0" orientation="landscape"/><headerFooter><oddFooter>&amp;CPage &amp;P of &amp;N</oddFooter></headerFooter><drawing "#
        ));
        let back = parse_worksheet(PART, xml.as_bytes(), "Data", CONTEXT).unwrap();
        assert_eq!(back.print_layout(), sheet.print_layout());
    }

    #[test]
    fn test_empty_sheet() {
        let xml = write_worksheet(&Worksheet::new("Empty"), false).unwrap();
        assert!(xml.contains(r#"<dimension ref="A1"/><sheetViews><sheetView workbookViewId="0"/></sheetViews><sheetFormatPr defaultRowHeight="15"/><sheetData/></worksheet>"#));
    }
}

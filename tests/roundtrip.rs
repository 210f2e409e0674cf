mod common;

use chrono::{TimeZone, Utc};
use litchi_xlsx::sheet::{
    Alignment, Border, BorderLineStyle, CachedValue, CellValue, Color, ErrorCode, Fill, Font, HeaderFooter,
    HorizontalAlignment, Orientation, PageMargins, PageSetup, ProtectionFlags, Selection, SheetVisibility, Style, Value,
    Workbook,
};
use litchi_xlsx::{Error, ResolvedValue, open, save};

#[derive(Debug, PartialEq)]
struct CellTuple {
    sheet: String,
    row: u32,
    col: u32,
    value: String,
    style: Style,
    formula: Option<String>,
}

fn tuples(workbook: &Workbook) -> Vec<CellTuple> {
    let mut out = Vec::new();
    for sheet in workbook.worksheets() {
        for cell in sheet.cells(workbook) {
            let cell = cell.unwrap();
            let value = match cell.value {
                ResolvedValue::Empty => "empty".to_string(),
                ResolvedValue::Number(n) => format!("n:{n}"),
                ResolvedValue::Text(s) => format!("s:{s}"),
                ResolvedValue::Boolean(b) => format!("b:{b}"),
                ResolvedValue::Error(e) => format!("e:{e}"),
            };
            out.push(CellTuple {
                sheet: sheet.name().to_string(),
                row: cell.row,
                col: cell.col,
                value,
                style: cell.style.clone(),
                formula: cell.formula.map(str::to_string),
            });
        }
    }
    out
}

fn rich_workbook() -> Workbook {
    let mut wb = Workbook::new();
    let header = Style::new()
        .with_font(Font {
            bold: true,
            color: Color::rgb("FFFFFF"),
            ..Font::default()
        })
        .with_fill(Fill::solid(Color::theme(4)))
        .with_border(Border::outline(BorderLineStyle::Thin, Color::rgb("000000")))
        .with_alignment(Alignment {
            horizontal: Some(HorizontalAlignment::Center),
            wrap_text: true,
            ..Alignment::default()
        });
    let percent = Style::new().with_number_format("0.00%");
    let date = Style::new().with_number_format("yyyy-mm-dd");
    {
        let mut sheet = wb.worksheet_mut("Sheet1").unwrap();
        sheet.set_cell("A1", "Region", &header).unwrap();
        sheet.set_cell("B1", "Share", &header).unwrap();
        sheet.set_value("A2", "  padded  ").unwrap();
        sheet.set_cell("B2", 0.125, &percent).unwrap();
        sheet.set_value("A3", "North").unwrap();
        sheet.set_cell("B3", 45292.0, &date).unwrap();
        sheet.set_value("C3", true).unwrap();
        sheet.set_value("D3", ErrorCode::Div0).unwrap();
        sheet.set_value("E3", Value::Formula("=SUM(B2:B3)".to_string())).unwrap();
        sheet
            .set_formula_with_result("F3", "A3&\"!\"", CachedValue::Text("North!".to_string()))
            .unwrap();
        sheet.set_value("XFD1048576", -1.5e-7).unwrap();
        sheet.merge_cells("A5:C6").unwrap();
        sheet.freeze_panes(1, 1).unwrap();
        sheet.set_column_width(0, 24.5).unwrap();
        sheet.set_column_hidden(3, true).unwrap();
        sheet.set_row_height(9, 30.0).unwrap();
        sheet.set_tab_color(Color::rgb("FF00B050"));
        sheet.protect(Some("abc")).allow(ProtectionFlags::SORT, true);
        sheet.view_mut().show_grid_lines = false;
        sheet.view_mut().set_zoom(150).unwrap();
        sheet.view_mut().select(Some(Selection::cell("B2").unwrap()));
        let layout = sheet.print_layout_mut();
        layout.margins = Some(PageMargins::default());
        layout.setup = Some(PageSetup {
            orientation: Orientation::Landscape,
            ..PageSetup::default()
        });
        layout.header_footer = Some(HeaderFooter {
            odd_header: Some("&CQuarterly".to_string()),
            ..HeaderFooter::default()
        });
    }
    {
        let mut data = wb.add_worksheet("Data 2024").unwrap();
        data.set_value("A1", "North").unwrap();
        data.set_array_formula("B1:B2", "=A1:A2&\"x\"").unwrap();
        data.set_visibility(SheetVisibility::Hidden);
    }
    wb.protect(Some("secret")).lock_windows = true;
    wb.add_worksheet("Empty").unwrap();
    wb.define_name("Shares", "Sheet1!$B$2:$B$3", None).unwrap();
    wb.define_name("Local", "'Data 2024'!$A$1", Some("Data 2024")).unwrap();
    wb.set_date1904(true);
    let props = wb.properties_mut();
    props.title = Some("Quarterly".to_string());
    props.creator = Some("Finance".to_string());
    props.created = Some(Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap());
    wb
}

#[test]
fn test_round_trip_preserves_cells() {
    let wb = rich_workbook();
    let back = open(&save(&wb, None).unwrap(), None).unwrap();

    assert_eq!(tuples(&back), tuples(&wb));
    assert_eq!(back.sheet_names().collect::<Vec<_>>(), ["Sheet1", "Data 2024", "Empty"]);
    assert_eq!(back.defined_names(), wb.defined_names());
    assert!(back.date1904());
    assert_eq!(back.properties().title.as_deref(), Some("Quarterly"));
    assert_eq!(back.properties().created, wb.properties().created);

    let sheet = back.worksheet("Sheet1").unwrap();
    assert_eq!(sheet.merged_ranges(), wb.worksheet("Sheet1").unwrap().merged_ranges());
    assert_eq!(sheet.frozen_panes().map(|p| (p.rows, p.cols)), Some((1, 1)));
    assert_eq!(sheet.column(0).and_then(|c| c.width), Some(24.5));
    assert!(sheet.column(3).is_some_and(|c| c.hidden));
    assert_eq!(sheet.row(9).and_then(|r| r.height), Some(30.0));
    assert_eq!(sheet.tab_color(), Color::rgb("FF00B050").as_ref());
    let protection = sheet.protection().unwrap();
    assert_eq!(protection.password_hash.as_deref(), Some("CC1A"));
    assert!(!protection.flags.contains(ProtectionFlags::SORT));
    assert_eq!(back.worksheet("Data 2024").unwrap().visibility(), SheetVisibility::Hidden);

    let original = wb.worksheet("Sheet1").unwrap();
    assert_eq!(sheet.view(), original.view());
    assert!(!sheet.view().show_grid_lines);
    assert_eq!(sheet.view().zoom_scale, 150);
    assert_eq!(sheet.print_layout(), original.print_layout());
    assert_eq!(back.protection(), wb.protection());

    let data = back.worksheet("Data 2024").unwrap();
    assert_eq!(data.cell("B1").unwrap(), wb.worksheet("Data 2024").unwrap().cell("B1").unwrap());
    assert!(matches!(
        &data.cell("B1").unwrap().unwrap().value,
        CellValue::Formula { array: Some(range), .. } if range.extent == (2, 1)
    ));
}

#[test]
fn test_resave_is_byte_identical() {
    let first = save(&rich_workbook(), None).unwrap();
    let opened = open(&first, None).unwrap();
    let second = save(&opened, None).unwrap();
    assert_eq!(second, save(&opened, None).unwrap());
    let third = save(&open(&second, None).unwrap(), None).unwrap();
    assert_eq!(second, third);
}

#[test]
fn test_hello_bold_red_scenario() {
    let mut wb = Workbook::new();
    let bold_red = Style::new().with_font(Font {
        bold: true,
        color: Color::rgb("FF0000"),
        ..Font::default()
    });
    {
        let mut sheet = wb.worksheet_mut("Sheet1").unwrap();
        sheet.set_value("A1", "Hello").unwrap();
        sheet.set_value("B1", 42).unwrap();
        sheet.set_style("A2", &bold_red).unwrap();
    }

    let back = open(&save(&wb, None).unwrap(), None).unwrap();
    let sheet = back.worksheet("Sheet1").unwrap();
    let a1 = sheet.cell_ref(&back, 0, 0).unwrap().unwrap();
    assert_eq!(a1.value, ResolvedValue::Text("Hello"));
    let b1 = sheet.cell_ref(&back, 0, 1).unwrap().unwrap();
    assert_eq!(b1.value, ResolvedValue::Number(42.0));
    let a2 = sheet.cell_ref(&back, 1, 0).unwrap().unwrap();
    assert!(a2.style.font.bold);
    assert_eq!(a2.style.font.color.and_then(|c| c.rgb_hex()).as_deref(), Some("FF0000"));
}

#[test]
fn test_invalid_sheet_name_rejected() {
    let mut wb = Workbook::new();
    assert!(matches!(wb.add_worksheet("Data/2024"), Err(Error::InvalidSheetName(_))));
    assert!(matches!(wb.add_worksheet("sheet1"), Err(Error::DuplicateSheetName(_))));
    assert_eq!(wb.worksheets().len(), 1);
}

#[test]
fn test_equal_styles_share_one_xf() {
    let mut wb = Workbook::new();
    let bold = Style::new().with_font(Font {
        bold: true,
        ..Font::default()
    });
    {
        let mut sheet = wb.worksheet_mut("Sheet1").unwrap();
        sheet.set_style("A1", &bold).unwrap();
        sheet.set_style("B7", &bold.clone()).unwrap();
    }
    let back = open(&save(&wb, None).unwrap(), None).unwrap();
    let sheet = back.worksheet("Sheet1").unwrap();
    assert_eq!(sheet.cell_at(0, 0).unwrap().style, sheet.cell_at(6, 1).unwrap().style);
    assert_eq!(back.styles().len(), 2);
}

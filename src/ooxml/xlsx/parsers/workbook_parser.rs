//! Parser for Excel workbook.xml files.
//!
//! Extracts the sheet list, defined names, the 1904 date flag, workbook
//! protection and the active tab. Every other top-level element is kept as source text together with
//! its schema position.

use super::{ElementOrder, Problems, capture_element, open_reader, root_attributes, position};
use crate::common::error::Result;
use crate::common::xml::{Attrs, append_general_ref, append_text};
use crate::ooxml::xlsx::schema::WORKBOOK_ELEMENTS;
use crate::sheet::protection::WorkbookProtection;
use crate::sheet::workbook::DefinedName;
use crate::sheet::worksheet::{RetainedElement, SheetVisibility};
use quick_xml::events::Event;

/// Performance: typical sheet count
const INITIAL_SHEETS_CAPACITY: usize = 16;

/// One `<sheet>` entry of the workbook.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetEntry {
    pub name: String,
    pub sheet_id: u32,
    pub state: SheetVisibility,
    /// Relationship id of the sheet part
    pub r_id: String,
}

/// Contents of `workbook.xml`.
#[derive(Debug, Default)]
pub struct WorkbookInfo {
    pub sheets: Vec<SheetEntry>,
    pub defined_names: Vec<DefinedName>,
    pub date1904: bool,
    pub active_tab: u32,
    pub protection: Option<WorkbookProtection>,
    pub(crate) retained: Vec<RetainedElement>,
    pub(crate) root_attributes: Vec<(String, String)>,
}

pub fn parse_workbook(part: &str, bytes: &[u8]) -> Result<WorkbookInfo> {
    let mut problems = Problems::new(part);
    let (xml, mut reader) = open_reader(part, bytes)?;

    let mut info = WorkbookInfo {
        sheets: Vec::with_capacity(INITIAL_SHEETS_CAPACITY),
        ..WorkbookInfo::default()
    };
    let mut order = ElementOrder::new(&WORKBOOK_ELEMENTS);
    let mut depth = 0usize;
    let mut defined: Option<(DefinedName, String)> = None;

    loop {
        let before = position(&reader);
        let event = match reader.read_event() {
            Ok(event) => event,
            Err(err) => {
                problems.push(format!("XML error at byte {}: {err}", reader.error_position()));
                break;
            },
        };
        match event {
            Event::Start(e) if depth == 0 => {
                info.root_attributes = root_attributes(&e);
                depth = 1;
            },
            Event::Start(e) if depth == 1 => {
                let name = e.local_name();
                let slot = order.of(name.as_ref());
                match name.as_ref() {
                    b"bookViews" | b"sheets" | b"definedNames" => depth = 2,
                    b"workbookPr" => {
                        info.date1904 = Attrs::from_start(&e).flag("date1904").unwrap_or(false);
                        depth = 2;
                    },
                    b"workbookProtection" => {
                        info.protection = Some(parse_protection(&Attrs::from_start(&e)));
                        depth = 2;
                    },
                    _ => match capture_element(xml, &mut reader, &e, before) {
                        Ok(text) => info.retained.push(RetainedElement { order: slot, xml: text }),
                        Err(err) => {
                            problems.push(format!("XML error: {err}"));
                            break;
                        },
                    },
                }
            },
            Event::Empty(e) if depth == 1 => {
                let name = e.local_name();
                let slot = order.of(name.as_ref());
                match name.as_ref() {
                    b"workbookPr" => info.date1904 = Attrs::from_start(&e).flag("date1904").unwrap_or(false),
                    b"workbookProtection" => info.protection = Some(parse_protection(&Attrs::from_start(&e))),
                    b"bookViews" | b"sheets" | b"definedNames" => {},
                    _ => info.retained.push(RetainedElement {
                        order: slot,
                        xml: xml[before..position(&reader)].to_string(),
                    }),
                }
            },
            Event::Start(e) if depth >= 2 => {
                nested_element(&Attrs::from_start(&e), e.local_name().as_ref(), true, &mut info, &mut defined, &mut problems);
                depth += 1;
            },
            Event::Empty(e) if depth >= 2 => {
                nested_element(&Attrs::from_start(&e), e.local_name().as_ref(), false, &mut info, &mut defined, &mut problems);
            },
            Event::Text(e) => {
                if let Some((_, text)) = defined.as_mut() {
                    append_text(text, &e);
                }
            },
            Event::GeneralRef(e) => {
                if let Some((_, text)) = defined.as_mut() {
                    append_general_ref(text, &e);
                }
            },
            Event::End(e) => {
                if e.local_name().as_ref() == b"definedName"
                    && let Some((mut name, text)) = defined.take()
                {
                    name.refers_to = text;
                    info.defined_names.push(name);
                }
                depth = depth.saturating_sub(1);
            },
            Event::Eof => break,
            _ => {},
        }
    }

    if info.sheets.is_empty() {
        problems.push("workbook has no <sheet> entries");
    }
    problems.finish(info)
}

/// Children of `bookViews`, `sheets` and `definedNames`.
fn nested_element(
    attrs: &Attrs,
    name: &[u8],
    is_start: bool,
    info: &mut WorkbookInfo,
    defined: &mut Option<(DefinedName, String)>,
    problems: &mut Problems,
) {
    match name {
        b"sheet" => {
            if let Some(sheet) = parse_sheet(attrs, problems) {
                info.sheets.push(sheet);
            }
        },
        b"workbookView" => {
            if let Some(tab) = problems.check(attrs.parse::<u32>("activeTab")) {
                info.active_tab = tab;
            }
        },
        b"definedName" => match attrs.get("name") {
            Some(dn_name) => {
                let defined_name = DefinedName {
                    name: dn_name.to_string(),
                    refers_to: String::new(),
                    local_sheet: problems.check(attrs.parse("localSheetId")),
                    hidden: attrs.flag("hidden").unwrap_or(false),
                };
                if is_start {
                    *defined = Some((defined_name, String::new()));
                } else {
                    info.defined_names.push(defined_name);
                }
            },
            None => problems.push("definedName without name"),
        },
        _ => {},
    }
}

fn parse_protection(attrs: &Attrs) -> WorkbookProtection {
    let hash_attributes = attrs
        .iter()
        .filter(|(name, _)| {
            let scheme = name.strip_prefix("workbook").or_else(|| name.strip_prefix("revisions"));
            matches!(scheme, Some("AlgorithmName" | "HashValue" | "SaltValue" | "SpinCount"))
        })
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect();
    WorkbookProtection {
        lock_structure: attrs.flag("lockStructure").unwrap_or(false),
        lock_windows: attrs.flag("lockWindows").unwrap_or(false),
        lock_revision: attrs.flag("lockRevision").unwrap_or(false),
        password_hash: attrs.get("workbookPassword").map(str::to_ascii_uppercase),
        revisions_password_hash: attrs.get("revisionsPassword").map(str::to_ascii_uppercase),
        hash_attributes,
    }
}

fn parse_sheet(attrs: &Attrs, problems: &mut Problems) -> Option<SheetEntry> {
    let name = attrs.get("name");
    let sheet_id = problems.check(attrs.parse::<u32>("sheetId"));
    let r_id = attrs.get("id");
    let state = match attrs.get("state") {
        None => SheetVisibility::Visible,
        Some(value) => SheetVisibility::parse(value).unwrap_or_else(|| {
            log::warn!("unknown sheet state {value:?}, treating as visible");
            SheetVisibility::Visible
        }),
    };
    match (name, sheet_id, r_id) {
        (Some(name), Some(sheet_id), Some(r_id)) => Some(SheetEntry {
            name: name.to_string(),
            sheet_id,
            state,
            r_id: r_id.to_string(),
        }),
        _ => {
            problems.push(format!(
                "<sheet> {:?} is missing name, sheetId or r:id",
                name.unwrap_or_default()
            ));
            None
        },
    }
}

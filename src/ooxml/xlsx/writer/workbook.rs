/// Workbook part (`xl/workbook.xml`) writer.
use super::{XML_DECLARATION, write_root_attributes};
use crate::common::error::Result;
use crate::common::xml::push_escaped;
use crate::ooxml::opc::constants::namespace;
use crate::ooxml::xlsx::schema::WORKBOOK_ELEMENTS;
use crate::sheet::protection::WorkbookProtection;
use crate::sheet::worksheet::SheetVisibility;
use crate::sheet::Workbook;
use std::fmt::Write as FmtWrite;

/// Serialize `workbook.xml`.
///
/// `sheet_rel_ids` holds the relationship id of each worksheet part, in tab
/// order. Sheet ids are the one-based tab positions.
pub fn write_workbook(workbook: &Workbook, sheet_rel_ids: &[String]) -> Result<String> {
    let mut xml = String::with_capacity(1024);
    xml.push_str(XML_DECLARATION);
    write!(
        xml,
        r#"<workbook xmlns="{}" xmlns:r="{}""#,
        namespace::SML_MAIN,
        namespace::OFC_RELATIONSHIPS
    )?;
    write_root_attributes(&mut xml, &workbook.retained.workbook_root_attributes);
    xml.push('>');

    let mut retained: Vec<_> = workbook.retained.workbook_elements.iter().collect();
    retained.sort_by_key(|el| el.order);
    let mut retained = retained.into_iter().peekable();

    for slot in 0..WORKBOOK_ELEMENTS.len() as u8 {
        match WORKBOOK_ELEMENTS[slot as usize] {
            "workbookPr" => {
                if workbook.date1904() {
                    xml.push_str(r#"<workbookPr date1904="1"/>"#);
                } else {
                    xml.push_str("<workbookPr/>");
                }
            },
            "workbookProtection" => {
                if let Some(protection) = workbook.protection() {
                    write_protection(&mut xml, protection)?;
                }
            },
            "bookViews" => {
                xml.push_str("<bookViews><workbookView");
                if workbook.active_sheet() != 0 {
                    write!(xml, r#" activeTab="{}""#, workbook.active_sheet())?;
                }
                xml.push_str("/></bookViews>");
            },
            "sheets" => write_sheets(&mut xml, workbook, sheet_rel_ids)?,
            "definedNames" => write_defined_names(&mut xml, workbook)?,
            _ => {},
        }
        while let Some(element) = retained.next_if(|el| el.order <= slot) {
            xml.push_str(&element.xml);
        }
    }
    for element in retained {
        xml.push_str(&element.xml);
    }

    xml.push_str("</workbook>");
    Ok(xml)
}

fn write_protection(xml: &mut String, protection: &WorkbookProtection) -> Result<()> {
    xml.push_str("<workbookProtection");
    if let Some(hash) = &protection.password_hash {
        write!(xml, r#" workbookPassword="{hash}""#)?;
    }
    if let Some(hash) = &protection.revisions_password_hash {
        write!(xml, r#" revisionsPassword="{hash}""#)?;
    }
    let locks = [
        ("lockStructure", protection.lock_structure),
        ("lockWindows", protection.lock_windows),
        ("lockRevision", protection.lock_revision),
    ];
    for (attr, locked) in locks {
        if locked {
            write!(xml, r#" {attr}="1""#)?;
        }
    }
    for (key, value) in &protection.hash_attributes {
        write!(xml, r#" {key}=""#)?;
        push_escaped(xml, value);
        xml.push('"');
    }
    xml.push_str("/>");
    Ok(())
}

fn write_sheets(xml: &mut String, workbook: &Workbook, sheet_rel_ids: &[String]) -> Result<()> {
    xml.push_str("<sheets>");
    for (idx, (sheet, r_id)) in workbook.worksheets().iter().zip(sheet_rel_ids).enumerate() {
        xml.push_str(r#"<sheet name=""#);
        push_escaped(xml, sheet.name());
        write!(xml, r#"" sheetId="{}""#, idx + 1)?;
        if sheet.visibility() != SheetVisibility::Visible {
            write!(xml, r#" state="{}""#, sheet.visibility().as_str())?;
        }
        write!(xml, r#" r:id="{r_id}"/>"#)?;
    }
    xml.push_str("</sheets>");
    Ok(())
}

fn write_defined_names(xml: &mut String, workbook: &Workbook) -> Result<()> {
    let names = workbook.defined_names();
    if names.is_empty() {
        return Ok(());
    }
    xml.push_str("<definedNames>");
    for defined in names {
        xml.push_str(r#"<definedName name=""#);
        push_escaped(xml, &defined.name);
        xml.push('"');
        if let Some(local) = defined.local_sheet {
            write!(xml, r#" localSheetId="{local}""#)?;
        }
        if defined.hidden {
            xml.push_str(r#" hidden="1""#);
        }
        xml.push('>');
        push_escaped(xml, &defined.refers_to);
        xml.push_str("</definedName>");
    }
    xml.push_str("</definedNames>");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ooxml::xlsx::parsers::workbook_parser::parse_workbook;
    use crate::sheet::worksheet::RetainedElement;

    #[test]
    fn test_workbook_reparse() {
        let mut wb = Workbook::new();
        wb.add_worksheet("Q&A").unwrap();
        wb.add_worksheet("Hidden").unwrap().set_visibility(SheetVisibility::Hidden);
        wb.define_name("Total", "=Sheet1!$A$1:$A$4", None).unwrap();
        wb.define_name("Local", "'Q&A'!$B$2", Some("Q&A")).unwrap();
        wb.set_date1904(true);
        wb.set_active_sheet("Q&A").unwrap();
        wb.retained.workbook_elements.push(RetainedElement {
            order: 9,
            xml: r#"<calcPr calcId="191029"/>"#.to_string(),
        });
        wb.retained.workbook_elements.push(RetainedElement {
            order: 0,
            xml: r#"<fileVersion appName="xl"/>"#.to_string(),
        });

        let ids: Vec<String> = (1..=3).map(|i| format!("rId{i}")).collect();
        let xml = write_workbook(&wb, &ids).unwrap();
        assert!(xml.contains(r#"<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><fileVersion appName="xl"/><workbookPr date1904="1"/>"#));
        assert!(xml.contains(r#"</definedNames><calcPr calcId="191029"/></workbook>"#));

        let info = parse_workbook("/xl/workbook.xml", xml.as_bytes()).unwrap();
        assert!(info.date1904);
        assert_eq!(info.active_tab, 1);
        let names: Vec<_> = info.sheets.iter().map(|s| (s.name.as_str(), s.sheet_id, s.state, s.r_id.as_str())).collect();
        assert_eq!(
            names,
            [
                ("Sheet1", 1, SheetVisibility::Visible, "rId1"),
                ("Q&A", 2, SheetVisibility::Visible, "rId2"),
                ("Hidden", 3, SheetVisibility::Hidden, "rId3"),
            ]
        );
        assert_eq!(info.defined_names, wb.defined_names());
        assert_eq!(info.retained.len(), 2);
        assert_eq!(info.protection, None);
    }

    #[test]
    fn test_protection_precedes_book_views() {
        let mut wb = Workbook::new();
        wb.protect(Some("abc")).lock_windows = true;
        let xml = write_workbook(&wb, &["rId1".to_string()]).unwrap();
        assert!(xml.contains(
            r#"<workbookPr/><workbookProtection workbookPassword="CC1A" lockStructure="1" lockWindows="1"/><bookViews>"#
        ));
        let info = parse_workbook("/xl/workbook.xml", xml.as_bytes()).unwrap();
        assert_eq!(info.protection.as_ref(), wb.protection());
    }
}

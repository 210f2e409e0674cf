//! SpreadsheetML (.xlsx) codec.
//!
//! [`read_workbook`] turns an [`OpcPackage`] into a [`Workbook`] and
//! [`write_workbook`] does the reverse. Parts the model does not cover
//! (themes, drawings, comments, custom XML, VBA projects, ...) are carried
//! through as raw bytes together with the relationships pointing at them.
//!
//! ```rust
//! use litchi_xlsx::ooxml::xlsx::{read_workbook, write_workbook};
//! use litchi_xlsx::sheet::Workbook;
//!
//! let mut wb = Workbook::new();
//! wb.worksheet_mut("Sheet1")?.set_value("A1", "hello")?;
//! let package = write_workbook(&wb)?;
//! let back = read_workbook(&package)?;
//! assert_eq!(back.worksheet("Sheet1")?.cell_count(), 1);
//! # Ok::<(), litchi_xlsx::Error>(())
//! ```

pub mod parsers;
pub mod schema;
pub mod writer;

use crate::common::error::{Error, Result};
use crate::ooxml::opc::constants::{content_type as ct, relationship_type as rt};
use crate::ooxml::opc::{OpcPackage, PackURI, Part, Relationship, Relationships};
use crate::sheet::Workbook;
use crate::sheet::cell::CellValue;
use crate::sheet::shared_strings::SharedStringTable;
use crate::sheet::style::StyleTable;
use parsers::properties_parser::{parse_app_properties, parse_core_properties};
use parsers::shared_strings_parser::parse_shared_strings;
use parsers::styles_parser::parse_styles;
use parsers::workbook_parser::parse_workbook;
use parsers::worksheet_parser::{SheetContext, parse_worksheet};
use std::collections::HashSet;

const WORKBOOK_PART: &str = "/xl/workbook.xml";
const SHARED_STRINGS_PART: &str = "/xl/sharedStrings.xml";
const STYLES_PART: &str = "/xl/styles.xml";
const CORE_PART: &str = "/docProps/core.xml";
const APP_PART: &str = "/docProps/app.xml";

/// Load the workbook held by `package`.
pub fn read_workbook(package: &OpcPackage) -> Result<Workbook> {
    let main = package.main_document_part()?;
    let main_name = main.partname().clone();
    let info = parse_workbook(main_name.as_str(), main.blob())?;
    let wb_rels = main.rels();

    // Parts turned into model state and regenerated on save
    let mut consumed: HashSet<PackURI> = HashSet::new();
    consumed.insert(main_name.clone());

    let shared_strings = match related_part(package, wb_rels, rt::SHARED_STRINGS)? {
        Some(part) => {
            consumed.insert(part.partname().clone());
            parse_shared_strings(part.partname().as_str(), part.blob())?
        },
        None => SharedStringTable::new(),
    };
    let styles = match related_part(package, wb_rels, rt::STYLES)? {
        Some(part) => {
            consumed.insert(part.partname().clone());
            parse_styles(part.partname().as_str(), part.blob())?
        },
        None => StyleTable::new(),
    };
    if let Some(calc_chain) = wb_rels.part_with_reltype(rt::CALC_CHAIN) {
        log::debug!("dropping calculation chain {}", calc_chain.target_ref());
        consumed.insert(calc_chain.target_partname()?);
    }

    let context = SheetContext {
        shared_strings: shared_strings.len(),
        cell_formats: styles.len(),
        date1904: info.date1904,
    };
    let mut workbook = Workbook::empty(shared_strings, styles);
    workbook.set_date1904(info.date1904);

    // Tab index in workbook.xml -> index among loaded worksheets
    let mut tab_map: Vec<Option<u32>> = Vec::with_capacity(info.sheets.len());
    let mut sheet_rel_ids: HashSet<&str> = HashSet::new();
    for entry in &info.sheets {
        let rel = wb_rels.get(&entry.r_id).ok_or_else(|| {
            Error::CorruptPackage(format!("sheet '{}' refers to missing relationship {}", entry.name, entry.r_id))
        })?;
        if rel.reltype() != rt::WORKSHEET {
            log::warn!("sheet '{}' is not a worksheet ({}); keeping its part only", entry.name, rel.reltype());
            tab_map.push(None);
            continue;
        }
        let partname = rel.target_partname()?;
        let part = package
            .part(&partname)
            .ok_or_else(|| Error::CorruptPackage(format!("worksheet part {partname} is missing")))?;

        let mut sheet = parse_worksheet(partname.as_str(), part.blob(), &entry.name, context)?;
        sheet.set_visibility(entry.state);
        sheet.retained.rels = sorted_rels(part.rels());
        sheet.retained.part_name = Some(partname.clone());
        workbook.push_loaded_sheet(sheet)?;

        tab_map.push(Some(workbook.worksheets().len() as u32 - 1));
        sheet_rel_ids.insert(entry.r_id.as_str());
        consumed.insert(partname);
    }

    for mut defined in info.defined_names {
        if let Some(local) = defined.local_sheet {
            match tab_map.get(local as usize).copied().flatten() {
                Some(index) => defined.local_sheet = Some(index),
                None => {
                    log::warn!("dropping defined name '{}' scoped to sheet {local}", defined.name);
                    continue;
                },
            }
        }
        workbook.push_defined_name(defined);
    }
    let active = tab_map.get(info.active_tab as usize).copied().flatten().unwrap_or(0);
    workbook.set_active_index(active);
    workbook.set_protection(info.protection);

    read_properties(package, &mut workbook, &mut consumed)?;

    let retained = &mut workbook.retained;
    if main.content_type() != ct::SML_SHEET_MAIN {
        retained.workbook_content_type = Some(main.content_type().to_string());
    }
    retained.workbook_elements = info.retained;
    retained.workbook_root_attributes = info.root_attributes;
    retained.workbook_rels = sorted_rels(wb_rels)
        .into_iter()
        .filter(|rel| {
            !sheet_rel_ids.contains(rel.r_id())
                && ![rt::SHARED_STRINGS, rt::STYLES, rt::CALC_CHAIN].contains(&rel.reltype())
        })
        .collect();
    retained.package_rels = sorted_rels(package.rels())
        .into_iter()
        .filter(|rel| ![rt::OFFICE_DOCUMENT, rt::CORE_PROPERTIES, rt::EXTENDED_PROPERTIES].contains(&rel.reltype()))
        .collect();
    for part in package.iter_parts() {
        if consumed.contains(part.partname()) {
            continue;
        }
        log::debug!("retaining part {} ({})", part.partname(), part.content_type());
        retained.parts.push(part.clone());
    }
    retained.parts.sort_by(|a, b| a.partname().as_str().cmp(b.partname().as_str()));

    Ok(workbook)
}

/// Build the package for `workbook`.
///
/// Parts are added in a fixed order: workbook, worksheets in tab order,
/// shared strings, styles, document properties, then retained parts by name.
pub fn write_workbook(workbook: &Workbook) -> Result<OpcPackage> {
    let retained = &workbook.retained;
    let workbook_name = PackURI::new(WORKBOOK_PART)?;

    let mut wb_rels = Relationships::new(workbook_name.base_uri());
    for rel in &retained.workbook_rels {
        wb_rels.add_relationship(rel.reltype(), rel.target_ref(), rel.r_id(), rel.is_external());
    }

    let sheet_names = worksheet_part_names(workbook)?;
    let sheet_rel_ids: Vec<String> = sheet_names
        .iter()
        .map(|name| wb_rels.add_part_relationship(rt::WORKSHEET, name))
        .collect();

    let shared_strings = workbook.shared_strings();
    let write_sst = !shared_strings.is_empty();
    let sst_name = PackURI::new(SHARED_STRINGS_PART)?;
    if write_sst {
        wb_rels.add_part_relationship(rt::SHARED_STRINGS, &sst_name);
    }
    let styles_name = PackURI::new(STYLES_PART)?;
    wb_rels.add_part_relationship(rt::STYLES, &styles_name);

    let mut package = OpcPackage::new();

    let workbook_xml = writer::workbook::write_workbook(workbook, &sheet_rel_ids)?;
    let content_type = retained.workbook_content_type.as_deref().unwrap_or(ct::SML_SHEET_MAIN);
    let mut part = Part::new(workbook_name.clone(), content_type, workbook_xml.into_bytes());
    part.set_rels(wb_rels);
    package.add_part(part);

    let active = workbook.active_sheet() as usize;
    for (index, (sheet, partname)) in workbook.worksheets().iter().zip(sheet_names).enumerate() {
        let xml = writer::sheet::write_worksheet(sheet, index == active)?;
        let mut rels = Relationships::new(partname.base_uri());
        for rel in &sheet.retained.rels {
            rels.add_relationship(rel.reltype(), rel.target_ref(), rel.r_id(), rel.is_external());
        }
        let mut part = Part::new(partname, ct::SML_WORKSHEET, xml.into_bytes());
        part.set_rels(rels);
        package.add_part(part);
    }

    if write_sst {
        let references = workbook
            .worksheets()
            .iter()
            .flat_map(|sheet| sheet.raw_cells())
            .filter(|(_, cell)| matches!(cell.value, CellValue::Text(_)))
            .count();
        let xml = writer::strings::write_shared_strings(shared_strings, references)?;
        package.add_part(Part::new(sst_name, ct::SML_SHARED_STRINGS, xml.into_bytes()));
    }
    let xml = writer::styles::write_styles(workbook.styles())?;
    package.add_part(Part::new(styles_name, ct::SML_STYLES, xml.into_bytes()));

    for rel in &retained.package_rels {
        package
            .rels_mut()
            .add_relationship(rel.reltype(), rel.target_ref(), rel.r_id(), rel.is_external());
    }
    package.rels_mut().add_part_relationship(rt::OFFICE_DOCUMENT, &workbook_name);

    let props = workbook.properties();
    if let Some(xml) = writer::properties::write_core_properties(props)? {
        let name = PackURI::new(CORE_PART)?;
        package.rels_mut().add_part_relationship(rt::CORE_PROPERTIES, &name);
        package.add_part(Part::new(name, ct::OPC_CORE_PROPERTIES, xml.into_bytes()));
    }
    let xml = writer::properties::write_app_properties(props, workbook.worksheets().iter().map(|s| s.name()))?;
    let name = PackURI::new(APP_PART)?;
    package.rels_mut().add_part_relationship(rt::EXTENDED_PROPERTIES, &name);
    package.add_part(Part::new(name, ct::OFC_EXTENDED_PROPERTIES, xml.into_bytes()));

    for part in &retained.parts {
        if package.contains(part.partname()) {
            log::warn!("retained part {} collides with a generated part; dropping it", part.partname());
            continue;
        }
        package.add_part(part.clone());
    }

    drop_dangling_relationships(&mut package);
    Ok(package)
}

/// The part targeted by the single `reltype` relationship of `rels`.
fn related_part<'a>(package: &'a OpcPackage, rels: &Relationships, reltype: &str) -> Result<Option<&'a Part>> {
    let Some(rel) = rels.part_with_reltype(reltype) else {
        return Ok(None);
    };
    let partname = rel.target_partname()?;
    package
        .part(&partname)
        .map(Some)
        .ok_or_else(|| Error::CorruptPackage(format!("{partname} is referenced but missing")))
}

fn read_properties(package: &OpcPackage, workbook: &mut Workbook, consumed: &mut HashSet<PackURI>) -> Result<()> {
    if let Some(part) = related_part(package, package.rels(), rt::CORE_PROPERTIES)? {
        parse_core_properties(part.partname().as_str(), part.blob(), workbook.properties_mut())?;
        consumed.insert(part.partname().clone());
    }
    if let Some(part) = related_part(package, package.rels(), rt::EXTENDED_PROPERTIES)? {
        parse_app_properties(part.partname().as_str(), part.blob(), workbook.properties_mut())?;
        consumed.insert(part.partname().clone());
    }
    Ok(())
}

/// Relationships ordered by id so retained state does not depend on hashing.
fn sorted_rels(rels: &Relationships) -> Vec<Relationship> {
    let mut list: Vec<Relationship> = rels.iter().cloned().collect();
    list.sort_by(|a, b| a.r_id().cmp(b.r_id()));
    list
}

/// Part name of every worksheet in tab order.
///
/// Loaded sheets keep their original name; new sheets take the first free
/// `/xl/worksheets/sheetN.xml`.
fn worksheet_part_names(workbook: &Workbook) -> Result<Vec<PackURI>> {
    let mut taken: HashSet<String> = workbook
        .retained
        .parts
        .iter()
        .map(|p| p.partname().as_str().to_ascii_lowercase())
        .collect();
    for reserved in [WORKBOOK_PART, SHARED_STRINGS_PART, STYLES_PART, CORE_PART, APP_PART] {
        taken.insert(reserved.to_ascii_lowercase());
    }

    let mut names: Vec<Option<PackURI>> = Vec::with_capacity(workbook.worksheets().len());
    for sheet in workbook.worksheets() {
        let name = sheet
            .retained
            .part_name
            .as_ref()
            .filter(|name| taken.insert(name.as_str().to_ascii_lowercase()))
            .cloned();
        names.push(name);
    }

    let mut next = 1u32;
    names
        .into_iter()
        .map(|name| match name {
            Some(name) => Ok(name),
            None => loop {
                let candidate = format!("/xl/worksheets/sheet{next}.xml");
                next += 1;
                if taken.insert(candidate.to_ascii_lowercase()) {
                    break PackURI::new(candidate).map_err(Error::from);
                }
            },
        })
        .collect()
}

/// Remove internal relationships whose target part is not in the package.
fn drop_dangling_relationships(package: &mut OpcPackage) {
    let present: HashSet<PackURI> = package.iter_parts().map(|p| p.partname().clone()).collect();
    let dangling = |rels: &Relationships| -> Vec<String> {
        rels.iter()
            .filter(|rel| !rel.is_external())
            .filter(|rel| rel.target_partname().map_or(true, |target| !present.contains(&target)))
            .map(|rel| rel.r_id().to_string())
            .collect()
    };

    for r_id in dangling(package.rels()) {
        log::debug!("dropping package relationship {r_id}: target is gone");
        package.rels_mut().remove(&r_id);
    }
    for partname in &present {
        let Some(part) = package.part_mut(partname) else {
            continue;
        };
        for r_id in dangling(part.rels()) {
            log::debug!("dropping relationship {r_id} of {partname}: target is gone");
            part.rels_mut().remove(&r_id);
        }
    }
}

//! `docProps/core.xml` and `docProps/app.xml` writers.

use super::{XML_DECLARATION, write_text_element};
use crate::common::error::Result;
use crate::common::xml::push_escaped;
use crate::ooxml::opc::constants::namespace;
use crate::sheet::properties::{DocumentProperties, format_w3cdtf};
use std::fmt::Write as FmtWrite;

/// Name written as `Application` in `app.xml`.
pub const APPLICATION_NAME: &str = "Microsoft Excel";

/// Core properties, or `None` when no core property is set.
pub fn write_core_properties(props: &DocumentProperties) -> Result<Option<String>> {
    if props.is_core_empty() {
        return Ok(None);
    }

    let mut xml = String::with_capacity(512);
    xml.push_str(XML_DECLARATION);
    write!(
        xml,
        r#"<cp:coreProperties xmlns:cp="{}" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" xmlns:dcmitype="http://purl.org/dc/dcmitype/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">"#,
        namespace::CORE_PROPERTIES
    )?;

    for (tag, value) in [
        ("dc:title", &props.title),
        ("dc:subject", &props.subject),
        ("dc:creator", &props.creator),
        ("cp:keywords", &props.keywords),
        ("dc:description", &props.description),
        ("cp:lastModifiedBy", &props.last_modified_by),
        ("cp:revision", &props.revision),
    ] {
        if let Some(value) = value {
            write_text_element(&mut xml, tag, value);
        }
    }
    for (tag, value) in [("dcterms:created", &props.created), ("dcterms:modified", &props.modified)] {
        if let Some(dt) = value {
            write!(xml, r#"<{tag} xsi:type="dcterms:W3CDTF">{}</{tag}>"#, format_w3cdtf(dt))?;
        }
    }
    for (tag, value) in [("cp:category", &props.category), ("cp:contentStatus", &props.content_status)] {
        if let Some(value) = value {
            write_text_element(&mut xml, tag, value);
        }
    }

    xml.push_str("</cp:coreProperties>");
    Ok(Some(xml))
}

/// Extended properties listing the worksheet names.
pub fn write_app_properties<'a>(props: &DocumentProperties, sheet_names: impl ExactSizeIterator<Item = &'a str>) -> Result<String> {
    let count = sheet_names.len();
    let mut xml = String::with_capacity(512 + count * 32);
    xml.push_str(XML_DECLARATION);
    write!(
        xml,
        r#"<Properties xmlns="{}" xmlns:vt="{}">"#,
        namespace::EXTENDED_PROPERTIES,
        namespace::DOC_PROPS_VTYPES
    )?;
    write!(xml, "<Application>{APPLICATION_NAME}</Application><DocSecurity>0</DocSecurity><ScaleCrop>false</ScaleCrop>")?;
    write!(
        xml,
        r#"<HeadingPairs><vt:vector size="2" baseType="variant"><vt:variant><vt:lpstr>Worksheets</vt:lpstr></vt:variant><vt:variant><vt:i4>{count}</vt:i4></vt:variant></vt:vector></HeadingPairs>"#
    )?;
    write!(xml, r#"<TitlesOfParts><vt:vector size="{count}" baseType="lpstr">"#)?;
    for name in sheet_names {
        xml.push_str("<vt:lpstr>");
        push_escaped(&mut xml, name);
        xml.push_str("</vt:lpstr>");
    }
    xml.push_str("</vt:vector></TitlesOfParts>");
    if let Some(manager) = &props.manager {
        write_text_element(&mut xml, "Manager", manager);
    }
    if let Some(company) = &props.company {
        write_text_element(&mut xml, "Company", company);
    }
    xml.push_str("<LinksUpToDate>false</LinksUpToDate><SharedDoc>false</SharedDoc><HyperlinksChanged>false</HyperlinksChanged><AppVersion>16.0300</AppVersion></Properties>");
    Ok(xml)
}

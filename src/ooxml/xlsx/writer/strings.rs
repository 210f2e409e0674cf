/// Shared strings part (`xl/sharedStrings.xml`) writer.
use super::{XML_DECLARATION, write_text_element};
use crate::common::error::Result;
use crate::ooxml::opc::constants::namespace;
use crate::sheet::shared_strings::{SharedString, SharedStringTable};
use std::fmt::Write as FmtWrite;

/// Serialize the table in index order.
///
/// `references` is the number of cells pointing into the table, written as
/// the `count` attribute.
pub fn write_shared_strings(sst: &SharedStringTable, references: usize) -> Result<String> {
    let mut xml = String::with_capacity(128 + sst.len() * 32);
    xml.push_str(XML_DECLARATION);
    write!(
        xml,
        r#"<sst xmlns="{}" count="{references}" uniqueCount="{}">"#,
        namespace::SML_MAIN,
        sst.len()
    )?;

    for entry in sst.iter() {
        xml.push_str("<si>");
        match entry {
            SharedString::Plain(text) => write_text_element(&mut xml, "t", text),
            SharedString::Rich { runs_xml, .. } => xml.push_str(runs_xml),
        }
        xml.push_str("</si>");
    }

    xml.push_str("</sst>");
    Ok(xml)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ooxml::xlsx::parsers::shared_strings_parser::parse_shared_strings;

    #[test]
    fn test_shared_strings() {
        let mut sst = SharedStringTable::new();
        sst.intern("Hello");
        sst.intern(" World ");
        sst.intern_entry(SharedString::Rich {
            text: "Bold".to_string(),
            runs_xml: "<r><rPr><b/></rPr><t>Bold</t></r>".to_string(),
        });

        let xml = write_shared_strings(&sst, 5).unwrap();
        assert!(xml.contains(r#"count="5" uniqueCount="3""#));
        assert!(xml.contains(r#"<si><t xml:space="preserve"> World </t></si>"#));

        let back = parse_shared_strings("/xl/sharedStrings.xml", xml.as_bytes()).unwrap();
        assert_eq!(back.len(), 3);
        assert_eq!(back.text(1).unwrap(), " World ");
        assert_eq!(back.get(2).unwrap(), sst.get(2).unwrap());
    }
}

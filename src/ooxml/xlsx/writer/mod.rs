//! Serializers for the SpreadsheetML parts.
//!
//! Each writer builds its part as a `String` with `write!`, the same way the
//! parsers read them back. Output depends only on the model, so saving an
//! unchanged workbook twice yields identical parts.

pub mod properties;
pub mod sheet;
pub mod strings;
pub mod styles;
pub mod workbook;

use crate::common::xml::push_escaped;
use crate::sheet::style::Color;
use std::fmt::Write as FmtWrite;

pub(crate) const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

/// Append retained root attributes as ` key="value"`.
pub(crate) fn write_root_attributes(xml: &mut String, attributes: &[(String, String)]) {
    for (key, value) in attributes {
        xml.push(' ');
        xml.push_str(key);
        xml.push_str("=\"");
        push_escaped(xml, value);
        xml.push('"');
    }
}

/// Append a `<tag>` text element, preserving edge whitespace.
pub(crate) fn write_text_element(xml: &mut String, tag: &str, text: &str) {
    xml.push('<');
    xml.push_str(tag);
    if needs_space_preserve(text) {
        xml.push_str(r#" xml:space="preserve""#);
    }
    xml.push('>');
    push_escaped(xml, text);
    xml.push_str("</");
    xml.push_str(tag);
    xml.push('>');
}

#[inline]
fn needs_space_preserve(text: &str) -> bool {
    text.starts_with(char::is_whitespace) || text.ends_with(char::is_whitespace)
}

/// Append a `CT_Color` element such as `<color rgb="FFFF0000"/>`.
pub(crate) fn write_color(xml: &mut String, tag: &str, color: &Color) -> std::fmt::Result {
    match color {
        Color::Rgb(argb) => write!(xml, r#"<{tag} rgb="{}"/>"#, argb.to_argb_hex()),
        Color::Theme { index, tint: None } => write!(xml, r#"<{tag} theme="{index}"/>"#),
        Color::Theme {
            index,
            tint: Some(tint),
        } => write!(xml, r#"<{tag} theme="{index}" tint="{}"/>"#, ryu::Buffer::new().format(*tint)),
        Color::Indexed(index) => write!(xml, r#"<{tag} indexed="{index}"/>"#),
        Color::Auto => write!(xml, r#"<{tag} auto="1"/>"#),
    }
}

/// `1`/`0` for boolean attributes.
#[inline]
pub(crate) fn flag(value: bool) -> &'static str {
    if value { "1" } else { "0" }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_element_preserves_space() {
        let mut xml = String::new();
        write_text_element(&mut xml, "t", " padded & ");
        write_text_element(&mut xml, "t", "plain");
        assert_eq!(xml, r#"<t xml:space="preserve"> padded &amp; </t><t>plain</t>"#);
    }

    #[test]
    fn test_colors() {
        let mut xml = String::new();
        write_color(&mut xml, "color", &Color::rgb("FF0000").unwrap()).unwrap();
        write_color(&mut xml, "fgColor", &Color::Theme { index: 4, tint: Some(-0.25) }).unwrap();
        write_color(&mut xml, "color", &Color::Auto).unwrap();
        assert_eq!(
            xml,
            r#"<color rgb="FFFF0000"/><fgColor theme="4" tint="-0.25"/><color auto="1"/>"#
        );
    }
}

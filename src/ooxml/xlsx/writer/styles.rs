//! Styles.xml generator for XLSX files.
//!
//! The [`StyleTable`] already holds interned sub-tables in the layout of
//! `styles.xml`, so this writer walks them in index order. A single cell
//! style ("Normal") and its master format are emitted alongside, since Excel
//! refuses files without them.

use super::{XML_DECLARATION, flag, write_color};
use crate::common::error::Result;
use crate::common::xml::push_escaped;
use crate::ooxml::opc::constants::namespace;
use crate::sheet::cell::format_number;
use crate::sheet::style::{
    Alignment, Border, BorderSide, CellXf, Fill, Font, GradientFill, GradientType, Protection, StyleTable, Underline,
    VerticalAlignRun,
};
use std::fmt::Write as FmtWrite;

/// Serialize the style table.
pub fn write_styles(styles: &StyleTable) -> Result<String> {
    let mut xml = String::with_capacity(2048);
    xml.push_str(XML_DECLARATION);
    write!(xml, r#"<styleSheet xmlns="{}">"#, namespace::SML_MAIN)?;

    let custom: Vec<(u32, &str)> = styles.custom_number_formats().collect();
    if !custom.is_empty() {
        write!(xml, r#"<numFmts count="{}">"#, custom.len())?;
        for (id, code) in custom {
            write!(xml, r#"<numFmt numFmtId="{id}" formatCode=""#)?;
            push_escaped(&mut xml, code);
            xml.push_str(r#""/>"#);
        }
        xml.push_str("</numFmts>");
    }

    write!(xml, r#"<fonts count="{}">"#, styles.fonts().len())?;
    for font in styles.fonts().iter() {
        write_font(&mut xml, font)?;
    }
    xml.push_str("</fonts>");

    write!(xml, r#"<fills count="{}">"#, styles.fills().len())?;
    for fill in styles.fills().iter() {
        write_fill(&mut xml, fill)?;
    }
    xml.push_str("</fills>");

    write!(xml, r#"<borders count="{}">"#, styles.borders().len())?;
    for border in styles.borders().iter() {
        write_border(&mut xml, border)?;
    }
    xml.push_str("</borders>");

    xml.push_str(r#"<cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs>"#);

    write!(xml, r#"<cellXfs count="{}">"#, styles.cell_xfs().len())?;
    for xf in styles.cell_xfs().iter() {
        write_xf(&mut xml, xf)?;
    }
    xml.push_str("</cellXfs>");

    xml.push_str(r#"<cellStyles count="1"><cellStyle name="Normal" xfId="0" builtinId="0"/></cellStyles>"#);
    xml.push_str(r#"<dxfs count="0"/>"#);
    xml.push_str(r#"<tableStyles count="0" defaultTableStyle="TableStyleMedium2" defaultPivotStyle="PivotStyleLight16"/>"#);
    xml.push_str("</styleSheet>");
    Ok(xml)
}

fn write_font(xml: &mut String, font: &Font) -> std::fmt::Result {
    xml.push_str("<font>");
    if font.bold {
        xml.push_str("<b/>");
    }
    if font.italic {
        xml.push_str("<i/>");
    }
    if font.strike {
        xml.push_str("<strike/>");
    }
    match font.underline {
        Underline::None => {},
        Underline::Single => xml.push_str("<u/>"),
        other => write!(xml, r#"<u val="{}"/>"#, other.as_str())?,
    }
    if font.vert_align != VerticalAlignRun::Baseline {
        write!(xml, r#"<vertAlign val="{}"/>"#, font.vert_align.as_str())?;
    }
    write!(xml, r#"<sz val="{}"/>"#, format_number(font.size))?;
    if let Some(color) = &font.color {
        write_color(xml, "color", color)?;
    }
    xml.push_str(r#"<name val=""#);
    push_escaped(xml, &font.name);
    xml.push_str(r#""/>"#);
    if let Some(family) = font.family {
        write!(xml, r#"<family val="{family}"/>"#)?;
    }
    if let Some(scheme) = &font.scheme {
        xml.push_str(r#"<scheme val=""#);
        push_escaped(xml, scheme);
        xml.push_str(r#""/>"#);
    }
    xml.push_str("</font>");
    Ok(())
}

fn write_fill(xml: &mut String, fill: &Fill) -> std::fmt::Result {
    match fill {
        Fill::None => xml.push_str(r#"<fill><patternFill patternType="none"/></fill>"#),
        Fill::Pattern {
            pattern,
            fg_color,
            bg_color,
        } => {
            write!(xml, r#"<fill><patternFill patternType="{}""#, pattern.as_str())?;
            if fg_color.is_none() && bg_color.is_none() {
                xml.push_str("/></fill>");
                return Ok(());
            }
            xml.push('>');
            if let Some(color) = fg_color {
                write_color(xml, "fgColor", color)?;
            }
            if let Some(color) = bg_color {
                write_color(xml, "bgColor", color)?;
            }
            xml.push_str("</patternFill></fill>");
        },
        Fill::Gradient(gradient) => write_gradient(xml, gradient)?,
    }
    Ok(())
}

fn write_gradient(xml: &mut String, gradient: &GradientFill) -> std::fmt::Result {
    xml.push_str("<fill><gradientFill");
    if gradient.kind != GradientType::Linear {
        write!(xml, r#" type="{}""#, gradient.kind.as_str())?;
    }
    for (attr, value) in [
        ("degree", gradient.degree),
        ("left", gradient.left),
        ("right", gradient.right),
        ("top", gradient.top),
        ("bottom", gradient.bottom),
    ] {
        if value != 0.0 {
            write!(xml, r#" {attr}="{}""#, format_number(value))?;
        }
    }
    xml.push('>');
    for stop in &gradient.stops {
        write!(xml, r#"<stop position="{}">"#, format_number(stop.position))?;
        write_color(xml, "color", &stop.color)?;
        xml.push_str("</stop>");
    }
    xml.push_str("</gradientFill></fill>");
    Ok(())
}

fn write_border(xml: &mut String, border: &Border) -> std::fmt::Result {
    xml.push_str("<border");
    if border.diagonal_up {
        xml.push_str(r#" diagonalUp="1""#);
    }
    if border.diagonal_down {
        xml.push_str(r#" diagonalDown="1""#);
    }
    xml.push('>');
    for (tag, side) in [
        ("left", &border.left),
        ("right", &border.right),
        ("top", &border.top),
        ("bottom", &border.bottom),
        ("diagonal", &border.diagonal),
    ] {
        write_border_side(xml, tag, side.as_ref())?;
    }
    xml.push_str("</border>");
    Ok(())
}

fn write_border_side(xml: &mut String, tag: &str, side: Option<&BorderSide>) -> std::fmt::Result {
    match side {
        None => write!(xml, "<{tag}/>"),
        Some(BorderSide { style, color: None }) => write!(xml, r#"<{tag} style="{}"/>"#, style.as_str()),
        Some(BorderSide {
            style,
            color: Some(color),
        }) => {
            write!(xml, r#"<{tag} style="{}">"#, style.as_str())?;
            write_color(xml, "color", color)?;
            write!(xml, "</{tag}>")
        },
    }
}

fn write_xf(xml: &mut String, xf: &CellXf) -> std::fmt::Result {
    write!(
        xml,
        r#"<xf numFmtId="{}" fontId="{}" fillId="{}" borderId="{}" xfId="0""#,
        xf.num_fmt_id, xf.font_id, xf.fill_id, xf.border_id
    )?;
    for (attr, applies) in [
        ("applyNumberFormat", xf.num_fmt_id != 0),
        ("applyFont", xf.font_id != 0),
        ("applyFill", xf.fill_id != 0),
        ("applyBorder", xf.border_id != 0),
        ("applyAlignment", xf.alignment.has_settings()),
        ("applyProtection", xf.protection != Protection::default()),
    ] {
        if applies {
            write!(xml, r#" {attr}="1""#)?;
        }
    }

    let has_protection = xf.protection != Protection::default();
    if !xf.alignment.has_settings() && !has_protection {
        xml.push_str("/>");
        return Ok(());
    }
    xml.push('>');
    if xf.alignment.has_settings() {
        write_alignment(xml, &xf.alignment)?;
    }
    if has_protection {
        write!(
            xml,
            r#"<protection locked="{}" hidden="{}"/>"#,
            flag(xf.protection.locked),
            flag(xf.protection.hidden)
        )?;
    }
    xml.push_str("</xf>");
    Ok(())
}

fn write_alignment(xml: &mut String, alignment: &Alignment) -> std::fmt::Result {
    xml.push_str("<alignment");
    if let Some(horizontal) = alignment.horizontal {
        write!(xml, r#" horizontal="{}""#, horizontal.as_str())?;
    }
    if let Some(vertical) = alignment.vertical {
        write!(xml, r#" vertical="{}""#, vertical.as_str())?;
    }
    if alignment.text_rotation != 0 {
        write!(xml, r#" textRotation="{}""#, alignment.text_rotation)?;
    }
    if alignment.wrap_text {
        xml.push_str(r#" wrapText="1""#);
    }
    if alignment.indent != 0 {
        write!(xml, r#" indent="{}""#, alignment.indent)?;
    }
    if alignment.shrink_to_fit {
        xml.push_str(r#" shrinkToFit="1""#);
    }
    if alignment.reading_order != 0 {
        write!(xml, r#" readingOrder="{}""#, alignment.reading_order)?;
    }
    xml.push_str("/>");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ooxml::xlsx::parsers::styles_parser::parse_styles;
    use crate::sheet::style::{BorderLineStyle, Color, HorizontalAlignment, NumberFormat, Style};

    #[test]
    fn test_default_table() {
        let xml = write_styles(&StyleTable::new()).unwrap();
        assert!(xml.contains(r#"<fills count="2"><fill><patternFill patternType="none"/></fill><fill><patternFill patternType="gray125"/></fill></fills>"#));
        assert!(xml.contains(r#"<sz val="11"/><color theme="1"/><name val="Calibri"/><family val="2"/><scheme val="minor"/>"#));
        assert!(xml.contains(r#"<cellXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/></cellXfs>"#));
        assert!(!xml.contains("<numFmts"));
    }

    #[test]
    fn test_styles_survive_reparse() {
        let mut table = StyleTable::new();
        let styled = Style::new()
            .with_number_format("0.000")
            .with_font(Font {
                bold: true,
                underline: Underline::Double,
                color: Color::rgb("FF0000"),
                ..Font::default()
            })
            .with_fill(Fill::solid(Color::Theme { index: 4, tint: Some(0.4) }))
            .with_border(Border::outline(BorderLineStyle::Thin, Some(Color::Auto)))
            .with_alignment(Alignment {
                horizontal: Some(HorizontalAlignment::Center),
                wrap_text: true,
                ..Alignment::default()
            })
            .with_protection(Protection { locked: false, hidden: true });
        let idx = table.intern(&styled);

        let xml = write_styles(&table).unwrap();
        let back = parse_styles("/xl/styles.xml", xml.as_bytes()).unwrap();
        assert_eq!(back.len(), table.len());
        assert_eq!(back.get(idx).unwrap(), &styled);
        assert_eq!(back.get(0).unwrap(), &Style::default());
    }

    #[test]
    fn test_locale_format_and_gradient_survive_reparse() {
        let mut table = StyleTable::new();
        let styled = Style::new()
            .with_number_format(NumberFormat::from_id(58).unwrap())
            .with_fill(Fill::Gradient(GradientFill {
                kind: GradientType::Path,
                left: 0.5,
                right: 0.5,
                ..GradientFill::linear(0.0, Color::theme(0), Color::rgb("4472C4").unwrap())
            }));
        let idx = table.intern(&styled);

        let xml = write_styles(&table).unwrap();
        assert!(xml.contains(r#"numFmtId="58""#));
        assert!(!xml.contains("<numFmts"));
        assert!(xml.contains(r#"<gradientFill type="path" left="0.5" right="0.5"><stop position="0"><color theme="0"/></stop><stop position="1"><color rgb="FF4472C4"/></stop></gradientFill>"#));

        let back = parse_styles("/xl/styles.xml", xml.as_bytes()).unwrap();
        assert_eq!(back.get(idx).unwrap(), &styled);
        assert_eq!(back.get(idx).unwrap().number_format.builtin_id(), Some(58));
    }
}

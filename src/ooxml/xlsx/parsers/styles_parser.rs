//! Parser for Excel styles.xml files.
//!
//! Reads the number formats, fonts, fills, borders and `cellXfs` records and
//! resolves every cell format into a [`Style`] value. Cell formats keep their
//! positions so cell `s` attributes stay valid. Differential formats, named
//! cell styles and table styles are skipped.

use super::{Problems, bool_val, open_reader};
use crate::common::error::Result;
use crate::common::xml::Attrs;
use crate::sheet::style::{
    Alignment, Argb, Border, BorderLineStyle, BorderSide, Color, Fill, Font, GradientFill, GradientStop,
    GradientType, HorizontalAlignment, NumberFormat, PatternType, Protection, Style, StyleTable, Underline, VerticalAlignRun, VerticalAlignment,
};
use quick_xml::events::Event;
use std::collections::HashMap;

/// Sections whose children reuse element names of the parsed sections.
const SKIPPED_SECTIONS: [&[u8]; 7] = [
    b"cellStyleXfs",
    b"cellStyles",
    b"dxfs",
    b"tableStyles",
    b"colors",
    b"extLst",
    b"mruColors",
];

#[derive(Debug, Default)]
struct RawXf {
    num_fmt_id: u32,
    font_id: u32,
    fill_id: u32,
    border_id: u32,
    alignment: Alignment,
    protection: Protection,
}

#[derive(Debug, Default)]
struct FillBuilder {
    pattern: Option<PatternType>,
    fg_color: Option<Color>,
    bg_color: Option<Color>,
    gradient: Option<GradientFill>,
    /// Position of the open `<stop>` and its color once read
    stop: Option<(f64, Option<Color>)>,
}

#[derive(Debug, Clone, Copy)]
enum Side {
    Left,
    Right,
    Top,
    Bottom,
    Diagonal,
}

#[derive(Default)]
struct StylesBuilder {
    num_fmts: HashMap<u32, String>,
    fonts: Vec<Font>,
    fills: Vec<Fill>,
    borders: Vec<Border>,
    xfs: Vec<RawXf>,
    in_cell_xfs: bool,
    font: Option<Font>,
    fill: Option<FillBuilder>,
    border: Option<Border>,
    side: Option<(Side, Option<BorderSide>)>,
    xf: Option<RawXf>,
}

pub fn parse_styles(part: &str, bytes: &[u8]) -> Result<StyleTable> {
    let mut problems = Problems::new(part);
    let (_, mut reader) = open_reader(part, bytes)?;
    let mut builder = StylesBuilder::default();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = e.local_name();
                if SKIPPED_SECTIONS.contains(&name.as_ref()) {
                    if let Err(err) = reader.read_to_end(e.name()) {
                        problems.push(format!("XML error: {err}"));
                        break;
                    }
                    continue;
                }
                builder.start(name.as_ref(), &Attrs::from_start(&e), &mut problems);
            },
            Ok(Event::Empty(e)) => {
                let name = e.local_name();
                builder.start(name.as_ref(), &Attrs::from_start(&e), &mut problems);
                builder.end(name.as_ref(), &mut problems);
            },
            Ok(Event::End(e)) => builder.end(e.local_name().as_ref(), &mut problems),
            Ok(Event::Eof) => break,
            Err(err) => {
                problems.push(format!("XML error at byte {}: {err}", reader.error_position()));
                break;
            },
            _ => {},
        }
    }

    let styles = builder.resolve(&mut problems);
    problems.finish(StyleTable::from_styles(styles))
}

/// A font as read, before any child element applies.
fn bare_font() -> Font {
    Font {
        color: None,
        family: None,
        scheme: None,
        ..Font::default()
    }
}

impl StylesBuilder {
    fn start(&mut self, name: &[u8], attrs: &Attrs, problems: &mut Problems) {
        match name {
            b"numFmt" => {
                let id = problems.check(attrs.parse::<u32>("numFmtId"));
                match (id, attrs.get("formatCode")) {
                    (Some(id), Some(code)) => {
                        self.num_fmts.insert(id, code.to_string());
                    },
                    _ => problems.push("numFmt without numFmtId or formatCode"),
                }
            },
            b"cellXfs" => self.in_cell_xfs = true,
            b"font" => self.font = Some(bare_font()),
            b"fill" => self.fill = Some(FillBuilder::default()),
            b"border" => {
                self.border = Some(Border {
                    diagonal_up: attrs.flag("diagonalUp").unwrap_or(false),
                    diagonal_down: attrs.flag("diagonalDown").unwrap_or(false),
                    ..Border::default()
                })
            },
            b"xf" if self.in_cell_xfs => {
                self.xf = Some(RawXf {
                    num_fmt_id: problems.check(attrs.parse("numFmtId")).unwrap_or(0),
                    font_id: problems.check(attrs.parse("fontId")).unwrap_or(0),
                    fill_id: problems.check(attrs.parse("fillId")).unwrap_or(0),
                    border_id: problems.check(attrs.parse("borderId")).unwrap_or(0),
                    ..RawXf::default()
                })
            },
            b"alignment" => {
                if let Some(xf) = self.xf.as_mut() {
                    xf.alignment = parse_alignment(attrs, problems);
                }
            },
            b"protection" => {
                if let Some(xf) = self.xf.as_mut() {
                    xf.protection = Protection {
                        locked: attrs.flag("locked").unwrap_or(true),
                        hidden: attrs.flag("hidden").unwrap_or(false),
                    };
                }
            },
            b"patternFill" => {
                if let Some(fill) = self.fill.as_mut() {
                    fill.pattern = match attrs.get("patternType") {
                        None => Some(PatternType::None),
                        Some(value) => PatternType::parse(value).or_else(|| {
                            log::warn!("ignoring unknown patternType {value:?}");
                            None
                        }),
                    };
                }
            },
            b"gradientFill" => {
                if let Some(fill) = self.fill.as_mut() {
                    let kind = match attrs.get("type") {
                        None => GradientType::Linear,
                        Some(value) => GradientType::parse(value).unwrap_or_else(|| {
                            problems.push(format!("gradientFill type=\"{value}\" is not valid"));
                            GradientType::Linear
                        }),
                    };
                    let mut edge = |name: &str| problems.check(attrs.parse::<f64>(name)).unwrap_or(0.0);
                    fill.gradient = Some(GradientFill {
                        kind,
                        degree: edge("degree"),
                        left: edge("left"),
                        right: edge("right"),
                        top: edge("top"),
                        bottom: edge("bottom"),
                        stops: Vec::new(),
                    });
                }
            },
            b"stop" => {
                if let Some(fill) = self.fill.as_mut() {
                    match problems.check(attrs.parse::<f64>("position")) {
                        Some(position) => fill.stop = Some((position, None)),
                        None => problems.push("gradient stop without position"),
                    }
                }
            },
            b"fgColor" | b"bgColor" => {
                let color = parse_color(attrs, problems);
                if let Some(fill) = self.fill.as_mut() {
                    if name == b"fgColor" {
                        fill.fg_color = color;
                    } else {
                        fill.bg_color = color;
                    }
                }
            },
            b"left" | b"start" | b"right" | b"end" | b"top" | b"bottom" | b"diagonal" if self.border.is_some() => {
                let side = match name {
                    b"left" | b"start" => Side::Left,
                    b"right" | b"end" => Side::Right,
                    b"top" => Side::Top,
                    b"bottom" => Side::Bottom,
                    _ => Side::Diagonal,
                };
                let style = attrs.get("style").filter(|value| *value != "none").and_then(|value| {
                    BorderLineStyle::parse(value).or_else(|| {
                        log::warn!("ignoring unknown border style {value:?}");
                        None
                    })
                });
                let border_side = style.map(|s| BorderSide::new(s, None));
                self.side = Some((side, border_side));
            },
            b"color" => {
                let color = parse_color(attrs, problems);
                if let Some((_, stop_color)) = self.fill.as_mut().and_then(|fill| fill.stop.as_mut()) {
                    *stop_color = color;
                } else if let Some((_, Some(side))) = self.side.as_mut() {
                    side.color = color;
                } else if let Some(font) = self.font.as_mut() {
                    font.color = color;
                }
            },
            _ => {
                if let Some(font) = self.font.as_mut() {
                    apply_font_child(font, name, attrs, problems);
                }
            },
        }
    }

    fn end(&mut self, name: &[u8], problems: &mut Problems) {
        match name {
            b"cellXfs" => self.in_cell_xfs = false,
            b"font" => {
                if let Some(font) = self.font.take() {
                    self.fonts.push(font);
                }
            },
            b"fill" => {
                if let Some(fill) = self.fill.take() {
                    self.fills.push(fill.build());
                }
            },
            b"stop" => {
                if let Some(fill) = self.fill.as_mut() {
                    match (fill.stop.take(), fill.gradient.as_mut()) {
                        (Some((position, Some(color))), Some(gradient)) => {
                            gradient.stops.push(GradientStop { position, color })
                        },
                        (Some((position, None)), _) => problems.push(format!("gradient stop {position} has no color")),
                        _ => {},
                    }
                }
            },
            b"border" => {
                if let Some(border) = self.border.take() {
                    self.borders.push(border);
                }
            },
            b"left" | b"start" | b"right" | b"end" | b"top" | b"bottom" | b"diagonal" => {
                if let (Some((side, value)), Some(border)) = (self.side.take(), self.border.as_mut()) {
                    let slot = match side {
                        Side::Left => &mut border.left,
                        Side::Right => &mut border.right,
                        Side::Top => &mut border.top,
                        Side::Bottom => &mut border.bottom,
                        Side::Diagonal => &mut border.diagonal,
                    };
                    *slot = value;
                }
            },
            b"xf" => {
                if let Some(xf) = self.xf.take() {
                    self.xfs.push(xf);
                }
            },
            _ => {},
        }
    }

    /// Turn `cellXfs` records into styles, reporting dangling indices.
    fn resolve(self, problems: &mut Problems) -> Vec<Style> {
        fn pick<T: Clone>(
            list: &[T],
            index: u32,
            what: &str,
            xf: usize,
            fallback: impl FnOnce() -> T,
            problems: &mut Problems,
        ) -> T {
            match list.get(index as usize) {
                Some(value) => value.clone(),
                None if list.is_empty() && index == 0 => fallback(),
                None => {
                    problems.push(format!(
                        "cellXfs[{xf}] {what} {index} out of range ({} defined)",
                        list.len()
                    ));
                    fallback()
                },
            }
        }

        self.xfs
            .iter()
            .enumerate()
            .map(|(i, xf)| {
                let number_format = match self.num_fmts.get(&xf.num_fmt_id) {
                    Some(code) => NumberFormat::code(code.as_str()),
                    None => NumberFormat::from_id(xf.num_fmt_id).unwrap_or_else(|| {
                        problems.push(format!("cellXfs[{i}] numFmtId {} is not defined", xf.num_fmt_id));
                        NumberFormat::default()
                    }),
                };
                Style {
                    number_format,
                    font: pick(&self.fonts, xf.font_id, "fontId", i, Font::default, problems),
                    fill: pick(&self.fills, xf.fill_id, "fillId", i, Fill::default, problems),
                    border: pick(&self.borders, xf.border_id, "borderId", i, Border::default, problems),
                    alignment: xf.alignment.clone(),
                    protection: xf.protection,
                }
            })
            .collect()
    }
}

impl FillBuilder {
    fn build(self) -> Fill {
        if let Some(gradient) = self.gradient {
            return Fill::Gradient(gradient);
        }
        match self.pattern {
            Some(pattern) => Fill::pattern(pattern, self.fg_color, self.bg_color),
            None => Fill::None,
        }
    }
}

fn apply_font_child(font: &mut Font, name: &[u8], attrs: &Attrs, problems: &mut Problems) {
    match name {
        b"b" => font.bold = bool_val(attrs),
        b"i" => font.italic = bool_val(attrs),
        b"strike" => font.strike = bool_val(attrs),
        b"u" => {
            font.underline = Underline::parse(attrs.get("val")).unwrap_or_else(|| {
                log::warn!("ignoring unknown underline {:?}", attrs.get("val"));
                Underline::None
            })
        },
        b"vertAlign" => {
            if let Some(value) = attrs.get("val") {
                font.vert_align = VerticalAlignRun::parse(value).unwrap_or_default();
            }
        },
        b"sz" => {
            if let Some(size) = problems.check(attrs.parse::<f64>("val")) {
                font.size = size;
            }
        },
        b"name" => {
            if let Some(value) = attrs.get("val") {
                font.name = value.to_string();
            }
        },
        b"family" => font.family = problems.check(attrs.parse("val")),
        b"scheme" => font.scheme = attrs.get("val").map(str::to_string),
        _ => {},
    }
}

fn parse_alignment(attrs: &Attrs, problems: &mut Problems) -> Alignment {
    let horizontal = attrs.get("horizontal").and_then(|value| {
        HorizontalAlignment::parse(value).or_else(|| {
            log::warn!("ignoring unknown horizontal alignment {value:?}");
            None
        })
    });
    let vertical = attrs.get("vertical").and_then(|value| {
        VerticalAlignment::parse(value).or_else(|| {
            log::warn!("ignoring unknown vertical alignment {value:?}");
            None
        })
    });
    Alignment {
        horizontal,
        vertical,
        text_rotation: problems.check(attrs.parse("textRotation")).unwrap_or(0),
        wrap_text: attrs.flag("wrapText").unwrap_or(false),
        indent: problems.check(attrs.parse("indent")).unwrap_or(0),
        shrink_to_fit: attrs.flag("shrinkToFit").unwrap_or(false),
        reading_order: problems.check(attrs.parse("readingOrder")).unwrap_or(0),
    }
}

/// Parse a `CT_Color` element (`rgb`, `theme`/`tint`, `indexed` or `auto`).
pub(crate) fn parse_color(attrs: &Attrs, problems: &mut Problems) -> Option<Color> {
    if let Some(rgb) = attrs.get("rgb") {
        return match Argb::from_hex(rgb) {
            Some(argb) => Some(Color::Rgb(argb)),
            None => {
                problems.push(format!("color rgb=\"{rgb}\" is not valid"));
                None
            },
        };
    }
    if let Some(index) = problems.check(attrs.parse::<u32>("theme")) {
        let tint = problems.check(attrs.parse::<f64>("tint"));
        return Some(Color::Theme { index, tint });
    }
    if let Some(index) = problems.check(attrs.parse::<u32>("indexed")) {
        return Some(Color::Indexed(index));
    }
    attrs.flag("auto").filter(|auto| *auto).map(|_| Color::Auto)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::error::Error;

    const PART: &str = "/xl/styles.xml";

    const STYLES: &[u8] = br#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
<numFmts count="1"><numFmt numFmtId="164" formatCode="0.000"/></numFmts>
<fonts count="2">
<font><sz val="11"/><color theme="1"/><name val="Calibri"/><family val="2"/><scheme val="minor"/></font>
<font><b/><i val="0"/><u/><sz val="14"/><color rgb="FFFF0000"/><name val="Arial"/></font>
</fonts>
<fills count="3">
<fill><patternFill patternType="none"/></fill>
<fill><patternFill patternType="gray125"/></fill>
<fill><patternFill patternType="solid"><fgColor theme="4" tint="0.39997558519241921"/><bgColor indexed="64"/></patternFill></fill>
</fills>
<borders count="2">
<border><left/><right/><top/><bottom/><diagonal/></border>
<border><left style="thin"><color auto="1"/></left><right/><top/><bottom style="double"/><diagonal/></border>
</borders>
<cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs>
<cellXfs count="3">
<xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/>
<xf numFmtId="164" fontId="1" fillId="2" borderId="1" xfId="0" applyFont="1"><alignment horizontal="center" wrapText="1"/><protection locked="0"/></xf>
<xf numFmtId="14" fontId="0" fillId="0" borderId="0" xfId="0"/>
</cellXfs>
<cellStyles count="1"><cellStyle name="Normal" xfId="0" builtinId="0"/></cellStyles>
<dxfs count="1"><dxf><font><b/></font></dxf></dxfs>
</styleSheet>"#;

    #[test]
    fn test_parse_styles() {
        let table = parse_styles(PART, STYLES).unwrap();
        assert_eq!(table.len(), 3);

        let default = table.get(0).unwrap();
        assert_eq!(default.font.name, "Calibri");
        assert_eq!(default.font.color, Some(Color::theme(1)));

        let custom = table.get(1).unwrap();
        assert_eq!(custom.number_format, "0.000");
        assert!(custom.font.bold);
        assert!(!custom.font.italic);
        assert_eq!(custom.font.underline, Underline::Single);
        assert_eq!(custom.font.color.as_ref().and_then(Color::rgb_hex).as_deref(), Some("FF0000"));
        assert!(custom.fill.is_solid());
        assert_eq!(custom.border.bottom.as_ref().map(|s| s.style), Some(BorderLineStyle::Double));
        assert_eq!(custom.border.left.as_ref().and_then(|s| s.color), Some(Color::Auto));
        assert_eq!(custom.alignment.horizontal, Some(HorizontalAlignment::Center));
        assert!(custom.alignment.wrap_text);
        assert!(!custom.protection.locked);

        assert_eq!(table.get(2).unwrap().number_format, "mm-dd-yy");
        assert!(table.get(2).unwrap().is_date());
    }

    #[test]
    fn test_reports_all_problems() {
        let xml = br#"<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
<fonts count="1"><font><sz val="big"/></font></fonts>
<fills count="1"><fill><patternFill patternType="none"/></fill></fills>
<borders count="1"><border/></borders>
<cellXfs count="2"><xf fontId="3"/><xf fillId="x" borderId="9"/></cellXfs>
</styleSheet>"#;
        match parse_styles(PART, xml).unwrap_err() {
            Error::MalformedPart { part, problems } => {
                assert_eq!(part, PART);
                assert_eq!(problems.len(), 4, "{problems:?}");
                assert!(problems.iter().any(|p| p.contains("sz") || p.contains("val=\"big\"")));
                assert!(problems.iter().any(|p| p.contains("fontId 3")));
                assert!(problems.iter().any(|p| p.contains("fillId=\"x\"")));
                assert!(problems.iter().any(|p| p.contains("borderId 9")));
            },
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_none_border_side_is_empty() {
        let xml = br#"<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
<borders count="1"><border><left style="none"/><right style="thin"/><top style="zigzag"/></border></borders>
<cellXfs count="1"><xf borderId="0"/></cellXfs>
</styleSheet>"#;
        let table = parse_styles(PART, xml).unwrap();
        let border = &table.get(0).unwrap().border;
        assert!(border.left.is_none());
        assert!(border.top.is_none());
        assert_eq!(border.right.as_ref().map(|s| s.style), Some(BorderLineStyle::Thin));
    }

    #[test]
    fn test_gradient_fill() {
        let xml = br#"<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
<fills count="1"><fill><gradientFill degree="90"><stop position="0"><color theme="0"/></stop><stop position="1"><color rgb="FF4472C4"/></stop></gradientFill></fill></fills>
<cellXfs count="1"><xf fillId="0"/></cellXfs>
</styleSheet>"#;
        let table = parse_styles(PART, xml).unwrap();
        let Fill::Gradient(gradient) = &table.get(0).unwrap().fill else {
            panic!("expected a gradient fill");
        };
        assert_eq!(gradient.kind, GradientType::Linear);
        assert_eq!(gradient.degree, 90.0);
        assert_eq!(gradient.stops.len(), 2);
        assert_eq!(gradient.stops[0].color, Color::theme(0));
        assert_eq!(gradient.stops[1].position, 1.0);
    }

    #[test]
    fn test_locale_builtin_format_keeps_id() {
        let xml = br#"<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
<cellXfs count="2"><xf numFmtId="58"/><xf numFmtId="170"/></cellXfs>
</styleSheet>"#;
        match parse_styles(PART, xml).unwrap_err() {
            Error::MalformedPart { problems, .. } => {
                assert_eq!(problems.len(), 1, "{problems:?}");
                assert!(problems[0].contains("numFmtId 170"));
            },
            other => panic!("unexpected error {other:?}"),
        }

        let xml = br#"<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
<cellXfs count="1"><xf numFmtId="58"/></cellXfs>
</styleSheet>"#;
        let table = parse_styles(PART, xml).unwrap();
        let format = &table.get(0).unwrap().number_format;
        assert_eq!(format.builtin_id(), Some(58));
        assert_eq!(format.as_code(), None);
        assert!(table.get(0).unwrap().is_date());
    }
}

//! Parsers for `docProps/core.xml` and `docProps/app.xml`.

use super::{Problems, open_reader};
use crate::common::error::Result;
use crate::common::xml::{append_general_ref, append_text};
use crate::sheet::properties::{DocumentProperties, parse_w3cdtf};
use quick_xml::events::Event;

/// Fill `props` from the core properties part.
pub fn parse_core_properties(part: &str, bytes: &[u8], props: &mut DocumentProperties) -> Result<()> {
    each_text_element(part, bytes, |name, text| {
        let slot = match name {
            b"title" => &mut props.title,
            b"subject" => &mut props.subject,
            b"creator" => &mut props.creator,
            b"keywords" => &mut props.keywords,
            b"description" => &mut props.description,
            b"lastModifiedBy" => &mut props.last_modified_by,
            b"category" => &mut props.category,
            b"contentStatus" => &mut props.content_status,
            b"revision" => &mut props.revision,
            b"created" | b"modified" => {
                let parsed = parse_w3cdtf(text.trim());
                if parsed.is_none() {
                    log::warn!("ignoring unparsable timestamp {text:?}");
                }
                if name == b"created" {
                    props.created = parsed;
                } else {
                    props.modified = parsed;
                }
                return;
            },
            _ => return,
        };
        *slot = Some(text);
    })
}

/// Fill the `app.xml` fields of `props`.
pub fn parse_app_properties(part: &str, bytes: &[u8], props: &mut DocumentProperties) -> Result<()> {
    each_text_element(part, bytes, |name, text| match name {
        b"Company" => props.company = Some(text),
        b"Manager" => props.manager = Some(text),
        _ => {},
    })
}

/// Call `f` with the local name and text of every direct child of the root.
fn each_text_element(part: &str, bytes: &[u8], mut f: impl FnMut(&[u8], String)) -> Result<()> {
    let mut problems = Problems::new(part);
    let (_, mut reader) = open_reader(part, bytes)?;
    let mut depth = 0usize;
    let mut current: Option<(Vec<u8>, String)> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                depth += 1;
                if depth == 2 {
                    current = Some((e.local_name().as_ref().to_vec(), String::new()));
                }
            },
            Ok(Event::Text(e)) => {
                if let Some((_, text)) = current.as_mut() {
                    append_text(text, &e);
                }
            },
            Ok(Event::GeneralRef(e)) => {
                if let Some((_, text)) = current.as_mut() {
                    append_general_ref(text, &e);
                }
            },
            Ok(Event::End(_)) => {
                if depth == 2
                    && let Some((name, text)) = current.take()
                {
                    f(&name, text);
                }
                depth = depth.saturating_sub(1);
            },
            Ok(Event::Eof) => break,
            Err(err) => {
                problems.push(format!("XML error at byte {}: {err}", reader.error_position()));
                break;
            },
            _ => {},
        }
    }
    problems.finish(())
}

//! Parser for `xl/sharedStrings.xml`.
//!
//! Plain entries (`<si><t>..</t></si>`) load as text. Rich entries made of
//! `<r>` runs load as their concatenated text and keep the run markup so the
//! writer can emit them unchanged. Phonetic runs (`<rPh>`) are not part of the
//! display text and are dropped.

use super::{Problems, open_reader, position};
use crate::common::error::Result;
use crate::common::xml::{append_general_ref, append_text};
use crate::sheet::shared_strings::{SharedString, SharedStringTable};
use quick_xml::events::Event;

/// Performance: typical workbook string count
const INITIAL_STRINGS_CAPACITY: usize = 1024;

#[derive(Default)]
struct Entry {
    text: String,
    runs_xml: String,
    rich: bool,
}

pub fn parse_shared_strings(part: &str, bytes: &[u8]) -> Result<SharedStringTable> {
    let mut problems = Problems::new(part);
    let (xml, mut reader) = open_reader(part, bytes)?;

    let mut entries = Vec::with_capacity(INITIAL_STRINGS_CAPACITY);
    let mut current: Option<Entry> = None;
    let mut run_start: Option<usize> = None;
    let mut in_text = false;

    loop {
        let before = position(&reader);
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"si" => current = Some(Entry::default()),
                b"r" if current.is_some() => run_start = Some(before),
                b"t" if current.is_some() => in_text = true,
                b"rPh" => {
                    if let Err(err) = reader.read_to_end(e.name()) {
                        problems.push(format!("XML error: {err}"));
                        break;
                    }
                },
                _ => {},
            },
            Ok(Event::Empty(e)) => {
                if e.local_name().as_ref() == b"si" {
                    entries.push(SharedString::Plain(String::new()));
                }
            },
            Ok(Event::Text(e)) if in_text => {
                if let Some(entry) = current.as_mut() {
                    append_text(&mut entry.text, &e);
                }
            },
            Ok(Event::CData(e)) if in_text => {
                if let Some(entry) = current.as_mut() {
                    append_text(&mut entry.text, &e);
                }
            },
            Ok(Event::GeneralRef(e)) if in_text => {
                if let Some(entry) = current.as_mut() {
                    append_general_ref(&mut entry.text, &e);
                }
            },
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"r" => {
                    if let (Some(start), Some(entry)) = (run_start.take(), current.as_mut()) {
                        entry.rich = true;
                        entry.runs_xml.push_str(&xml[start..position(&reader)]);
                    }
                },
                b"si" => {
                    if let Some(entry) = current.take() {
                        entries.push(if entry.rich {
                            SharedString::Rich {
                                text: entry.text,
                                runs_xml: entry.runs_xml,
                            }
                        } else {
                            SharedString::Plain(entry.text)
                        });
                    }
                },
                _ => {},
            },
            Ok(Event::Eof) => break,
            Err(err) => {
                problems.push(format!("XML error at byte {}: {err}", reader.error_position()));
                break;
            },
            _ => {},
        }
    }

    if current.is_some() {
        problems.push("unterminated <si> element");
    }
    problems.finish(SharedStringTable::from_entries(entries))
}

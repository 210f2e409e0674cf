//! Parsers for the SpreadsheetML parts.
//!
//! Each parser makes a full pass over its part, collecting every problem it
//! finds, and only then fails with a single [`Error::MalformedPart`].
//! Unknown elements and attributes are skipped.

pub mod properties_parser;
pub mod shared_strings_parser;
pub mod styles_parser;
pub mod workbook_parser;
pub mod worksheet_parser;

use crate::common::error::{Error, Result};
use crate::common::xml::{Attrs, attr_value};
use crate::ooxml::xlsx::schema::element_order;
use quick_xml::Reader;
use quick_xml::events::BytesStart;

/// Problems found while parsing one part.
#[derive(Debug)]
pub(crate) struct Problems {
    part: String,
    list: Vec<String>,
}

impl Problems {
    pub fn new(part: impl Into<String>) -> Self {
        Self {
            part: part.into(),
            list: Vec::new(),
        }
    }

    pub fn push(&mut self, problem: impl Into<String>) {
        self.list.push(problem.into());
    }

    /// Record the error of a fallible attribute parse and keep the value.
    pub fn check<T>(&mut self, parsed: Option<std::result::Result<T, String>>) -> Option<T> {
        match parsed? {
            Ok(value) => Some(value),
            Err(problem) => {
                self.push(problem);
                None
            },
        }
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    /// `value` when no problems were recorded, otherwise all of them at once.
    pub fn finish<T>(self, value: T) -> Result<T> {
        if self.list.is_empty() {
            Ok(value)
        } else {
            Err(Error::MalformedPart {
                part: self.part,
                problems: self.list,
            })
        }
    }
}

/// Decode a part as UTF-8 and open a reader over it.
pub(crate) fn open_reader<'a>(part: &str, bytes: &'a [u8]) -> Result<(&'a str, Reader<&'a [u8]>)> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    let xml = std::str::from_utf8(bytes).map_err(|err| Error::malformed(part, format!("not UTF-8: {err}")))?;
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(false);
    Ok((xml, reader))
}

/// Current byte offset of `reader` as an index into the source text.
#[inline]
pub(crate) fn position(reader: &Reader<&[u8]>) -> usize {
    reader.buffer_position() as usize
}

/// Prefixed attributes of a root element (`xmlns:mc`, `mc:Ignorable`, ...)
/// other than the `r` namespace, which the writers always declare.
pub(crate) fn root_attributes(root: &BytesStart<'_>) -> Vec<(String, String)> {
    root.attributes()
        .flatten()
        .filter_map(|attr| {
            let key = std::str::from_utf8(attr.key.as_ref()).ok()?;
            (key.contains(':') && key != "xmlns:r").then(|| (key.to_string(), attr_value(&attr)))
        })
        .collect()
}

/// Parse a `true`/`false`/`1`/`0` element value such as `<b val="0"/>`.
pub(crate) fn bool_val(attrs: &Attrs) -> bool {
    attrs.get("val").is_none_or(|v| matches!(v, "1" | "true"))
}

/// Assigns schema positions to the children of a root element.
///
/// Elements missing from the table (for example `mc:AlternateContent`) take
/// the position of the known element read before them.
pub(crate) struct ElementOrder {
    table: &'static [&'static str],
    last: u8,
}

impl ElementOrder {
    pub fn new(table: &'static [&'static str]) -> Self {
        Self { table, last: 0 }
    }

    pub fn of(&mut self, local_name: &[u8]) -> u8 {
        if let Some(order) = element_order(self.table, local_name) {
            self.last = order;
        }
        self.last
    }
}

/// Source text of the element opened by `start`, through its end tag.
///
/// `before` is the reader position just before `start` was read.
pub(crate) fn capture_element(
    xml: &str,
    reader: &mut Reader<&[u8]>,
    start: &BytesStart<'_>,
    before: usize,
) -> std::result::Result<String, quick_xml::Error> {
    reader.read_to_end(start.name())?;
    Ok(xml[before..position(reader)].to_string())
}

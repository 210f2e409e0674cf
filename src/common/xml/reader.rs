//! Small helpers for pulling text and attribute values out of quick-xml events.

use quick_xml::events::{BytesRef, BytesStart};
use quick_xml::events::attributes::Attribute;
use smallvec::SmallVec;
use std::str::FromStr;

/// Unescaped attribute value, falling back to the raw bytes on bad escapes.
pub fn attr_value(attr: &Attribute<'_>) -> String {
    match attr.unescape_value() {
        Ok(value) => value.into_owned(),
        Err(err) => {
            log::warn!("keeping raw attribute value after unescape error: {err}");
            String::from_utf8_lossy(&attr.value).into_owned()
        },
    }
}

/// Local name of an attribute key, without any namespace prefix.
#[inline]
pub fn attr_name<'a>(attr: &'a Attribute<'_>) -> &'a [u8] {
    let key = attr.key.as_ref();
    match memchr::memchr(b':', key) {
        Some(pos) => &key[pos + 1..],
        None => key,
    }
}

/// Append character data from a text or CDATA event.
#[inline]
pub fn append_text(out: &mut String, raw: &[u8]) {
    out.push_str(&String::from_utf8_lossy(raw));
}

/// Append the expansion of an entity or character reference.
pub fn append_general_ref(out: &mut String, reference: &BytesRef<'_>) {
    if let Ok(Some(ch)) = reference.resolve_char_ref() {
        out.push(ch);
        return;
    }
    let expansion = match &**reference {
        b"amp" => "&",
        b"lt" => "<",
        b"gt" => ">",
        b"quot" => "\"",
        b"apos" => "'",
        other => {
            log::warn!("unknown entity reference &{};", String::from_utf8_lossy(other));
            return;
        },
    };
    out.push_str(expansion);
}

/// Attributes of one element as `(local name, unescaped value)` pairs.
#[derive(Debug, Default)]
pub struct Attrs(SmallVec<[(String, String); 8]>);

impl Attrs {
    /// Collect the attributes of a start or empty tag.
    ///
    /// Malformed attributes are skipped with a warning.
    pub fn from_start(start: &BytesStart<'_>) -> Self {
        let mut attrs = SmallVec::new();
        for attr in start.attributes() {
            match attr {
                Ok(attr) => {
                    let name = String::from_utf8_lossy(attr_name(&attr)).into_owned();
                    attrs.push((name, attr_value(&attr)));
                },
                Err(err) => log::warn!("skipping malformed attribute: {err}"),
            }
        }
        Self(attrs)
    }

    /// Value of the attribute with local name `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Boolean attribute (`1`/`true`), `None` when absent.
    pub fn flag(&self, name: &str) -> Option<bool> {
        self.get(name).map(|v| matches!(v, "1" | "true"))
    }

    /// Attribute parsed as `T`, with an error message naming the attribute.
    pub fn parse<T: FromStr>(&self, name: &str) -> Option<Result<T, String>> {
        self.get(name).map(|v| {
            v.trim()
                .parse::<T>()
                .map_err(|_| format!("attribute {name}=\"{v}\" is not valid"))
        })
    }

    /// Iterate over all `(name, value)` pairs in document order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

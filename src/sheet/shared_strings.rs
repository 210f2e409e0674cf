//! Shared strings table for Excel files.
//!
//! Excel stores cell text once per workbook and refers to it by index.
//! Entries are plain strings or rich-text runs; rich entries keep their
//! original run markup so that saving does not lose formatting.

use crate::common::error::Result;
use crate::sheet::intern::InternTable;

/// One shared string table entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SharedString {
    Plain(String),
    /// Rich text: the concatenated run text plus the `<r>` markup as read.
    Rich { text: String, runs_xml: String },
}

impl SharedString {
    /// The display text.
    pub fn text(&self) -> &str {
        match self {
            SharedString::Plain(text) | SharedString::Rich { text, .. } => text,
        }
    }

    pub fn is_rich(&self) -> bool {
        matches!(self, SharedString::Rich { .. })
    }
}

#[derive(Debug, Clone, Default)]
pub struct SharedStringTable {
    entries: InternTable<SharedString>,
}

impl SharedStringTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Table with entries at their existing indices.
    pub fn from_entries(entries: Vec<SharedString>) -> Self {
        Self {
            entries: InternTable::from_entries(entries),
        }
    }

    /// Index of a plain string, adding it if needed.
    pub fn intern(&mut self, text: &str) -> u32 {
        self.entries.intern(SharedString::Plain(text.to_string()))
    }

    pub fn intern_entry(&mut self, entry: SharedString) -> u32 {
        self.entries.intern(entry)
    }

    pub fn get(&self, index: u32) -> Result<&SharedString> {
        self.entries.get(index)
    }

    /// Display text of entry `index`.
    pub fn text(&self, index: u32) -> Result<&str> {
        self.entries.get(index).map(SharedString::text)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SharedString> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::error::Error;

    #[test]
    fn test_intern_plain() {
        let mut sst = SharedStringTable::new();
        assert_eq!(sst.intern("Hello"), 0);
        assert_eq!(sst.intern("World"), 1);
        assert_eq!(sst.intern("Hello"), 0);
        assert_eq!(sst.text(1).unwrap(), "World");
        assert!(matches!(sst.text(2), Err(Error::IndexOutOfRange { index: 2, len: 2 })));
    }

    #[test]
    fn test_rich_entries_are_distinct() {
        let mut sst = SharedStringTable::new();
        let rich = SharedString::Rich {
            text: "Hello".to_string(),
            runs_xml: "<r><rPr><b/></rPr><t>Hello</t></r>".to_string(),
        };
        let a = sst.intern_entry(rich);
        let b = sst.intern("Hello");
        assert_ne!(a, b);
        assert!(sst.get(a).unwrap().is_rich());
        assert_eq!(sst.text(a).unwrap(), "Hello");
    }
}

/// Part names inside an OPC package.
///
/// A [`PackURI`] is an absolute, slash-separated name such as
/// `/xl/worksheets/sheet1.xml`. Zip members use the same name without the
/// leading slash.
use crate::ooxml::opc::error::{OpcError, Result};

/// The package pseudo-partname, representing the package itself
pub const PACKAGE_URI: &str = "/";

/// The URI for the [Content_Types].xml part
pub const CONTENT_TYPES_URI: &str = "/[Content_Types].xml";

/// An absolute part name within an OPC package.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PackURI {
    uri: String,
}

impl PackURI {
    /// Create a PackURI. The name must begin with a forward slash.
    pub fn new<S: Into<String>>(uri: S) -> Result<Self> {
        let uri = uri.into();
        if !uri.starts_with('/') {
            return Err(OpcError::InvalidPackUri(format!(
                "PackURI must begin with slash, got '{uri}'"
            )));
        }
        Ok(PackURI { uri })
    }

    /// Build a PackURI from a zip member name (no leading slash).
    pub fn from_membername(name: &str) -> Result<Self> {
        Self::new(format!("/{}", name.trim_start_matches('/')))
    }

    /// Resolve a relationship target such as `../styles.xml` against `base_uri`.
    pub fn from_rel_ref(base_uri: &str, relative_ref: &str) -> Result<Self> {
        // Absolute targets ignore the base
        if relative_ref.starts_with('/') {
            return Self::new(normalize_path(relative_ref));
        }
        let joined = if base_uri.ends_with('/') {
            format!("{base_uri}{relative_ref}")
        } else {
            format!("{base_uri}/{relative_ref}")
        };
        Self::new(normalize_path(&joined))
    }

    /// Directory portion, e.g. `/xl/worksheets` for `/xl/worksheets/sheet1.xml`.
    pub fn base_uri(&self) -> &str {
        match memchr::memrchr(b'/', self.uri.as_bytes()) {
            Some(0) | None => "/",
            Some(pos) => &self.uri[..pos],
        }
    }

    /// File name portion, empty for the package pseudo-partname.
    pub fn filename(&self) -> &str {
        match memchr::memrchr(b'/', self.uri.as_bytes()) {
            Some(pos) => &self.uri[pos + 1..],
            None => "",
        }
    }

    /// Extension without the leading period.
    pub fn ext(&self) -> &str {
        let filename = self.filename();
        match memchr::memrchr(b'.', filename.as_bytes()) {
            Some(pos) => &filename[pos + 1..],
            None => "",
        }
    }

    /// Zip member name (the URI with the leading slash stripped).
    pub fn membername(&self) -> &str {
        &self.uri[1..]
    }

    /// Relative reference from `base_uri` to this part, as written in `.rels` files.
    pub fn relative_ref(&self, base_uri: &str) -> String {
        if base_uri == "/" {
            return self.membername().to_string();
        }

        let from_parts: Vec<&str> = base_uri.split('/').filter(|s| !s.is_empty()).collect();
        let to_parts: Vec<&str> = self.uri.split('/').filter(|s| !s.is_empty()).collect();

        let common = from_parts
            .iter()
            .zip(to_parts.iter())
            .take_while(|(a, b)| a == b)
            .count();

        let mut result = String::new();
        for _ in common..from_parts.len() {
            result.push_str("../");
        }
        result.push_str(&to_parts[common..].join("/"));
        result
    }

    /// The `.rels` part holding this part's relationships.
    pub fn rels_uri(&self) -> PackURI {
        let base_uri = self.base_uri();
        let uri = if base_uri == "/" {
            format!("/_rels/{}.rels", self.filename())
        } else {
            format!("{}/_rels/{}.rels", base_uri, self.filename())
        };
        PackURI { uri }
    }

    /// For a `.rels` part, the part whose relationships it holds.
    ///
    /// `/_rels/.rels` maps to the package pseudo-partname `/`.
    pub fn rels_source(&self) -> Option<PackURI> {
        let filename = self.filename().strip_suffix(".rels")?;
        let parent = self.base_uri().strip_suffix("/_rels")?;
        let uri = if filename.is_empty() {
            PACKAGE_URI.to_string()
        } else {
            format!("{parent}/{filename}")
        };
        Some(PackURI { uri })
    }

    pub fn as_str(&self) -> &str {
        &self.uri
    }
}

fn normalize_path(path: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for part in path.split('/') {
        match part {
            "" | "." => {},
            ".." => {
                parts.pop();
            },
            _ => parts.push(part),
        }
    }
    format!("/{}", parts.join("/"))
}

impl std::fmt::Display for PackURI {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.uri)
    }
}

impl AsRef<str> for PackURI {
    fn as_ref(&self) -> &str {
        &self.uri
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packuri_new() {
        assert!(PackURI::new("/xl/workbook.xml").is_ok());
        assert!(PackURI::new("xl/workbook.xml").is_err());
    }

    #[test]
    fn test_components() {
        let uri = PackURI::new("/xl/worksheets/sheet1.xml").unwrap();
        assert_eq!(uri.base_uri(), "/xl/worksheets");
        assert_eq!(uri.filename(), "sheet1.xml");
        assert_eq!(uri.ext(), "xml");
        assert_eq!(uri.membername(), "xl/worksheets/sheet1.xml");

        let root = PackURI::new("/").unwrap();
        assert_eq!(root.base_uri(), "/");
        assert_eq!(root.filename(), "");
    }

    #[test]
    fn test_from_rel_ref() {
        let uri = PackURI::from_rel_ref("/xl", "worksheets/sheet1.xml").unwrap();
        assert_eq!(uri.as_str(), "/xl/worksheets/sheet1.xml");

        let uri = PackURI::from_rel_ref("/xl/worksheets", "../drawings/drawing1.xml").unwrap();
        assert_eq!(uri.as_str(), "/xl/drawings/drawing1.xml");

        let uri = PackURI::from_rel_ref("/xl", "/xl/styles.xml").unwrap();
        assert_eq!(uri.as_str(), "/xl/styles.xml");
    }

    #[test]
    fn test_relative_ref() {
        let uri = PackURI::new("/xl/drawings/drawing1.xml").unwrap();
        assert_eq!(uri.relative_ref("/xl/worksheets"), "../drawings/drawing1.xml");
        assert_eq!(uri.relative_ref("/xl"), "drawings/drawing1.xml");
        assert_eq!(uri.relative_ref("/"), "xl/drawings/drawing1.xml");
    }

    #[test]
    fn test_rels_uri_and_source() {
        let uri = PackURI::new("/xl/workbook.xml").unwrap();
        let rels = uri.rels_uri();
        assert_eq!(rels.as_str(), "/xl/_rels/workbook.xml.rels");
        assert_eq!(rels.rels_source(), Some(uri));

        let pkg_rels = PackURI::new("/_rels/.rels").unwrap();
        assert_eq!(pkg_rels.rels_source().unwrap().as_str(), PACKAGE_URI);

        let top = PackURI::new("/_rels/foo.xml.rels").unwrap();
        assert_eq!(top.rels_source().unwrap().as_str(), "/foo.xml");

        let plain = PackURI::new("/xl/styles.xml").unwrap();
        assert_eq!(plain.rels_source(), None);
    }
}

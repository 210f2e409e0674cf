/// Relationship-related objects.
///
/// A relationship is a typed edge from a source part (or the package itself)
/// to a target part or external resource. Each source owns one
/// [`Relationships`] collection, serialized as its `.rels` part.
use crate::common::xml::escape_xml;
use crate::ooxml::opc::constants::namespace;
use crate::ooxml::opc::error::{OpcError, Result};
use crate::ooxml::opc::packuri::PackURI;
use std::collections::HashMap;

/// A single relationship from a source part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    r_id: String,
    reltype: String,
    target_ref: String,
    base_uri: String,
    is_external: bool,
}

impl Relationship {
    pub fn new(
        r_id: String,
        reltype: String,
        target_ref: String,
        base_uri: String,
        is_external: bool,
    ) -> Self {
        Self {
            r_id,
            reltype,
            target_ref,
            base_uri,
            is_external,
        }
    }

    #[inline]
    pub fn r_id(&self) -> &str {
        &self.r_id
    }

    #[inline]
    pub fn reltype(&self) -> &str {
        &self.reltype
    }

    #[inline]
    pub fn target_ref(&self) -> &str {
        &self.target_ref
    }

    #[inline]
    pub fn is_external(&self) -> bool {
        self.is_external
    }

    /// Absolute part name of the target. Fails for external relationships.
    pub fn target_partname(&self) -> Result<PackURI> {
        if self.is_external {
            return Err(OpcError::InvalidRelationship(format!(
                "{} is external and has no target part",
                self.r_id
            )));
        }
        PackURI::from_rel_ref(&self.base_uri, &self.target_ref)
    }
}

/// The relationships owned by one source part.
#[derive(Debug, Clone)]
pub struct Relationships {
    base_uri: String,
    rels: HashMap<String, Relationship>,
}

impl Relationships {
    /// Create an empty collection for a source whose directory is `base_uri`.
    pub fn new(base_uri: impl Into<String>) -> Self {
        Self {
            base_uri: base_uri.into(),
            rels: HashMap::new(),
        }
    }

    #[inline]
    pub fn base_uri(&self) -> &str {
        &self.base_uri
    }

    /// Insert a relationship with an explicit id, replacing any previous one.
    pub fn add_relationship(
        &mut self,
        reltype: &str,
        target_ref: &str,
        r_id: &str,
        is_external: bool,
    ) {
        let rel = Relationship::new(
            r_id.to_string(),
            reltype.to_string(),
            target_ref.to_string(),
            self.base_uri.clone(),
            is_external,
        );
        self.rels.insert(r_id.to_string(), rel);
    }

    /// Add an internal relationship to `target` under the first free id.
    pub fn add_part_relationship(&mut self, reltype: &str, target: &PackURI) -> String {
        let r_id = self.next_r_id();
        let target_ref = target.relative_ref(&self.base_uri);
        self.add_relationship(reltype, &target_ref, &r_id, false);
        r_id
    }

    #[inline]
    pub fn get(&self, r_id: &str) -> Option<&Relationship> {
        self.rels.get(r_id)
    }

    /// First unused `rIdN`, filling gaps before extending the sequence.
    pub fn next_r_id(&self) -> String {
        let mut used_numbers: Vec<u32> = self.rels.keys().filter_map(|r_id| r_id_number(r_id)).collect();
        used_numbers.sort_unstable();

        let mut next_num = 1u32;
        for &num in &used_numbers {
            match num.cmp(&next_num) {
                std::cmp::Ordering::Equal => next_num += 1,
                std::cmp::Ordering::Greater => break,
                std::cmp::Ordering::Less => {},
            }
        }

        format!("rId{next_num}")
    }

    /// The single relationship of `reltype`, if exactly one exists.
    pub fn part_with_reltype(&self, reltype: &str) -> Option<&Relationship> {
        let mut matching = self.rels.values().filter(|rel| rel.reltype() == reltype);
        let first = matching.next()?;
        if matching.next().is_some() {
            log::warn!("multiple relationships of type {reltype}, using {}", first.r_id());
        }
        Some(first)
    }

    /// Relationships in id order (numeric ids first, by number).
    pub fn iter(&self) -> impl Iterator<Item = &Relationship> {
        let mut rels: Vec<&Relationship> = self.rels.values().collect();
        rels.sort_by(|a, b| rel_sort_key(a.r_id()).cmp(&rel_sort_key(b.r_id())));
        rels.into_iter()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.rels.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rels.is_empty()
    }

    pub fn remove(&mut self, r_id: &str) -> Option<Relationship> {
        self.rels.remove(r_id)
    }

    /// Serialize as a `.rels` part.
    pub fn to_xml(&self) -> String {
        let mut xml = String::with_capacity(256 + self.rels.len() * 160);

        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        xml.push('\n');
        xml.push_str(r#"<Relationships xmlns=""#);
        xml.push_str(namespace::OPC_RELATIONSHIPS);
        xml.push_str(r#"">"#);

        for rel in self.iter() {
            xml.push_str(r#"<Relationship Id=""#);
            xml.push_str(&escape_xml(rel.r_id()));
            xml.push_str(r#"" Type=""#);
            xml.push_str(&escape_xml(rel.reltype()));
            xml.push_str(r#"" Target=""#);
            xml.push_str(&escape_xml(rel.target_ref()));
            xml.push('"');
            if rel.is_external() {
                xml.push_str(r#" TargetMode="External""#);
            }
            xml.push_str("/>");
        }

        xml.push_str("</Relationships>");
        xml
    }
}

fn r_id_number(r_id: &str) -> Option<u32> {
    let digits = r_id.strip_prefix("rId")?;
    atoi_simd::parse::<u32, false, false>(digits.as_bytes()).ok()
}

fn rel_sort_key(r_id: &str) -> (u32, &str) {
    (r_id_number(r_id).unwrap_or(u32::MAX), r_id)
}

impl Default for Relationships {
    fn default() -> Self {
        Self::new("/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ooxml::opc::constants::relationship_type as rt;

    #[test]
    fn test_next_r_id_fills_gaps() {
        let mut rels = Relationships::new("/xl");
        assert_eq!(rels.next_r_id(), "rId1");

        rels.add_relationship(rt::STYLES, "styles.xml", "rId1", false);
        rels.add_relationship(rt::THEME, "theme/theme1.xml", "rId3", false);
        assert_eq!(rels.next_r_id(), "rId2");
    }

    #[test]
    fn test_add_part_relationship_uses_relative_target() {
        let mut rels = Relationships::new("/xl");
        let target = PackURI::new("/xl/worksheets/sheet1.xml").unwrap();
        let r_id = rels.add_part_relationship(rt::WORKSHEET, &target);

        let rel = rels.get(&r_id).unwrap();
        assert_eq!(rel.target_ref(), "worksheets/sheet1.xml");
        assert_eq!(rel.target_partname().unwrap(), target);
    }

    #[test]
    fn test_to_xml_orders_numerically() {
        let mut rels = Relationships::new("/xl");
        rels.add_relationship(rt::STYLES, "styles.xml", "rId10", false);
        rels.add_relationship(rt::WORKSHEET, "worksheets/sheet1.xml", "rId2", false);
        rels.add_relationship("http://example.com/link", "https://example.com/?a=1&b=2", "rId1", true);

        let xml = rels.to_xml();
        let pos1 = xml.find(r#"Id="rId1""#).unwrap();
        let pos2 = xml.find(r#"Id="rId2""#).unwrap();
        let pos10 = xml.find(r#"Id="rId10""#).unwrap();
        assert!(pos1 < pos2 && pos2 < pos10);
        assert!(xml.contains(r#"a=1&amp;b=2" TargetMode="External""#));
    }

    #[test]
    fn test_external_has_no_partname() {
        let mut rels = Relationships::new("/xl/worksheets");
        rels.add_relationship("http://example.com/link", "https://example.com", "rId1", true);
        assert!(rels.get("rId1").unwrap().target_partname().is_err());
    }
}

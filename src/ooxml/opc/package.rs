/// The in-memory OPC package.
///
/// An [`OpcPackage`] holds an ordered list of parts plus the package-level
/// relationships. Part order is the order used when writing, so callers that
/// add parts in a fixed sequence get reproducible archives.
use crate::ooxml::opc::constants::relationship_type as rt;
use crate::ooxml::opc::error::{OpcError, Result};
use crate::ooxml::opc::packuri::{PACKAGE_URI, PackURI};
use crate::ooxml::opc::part::Part;
use crate::ooxml::opc::pkgreader::PackageReader;
use crate::ooxml::opc::pkgwriter::{PackageWriter, WriteOptions};
use crate::ooxml::opc::rel::Relationships;
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct OpcPackage {
    parts: Vec<Part>,
    index: HashMap<PackURI, usize>,
    rels: Relationships,
}

impl OpcPackage {
    pub fn new() -> Self {
        Self {
            parts: Vec::new(),
            index: HashMap::new(),
            rels: Relationships::new(PACKAGE_URI),
        }
    }

    /// Parse a zip archive into a package.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        PackageReader::read(bytes)
    }

    /// Serialize to a zip archive.
    pub fn to_bytes(&self, options: &WriteOptions) -> Result<Vec<u8>> {
        PackageWriter::to_bytes(self, options)
    }

    /// Package-level relationships (`/_rels/.rels`).
    #[inline]
    pub fn rels(&self) -> &Relationships {
        &self.rels
    }

    #[inline]
    pub fn rels_mut(&mut self) -> &mut Relationships {
        &mut self.rels
    }

    /// Add a part, replacing any part with the same name in place.
    pub fn add_part(&mut self, part: Part) {
        match self.index.get(part.partname()) {
            Some(&idx) => self.parts[idx] = part,
            None => {
                self.index.insert(part.partname().clone(), self.parts.len());
                self.parts.push(part);
            },
        }
    }

    pub fn part(&self, partname: &PackURI) -> Option<&Part> {
        self.index.get(partname).map(|&idx| &self.parts[idx])
    }

    pub fn part_mut(&mut self, partname: &PackURI) -> Option<&mut Part> {
        self.index.get(partname).map(|&idx| &mut self.parts[idx])
    }

    #[inline]
    pub fn contains(&self, partname: &PackURI) -> bool {
        self.index.contains_key(partname)
    }

    /// Parts in package order.
    pub fn iter_parts(&self) -> impl Iterator<Item = &Part> {
        self.parts.iter()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// The part targeted by the package's `officeDocument` relationship.
    pub fn main_document_part(&self) -> Result<&Part> {
        let rel = self
            .rels
            .part_with_reltype(rt::OFFICE_DOCUMENT)
            .ok_or_else(|| OpcError::PartNotFound("officeDocument relationship".to_string()))?;
        let partname = rel.target_partname()?;
        self.part(&partname)
            .ok_or_else(|| OpcError::PartNotFound(partname.to_string()))
    }

    /// Check that every internal relationship resolves to a part in the package.
    pub fn validate_relationships(&self) -> Result<()> {
        let sources = std::iter::once((PACKAGE_URI, &self.rels))
            .chain(self.parts.iter().map(|p| (p.partname().as_str(), p.rels())));

        for (source_uri, rels) in sources {
            for rel in rels.iter().filter(|r| !r.is_external()) {
                let target = rel.target_partname()?;
                if !self.contains(&target) {
                    return Err(OpcError::DanglingRelationship {
                        source_uri: source_uri.to_string(),
                        r_id: rel.r_id().to_string(),
                        target: target.to_string(),
                    });
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ooxml::opc::constants::content_type as ct;

    fn sample_package() -> OpcPackage {
        let mut pkg = OpcPackage::new();
        let workbook = PackURI::new("/xl/workbook.xml").unwrap();
        pkg.add_part(Part::new(workbook.clone(), ct::SML_SHEET_MAIN, b"<workbook/>".to_vec()));
        pkg.rels_mut().add_part_relationship(rt::OFFICE_DOCUMENT, &workbook);
        pkg
    }

    #[test]
    fn test_main_document_part() {
        let pkg = sample_package();
        let main = pkg.main_document_part().unwrap();
        assert_eq!(main.partname().as_str(), "/xl/workbook.xml");
        assert_eq!(main.content_type(), ct::SML_SHEET_MAIN);
    }

    #[test]
    fn test_add_part_replaces_in_place() {
        let mut pkg = sample_package();
        let styles = PackURI::new("/xl/styles.xml").unwrap();
        pkg.add_part(Part::new(styles.clone(), ct::SML_STYLES, b"a".to_vec()));
        pkg.add_part(Part::new(styles.clone(), ct::SML_STYLES, b"b".to_vec()));

        assert_eq!(pkg.len(), 2);
        assert_eq!(pkg.part(&styles).unwrap().blob(), b"b");
        let order: Vec<_> = pkg.iter_parts().map(|p| p.partname().as_str()).collect();
        assert_eq!(order, ["/xl/workbook.xml", "/xl/styles.xml"]);
    }

    #[test]
    fn test_dangling_relationship_detected() {
        let mut pkg = sample_package();
        assert!(pkg.validate_relationships().is_ok());

        let workbook = PackURI::new("/xl/workbook.xml").unwrap();
        let missing = PackURI::new("/xl/worksheets/sheet9.xml").unwrap();
        pkg.part_mut(&workbook)
            .unwrap()
            .rels_mut()
            .add_part_relationship(rt::WORKSHEET, &missing);

        match pkg.validate_relationships() {
            Err(OpcError::DanglingRelationship { target, .. }) => {
                assert_eq!(target, "/xl/worksheets/sheet9.xml")
            },
            other => panic!("expected dangling relationship, got {other:?}"),
        }
    }
}

//! Read-side of the OPC container.
//!
//! [`PackageReader`] unzips an archive, resolves each part's content type from
//! `[Content_Types].xml`, pairs parts with their `.rels` files and checks that
//! every internal relationship lands on an existing part.

use crate::common::xml::{attr_name, attr_value};
use crate::ooxml::opc::constants::target_mode;
use crate::ooxml::opc::error::{OpcError, Result};
use crate::ooxml::opc::package::OpcPackage;
use crate::ooxml::opc::packuri::{CONTENT_TYPES_URI, PACKAGE_URI, PackURI};
use crate::ooxml::opc::part::Part;
use crate::ooxml::opc::rel::Relationships;
use quick_xml::Reader;
use quick_xml::events::Event;
use std::collections::HashMap;
use std::io::{Cursor, Read};

/// Content type lookup built from `[Content_Types].xml`.
#[derive(Debug, Default)]
pub(crate) struct ContentTypeMap {
    defaults: HashMap<String, String>,
    overrides: HashMap<String, String>,
}

impl ContentTypeMap {
    pub(crate) fn from_xml(xml: &[u8]) -> Result<Self> {
        let mut map = Self::default();
        let mut reader = Reader::from_reader(xml);
        reader.config_mut().trim_text(true);

        let mut buf = Vec::new();
        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                    b"Default" => {
                        let mut extension = None;
                        let mut content_type = None;
                        for attr in e.attributes().flatten() {
                            match attr_name(&attr) {
                                b"Extension" => extension = Some(attr_value(&attr)),
                                b"ContentType" => content_type = Some(attr_value(&attr)),
                                _ => {},
                            }
                        }
                        if let (Some(ext), Some(ct)) = (extension, content_type) {
                            map.defaults.insert(ext.to_ascii_lowercase(), ct);
                        }
                    },
                    b"Override" => {
                        let mut partname = None;
                        let mut content_type = None;
                        for attr in e.attributes().flatten() {
                            match attr_name(&attr) {
                                b"PartName" => partname = Some(attr_value(&attr)),
                                b"ContentType" => content_type = Some(attr_value(&attr)),
                                _ => {},
                            }
                        }
                        if let (Some(pn), Some(ct)) = (partname, content_type) {
                            // Part names compare case-insensitively (OPC §9.1.1.1)
                            map.overrides.insert(pn.to_ascii_lowercase(), ct);
                        }
                    },
                    _ => {},
                },
                Ok(Event::Eof) => break,
                Err(e) => return Err(OpcError::xml(CONTENT_TYPES_URI, e)),
                _ => {},
            }
            buf.clear();
        }

        Ok(map)
    }

    pub(crate) fn get(&self, partname: &PackURI) -> Option<&str> {
        self.overrides
            .get(&partname.as_str().to_ascii_lowercase())
            .or_else(|| self.defaults.get(&partname.ext().to_ascii_lowercase()))
            .map(String::as_str)
    }
}

/// Parse a `.rels` part into a [`Relationships`] collection rooted at `base_uri`.
pub(crate) fn parse_rels_xml(xml: &[u8], rels_uri: &str, base_uri: &str) -> Result<Relationships> {
    let mut rels = Relationships::new(base_uri);
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                if e.local_name().as_ref() == b"Relationship" =>
            {
                let mut r_id = None;
                let mut reltype = None;
                let mut target = None;
                let mut external = false;
                for attr in e.attributes().flatten() {
                    match attr_name(&attr) {
                        b"Id" => r_id = Some(attr_value(&attr)),
                        b"Type" => reltype = Some(attr_value(&attr)),
                        b"Target" => target = Some(attr_value(&attr)),
                        b"TargetMode" => external = attr_value(&attr) == target_mode::EXTERNAL,
                        _ => {},
                    }
                }
                match (r_id, reltype, target) {
                    (Some(r_id), Some(reltype), Some(target)) => {
                        rels.add_relationship(&reltype, &target, &r_id, external);
                    },
                    _ => {
                        return Err(OpcError::InvalidRelationship(format!(
                            "{rels_uri}: Relationship missing Id, Type or Target"
                        )));
                    },
                }
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(OpcError::xml(rels_uri, e)),
            _ => {},
        }
        buf.clear();
    }

    Ok(rels)
}

pub struct PackageReader;

impl PackageReader {
    /// Load every zip member into an [`OpcPackage`].
    pub fn read(bytes: &[u8]) -> Result<OpcPackage> {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes))?;

        // Members in archive order so that re-saving keeps a stable sequence
        let mut members: Vec<(String, Vec<u8>)> = Vec::with_capacity(archive.len());
        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            if file.is_dir() {
                continue;
            }
            let name = file.name().to_string();
            let mut data = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut data)?;
            members.push((name, data));
        }

        let content_types_name = CONTENT_TYPES_URI.trim_start_matches('/');
        let content_types = members
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(content_types_name))
            .map(|(_, data)| ContentTypeMap::from_xml(data))
            .transpose()?
            .ok_or_else(|| OpcError::PartNotFound(CONTENT_TYPES_URI.to_string()))?;

        let mut package = OpcPackage::new();
        let mut rels_members: Vec<(PackURI, Vec<u8>)> = Vec::new();

        for (name, data) in members {
            if name.eq_ignore_ascii_case(content_types_name) {
                continue;
            }
            let partname = PackURI::from_membername(&name)?;
            if partname.ext().eq_ignore_ascii_case("rels") && partname.rels_source().is_some() {
                rels_members.push((partname, data));
                continue;
            }
            let content_type = content_types
                .get(&partname)
                .ok_or_else(|| OpcError::ContentTypeNotFound(partname.to_string()))?
                .to_string();
            package.add_part(Part::new(partname, content_type, data));
        }

        for (rels_uri, data) in rels_members {
            let Some(source) = rels_uri.rels_source() else {
                continue;
            };
            if source.as_str() == PACKAGE_URI {
                let rels = parse_rels_xml(&data, rels_uri.as_str(), PACKAGE_URI)?;
                *package.rels_mut() = rels;
                continue;
            }
            match package.part_mut(&source) {
                Some(part) => {
                    let rels = parse_rels_xml(&data, rels_uri.as_str(), source.base_uri())?;
                    part.set_rels(rels);
                },
                None => log::debug!("dropping {rels_uri}: source part {source} is absent"),
            }
        }

        package.validate_relationships()?;
        Ok(package)
    }
}

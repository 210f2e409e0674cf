//! Write-side of the OPC container.
//!
//! Members are emitted as `[Content_Types].xml`, `_rels/.rels`, then every
//! part in package order, each immediately followed by its own `.rels`.
//! All entries carry the same fixed timestamp so identical packages produce
//! identical archives.

use crate::common::xml::escape_xml;
use crate::ooxml::opc::constants::{content_type as ct, namespace};
use crate::ooxml::opc::error::Result;
use crate::ooxml::opc::package::OpcPackage;
use crate::ooxml::opc::packuri::{CONTENT_TYPES_URI, PACKAGE_URI, PackURI};
use std::collections::BTreeMap;
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

/// Options controlling how the archive is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteOptions {
    /// Deflate level (0-9). `None` uses the codec default.
    pub compression_level: Option<i64>,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            compression_level: Some(6),
        }
    }
}

pub struct PackageWriter;

impl PackageWriter {
    /// Serialize an OPC package to zip bytes.
    pub fn to_bytes(package: &OpcPackage, options: &WriteOptions) -> Result<Vec<u8>> {
        let file_options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .compression_level(options.compression_level)
            .last_modified_time(DateTime::default());

        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));

        let content_types = ContentTypesItem::from_package(package).to_xml();
        write_member(&mut zip, CONTENT_TYPES_URI, content_types.as_bytes(), file_options)?;

        let pkg_rels_uri = PackURI::new(PACKAGE_URI)?.rels_uri();
        write_member(
            &mut zip,
            pkg_rels_uri.as_str(),
            package.rels().to_xml().as_bytes(),
            file_options,
        )?;

        for part in package.iter_parts() {
            write_member(&mut zip, part.partname().as_str(), part.blob(), file_options)?;
            if !part.rels().is_empty() {
                let rels_uri = part.partname().rels_uri();
                write_member(
                    &mut zip,
                    rels_uri.as_str(),
                    part.rels().to_xml().as_bytes(),
                    file_options,
                )?;
            }
        }

        Ok(zip.finish()?.into_inner())
    }
}

fn write_member(
    zip: &mut ZipWriter<Cursor<Vec<u8>>>,
    uri: &str,
    data: &[u8],
    options: SimpleFileOptions,
) -> Result<()> {
    zip.start_file(uri.trim_start_matches('/'), options)?;
    zip.write_all(data)?;
    Ok(())
}

/// Builder for `[Content_Types].xml`.
///
/// Extensions with a conventional default are written as `Default` entries,
/// everything else as a per-part `Override`. Both lists are sorted.
struct ContentTypesItem {
    defaults: BTreeMap<String, String>,
    overrides: BTreeMap<String, String>,
}

impl ContentTypesItem {
    fn from_package(package: &OpcPackage) -> Self {
        let mut defaults = BTreeMap::new();
        defaults.insert("rels".to_string(), ct::OPC_RELATIONSHIPS.to_string());
        defaults.insert("xml".to_string(), ct::XML.to_string());

        let mut cti = Self {
            defaults,
            overrides: BTreeMap::new(),
        };
        for part in package.iter_parts() {
            cti.add_content_type(part.partname(), part.content_type());
        }
        cti
    }

    fn add_content_type(&mut self, partname: &PackURI, content_type: &str) {
        let ext = partname.ext().to_ascii_lowercase();
        if ct::default_for_extension(&ext) == Some(content_type) {
            self.defaults.insert(ext, content_type.to_string());
        } else {
            self.overrides
                .insert(partname.to_string(), content_type.to_string());
        }
    }

    fn to_xml(&self) -> String {
        let mut xml = String::with_capacity(256 + self.overrides.len() * 160);

        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        xml.push('\n');
        xml.push_str(r#"<Types xmlns=""#);
        xml.push_str(namespace::OPC_CONTENT_TYPES);
        xml.push_str(r#"">"#);

        for (ext, content_type) in &self.defaults {
            xml.push_str(&format!(
                r#"<Default Extension="{}" ContentType="{}"/>"#,
                escape_xml(ext),
                escape_xml(content_type)
            ));
        }
        for (partname, content_type) in &self.overrides {
            xml.push_str(&format!(
                r#"<Override PartName="{}" ContentType="{}"/>"#,
                escape_xml(partname),
                escape_xml(content_type)
            ));
        }

        xml.push_str("</Types>");
        xml
    }
}

//! Compound-file container for encrypted packages.
//!
//! Besides the two payload streams, Office expects the `\x06DataSpaces`
//! storage that declares the StrongEncryptionTransform.

use crate::common::error::Result;
use crate::ole::OleWriter;

pub(super) const ENCRYPTION_INFO: &str = "EncryptionInfo";
pub(super) const ENCRYPTED_PACKAGE: &str = "EncryptedPackage";

const DATA_SPACES: &str = "\u{0006}DataSpaces";
const DATA_SPACE_NAME: &str = "StrongEncryptionDataSpace";
const TRANSFORM_NAME: &str = "StrongEncryptionTransform";
const TRANSFORM_CLASS_ID: &str = "{FF9A3F03-56EF-4613-BDD5-5A41C1D07246}";

/// Wrap `EncryptionInfo` and `EncryptedPackage` bytes in a compound file.
pub(super) fn build_ole_encrypted_package(encryption_info: &[u8], encrypted_package: &[u8]) -> Result<Vec<u8>> {
    let mut writer = OleWriter::new();
    writer.create_stream(&[ENCRYPTION_INFO], encryption_info)?;
    writer.create_stream(&[ENCRYPTED_PACKAGE], encrypted_package)?;

    writer.create_storage(&[DATA_SPACES, "DataSpaceInfo"])?;
    writer.create_storage(&[DATA_SPACES, "TransformInfo", TRANSFORM_NAME])?;
    writer.create_stream(&[DATA_SPACES, "Version"], &version_stream())?;
    writer.create_stream(&[DATA_SPACES, "DataSpaceMap"], &data_space_map())?;
    writer.create_stream(&[DATA_SPACES, "DataSpaceInfo", DATA_SPACE_NAME], &data_space_definition())?;
    writer.create_stream(
        &[DATA_SPACES, "TransformInfo", TRANSFORM_NAME, "\u{0006}Primary"],
        &transform_primary(),
    )?;

    Ok(writer.to_bytes()?)
}

/// Length-prefixed UTF-16LE string padded to a 4-byte boundary.
fn push_unicode_lpp4(buf: &mut Vec<u8>, s: &str) {
    let units: Vec<u8> = s.encode_utf16().flat_map(u16::to_le_bytes).collect();
    buf.extend_from_slice(&(units.len() as u32).to_le_bytes());
    buf.extend_from_slice(&units);
    if units.len() % 4 == 2 {
        buf.extend_from_slice(&[0, 0]);
    }
}

/// Reader, updater and writer versions, all 1.0.
fn push_versions(buf: &mut Vec<u8>) {
    for _ in 0..3 {
        buf.extend_from_slice(&1u16.to_le_bytes());
        buf.extend_from_slice(&0u16.to_le_bytes());
    }
}

fn version_stream() -> Vec<u8> {
    let mut buf = Vec::new();
    push_unicode_lpp4(&mut buf, "Microsoft.Container.DataSpaces");
    push_versions(&mut buf);
    buf
}

fn data_space_map() -> Vec<u8> {
    let mut buf = Vec::new();
    buf.extend_from_slice(&8u32.to_le_bytes());
    buf.extend_from_slice(&1u32.to_le_bytes());

    let entry_start = buf.len();
    buf.extend_from_slice(&0u32.to_le_bytes());
    // one reference component of type stream
    buf.extend_from_slice(&1u32.to_le_bytes());
    buf.extend_from_slice(&0u32.to_le_bytes());
    push_unicode_lpp4(&mut buf, ENCRYPTED_PACKAGE);
    push_unicode_lpp4(&mut buf, DATA_SPACE_NAME);
    let entry_len = (buf.len() - entry_start) as u32;
    buf[entry_start..entry_start + 4].copy_from_slice(&entry_len.to_le_bytes());
    buf
}

fn data_space_definition() -> Vec<u8> {
    let mut buf = Vec::new();
    buf.extend_from_slice(&8u32.to_le_bytes());
    buf.extend_from_slice(&1u32.to_le_bytes());
    push_unicode_lpp4(&mut buf, TRANSFORM_NAME);
    buf
}

fn transform_primary() -> Vec<u8> {
    let mut buf = Vec::new();
    buf.extend_from_slice(&0u32.to_le_bytes());
    buf.extend_from_slice(&1u32.to_le_bytes());
    push_unicode_lpp4(&mut buf, TRANSFORM_CLASS_ID);
    let header_len = buf.len() as u32;
    buf[..4].copy_from_slice(&header_len.to_le_bytes());

    push_unicode_lpp4(&mut buf, "Microsoft.Container.EncryptionTransform");
    push_versions(&mut buf);
    // EncryptionTransformInfo: empty name, block size 0, no extensibility data
    buf.extend_from_slice(&0u32.to_le_bytes());
    buf.extend_from_slice(&0u32.to_le_bytes());
    buf.extend_from_slice(&0u32.to_le_bytes());
    buf.extend_from_slice(&4u32.to_le_bytes());
    buf
}

//! Container detection by signature.
//!
//! A workbook arrives either as a zip package or, when encrypted, as a
//! compound file. Only the leading bytes are inspected.

/// Local file header signature of a zip archive.
pub const ZIP_SIGNATURE: &[u8; 4] = b"PK\x03\x04";
/// End-of-central-directory signature; an empty archive starts with it.
pub const ZIP_EMPTY_SIGNATURE: &[u8; 4] = b"PK\x05\x06";
/// Compound file (OLE2) signature.
pub use crate::ole::consts::MAGIC as OLE_SIGNATURE;

/// Physical container of a workbook file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerFormat {
    /// Plain OPC zip package
    Zip,
    /// Compound file, normally an encrypted package
    CompoundFile,
}

/// Identify the container from its first bytes.
pub fn detect_container(bytes: &[u8]) -> Option<ContainerFormat> {
    if bytes.starts_with(ZIP_SIGNATURE) || bytes.starts_with(ZIP_EMPTY_SIGNATURE) {
        Some(ContainerFormat::Zip)
    } else if bytes.starts_with(OLE_SIGNATURE) {
        Some(ContainerFormat::CompoundFile)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_container() {
        assert_eq!(detect_container(b"PK\x03\x04rest"), Some(ContainerFormat::Zip));
        assert_eq!(detect_container(b"PK\x05\x06"), Some(ContainerFormat::Zip));
        assert_eq!(
            detect_container(&[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1, 0]),
            Some(ContainerFormat::CompoundFile)
        );
        assert_eq!(detect_container(b"PK"), None);
        assert_eq!(detect_container(b"<?xml"), None);
    }
}

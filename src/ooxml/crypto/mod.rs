//! Password-based encryption of OOXML packages (MS-OFFCRYPTO).
//!
//! An encrypted workbook is a compound file whose `EncryptedPackage` stream
//! holds the zip package and whose `EncryptionInfo` stream describes how it
//! was encrypted. Agile encryption (4.4) is written and read; Standard
//! encryption (3.2/4.2, AES only) is read.

mod agile;
mod ole_encrypted_package;
mod standard2007;

pub use agile::{AgileParams, HashAlgorithm};

use crate::common::error::{Error, Result};
use crate::ole::OleReader;
use ole_encrypted_package::{ENCRYPTED_PACKAGE, ENCRYPTION_INFO};

/// Encrypt a zip package into a compound file with Agile encryption.
pub fn encrypt_package(package: &[u8], password: &str, params: &AgileParams) -> Result<Vec<u8>> {
    agile::encrypt(package, password, params)
}

/// Decrypt the zip package held in the compound file `container`.
pub fn decrypt_package(container: &[u8], password: &str) -> Result<Vec<u8>> {
    let ole = OleReader::open(container)?;
    if !ole.exists(&[ENCRYPTION_INFO]) {
        return Err(Error::UnsupportedEncryption(
            "compound file has no EncryptionInfo stream".to_string(),
        ));
    }
    let info = ole.open_stream(&[ENCRYPTION_INFO])?;
    let package = ole.open_stream(&[ENCRYPTED_PACKAGE]).map_err(|_| {
        Error::CorruptPackage("compound file has no EncryptedPackage stream".to_string())
    })?;
    if info.len() < 8 {
        return Err(Error::CorruptPackage("EncryptionInfo stream is truncated".to_string()));
    }

    let major = u16::from_le_bytes([info[0], info[1]]);
    let minor = u16::from_le_bytes([info[2], info[3]]);
    log::debug!("EncryptionInfo version {major}.{minor}");
    match (major, minor) {
        (4, 4) => agile::decrypt(&info, &package, password),
        (2..=4, 2) => standard2007::decrypt(&info, &package, password),
        (3 | 4, 3) => Err(Error::UnsupportedEncryption("extensible encryption".to_string())),
        _ => Err(Error::UnsupportedEncryption(format!(
            "EncryptionInfo version {major}.{minor}"
        ))),
    }
}

fn password_to_utf16le(password: &str) -> Vec<u8> {
    password.encode_utf16().flat_map(u16::to_le_bytes).collect()
}

/// Split an `EncryptedPackage` stream into its declared size and ciphertext.
fn split_package_stream(stream: &[u8], block_size: usize) -> Result<(usize, &[u8])> {
    if stream.len() < 8 {
        return Err(Error::CorruptPackage("EncryptedPackage stream is truncated".to_string()));
    }
    let mut size = [0u8; 8];
    size.copy_from_slice(&stream[..8]);
    let size = u64::from_le_bytes(size) as usize;
    let ciphertext = &stream[8..];
    if !ciphertext.len().is_multiple_of(block_size) || ciphertext.len() < size {
        return Err(Error::CorruptPackage(format!(
            "EncryptedPackage holds {} bytes of ciphertext for {size} bytes of data",
            ciphertext.len()
        )));
    }
    Ok((size, ciphertext))
}

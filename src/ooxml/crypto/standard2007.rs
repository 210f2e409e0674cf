//! Standard encryption (ECMA-376 "Standard", binary `EncryptionInfo`).
//!
//! Only read support. The package is AES-ECB encrypted with a key derived
//! from a SHA-1 password hash.

use super::{password_to_utf16le, split_package_stream};
use crate::common::error::{Error, Result};
use aes::cipher::generic_array::GenericArray;
use aes::cipher::{BlockCipher, BlockDecrypt, KeyInit};
use aes::{Aes128, Aes192, Aes256};
use sha1::{Digest, Sha1};

const SPIN_COUNT: u32 = 50_000;
const BLOCK_SIZE: usize = 16;
const SALT_SIZE: usize = 16;
const SHA1_SIZE: usize = 20;
/// `fCryptoAPI` and `fAES` must both be set.
const FLAG_CRYPTO_API: u32 = 0x04;
const FLAG_AES: u32 = 0x20;

const CALG_AES_128: u32 = 0x660E;
const CALG_AES_192: u32 = 0x660F;
const CALG_AES_256: u32 = 0x6610;

#[derive(Debug)]
struct StandardHeader {
    key_bytes: usize,
    salt: [u8; SALT_SIZE],
    encrypted_verifier: [u8; BLOCK_SIZE],
    encrypted_verifier_hash: [u8; 32],
}

pub(super) fn decrypt(encryption_info: &[u8], encrypted_package: &[u8], password: &str) -> Result<Vec<u8>> {
    let header = parse_header(encryption_info)?;
    let key = derive_key(password, &header.salt, SPIN_COUNT, header.key_bytes);
    verify_password(&key, &header)?;

    let (size, ciphertext) = split_package_stream(encrypted_package, BLOCK_SIZE)?;
    let mut plain = ciphertext.to_vec();
    ecb_decrypt(&key, &mut plain)?;
    plain.truncate(size);
    Ok(plain)
}

struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        let bytes = self
            .pos
            .checked_add(len)
            .and_then(|end| self.data.get(self.pos..end))
            .ok_or_else(|| Error::CorruptPackage("EncryptionInfo stream is truncated".to_string()))?;
        self.pos += len;
        Ok(bytes)
    }

    fn u32(&mut self) -> Result<u32> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }
}

fn parse_header(info: &[u8]) -> Result<StandardHeader> {
    let mut cur = Cursor { data: info, pos: 4 };
    let flags = cur.u32()?;
    if flags & FLAG_CRYPTO_API == 0 {
        return Err(Error::UnsupportedEncryption("Standard encryption without CryptoAPI".to_string()));
    }
    if flags & FLAG_AES == 0 {
        return Err(Error::UnsupportedEncryption("Standard encryption with RC4".to_string()));
    }

    let header_size = cur.u32()? as usize;
    let header = cur.take(header_size)?;
    let mut fields = Cursor { data: header, pos: 0 };
    let _flags = fields.u32()?;
    let _size_extra = fields.u32()?;
    let alg_id = fields.u32()?;
    let _alg_id_hash = fields.u32()?;
    let key_bits = fields.u32()?;
    let expected_bits = match alg_id {
        CALG_AES_128 => 128,
        CALG_AES_192 => 192,
        CALG_AES_256 => 256,
        other => {
            return Err(Error::UnsupportedEncryption(format!("cipher algorithm id {other:#06x}")));
        },
    };
    if key_bits != expected_bits {
        return Err(Error::CorruptPackage(format!(
            "key size {key_bits} does not match algorithm id {alg_id:#06x}"
        )));
    }

    let salt_size = cur.u32()? as usize;
    if salt_size != SALT_SIZE {
        return Err(Error::CorruptPackage(format!("salt size {salt_size}")));
    }
    let mut salt = [0u8; SALT_SIZE];
    salt.copy_from_slice(cur.take(SALT_SIZE)?);
    let mut encrypted_verifier = [0u8; BLOCK_SIZE];
    encrypted_verifier.copy_from_slice(cur.take(BLOCK_SIZE)?);
    let hash_size = cur.u32()? as usize;
    if hash_size != SHA1_SIZE {
        return Err(Error::CorruptPackage(format!("verifier hash size {hash_size}")));
    }
    let mut encrypted_verifier_hash = [0u8; 32];
    encrypted_verifier_hash.copy_from_slice(cur.take(32)?);

    Ok(StandardHeader {
        key_bytes: key_bits as usize / 8,
        salt,
        encrypted_verifier,
        encrypted_verifier_hash,
    })
}

fn derive_key(password: &str, salt: &[u8], spin_count: u32, key_bytes: usize) -> Vec<u8> {
    let mut hash = Sha1::new().chain_update(salt).chain_update(password_to_utf16le(password)).finalize();
    for i in 0..spin_count {
        hash = Sha1::new().chain_update(i.to_le_bytes()).chain_update(hash).finalize();
    }
    let final_hash = Sha1::new().chain_update(hash).chain_update(0u32.to_le_bytes()).finalize();

    let mut derived = fill_and_xor(&final_hash, 0x36);
    derived.extend_from_slice(&fill_and_xor(&final_hash, 0x5c));
    derived.truncate(key_bytes);
    derived
}

fn fill_and_xor(hash: &[u8], fill: u8) -> Vec<u8> {
    let mut buf = [fill; 64];
    for (b, h) in buf.iter_mut().zip(hash) {
        *b ^= h;
    }
    Sha1::digest(buf).to_vec()
}

fn verify_password(key: &[u8], header: &StandardHeader) -> Result<()> {
    let mut verifier = header.encrypted_verifier;
    ecb_decrypt(key, &mut verifier)?;
    let mut verifier_hash = header.encrypted_verifier_hash;
    ecb_decrypt(key, &mut verifier_hash)?;

    if verifier_hash[..SHA1_SIZE] != Sha1::digest(verifier)[..] {
        return Err(Error::BadPassword);
    }
    Ok(())
}

fn ecb_decrypt(key: &[u8], data: &mut [u8]) -> Result<()> {
    fn run<C: BlockDecrypt + BlockCipher + KeyInit>(key: &[u8], data: &mut [u8]) -> Result<()> {
        let cipher = C::new_from_slice(key)
            .map_err(|_| Error::CorruptPackage("invalid AES key length".to_string()))?;
        for chunk in data.chunks_exact_mut(BLOCK_SIZE) {
            cipher.decrypt_block(GenericArray::from_mut_slice(chunk));
        }
        Ok(())
    }
    match key.len() {
        16 => run::<Aes128>(key, data),
        24 => run::<Aes192>(key, data),
        32 => run::<Aes256>(key, data),
        n => Err(Error::UnsupportedEncryption(format!("AES key of {n} bytes"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aes::cipher::BlockEncrypt;

    fn ecb_encrypt(key: &[u8], data: &mut [u8]) {
        let cipher = Aes128::new_from_slice(key).unwrap();
        for chunk in data.chunks_exact_mut(BLOCK_SIZE) {
            cipher.encrypt_block(GenericArray::from_mut_slice(chunk));
        }
    }

    /// Produce `EncryptionInfo` and `EncryptedPackage` the way Office 2007 does.
    fn encrypt(plain: &[u8], password: &str) -> (Vec<u8>, Vec<u8>) {
        let salt = [0x11u8; SALT_SIZE];
        let verifier = [0x22u8; BLOCK_SIZE];
        let key = derive_key(password, &salt, SPIN_COUNT, 16);

        let mut enc_verifier = verifier;
        ecb_encrypt(&key, &mut enc_verifier);
        let mut enc_hash = [0u8; 32];
        enc_hash[..SHA1_SIZE].copy_from_slice(&Sha1::digest(verifier));
        ecb_encrypt(&key, &mut enc_hash);

        let mut header = Vec::new();
        for v in [FLAG_CRYPTO_API | FLAG_AES, 0, CALG_AES_128, 0x8004, 128, 0x18, 0, 0] {
            header.extend_from_slice(&u32::to_le_bytes(v));
        }
        header.extend(
            "Microsoft Enhanced RSA and AES Cryptographic Provider\0"
                .encode_utf16()
                .flat_map(u16::to_le_bytes),
        );

        let mut info = Vec::new();
        info.extend_from_slice(&3u16.to_le_bytes());
        info.extend_from_slice(&2u16.to_le_bytes());
        info.extend_from_slice(&(FLAG_CRYPTO_API | FLAG_AES).to_le_bytes());
        info.extend_from_slice(&(header.len() as u32).to_le_bytes());
        info.extend_from_slice(&header);
        info.extend_from_slice(&(SALT_SIZE as u32).to_le_bytes());
        info.extend_from_slice(&salt);
        info.extend_from_slice(&enc_verifier);
        info.extend_from_slice(&(SHA1_SIZE as u32).to_le_bytes());
        info.extend_from_slice(&enc_hash);

        let mut body = plain.to_vec();
        body.resize(plain.len().div_ceil(BLOCK_SIZE) * BLOCK_SIZE, 0);
        ecb_encrypt(&key, &mut body);
        let mut package = (plain.len() as u64).to_le_bytes().to_vec();
        package.extend_from_slice(&body);
        (info, package)
    }

    #[test]
    fn test_decrypt() {
        let (info, package) = encrypt(b"PK\x03\x04 standard payload", "Password1");
        assert_eq!(decrypt(&info, &package, "Password1").unwrap(), b"PK\x03\x04 standard payload");
    }

    #[test]
    fn test_wrong_password() {
        let (info, package) = encrypt(b"payload", "Password1");
        assert!(matches!(decrypt(&info, &package, "password1"), Err(Error::BadPassword)));
    }

    #[test]
    fn test_rc4_is_unsupported() {
        let (mut info, package) = encrypt(b"payload", "pw");
        info[4..8].copy_from_slice(&FLAG_CRYPTO_API.to_le_bytes());
        assert!(matches!(decrypt(&info, &package, "pw"), Err(Error::UnsupportedEncryption(_))));
    }

    #[test]
    fn test_truncated_info() {
        let (info, package) = encrypt(b"payload", "pw");
        assert!(matches!(decrypt(&info[..40], &package, "pw"), Err(Error::CorruptPackage(_))));
    }
}

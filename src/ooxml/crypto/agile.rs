use super::ole_encrypted_package::build_ole_encrypted_package;
use super::{password_to_utf16le, split_package_stream};
use crate::common::error::{Error, Result};
use crate::common::xml::Attrs;
use aes::cipher::block_padding::NoPadding;
use aes::cipher::{BlockCipher, BlockDecryptMut, BlockEncryptMut, KeyInit, KeyIvInit};
use aes::{Aes128, Aes192, Aes256};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use hmac::{Hmac, Mac};
use quick_xml::Reader;
use quick_xml::events::Event;
use rand::TryRngCore;
use rand::rngs::OsRng;
use sha1::Sha1;
use sha2::{Digest, Sha512};

const AGILE_BLOCK_SIZE: usize = 16;
const AGILE_SALT_SIZE: usize = 16;
const AGILE_SEGMENT_SIZE: usize = 4096;
const AGILE_ENCRYPTION_VERSION_MAJOR: u16 = 4;
const AGILE_ENCRYPTION_VERSION_MINOR: u16 = 4;
const AGILE_ENCRYPTION_FLAGS: u32 = 0x0000_0040;
const MAX_SPIN_COUNT: u32 = 10_000_000;

const K_VERIFIER_INPUT_BLOCK: [u8; 8] = [0xfe, 0xa7, 0xd2, 0x76, 0x3b, 0x4b, 0x9e, 0x79];
const K_HASHED_VERIFIER_BLOCK: [u8; 8] = [0xd7, 0xaa, 0x0f, 0x6d, 0x30, 0x61, 0x34, 0x4e];
const K_CRYPTO_KEY_BLOCK: [u8; 8] = [0x14, 0x6e, 0x0b, 0xe7, 0xab, 0xac, 0xd0, 0xd6];
const K_INTEGRITY_KEY_BLOCK: [u8; 8] = [0x5f, 0xb2, 0xad, 0x01, 0x0c, 0xb9, 0xe1, 0xf6];
const K_INTEGRITY_VALUE_BLOCK: [u8; 8] = [0xa0, 0x67, 0x7f, 0x02, 0xb2, 0x2c, 0x84, 0x33];

/// Hash algorithms accepted in Agile descriptors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HashAlgorithm {
    Sha1,
    #[default]
    Sha512,
}

impl HashAlgorithm {
    /// Name used in the `hashAlgorithm` attribute.
    pub fn as_str(self) -> &'static str {
        match self {
            HashAlgorithm::Sha1 => "SHA1",
            HashAlgorithm::Sha512 => "SHA512",
        }
    }

    fn parse(name: &str) -> Option<Self> {
        match name {
            "SHA1" | "SHA-1" => Some(HashAlgorithm::Sha1),
            "SHA512" | "SHA-512" => Some(HashAlgorithm::Sha512),
            _ => None,
        }
    }

    pub fn digest_size(self) -> usize {
        match self {
            HashAlgorithm::Sha1 => 20,
            HashAlgorithm::Sha512 => 64,
        }
    }

    fn digest(self, parts: &[&[u8]]) -> Vec<u8> {
        fn run<D: Digest>(parts: &[&[u8]]) -> Vec<u8> {
            let mut hasher = D::new();
            for part in parts {
                hasher.update(part);
            }
            hasher.finalize().to_vec()
        }
        match self {
            HashAlgorithm::Sha1 => run::<Sha1>(parts),
            HashAlgorithm::Sha512 => run::<Sha512>(parts),
        }
    }

    fn hmac(self, key: &[u8], data: &[u8]) -> Result<Vec<u8>> {
        let invalid = |e: hmac::digest::InvalidLength| Error::InvalidOperation(format!("HMAC key: {e}"));
        Ok(match self {
            HashAlgorithm::Sha1 => {
                let mut mac = <Hmac<Sha1> as Mac>::new_from_slice(key).map_err(invalid)?;
                mac.update(data);
                mac.finalize().into_bytes().to_vec()
            },
            HashAlgorithm::Sha512 => {
                let mut mac = <Hmac<Sha512> as Mac>::new_from_slice(key).map_err(invalid)?;
                mac.update(data);
                mac.finalize().into_bytes().to_vec()
            },
        })
    }
}

/// Agile encryption settings used when saving.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgileParams {
    /// AES key size: 128, 192 or 256
    pub cipher_key_bits: u32,
    pub hash: HashAlgorithm,
    /// Password hash iterations
    pub spin_count: u32,
}

impl Default for AgileParams {
    fn default() -> Self {
        Self {
            cipher_key_bits: 256,
            hash: HashAlgorithm::Sha512,
            spin_count: 100_000,
        }
    }
}

impl AgileParams {
    fn validate(&self) -> Result<()> {
        if !matches!(self.cipher_key_bits, 128 | 192 | 256) {
            return Err(Error::UnsupportedEncryption(format!(
                "AES key size of {} bits",
                self.cipher_key_bits
            )));
        }
        if self.spin_count > MAX_SPIN_COUNT {
            return Err(Error::UnsupportedEncryption(format!("spin count {}", self.spin_count)));
        }
        Ok(())
    }
}

pub(super) fn encrypt(package_bytes: &[u8], password: &str, params: &AgileParams) -> Result<Vec<u8>> {
    params.validate()?;
    if package_bytes.is_empty() {
        return Err(Error::InvalidOperation("cannot encrypt an empty package".to_string()));
    }
    let hash = params.hash;
    let key_bytes = params.cipher_key_bits as usize / 8;

    let mut verifier_salt = [0u8; AGILE_SALT_SIZE];
    let mut verifier = [0u8; AGILE_SALT_SIZE];
    let mut key_salt = [0u8; AGILE_SALT_SIZE];
    let mut content_key = vec![0u8; key_bytes];
    let mut integrity_salt = vec![0u8; hash.digest_size()];
    for buf in [
        &mut verifier_salt[..],
        &mut verifier[..],
        &mut key_salt[..],
        &mut content_key[..],
        &mut integrity_salt[..],
    ] {
        OsRng
            .try_fill_bytes(buf)
            .map_err(|e| Error::InvalidOperation(format!("system random source failed: {e}")))?;
    }

    let pw_hash = hash_password(hash, password, &verifier_salt, params.spin_count);
    let password_key = |block_key: &[u8]| generate_key(hash, &pw_hash, block_key, key_bytes);
    let encrypted_verifier = cbc_encrypt(
        &password_key(&K_VERIFIER_INPUT_BLOCK),
        &verifier_salt,
        &pad_zero_to_block_multiple(&verifier),
    )?;
    let verifier_hash = hash.digest(&[&verifier]);
    let encrypted_verifier_hash = cbc_encrypt(
        &password_key(&K_HASHED_VERIFIER_BLOCK),
        &verifier_salt,
        &pad_zero_to_block_multiple(&verifier_hash),
    )?;
    let encrypted_key = cbc_encrypt(&password_key(&K_CRYPTO_KEY_BLOCK), &verifier_salt, &content_key)?;

    let encrypted_package = encrypt_package_stream(hash, &content_key, &key_salt, package_bytes)?;

    // The integrity salt is the HMAC key; both it and the HMAC are stored encrypted
    let encrypted_hmac_key = cbc_encrypt(
        &content_key,
        &generate_iv(hash, &key_salt, &K_INTEGRITY_KEY_BLOCK),
        &pad_zero_to_block_multiple(&integrity_salt),
    )?;
    let hmac_value = hash.hmac(&integrity_salt, &encrypted_package)?;
    let encrypted_hmac_value = cbc_encrypt(
        &content_key,
        &generate_iv(hash, &key_salt, &K_INTEGRITY_VALUE_BLOCK),
        &pad_zero_to_block_multiple(&hmac_value),
    )?;

    let xml = build_encryption_info_xml(
        params,
        &EncryptedValues {
            key_salt: &key_salt,
            verifier_salt: &verifier_salt,
            verifier: &encrypted_verifier,
            verifier_hash: &encrypted_verifier_hash,
            key: &encrypted_key,
            hmac_key: &encrypted_hmac_key,
            hmac_value: &encrypted_hmac_value,
        },
    );

    let mut encryption_info = Vec::with_capacity(8 + xml.len());
    encryption_info.extend_from_slice(&AGILE_ENCRYPTION_VERSION_MAJOR.to_le_bytes());
    encryption_info.extend_from_slice(&AGILE_ENCRYPTION_VERSION_MINOR.to_le_bytes());
    encryption_info.extend_from_slice(&AGILE_ENCRYPTION_FLAGS.to_le_bytes());
    encryption_info.extend_from_slice(xml.as_bytes());

    build_ole_encrypted_package(&encryption_info, &encrypted_package)
}

pub(super) fn decrypt(encryption_info: &[u8], encrypted_package: &[u8], password: &str) -> Result<Vec<u8>> {
    let descriptor = Descriptor::parse(&encryption_info[8..])?;
    let pk = &descriptor.password;
    let kd = &descriptor.key_data;

    let pw_hash = hash_password(pk.hash, password, &pk.salt, pk.spin_count);
    let key_bytes = pk.key_bits as usize / 8;
    let iv = pad_36_to_block(pk.salt.clone(), pk.block_size);
    let password_key = |block_key: &[u8]| generate_key(pk.hash, &pw_hash, block_key, key_bytes);

    let verifier_input = cbc_decrypt(&password_key(&K_VERIFIER_INPUT_BLOCK), &iv, &pk.encrypted_verifier_input)?;
    let verifier_hash = cbc_decrypt(&password_key(&K_HASHED_VERIFIER_BLOCK), &iv, &pk.encrypted_verifier_hash)?;
    let expected = pk.hash.digest(&[&verifier_input[..pk.salt.len().min(verifier_input.len())]]);
    if verifier_hash.get(..expected.len()) != Some(&expected[..]) {
        return Err(Error::BadPassword);
    }

    let mut content_key = cbc_decrypt(&password_key(&K_CRYPTO_KEY_BLOCK), &iv, &pk.encrypted_key)?;
    content_key.truncate(kd.key_bits as usize / 8);

    match (&descriptor.hmac_key, &descriptor.hmac_value) {
        (Some(hmac_key), Some(hmac_value)) => {
            let size = kd.hash.digest_size();
            let key = cbc_decrypt(
                &content_key,
                &generate_iv(kd.hash, &kd.salt, &K_INTEGRITY_KEY_BLOCK)[..kd.block_size],
                hmac_key,
            )?;
            let value = cbc_decrypt(
                &content_key,
                &generate_iv(kd.hash, &kd.salt, &K_INTEGRITY_VALUE_BLOCK)[..kd.block_size],
                hmac_value,
            )?;
            let actual = kd.hash.hmac(&key[..size.min(key.len())], encrypted_package)?;
            if value.get(..size) != Some(&actual[..]) {
                return Err(Error::CorruptPackage("data integrity check failed".to_string()));
            }
        },
        _ => log::warn!("encrypted package carries no data integrity block"),
    }

    decrypt_package_stream(kd, &content_key, encrypted_package)
}

/// `H(salt ‖ password)` followed by `spin_count` rounds of `H(LE32(i) ‖ H)`.
fn hash_password(hash: HashAlgorithm, password: &str, salt: &[u8], spin_count: u32) -> Vec<u8> {
    let mut current = hash.digest(&[salt, &password_to_utf16le(password)]);
    for i in 0..spin_count {
        current = hash.digest(&[&i.to_le_bytes(), &current]);
    }
    current
}

fn generate_key(hash: HashAlgorithm, password_hash: &[u8], block_key: &[u8], key_size: usize) -> Vec<u8> {
    let mut key = hash.digest(&[password_hash, block_key]);
    key.resize(key_size, 0x36);
    key
}

fn pad_36_to_block(mut iv: Vec<u8>, block_size: usize) -> Vec<u8> {
    iv.resize(block_size, 0x36);
    iv
}

fn generate_iv(hash: HashAlgorithm, key_salt: &[u8], block_key: &[u8]) -> Vec<u8> {
    pad_36_to_block(hash.digest(&[key_salt, block_key]), AGILE_BLOCK_SIZE)
}

fn pad_zero_to_block_multiple(input: &[u8]) -> Vec<u8> {
    let mut out = input.to_vec();
    out.resize(input.len().div_ceil(AGILE_BLOCK_SIZE).max(1) * AGILE_BLOCK_SIZE, 0);
    out
}

fn cbc_encrypt(key: &[u8], iv: &[u8], data: &[u8]) -> Result<Vec<u8>> {
    fn run<C: BlockEncryptMut + BlockCipher + KeyInit>(key: &[u8], iv: &[u8], data: &[u8]) -> Result<Vec<u8>> {
        let cipher = cbc::Encryptor::<C>::new_from_slices(key, iv)
            .map_err(|_| Error::InvalidOperation("invalid AES key or IV length".to_string()))?;
        Ok(cipher.encrypt_padded_vec_mut::<NoPadding>(data))
    }
    match key.len() {
        16 => run::<Aes128>(key, iv, data),
        24 => run::<Aes192>(key, iv, data),
        32 => run::<Aes256>(key, iv, data),
        n => Err(Error::UnsupportedEncryption(format!("AES key of {n} bytes"))),
    }
}

fn cbc_decrypt(key: &[u8], iv: &[u8], data: &[u8]) -> Result<Vec<u8>> {
    fn run<C: BlockDecryptMut + BlockCipher + KeyInit>(key: &[u8], iv: &[u8], data: &[u8]) -> Result<Vec<u8>> {
        let cipher = cbc::Decryptor::<C>::new_from_slices(key, iv)
            .map_err(|_| Error::CorruptPackage("invalid AES key or IV length".to_string()))?;
        cipher
            .decrypt_padded_vec_mut::<NoPadding>(data)
            .map_err(|_| Error::CorruptPackage("ciphertext is not a whole number of blocks".to_string()))
    }
    match key.len() {
        16 => run::<Aes128>(key, iv, data),
        24 => run::<Aes192>(key, iv, data),
        32 => run::<Aes256>(key, iv, data),
        n => Err(Error::UnsupportedEncryption(format!("AES key of {n} bytes"))),
    }
}

fn encrypt_package_stream(hash: HashAlgorithm, content_key: &[u8], key_salt: &[u8], plain: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(8 + plain.len() + AGILE_BLOCK_SIZE);
    // StreamSize, unencrypted
    out.extend_from_slice(&(plain.len() as u64).to_le_bytes());
    for (index, segment) in plain.chunks(AGILE_SEGMENT_SIZE).enumerate() {
        let iv = generate_iv(hash, key_salt, &(index as u32).to_le_bytes());
        let ct = cbc_encrypt(content_key, &iv, &pad_zero_to_block_multiple(segment))?;
        out.extend_from_slice(&ct);
    }
    Ok(out)
}

fn decrypt_package_stream(kd: &KeyData, content_key: &[u8], stream: &[u8]) -> Result<Vec<u8>> {
    let (size, ciphertext) = split_package_stream(stream, kd.block_size)?;
    let mut out = Vec::with_capacity(ciphertext.len());
    for (index, segment) in ciphertext.chunks(AGILE_SEGMENT_SIZE).enumerate() {
        let iv = generate_iv(kd.hash, &kd.salt, &(index as u32).to_le_bytes());
        out.extend_from_slice(&cbc_decrypt(content_key, &iv[..kd.block_size], segment)?);
    }
    out.truncate(size);
    Ok(out)
}

struct EncryptedValues<'a> {
    key_salt: &'a [u8],
    verifier_salt: &'a [u8],
    verifier: &'a [u8],
    verifier_hash: &'a [u8],
    key: &'a [u8],
    hmac_key: &'a [u8],
    hmac_value: &'a [u8],
}

fn build_encryption_info_xml(params: &AgileParams, values: &EncryptedValues<'_>) -> String {
    let b64 = |bytes: &[u8]| BASE64_STANDARD.encode(bytes);
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<encryption xmlns="http://schemas.microsoft.com/office/2006/encryption" xmlns:p="http://schemas.microsoft.com/office/2006/keyEncryptor/password"><keyData saltSize="{salt_sz}" blockSize="{blk_sz}" keyBits="{key_bits}" hashSize="{hash_sz}" cipherAlgorithm="AES" cipherChaining="ChainingModeCBC" hashAlgorithm="{hash}" saltValue="{key_salt}"/><dataIntegrity encryptedHmacKey="{enc_hmac_key}" encryptedHmacValue="{enc_hmac_val}"/><keyEncryptors><keyEncryptor uri="http://schemas.microsoft.com/office/2006/keyEncryptor/password"><p:encryptedKey spinCount="{spin}" saltSize="{salt_sz}" blockSize="{blk_sz}" keyBits="{key_bits}" hashSize="{hash_sz}" cipherAlgorithm="AES" cipherChaining="ChainingModeCBC" hashAlgorithm="{hash}" saltValue="{ver_salt}" encryptedVerifierHashInput="{enc_ver}" encryptedVerifierHashValue="{enc_ver_hash}" encryptedKeyValue="{enc_key}"/></keyEncryptor></keyEncryptors></encryption>"#,
        salt_sz = AGILE_SALT_SIZE,
        blk_sz = AGILE_BLOCK_SIZE,
        key_bits = params.cipher_key_bits,
        hash_sz = params.hash.digest_size(),
        hash = params.hash.as_str(),
        key_salt = b64(values.key_salt),
        ver_salt = b64(values.verifier_salt),
        enc_ver = b64(values.verifier),
        enc_ver_hash = b64(values.verifier_hash),
        enc_key = b64(values.key),
        enc_hmac_key = b64(values.hmac_key),
        enc_hmac_val = b64(values.hmac_value),
        spin = params.spin_count,
    )
}

/// `keyData` element: how the package itself is encrypted.
#[derive(Debug)]
struct KeyData {
    salt: Vec<u8>,
    block_size: usize,
    key_bits: u32,
    hash: HashAlgorithm,
}

/// Password key encryptor.
#[derive(Debug)]
struct PasswordKey {
    spin_count: u32,
    salt: Vec<u8>,
    block_size: usize,
    key_bits: u32,
    hash: HashAlgorithm,
    encrypted_verifier_input: Vec<u8>,
    encrypted_verifier_hash: Vec<u8>,
    encrypted_key: Vec<u8>,
}

#[derive(Debug)]
struct Descriptor {
    key_data: KeyData,
    password: PasswordKey,
    hmac_key: Option<Vec<u8>>,
    hmac_value: Option<Vec<u8>>,
}

impl Descriptor {
    fn parse(xml: &[u8]) -> Result<Self> {
        let xml = std::str::from_utf8(xml)
            .map_err(|_| Error::CorruptPackage("EncryptionInfo descriptor is not UTF-8".to_string()))?;
        let mut reader = Reader::from_str(xml.trim_start_matches('\u{feff}'));
        let mut key_data = None;
        let mut password = None;
        let (mut hmac_key, mut hmac_value) = (None, None);

        loop {
            match reader.read_event() {
                Ok(Event::Start(e) | Event::Empty(e)) => {
                    let attrs = Attrs::from_start(&e);
                    match e.local_name().as_ref() {
                        b"keyData" => key_data = Some(parse_key_data(&attrs)?),
                        b"dataIntegrity" => {
                            hmac_key = attrs.get("encryptedHmacKey").map(decode_base64).transpose()?;
                            hmac_value = attrs.get("encryptedHmacValue").map(decode_base64).transpose()?;
                        },
                        // Certificate encryptors use the same local name without a spin count
                        b"encryptedKey" if attrs.get("spinCount").is_some() && password.is_none() => {
                            password = Some(parse_password_key(&attrs)?);
                        },
                        _ => {},
                    }
                },
                Ok(Event::Eof) => break,
                Ok(_) => {},
                Err(e) => {
                    return Err(Error::CorruptPackage(format!("EncryptionInfo descriptor: {e}")));
                },
            }
        }

        Ok(Self {
            key_data: key_data.ok_or_else(|| Error::CorruptPackage("descriptor has no keyData".to_string()))?,
            password: password.ok_or_else(|| {
                Error::UnsupportedEncryption("no password key encryptor in descriptor".to_string())
            })?,
            hmac_key,
            hmac_value,
        })
    }
}

fn decode_base64(value: &str) -> Result<Vec<u8>> {
    BASE64_STANDARD
        .decode(value.trim())
        .map_err(|e| Error::CorruptPackage(format!("invalid base64 in descriptor: {e}")))
}

/// Cipher, chaining, hash and sizes shared by `keyData` and `encryptedKey`.
fn parse_cipher(attrs: &Attrs) -> Result<(HashAlgorithm, usize, u32, Vec<u8>)> {
    let cipher = attrs.get("cipherAlgorithm").unwrap_or_default();
    if cipher != "AES" {
        return Err(Error::UnsupportedEncryption(format!("cipher algorithm '{cipher}'")));
    }
    let chaining = attrs.get("cipherChaining").unwrap_or_default();
    if chaining != "ChainingModeCBC" {
        return Err(Error::UnsupportedEncryption(format!("cipher chaining '{chaining}'")));
    }
    let hash_name = attrs.get("hashAlgorithm").unwrap_or_default();
    let hash = HashAlgorithm::parse(hash_name)
        .ok_or_else(|| Error::UnsupportedEncryption(format!("hash algorithm '{hash_name}'")))?;
    let key_bits = number(attrs, "keyBits")?;
    if !matches!(key_bits, 128 | 192 | 256) {
        return Err(Error::UnsupportedEncryption(format!("AES key size of {key_bits} bits")));
    }
    let block_size = number(attrs, "blockSize")? as usize;
    if block_size != AGILE_BLOCK_SIZE {
        return Err(Error::CorruptPackage(format!("AES block size of {block_size} bytes")));
    }
    let salt = decode_base64(attrs.get("saltValue").unwrap_or_default())?;
    if salt.is_empty() {
        return Err(Error::CorruptPackage("empty salt in descriptor".to_string()));
    }
    Ok((hash, block_size, key_bits, salt))
}

fn number(attrs: &Attrs, name: &str) -> Result<u32> {
    attrs
        .parse::<u32>(name)
        .unwrap_or_else(|| Err(format!("attribute {name} is missing")))
        .map_err(|problem| Error::CorruptPackage(format!("EncryptionInfo descriptor: {problem}")))
}

fn parse_key_data(attrs: &Attrs) -> Result<KeyData> {
    let (hash, block_size, key_bits, salt) = parse_cipher(attrs)?;
    Ok(KeyData {
        salt,
        block_size,
        key_bits,
        hash,
    })
}

fn parse_password_key(attrs: &Attrs) -> Result<PasswordKey> {
    let (hash, block_size, key_bits, salt) = parse_cipher(attrs)?;
    let spin_count = number(attrs, "spinCount")?;
    if spin_count > MAX_SPIN_COUNT {
        return Err(Error::UnsupportedEncryption(format!("spin count {spin_count}")));
    }
    let field = |name: &str| decode_base64(attrs.get(name).unwrap_or_default());
    Ok(PasswordKey {
        spin_count,
        salt,
        block_size,
        key_bits,
        hash,
        encrypted_verifier_input: field("encryptedVerifierHashInput")?,
        encrypted_verifier_hash: field("encryptedVerifierHashValue")?,
        encrypted_key: field("encryptedKeyValue")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ole::OleReader;

    const FAST: AgileParams = AgileParams {
        cipher_key_bits: 256,
        hash: HashAlgorithm::Sha512,
        spin_count: 10,
    };

    fn streams(container: &[u8]) -> (Vec<u8>, Vec<u8>) {
        let ole = OleReader::open(container).unwrap();
        (
            ole.open_stream(&["EncryptionInfo"]).unwrap(),
            ole.open_stream(&["EncryptedPackage"]).unwrap(),
        )
    }

    #[test]
    fn test_round_trip_multi_segment() {
        let plain: Vec<u8> = (0..10_000u32).map(|i| (i % 251) as u8).collect();
        let container = encrypt(&plain, "secret", &FAST).unwrap();
        let (info, package) = streams(&container);
        assert_eq!(&info[..4], &[4, 0, 4, 0]);
        assert_eq!(u64::from_le_bytes(package[..8].try_into().unwrap()), plain.len() as u64);
        assert_eq!(decrypt(&info, &package, "secret").unwrap(), plain);
    }

    #[test]
    fn test_wrong_password() {
        let container = encrypt(b"PK\x03\x04data", "secret", &FAST).unwrap();
        let (info, package) = streams(&container);
        assert!(matches!(decrypt(&info, &package, "secretx"), Err(Error::BadPassword)));
    }

    #[test]
    fn test_sha1_aes128() {
        let params = AgileParams {
            cipher_key_bits: 128,
            hash: HashAlgorithm::Sha1,
            spin_count: 5,
        };
        let container = encrypt(b"workbook bytes", "pw", &params).unwrap();
        let (info, package) = streams(&container);
        let xml = std::str::from_utf8(&info[8..]).unwrap();
        assert!(xml.contains(r#"keyBits="128" hashSize="20""#));
        assert_eq!(decrypt(&info, &package, "pw").unwrap(), b"workbook bytes");
    }

    #[test]
    fn test_tampered_package_fails_integrity() {
        let container = encrypt(&[7u8; 5000], "pw", &FAST).unwrap();
        let (info, mut package) = streams(&container);
        let last = package.len() - 1;
        package[last] ^= 0xFF;
        assert!(matches!(decrypt(&info, &package, "pw"), Err(Error::CorruptPackage(_))));
    }

    #[test]
    fn test_rejects_bad_params() {
        let params = AgileParams {
            cipher_key_bits: 512,
            ..AgileParams::default()
        };
        assert!(matches!(encrypt(b"x", "pw", &params), Err(Error::UnsupportedEncryption(_))));
    }

    #[test]
    fn test_key_derivation_pads_and_truncates() {
        let key = generate_key(HashAlgorithm::Sha1, b"hash", &K_CRYPTO_KEY_BLOCK, 32);
        assert_eq!(key.len(), 32);
        assert_eq!(&key[20..], &[0x36; 12]);
        let key = generate_key(HashAlgorithm::Sha512, b"hash", &K_CRYPTO_KEY_BLOCK, 16);
        assert_eq!(key.len(), 16);
    }
}

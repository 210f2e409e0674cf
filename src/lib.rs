//! Litchi XLSX - reading and writing Excel Open XML workbooks
//!
//! This library loads `.xlsx` packages into an in-memory workbook model,
//! lets callers edit cells, styles and sheets, and saves the model back to a
//! package. Password-protected workbooks (a zip package encrypted inside a
//! compound file) are read and written as well.
//!
//! # Features
//!
//! - **OPC container**: parts, relationships and content types, with unknown
//!   parts carried through a load/save cycle unchanged
//! - **SpreadsheetML codec**: workbook, worksheets, shared strings, styles and
//!   document properties
//! - **Interned styles**: equal styles share one `cellXfs` index
//! - **Encryption** (`encryption` feature): Agile encryption on save, Agile
//!   and Standard encryption on open
//! - **Export**: CSV, JSON and Markdown views of the model
//! - **Import**: CSV/TSV loading with type detection
//!
//! # Example - Building and saving a workbook
//!
//! ```rust
//! use litchi_xlsx::{Color, Font, Style, Workbook};
//!
//! # fn main() -> litchi_xlsx::Result<()> {
//! let mut workbook = Workbook::new();
//! let bold = Style {
//!     font: Font { bold: true, color: Color::rgb("FF0000"), ..Font::default() },
//!     ..Style::default()
//! };
//! {
//!     let mut sheet = workbook.worksheet_mut("Sheet1")?;
//!     sheet.set_value("A1", "Hello")?;
//!     sheet.set_value("B1", 42.0)?;
//!     sheet.set_style("A2", &bold)?;
//! }
//! let bytes = litchi_xlsx::save(&workbook, None)?;
//! let reopened = litchi_xlsx::open(&bytes, None)?;
//! assert_eq!(reopened.worksheets().len(), 1);
//! # Ok(())
//! # }
//! ```
//!
//! # Example - Encrypted workbooks
//!
//! ```rust,no_run
//! use litchi_xlsx::{OpenOptions, SaveOptions, Workbook};
//!
//! # fn main() -> litchi_xlsx::Result<()> {
//! let workbook = Workbook::open_path("secret.xlsx", &OpenOptions::new().with_password("hunter2"))?;
//! workbook.save_path("copy.xlsx", &SaveOptions::new().with_password("hunter2"))?;
//! # Ok(())
//! # }
//! ```

/// Shared error types, container detection and XML helpers
pub mod common;

/// CSV, JSON and Markdown views of a workbook
pub mod export;

pub mod import;

/// Compound File Binary (OLE2) reader and writer
///
/// Used as the outer container of encrypted packages.
pub mod ole;

/// Office Open XML packaging, SpreadsheetML codec and encryption
pub mod ooxml;

/// In-memory workbook model
pub mod sheet;

use std::path::Path;

use common::detection::{ContainerFormat, detect_container};
use ooxml::opc::{OpcPackage, WriteOptions};

pub use common::error::{Error, Result};
#[cfg(feature = "encryption")]
pub use ooxml::crypto::{AgileParams, HashAlgorithm};
pub use sheet::{
    CachedValue, Cell, CellRef, CellValue, Color, ErrorCode, Font, ResolvedValue, Style, Value, Workbook, Worksheet,
};

/// Options for [`open_with`] and [`Workbook::open_path`].
#[derive(Debug, Clone, Default)]
pub struct OpenOptions {
    /// Password for encrypted workbooks
    pub password: Option<String>,
}

impl OpenOptions {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the password used to decrypt an encrypted workbook.
    #[inline]
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }
}

/// Options for [`save_with`] and [`Workbook::save_path`].
///
/// # Examples
///
/// ```rust
/// use litchi_xlsx::SaveOptions;
///
/// let options = SaveOptions::new().with_compression_level(Some(9));
/// assert!(options.password.is_none());
/// ```
#[derive(Debug, Clone)]
pub struct SaveOptions {
    /// Encrypt the package with this password
    pub password: Option<String>,
    /// Agile encryption parameters, used when `password` is set
    #[cfg(feature = "encryption")]
    pub encryption: AgileParams,
    /// Deflate level (0-9) for zip entries; `None` uses the codec default
    pub compression_level: Option<i64>,
}

impl Default for SaveOptions {
    fn default() -> Self {
        Self {
            password: None,
            #[cfg(feature = "encryption")]
            encryption: AgileParams::default(),
            compression_level: WriteOptions::default().compression_level,
        }
    }
}

impl SaveOptions {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Encrypt the saved package with `password`.
    #[inline]
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Override the Agile encryption parameters.
    #[cfg(feature = "encryption")]
    #[inline]
    pub fn with_encryption(mut self, params: AgileParams) -> Self {
        self.encryption = params;
        self
    }

    #[inline]
    pub fn with_compression_level(mut self, level: Option<i64>) -> Self {
        self.compression_level = level;
        self
    }
}

/// Load a workbook from `.xlsx` bytes, decrypting them when a password is given.
pub fn open(bytes: &[u8], password: Option<&str>) -> Result<Workbook> {
    let options = OpenOptions {
        password: password.map(str::to_string),
    };
    open_with(bytes, &options)
}

/// Load a workbook from `.xlsx` bytes.
pub fn open_with(bytes: &[u8], options: &OpenOptions) -> Result<Workbook> {
    match detect_container(bytes) {
        Some(ContainerFormat::Zip) => open_package(bytes),
        Some(ContainerFormat::CompoundFile) => {
            let password = options.password.as_deref().ok_or(Error::PasswordRequired)?;
            let package = decrypt(bytes, password)?;
            open_package(&package)
        },
        None => Err(Error::CorruptPackage(
            "input is neither a zip package nor a compound file".to_string(),
        )),
    }
}

fn open_package(bytes: &[u8]) -> Result<Workbook> {
    let package = OpcPackage::from_bytes(bytes)?;
    ooxml::xlsx::read_workbook(&package)
}

#[cfg(feature = "encryption")]
fn decrypt(container: &[u8], password: &str) -> Result<Vec<u8>> {
    ooxml::crypto::decrypt_package(container, password)
}

#[cfg(not(feature = "encryption"))]
fn decrypt(_container: &[u8], _password: &str) -> Result<Vec<u8>> {
    Err(Error::UnsupportedEncryption(
        "built without the `encryption` feature".to_string(),
    ))
}

/// Serialize a workbook to `.xlsx` bytes, encrypting them when a password is given.
pub fn save(workbook: &Workbook, password: Option<&str>) -> Result<Vec<u8>> {
    let options = SaveOptions {
        password: password.map(str::to_string),
        ..SaveOptions::default()
    };
    save_with(workbook, &options)
}

/// Serialize a workbook to `.xlsx` bytes.
pub fn save_with(workbook: &Workbook, options: &SaveOptions) -> Result<Vec<u8>> {
    let package = ooxml::xlsx::write_workbook(workbook)?;
    let bytes = package.to_bytes(&WriteOptions {
        compression_level: options.compression_level,
    })?;
    match &options.password {
        Some(password) => encrypt(&bytes, password, options),
        None => Ok(bytes),
    }
}

#[cfg(feature = "encryption")]
fn encrypt(package: &[u8], password: &str, options: &SaveOptions) -> Result<Vec<u8>> {
    ooxml::crypto::encrypt_package(package, password, &options.encryption)
}

#[cfg(not(feature = "encryption"))]
fn encrypt(_package: &[u8], _password: &str, _options: &SaveOptions) -> Result<Vec<u8>> {
    Err(Error::UnsupportedEncryption(
        "built without the `encryption` feature".to_string(),
    ))
}

impl Workbook {
    /// Load a workbook from bytes. See [`open_with`].
    pub fn open_with(bytes: &[u8], options: &OpenOptions) -> Result<Self> {
        open_with(bytes, options)
    }

    /// Read and load a workbook file.
    pub fn open_path<P: AsRef<Path>>(path: P, options: &OpenOptions) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        open_with(&bytes, options)
    }

    /// Serialize to bytes. See [`save_with`].
    pub fn save_with(&self, options: &SaveOptions) -> Result<Vec<u8>> {
        save_with(self, options)
    }

    /// Serialize and write to a file.
    pub fn save_path<P: AsRef<Path>>(&self, path: P, options: &SaveOptions) -> Result<()> {
        let bytes = save_with(self, options)?;
        std::fs::write(path, bytes)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_container() {
        assert!(matches!(open(b"plain text", None), Err(Error::CorruptPackage(_))));
        assert!(matches!(open(b"", None), Err(Error::CorruptPackage(_))));
    }

    #[test]
    fn test_compound_file_without_password() {
        let cfb = ole::OleWriter::new().to_bytes().unwrap();
        assert!(matches!(open(&cfb, None), Err(Error::PasswordRequired)));
    }

    #[cfg(feature = "encryption")]
    #[test]
    fn test_compound_file_without_encryption_info() {
        let mut writer = ole::OleWriter::new();
        writer.create_stream(&["WordDocument"], b"not a workbook").unwrap();
        let cfb = writer.to_bytes().unwrap();
        assert!(matches!(open(&cfb, Some("pw")), Err(Error::UnsupportedEncryption(_))));
    }

    #[test]
    fn test_save_options_builder() {
        let options = SaveOptions::new().with_password("pw").with_compression_level(None);
        assert_eq!(options.password.as_deref(), Some("pw"));
        assert_eq!(options.compression_level, None);
    }
}

//! Unified error type for workbook loading and saving.
//!
//! Every public operation reports failures through [`Error`]. Lower layers
//! (the compound file reader, the OPC container, the XML codecs) have their
//! own error enums which are folded into these kinds in `conversions`.
use thiserror::Error;

/// Main error type for workbook operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed cell or range reference
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// Stale or corrupt index into an intern table
    #[error("Index {index} out of range (table length {len})")]
    IndexOutOfRange { index: usize, len: usize },

    /// Zip directory unreadable or a relationship does not resolve
    #[error("Corrupt package: {0}")]
    CorruptPackage(String),

    /// Required XML content missing or unparsable
    #[error("Malformed part {part}: {}", problems.join("; "))]
    MalformedPart { part: String, problems: Vec<String> },

    /// Verifier mismatch while decrypting
    #[error("Incorrect password")]
    BadPassword,

    /// Encrypted input and no password supplied
    #[error("Workbook is encrypted and requires a password")]
    PasswordRequired,

    /// Encryption scheme variant that is not implemented
    #[error("Unsupported encryption: {0}")]
    UnsupportedEncryption(String),

    /// Worksheet name violates Excel's naming rules
    #[error("Invalid worksheet name {0:?}")]
    InvalidSheetName(String),

    /// Worksheet name already used in this workbook
    #[error("Duplicate worksheet name {0:?}")]
    DuplicateSheetName(String),

    /// No worksheet with the given name
    #[error("Worksheet not found: {0}")]
    SheetNotFound(String),

    /// Structural operation that would leave the workbook invalid
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// IO error at the file boundary
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Build a [`Error::MalformedPart`] for a single problem.
    pub fn malformed(part: impl Into<String>, problem: impl Into<String>) -> Self {
        Error::MalformedPart {
            part: part.into(),
            problems: vec![problem.into()],
        }
    }
}

/// Result type for workbook operations.
pub type Result<T> = std::result::Result<T, Error>;

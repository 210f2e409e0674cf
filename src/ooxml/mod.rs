//! Office Open XML support for spreadsheets.
//!
//! The module is organized into layers:
//!
//! 1. **OPC layer** (`opc`): zip package, parts, relationships and content types
//! 2. **SpreadsheetML codec** (`xlsx`): workbook model to and from parts
//! 3. **Encryption** (`crypto`): password-protected packages in a compound file
pub mod opc;
pub mod xlsx;

#[cfg(feature = "encryption")]
pub mod crypto;

pub use opc::{OpcPackage, PackURI};
pub use xlsx::{read_workbook, write_workbook};

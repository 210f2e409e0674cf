//! Compound File Binary (OLE2) containers.
//!
//! Encrypted workbooks are stored as a compound file holding the
//! `EncryptionInfo` and `EncryptedPackage` streams. [`OleReader`] reads such
//! a file from memory and [`OleWriter`] builds one.

pub mod consts;
mod error;
mod reader;
mod writer;

pub use error::OleError;
pub use reader::{OleReader, is_ole_file};
pub use writer::OleWriter;

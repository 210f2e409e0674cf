/// Open Packaging Conventions (OPC) implementation.
///
/// This module knows nothing about spreadsheets. It provides:
///
/// - Package structure (parts, relationships)
/// - Content type management
/// - Zip-based physical packaging with reproducible output
///
/// Parts are kept as raw bytes, which lets callers carry parts they do not
/// understand through a load/save cycle unchanged.
pub mod constants;
pub mod error;
pub mod package;
pub mod packuri;
pub mod part;
pub mod pkgreader;
pub mod pkgwriter;
pub mod rel;

// Re-export commonly used types
pub use error::OpcError;
pub use package::OpcPackage;
pub use packuri::PackURI;
pub use part::Part;
pub use pkgwriter::WriteOptions;
pub use rel::{Relationship, Relationships};

/// Error types for OPC package operations
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OpcError {
    #[error("Invalid pack URI: {0}")]
    InvalidPackUri(String),

    #[error("Part not found: {0}")]
    PartNotFound(String),

    #[error("Content type not found for partname: {0}")]
    ContentTypeNotFound(String),

    #[error("Relationship {r_id} in {source_uri} targets missing part {target}")]
    DanglingRelationship {
        source_uri: String,
        r_id: String,
        target: String,
    },

    #[error("Invalid relationship: {0}")]
    InvalidRelationship(String),

    #[error("XML parsing error in {part}: {message}")]
    XmlError { part: String, message: String },

    #[error("ZIP error: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl OpcError {
    pub(crate) fn xml(part: &str, err: impl std::fmt::Display) -> Self {
        OpcError::XmlError {
            part: part.to_string(),
            message: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, OpcError>;

use thiserror::Error;

/// Errors raised while reading or writing a compound file.
#[derive(Error, Debug)]
pub enum OleError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Not an OLE file")]
    NotOleFile,

    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    #[error("Corrupted file: {0}")]
    Corrupted(String),

    #[error("Stream not found: {0}")]
    StreamNotFound(String),

    #[error("Invalid entry name: {0}")]
    InvalidName(String),
}

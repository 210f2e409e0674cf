//! Unified error types.
//!
//! Errors from the compound file, OPC and crypto layers are converted into the
//! crate-level [`Error`] so that callers match on a single enum.

// Submodule declarations
pub mod conversions;
pub mod types;

// Re-exports
pub use types::{Error, Result};

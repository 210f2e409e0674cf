//! Common types and utilities shared by the container, codec and model layers.

pub mod detection;
pub mod error;
pub mod xml;

pub use detection::{ContainerFormat, detect_container};
pub use error::{Error, Result};

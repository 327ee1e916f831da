//! Error handling for sequence container parsing and conversion

use std::io;
use thiserror::Error;

/// Errors that can occur when working with RSEQ containers
#[derive(Debug, Error)]
pub enum RseqError {
    /// An I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A sequence version string with no corresponding converter
    #[error("version '{0}' is not currently supported")]
    UnsupportedVersion(String),

    /// A buffer access or layout failure from the shared model machinery
    #[error(transparent)]
    Buffer(#[from] studio_mdl::MdlError),

    /// The companion file does not hold the data the sequence declares
    #[error("External data error: {0}")]
    ExternalData(String),

    /// Error during version conversion
    #[error("Conversion error: {0}")]
    ConversionError(String),
}

/// Type alias for Results from sequence operations
pub type Result<T> = std::result::Result<T, RseqError>;

//! Error handling for model container parsing and conversion

use std::io;
use thiserror::Error;

/// Errors that can occur when working with MDL/RMDL containers
#[derive(Debug, Error)]
pub enum MdlError {
    /// An I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Invalid magic value in the file header
    #[error("Invalid magic value: expected '{expected}', found '{found}'")]
    InvalidMagic {
        /// The expected magic value
        expected: String,
        /// The actual magic value found
        found: String,
    },

    /// A container version with no corresponding converter
    #[error("MDL version {0} is not supported")]
    UnsupportedVersion(i32),

    /// A sub-version string that did not resolve to a known release
    #[error("version '{0}' is not currently supported")]
    UnsupportedSubVersion(String),

    /// The input buffer is too short for the layout being read
    #[error("Truncated input: need {needed} bytes at offset {offset}, buffer is {len} bytes")]
    Truncated {
        /// Absolute offset of the failed access
        offset: usize,
        /// Bytes required by the access
        needed: usize,
        /// Total buffer length
        len: usize,
    },

    /// An internally computed offset or size failed its bounds check.
    ///
    /// This indicates a defect in the layout tables, not bad input.
    #[error("Layout invariant violated for '{region}': offset {offset} + len {len} > buffer {buffer_len}")]
    LayoutError {
        /// Logical name of the offending region
        region: &'static str,
        /// Computed absolute offset
        offset: usize,
        /// Region length in bytes
        len: usize,
        /// Total buffer length the region must fit in
        buffer_len: usize,
    },

    /// Error during version conversion
    #[error("Conversion error: {0}")]
    ConversionError(String),
}

/// Type alias for Results from model operations
pub type Result<T> = std::result::Result<T, MdlError>;

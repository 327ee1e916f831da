//! Sequence container version handling
//!
//! Sequence files carry no universal magic; the version is supplied by
//! the operator, resolved against the recognized set below. The mapping
//! between runtime sequence indices and container versions follows the
//! published table: v7 covers s0-s6, v7.1 covers s7-s8, v10 covers
//! s9-s14, and v11 covers s15.

use crate::error::{Result, RseqError};

/// Supported sequence container versions
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum RseqVersion {
    /// rseq v7, the conversion target
    V7,
    /// rseq v7.1
    #[default]
    V7_1,
    /// rseq v10
    V10,
    /// rseq v11; recognized but no converter exists yet
    V11,
}

impl RseqVersion {
    /// Resolve a free-form version string.
    ///
    /// Whitespace is stripped, matching is case-insensitive, and an
    /// optional leading `v` is accepted. Unrecognized input is an error
    /// echoing the string verbatim; it is never silently defaulted.
    pub fn parse(input: &str) -> Result<Self> {
        let normalized: String = input
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_lowercase();
        let rest = normalized.strip_prefix('v').unwrap_or(&normalized);

        match rest {
            "7" | "7.0" => Ok(RseqVersion::V7),
            "7.1" | "71" => Ok(RseqVersion::V7_1),
            "10" => Ok(RseqVersion::V10),
            "11" => Ok(RseqVersion::V11),
            _ => Err(RseqError::UnsupportedVersion(input.to_string())),
        }
    }

    /// The human label used in progress output
    pub fn label(self) -> &'static str {
        match self {
            RseqVersion::V7 => "7",
            RseqVersion::V7_1 => "7.1",
            RseqVersion::V10 => "10",
            RseqVersion::V11 => "11",
        }
    }
}

impl std::fmt::Display for RseqVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

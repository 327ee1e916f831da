//! Container identification and version handling for model files

use crate::error::{MdlError, Result};

/// Magic tag at the start of every model container ('IDST')
pub const MDL_MAGIC: [u8; 4] = *b"IDST";

/// Reads the leading `(magic, version)` pair of a model container.
///
/// The first four bytes must equal [`MDL_MAGIC`]; the next four are the
/// little-endian signed version integer. Sequence files carry no universal
/// magic and are never identified through this function.
pub fn read_ident(buf: &[u8]) -> Result<i32> {
    if buf.len() < 8 {
        return Err(MdlError::Truncated {
            offset: 0,
            needed: 8,
            len: buf.len(),
        });
    }

    if buf[0..4] != MDL_MAGIC {
        return Err(MdlError::InvalidMagic {
            expected: String::from_utf8_lossy(&MDL_MAGIC).into_owned(),
            found: String::from_utf8_lossy(&buf[0..4]).into_owned(),
        });
    }

    Ok(i32::from_le_bytes([buf[4], buf[5], buf[6], buf[7]]))
}

/// Major model generations, keyed by the version integer in the header
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MdlVersion {
    /// Garry's Mod era models (v48)
    GarrysMod,
    /// Portal 2 era models (v49)
    Portal2,
    /// Titanfall models (v52)
    Titanfall,
    /// Titanfall 2 models (v53)
    Titanfall2,
    /// Apex Legends models (v54, the RMDL generation)
    ApexLegends,
}

impl MdlVersion {
    /// Create from the raw version integer in the file header
    pub fn from_raw(raw: i32) -> Result<Self> {
        match raw {
            48 => Ok(MdlVersion::GarrysMod),
            49 => Ok(MdlVersion::Portal2),
            52 => Ok(MdlVersion::Titanfall),
            53 => Ok(MdlVersion::Titanfall2),
            54 => Ok(MdlVersion::ApexLegends),
            _ => Err(MdlError::UnsupportedVersion(raw)),
        }
    }

    /// The version integer written into headers of this generation
    pub fn to_raw(self) -> i32 {
        match self {
            MdlVersion::GarrysMod => 48,
            MdlVersion::Portal2 => 49,
            MdlVersion::Titanfall => 52,
            MdlVersion::Titanfall2 => 53,
            MdlVersion::ApexLegends => 54,
        }
    }
}

impl std::fmt::Display for MdlVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "v{}", self.to_raw())
    }
}

/// Minor releases within the RMDL generation.
///
/// `Unknown` is a valid parse result and must be rejected by callers;
/// it is never silently defaulted to a supported release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RMdlSubVersion {
    /// rmdl v8
    V8,
    /// rmdl v12.0
    V12,
    /// rmdl v12.1
    V12_1,
    /// rmdl v12.2 - v12.5
    V12_2,
    /// rmdl v13 - v13.1
    V13,
    /// rmdl v14 - v14.1
    V14,
    /// Unrecognized sub-version string
    Unknown,
}

impl RMdlSubVersion {
    /// Resolve a free-form sub-version string to a canonical release.
    ///
    /// Whitespace is stripped and matching is case-insensitive. An optional
    /// leading `rmdl` family prefix and an optional leading `v` are removed
    /// before matching against the canonical table. Bare digits `1`..`6`
    /// are accepted as positional shorthand for the six releases, but only
    /// when no prefix was stripped, so that `rmdl1` is not misread as the
    /// first menu entry.
    pub fn parse(input: &str) -> Self {
        let normalized: String = input
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_lowercase();

        let mut rest = normalized.as_str();
        let mut stripped_prefix = false;

        if let Some(tail) = rest.strip_prefix("rmdl") {
            rest = tail;
            stripped_prefix = true;
        }
        if let Some(tail) = rest.strip_prefix('v') {
            rest = tail;
            stripped_prefix = true;
        }

        match rest {
            "8" => return RMdlSubVersion::V8,
            "12" | "12.0" => return RMdlSubVersion::V12,
            "12.1" | "121" => return RMdlSubVersion::V12_1,
            "12.2" | "122" => return RMdlSubVersion::V12_2,
            "13" | "13.0" => return RMdlSubVersion::V13,
            "14" | "14.0" | "14.1" | "141" => return RMdlSubVersion::V14,
            _ => {}
        }

        if !stripped_prefix {
            // Legacy numbered-menu input
            match rest {
                "1" => return RMdlSubVersion::V8,
                "2" => return RMdlSubVersion::V12,
                "3" => return RMdlSubVersion::V12_1,
                "4" => return RMdlSubVersion::V12_2,
                "5" => return RMdlSubVersion::V13,
                "6" => return RMdlSubVersion::V14,
                _ => {}
            }
        }

        RMdlSubVersion::Unknown
    }

    /// The human label used in progress output
    pub fn label(self) -> &'static str {
        match self {
            RMdlSubVersion::V8 => "8",
            RMdlSubVersion::V12 => "12",
            RMdlSubVersion::V12_1 => "12.1",
            RMdlSubVersion::V12_2 => "12.2",
            RMdlSubVersion::V13 => "13",
            RMdlSubVersion::V14 => "14",
            RMdlSubVersion::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for RMdlSubVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

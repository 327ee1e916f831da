//! Parser and version converter for studio model containers.
//!
//! This crate handles the binary model formats of several engine
//! generations: the legacy MDL family (v48, v49, v52, v53) and the modern
//! RMDL family (v54, minor releases 8 through 14), upgrading an old asset
//! into the layout a newer runtime expects.
//!
//! Conversion is a bespoke, per-version-pair affair: every supported pair
//! has an exact converter that reinterprets the source buffer under its
//! generation's fixed layout, replans the variable-length trailing
//! regions, rewrites every offset-valued field, and emits a fresh output
//! buffer. Nothing is converted in place and a failed bounds check aborts
//! with no output.
//!
//! # Examples
//!
//! ```no_run
//! use studio_mdl::{ConvertContext, MdlVersion, RMdlSubVersion, RawAsset};
//!
//! let data = std::fs::read("weapon.mdl").unwrap();
//! let asset = RawAsset::new(data);
//! let ctx = ConvertContext::new();
//!
//! let out = studio_mdl::convert(
//!     &ctx,
//!     &asset,
//!     MdlVersion::ApexLegends,
//!     RMdlSubVersion::V12_1,
//! )
//! .unwrap();
//! std::fs::write("weapon.mdl", out).unwrap();
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod anim;
pub mod buffer;
pub mod context;
pub mod convert;
pub mod error;
pub mod layout;
pub mod offsets;
pub mod reloc;
pub mod version;

pub use anim::{copy_anim_ref_data, sequence_blend_count};
pub use buffer::RawAsset;
pub use context::{ConvertContext, LogDomain};
pub use convert::{convert, default_target};
pub use error::{MdlError, Result};
pub use offsets::{OffsetEntry, OffsetTable};
pub use version::{MDL_MAGIC, MdlVersion, RMdlSubVersion, read_ident};

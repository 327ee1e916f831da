//! Parser and version converter for animation sequence containers.
//!
//! RSEQ files hold one sequence descriptor plus its data regions, and may
//! be paired with a `.rseq_ext` companion carrying externalized animation
//! data. This crate converts the v7.1 and v10 layouts down to the v7
//! target, folding companion data inline when it is present and
//! tolerating its absence.
//!
//! Sequence files carry no universal magic; classification is by filename
//! suffix and an operator-supplied version string, resolved by
//! [`RseqVersion::parse`].
//!
//! # Examples
//!
//! ```no_run
//! use studio_mdl::{ConvertContext, RawAsset};
//! use studio_rseq::RseqVersion;
//!
//! let seq = RawAsset::new(std::fs::read("run.rseq").unwrap());
//! let ext = std::fs::read("run.rseq_ext").ok();
//! let ctx = ConvertContext::new();
//!
//! let out = studio_rseq::convert(&ctx, &seq, ext.as_deref(), RseqVersion::V7_1).unwrap();
//! std::fs::write("run.rseq", out).unwrap();
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod convert;
pub mod error;
pub mod external;
pub mod layout;
pub mod version;

pub use convert::{convert, convert_rseq10_to_7, convert_rseq71_to_7};
pub use error::{Result, RseqError};
pub use external::companion_path;
pub use version::RseqVersion;

//! Sequence conversion command implementation
//!
//! Sequence files are selected by their `.rseq` suffix; there is no
//! content magic to check. The version comes from the option, an
//! interactive prompt, or the 7.1 default, and a `.rseq_ext` companion
//! sitting next to the input is folded into the output when present.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use log::info;

use studio_mdl::{ConvertContext, RawAsset};
use studio_rseq::{RseqVersion, companion_path};

use super::{interactive, prompt};

const RSEQ_VERSION_MENU: &str = "Please input the version of your sequence :\n\
     7:    s0,1,3,4,5,6\n\
     7.1:  s7,8\n\
     10:   s9,10,11,12,13,14\n\
     11:   s15\n> ";

/// Convert a sequence file in place
pub fn convert_sequence(path: &Path, seq: RawAsset, version: Option<String>) -> Result<()> {
    let version = resolve_version(version)?;

    if version == RseqVersion::V7 {
        info!("'{}' is already at the v7 target layout", path.display());
        return Ok(());
    }

    let ext_path = companion_path(path);
    let ext = if ext_path.exists() {
        info!("found sequence companion '{}'", ext_path.display());
        Some(
            fs::read(&ext_path)
                .with_context(|| format!("Failed to read {}", ext_path.display()))?,
        )
    } else {
        None
    };

    info!("converting rseq v{} '{}'", version, path.display());

    let ctx = ConvertContext::new();
    let out = studio_rseq::convert(&ctx, &seq, ext.as_deref(), version)
        .with_context(|| format!("Failed to convert {}", path.display()))?;

    fs::write(path, out).with_context(|| format!("Failed to write {}", path.display()))?;
    info!("wrote v7 sequence to '{}'", path.display());
    Ok(())
}

/// Option first, then the prompt, then the non-interactive default (7.1);
/// unrecognized strings are fatal and echoed back verbatim.
fn resolve_version(version: Option<String>) -> Result<RseqVersion> {
    let reply = match version {
        Some(v) => v,
        None if interactive() => prompt(RSEQ_VERSION_MENU)?,
        None => return Ok(RseqVersion::default()),
    };

    match RseqVersion::parse(&reply) {
        Ok(v) => Ok(v),
        Err(e) => bail!(e),
    }
}

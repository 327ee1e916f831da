//! Model conversion command implementations
//!
//! This is the dispatch layer: classify the input, resolve the RMDL
//! sub-version from the option or an interactive prompt, pick the
//! converter pair, and write the result. All fatal conditions propagate
//! as errors and terminate with a non-zero exit.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use log::info;

use studio_mdl::{ConvertContext, MdlError, MdlVersion, RMdlSubVersion, RawAsset, read_ident};

use super::{interactive, prompt};
use crate::commands::sequence;

const RMDL_VERSION_MENU: &str = "Please pick the source RMDL version range:\n \
     1:  rmdl v8\n \
     2:  rmdl v12\n \
     3:  rmdl v12.1\n \
     4:  rmdl v12.2 - v12.5\n \
     5:  rmdl v13 - v13.1\n \
     6:  rmdl v14 - v14.1\n> ";

/// `upgrade`: convert a model to an explicit target generation
pub fn execute_upgrade(
    model: PathBuf,
    target_version: i32,
    output_dir: Option<PathBuf>,
    version: Option<String>,
) -> Result<()> {
    let asset = load_model(&model)?;
    let source = classify_model(&asset)?;
    let target = MdlVersion::from_raw(target_version)
        .with_context(|| format!("invalid target version {target_version}"))?;

    let sub = resolve_sub_version(source, version)?;
    convert_and_write(&asset, source, target, sub, &model, output_dir.as_deref())
}

/// `convert`: auto-detect the source and upgrade to its defined target.
///
/// Files that do not carry the model magic fall through to the sequence
/// path when their suffix says so; anything else is rejected.
pub fn execute_auto(path: PathBuf, version: Option<String>) -> Result<()> {
    if !path.exists() {
        bail!("couldn't find input file '{}'", path.display());
    }

    let data = fs::read(&path).with_context(|| format!("Failed to read {}", path.display()))?;
    let asset = RawAsset::new(data);

    match read_ident(asset.as_bytes()) {
        Ok(raw) => {
            let source = MdlVersion::from_raw(raw)?;
            let target = studio_mdl::default_target(source);
            let sub = resolve_sub_version(source, version)?;
            convert_and_write(&asset, source, target, sub, &path, None)
        }
        Err(MdlError::InvalidMagic { .. } | MdlError::Truncated { .. })
            if path.extension().is_some_and(|e| e == "rseq") =>
        {
            sequence::convert_sequence(&path, asset, version)
        }
        Err(_) => {
            bail!("invalid input file. must be a valid .(r)mdl file with magic 'IDST'")
        }
    }
}

fn load_model(path: &Path) -> Result<RawAsset> {
    if !path.exists() {
        bail!("couldn't find input file '{}'", path.display());
    }
    let data = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(RawAsset::new(data))
}

fn classify_model(asset: &RawAsset) -> Result<MdlVersion> {
    let raw = read_ident(asset.as_bytes())
        .context("invalid input file. must be a valid .(r)mdl file with magic 'IDST'")?;
    Ok(MdlVersion::from_raw(raw)?)
}

/// The sub-version matters only for RMDL sources; resolve it from the
/// option, or interactively, echoing unrecognized input back verbatim.
fn resolve_sub_version(source: MdlVersion, version: Option<String>) -> Result<RMdlSubVersion> {
    if source != MdlVersion::ApexLegends {
        return Ok(RMdlSubVersion::Unknown);
    }

    let reply = match version {
        Some(v) => v,
        None if interactive() => prompt(RMDL_VERSION_MENU)?,
        None => "12.1".to_string(),
    };

    let sub = RMdlSubVersion::parse(&reply);
    if sub == RMdlSubVersion::Unknown {
        bail!("version '{reply}' is not currently supported");
    }
    info!("Input file is RMDL v{sub}. attempting conversion...");
    Ok(sub)
}

fn convert_and_write(
    asset: &RawAsset,
    source: MdlVersion,
    target: MdlVersion,
    sub: RMdlSubVersion,
    input: &Path,
    output_dir: Option<&Path>,
) -> Result<()> {
    info!("converting {} model '{}'", source, input.display());

    // animation rigs share the model container but take the rig phase
    let ctx = if input.extension().is_some_and(|e| e == "rrig") {
        ConvertContext::rig()
    } else {
        ConvertContext::new()
    };
    let out = studio_mdl::convert(&ctx, asset, target, sub)
        .with_context(|| format!("Failed to convert {} to {}", source, target))?;

    let out_path = output_path(input, output_dir)?;
    fs::write(&out_path, out)
        .with_context(|| format!("Failed to write {}", out_path.display()))?;

    info!("wrote {} model to '{}'", target, out_path.display());
    Ok(())
}

/// In place by default; under `--output-dir` the converted file keeps its
/// name in the given directory
fn output_path(input: &Path, output_dir: Option<&Path>) -> Result<PathBuf> {
    match output_dir {
        None => Ok(input.to_path_buf()),
        Some(dir) => {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create {}", dir.display()))?;
            let name = input
                .file_name()
                .with_context(|| format!("'{}' has no file name", input.display()))?;
            Ok(dir.join(name))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_path_defaults_in_place() {
        let p = output_path(Path::new("models/weapon.mdl"), None).unwrap();
        assert_eq!(p, Path::new("models/weapon.mdl"));
    }

    #[test]
    fn test_output_path_override_keeps_name() {
        let dir = tempfile::tempdir().unwrap();
        let p = output_path(Path::new("models/weapon.mdl"), Some(dir.path())).unwrap();
        assert_eq!(p, dir.path().join("weapon.mdl"));
    }

    #[test]
    fn test_missing_input_is_fatal_before_reading() {
        let err = execute_auto(PathBuf::from("/nonexistent/x.mdl"), None).unwrap_err();
        assert!(err.to_string().contains("couldn't find input file"));
    }

    #[test]
    fn test_non_model_non_sequence_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("junk.bin");
        fs::write(&path, b"not a model at all").unwrap();

        let err = execute_auto(path, None).unwrap_err();
        assert!(err.to_string().contains("invalid input file"));
    }
}

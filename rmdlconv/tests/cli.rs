//! Integration tests for the dispatch layer
//!
//! These drive the same handlers the binary runs, over real files in a
//! temporary directory, covering the end-to-end scenarios: legacy
//! auto-detection, sequence conversion with and without a companion, and
//! the rejection paths.

use std::fs;

use rmdlconv::commands::{model, sequence};
use studio_mdl::buffer::{RawAsset, put_i32};
use studio_mdl::layout::legacy::LegacyHeader;
use studio_mdl::{MdlVersion, read_ident};
use studio_rseq::layout::{EVENT_STRIDE_V7, V7_STRIDE, V71_STRIDE, field};

/// A minimal but well-formed v52 model
fn v52_model() -> Vec<u8> {
    let header_size = LegacyHeader::size_for(MdlVersion::Titanfall);
    let hdr = LegacyHeader {
        num_bones: 1,
        bone_index: header_size as i32,
        num_anim_refs: Some(0),
        anim_ref_index: Some(0),
        data_length: (header_size + 220) as i32,
        ..LegacyHeader::default()
    };
    let mut raw = Vec::new();
    hdr.write(&mut raw, MdlVersion::Titanfall).unwrap();
    raw.resize(header_size + 220, 0);
    raw
}

/// A v7.1 sequence with one external blend entry
fn v71_sequence() -> Vec<u8> {
    let blends = V71_STRIDE;
    let anim_data = blends + 8;
    let total = anim_data + 8;

    let mut raw = vec![0u8; total];
    put_i32(&mut raw, field::NUM_BLENDS, 2).unwrap();
    put_i32(&mut raw, field::ANIM_INDEX_OFFSET, blends as i32).unwrap();
    put_i32(&mut raw, field::GROUP_SIZE_0, 2).unwrap();
    put_i32(&mut raw, field::GROUP_SIZE_1, 1).unwrap();
    put_i32(&mut raw, field::EXTERNAL_DATA_OFFSET, 0).unwrap();
    put_i32(&mut raw, field::EXTERNAL_DATA_SIZE, 4).unwrap();
    put_i32(&mut raw, blends, anim_data as i32).unwrap();
    put_i32(&mut raw, blends + 4, -1).unwrap();
    raw
}

#[test]
fn auto_converts_legacy_model_in_place() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("door.mdl");
    fs::write(&path, v52_model()).unwrap();

    model::execute_auto(path.clone(), None).unwrap();

    let out = fs::read(&path).unwrap();
    assert_eq!(&out[0..4], b"IDST");
    assert_eq!(read_ident(&out).unwrap(), MdlVersion::Titanfall2.to_raw());
}

#[test]
fn upgrade_writes_into_output_dir() {
    let dir = tempfile::tempdir().unwrap();
    let out_dir = dir.path().join("converted");
    let path = dir.path().join("door.mdl");
    fs::write(&path, v52_model()).unwrap();

    model::execute_upgrade(path.clone(), 53, Some(out_dir.clone()), None).unwrap();

    // the input is untouched, the converted file keeps its name
    assert_eq!(read_ident(&fs::read(&path).unwrap()).unwrap(), 52);
    let out = fs::read(out_dir.join("door.mdl")).unwrap();
    assert_eq!(read_ident(&out).unwrap(), 53);
}

#[test]
fn upgrade_rejects_unsupported_pair() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("door.mdl");
    fs::write(&path, v52_model()).unwrap();

    // v52 has no path to 54
    let err = model::execute_upgrade(path, 54, None, None).unwrap_err();
    assert!(format!("{err:#}").contains("no conversion path"));
}

#[test]
fn sequence_with_companion_folds_it_in() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("run.rseq");
    fs::write(&path, v71_sequence()).unwrap();
    fs::write(dir.path().join("run.rseq_ext"), [0xEE, 0xEF, 0xF0, 0xF1]).unwrap();

    let seq = RawAsset::new(fs::read(&path).unwrap());
    sequence::convert_sequence(&path, seq, Some("7.1".to_string())).unwrap();

    let out = fs::read(&path).unwrap();
    let inline_len = v71_sequence().len() - (V71_STRIDE - V7_STRIDE);
    assert_eq!(out.len(), inline_len + 4);
    assert_eq!(&out[inline_len..], &[0xEE, 0xEF, 0xF0, 0xF1]);
}

#[test]
fn sequence_without_companion_still_succeeds() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("run.rseq");
    fs::write(&path, v71_sequence()).unwrap();

    let seq = RawAsset::new(fs::read(&path).unwrap());
    sequence::convert_sequence(&path, seq, Some("7.1".to_string())).unwrap();

    let out = fs::read(&path).unwrap();
    assert_eq!(out.len(), v71_sequence().len() - (V71_STRIDE - V7_STRIDE));

    // the external-only entry became an empty slot
    let buf = RawAsset::new(out);
    let blends = buf.read_i32_at(field::ANIM_INDEX_OFFSET).unwrap() as usize;
    assert_eq!(buf.read_i32_at(blends + 4).unwrap(), 0);
}

#[test]
fn sequence_already_at_target_is_left_alone() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("idle.rseq");
    let original = vec![0u8; V7_STRIDE + EVENT_STRIDE_V7];
    fs::write(&path, &original).unwrap();

    let seq = RawAsset::new(original.clone());
    sequence::convert_sequence(&path, seq, Some("7".to_string())).unwrap();
    assert_eq!(fs::read(&path).unwrap(), original);
}

#[test]
fn sequence_v11_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("new.rseq");
    fs::write(&path, v71_sequence()).unwrap();

    let seq = RawAsset::new(fs::read(&path).unwrap());
    let err = sequence::convert_sequence(&path, seq, Some("11".to_string())).unwrap_err();
    assert!(format!("{err:#}").contains("'11'"));
}

#[test]
fn rseq_suffix_routes_through_auto_detection() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("walk.rseq");
    fs::write(&path, v71_sequence()).unwrap();

    // no model magic + .rseq suffix selects the sequence path
    model::execute_auto(path.clone(), Some("7.1".to_string())).unwrap();
    let out = fs::read(&path).unwrap();
    assert_eq!(out.len(), v71_sequence().len() - (V71_STRIDE - V7_STRIDE));
}

#[test]
fn unknown_subversion_string_is_echoed() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pilot.rmdl");

    let header_size = 8;
    let mut raw = Vec::with_capacity(header_size);
    raw.extend_from_slice(b"IDST");
    raw.extend_from_slice(&54i32.to_le_bytes());
    raw.resize(512, 0);
    fs::write(&path, raw).unwrap();

    let err = model::execute_auto(path, Some("12.7".to_string())).unwrap_err();
    assert!(format!("{err:#}").contains("version '12.7' is not currently supported"));
}

#[test]
fn junk_file_is_rejected_without_output() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("texture.vtf");
    fs::write(&path, b"VTF\0junkjunkjunk").unwrap();

    let before = fs::read(&path).unwrap();
    let err = model::execute_auto(path.clone(), None).unwrap_err();
    assert!(format!("{err:#}").contains("invalid input file"));
    // nothing was written
    assert_eq!(fs::read(&path).unwrap(), before);
}

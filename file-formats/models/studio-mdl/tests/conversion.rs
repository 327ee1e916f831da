//! End-to-end conversion tests over synthetic model buffers
//!
//! Fixtures are authored with the same layout planner the converters use,
//! so region offsets in the sources are always self-consistent; the tests
//! then check the conversion laws: version fields, the total-size law,
//! offset bounds, count invariance, and the relocation of collision and
//! blend data.

use std::io::Cursor;

use pretty_assertions::assert_eq;
use studio_mdl::buffer::{put_i32, put_u16, put_u32};
use studio_mdl::layout::legacy::{self, LegacyHeader};
use studio_mdl::layout::rmdl::RMdlHeader;
use studio_mdl::layout::seqdesc;
use studio_mdl::layout::v10::{self, V10Header};
use studio_mdl::reloc::{
    COLL_HEADER_STRIDE, COLL_MODEL_HEADER_SIZE, SURFACE_PROP_STRIDE_OLD, plan,
};
use studio_mdl::{ConvertContext, MdlError, MdlVersion, RMdlSubVersion, RawAsset, read_ident};

const ANIM_REF_STRIDE: usize = 16;

/// A v53 model with two bones, one sequence (one event, a 2-wide blend),
/// an animation reference table, and a collision block with one surface
/// property named "dirt".
fn v53_fixture() -> RawAsset {
    let header_size = LegacyHeader::size_for(MdlVersion::Titanfall2);

    let seq_block_len = seqdesc::LEGACY_STRIDE + seqdesc::EVENT_STRIDE + 2 * legacy::BLEND_ENTRY_SIZE;
    let coll_len = COLL_MODEL_HEADER_SIZE + COLL_HEADER_STRIDE + 8;
    let props_len = SURFACE_PROP_STRIDE_OLD + 5; // one record + "dirt\0"

    let (table, total) = plan(
        header_size,
        &[
            ("bones", 2 * legacy::BONE_STRIDE_V52),
            ("hitbox_sets", 12),
            ("local_anims", 92),
            ("sequences", seq_block_len),
            ("anim_refs", ANIM_REF_STRIDE),
            ("textures", legacy::TEXTURE_STRIDE),
            ("skins", 2),
            ("body_parts", 16),
            ("string_table", 8),
            ("collision", coll_len),
            ("surface_props", props_len),
        ],
    );
    let at = |name: &str| table.get(name).unwrap().offset;

    let hdr = LegacyHeader {
        checksum: 0x00C0FFEE,
        data_length: total as i32,
        num_bones: 2,
        bone_index: at("bones") as i32,
        num_hitbox_sets: 1,
        hitbox_set_index: at("hitbox_sets") as i32,
        num_local_anim: 1,
        local_anim_index: at("local_anims") as i32,
        num_local_seq: 1,
        local_seq_index: at("sequences") as i32,
        num_textures: 1,
        texture_index: at("textures") as i32,
        num_skin_ref: 1,
        num_skin_families: 1,
        skin_index: at("skins") as i32,
        num_body_parts: 1,
        body_part_index: at("body_parts") as i32,
        surface_prop_index: 0,
        string_table_index: at("string_table") as i32,
        num_anim_refs: Some(1),
        anim_ref_index: Some(at("anim_refs") as i32),
        bvh_offset: Some(at("collision") as i32),
        ..LegacyHeader::default()
    };

    let mut raw = Vec::with_capacity(total);
    hdr.write(&mut raw, MdlVersion::Titanfall2).unwrap();
    raw.resize(total, 0);

    // bone records carry a marker in their first and last kept bytes
    let bones = at("bones");
    raw[bones] = 0xB0;
    raw[bones + 179] = 0xB1;
    raw[bones + legacy::BONE_STRIDE_V52] = 0xB2;

    // sequence descriptor: one event, 2x1 blend grid
    let seq = at("sequences");
    put_u32(&mut raw, seq + seqdesc::field::FLAGS, 0x0001).unwrap(); // LOOPING
    put_i32(&mut raw, seq + seqdesc::field::NUM_EVENTS, 1).unwrap();
    put_i32(
        &mut raw,
        seq + seqdesc::field::EVENT_OFFSET,
        seqdesc::LEGACY_STRIDE as i32,
    )
    .unwrap();
    put_i32(&mut raw, seq + seqdesc::field::NUM_BLENDS, 2).unwrap();
    put_i32(
        &mut raw,
        seq + seqdesc::field::ANIM_INDEX_OFFSET,
        (seqdesc::LEGACY_STRIDE + seqdesc::EVENT_STRIDE) as i32,
    )
    .unwrap();
    put_i32(&mut raw, seq + seqdesc::field::GROUP_SIZE_0, 2).unwrap();
    put_i32(&mut raw, seq + seqdesc::field::GROUP_SIZE_1, 1).unwrap();
    // event table marker
    raw[seq + seqdesc::LEGACY_STRIDE] = 0xE1;
    // 16-bit blend entries: animation 3 and the empty-slot sentinel
    let blends = seq + seqdesc::LEGACY_STRIDE + seqdesc::EVENT_STRIDE;
    put_u16(&mut raw, blends, 3).unwrap();
    put_u16(&mut raw, blends + 2, 0xFFFF).unwrap();

    // animation reference record
    let refs = at("anim_refs");
    put_i32(&mut raw, refs, 42).unwrap();

    // string table
    let strings = at("string_table");
    raw[strings..strings + 8].copy_from_slice(b"default\0");

    // collision block, absolute-offset convention
    let coll = at("collision");
    let headers_end = coll + COLL_MODEL_HEADER_SIZE + COLL_HEADER_STRIDE;
    let props = at("surface_props");
    let names = props + SURFACE_PROP_STRIDE_OLD;
    put_i32(&mut raw, coll, headers_end as i32).unwrap();
    put_i32(&mut raw, coll + 4, props as i32).unwrap();
    put_i32(&mut raw, coll + 8, names as i32).unwrap();
    put_i32(&mut raw, coll + 12, 1).unwrap();
    put_i32(&mut raw, coll + 16, 1).unwrap();
    let ch = coll + COLL_MODEL_HEADER_SIZE;
    put_i32(&mut raw, ch, headers_end as i32).unwrap();
    put_i32(&mut raw, ch + 4, (headers_end + 4) as i32).unwrap();
    put_i32(&mut raw, ch + 8, headers_end as i32).unwrap();
    put_u32(&mut raw, headers_end, 0xBAD_F00D).unwrap();

    // surface property: name offset relative to the collision base
    put_i32(&mut raw, props, (names - coll) as i32).unwrap();
    put_u16(&mut raw, props + 4, 5).unwrap();
    raw[names..names + 5].copy_from_slice(b"dirt\0");

    RawAsset::new(raw)
}

#[test]
fn upgrades_titanfall_to_next_generation() {
    // the oldest in-family legacy upgrade: v52 -> v53
    let old_size = LegacyHeader::size_for(MdlVersion::Titanfall);
    let hdr = LegacyHeader {
        num_bones: 1,
        bone_index: old_size as i32,
        num_anim_refs: Some(0),
        anim_ref_index: Some(0),
        data_length: (old_size + 220) as i32,
        ..LegacyHeader::default()
    };
    let mut raw = Vec::new();
    hdr.write(&mut raw, MdlVersion::Titanfall).unwrap();
    raw.resize(old_size + 220, 0);

    let ctx = ConvertContext::new();
    let out = studio_mdl::convert(
        &ctx,
        &RawAsset::new(raw),
        MdlVersion::Titanfall2,
        RMdlSubVersion::Unknown,
    )
    .unwrap();

    // magic unchanged, version advanced to the next supported generation
    assert_eq!(&out[0..4], b"IDST");
    assert_eq!(read_ident(&out).unwrap(), MdlVersion::Titanfall2.to_raw());
}

#[test]
fn converts_v53_to_modern_baseline() {
    let old = v53_fixture();
    let ctx = ConvertContext::new();
    let out = studio_mdl::convert(
        &ctx,
        &old,
        MdlVersion::ApexLegends,
        RMdlSubVersion::Unknown,
    )
    .unwrap();

    assert_eq!(read_ident(&out).unwrap(), MdlVersion::ApexLegends.to_raw());
    let new = V10Header::read(&mut Cursor::new(&out[8..])).unwrap();

    // size law: the header records the exact output length, and the first
    // region starts right after the fixed header
    assert_eq!(new.data_length as usize, out.len());
    assert_eq!(new.bone_index as usize, v10::HEADER_SIZE);

    // counts are invariant across the migration
    assert_eq!(new.num_bones, 2);
    assert_eq!(new.num_local_seq, 1);
    assert_eq!(new.num_textures, 1);

    let buf = RawAsset::new(out);

    // bone records truncated to the modern stride, prefix preserved
    let bones = new.bone_index as usize;
    assert_eq!(buf.as_bytes()[bones], 0xB0);
    assert_eq!(buf.as_bytes()[bones + 179], 0xB1);
    assert_eq!(buf.as_bytes()[bones + 180], 0xB2);

    // sequence block: descriptor widened, event table carried, blend
    // entries widened to 32 bits with the -1 sentinel preserved
    let seq = new.local_seq_index as usize;
    let event_off = buf.read_i32_at(seq + seqdesc::field::EVENT_OFFSET).unwrap() as usize;
    assert_eq!(event_off, seqdesc::MODERN_STRIDE);
    assert_eq!(buf.as_bytes()[seq + event_off], 0xE1);

    let blend_off = buf
        .read_i32_at(seq + seqdesc::field::ANIM_INDEX_OFFSET)
        .unwrap() as usize;
    assert_eq!(buf.read_i32_at(seq + blend_off).unwrap(), 3);
    assert_eq!(buf.read_i32_at(seq + blend_off + 4).unwrap(), -1);
    // the declared blend count is carried verbatim
    assert_eq!(buf.read_i32_at(seq + seqdesc::field::NUM_BLENDS).unwrap(), 2);

    // animation references copied for exactly num_local_seq records
    assert_eq!(buf.read_i32_at(new.anim_ref_index as usize).unwrap(), 42);
    assert_eq!(new.num_anim_refs, 1);

    // collision rebased: bvh headers now block-relative
    let coll = new.bvh_offset as usize;
    assert!(coll > 0);
    let ch = coll + COLL_MODEL_HEADER_SIZE;
    assert_eq!(
        buf.read_i32_at(ch).unwrap() as usize,
        COLL_MODEL_HEADER_SIZE + COLL_HEADER_STRIDE
    );
    // payload carried
    assert_eq!(
        buf.read_u32_at(coll + COLL_MODEL_HEADER_SIZE + COLL_HEADER_STRIDE)
            .unwrap(),
        0xBAD_F00D
    );

    // widened surface property still reaches its name
    let props = buf.read_i32_at(coll + 4).unwrap() as usize;
    let name_rel = buf.read_i32_at(props).unwrap() as usize;
    assert_eq!(buf.slice(props + name_rel, 4).unwrap(), b"dirt");

    // offset-bounds law over every offset field of the new header
    for offset in [
        new.bone_index,
        new.hitbox_set_index,
        new.local_anim_index,
        new.local_seq_index,
        new.anim_ref_index,
        new.texture_index,
        new.skin_index,
        new.body_part_index,
        new.string_table_index,
        new.bvh_offset,
    ] {
        assert!(offset >= 0);
        assert!((offset as usize) < buf.len());
    }
}

/// A minimal modern source at a given sub-version: two sequences with no
/// events or blends, one texture, a string table.
fn rmdl_fixture(sub: RMdlSubVersion) -> RawAsset {
    let header_size = RMdlHeader::size_for(sub);
    let (table, total) = plan(
        header_size,
        &[
            ("bones", 180),
            ("sequences", 2 * seqdesc::MODERN_STRIDE),
            ("anim_refs", 2 * ANIM_REF_STRIDE),
            ("textures", 24),
            ("string_table", 6),
        ],
    );
    let at = |name: &str| table.get(name).unwrap().offset;

    let hdr = RMdlHeader {
        checksum: 7,
        data_length: total as i32,
        num_bones: 1,
        bone_index: at("bones") as i32,
        num_local_seq: 2,
        local_seq_index: at("sequences") as i32,
        num_anim_refs: 2,
        anim_ref_index: at("anim_refs") as i32,
        num_textures: 1,
        texture_index: at("textures") as i32,
        string_table_index: at("string_table") as i32,
        ..RMdlHeader::default()
    };

    let mut raw = Vec::with_capacity(total);
    hdr.write(&mut raw, sub).unwrap();
    raw.resize(total, 0);

    let seq = at("sequences");
    put_u32(&mut raw, seq + seqdesc::field::FLAGS, 0x0020).unwrap(); // ALL_ZEROS
    raw[at("textures")] = 0x7E;
    RawAsset::new(raw)
}

#[test]
fn converts_v12_1_to_baseline_header_size() {
    // version string resolution feeding the shared 12.1-14 path
    let sub = RMdlSubVersion::parse("rmdl v12.1");
    assert_eq!(sub, RMdlSubVersion::V12_1);

    let old = rmdl_fixture(sub);
    let ctx = ConvertContext::new();
    let out = studio_mdl::convert(&ctx, &old, MdlVersion::ApexLegends, sub).unwrap();

    assert_eq!(read_ident(&out).unwrap(), 54);
    let new = V10Header::read(&mut Cursor::new(&out[8..])).unwrap();

    // the output matches the baseline fixed header size exactly
    assert_eq!(new.bone_index as usize, v10::HEADER_SIZE);
    assert_eq!(new.data_length as usize, out.len());
    assert_eq!(new.num_local_seq, 2);

    // modern-to-modern sequence blocks are carried verbatim
    let buf = RawAsset::new(out);
    let seq = new.local_seq_index as usize;
    assert_eq!(buf.read_u32_at(seq + seqdesc::field::FLAGS).unwrap(), 0x0020);
    assert_eq!(buf.as_bytes()[new.texture_index as usize], 0x7E);
}

#[test]
fn converts_every_shared_path_subversion() {
    let ctx = ConvertContext::new();
    for sub in [
        RMdlSubVersion::V12_2,
        RMdlSubVersion::V13,
        RMdlSubVersion::V14,
    ] {
        let old = rmdl_fixture(sub);
        let out = studio_mdl::convert(&ctx, &old, MdlVersion::ApexLegends, sub).unwrap();
        let new = V10Header::read(&mut Cursor::new(&out[8..])).unwrap();
        assert_eq!(new.bone_index as usize, v10::HEADER_SIZE, "{sub}");
    }
}

#[test]
fn rejects_wrong_magic() {
    let mut raw = b"RIFF".to_vec();
    raw.extend_from_slice(&54i32.to_le_bytes());
    raw.resize(512, 0);

    let err = read_ident(&raw).unwrap_err();
    assert!(matches!(err, MdlError::InvalidMagic { .. }));
}

#[test]
fn rejects_unknown_version_integer() {
    let mut raw = b"IDST".to_vec();
    raw.extend_from_slice(&51i32.to_le_bytes());
    raw.resize(512, 0);

    let ctx = ConvertContext::new();
    let err = studio_mdl::convert(
        &ctx,
        &RawAsset::new(raw),
        MdlVersion::ApexLegends,
        RMdlSubVersion::Unknown,
    )
    .unwrap_err();
    assert!(matches!(err, MdlError::UnsupportedVersion(51)));
}

#[test]
fn rejects_truncated_model() {
    // header claims more bones than the buffer can hold
    let old_size = LegacyHeader::size_for(MdlVersion::Titanfall2);
    let hdr = LegacyHeader {
        num_bones: 1000,
        bone_index: old_size as i32,
        num_anim_refs: Some(0),
        anim_ref_index: Some(0),
        bvh_offset: Some(0),
        ..LegacyHeader::default()
    };
    let mut raw = Vec::new();
    hdr.write(&mut raw, MdlVersion::Titanfall2).unwrap();
    raw.resize(old_size + 64, 0);

    let ctx = ConvertContext::new();
    let err = studio_mdl::convert(
        &ctx,
        &RawAsset::new(raw),
        MdlVersion::ApexLegends,
        RMdlSubVersion::Unknown,
    )
    .unwrap_err();
    assert!(matches!(err, MdlError::LayoutError { region: "bones", .. }));
}

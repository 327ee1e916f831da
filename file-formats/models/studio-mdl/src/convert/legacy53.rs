//! Titanfall 2 (v53) to the baseline modern layout
//!
//! The heaviest legacy upgrade: the header is restructured rather than
//! extended, the bone controller, cd-texture, and local node groups are
//! dropped, bone and texture records shrink to the modern strides, the
//! sequence block widens its blend tables from 16-bit to 32-bit indices,
//! and the collision block is rebased from the absolute-offset legacy
//! convention.

use std::io::Cursor;

use log::{debug, info};

use super::{
    abs_off, copy_records_truncated, copy_verbatim, count, entry, field_offset, finish,
    header_bytes, rebuild_seq_block_widened,
};
use crate::anim::{ANIM_REF_STRIDE, copy_anim_ref_data};
use crate::buffer::{RawAsset, copy_region};
use crate::context::ConvertContext;
use crate::error::{MdlError, Result};
use crate::layout::legacy::{self, LegacyHeader, TEXTURE_STRIDE};
use crate::layout::v10::{self, V10Header};
use crate::layout::{
    ANIM_DESC_STRIDE, ATTACHMENT_STRIDE, BODY_PART_STRIDE, HITBOX_SET_STRIDE, rmdl,
};
use crate::offsets::{OffsetEntry, OffsetTable, extent_to_next};
use crate::reloc::{self, SURFACE_PROP_STRIDE_NEW, SURFACE_PROP_STRIDE_OLD, convert_collision_data};
use crate::version::MdlVersion;

/// Upgrade a v53 model buffer to the baseline modern layout
pub fn convert_mdl53_to_54(ctx: &ConvertContext, old: &RawAsset) -> Result<Vec<u8>> {
    info!(target: ctx.target(), "converting MDL v53 to the v54 baseline layout");

    let mut cursor = Cursor::new(header_bytes(old)?);
    let hdr = LegacyHeader::read(&mut cursor, MdlVersion::Titanfall2)?;

    let num_bones = count(hdr.num_bones);
    let num_hitbox_sets = count(hdr.num_hitbox_sets);
    let num_local_anim = count(hdr.num_local_anim);
    let num_local_seq = count(hdr.num_local_seq);
    let num_textures = count(hdr.num_textures);
    let skins_len = count(hdr.num_skin_ref) * count(hdr.num_skin_families) * 2;
    let num_body_parts = count(hdr.num_body_parts);
    let num_attachments = count(hdr.num_local_attachments);
    let keyvalue_len = count(hdr.keyvalue_size);
    let bvh_offset = hdr.bvh_offset.unwrap_or(0);

    let known_offsets: Vec<usize> = [
        hdr.bone_index,
        hdr.bone_controller_index,
        hdr.hitbox_set_index,
        hdr.local_anim_index,
        hdr.local_seq_index,
        hdr.anim_ref_index.unwrap_or(0),
        hdr.texture_index,
        hdr.cd_texture_index,
        hdr.skin_index,
        hdr.body_part_index,
        hdr.local_attachment_index,
        hdr.local_node_index,
        hdr.local_node_name_index,
        hdr.keyvalue_index,
        hdr.string_table_index,
        bvh_offset,
    ]
    .iter()
    .filter(|&&v| v > 0)
    .map(|&v| v as usize)
    .collect();

    // Source trailing regions, in dependency order
    let old_bones = entry("bones", hdr.bone_index, num_bones * legacy::BONE_STRIDE_V52)?;
    let old_hitboxes = entry(
        "hitbox_sets",
        hdr.hitbox_set_index,
        num_hitbox_sets * HITBOX_SET_STRIDE,
    )?;
    let old_anims = entry(
        "local_anims",
        hdr.local_anim_index,
        num_local_anim * ANIM_DESC_STRIDE,
    )?;
    let old_seqs = entry(
        "sequences",
        hdr.local_seq_index,
        if num_local_seq > 0 {
            extent_to_next(abs_off(hdr.local_seq_index, "sequences")?, &known_offsets, old.len())
        } else {
            0
        },
    )?;
    let old_anim_refs = entry(
        "anim_refs",
        hdr.anim_ref_index.unwrap_or(0),
        if hdr.anim_ref_index.unwrap_or(0) > 0 {
            num_local_seq * ANIM_REF_STRIDE
        } else {
            0
        },
    )?;
    let old_textures = entry("textures", hdr.texture_index, num_textures * TEXTURE_STRIDE)?;
    let old_skins = entry("skins", hdr.skin_index, skins_len)?;
    let old_body_parts = entry(
        "body_parts",
        hdr.body_part_index,
        num_body_parts * BODY_PART_STRIDE,
    )?;
    let old_attachments = entry(
        "attachments",
        hdr.local_attachment_index,
        num_attachments * ATTACHMENT_STRIDE,
    )?;
    let old_strings = entry(
        "string_table",
        hdr.string_table_index,
        extent_to_next(
            abs_off(hdr.string_table_index, "string_table")?,
            &known_offsets,
            old.len(),
        ),
    )?;
    let old_keyvalues = entry("keyvalues", hdr.keyvalue_index, keyvalue_len)?;

    // The surface property region is addressed from inside the collision
    // model header, not from the fixed header.
    let (old_coll, old_props, prop_count) = if bvh_offset > 0 {
        let coll_base = abs_off(bvh_offset, "collision")?;
        let props_base = abs_off(old.read_i32_at(coll_base + 4)?, "surface_props")?;
        let n_props = count(old.read_i32_at(coll_base + 12)?);
        if props_base <= coll_base || props_base > old.len() {
            return Err(MdlError::LayoutError {
                region: "collision",
                offset: coll_base,
                len: props_base,
                buffer_len: old.len(),
            });
        }
        (
            OffsetEntry {
                name: "collision",
                offset: coll_base,
                len: props_base - coll_base,
            },
            OffsetEntry {
                name: "surface_props",
                offset: props_base,
                len: extent_to_next(props_base, &known_offsets, old.len()),
            },
            n_props,
        )
    } else {
        (
            OffsetEntry {
                name: "collision",
                offset: 0,
                len: 0,
            },
            OffsetEntry {
                name: "surface_props",
                offset: 0,
                len: 0,
            },
            0,
        )
    };

    let mut old_table = OffsetTable::new();
    for e in [
        &old_bones,
        &old_hitboxes,
        &old_anims,
        &old_seqs,
        &old_anim_refs,
        &old_textures,
        &old_skins,
        &old_body_parts,
        &old_attachments,
        &old_strings,
        &old_keyvalues,
        &old_coll,
        &old_props,
    ] {
        old_table.push(e.name, e.offset, e.len);
    }
    old_table.validate(old.len())?;

    let seq_block = rebuild_seq_block_widened(
        ctx,
        old,
        old_seqs.offset,
        old_seqs.len,
        num_local_seq,
    )?;
    debug!(
        target: ctx.target(),
        "widened {} blend entries across {num_local_seq} sequences",
        seq_block.total_blend_entries
    );

    // Target layout plan; counts are invariant, strides are the modern ones
    let new_header_size = v10::HEADER_SIZE;
    let (new_table, total) = reloc::plan(
        new_header_size,
        &[
            ("bones", num_bones * rmdl::BONE_STRIDE),
            ("hitbox_sets", old_hitboxes.len),
            ("local_anims", old_anims.len),
            ("sequences", seq_block.data.len()),
            ("anim_refs", num_local_seq * ANIM_REF_STRIDE),
            ("textures", num_textures * rmdl::TEXTURE_STRIDE),
            ("skins", skins_len),
            ("body_parts", old_body_parts.len),
            ("attachments", old_attachments.len),
            ("string_table", old_strings.len),
            ("keyvalues", keyvalue_len),
            ("phy", 0),
            ("collision", old_coll.len),
            (
                "surface_props",
                old_props.len + prop_count * (SURFACE_PROP_STRIDE_NEW - SURFACE_PROP_STRIDE_OLD),
            ),
            ("ext_seq_refs", 0),
            ("vg", 0),
        ],
    );

    let mut out = vec![0u8; total];

    copy_records_truncated(
        old,
        old_bones.offset,
        legacy::BONE_STRIDE_V52,
        &mut out,
        field_offset(&new_table, "bones"),
        rmdl::BONE_STRIDE,
        num_bones,
    )?;
    copy_verbatim(&mut out, &new_table, "hitbox_sets", old, &old_hitboxes)?;
    copy_verbatim(&mut out, &new_table, "local_anims", old, &old_anims)?;
    copy_region(
        &mut out,
        field_offset(&new_table, "sequences"),
        &seq_block.data,
        0,
        seq_block.data.len(),
    )?;

    if old_anim_refs.len > 0 {
        copy_anim_ref_data(
            ctx,
            old,
            old_anim_refs.offset,
            &mut out,
            field_offset(&new_table, "anim_refs"),
            num_local_seq,
        )?;
    }
    // a source without the table leaves the new one zero-initialized

    copy_records_truncated(
        old,
        old_textures.offset,
        TEXTURE_STRIDE,
        &mut out,
        field_offset(&new_table, "textures"),
        rmdl::TEXTURE_STRIDE,
        num_textures,
    )?;
    copy_verbatim(&mut out, &new_table, "skins", old, &old_skins)?;
    copy_verbatim(&mut out, &new_table, "body_parts", old, &old_body_parts)?;
    copy_verbatim(&mut out, &new_table, "attachments", old, &old_attachments)?;
    copy_verbatim(&mut out, &new_table, "string_table", old, &old_strings)?;
    copy_verbatim(&mut out, &new_table, "keyvalues", old, &old_keyvalues)?;

    if old_coll.len > 0 {
        convert_collision_data(ctx, old, &old_coll, &old_props, &mut out, &new_table)?;
    }

    let new_hdr = V10Header {
        checksum: hdr.checksum,
        name: hdr.name,
        data_length: total as i32,
        eyeposition: hdr.eyeposition,
        illumposition: hdr.illumposition,
        hull_min: hdr.hull_min,
        hull_max: hdr.hull_max,
        view_bbmin: hdr.view_bbmin,
        view_bbmax: hdr.view_bbmax,
        flags: hdr.flags,
        num_bones: hdr.num_bones,
        bone_index: field_offset(&new_table, "bones") as i32,
        num_hitbox_sets: hdr.num_hitbox_sets,
        hitbox_set_index: field_offset(&new_table, "hitbox_sets") as i32,
        num_local_anim: hdr.num_local_anim,
        local_anim_index: field_offset(&new_table, "local_anims") as i32,
        num_local_seq: hdr.num_local_seq,
        local_seq_index: field_offset(&new_table, "sequences") as i32,
        num_anim_refs: hdr.num_local_seq,
        anim_ref_index: field_offset(&new_table, "anim_refs") as i32,
        num_textures: hdr.num_textures,
        texture_index: field_offset(&new_table, "textures") as i32,
        num_skin_ref: hdr.num_skin_ref,
        num_skin_families: hdr.num_skin_families,
        skin_index: field_offset(&new_table, "skins") as i32,
        num_body_parts: hdr.num_body_parts,
        body_part_index: field_offset(&new_table, "body_parts") as i32,
        num_local_attachments: hdr.num_local_attachments,
        local_attachment_index: field_offset(&new_table, "attachments") as i32,
        surface_prop_index: hdr.surface_prop_index,
        keyvalue_index: field_offset(&new_table, "keyvalues") as i32,
        keyvalue_size: hdr.keyvalue_size,
        string_table_index: field_offset(&new_table, "string_table") as i32,
        phy_offset: 0,
        phy_size: 0,
        bvh_offset: field_offset(&new_table, "collision") as i32,
        num_ext_seq_refs: 0,
        ext_seq_ref_index: 0,
        vg_offset: 0,
        vg_size: 0,
    };

    let mut header_bytes = Vec::with_capacity(new_header_size);
    new_hdr.write(&mut header_bytes)?;
    if header_bytes.len() != new_header_size {
        return Err(MdlError::LayoutError {
            region: "header",
            offset: 0,
            len: new_header_size,
            buffer_len: header_bytes.len(),
        });
    }
    out[..new_header_size].copy_from_slice(&header_bytes);

    finish(&out, &new_table, total)?;
    Ok(out)
}

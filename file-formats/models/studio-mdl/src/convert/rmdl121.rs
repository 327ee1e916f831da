//! RMDL v12.1 through v14 to the baseline modern layout
//!
//! One shared path: these releases differ from each other only in a
//! handful of header fields, and from the target only in the fixed header
//! shape. Collision internals are already block-relative, so the
//! collision block takes the headers-only relocation. The per-triangle
//! AABB block (v12.2+) and the vertex-group LOD table (v13+) have no
//! counterpart in the target layout and are dropped.

use std::io::Cursor;

use log::{debug, info};

use super::{abs_off, copy_verbatim, count, entry, field_offset, finish, header_bytes};
use crate::anim::{ANIM_REF_STRIDE, copy_anim_ref_data};
use crate::buffer::RawAsset;
use crate::context::ConvertContext;
use crate::error::{MdlError, Result};
use crate::layout::rmdl::{BONE_STRIDE, EXT_SEQ_REF_STRIDE, RMdlHeader, TEXTURE_STRIDE};
use crate::layout::seqdesc;
use crate::layout::v10::{self, V10Header};
use crate::layout::{ANIM_DESC_STRIDE, ATTACHMENT_STRIDE, BODY_PART_STRIDE, HITBOX_SET_STRIDE};
use crate::offsets::{OffsetEntry, OffsetTable, extent_to_next};
use crate::reloc::{self, copy_collision_headers_only};
use crate::version::RMdlSubVersion;

/// Upgrade an RMDL v12.1 - v14 buffer to the baseline modern layout
pub fn convert_rmdl121_to_10(
    ctx: &ConvertContext,
    old: &RawAsset,
    sub: RMdlSubVersion,
) -> Result<Vec<u8>> {
    info!(
        target: ctx.target(),
        "converting RMDL v{sub} to the v10 baseline layout"
    );

    let mut cursor = Cursor::new(header_bytes(old)?);
    let hdr = RMdlHeader::read(&mut cursor, sub)?;

    let regions = ModernRegions::gather(old, &hdr)?;
    regions.validate(old)?;

    let new_header_size = v10::HEADER_SIZE;
    let (new_table, total) = reloc::plan(new_header_size, &regions.target_plan(0));

    let mut out = vec![0u8; total];
    regions.copy_common(ctx, old, &mut out, &new_table)?;

    if regions.collision.len > 0 {
        copy_collision_headers_only(
            ctx,
            old,
            &regions.collision,
            &regions.surface_props,
            &mut out,
            &new_table,
        )?;
    }

    if let Some(dropped) = hdr.per_tri_aabb_index.filter(|&v| v > 0) {
        debug!(
            target: ctx.target(),
            "dropping per-triangle AABB block at {dropped}; no counterpart in the target layout"
        );
    }

    let new_hdr = regions.build_v10_header(&hdr, &new_table, total);

    write_header(&new_hdr, &mut out, new_header_size)?;
    finish(&out, &new_table, total)?;
    Ok(out)
}

/// Source trailing regions shared by every modern release
pub(crate) struct ModernRegions {
    pub bones: OffsetEntry,
    pub hitbox_sets: OffsetEntry,
    pub local_anims: OffsetEntry,
    pub sequences: OffsetEntry,
    pub anim_refs: OffsetEntry,
    pub textures: OffsetEntry,
    pub skins: OffsetEntry,
    pub body_parts: OffsetEntry,
    pub attachments: OffsetEntry,
    pub string_table: OffsetEntry,
    pub keyvalues: OffsetEntry,
    pub phy: OffsetEntry,
    pub collision: OffsetEntry,
    pub surface_props: OffsetEntry,
    pub surface_prop_count: usize,
    pub ext_seq_refs: OffsetEntry,
    pub vg: OffsetEntry,
    pub num_local_seq: usize,
}

impl ModernRegions {
    pub(crate) fn gather(old: &RawAsset, hdr: &RMdlHeader) -> Result<Self> {
        let num_local_seq = count(hdr.num_local_seq);
        let skins_len = count(hdr.num_skin_ref) * count(hdr.num_skin_families) * 2;

        let known_offsets: Vec<usize> = [
            hdr.bone_index,
            hdr.hitbox_set_index,
            hdr.local_anim_index,
            hdr.local_seq_index,
            hdr.anim_ref_index,
            hdr.texture_index,
            hdr.skin_index,
            hdr.body_part_index,
            hdr.local_attachment_index,
            hdr.keyvalue_index,
            hdr.string_table_index,
            hdr.phy_offset.unwrap_or(0),
            hdr.bvh_offset,
            hdr.ext_seq_ref_index,
            hdr.vg_offset,
            hdr.per_tri_aabb_index.unwrap_or(0),
            hdr.vg_lod_index.unwrap_or(0),
        ]
        .iter()
        .filter(|&&v| v > 0)
        .map(|&v| v as usize)
        .collect();

        let sequences_len = if num_local_seq > 0 {
            extent_to_next(
                abs_off(hdr.local_seq_index, "sequences")?,
                &known_offsets,
                old.len(),
            )
        } else {
            0
        };
        if num_local_seq > 0 && sequences_len < num_local_seq * seqdesc::MODERN_STRIDE {
            return Err(MdlError::LayoutError {
                region: "sequences",
                offset: abs_off(hdr.local_seq_index, "sequences")?,
                len: num_local_seq * seqdesc::MODERN_STRIDE,
                buffer_len: old.len(),
            });
        }

        let (collision, surface_props, surface_prop_count) = if hdr.bvh_offset > 0 {
            let coll_base = abs_off(hdr.bvh_offset, "collision")?;
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

        Ok(Self {
            bones: entry("bones", hdr.bone_index, count(hdr.num_bones) * BONE_STRIDE)?,
            hitbox_sets: entry(
                "hitbox_sets",
                hdr.hitbox_set_index,
                count(hdr.num_hitbox_sets) * HITBOX_SET_STRIDE,
            )?,
            local_anims: entry(
                "local_anims",
                hdr.local_anim_index,
                count(hdr.num_local_anim) * ANIM_DESC_STRIDE,
            )?,
            sequences: entry("sequences", hdr.local_seq_index, sequences_len)?,
            anim_refs: entry(
                "anim_refs",
                hdr.anim_ref_index,
                if hdr.anim_ref_index > 0 {
                    num_local_seq * ANIM_REF_STRIDE
                } else {
                    0
                },
            )?,
            textures: entry(
                "textures",
                hdr.texture_index,
                count(hdr.num_textures) * TEXTURE_STRIDE,
            )?,
            skins: entry("skins", hdr.skin_index, skins_len)?,
            body_parts: entry(
                "body_parts",
                hdr.body_part_index,
                count(hdr.num_body_parts) * BODY_PART_STRIDE,
            )?,
            attachments: entry(
                "attachments",
                hdr.local_attachment_index,
                count(hdr.num_local_attachments) * ATTACHMENT_STRIDE,
            )?,
            string_table: entry(
                "string_table",
                hdr.string_table_index,
                extent_to_next(
                    abs_off(hdr.string_table_index, "string_table")?,
                    &known_offsets,
                    old.len(),
                ),
            )?,
            keyvalues: entry("keyvalues", hdr.keyvalue_index, count(hdr.keyvalue_size))?,
            phy: entry(
                "phy",
                hdr.phy_offset.unwrap_or(0),
                count(hdr.phy_size.unwrap_or(0)),
            )?,
            collision,
            surface_props,
            surface_prop_count,
            ext_seq_refs: entry(
                "ext_seq_refs",
                hdr.ext_seq_ref_index,
                count(hdr.num_ext_seq_refs) * EXT_SEQ_REF_STRIDE,
            )?,
            vg: entry("vg", hdr.vg_offset, count(hdr.vg_size))?,
            num_local_seq,
        })
    }

    pub(crate) fn validate(&self, old: &RawAsset) -> Result<()> {
        let mut table = OffsetTable::new();
        for e in self.all() {
            table.push(e.name, e.offset, e.len);
        }
        table.validate(old.len())
    }

    fn all(&self) -> [&OffsetEntry; 16] {
        [
            &self.bones,
            &self.hitbox_sets,
            &self.local_anims,
            &self.sequences,
            &self.anim_refs,
            &self.textures,
            &self.skins,
            &self.body_parts,
            &self.attachments,
            &self.string_table,
            &self.keyvalues,
            &self.phy,
            &self.collision,
            &self.surface_props,
            &self.ext_seq_refs,
            &self.vg,
        ]
    }

    /// Region lengths for the target plan, in the canonical dependency
    /// order. `surface_props_growth` is the extra room needed when the
    /// surface property records widen under a full collision conversion.
    pub(crate) fn target_plan(&self, surface_props_growth: usize) -> Vec<(&'static str, usize)> {
        vec![
            ("bones", self.bones.len),
            ("hitbox_sets", self.hitbox_sets.len),
            ("local_anims", self.local_anims.len),
            ("sequences", self.sequences.len),
            // the table is synthesized when the source lacked one
            ("anim_refs", self.num_local_seq * ANIM_REF_STRIDE),
            ("textures", self.textures.len),
            ("skins", self.skins.len),
            ("body_parts", self.body_parts.len),
            ("attachments", self.attachments.len),
            ("string_table", self.string_table.len),
            ("keyvalues", self.keyvalues.len),
            ("phy", self.phy.len),
            ("collision", self.collision.len),
            ("surface_props", self.surface_props.len + surface_props_growth),
            ("ext_seq_refs", self.ext_seq_refs.len),
            ("vg", self.vg.len),
        ]
    }

    /// Copy every region that is identical between the modern releases
    /// and the target: everything except the collision pair, which the
    /// caller relocates with the variant its source convention needs.
    pub(crate) fn copy_common(
        &self,
        ctx: &ConvertContext,
        old: &RawAsset,
        out: &mut [u8],
        new_table: &OffsetTable,
    ) -> Result<()> {
        copy_verbatim(out, new_table, "bones", old, &self.bones)?;
        copy_verbatim(out, new_table, "hitbox_sets", old, &self.hitbox_sets)?;
        copy_verbatim(out, new_table, "local_anims", old, &self.local_anims)?;
        copy_verbatim(out, new_table, "sequences", old, &self.sequences)?;

        if self.anim_refs.len > 0 {
            copy_anim_ref_data(
                ctx,
                old,
                self.anim_refs.offset,
                out,
                field_offset(new_table, "anim_refs"),
                self.num_local_seq,
            )?;
        }

        copy_verbatim(out, new_table, "textures", old, &self.textures)?;
        copy_verbatim(out, new_table, "skins", old, &self.skins)?;
        copy_verbatim(out, new_table, "body_parts", old, &self.body_parts)?;
        copy_verbatim(out, new_table, "attachments", old, &self.attachments)?;
        copy_verbatim(out, new_table, "string_table", old, &self.string_table)?;
        copy_verbatim(out, new_table, "keyvalues", old, &self.keyvalues)?;
        copy_verbatim(out, new_table, "phy", old, &self.phy)?;
        copy_verbatim(out, new_table, "ext_seq_refs", old, &self.ext_seq_refs)?;

        if self.vg.len > 0 {
            // vertex-group work logs under its own domain
            let vg_ctx = ctx.vg();
            log::debug!(target: vg_ctx.target(), "carrying vertex group blob ({} bytes)", self.vg.len);
            copy_verbatim(out, new_table, "vg", old, &self.vg)?;
        }

        Ok(())
    }

    /// Assemble the target header from the source header and the planned
    /// region offsets
    pub(crate) fn build_v10_header(
        &self,
        hdr: &RMdlHeader,
        new_table: &OffsetTable,
        total: usize,
    ) -> V10Header {
        V10Header {
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
            bone_index: field_offset(new_table, "bones") as i32,
            num_hitbox_sets: hdr.num_hitbox_sets,
            hitbox_set_index: field_offset(new_table, "hitbox_sets") as i32,
            num_local_anim: hdr.num_local_anim,
            local_anim_index: field_offset(new_table, "local_anims") as i32,
            num_local_seq: hdr.num_local_seq,
            local_seq_index: field_offset(new_table, "sequences") as i32,
            num_anim_refs: hdr.num_local_seq,
            anim_ref_index: field_offset(new_table, "anim_refs") as i32,
            num_textures: hdr.num_textures,
            texture_index: field_offset(new_table, "textures") as i32,
            num_skin_ref: hdr.num_skin_ref,
            num_skin_families: hdr.num_skin_families,
            skin_index: field_offset(new_table, "skins") as i32,
            num_body_parts: hdr.num_body_parts,
            body_part_index: field_offset(new_table, "body_parts") as i32,
            num_local_attachments: hdr.num_local_attachments,
            local_attachment_index: field_offset(new_table, "attachments") as i32,
            surface_prop_index: hdr.surface_prop_index,
            keyvalue_index: field_offset(new_table, "keyvalues") as i32,
            keyvalue_size: hdr.keyvalue_size,
            string_table_index: field_offset(new_table, "string_table") as i32,
            phy_offset: field_offset(new_table, "phy") as i32,
            phy_size: hdr.phy_size.unwrap_or(0),
            bvh_offset: field_offset(new_table, "collision") as i32,
            num_ext_seq_refs: hdr.num_ext_seq_refs,
            ext_seq_ref_index: field_offset(new_table, "ext_seq_refs") as i32,
            vg_offset: field_offset(new_table, "vg") as i32,
            vg_size: hdr.vg_size,
        }
    }
}

pub(crate) fn write_header(hdr: &V10Header, out: &mut [u8], new_header_size: usize) -> Result<()> {
    let mut header_bytes = Vec::with_capacity(new_header_size);
    hdr.write(&mut header_bytes)?;
    if header_bytes.len() != new_header_size {
        return Err(MdlError::LayoutError {
            region: "header",
            offset: 0,
            len: new_header_size,
            buffer_len: header_bytes.len(),
        });
    }
    out[..new_header_size].copy_from_slice(&header_bytes);
    Ok(())
}

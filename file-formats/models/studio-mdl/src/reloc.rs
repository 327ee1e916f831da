//! Relocation of offset-addressed trailing regions
//!
//! When a fixed header changes size between versions, every trailing
//! region shifts and every offset-valued field pointing at one must be
//! recomputed. The planner assigns new absolute offsets in a fixed
//! dependency order; the collision routines rewrite the offsets *inside*
//! the collision/BVH and surface-property regions, whose internal layout
//! is itself version-dependent.
//!
//! Region order is invariant: base tables (bones, sequences) come before
//! the collision/BVH block, collision before surface properties, surface
//! properties before external references. A dependent region is only ever
//! relocated against a base offset that the planner has already
//! finalized; the collision routines look their targets up in the planned
//! table and fail loudly if asked to run before that.

use log::debug;

use crate::buffer::{RawAsset, copy_region, put_i32, put_u16};
use crate::context::ConvertContext;
use crate::error::{MdlError, Result};
use crate::offsets::{OffsetEntry, OffsetTable};

/// Collision model header: three region offsets, the surface property
/// count, and the per-BVH header count
pub const COLL_MODEL_HEADER_SIZE: usize = 20;
/// Per-BVH collision header stride
pub const COLL_HEADER_STRIDE: usize = 32;
/// Surface property record stride in the full-relocation source layouts
pub const SURFACE_PROP_STRIDE_OLD: usize = 8;
/// Surface property record stride in the target layout
pub const SURFACE_PROP_STRIDE_NEW: usize = 12;

/// Assign new absolute offsets to every trailing region.
///
/// Regions are placed after the new fixed header in the order given,
/// 4-byte aligned, preserving the dependency order described in the
/// module docs. Empty regions get offset 0 and occupy no space. Returns
/// the planned table and the total output buffer length.
pub fn plan(new_header_size: usize, regions: &[(&'static str, usize)]) -> (OffsetTable, usize) {
    let mut table = OffsetTable::new();
    let mut cursor = new_header_size;

    for &(name, len) in regions {
        if len == 0 {
            table.push(name, 0, 0);
            continue;
        }
        cursor = align4(cursor);
        table.push(name, cursor, len);
        cursor += len;
    }

    (table, align4(cursor))
}

fn align4(v: usize) -> usize {
    (v + 3) & !3
}

fn finalized<'t>(table: &'t OffsetTable, name: &'static str) -> Result<&'t OffsetEntry> {
    table.get(name).ok_or(MdlError::LayoutError {
        region: name,
        offset: 0,
        len: 0,
        buffer_len: 0,
    })
}

/// Parsed collision model header
#[derive(Debug, Clone, Copy)]
struct CollModelHeader {
    content_masks_index: i32,
    surface_props_index: i32,
    surface_names_index: i32,
    surface_prop_count: i32,
    header_count: i32,
}

impl CollModelHeader {
    fn read(old: &RawAsset, base: usize) -> Result<Self> {
        Ok(Self {
            content_masks_index: old.read_i32_at(base)?,
            surface_props_index: old.read_i32_at(base + 4)?,
            surface_names_index: old.read_i32_at(base + 8)?,
            surface_prop_count: old.read_i32_at(base + 12)?,
            header_count: old.read_i32_at(base + 16)?,
        })
    }
}

/// Relocate a collision block whose internal layout already matches the
/// target convention.
///
/// Only the leading region offsets of the collision model header are
/// absolute and need fixing; per-BVH node, leaf, and vertex offsets are
/// block-relative and survive the move, so the payload and the surface
/// property region are copied verbatim.
pub fn copy_collision_headers_only(
    ctx: &ConvertContext,
    old: &RawAsset,
    old_coll: &OffsetEntry,
    old_props: &OffsetEntry,
    new: &mut [u8],
    new_table: &OffsetTable,
) -> Result<()> {
    let new_coll = *finalized(new_table, "collision")?;
    let new_props = *finalized(new_table, "surface_props")?;

    debug!(
        target: ctx.target(),
        "relocating collision block headers: {} -> {}", old_coll.offset, new_coll.offset
    );

    copy_region(
        new,
        new_coll.offset,
        old.as_bytes(),
        old_coll.offset,
        old_coll.len,
    )?;
    copy_region(
        new,
        new_props.offset,
        old.as_bytes(),
        old_props.offset,
        old_props.len,
    )?;

    let hdr = CollModelHeader::read(old, old_coll.offset)?;
    let coll_delta = new_coll.offset as i64 - old_coll.offset as i64;
    let props_delta = new_props.offset as i64 - old_props.offset as i64;

    put_i32(
        new,
        new_coll.offset,
        (hdr.content_masks_index as i64 + coll_delta) as i32,
    )?;
    put_i32(
        new,
        new_coll.offset + 4,
        (hdr.surface_props_index as i64 + props_delta) as i32,
    )?;
    put_i32(
        new,
        new_coll.offset + 8,
        (hdr.surface_names_index as i64 + props_delta) as i32,
    )?;

    Ok(())
}

/// Fully convert a collision block from the absolute-offset source
/// convention to the target convention.
///
/// Per-BVH node, leaf, and vertex offsets are rebased from file-absolute
/// to block-relative, and the surface property region is rewritten from
/// the old 8-byte record shape to the 12-byte target shape. The caller
/// must have finalized both regions in the planned table first; surface
/// property name offsets are expressed relative to the collision base in
/// the source and can only be resolved against a fixed collision offset.
pub fn convert_collision_data(
    ctx: &ConvertContext,
    old: &RawAsset,
    old_coll: &OffsetEntry,
    old_props: &OffsetEntry,
    new: &mut [u8],
    new_table: &OffsetTable,
) -> Result<()> {
    let new_coll = *finalized(new_table, "collision")?;
    let new_props = *finalized(new_table, "surface_props")?;

    let hdr = CollModelHeader::read(old, old_coll.offset)?;
    let header_count = usize::try_from(hdr.header_count.max(0)).unwrap_or(0);
    let prop_count = usize::try_from(hdr.surface_prop_count.max(0)).unwrap_or(0);

    debug!(
        target: ctx.target(),
        "converting collision block: {header_count} bvh headers, {prop_count} surface properties"
    );

    // The masks index must land inside the block and past the headers,
    // otherwise the input was not produced by a conforming compiler.
    let masks_abs = usize::try_from(hdr.content_masks_index).map_err(|_| bad_coll(old_coll))?;
    let headers_end = old_coll.offset + COLL_MODEL_HEADER_SIZE + header_count * COLL_HEADER_STRIDE;
    if masks_abs < headers_end || masks_abs > old_coll.end() {
        return Err(bad_coll(old_coll));
    }

    // Geometry payload (nodes, leaves, vertices) plus content masks,
    // copied verbatim; only the offsets that address it are rewritten.
    let payload_len = old_coll.end() - headers_end;
    copy_region(
        new,
        new_coll.offset + COLL_MODEL_HEADER_SIZE + header_count * COLL_HEADER_STRIDE,
        old.as_bytes(),
        headers_end,
        payload_len,
    )?;

    let coll_delta = new_coll.offset as i64 - old_coll.offset as i64;

    // Model header: masks stay file-absolute, props and names move to the
    // rewritten surface property region.
    put_i32(new, new_coll.offset, (masks_abs as i64 + coll_delta) as i32)?;
    put_i32(new, new_coll.offset + 4, new_props.offset as i32)?;
    put_i32(
        new,
        new_coll.offset + 8,
        (new_props.offset + prop_count * SURFACE_PROP_STRIDE_NEW) as i32,
    )?;
    put_i32(new, new_coll.offset + 12, hdr.surface_prop_count)?;
    put_i32(new, new_coll.offset + 16, hdr.header_count)?;

    // Per-BVH headers: rebase node/leaf/vertex offsets to the block base.
    for i in 0..header_count {
        let old_base = old_coll.offset + COLL_MODEL_HEADER_SIZE + i * COLL_HEADER_STRIDE;
        let new_base = new_coll.offset + COLL_MODEL_HEADER_SIZE + i * COLL_HEADER_STRIDE;

        for field in 0..3 {
            let abs = old.read_i32_at(old_base + field * 4)?;
            let abs = usize::try_from(abs).map_err(|_| bad_coll(old_coll))?;
            if abs < old_coll.offset || abs > old_coll.end() {
                return Err(bad_coll(old_coll));
            }
            put_i32(new, new_base + field * 4, (abs - old_coll.offset) as i32)?;
        }
        // origin, scale, reserved are position-independent
        copy_region(new, new_base + 12, old.as_bytes(), old_base + 12, 20)?;
    }

    convert_surface_properties(old, &hdr, old_coll, old_props, new, &new_props, prop_count)
}

/// Rewrite surface property records from the 8-byte source shape to the
/// 12-byte target shape and re-home their name offsets.
///
/// Source name offsets are relative to the collision base; target name
/// offsets are relative to the surface property region itself, with the
/// name payload packed directly after the widened records.
fn convert_surface_properties(
    old: &RawAsset,
    hdr: &CollModelHeader,
    old_coll: &OffsetEntry,
    old_props: &OffsetEntry,
    new: &mut [u8],
    new_props: &OffsetEntry,
    prop_count: usize,
) -> Result<()> {
    let old_records = usize::try_from(hdr.surface_props_index).map_err(|_| bad_coll(old_coll))?;
    let old_names = usize::try_from(hdr.surface_names_index).map_err(|_| bad_coll(old_coll))?;
    if old_records < old_props.offset
        || old_names < old_records + prop_count * SURFACE_PROP_STRIDE_OLD
        || old_names > old_props.end()
    {
        return Err(bad_props(old_props));
    }

    let names_len = old_props.end() - old_names;
    let new_names = new_props.offset + prop_count * SURFACE_PROP_STRIDE_NEW;

    for i in 0..prop_count {
        let old_rec = old_records + i * SURFACE_PROP_STRIDE_OLD;
        let new_rec = new_props.offset + i * SURFACE_PROP_STRIDE_NEW;

        let name_rel_coll = old.read_i32_at(old_rec)?;
        let name_abs = old_coll.offset as i64 + i64::from(name_rel_coll);
        if name_abs < old_names as i64 || name_abs > old_props.end() as i64 {
            return Err(bad_props(old_props));
        }
        let name_rel_region = (name_abs as usize - old_names) + prop_count * SURFACE_PROP_STRIDE_NEW;

        put_i32(new, new_rec, name_rel_region as i32)?;
        put_u16(new, new_rec + 4, old.read_u16_at(old_rec + 4)?)?;
        put_u16(new, new_rec + 6, 0)?; // flags, new in the target shape
        put_i32(new, new_rec + 8, 0)?; // thickness, new in the target shape
    }

    copy_region(new, new_names, old.as_bytes(), old_names, names_len)
}

fn bad_coll(entry: &OffsetEntry) -> MdlError {
    MdlError::LayoutError {
        region: "collision",
        offset: entry.offset,
        len: entry.len,
        buffer_len: entry.end(),
    }
}

fn bad_props(entry: &OffsetEntry) -> MdlError {
    MdlError::LayoutError {
        region: "surface_props",
        offset: entry.offset,
        len: entry.len,
        buffer_len: entry.end(),
    }
}

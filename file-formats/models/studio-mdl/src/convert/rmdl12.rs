//! RMDL v12.0 to the baseline modern layout
//!
//! v12.0 is the last release whose collision data stores file-absolute
//! internal offsets and the 8-byte surface property record. The collision
//! block therefore takes the full relocation: per-BVH offsets are rebased
//! to the block, and the surface property region is rewritten to the
//! widened target record, growing by four bytes per property.

use std::io::Cursor;

use log::info;

use super::{finish, header_bytes};
use super::rmdl121::{ModernRegions, write_header};
use crate::buffer::RawAsset;
use crate::context::ConvertContext;
use crate::error::Result;
use crate::layout::rmdl::RMdlHeader;
use crate::layout::v10;
use crate::reloc::{
    self, SURFACE_PROP_STRIDE_NEW, SURFACE_PROP_STRIDE_OLD, convert_collision_data,
};
use crate::version::RMdlSubVersion;

/// Upgrade an RMDL v12.0 buffer to the baseline modern layout
pub fn convert_rmdl12_to_10(ctx: &ConvertContext, old: &RawAsset) -> Result<Vec<u8>> {
    info!(target: ctx.target(), "converting RMDL v12 to the v10 baseline layout");

    let mut cursor = Cursor::new(header_bytes(old)?);
    let hdr = RMdlHeader::read(&mut cursor, RMdlSubVersion::V12)?;

    let regions = ModernRegions::gather(old, &hdr)?;
    regions.validate(old)?;

    let growth =
        regions.surface_prop_count * (SURFACE_PROP_STRIDE_NEW - SURFACE_PROP_STRIDE_OLD);

    let new_header_size = v10::HEADER_SIZE;
    let (new_table, total) = reloc::plan(new_header_size, &regions.target_plan(growth));

    let mut out = vec![0u8; total];
    regions.copy_common(ctx, old, &mut out, &new_table)?;

    if regions.collision.len > 0 {
        convert_collision_data(
            ctx,
            old,
            &regions.collision,
            &regions.surface_props,
            &mut out,
            &new_table,
        )?;
    }

    let new_hdr = regions.build_v10_header(&hdr, &new_table, total);
    write_header(&new_hdr, &mut out, new_header_size)?;
    finish(&out, &new_table, total)?;
    Ok(out)
}

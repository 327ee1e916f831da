//! RMDL v8 to the baseline modern layout
//!
//! The earliest modern release: no physics blob and no collision/BVH
//! block, so the conversion is a pure header restructure plus region
//! relocation. The physics and collision fields of the target stay empty.

use std::io::Cursor;

use log::info;

use super::{finish, header_bytes};
use super::rmdl121::{ModernRegions, write_header};
use crate::buffer::RawAsset;
use crate::context::ConvertContext;
use crate::error::Result;
use crate::layout::rmdl::RMdlHeader;
use crate::layout::v10;
use crate::reloc;
use crate::version::RMdlSubVersion;

/// Upgrade an RMDL v8 buffer to the baseline modern layout
pub fn convert_rmdl8_to_10(ctx: &ConvertContext, old: &RawAsset) -> Result<Vec<u8>> {
    info!(target: ctx.target(), "converting RMDL v8 to the v10 baseline layout");

    let mut cursor = Cursor::new(header_bytes(old)?);
    let hdr = RMdlHeader::read(&mut cursor, RMdlSubVersion::V8)?;

    if hdr.bvh_offset > 0 {
        return Err(crate::error::MdlError::ConversionError(
            "v8 models carry no collision block".to_string(),
        ));
    }

    let regions = ModernRegions::gather(old, &hdr)?;
    regions.validate(old)?;

    let new_header_size = v10::HEADER_SIZE;
    let (new_table, total) = reloc::plan(new_header_size, &regions.target_plan(0));

    let mut out = vec![0u8; total];
    regions.copy_common(ctx, old, &mut out, &new_table)?;

    let new_hdr = regions.build_v10_header(&hdr, &new_table, total);
    write_header(&new_hdr, &mut out, new_header_size)?;
    finish(&out, &new_table, total)?;
    Ok(out)
}

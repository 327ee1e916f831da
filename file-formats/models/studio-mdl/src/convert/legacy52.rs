//! Titanfall (v52) to Titanfall 2 (v53) upgrade
//!
//! The two generations share their field vocabulary and every record
//! stride; v53 only appends the collision block offset and two reserved
//! words to the fixed header. The whole trailing area therefore shifts by
//! the header growth and is otherwise carried verbatim, with every
//! absolute offset field rewritten by the same delta.

use log::info;

use super::{finish, header_bytes};
use crate::buffer::RawAsset;
use crate::context::ConvertContext;
use crate::error::Result;
use crate::layout::legacy::LegacyHeader;
use crate::offsets::OffsetTable;
use crate::version::MdlVersion;

/// Upgrade a v52 model buffer to the v53 layout
pub fn convert_mdl52_to_53(ctx: &ConvertContext, old: &RawAsset) -> Result<Vec<u8>> {
    info!(target: ctx.target(), "converting MDL v52 to v53");

    let mut cursor = std::io::Cursor::new(header_bytes(old)?);
    let mut hdr = LegacyHeader::read(&mut cursor, MdlVersion::Titanfall)?;

    let old_size = LegacyHeader::size_for(MdlVersion::Titanfall);
    let new_size = LegacyHeader::size_for(MdlVersion::Titanfall2);
    let delta = (new_size - old_size) as i32;

    let tail_len = old.len().saturating_sub(old_size);
    let total = new_size + tail_len;

    let shift = |v: i32| if v > 0 { v + delta } else { v };
    hdr.bone_index = shift(hdr.bone_index);
    hdr.bone_controller_index = shift(hdr.bone_controller_index);
    hdr.hitbox_set_index = shift(hdr.hitbox_set_index);
    hdr.local_anim_index = shift(hdr.local_anim_index);
    hdr.local_seq_index = shift(hdr.local_seq_index);
    hdr.texture_index = shift(hdr.texture_index);
    hdr.cd_texture_index = shift(hdr.cd_texture_index);
    hdr.skin_index = shift(hdr.skin_index);
    hdr.body_part_index = shift(hdr.body_part_index);
    hdr.local_attachment_index = shift(hdr.local_attachment_index);
    hdr.local_node_index = shift(hdr.local_node_index);
    hdr.local_node_name_index = shift(hdr.local_node_name_index);
    hdr.keyvalue_index = shift(hdr.keyvalue_index);
    hdr.include_model_index = shift(hdr.include_model_index);
    hdr.string_table_index = shift(hdr.string_table_index);
    hdr.anim_ref_index = hdr.anim_ref_index.map(shift);
    // surface_prop_index is relative to the string table and does not move

    hdr.bvh_offset = Some(0); // v52 models carry no collision block
    hdr.data_length = total as i32;

    let mut out = Vec::with_capacity(total);
    hdr.write(&mut out, MdlVersion::Titanfall2)?;
    if out.len() != new_size {
        return Err(crate::error::MdlError::LayoutError {
            region: "header",
            offset: 0,
            len: new_size,
            buffer_len: out.len(),
        });
    }
    out.extend_from_slice(&old.as_bytes()[old_size..]);

    let mut table = OffsetTable::new();
    table.push("tail", new_size, tail_len);
    finish(&out, &table, total)?;

    Ok(out)
}

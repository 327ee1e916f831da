//! Per-version-pair header converters
//!
//! Each supported ordered pair has a bespoke routine; there is no generic
//! schema engine. The pair set matches the dispatcher exactly:
//!
//! | source | target | routine |
//! |---|---|---|
//! | v48 | v54 | [`legacy48::convert_mdl48_to_54`] |
//! | v49 | v54 | [`legacy48::convert_mdl49_to_54`] |
//! | v52 | v53 | [`legacy52::convert_mdl52_to_53`] |
//! | v53 | v54 | [`legacy53::convert_mdl53_to_54`] |
//! | rmdl v8 | v10 | [`rmdl8::convert_rmdl8_to_10`] |
//! | rmdl v12.0 | v10 | [`rmdl12::convert_rmdl12_to_10`] |
//! | rmdl v12.1 - v14 | v10 | [`rmdl121::convert_rmdl121_to_10`] |
//!
//! Converters allocate a fresh output buffer sized by the relocation
//! planner and never write into the source; a size or bounds mismatch
//! after relocation is a layout-table defect and aborts the conversion.

pub mod legacy48;
pub mod legacy52;
pub mod legacy53;
pub mod rmdl8;
pub mod rmdl12;
pub mod rmdl121;

use crate::buffer::{RawAsset, copy_region, put_i32};
use crate::context::ConvertContext;
use crate::error::{MdlError, Result};
use crate::layout::rmdl::BLEND_ENTRY_SIZE;
use crate::layout::seqdesc::{self, SeqDescFields};
use crate::offsets::OffsetTable;
use crate::version::{MdlVersion, RMdlSubVersion, read_ident};

/// The upgrade target defined for each source generation
pub fn default_target(source: MdlVersion) -> MdlVersion {
    match source {
        MdlVersion::Titanfall => MdlVersion::Titanfall2,
        _ => MdlVersion::ApexLegends,
    }
}

/// Convert a classified model buffer to `target`.
///
/// `sub` is consulted only when the source is the modern generation; for
/// every other pair it is ignored. The returned buffer is fully
/// materialized and internally consistent, or an error is raised and no
/// output exists.
pub fn convert(
    ctx: &ConvertContext,
    asset: &RawAsset,
    target: MdlVersion,
    sub: RMdlSubVersion,
) -> Result<Vec<u8>> {
    let source = MdlVersion::from_raw(read_ident(asset.as_bytes())?)?;

    match (source, target) {
        (MdlVersion::GarrysMod, MdlVersion::ApexLegends) => {
            legacy48::convert_mdl48_to_54(ctx, asset)
        }
        (MdlVersion::Portal2, MdlVersion::ApexLegends) => legacy48::convert_mdl49_to_54(ctx, asset),
        (MdlVersion::Titanfall, MdlVersion::Titanfall2) => legacy52::convert_mdl52_to_53(ctx, asset),
        (MdlVersion::Titanfall2, MdlVersion::ApexLegends) => {
            legacy53::convert_mdl53_to_54(ctx, asset)
        }
        (MdlVersion::ApexLegends, MdlVersion::ApexLegends) => match sub {
            RMdlSubVersion::V8 => rmdl8::convert_rmdl8_to_10(ctx, asset),
            RMdlSubVersion::V12 => rmdl12::convert_rmdl12_to_10(ctx, asset),
            RMdlSubVersion::V12_1
            | RMdlSubVersion::V12_2
            | RMdlSubVersion::V13
            | RMdlSubVersion::V14 => rmdl121::convert_rmdl121_to_10(ctx, asset, sub),
            RMdlSubVersion::Unknown => {
                Err(MdlError::UnsupportedSubVersion("unknown".to_string()))
            }
        },
        (from, to) => Err(MdlError::ConversionError(format!(
            "no conversion path from {from} to {to}"
        ))),
    }
}

/// The bytes that follow the 8-byte ident, bounds-checked
pub(crate) fn header_bytes(old: &RawAsset) -> Result<&[u8]> {
    old.slice(8, old.len().saturating_sub(8))
}

/// Planned offset of a region; empty regions sit at offset 0
pub(crate) fn field_offset(table: &OffsetTable, name: &'static str) -> usize {
    table.get(name).map_or(0, |e| e.offset)
}

/// Build an old-layout region entry from a header offset field and a
/// computed length; empty regions normalize to `(0, 0)`
pub(crate) fn entry(
    name: &'static str,
    offset_field: i32,
    len: usize,
) -> Result<crate::offsets::OffsetEntry> {
    if len == 0 {
        return Ok(crate::offsets::OffsetEntry {
            name,
            offset: 0,
            len: 0,
        });
    }
    Ok(crate::offsets::OffsetEntry {
        name,
        offset: abs_off(offset_field, name)?,
        len,
    })
}

/// Copy an unchanged region into its planned position
pub(crate) fn copy_verbatim(
    out: &mut [u8],
    new_table: &OffsetTable,
    name: &'static str,
    old: &RawAsset,
    old_entry: &crate::offsets::OffsetEntry,
) -> Result<()> {
    if old_entry.len == 0 {
        return Ok(());
    }
    copy_region(
        out,
        field_offset(new_table, name),
        old.as_bytes(),
        old_entry.offset,
        old_entry.len,
    )
}

/// Interpret a header offset field as an absolute buffer position
pub(crate) fn abs_off(value: i32, region: &'static str) -> Result<usize> {
    usize::try_from(value).map_err(|_| MdlError::LayoutError {
        region,
        offset: 0,
        len: value.unsigned_abs() as usize,
        buffer_len: 0,
    })
}

/// Interpret a header count field, clamping junk negatives to zero
pub(crate) fn count(value: i32) -> usize {
    usize::try_from(value).unwrap_or(0)
}

/// Copy `n` fixed-stride records between buffers whose record shapes
/// share a common prefix.
///
/// Each record keeps `min(old_stride, new_stride)` bytes; fields past the
/// prefix are dropped when shrinking and stay zero-initialized when
/// growing.
pub(crate) fn copy_records_truncated(
    old: &RawAsset,
    old_offset: usize,
    old_stride: usize,
    new: &mut [u8],
    new_offset: usize,
    new_stride: usize,
    n: usize,
) -> Result<()> {
    let keep = old_stride.min(new_stride);
    for i in 0..n {
        copy_region(
            new,
            new_offset + i * new_stride,
            old.as_bytes(),
            old_offset + i * old_stride,
            keep,
        )?;
    }
    Ok(())
}

/// A sequence block rebuilt in the modern layout
pub(crate) struct RebuiltSeqBlock {
    /// The finished block bytes
    pub data: Vec<u8>,
    /// Blend entries allocated across all sequences
    pub total_blend_entries: usize,
}

/// Rebuild a legacy sequence block in the modern layout.
///
/// Descriptors widen from the legacy to the modern stride; each
/// sequence's event table is carried over and its blend table widens from
/// 16-bit to 32-bit animation indices, sized by the blend count the
/// descriptor implies. All sub-offsets are relative to the block base and
/// are recomputed for the new interior layout.
pub(crate) fn rebuild_seq_block_widened(
    ctx: &ConvertContext,
    old: &RawAsset,
    old_block_offset: usize,
    old_block_len: usize,
    num_seq: usize,
) -> Result<RebuiltSeqBlock> {
    use crate::anim::sequence_blend_count;

    let mut descs = Vec::with_capacity(num_seq);
    for i in 0..num_seq {
        descs.push(SeqDescFields::read_at(
            old,
            old_block_offset + i * seqdesc::LEGACY_STRIDE,
        )?);
    }

    // Interior layout: all descriptors first, then per sequence its event
    // table followed by its blend table, in sequence order.
    let mut cursor = num_seq * seqdesc::MODERN_STRIDE;
    let mut event_pos = vec![0usize; num_seq];
    let mut blend_pos = vec![0usize; num_seq];
    let mut blend_len = vec![0usize; num_seq];
    let mut total_blend_entries = 0usize;

    for (i, desc) in descs.iter().enumerate() {
        let n_events = count(desc.num_events);
        if n_events > 0 {
            cursor = align4(cursor);
            event_pos[i] = cursor;
            cursor += n_events * seqdesc::EVENT_STRIDE;
        }

        let blends = count(sequence_blend_count(desc));
        if blends > 0 && desc.anim_index_offset > 0 {
            cursor = align4(cursor);
            blend_pos[i] = cursor;
            blend_len[i] = blends;
            total_blend_entries += blends;
            cursor += blends * BLEND_ENTRY_SIZE;
        }
    }

    log::debug!(
        target: ctx.target(),
        "rebuilt sequence block: {num_seq} sequences, {total_blend_entries} blend entries"
    );

    let mut block = vec![0u8; cursor];
    for (i, desc) in descs.iter().enumerate() {
        let old_desc = old_block_offset + i * seqdesc::LEGACY_STRIDE;
        let new_desc = i * seqdesc::MODERN_STRIDE;

        // Legacy fields carry over verbatim; the modern tail stays zeroed.
        copy_region(
            &mut block,
            new_desc,
            old.as_bytes(),
            old_desc,
            seqdesc::LEGACY_STRIDE,
        )?;
        put_i32(
            &mut block,
            new_desc + seqdesc::field::EVENT_OFFSET,
            event_pos[i] as i32,
        )?;
        put_i32(
            &mut block,
            new_desc + seqdesc::field::ANIM_INDEX_OFFSET,
            blend_pos[i] as i32,
        )?;

        if event_pos[i] != 0 {
            let src = old_block_offset + abs_off(desc.event_offset, "sequences")?;
            let len = count(desc.num_events) * seqdesc::EVENT_STRIDE;
            if src + len > old_block_offset + old_block_len {
                return Err(MdlError::LayoutError {
                    region: "sequences",
                    offset: src,
                    len,
                    buffer_len: old_block_offset + old_block_len,
                });
            }
            copy_region(&mut block, event_pos[i], old.as_bytes(), src, len)?;
        }

        if blend_pos[i] != 0 {
            let src = old_block_offset + abs_off(desc.anim_index_offset, "sequences")?;
            for e in 0..blend_len[i] {
                let raw = old.read_u16_at(src + e * crate::layout::legacy::BLEND_ENTRY_SIZE)?;
                // 16-bit entries are signed animation indices; -1 marks an
                // empty blend slot and must stay -1 after widening
                let widened = i32::from(raw as i16);
                put_i32(&mut block, blend_pos[i] + e * BLEND_ENTRY_SIZE, widened)?;
            }
        }
    }

    Ok(RebuiltSeqBlock {
        data: block,
        total_blend_entries,
    })
}

/// Final consistency check: the planned table must fit the output exactly
pub(crate) fn finish(out: &[u8], table: &OffsetTable, planned_total: usize) -> Result<()> {
    if out.len() != planned_total {
        return Err(MdlError::LayoutError {
            region: "total",
            offset: 0,
            len: planned_total,
            buffer_len: out.len(),
        });
    }
    table.validate(out.len())
}

pub(crate) fn align4(v: usize) -> usize {
    (v + 3) & !3
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_targets() {
        assert_eq!(
            default_target(MdlVersion::Titanfall),
            MdlVersion::Titanfall2
        );
        assert_eq!(
            default_target(MdlVersion::Titanfall2),
            MdlVersion::ApexLegends
        );
        assert_eq!(default_target(MdlVersion::GarrysMod), MdlVersion::ApexLegends);
    }

    #[test]
    fn test_unsupported_pair_is_rejected() {
        let ctx = ConvertContext::new();
        let mut raw = Vec::new();
        raw.extend_from_slice(b"IDST");
        raw.extend_from_slice(&52i32.to_le_bytes());
        raw.resize(512, 0);
        let asset = RawAsset::new(raw);

        // v52 only upgrades to v53
        let err = convert(
            &ctx,
            &asset,
            MdlVersion::ApexLegends,
            RMdlSubVersion::Unknown,
        );
        assert!(matches!(err, Err(MdlError::ConversionError(_))));
    }

    #[test]
    fn test_copy_records_truncated_shrinks() {
        let mut src = Vec::new();
        for rec in 0..2u8 {
            src.extend(std::iter::repeat_n(rec + 1, 8));
        }
        let old = RawAsset::new(src);

        let mut out = vec![0u8; 12];
        copy_records_truncated(&old, 0, 8, &mut out, 0, 6, 2).unwrap();
        assert_eq!(&out[0..6], &[1, 1, 1, 1, 1, 1]);
        assert_eq!(&out[6..12], &[2, 2, 2, 2, 2, 2]);
    }
}

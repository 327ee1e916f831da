//! Animation reference and blend-count helpers

use log::debug;

use crate::buffer::{RawAsset, copy_region};
use crate::context::ConvertContext;
use crate::error::Result;
use crate::layout::seqdesc::{SeqDescFields, SeqFlags};

/// Per-local-sequence animation reference record stride.
///
/// The record shape is identical across the supported version pairs, so
/// the table is copied without reinterpretation.
pub const ANIM_REF_STRIDE: usize = 16;

/// Copy the per-local-sequence animation reference table.
///
/// Exactly `num_local_seq` records are copied, never more; the source may
/// carry trailing bytes beyond the declared count and they are ignored.
pub fn copy_anim_ref_data(
    ctx: &ConvertContext,
    old: &RawAsset,
    old_offset: usize,
    new: &mut [u8],
    new_offset: usize,
    num_local_seq: usize,
) -> Result<()> {
    let len = num_local_seq * ANIM_REF_STRIDE;
    debug!(
        target: ctx.target(),
        "copying {num_local_seq} animation reference records ({len} bytes)"
    );
    copy_region(new, new_offset, old.as_bytes(), old_offset, len)
}

/// Number of blend entries implied by a sequence descriptor.
///
/// The blend table is a grid of animation indices sized by the
/// descriptor's two group dimensions; a zero dimension is a degenerate
/// one-wide axis. A sequence flagged as carrying no animation payload has
/// no blend entries at all.
pub fn sequence_blend_count(seq: &SeqDescFields) -> i32 {
    if seq.flags.contains(SeqFlags::ALL_ZEROS) {
        return 0;
    }
    seq.group_size[0].max(1) * seq.group_size[1].max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seq(group_size: [i32; 2], flags: SeqFlags) -> SeqDescFields {
        SeqDescFields {
            flags,
            num_events: 0,
            event_offset: 0,
            num_blends: 0,
            anim_index_offset: 0,
            group_size,
        }
    }

    #[test]
    fn test_blend_count_single_animation() {
        assert_eq!(sequence_blend_count(&seq([0, 0], SeqFlags::empty())), 1);
        assert_eq!(sequence_blend_count(&seq([1, 1], SeqFlags::empty())), 1);
    }

    #[test]
    fn test_blend_count_grids() {
        assert_eq!(sequence_blend_count(&seq([3, 3], SeqFlags::empty())), 9);
        assert_eq!(sequence_blend_count(&seq([9, 1], SeqFlags::LOOPING)), 9);
        assert_eq!(sequence_blend_count(&seq([2, 0], SeqFlags::empty())), 2);
    }

    #[test]
    fn test_blend_count_all_zeros_sequence() {
        assert_eq!(sequence_blend_count(&seq([3, 3], SeqFlags::ALL_ZEROS)), 0);
    }

    #[test]
    fn test_copy_is_bounded_by_count() {
        let ctx = ConvertContext::new();
        // two records plus trailing garbage
        let mut src = vec![0u8; 2 * ANIM_REF_STRIDE + 8];
        for (i, b) in src.iter_mut().enumerate() {
            *b = i as u8;
        }
        let old = RawAsset::new(src);

        let mut out = vec![0xAAu8; 2 * ANIM_REF_STRIDE + 8];
        copy_anim_ref_data(&ctx, &old, 0, &mut out, 0, 2).unwrap();

        assert_eq!(&out[..2 * ANIM_REF_STRIDE], old.slice(0, 32).unwrap());
        // bytes past the declared count are untouched
        assert!(out[2 * ANIM_REF_STRIDE..].iter().all(|&b| b == 0xAA));
    }

    #[test]
    fn test_copy_rejects_truncated_source() {
        let ctx = ConvertContext::new();
        let old = RawAsset::new(vec![0u8; ANIM_REF_STRIDE - 1]);
        let mut out = vec![0u8; ANIM_REF_STRIDE];
        assert!(copy_anim_ref_data(&ctx, &old, 0, &mut out, 0, 1).is_err());
    }
}

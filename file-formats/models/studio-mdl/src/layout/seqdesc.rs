//! Sequence descriptor layout
//!
//! The descriptor record is shared by the legacy generations; the modern
//! layouts append the animation tag pair at the tail. Converters patch
//! individual fields in place instead of materializing the whole record,
//! so the layout is kept as a field-offset table plus a thin parsed view
//! of the fields conversion actually needs.

use bitflags::bitflags;

use crate::buffer::RawAsset;
use crate::error::Result;

/// Descriptor stride in the legacy generations
pub const LEGACY_STRIDE: usize = 188;
/// Descriptor stride in the modern generations
pub const MODERN_STRIDE: usize = 196;
/// Event record stride, stable across every supported generation
pub const EVENT_STRIDE: usize = 80;

/// Field offsets within a sequence descriptor record
pub mod field {
    /// Sequence label, relative to the string table
    pub const LABEL_OFFSET: usize = 0;
    /// Activity name, relative to the string table
    pub const ACTIVITY_NAME_OFFSET: usize = 4;
    /// Flag word
    pub const FLAGS: usize = 8;
    /// Event count
    pub const NUM_EVENTS: usize = 20;
    /// Event table, relative to the sequence block base
    pub const EVENT_OFFSET: usize = 24;
    /// Declared blend entry count
    pub const NUM_BLENDS: usize = 52;
    /// Blend animation index table, relative to the sequence block base
    pub const ANIM_INDEX_OFFSET: usize = 56;
    /// Blend grid width
    pub const GROUP_SIZE_0: usize = 64;
    /// Blend grid height
    pub const GROUP_SIZE_1: usize = 68;
}

bitflags! {
    /// Sequence descriptor flag word
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SeqFlags: u32 {
        /// Sequence loops cleanly
        const LOOPING = 0x0001;
        /// Snap transitions into this sequence
        const SNAP = 0x0002;
        /// Animation data is delta-encoded against a base pose
        const DELTA = 0x0004;
        /// Sequence plays automatically
        const AUTOPLAY = 0x0008;
        /// Applied after normal layers
        const POST = 0x0010;
        /// Descriptor declares no animation payload at all
        const ALL_ZEROS = 0x0020;
        /// Blend parameters are world-space
        const WORLD_SPACE = 0x0080;
    }
}

/// The descriptor fields conversion needs, parsed from a record at an
/// absolute offset inside a source buffer
#[derive(Debug, Clone, Copy)]
pub struct SeqDescFields {
    /// Flag word
    pub flags: SeqFlags,
    /// Event count
    pub num_events: i32,
    /// Event table offset, relative to the sequence block base
    pub event_offset: i32,
    /// Declared blend entry count
    pub num_blends: i32,
    /// Blend table offset, relative to the sequence block base
    pub anim_index_offset: i32,
    /// Blend grid dimensions
    pub group_size: [i32; 2],
}

impl SeqDescFields {
    /// Parse the conversion-relevant fields of the record at `base`
    pub fn read_at(asset: &RawAsset, base: usize) -> Result<Self> {
        Ok(Self {
            flags: SeqFlags::from_bits_truncate(asset.read_u32_at(base + field::FLAGS)?),
            num_events: asset.read_i32_at(base + field::NUM_EVENTS)?,
            event_offset: asset.read_i32_at(base + field::EVENT_OFFSET)?,
            num_blends: asset.read_i32_at(base + field::NUM_BLENDS)?,
            anim_index_offset: asset.read_i32_at(base + field::ANIM_INDEX_OFFSET)?,
            group_size: [
                asset.read_i32_at(base + field::GROUP_SIZE_0)?,
                asset.read_i32_at(base + field::GROUP_SIZE_1)?,
            ],
        })
    }
}

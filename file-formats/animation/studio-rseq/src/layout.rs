//! Sequence container layouts
//!
//! An RSEQ file is a single sequence descriptor at offset zero followed
//! by its data regions (events, blend table, strings, animation data),
//! each addressed by a file-relative offset field in the descriptor. The
//! descriptor shares its 188-byte base record with the model sequence
//! descriptors; v7.1 appends the external-data pair and v10 appends four
//! more words on top of that. Event records grew from 80 to 96 bytes in
//! v10; the added tail does not survive conversion to v7.

/// Descriptor stride of the v7 target layout
pub const V7_STRIDE: usize = 188;
/// Descriptor stride of the v7.1 layout
pub const V71_STRIDE: usize = 196;
/// Descriptor stride of the v10 layout
pub const V10_STRIDE: usize = 212;

/// Event record stride in v7 and v7.1
pub const EVENT_STRIDE_V7: usize = 80;
/// Event record stride in v10
pub const EVENT_STRIDE_V10: usize = 96;

/// Field offsets within the descriptor record
pub mod field {
    /// Sequence label string
    pub const LABEL_OFFSET: usize = 0;
    /// Activity name string
    pub const ACTIVITY_NAME_OFFSET: usize = 4;
    /// Flag word
    pub const FLAGS: usize = 8;
    /// Event count
    pub const NUM_EVENTS: usize = 20;
    /// Event table
    pub const EVENT_OFFSET: usize = 24;
    /// Declared blend entry count
    pub const NUM_BLENDS: usize = 52;
    /// Blend animation data offset table
    pub const ANIM_INDEX_OFFSET: usize = 56;
    /// Movement data
    pub const MOVEMENT_OFFSET: usize = 60;
    /// Blend grid width
    pub const GROUP_SIZE_0: usize = 64;
    /// Blend grid height
    pub const GROUP_SIZE_1: usize = 68;
    /// Auto-layer table
    pub const AUTO_LAYER_OFFSET: usize = 148;
    /// Bone weight list
    pub const WEIGHT_LIST_OFFSET: usize = 152;
    /// Pose key data
    pub const POSE_KEY_OFFSET: usize = 156;
    /// IK lock table
    pub const IK_LOCK_OFFSET: usize = 164;
    /// Key-value text
    pub const KEYVALUE_OFFSET: usize = 168;
    /// Cycle pose data
    pub const CYCLE_POSE_OFFSET: usize = 176;
    /// Activity modifier table
    pub const ACTIVITY_MODIFIER_OFFSET: usize = 180;
    /// Companion data start, within the external file (v7.1 and v10)
    pub const EXTERNAL_DATA_OFFSET: usize = 188;
    /// Companion data length (v7.1 and v10)
    pub const EXTERNAL_DATA_SIZE: usize = 192;
}

/// Every file-relative offset field of the descriptor base record.
///
/// These are the fields the converters rewrite when the descriptor stride
/// changes; zero values mark absent regions and are never shifted.
pub const RELOCATABLE_FIELDS: [usize; 12] = [
    field::LABEL_OFFSET,
    field::ACTIVITY_NAME_OFFSET,
    field::EVENT_OFFSET,
    field::ANIM_INDEX_OFFSET,
    field::MOVEMENT_OFFSET,
    field::AUTO_LAYER_OFFSET,
    field::WEIGHT_LIST_OFFSET,
    field::POSE_KEY_OFFSET,
    field::IK_LOCK_OFFSET,
    field::KEYVALUE_OFFSET,
    field::CYCLE_POSE_OFFSET,
    field::ACTIVITY_MODIFIER_OFFSET,
];

//! Header layout of the legacy MDL generations (v48, v49, v52, v53)
//!
//! The four legacy generations share one field vocabulary with small
//! per-version deltas:
//!
//! - v48/v49 carry the activity-list fields and predate animation
//!   reference tables;
//! - v52 drops the activity-list fields and introduces the per-sequence
//!   animation reference table;
//! - v53 appends the collision/BVH block offset and two reserved words.
//!
//! Version-gated fields are `Option`s; `read` and `write` take the
//! generation explicitly and never guess from field presence.

use std::io::{Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use super::{Vec3, read_name64, write_name64};
use crate::error::{MdlError, Result};
use crate::version::MdlVersion;

/// Bone record stride for v48/v49 sources
pub const BONE_STRIDE_V49: usize = 216;
/// Bone record stride for v52/v53 sources
pub const BONE_STRIDE_V52: usize = 220;
/// Texture record stride (material path is stored inline)
pub const TEXTURE_STRIDE: usize = 64;
/// Per-name offset stride of the cd-texture table
pub const CD_TEXTURE_STRIDE: usize = 4;
/// Local node index stride
pub const LOCAL_NODE_STRIDE: usize = 4;
/// Blend table entries are 16-bit animation indices in the legacy layouts
pub const BLEND_ENTRY_SIZE: usize = 2;

/// Fixed header of a legacy-generation model
#[derive(Debug, Clone)]
pub struct LegacyHeader {
    /// File checksum as written by the model compiler
    pub checksum: i32,
    /// Internal model name, NUL padded
    pub name: [u8; 64],
    /// Total file length recorded in the header
    pub data_length: i32,

    /// Eye position in model space
    pub eyeposition: Vec3,
    /// Illumination center
    pub illumposition: Vec3,
    /// Movement hull minimum
    pub hull_min: Vec3,
    /// Movement hull maximum
    pub hull_max: Vec3,
    /// Clipping bounds minimum
    pub view_bbmin: Vec3,
    /// Clipping bounds maximum
    pub view_bbmax: Vec3,

    /// Model flag word
    pub flags: u32,

    /// Bone count and table offset
    pub num_bones: i32,
    /// Absolute offset of the bone table
    pub bone_index: i32,
    /// Bone controller count
    pub num_bone_controllers: i32,
    /// Absolute offset of the bone controller table
    pub bone_controller_index: i32,
    /// Hitbox set count
    pub num_hitbox_sets: i32,
    /// Absolute offset of the hitbox set table
    pub hitbox_set_index: i32,
    /// Animation descriptor count
    pub num_local_anim: i32,
    /// Absolute offset of the animation descriptor table
    pub local_anim_index: i32,
    /// Sequence descriptor count
    pub num_local_seq: i32,
    /// Absolute offset of the sequence block
    pub local_seq_index: i32,

    /// Activity list version (v48/v49 only)
    pub activity_list_version: Option<i32>,
    /// Events-indexed marker (v48/v49 only)
    pub events_indexed: Option<i32>,

    /// Texture record count
    pub num_textures: i32,
    /// Absolute offset of the texture table
    pub texture_index: i32,
    /// Texture search path count
    pub num_cd_textures: i32,
    /// Absolute offset of the texture search path table
    pub cd_texture_index: i32,
    /// Skin reference count
    pub num_skin_ref: i32,
    /// Skin family count
    pub num_skin_families: i32,
    /// Absolute offset of the skin table
    pub skin_index: i32,
    /// Body part count
    pub num_body_parts: i32,
    /// Absolute offset of the body part table
    pub body_part_index: i32,
    /// Attachment count
    pub num_local_attachments: i32,
    /// Absolute offset of the attachment table
    pub local_attachment_index: i32,
    /// Local node count
    pub num_local_nodes: i32,
    /// Absolute offset of the local node table
    pub local_node_index: i32,
    /// Absolute offset of the local node name table
    pub local_node_name_index: i32,

    /// Surface property name, as an offset relative to the string table
    pub surface_prop_index: i32,
    /// Absolute offset of the key-value text block
    pub keyvalue_index: i32,
    /// Key-value text block size
    pub keyvalue_size: i32,
    /// Include model count
    pub num_include_models: i32,
    /// Absolute offset of the include model table
    pub include_model_index: i32,
    /// Absolute offset of the string data block
    pub string_table_index: i32,

    /// Animation reference record count (v52+)
    pub num_anim_refs: Option<i32>,
    /// Absolute offset of the animation reference table (v52+)
    pub anim_ref_index: Option<i32>,

    /// Absolute offset of the collision/BVH block, 0 when absent (v53)
    pub bvh_offset: Option<i32>,
}

impl Default for LegacyHeader {
    fn default() -> Self {
        Self {
            checksum: Default::default(),
            name: [0u8; 64],
            data_length: Default::default(),
            eyeposition: Default::default(),
            illumposition: Default::default(),
            hull_min: Default::default(),
            hull_max: Default::default(),
            view_bbmin: Default::default(),
            view_bbmax: Default::default(),
            flags: Default::default(),
            num_bones: Default::default(),
            bone_index: Default::default(),
            num_bone_controllers: Default::default(),
            bone_controller_index: Default::default(),
            num_hitbox_sets: Default::default(),
            hitbox_set_index: Default::default(),
            num_local_anim: Default::default(),
            local_anim_index: Default::default(),
            num_local_seq: Default::default(),
            local_seq_index: Default::default(),
            activity_list_version: Default::default(),
            events_indexed: Default::default(),
            num_textures: Default::default(),
            texture_index: Default::default(),
            num_cd_textures: Default::default(),
            cd_texture_index: Default::default(),
            num_skin_ref: Default::default(),
            num_skin_families: Default::default(),
            skin_index: Default::default(),
            num_body_parts: Default::default(),
            body_part_index: Default::default(),
            num_local_attachments: Default::default(),
            local_attachment_index: Default::default(),
            num_local_nodes: Default::default(),
            local_node_index: Default::default(),
            local_node_name_index: Default::default(),
            surface_prop_index: Default::default(),
            keyvalue_index: Default::default(),
            keyvalue_size: Default::default(),
            num_include_models: Default::default(),
            include_model_index: Default::default(),
            string_table_index: Default::default(),
            num_anim_refs: Default::default(),
            anim_ref_index: Default::default(),
            bvh_offset: Default::default(),
        }
    }
}

impl LegacyHeader {
    /// Fixed header size of a legacy generation, leading 8-byte ident
    /// included
    pub fn size_for(version: MdlVersion) -> usize {
        match version {
            MdlVersion::GarrysMod | MdlVersion::Portal2 | MdlVersion::Titanfall => 284,
            MdlVersion::Titanfall2 => 296,
            MdlVersion::ApexLegends => 0, // not a legacy layout
        }
    }

    /// Bone record stride of a legacy generation
    pub fn bone_stride(version: MdlVersion) -> usize {
        match version {
            MdlVersion::GarrysMod | MdlVersion::Portal2 => BONE_STRIDE_V49,
            _ => BONE_STRIDE_V52,
        }
    }

    /// Read the header that follows the 8-byte ident of `version`
    pub fn read<R: Read>(r: &mut R, version: MdlVersion) -> Result<Self> {
        if version == MdlVersion::ApexLegends {
            return Err(MdlError::ConversionError(
                "RMDL headers are not legacy layouts".to_string(),
            ));
        }
        let old_style = matches!(version, MdlVersion::GarrysMod | MdlVersion::Portal2);

        let mut hdr = Self {
            checksum: r.read_i32::<LittleEndian>()?,
            name: read_name64(r)?,
            data_length: r.read_i32::<LittleEndian>()?,
            eyeposition: Vec3::read(r)?,
            illumposition: Vec3::read(r)?,
            hull_min: Vec3::read(r)?,
            hull_max: Vec3::read(r)?,
            view_bbmin: Vec3::read(r)?,
            view_bbmax: Vec3::read(r)?,
            flags: r.read_u32::<LittleEndian>()?,
            num_bones: r.read_i32::<LittleEndian>()?,
            bone_index: r.read_i32::<LittleEndian>()?,
            num_bone_controllers: r.read_i32::<LittleEndian>()?,
            bone_controller_index: r.read_i32::<LittleEndian>()?,
            num_hitbox_sets: r.read_i32::<LittleEndian>()?,
            hitbox_set_index: r.read_i32::<LittleEndian>()?,
            num_local_anim: r.read_i32::<LittleEndian>()?,
            local_anim_index: r.read_i32::<LittleEndian>()?,
            num_local_seq: r.read_i32::<LittleEndian>()?,
            local_seq_index: r.read_i32::<LittleEndian>()?,
            ..Self::default()
        };

        if old_style {
            hdr.activity_list_version = Some(r.read_i32::<LittleEndian>()?);
            hdr.events_indexed = Some(r.read_i32::<LittleEndian>()?);
        }

        hdr.num_textures = r.read_i32::<LittleEndian>()?;
        hdr.texture_index = r.read_i32::<LittleEndian>()?;
        hdr.num_cd_textures = r.read_i32::<LittleEndian>()?;
        hdr.cd_texture_index = r.read_i32::<LittleEndian>()?;
        hdr.num_skin_ref = r.read_i32::<LittleEndian>()?;
        hdr.num_skin_families = r.read_i32::<LittleEndian>()?;
        hdr.skin_index = r.read_i32::<LittleEndian>()?;
        hdr.num_body_parts = r.read_i32::<LittleEndian>()?;
        hdr.body_part_index = r.read_i32::<LittleEndian>()?;
        hdr.num_local_attachments = r.read_i32::<LittleEndian>()?;
        hdr.local_attachment_index = r.read_i32::<LittleEndian>()?;
        hdr.num_local_nodes = r.read_i32::<LittleEndian>()?;
        hdr.local_node_index = r.read_i32::<LittleEndian>()?;
        hdr.local_node_name_index = r.read_i32::<LittleEndian>()?;
        hdr.surface_prop_index = r.read_i32::<LittleEndian>()?;
        hdr.keyvalue_index = r.read_i32::<LittleEndian>()?;
        hdr.keyvalue_size = r.read_i32::<LittleEndian>()?;
        hdr.num_include_models = r.read_i32::<LittleEndian>()?;
        hdr.include_model_index = r.read_i32::<LittleEndian>()?;
        hdr.string_table_index = r.read_i32::<LittleEndian>()?;

        if !old_style {
            hdr.num_anim_refs = Some(r.read_i32::<LittleEndian>()?);
            hdr.anim_ref_index = Some(r.read_i32::<LittleEndian>()?);
        }

        if version == MdlVersion::Titanfall2 {
            hdr.bvh_offset = Some(r.read_i32::<LittleEndian>()?);
            let _reserved0 = r.read_i32::<LittleEndian>()?;
            let _reserved1 = r.read_i32::<LittleEndian>()?;
        }

        Ok(hdr)
    }

    /// Write the header in the layout of `version`, including the ident
    pub fn write<W: Write>(&self, w: &mut W, version: MdlVersion) -> Result<()> {
        if version == MdlVersion::ApexLegends {
            return Err(MdlError::ConversionError(
                "RMDL headers are not legacy layouts".to_string(),
            ));
        }
        let old_style = matches!(version, MdlVersion::GarrysMod | MdlVersion::Portal2);

        w.write_all(&crate::version::MDL_MAGIC)?;
        w.write_i32::<LittleEndian>(version.to_raw())?;
        w.write_i32::<LittleEndian>(self.checksum)?;
        write_name64(w, &self.name)?;
        w.write_i32::<LittleEndian>(self.data_length)?;
        self.eyeposition.write(w)?;
        self.illumposition.write(w)?;
        self.hull_min.write(w)?;
        self.hull_max.write(w)?;
        self.view_bbmin.write(w)?;
        self.view_bbmax.write(w)?;
        w.write_u32::<LittleEndian>(self.flags)?;
        w.write_i32::<LittleEndian>(self.num_bones)?;
        w.write_i32::<LittleEndian>(self.bone_index)?;
        w.write_i32::<LittleEndian>(self.num_bone_controllers)?;
        w.write_i32::<LittleEndian>(self.bone_controller_index)?;
        w.write_i32::<LittleEndian>(self.num_hitbox_sets)?;
        w.write_i32::<LittleEndian>(self.hitbox_set_index)?;
        w.write_i32::<LittleEndian>(self.num_local_anim)?;
        w.write_i32::<LittleEndian>(self.local_anim_index)?;
        w.write_i32::<LittleEndian>(self.num_local_seq)?;
        w.write_i32::<LittleEndian>(self.local_seq_index)?;

        if old_style {
            w.write_i32::<LittleEndian>(self.activity_list_version.unwrap_or(1))?;
            w.write_i32::<LittleEndian>(self.events_indexed.unwrap_or(0))?;
        }

        w.write_i32::<LittleEndian>(self.num_textures)?;
        w.write_i32::<LittleEndian>(self.texture_index)?;
        w.write_i32::<LittleEndian>(self.num_cd_textures)?;
        w.write_i32::<LittleEndian>(self.cd_texture_index)?;
        w.write_i32::<LittleEndian>(self.num_skin_ref)?;
        w.write_i32::<LittleEndian>(self.num_skin_families)?;
        w.write_i32::<LittleEndian>(self.skin_index)?;
        w.write_i32::<LittleEndian>(self.num_body_parts)?;
        w.write_i32::<LittleEndian>(self.body_part_index)?;
        w.write_i32::<LittleEndian>(self.num_local_attachments)?;
        w.write_i32::<LittleEndian>(self.local_attachment_index)?;
        w.write_i32::<LittleEndian>(self.num_local_nodes)?;
        w.write_i32::<LittleEndian>(self.local_node_index)?;
        w.write_i32::<LittleEndian>(self.local_node_name_index)?;
        w.write_i32::<LittleEndian>(self.surface_prop_index)?;
        w.write_i32::<LittleEndian>(self.keyvalue_index)?;
        w.write_i32::<LittleEndian>(self.keyvalue_size)?;
        w.write_i32::<LittleEndian>(self.num_include_models)?;
        w.write_i32::<LittleEndian>(self.include_model_index)?;
        w.write_i32::<LittleEndian>(self.string_table_index)?;

        if !old_style {
            w.write_i32::<LittleEndian>(self.num_anim_refs.unwrap_or(0))?;
            w.write_i32::<LittleEndian>(self.anim_ref_index.unwrap_or(0))?;
        }

        if version == MdlVersion::Titanfall2 {
            w.write_i32::<LittleEndian>(self.bvh_offset.unwrap_or(0))?;
            w.write_i32::<LittleEndian>(0)?;
            w.write_i32::<LittleEndian>(0)?;
        }

        Ok(())
    }
}

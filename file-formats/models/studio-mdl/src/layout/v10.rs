//! Baseline modern target header layout
//!
//! Every modern-bound conversion emits this layout, regardless of whether
//! the source was a legacy generation or a later RMDL minor release.

use std::io::{Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use super::{Vec3, read_name64, write_name64};
use crate::error::Result;

/// Fixed size of the baseline target header, leading 8-byte ident included
pub const HEADER_SIZE: usize = 280;

/// Fixed header of the baseline modern target
#[derive(Debug, Clone)]
pub struct V10Header {
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

    /// Bone count
    pub num_bones: i32,
    /// Absolute offset of the bone table
    pub bone_index: i32,
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
    /// Animation reference record count
    pub num_anim_refs: i32,
    /// Absolute offset of the animation reference table
    pub anim_ref_index: i32,
    /// Texture record count
    pub num_textures: i32,
    /// Absolute offset of the texture table
    pub texture_index: i32,
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

    /// Surface property name, as an offset relative to the string table
    pub surface_prop_index: i32,
    /// Absolute offset of the key-value text block
    pub keyvalue_index: i32,
    /// Key-value text block size
    pub keyvalue_size: i32,
    /// Absolute offset of the string data block
    pub string_table_index: i32,

    /// Absolute offset of the physics blob, 0 when absent
    pub phy_offset: i32,
    /// Physics blob size
    pub phy_size: i32,
    /// Absolute offset of the collision/BVH block, 0 when absent
    pub bvh_offset: i32,
    /// External sequence reference count
    pub num_ext_seq_refs: i32,
    /// Absolute offset of the external sequence reference table
    pub ext_seq_ref_index: i32,
    /// Absolute offset of the hardware vertex-group blob
    pub vg_offset: i32,
    /// Hardware vertex-group blob size
    pub vg_size: i32,
}

impl Default for V10Header {
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
            num_hitbox_sets: Default::default(),
            hitbox_set_index: Default::default(),
            num_local_anim: Default::default(),
            local_anim_index: Default::default(),
            num_local_seq: Default::default(),
            local_seq_index: Default::default(),
            num_anim_refs: Default::default(),
            anim_ref_index: Default::default(),
            num_textures: Default::default(),
            texture_index: Default::default(),
            num_skin_ref: Default::default(),
            num_skin_families: Default::default(),
            skin_index: Default::default(),
            num_body_parts: Default::default(),
            body_part_index: Default::default(),
            num_local_attachments: Default::default(),
            local_attachment_index: Default::default(),
            surface_prop_index: Default::default(),
            keyvalue_index: Default::default(),
            keyvalue_size: Default::default(),
            string_table_index: Default::default(),
            phy_offset: Default::default(),
            phy_size: Default::default(),
            bvh_offset: Default::default(),
            num_ext_seq_refs: Default::default(),
            ext_seq_ref_index: Default::default(),
            vg_offset: Default::default(),
            vg_size: Default::default(),
        }
    }
}

impl V10Header {
    /// Write the header, including the 8-byte ident
    pub fn write<W: Write>(&self, w: &mut W) -> Result<()> {
        w.write_all(&crate::version::MDL_MAGIC)?;
        w.write_i32::<LittleEndian>(crate::version::MdlVersion::ApexLegends.to_raw())?;
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
        w.write_i32::<LittleEndian>(self.num_hitbox_sets)?;
        w.write_i32::<LittleEndian>(self.hitbox_set_index)?;
        w.write_i32::<LittleEndian>(self.num_local_anim)?;
        w.write_i32::<LittleEndian>(self.local_anim_index)?;
        w.write_i32::<LittleEndian>(self.num_local_seq)?;
        w.write_i32::<LittleEndian>(self.local_seq_index)?;
        w.write_i32::<LittleEndian>(self.num_anim_refs)?;
        w.write_i32::<LittleEndian>(self.anim_ref_index)?;
        w.write_i32::<LittleEndian>(self.num_textures)?;
        w.write_i32::<LittleEndian>(self.texture_index)?;
        w.write_i32::<LittleEndian>(self.num_skin_ref)?;
        w.write_i32::<LittleEndian>(self.num_skin_families)?;
        w.write_i32::<LittleEndian>(self.skin_index)?;
        w.write_i32::<LittleEndian>(self.num_body_parts)?;
        w.write_i32::<LittleEndian>(self.body_part_index)?;
        w.write_i32::<LittleEndian>(self.num_local_attachments)?;
        w.write_i32::<LittleEndian>(self.local_attachment_index)?;
        w.write_i32::<LittleEndian>(self.surface_prop_index)?;
        w.write_i32::<LittleEndian>(self.keyvalue_index)?;
        w.write_i32::<LittleEndian>(self.keyvalue_size)?;
        w.write_i32::<LittleEndian>(self.string_table_index)?;
        w.write_i32::<LittleEndian>(self.phy_offset)?;
        w.write_i32::<LittleEndian>(self.phy_size)?;
        w.write_i32::<LittleEndian>(self.bvh_offset)?;
        w.write_i32::<LittleEndian>(self.num_ext_seq_refs)?;
        w.write_i32::<LittleEndian>(self.ext_seq_ref_index)?;
        w.write_i32::<LittleEndian>(self.vg_offset)?;
        w.write_i32::<LittleEndian>(self.vg_size)?;
        w.write_i32::<LittleEndian>(0)?; // reserved
        Ok(())
    }

    /// Read back a written header, ident excluded
    pub fn read<R: Read>(r: &mut R) -> Result<Self> {
        let hdr = Self {
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
            num_hitbox_sets: r.read_i32::<LittleEndian>()?,
            hitbox_set_index: r.read_i32::<LittleEndian>()?,
            num_local_anim: r.read_i32::<LittleEndian>()?,
            local_anim_index: r.read_i32::<LittleEndian>()?,
            num_local_seq: r.read_i32::<LittleEndian>()?,
            local_seq_index: r.read_i32::<LittleEndian>()?,
            num_anim_refs: r.read_i32::<LittleEndian>()?,
            anim_ref_index: r.read_i32::<LittleEndian>()?,
            num_textures: r.read_i32::<LittleEndian>()?,
            texture_index: r.read_i32::<LittleEndian>()?,
            num_skin_ref: r.read_i32::<LittleEndian>()?,
            num_skin_families: r.read_i32::<LittleEndian>()?,
            skin_index: r.read_i32::<LittleEndian>()?,
            num_body_parts: r.read_i32::<LittleEndian>()?,
            body_part_index: r.read_i32::<LittleEndian>()?,
            num_local_attachments: r.read_i32::<LittleEndian>()?,
            local_attachment_index: r.read_i32::<LittleEndian>()?,
            surface_prop_index: r.read_i32::<LittleEndian>()?,
            keyvalue_index: r.read_i32::<LittleEndian>()?,
            keyvalue_size: r.read_i32::<LittleEndian>()?,
            string_table_index: r.read_i32::<LittleEndian>()?,
            phy_offset: r.read_i32::<LittleEndian>()?,
            phy_size: r.read_i32::<LittleEndian>()?,
            bvh_offset: r.read_i32::<LittleEndian>()?,
            num_ext_seq_refs: r.read_i32::<LittleEndian>()?,
            ext_seq_ref_index: r.read_i32::<LittleEndian>()?,
            vg_offset: r.read_i32::<LittleEndian>()?,
            vg_size: r.read_i32::<LittleEndian>()?,
        };
        let _reserved = r.read_i32::<LittleEndian>()?;
        Ok(hdr)
    }
}

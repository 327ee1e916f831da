//! Header layouts of the RMDL generation source releases (v8 through v14)
//!
//! All modern releases share one restructured field vocabulary: the bone
//! controller, cd-texture, local node, and include-model groups of the
//! legacy layouts are gone, and the animation reference table, string
//! table, and hardware vertex-group blob are first-class header fields.
//! The minor releases differ in a handful of fields:
//!
//! - v8 predates the physics blob and the collision/BVH block offsets are
//!   unused;
//! - v12.0 adds the physics blob; its collision data stores file-absolute
//!   internal offsets (the full relocation path);
//! - v12.1 rebased collision internals to be block-relative
//!   (headers-only relocation);
//! - v12.2 adds the per-triangle AABB block offset;
//! - v13 inserts the vertex-group LOD pair before the vertex-group blob;
//! - v14 appends the animation sequence block count.

use std::io::{Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use super::{Vec3, read_name64, write_name64};
use crate::error::{MdlError, Result};
use crate::version::RMdlSubVersion;

/// Bone record stride of every modern release
pub const BONE_STRIDE: usize = 180;
/// Texture record stride of every modern release
pub const TEXTURE_STRIDE: usize = 24;
/// External sequence reference record stride
pub const EXT_SEQ_REF_STRIDE: usize = 8;
/// Blend table entries are 32-bit animation indices in the modern layouts
pub const BLEND_ENTRY_SIZE: usize = 4;

/// Fixed header of a modern-generation (RMDL) model
#[derive(Debug, Clone)]
pub struct RMdlHeader {
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

    /// Absolute offset of the physics blob (v12+)
    pub phy_offset: Option<i32>,
    /// Physics blob size (v12+)
    pub phy_size: Option<i32>,

    /// Absolute offset of the collision/BVH block, 0 when absent
    pub bvh_offset: i32,
    /// External sequence reference count
    pub num_ext_seq_refs: i32,
    /// Absolute offset of the external sequence reference table
    pub ext_seq_ref_index: i32,

    /// Vertex-group LOD count (v13+)
    pub num_vg_lods: Option<i32>,
    /// Absolute offset of the vertex-group LOD table (v13+)
    pub vg_lod_index: Option<i32>,

    /// Absolute offset of the hardware vertex-group blob
    pub vg_offset: i32,
    /// Hardware vertex-group blob size
    pub vg_size: i32,

    /// Absolute offset of the per-triangle AABB block (v12.2+)
    pub per_tri_aabb_index: Option<i32>,
    /// Animation sequence block count (v14)
    pub num_anim_seq_blocks: Option<i32>,
}

impl Default for RMdlHeader {
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
            num_vg_lods: Default::default(),
            vg_lod_index: Default::default(),
            vg_offset: Default::default(),
            vg_size: Default::default(),
            per_tri_aabb_index: Default::default(),
            num_anim_seq_blocks: Default::default(),
        }
    }
}

impl RMdlHeader {
    /// Fixed header size of a modern source release, leading 8-byte ident
    /// included
    pub fn size_for(sub: RMdlSubVersion) -> usize {
        match sub {
            RMdlSubVersion::V8 => 272,
            RMdlSubVersion::V12 | RMdlSubVersion::V12_1 | RMdlSubVersion::V12_2 => 284,
            RMdlSubVersion::V13 => 292,
            RMdlSubVersion::V14 => 296,
            RMdlSubVersion::Unknown => 0,
        }
    }

    /// Read the header that follows the 8-byte ident, for release `sub`
    pub fn read<R: Read>(r: &mut R, sub: RMdlSubVersion) -> Result<Self> {
        if sub == RMdlSubVersion::Unknown {
            return Err(MdlError::UnsupportedSubVersion("unknown".to_string()));
        }

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
            ..Self::default()
        };

        if sub >= RMdlSubVersion::V12 {
            hdr.phy_offset = Some(r.read_i32::<LittleEndian>()?);
            hdr.phy_size = Some(r.read_i32::<LittleEndian>()?);
        }

        hdr.bvh_offset = r.read_i32::<LittleEndian>()?;
        hdr.num_ext_seq_refs = r.read_i32::<LittleEndian>()?;
        hdr.ext_seq_ref_index = r.read_i32::<LittleEndian>()?;

        if sub >= RMdlSubVersion::V13 {
            hdr.num_vg_lods = Some(r.read_i32::<LittleEndian>()?);
            hdr.vg_lod_index = Some(r.read_i32::<LittleEndian>()?);
        }

        hdr.vg_offset = r.read_i32::<LittleEndian>()?;
        hdr.vg_size = r.read_i32::<LittleEndian>()?;

        match sub {
            RMdlSubVersion::V8 => {
                let _reserved = r.read_i32::<LittleEndian>()?;
            }
            RMdlSubVersion::V12 => {
                let _reserved0 = r.read_i32::<LittleEndian>()?;
                let _reserved1 = r.read_i32::<LittleEndian>()?;
            }
            RMdlSubVersion::V12_1 => {
                let _reserved0 = r.read_i32::<LittleEndian>()?;
                let _reserved1 = r.read_i32::<LittleEndian>()?;
            }
            RMdlSubVersion::V12_2 | RMdlSubVersion::V13 => {
                hdr.per_tri_aabb_index = Some(r.read_i32::<LittleEndian>()?);
                let _reserved = r.read_i32::<LittleEndian>()?;
            }
            RMdlSubVersion::V14 => {
                hdr.per_tri_aabb_index = Some(r.read_i32::<LittleEndian>()?);
                hdr.num_anim_seq_blocks = Some(r.read_i32::<LittleEndian>()?);
                let _reserved = r.read_i32::<LittleEndian>()?;
            }
            RMdlSubVersion::Unknown => unreachable!("rejected above"),
        }

        Ok(hdr)
    }

    /// Write the header in the source layout of release `sub`, including
    /// the 8-byte ident. Only used to author fixtures; conversions always
    /// emit the baseline target layout.
    pub fn write<W: Write>(&self, w: &mut W, sub: RMdlSubVersion) -> Result<()> {
        if sub == RMdlSubVersion::Unknown {
            return Err(MdlError::UnsupportedSubVersion("unknown".to_string()));
        }

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

        if sub >= RMdlSubVersion::V12 {
            w.write_i32::<LittleEndian>(self.phy_offset.unwrap_or(0))?;
            w.write_i32::<LittleEndian>(self.phy_size.unwrap_or(0))?;
        }

        w.write_i32::<LittleEndian>(self.bvh_offset)?;
        w.write_i32::<LittleEndian>(self.num_ext_seq_refs)?;
        w.write_i32::<LittleEndian>(self.ext_seq_ref_index)?;

        if sub >= RMdlSubVersion::V13 {
            w.write_i32::<LittleEndian>(self.num_vg_lods.unwrap_or(0))?;
            w.write_i32::<LittleEndian>(self.vg_lod_index.unwrap_or(0))?;
        }

        w.write_i32::<LittleEndian>(self.vg_offset)?;
        w.write_i32::<LittleEndian>(self.vg_size)?;

        match sub {
            RMdlSubVersion::V8 => {
                w.write_i32::<LittleEndian>(0)?;
            }
            RMdlSubVersion::V12 | RMdlSubVersion::V12_1 => {
                w.write_i32::<LittleEndian>(0)?;
                w.write_i32::<LittleEndian>(0)?;
            }
            RMdlSubVersion::V12_2 | RMdlSubVersion::V13 => {
                w.write_i32::<LittleEndian>(self.per_tri_aabb_index.unwrap_or(0))?;
                w.write_i32::<LittleEndian>(0)?;
            }
            RMdlSubVersion::V14 => {
                w.write_i32::<LittleEndian>(self.per_tri_aabb_index.unwrap_or(0))?;
                w.write_i32::<LittleEndian>(self.num_anim_seq_blocks.unwrap_or(0))?;
                w.write_i32::<LittleEndian>(0)?;
            }
            RMdlSubVersion::Unknown => unreachable!("rejected above"),
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use test_case::test_case;

    #[test_case(RMdlSubVersion::V8, 272)]
    #[test_case(RMdlSubVersion::V12, 284)]
    #[test_case(RMdlSubVersion::V12_1, 284)]
    #[test_case(RMdlSubVersion::V12_2, 284)]
    #[test_case(RMdlSubVersion::V13, 292)]
    #[test_case(RMdlSubVersion::V14, 296)]
    fn test_size_constants_match_writer(sub: RMdlSubVersion, expected: usize) {
        let hdr = RMdlHeader::default();
        let mut buf = Vec::new();
        hdr.write(&mut buf, sub).unwrap();
        assert_eq!(RMdlHeader::size_for(sub), expected);
        assert_eq!(buf.len(), expected);
    }

    #[test]
    fn test_round_trip_v14_extras() {
        let hdr = RMdlHeader {
            num_bones: 4,
            phy_offset: Some(512),
            phy_size: Some(128),
            num_vg_lods: Some(2),
            vg_lod_index: Some(640),
            per_tri_aabb_index: Some(720),
            num_anim_seq_blocks: Some(3),
            ..RMdlHeader::default()
        };

        let mut buf = Vec::new();
        hdr.write(&mut buf, RMdlSubVersion::V14).unwrap();

        let mut cursor = Cursor::new(&buf[8..]);
        let read = RMdlHeader::read(&mut cursor, RMdlSubVersion::V14).unwrap();
        assert_eq!(read.phy_offset, Some(512));
        assert_eq!(read.num_vg_lods, Some(2));
        assert_eq!(read.num_anim_seq_blocks, Some(3));
    }

    #[test]
    fn test_v8_has_no_phy() {
        let hdr = RMdlHeader {
            phy_offset: Some(512),
            ..RMdlHeader::default()
        };
        let mut buf = Vec::new();
        hdr.write(&mut buf, RMdlSubVersion::V8).unwrap();

        let mut cursor = Cursor::new(&buf[8..]);
        let read = RMdlHeader::read(&mut cursor, RMdlSubVersion::V8).unwrap();
        // The v8 layout has no physics fields to carry the value
        assert_eq!(read.phy_offset, None);
    }

    #[test]
    fn test_unknown_rejected() {
        let mut cursor = Cursor::new(vec![0u8; 512]);
        assert!(RMdlHeader::read(&mut cursor, RMdlSubVersion::Unknown).is_err());
    }
}

//! Fixed header layouts for every supported container generation
//!
//! Each generation's header is a compile-time-known structural description:
//! a typed struct read and written field by field in file order, with an
//! exact size constant. Converters rely on these layouts being bit-exact;
//! nothing here is discovered at runtime.

pub mod legacy;
pub mod rmdl;
pub mod seqdesc;
pub mod v10;

use std::io::{Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::error::Result;

/// Hitbox set record stride, stable across every supported generation
pub const HITBOX_SET_STRIDE: usize = 12;
/// Animation descriptor stride, stable across every supported generation
pub const ANIM_DESC_STRIDE: usize = 92;
/// Attachment record stride, stable across every supported generation
pub const ATTACHMENT_STRIDE: usize = 92;
/// Body part record stride, stable across every supported generation
pub const BODY_PART_STRIDE: usize = 16;

/// A three-component float vector as stored on disk
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec3 {
    /// X component
    pub x: f32,
    /// Y component
    pub y: f32,
    /// Z component
    pub z: f32,
}

impl Vec3 {
    /// Read 12 bytes of little-endian floats
    pub fn read<R: Read>(r: &mut R) -> Result<Self> {
        Ok(Self {
            x: r.read_f32::<LittleEndian>()?,
            y: r.read_f32::<LittleEndian>()?,
            z: r.read_f32::<LittleEndian>()?,
        })
    }

    /// Write 12 bytes of little-endian floats
    pub fn write<W: Write>(&self, w: &mut W) -> Result<()> {
        w.write_f32::<LittleEndian>(self.x)?;
        w.write_f32::<LittleEndian>(self.y)?;
        w.write_f32::<LittleEndian>(self.z)?;
        Ok(())
    }
}

/// The fixed-size internal name field carried by every header
pub(crate) fn read_name64<R: Read>(r: &mut R) -> Result<[u8; 64]> {
    let mut name = [0u8; 64];
    r.read_exact(&mut name)?;
    Ok(name)
}

pub(crate) fn write_name64<W: Write>(w: &mut W, name: &[u8; 64]) -> Result<()> {
    w.write_all(name)?;
    Ok(())
}

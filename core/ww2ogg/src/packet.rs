//! Wwise audio packet framing.
//!
//! Wwise prefixes each Vorbis packet with a small header whose shape depends
//! on the container generation: modern files use 2 bytes (size only) or
//! 6 bytes (size + granule), legacy files with the full header triad use
//! 8 bytes (32-bit size + granule). Multi-byte fields follow the RIFF/RIFX
//! endianness.

use crate::error::Ww2OggResult;
use byteorder::{BigEndian, LittleEndian, ReadBytesExt};
use std::io::{Read, Seek, SeekFrom};

/// Modern packet header (2 or 6 bytes).
pub struct Packet {
    /// Size of the header in bytes (2 or 6).
    pub header_size: u64,
    /// Offset of the packet payload.
    pub offset: u64,
    /// Payload size in bytes.
    pub size: u32,
    /// Granule position; 0 when the header carries none.
    pub granule: u32,
    /// Offset of the next packet header.
    pub next_offset: u64,
}

impl Packet {
    /// Read a modern packet header at `offset`. With `no_granule` only the
    /// 2-byte size field is present.
    pub fn read<R: Read + Seek>(
        stream: &mut R,
        offset: u64,
        little_endian: bool,
        no_granule: bool,
    ) -> Ww2OggResult<Self> {
        stream.seek(SeekFrom::Start(offset))?;

        let size = if little_endian {
            stream.read_u16::<LittleEndian>()?
        } else {
            stream.read_u16::<BigEndian>()?
        } as u32;

        let (header_size, granule) = if no_granule {
            (2, 0)
        } else {
            let granule = if little_endian {
                stream.read_u32::<LittleEndian>()?
            } else {
                stream.read_u32::<BigEndian>()?
            };
            (6, granule)
        };

        Ok(Self {
            header_size,
            offset: offset + header_size,
            size,
            granule,
            next_offset: offset + header_size + size as u64,
        })
    }
}

/// Legacy 8-byte packet header (files with the Vorbis header triad).
pub struct Packet8 {
    /// Size of the header in bytes (always 8).
    pub header_size: u64,
    /// Offset of the packet payload.
    pub offset: u64,
    /// Payload size in bytes.
    pub size: u32,
    /// Granule position.
    pub granule: u32,
    /// Offset of the next packet header.
    pub next_offset: u64,
}

impl Packet8 {
    /// Read a legacy packet header at `offset`.
    pub fn read<R: Read + Seek>(
        stream: &mut R,
        offset: u64,
        little_endian: bool,
    ) -> Ww2OggResult<Self> {
        stream.seek(SeekFrom::Start(offset))?;

        let (size, granule) = if little_endian {
            (
                stream.read_u32::<LittleEndian>()?,
                stream.read_u32::<LittleEndian>()?,
            )
        } else {
            (
                stream.read_u32::<BigEndian>()?,
                stream.read_u32::<BigEndian>()?,
            )
        };

        Ok(Self {
            header_size: 8,
            offset: offset + 8,
            size,
            granule,
            next_offset: offset + 8 + size as u64,
        })
    }
}

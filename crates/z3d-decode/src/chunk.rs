//! Chunk headers, tags and flag words.

use bitflags::bitflags;

use crate::cursor::{Cursor, StringLength};
use crate::error::{DecodeError, DecodeResult};

/// Raw chunk tag values.
pub mod tag {
    pub const NAME: u32 = 0x0000_0010;

    pub const TEXTUREPATH: u32 = 0x0000_0100;
    pub const TEXTURENAME: u32 = 0x0000_0101;
    pub const MESHES_DESC: u32 = 0x0000_0200;
    pub const MATERIALS_DESC: u32 = 0x0000_0300;
    pub const MATERIAL: u32 = 0x0000_0301;
    pub const OBJECT: u32 = 0x0000_0400;
    pub const SPLINES: u32 = 0x0000_0500;
    pub const HIERARCHY: u32 = 0x0000_0600;
    pub const UNRECOGNIZEDDATA: u32 = 0x0000_FFFF;

    pub const OBJECT_LOCALMATRIX: u32 = 0x0000_0401;
    pub const VERTTABLE_DESC: u32 = 0x0000_0410;
    pub const VERTTABLE_DATA: u32 = 0x0000_0411;
    pub const FACETABLE_DESC: u32 = 0x0000_0420;
    pub const FACETABLE_DATA: u32 = 0x0000_0421;

    /// End-of-stream markers.
    pub const END: u32 = 0xF0E0_0F0E;
    pub const END_ZERO: u32 = 0;
}

bitflags! {
    /// Presence bits for optional record fields.
    ///
    /// Found on generic and face descriptors, and on the per-record
    /// override word of face table records.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct RecordFlags: u32 {
        const HAS_FLAGS = 1 << 0;
        const HAS_MISC_V0 = 1 << 1;
        const HAS_MISC_V1 = 1 << 2;
        const HAS_MISC_V2 = 1 << 3;
        const HAS_MISC_V3 = 1 << 4;
        const HAS_MATERIAL = 1 << 5;
        const HAS_RENDER_FLAGS = 1 << 6;
        const HAS_UV = 1 << 7;
        const HAS_PAIR = 1 << 8;
        const HAS_RESERVED_FLAGS = 1 << 9;
    }
}

impl RecordFlags {
    /// Presence bit for misc value `index` (0..4).
    #[must_use]
    pub fn misc(index: usize) -> Self {
        Self::from_bits_retain(Self::HAS_MISC_V0.bits() << index)
    }
}

bitflags! {
    /// Presence bits on the materials descriptor.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct MaterialFlags: u32 {
        const HAS_MATERIAL_RECORD = 1 << 0;
        const HAS_PARAMS = 1 << 1;
    }
}

bitflags! {
    /// Editor state carried by objects, vertices and faces.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct StateFlags: u32 {
        const SELECTED = 1 << 0;
        const HIDDEN = 1 << 1;
    }
}

/// A `(tag, size)` pair and where it was read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkHeader {
    pub tag: u32,
    pub size: u32,
    /// Offset of the tag field.
    pub offset: usize,
}

impl ChunkHeader {
    /// Size of the tag and size fields.
    pub const LEN: usize = 8;

    pub fn read(cursor: &mut Cursor<'_>) -> DecodeResult<Self> {
        let offset = cursor.position();
        let tag = cursor.read_u32()?;
        let size = cursor.read_u32()?;
        Ok(Self { tag, size, offset })
    }

    /// Offset of the first payload byte.
    #[must_use]
    pub fn payload_offset(&self) -> usize {
        self.offset + Self::LEN
    }

    /// Offset one past the last payload byte.
    #[must_use]
    pub fn end(&self) -> usize {
        self.payload_offset() + self.size as usize
    }
}

/// Kinds of chunk found at file scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopLevelChunk {
    TexturePath,
    TextureName,
    MeshesDesc,
    MaterialsDesc,
    Material,
    Object,
    Splines,
    Hierarchy,
    UnrecognizedData,
    Unknown { tag: u32, size: u32 },
}

impl TopLevelChunk {
    /// Whether a raw tag ends the chunk stream.
    #[must_use]
    pub fn is_terminator(raw: u32) -> bool {
        raw == tag::END || raw == tag::END_ZERO
    }

    #[must_use]
    pub fn classify(header: &ChunkHeader) -> Self {
        match header.tag {
            tag::TEXTUREPATH => Self::TexturePath,
            tag::TEXTURENAME => Self::TextureName,
            tag::MESHES_DESC => Self::MeshesDesc,
            tag::MATERIALS_DESC => Self::MaterialsDesc,
            tag::MATERIAL => Self::Material,
            tag::OBJECT => Self::Object,
            tag::SPLINES => Self::Splines,
            tag::HIERARCHY => Self::Hierarchy,
            tag::UNRECOGNIZEDDATA => Self::UnrecognizedData,
            raw => Self::Unknown {
                tag: raw,
                size: header.size,
            },
        }
    }
}

/// Kinds of sub-chunk found inside an `OBJECT` chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectChunk {
    VertTableDesc,
    FaceTableDesc,
    LocalMatrix,
    VertTableData,
    FaceTableData,
    /// Anything else ends the object.
    Other { tag: u32, size: u32 },
}

impl ObjectChunk {
    #[must_use]
    pub fn classify(header: &ChunkHeader) -> Self {
        match header.tag {
            tag::VERTTABLE_DESC => Self::VertTableDesc,
            tag::FACETABLE_DESC => Self::FaceTableDesc,
            tag::OBJECT_LOCALMATRIX => Self::LocalMatrix,
            tag::VERTTABLE_DATA => Self::VertTableData,
            tag::FACETABLE_DATA => Self::FaceTableData,
            raw => Self::Other {
                tag: raw,
                size: header.size,
            },
        }
    }
}

/// Read a `NAME` sub-chunk and return its string.
pub fn read_name_chunk(cursor: &mut Cursor<'_>) -> DecodeResult<String> {
    let header = ChunkHeader::read(cursor)?;
    if header.tag != tag::NAME {
        return Err(DecodeError::MalformedChunk {
            offset: header.offset,
            expected: tag::NAME,
            found: header.tag,
        });
    }
    cursor.read_zstring(StringLength::Explicit(header.size))
}

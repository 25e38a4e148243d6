//! Little-endian builders for synthetic Z3D files.

#![allow(dead_code)]

use std::io::Write;

use flate2::Compression;
use flate2::write::ZlibEncoder;
use z3d_decode::chunk::tag;
use z3d_decode::container::MAGIC;

fn len_u32(len: usize) -> u32 {
    u32::try_from(len).unwrap()
}

/// A growable byte buffer with chainable typed writes.
#[derive(Debug, Clone, Default)]
pub struct Payload(pub Vec<u8>);

impl Payload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn bytes(mut self, bytes: &[u8]) -> Self {
        self.0.extend_from_slice(bytes);
        self
    }

    pub fn u8(self, value: u8) -> Self {
        self.bytes(&[value])
    }

    pub fn u16(self, value: u16) -> Self {
        self.bytes(&value.to_le_bytes())
    }

    pub fn u32(self, value: u32) -> Self {
        self.bytes(&value.to_le_bytes())
    }

    pub fn i32(self, value: i32) -> Self {
        self.bytes(&value.to_le_bytes())
    }

    pub fn words(self, values: &[u32]) -> Self {
        values.iter().fold(self, |p, &v| p.u32(v))
    }

    pub fn floats(self, values: &[f32]) -> Self {
        values
            .iter()
            .fold(self, |p, &v| p.bytes(&v.to_le_bytes()))
    }

    /// `(tag, size)` followed by `payload`.
    pub fn chunk(self, tag: u32, payload: &Payload) -> Self {
        self.u32(tag)
            .u32(len_u32(payload.len()))
            .bytes(&payload.0)
    }

    /// A `NAME` sub-chunk holding a terminated string.
    pub fn name(self, name: &str) -> Self {
        self.chunk(tag::NAME, &Payload::new().bytes(name.as_bytes()).u8(0))
    }

    /// A length-prefixed string without terminator.
    pub fn prefixed(self, text: &str) -> Self {
        self.u32(len_u32(text.len())).bytes(text.as_bytes())
    }
}

/// 28-byte generic descriptor.
pub fn generic_desc(num: u32, flags: u32, defaults: [u32; 5]) -> Payload {
    Payload::new().u32(num).u32(flags).words(&defaults)
}

/// Face descriptor defaults.
#[derive(Debug, Clone, Copy, Default)]
pub struct FaceDefaults {
    pub flags: u32,
    pub state: [u32; 5],
    pub material: u32,
    pub uv: [f32; 6],
    pub render: [u32; 3],
}

/// 84-byte face descriptor.
pub fn face_desc(num: u32, defaults: FaceDefaults) -> Payload {
    Payload::new()
        .u32(num)
        .u32(defaults.flags)
        .words(&defaults.state)
        .u32(defaults.material)
        .floats(&defaults.uv)
        .u32(0)
        .words(&defaults.render)
        .words(&[0; 3])
}

/// A vertex record with no optional fields, position in stream order.
pub fn plain_vertex(stream: [f32; 3]) -> Payload {
    Payload::new().floats(&stream).floats(&[0.0, 1.0, 0.0])
}

/// Index bytes for one face in stream order `(i2, i1, i0)`.
pub fn indices(width: usize, decoded: [u32; 3]) -> Payload {
    let [i0, i1, i2] = decoded;
    [i2, i1, i0].into_iter().fold(Payload::new(), |p, i| match width {
        1 => p.u8(u8::try_from(i).unwrap()),
        2 => p.u16(u16::try_from(i).unwrap()),
        _ => p.u32(i),
    })
}

/// An `OBJECT` payload: name, object state words, then sub-chunks.
pub fn object(name: &str, state: &[u32], subchunks: &[(u32, Payload)]) -> Payload {
    subchunks.iter().fold(
        Payload::new().name(name).words(state),
        |p, (tag, payload)| p.chunk(*tag, payload),
    )
}

/// A vertex table with `count` records spread along X.
pub fn vertex_table(count: u32) -> [(u32, Payload); 2] {
    let data = (0..count).fold(Payload::new(), |p, i| {
        #[allow(clippy::cast_precision_loss)]
        let x = i as f32;
        p.bytes(&plain_vertex([x, 0.0, 0.0]).0)
    });
    [
        (tag::VERTTABLE_DESC, generic_desc(count, 0, [0; 5])),
        (tag::VERTTABLE_DATA, data),
    ]
}

/// A material record (68 bytes).
pub fn material_record(diffuse: [f32; 4], power: f32) -> Payload {
    Payload::new()
        .floats(&diffuse)
        .floats(&[0.2; 4])
        .floats(&[0.0; 8])
        .floats(&[power])
}

/// A params record (56 bytes). `textures` is primary, bump, reflection,
/// reserved.
pub fn params(textures: [i32; 4], alpha_treat: u8, alpha_ref: u8) -> Payload {
    textures
        .into_iter()
        .fold(Payload::new(), Payload::i32)
        .floats(&[0.0])
        .words(&[0; 6])
        .bytes(&[alpha_treat, alpha_ref, 0, 0])
        .words(&[0, 0])
}

pub fn materials_desc(flags: u32, record: Payload, params: Payload) -> Payload {
    Payload::new()
        .u32(0)
        .u32(flags)
        .bytes(&record.0)
        .bytes(&params.0)
}

/// A file wrapping a chunk stream.
#[derive(Debug, Default)]
pub struct Z3dFile {
    body: Payload,
}

impl Z3dFile {
    pub fn new() -> Self {
        Self {
            body: Payload::new(),
        }
    }

    pub fn chunk(mut self, tag: u32, payload: &Payload) -> Self {
        self.body = self.body.chunk(tag, payload);
        self
    }

    /// Raw bytes appended to the chunk stream.
    pub fn raw(mut self, bytes: &[u8]) -> Self {
        self.body = self.body.bytes(bytes);
        self
    }

    pub fn terminate(self) -> Self {
        self.raw(&0u32.to_le_bytes())
    }

    pub fn body(&self) -> &[u8] {
        &self.body.0
    }

    /// Uncompressed file with the given declared length.
    pub fn stored_with_length(&self, length: u32) -> Vec<u8> {
        Payload::new()
            .u32(MAGIC)
            .u32(0)
            .u32(length)
            .bytes(&self.body.0)
            .0
    }

    pub fn stored(&self) -> Vec<u8> {
        self.stored_with_length(len_u32(self.body.len()))
    }

    /// zlib-compressed file.
    pub fn compressed(&self) -> Vec<u8> {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&self.body.0).unwrap();
        let deflated = encoder.finish().unwrap();
        Payload::new()
            .u32(MAGIC)
            .u32(1)
            .u32(len_u32(self.body.len()))
            .bytes(&deflated)
            .0
    }
}

//! `OBJECT` chunks: vertex tables, face tables and the local matrix.

use glam::{Mat4, Vec3};

use crate::chunk::{ChunkHeader, ObjectChunk, RecordFlags, read_name_chunk};
use crate::cursor::Cursor;
use crate::descriptor::{FaceDescriptor, GenericDescriptor, RecordState, RenderFlags, StreamUv};
use crate::diagnostic::{DiagnosticKind, Diagnostics, FaceRejection};
use crate::error::DecodeResult;
use crate::normals::recompute_normals;
use crate::scene::{Face, MaterialSlots, SceneObject, Vertex};
use crate::transform::{convert_vector, inverse_or_identity, placement_from_stream};

/// Objects with this name hold UV editor state, not geometry.
pub const UV_MAPPER_OBJECT: &str = "UVMapperDATA";

/// Byte width of the vertex indices in a face table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexWidth {
    U8,
    U16,
    U32,
}

impl IndexWidth {
    /// Pick the width from the number of vertices declared so far in the
    /// object.
    #[must_use]
    pub fn for_vertex_count(count: u64) -> Self {
        if count <= 0x100 {
            Self::U8
        } else if count <= 0x1_0000 {
            Self::U16
        } else {
            Self::U32
        }
    }

    #[must_use]
    pub fn size(self) -> usize {
        match self {
            Self::U8 => 1,
            Self::U16 => 2,
            Self::U32 => 4,
        }
    }

    pub fn read(self, cursor: &mut Cursor<'_>) -> DecodeResult<u32> {
        match self {
            Self::U8 => cursor.read_u8().map(u32::from),
            Self::U16 => cursor.read_u16().map(u32::from),
            Self::U32 => cursor.read_u32(),
        }
    }
}

/// Everything an object decode needs from the enclosing pass.
pub(crate) struct ObjectScope<'a> {
    pub meshes: &'a GenericDescriptor,
    pub material_count: usize,
    pub diagnostics: &'a mut Diagnostics,
}

/// Decode one `OBJECT` chunk whose header has already been read.
///
/// Returns `None` for UV mapper objects. The caller seeks to the chunk end
/// afterwards, so sub-chunks are never resynchronised here.
pub(crate) fn decode_object(
    cursor: &mut Cursor<'_>,
    header: &ChunkHeader,
    scope: &mut ObjectScope<'_>,
) -> DecodeResult<Option<SceneObject>> {
    let end = header.end();
    let name = read_name_chunk(cursor)?;
    if name == UV_MAPPER_OBJECT {
        tracing::debug!("Skipping {UV_MAPPER_OBJECT} object");
        return Ok(None);
    }

    let state = scope.meshes.read_state(cursor)?;
    let mut builder = ObjectBuilder::new(name, state, scope.material_count);
    let mut vertex_desc: Option<GenericDescriptor> = None;
    let mut face_desc: Option<FaceDescriptor> = None;

    while cursor.position() < end {
        let sub = ChunkHeader::read(cursor)?;
        let kind = ObjectChunk::classify(&sub);
        tracing::debug!("  {kind:?} ({} bytes) at {}", sub.size, sub.offset);
        match kind {
            ObjectChunk::VertTableDesc => vertex_desc = Some(GenericDescriptor::read(cursor)?),
            ObjectChunk::FaceTableDesc => face_desc = Some(FaceDescriptor::read(cursor)?),
            ObjectChunk::LocalMatrix => {
                let columns = cursor.read_f32_array::<16>()?;
                builder.apply_local_matrix(Mat4::from_cols_array(&columns));
            }
            ObjectChunk::VertTableData => match &vertex_desc {
                Some(desc) => builder.read_vertices(cursor, desc)?,
                None => skip_orphan_table(cursor, &sub, scope.diagnostics),
            },
            ObjectChunk::FaceTableData => match &face_desc {
                Some(desc) => builder.read_faces(cursor, desc, scope.diagnostics)?,
                None => skip_orphan_table(cursor, &sub, scope.diagnostics),
            },
            ObjectChunk::Other { tag, .. } => {
                scope
                    .diagnostics
                    .push(sub.offset, DiagnosticKind::UnknownObjectChunk { tag });
                break;
            }
        }
    }

    Ok(Some(builder.finish()))
}

fn skip_orphan_table(cursor: &mut Cursor<'_>, sub: &ChunkHeader, diagnostics: &mut Diagnostics) {
    diagnostics.push(
        sub.offset,
        DiagnosticKind::MissingDescriptor { data_tag: sub.tag },
    );
    cursor.skip(sub.size as usize);
}

/// Accumulates one object's tables.
struct ObjectBuilder {
    object: SceneObject,
    /// Sum of every vertex table's declared count.
    declared_vertices: u64,
    slots: MaterialSlots,
    material_count: usize,
}

impl ObjectBuilder {
    fn new(name: String, state: RecordState, material_count: usize) -> Self {
        let mut object = SceneObject::new(name);
        object.flags = state.flags;
        object.misc = state.misc;
        Self {
            object,
            declared_vertices: 0,
            slots: MaterialSlots::default(),
            material_count,
        }
    }

    /// Set the placement and move vertices read so far into object space.
    fn apply_local_matrix(&mut self, local: Mat4) {
        let placement = placement_from_stream(local);
        let inverse = inverse_or_identity(&placement);
        for vertex in &mut self.object.vertices {
            vertex.position = inverse.transform_point3(vertex.position);
        }
        self.object.placement = placement;
    }

    fn read_vertices(&mut self, cursor: &mut Cursor<'_>, desc: &GenericDescriptor) -> DecodeResult<()> {
        self.declared_vertices += u64::from(desc.num);
        for _ in 0..desc.num {
            let position = convert_vector(cursor.read_f32_array::<3>()?);
            // Stored normal; rebuilt once the object is complete.
            cursor.read_bytes(12)?;
            let state = desc.read_state(cursor)?;
            self.object.vertices.push(Vertex {
                position,
                normal: Vec3::ZERO,
                flags: state.flags,
                misc: state.misc,
            });
        }
        Ok(())
    }

    fn read_faces(
        &mut self,
        cursor: &mut Cursor<'_>,
        desc: &FaceDescriptor,
        diagnostics: &mut Diagnostics,
    ) -> DecodeResult<()> {
        let width = IndexWidth::for_vertex_count(self.declared_vertices);
        tracing::debug!(
            "  {} faces with {}-byte indices",
            desc.num,
            width.size()
        );

        for record in 0..desc.num as usize {
            let offset = cursor.position();
            let record_face = FaceRecord::read(cursor, desc, width)?;
            match self.build_face(&record_face) {
                Ok(face) => self.object.faces.push(face),
                Err(reason) => diagnostics.push(
                    offset,
                    DiagnosticKind::RejectedFace {
                        object: self.object.name.clone(),
                        record,
                        reason,
                    },
                ),
            }
        }
        Ok(())
    }

    /// Validate a record against the vertex table and resolve its slot.
    ///
    /// Slots are only allocated for faces that are kept.
    fn build_face(&mut self, record: &FaceRecord) -> Result<Face, FaceRejection> {
        let vertex_count = self.object.vertices.len();
        let mut hidden = record.state.is_hidden();
        for &index in &record.indices {
            let vertex = self
                .object
                .vertices
                .get(index as usize)
                .ok_or(FaceRejection::IndexOutOfRange {
                    index,
                    vertex_count,
                })?;
            hidden |= vertex.is_hidden();
        }

        let [a, b, c] = record.indices;
        if a == b || b == c || a == c {
            return Err(FaceRejection::Degenerate);
        }

        Ok(Face {
            indices: record.indices,
            uvs: record.uv.corners(),
            material: record.material,
            material_slot: self.slots.resolve(record.material, self.material_count),
            flags: record.state.flags,
            misc: record.state.misc,
            render_flags: record.render_flags,
            hidden,
        })
    }

    fn finish(mut self) -> SceneObject {
        recompute_normals(&mut self.object.vertices, &self.object.faces);
        self.object.material_slots = self.slots.into_slots();
        tracing::debug!(
            "Decoded object {:?}: {} vertices, {} faces, {} material slots",
            self.object.name,
            self.object.vertices.len(),
            self.object.faces.len(),
            self.object.material_slots.len()
        );
        self.object
    }
}

/// One face table record with descriptor defaults applied.
#[derive(Debug, Clone, Copy, PartialEq)]
struct FaceRecord {
    /// Corners in decoded winding order.
    indices: [u32; 3],
    state: RecordState,
    material: u32,
    render_flags: RenderFlags,
    uv: StreamUv,
}

impl FaceRecord {
    fn read(cursor: &mut Cursor<'_>, desc: &FaceDescriptor, width: IndexWidth) -> DecodeResult<Self> {
        let i2 = width.read(cursor)?;
        let i1 = width.read(cursor)?;
        let i0 = width.read(cursor)?;
        let present = RecordFlags::from_bits_retain(cursor.read_u32()?);

        let state = RecordState::read(cursor, present, &desc.defaults)?;
        let material = cursor.read_if(
            present.contains(RecordFlags::HAS_MATERIAL),
            desc.material,
            Cursor::read_u32,
        )?;
        let render_flags = cursor.read_if(
            present.contains(RecordFlags::HAS_RENDER_FLAGS),
            desc.render_flags,
            RenderFlags::read,
        )?;
        if present.contains(RecordFlags::HAS_PAIR) {
            cursor.read_bytes(4)?;
        }
        if present.contains(RecordFlags::HAS_RESERVED_FLAGS) {
            cursor.read_bytes(12)?;
        }
        let uv = cursor.read_if(present.contains(RecordFlags::HAS_UV), desc.uv, StreamUv::read)?;

        Ok(Self {
            indices: [i0, i1, i2],
            state,
            material,
            render_flags,
            uv,
        })
    }
}

//! Table descriptors and the fixed-layout records they carry.
//!
//! A descriptor announces how many records follow, which optional fields
//! those records contain, and the value every absent field takes.

use glam::{Vec2, Vec4};

use crate::chunk::{MaterialFlags, RecordFlags, StateFlags};
use crate::cursor::Cursor;
use crate::error::DecodeResult;

/// Flags and misc values shared by objects, vertices and faces.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecordState {
    pub flags: StateFlags,
    pub misc: [u32; 4],
}

impl RecordState {
    /// Read the fields whose bits are set in `present`; the rest come from
    /// `defaults` (`[flags, misc0, misc1, misc2, misc3]`).
    pub fn read(
        cursor: &mut Cursor<'_>,
        present: RecordFlags,
        defaults: &[u32; 5],
    ) -> DecodeResult<Self> {
        let flags = cursor.read_if(
            present.contains(RecordFlags::HAS_FLAGS),
            defaults[0],
            Cursor::read_u32,
        )?;
        let mut misc = [0; 4];
        for (index, value) in misc.iter_mut().enumerate() {
            *value = cursor.read_if(
                present.contains(RecordFlags::misc(index)),
                defaults[index + 1],
                Cursor::read_u32,
            )?;
        }
        Ok(Self {
            flags: StateFlags::from_bits_retain(flags),
            misc,
        })
    }

    #[must_use]
    pub fn is_hidden(&self) -> bool {
        self.flags.contains(StateFlags::HIDDEN)
    }

    #[must_use]
    pub fn is_selected(&self) -> bool {
        self.flags.contains(StateFlags::SELECTED)
    }
}

/// Descriptor for mesh and vertex tables (28 bytes).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GenericDescriptor {
    /// Number of records that follow.
    pub num: u32,
    /// Which optional fields each record carries.
    pub flags: RecordFlags,
    /// Default flags word followed by the four default misc values.
    pub defaults: [u32; 5],
}

impl GenericDescriptor {
    pub const SIZE: usize = 28;

    pub fn read(cursor: &mut Cursor<'_>) -> DecodeResult<Self> {
        let num = cursor.read_u32()?;
        let flags = RecordFlags::from_bits_retain(cursor.read_u32()?);
        let mut defaults = [0; 5];
        for value in &mut defaults {
            *value = cursor.read_u32()?;
        }
        Ok(Self {
            num,
            flags,
            defaults,
        })
    }

    /// Read a record state governed by this descriptor's own flag word.
    pub fn read_state(&self, cursor: &mut Cursor<'_>) -> DecodeResult<RecordState> {
        RecordState::read(cursor, self.flags, &self.defaults)
    }
}

/// Render, blend and wrap words of a face.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderFlags {
    pub render: u32,
    pub blend: u32,
    pub wrap: u32,
}

impl RenderFlags {
    pub fn read(cursor: &mut Cursor<'_>) -> DecodeResult<Self> {
        Ok(Self {
            render: cursor.read_u32()?,
            blend: cursor.read_u32()?,
            wrap: cursor.read_u32()?,
        })
    }
}

/// Texture coordinates as stored: `u1, u2, u3, v1, v2, v3`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StreamUv {
    pub u: [f32; 3],
    pub v: [f32; 3],
}

impl StreamUv {
    pub fn read(cursor: &mut Cursor<'_>) -> DecodeResult<Self> {
        let [u1, u2, u3, v1, v2, v3] = cursor.read_f32_array::<6>()?;
        Ok(Self {
            u: [u1, u2, u3],
            v: [v1, v2, v3],
        })
    }

    /// Per-corner coordinates in decoded winding order.
    ///
    /// Faces are stored with reversed winding, so corner `k` takes stream
    /// pair `2 - k`, and V is flipped to a bottom-left origin.
    #[must_use]
    pub fn corners(&self) -> [Vec2; 3] {
        std::array::from_fn(|k| Vec2::new(self.u[2 - k], 1.0 - self.v[2 - k]))
    }
}

/// Descriptor for face tables (84 bytes).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FaceDescriptor {
    pub num: u32,
    pub flags: RecordFlags,
    pub defaults: [u32; 5],
    /// Raw material id used when a record does not override it.
    pub material: u32,
    pub uv: StreamUv,
    pub pair_index: u32,
    pub render_flags: RenderFlags,
}

impl FaceDescriptor {
    pub const SIZE: usize = 84;

    pub fn read(cursor: &mut Cursor<'_>) -> DecodeResult<Self> {
        let GenericDescriptor {
            num,
            flags,
            defaults,
        } = GenericDescriptor::read(cursor)?;
        let material = cursor.read_u32()?;
        let uv = StreamUv::read(cursor)?;
        let pair_index = cursor.read_u32()?;
        let render_flags = RenderFlags::read(cursor)?;
        // Three reserved words.
        cursor.read_bytes(12)?;
        Ok(Self {
            num,
            flags,
            defaults,
            material,
            uv,
            pair_index,
            render_flags,
        })
    }
}

/// Direct3D 7 style material colours (68 bytes).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MaterialRecord {
    pub diffuse: Vec4,
    pub ambient: Vec4,
    pub specular: Vec4,
    pub emissive: Vec4,
    pub power: f32,
}

impl MaterialRecord {
    pub const SIZE: usize = 68;

    pub fn read(cursor: &mut Cursor<'_>) -> DecodeResult<Self> {
        Ok(Self {
            diffuse: cursor.read_vec4()?,
            ambient: cursor.read_vec4()?,
            specular: cursor.read_vec4()?,
            emissive: cursor.read_vec4()?,
            power: cursor.read_f32()?,
        })
    }
}

/// Texture stages and blending state of a material (56 bytes).
///
/// Texture fields hold `-1` when the stage is unused; any other value means
/// a texture name chunk follows the material record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaterialParams {
    pub primary_texture: i32,
    pub bump_texture: i32,
    pub reflection_texture: i32,
    pub reserved_texture: i32,
    pub shine: f32,
    pub primary_apply: u32,
    pub bump_apply: u32,
    pub reflection_apply: u32,
    pub reserved_apply: u32,
    pub src_blend: u32,
    pub dst_blend: u32,
    pub alpha_treat: u8,
    pub alpha_ref: u8,
    pub alpha_func: u8,
    pub color_key_low: u32,
    pub color_key_high: u32,
}

impl Default for MaterialParams {
    fn default() -> Self {
        Self {
            primary_texture: -1,
            bump_texture: -1,
            reflection_texture: -1,
            reserved_texture: -1,
            shine: 0.0,
            primary_apply: 0,
            bump_apply: 0,
            reflection_apply: 0,
            reserved_apply: 0,
            src_blend: 0,
            dst_blend: 0,
            alpha_treat: 0,
            alpha_ref: 0,
            alpha_func: 0,
            color_key_low: 0,
            color_key_high: 0,
        }
    }
}

impl MaterialParams {
    pub const SIZE: usize = 56;

    pub fn read(cursor: &mut Cursor<'_>) -> DecodeResult<Self> {
        let primary_texture = cursor.read_i32()?;
        let bump_texture = cursor.read_i32()?;
        let reflection_texture = cursor.read_i32()?;
        let reserved_texture = cursor.read_i32()?;
        let shine = cursor.read_f32()?;
        let primary_apply = cursor.read_u32()?;
        let bump_apply = cursor.read_u32()?;
        let reflection_apply = cursor.read_u32()?;
        let reserved_apply = cursor.read_u32()?;
        let src_blend = cursor.read_u32()?;
        let dst_blend = cursor.read_u32()?;
        let alpha_treat = cursor.read_u8()?;
        let alpha_ref = cursor.read_u8()?;
        let alpha_func = cursor.read_u8()?;
        let _unused = cursor.read_u8()?;
        let color_key_low = cursor.read_u32()?;
        let color_key_high = cursor.read_u32()?;
        Ok(Self {
            primary_texture,
            bump_texture,
            reflection_texture,
            reserved_texture,
            shine,
            primary_apply,
            bump_apply,
            reflection_apply,
            reserved_apply,
            src_blend,
            dst_blend,
            alpha_treat,
            alpha_ref,
            alpha_func,
            color_key_low,
            color_key_high,
        })
    }
}

/// Defaults for every following `MATERIAL` chunk.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MaterialsDescriptor {
    pub num: u32,
    pub flags: MaterialFlags,
    pub material: MaterialRecord,
    pub params: MaterialParams,
}

impl MaterialsDescriptor {
    pub fn read(cursor: &mut Cursor<'_>) -> DecodeResult<Self> {
        let num = cursor.read_u32()?;
        let flags = MaterialFlags::from_bits_retain(cursor.read_u32()?);
        let mut material = MaterialRecord::read(cursor)?;
        // The ambient term is never used and often holds garbage.
        material.ambient = Vec4::ZERO;
        let params = MaterialParams::read(cursor)?;
        Ok(Self {
            num,
            flags,
            material,
            params,
        })
    }
}

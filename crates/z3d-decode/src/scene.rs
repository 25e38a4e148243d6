//! The decoded scene graph.
//!
//! Everything here is plain data. Positions, normals and placement
//! matrices are already in the right-handed Z-up scene space, and faces
//! carry per-corner texture coordinates with a bottom-left origin.

use std::collections::HashMap;

use glam::{Mat4, Vec2, Vec3, Vec4};

use crate::chunk::StateFlags;
use crate::descriptor::{MaterialParams, MaterialRecord, RenderFlags};
use crate::diagnostic::Diagnostic;

/// A fully decoded Z3D file.
///
/// `T` is the texture handle type produced by the
/// [`TextureResolver`](crate::TextureResolver) used for the decode.
#[derive(Debug, Clone)]
pub struct Scene<T = ()> {
    /// `TEXTUREPATH` entries in arrival order.
    pub texture_paths: Vec<String>,
    /// `TEXTURENAME` entries in arrival order.
    pub texture_names: Vec<String>,
    /// Global material table. A material's index is its raw id.
    pub materials: Vec<Material<T>>,
    pub objects: Vec<SceneObject>,
    /// Recovered anomalies in the order they were found.
    pub diagnostics: Vec<Diagnostic>,
}

impl<T> Default for Scene<T> {
    fn default() -> Self {
        Self {
            texture_paths: Vec::new(),
            texture_names: Vec::new(),
            materials: Vec::new(),
            objects: Vec::new(),
            diagnostics: Vec::new(),
        }
    }
}

impl<T> Scene<T> {
    /// The most recently decoded object called `name`.
    #[must_use]
    pub fn object_by_name(&self, name: &str) -> Option<(usize, &SceneObject)> {
        self.objects
            .iter()
            .enumerate()
            .rev()
            .find(|(_, object)| object.name == name)
    }

    /// Indices of objects without a parent.
    pub fn roots(&self) -> impl Iterator<Item = usize> + '_ {
        self.objects
            .iter()
            .enumerate()
            .filter(|(_, object)| object.parent.is_none())
            .map(|(index, _)| index)
    }

    /// Indices of the direct children of `parent`.
    pub fn children_of(&self, parent: usize) -> impl Iterator<Item = usize> + '_ {
        self.objects
            .iter()
            .enumerate()
            .filter(move |(_, object)| object.parent == Some(parent))
            .map(|(index, _)| index)
    }

    /// Total vertex and face counts over all objects.
    #[must_use]
    pub fn totals(&self) -> (usize, usize) {
        self.objects.iter().fold((0, 0), |(v, f), object| {
            (v + object.vertices.len(), f + object.faces.len())
        })
    }

    /// Replace every texture handle, keeping the rest of the scene.
    pub fn map_textures<U>(self, mut f: impl FnMut(T) -> U) -> Scene<U> {
        let materials = self
            .materials
            .into_iter()
            .map(|material| material.map_textures(&mut f))
            .collect();
        Scene {
            texture_paths: self.texture_paths,
            texture_names: self.texture_names,
            materials,
            objects: self.objects,
            diagnostics: self.diagnostics,
        }
    }
}

/// A named mesh with its own placement.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneObject {
    pub name: String,
    pub flags: StateFlags,
    pub misc: [u32; 4],
    pub vertices: Vec<Vertex>,
    pub faces: Vec<Face>,
    /// Object-local material slots. Entry `k` is the global material index
    /// used by faces whose `material_slot` is `Some(k)`.
    pub material_slots: Vec<usize>,
    /// Local-to-parent transform.
    pub placement: Mat4,
    /// Index of the parent object in [`Scene::objects`].
    pub parent: Option<usize>,
}

impl SceneObject {
    #[must_use]
    pub fn new(name: String) -> Self {
        Self {
            name,
            flags: StateFlags::empty(),
            misc: [0; 4],
            vertices: Vec::new(),
            faces: Vec::new(),
            material_slots: Vec::new(),
            placement: Mat4::IDENTITY,
            parent: None,
        }
    }

    #[must_use]
    pub fn is_hidden(&self) -> bool {
        self.flags.contains(StateFlags::HIDDEN)
    }

    #[must_use]
    pub fn is_selected(&self) -> bool {
        self.flags.contains(StateFlags::SELECTED)
    }

    /// Faces assigned to material slot `slot`.
    pub fn faces_in_slot(&self, slot: Option<usize>) -> impl Iterator<Item = &Face> + '_ {
        self.faces
            .iter()
            .filter(move |face| face.material_slot == slot)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub position: Vec3,
    /// Angle-weighted average of the adjacent face normals.
    pub normal: Vec3,
    pub flags: StateFlags,
    pub misc: [u32; 4],
}

impl Vertex {
    #[must_use]
    pub fn is_hidden(&self) -> bool {
        self.flags.contains(StateFlags::HIDDEN)
    }
}

/// A triangle, wound counter-clockwise in scene space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Face {
    pub indices: [u32; 3],
    /// Texture coordinate of each corner.
    pub uvs: [Vec2; 3],
    /// Raw material id as stored.
    pub material: u32,
    /// Object-local slot, `None` when the raw id names no material.
    pub material_slot: Option<usize>,
    pub flags: StateFlags,
    pub misc: [u32; 4],
    pub render_flags: RenderFlags,
    /// Hidden itself or touching a hidden vertex.
    pub hidden: bool,
}

impl Face {
    #[must_use]
    pub fn is_selected(&self) -> bool {
        self.flags.contains(StateFlags::SELECTED)
    }
}

/// How a material treats its alpha channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AlphaMode {
    Opaque,
    /// Alpha-tested against `threshold` in `[0, 1]`.
    Clip { threshold: f32 },
    /// Translucent, rendered dithered.
    Hashed,
}

impl AlphaMode {
    /// Map the `alpha_treat` and `alpha_ref` params fields.
    #[must_use]
    pub fn from_params(params: &MaterialParams) -> Self {
        match params.alpha_treat {
            2 => Self::Clip {
                threshold: f32::from(params.alpha_ref) / 255.0,
            },
            1 => Self::Hashed,
            _ => Self::Opaque,
        }
    }
}

/// One of the four texture stages a material can bind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureSlot {
    Primary,
    Reflection,
    Bump,
    Reserved,
}

impl TextureSlot {
    /// Slots in the order their name chunks appear in the stream.
    pub const STREAM_ORDER: [Self; 4] = [Self::Primary, Self::Reflection, Self::Bump, Self::Reserved];

    /// The params field selecting this slot, `-1` when unused.
    #[must_use]
    pub fn index_in(self, params: &MaterialParams) -> i32 {
        match self {
            Self::Primary => params.primary_texture,
            Self::Reflection => params.reflection_texture,
            Self::Bump => params.bump_texture,
            Self::Reserved => params.reserved_texture,
        }
    }
}

/// A texture name bound to a material slot.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureBinding<T> {
    pub slot: TextureSlot,
    pub name: String,
    /// The resolved handle, `None` when the name was never resolved.
    pub texture: Option<T>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Material<T = ()> {
    pub name: String,
    pub record: MaterialRecord,
    pub params: MaterialParams,
    pub alpha_mode: AlphaMode,
    /// Bound texture stages in stream order.
    pub textures: Vec<TextureBinding<T>>,
}

impl<T> Material<T> {
    #[must_use]
    pub fn texture(&self, slot: TextureSlot) -> Option<&TextureBinding<T>> {
        self.textures.iter().find(|binding| binding.slot == slot)
    }

    #[must_use]
    pub fn base_color(&self) -> Vec4 {
        self.record.diffuse
    }

    fn map_textures<U>(self, f: &mut impl FnMut(T) -> U) -> Material<U> {
        Material {
            name: self.name,
            record: self.record,
            params: self.params,
            alpha_mode: self.alpha_mode,
            textures: self
                .textures
                .into_iter()
                .map(|binding| TextureBinding {
                    slot: binding.slot,
                    name: binding.name,
                    texture: binding.texture.map(&mut *f),
                })
                .collect(),
        }
    }
}

/// Maps raw material ids to object-local slots in first-use order.
#[derive(Debug, Default)]
pub(crate) struct MaterialSlots {
    by_raw: HashMap<u32, usize>,
    slots: Vec<usize>,
}

impl MaterialSlots {
    /// Slot for `raw`, allocating the next one on first use. Raw ids that
    /// do not name a material get no slot.
    pub fn resolve(&mut self, raw: u32, material_count: usize) -> Option<usize> {
        if let Some(&slot) = self.by_raw.get(&raw) {
            return Some(slot);
        }
        let global = usize::try_from(raw).ok().filter(|&id| id < material_count)?;
        let slot = self.slots.len();
        self.slots.push(global);
        self.by_raw.insert(raw, slot);
        Some(slot)
    }

    pub fn into_slots(self) -> Vec<usize> {
        self.slots
    }
}

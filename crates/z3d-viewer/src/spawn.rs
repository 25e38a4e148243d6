//! Turning a loaded scene into Bevy entities.
//!
//! Every object becomes an entity carrying its placement, parented the
//! same way as in the file. Its faces are split by material slot into one
//! mesh per slot, with vertices emitted per face corner so each corner
//! keeps its own texture coordinate.

use std::collections::HashMap;
use std::f32::consts::FRAC_PI_2;
use std::path::PathBuf;
use std::sync::Arc;

use bevy::asset::RenderAssetUsages;
use bevy::image::{ImageAddressMode, ImageSampler, ImageSamplerDescriptor};
use bevy::mesh::{Indices, PrimitiveTopology};
use bevy::prelude::*;
use bevy::render::render_resource::{Extent3d, TextureDimension, TextureFormat};
use z3d::{LoadedScene, Material as SceneMaterial, SceneObject, Texture, TextureSlot};

/// Rotation taking the scene's Z-up space to Bevy's Y-up space.
#[must_use]
pub fn scene_to_world() -> Quat {
    Quat::from_rotation_x(-FRAC_PI_2)
}

/// Marker for the entity all scene objects hang from.
#[derive(Component)]
pub struct SceneRoot;

/// Links a spawned entity back to its object in the scene.
#[derive(Component, Debug, Clone, Copy)]
pub struct SceneObjectIndex(pub usize);

/// Asset storages written while spawning.
pub struct SceneAssets<'a> {
    pub meshes: &'a mut Assets<Mesh>,
    pub materials: &'a mut Assets<StandardMaterial>,
    pub images: &'a mut Assets<Image>,
}

/// Spawn `loaded` under a new root entity and return the root.
pub fn spawn_scene(
    commands: &mut Commands,
    assets: &mut SceneAssets<'_>,
    loaded: &LoadedScene,
) -> Entity {
    let scene = &loaded.scene;
    let root = commands
        .spawn((
            SceneRoot,
            Name::new(loaded.path.display().to_string()),
            Transform::from_rotation(scene_to_world()),
            Visibility::default(),
        ))
        .id();

    let mut textures = HashMap::new();
    let materials: Vec<Handle<StandardMaterial>> = scene
        .materials
        .iter()
        .map(|material| {
            let texture = primary_image(material, &mut textures, assets.images);
            assets.materials.add(standard_material(material, texture))
        })
        .collect();
    let fallback = assets.materials.add(StandardMaterial::default());

    let entities: Vec<Entity> = scene
        .objects
        .iter()
        .enumerate()
        .map(|(index, object)| {
            let visibility = if object.is_hidden() {
                Visibility::Hidden
            } else {
                Visibility::Inherited
            };
            commands
                .spawn((
                    SceneObjectIndex(index),
                    Name::new(object.name.clone()),
                    Transform::from_matrix(object.placement),
                    visibility,
                ))
                .id()
        })
        .collect();

    let mut mesh_count = 0;
    for (object, &entity) in scene.objects.iter().zip(&entities) {
        let parent = object
            .parent
            .and_then(|parent| entities.get(parent).copied())
            .unwrap_or(root);
        commands.entity(entity).insert(ChildOf(parent));

        let slots = object
            .material_slots
            .iter()
            .enumerate()
            .map(|(slot, &material)| (Some(slot), materials.get(material)))
            .chain(std::iter::once((None, None)));
        for (slot, material) in slots {
            let Some(mesh) = slot_mesh(object, slot) else {
                continue;
            };
            commands.spawn((
                Mesh3d(assets.meshes.add(mesh)),
                MeshMaterial3d(material.unwrap_or(&fallback).clone()),
                ChildOf(entity),
            ));
            mesh_count += 1;
        }
    }

    tracing::info!(
        "Spawned {} objects as {mesh_count} meshes with {} materials and {} textures",
        entities.len(),
        materials.len(),
        textures.len()
    );
    root
}

/// Geometry of the visible faces in one material slot.
#[derive(Debug, Default, PartialEq)]
pub struct SlotGeometry {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    pub indices: Vec<u32>,
}

impl SlotGeometry {
    /// Collect the corners of every visible face in `slot`.
    ///
    /// `None` selects faces without a material. Texture coordinates are
    /// flipped to a top-left origin.
    #[must_use]
    pub fn collect(object: &SceneObject, slot: Option<usize>) -> Self {
        let mut geometry = Self::default();
        for face in object.faces_in_slot(slot).filter(|face| !face.hidden) {
            let corners = face.indices.map(|index| object.vertices.get(index as usize));
            let [Some(a), Some(b), Some(c)] = corners else {
                continue;
            };
            for (vertex, uv) in [a, b, c].into_iter().zip(face.uvs) {
                let index = u32::try_from(geometry.positions.len()).unwrap_or(u32::MAX);
                geometry.positions.push(vertex.position.to_array());
                geometry.normals.push(vertex.normal.to_array());
                geometry.uvs.push([uv.x, 1.0 - uv.y]);
                geometry.indices.push(index);
            }
        }
        geometry
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    #[must_use]
    pub fn into_mesh(self) -> Mesh {
        let mut mesh = Mesh::new(
            PrimitiveTopology::TriangleList,
            RenderAssetUsages::default(),
        );
        mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, self.positions);
        mesh.insert_attribute(Mesh::ATTRIBUTE_NORMAL, self.normals);
        mesh.insert_attribute(Mesh::ATTRIBUTE_UV_0, self.uvs);
        mesh.insert_indices(Indices::U32(self.indices));
        mesh
    }
}

/// Mesh for one material slot, `None` when the slot has no visible faces.
#[must_use]
pub fn slot_mesh(object: &SceneObject, slot: Option<usize>) -> Option<Mesh> {
    let geometry = SlotGeometry::collect(object, slot);
    (!geometry.is_empty()).then(|| geometry.into_mesh())
}

/// Convert a scene material.
///
/// A primary texture replaces the diffuse colour and supplies alpha.
#[must_use]
pub fn standard_material(
    material: &SceneMaterial<Arc<Texture>>,
    texture: Option<Handle<Image>>,
) -> StandardMaterial {
    let record = &material.record;
    let diffuse = material.base_color();
    let base_color = if texture.is_some() {
        Color::WHITE
    } else {
        Color::srgba(diffuse.x, diffuse.y, diffuse.z, diffuse.w)
    };
    let alpha_mode = match material.alpha_mode {
        z3d::AlphaMode::Opaque => AlphaMode::Opaque,
        z3d::AlphaMode::Clip { threshold } => AlphaMode::Mask(threshold),
        z3d::AlphaMode::Hashed => AlphaMode::AlphaToCoverage,
    };

    StandardMaterial {
        base_color,
        base_color_texture: texture,
        emissive: LinearRgba::rgb(record.emissive.x, record.emissive.y, record.emissive.z),
        reflectance: (record.power / 100.0).clamp(0.0, 1.0),
        alpha_mode,
        double_sided: false,
        ..default()
    }
}

/// Upload the material's primary texture once per file.
fn primary_image(
    material: &SceneMaterial<Arc<Texture>>,
    cache: &mut HashMap<PathBuf, Handle<Image>>,
    images: &mut Assets<Image>,
) -> Option<Handle<Image>> {
    let texture = material
        .texture(TextureSlot::Primary)?
        .texture
        .as_ref()?;
    if let Some(handle) = cache.get(&texture.path) {
        return Some(handle.clone());
    }
    let handle = images.add(bevy_image(texture)?);
    cache.insert(texture.path.clone(), handle.clone());
    Some(handle)
}

/// RGBA8 pixels as a repeating sRGB texture.
fn bevy_image(texture: &Texture) -> Option<Image> {
    let pixels = texture.image.as_ref()?;
    let (width, height) = pixels.dimensions();
    let mut image = Image::new(
        Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        TextureDimension::D2,
        pixels.as_raw().clone(),
        TextureFormat::Rgba8UnormSrgb,
        RenderAssetUsages::RENDER_WORLD,
    );
    image.sampler = ImageSampler::Descriptor(ImageSamplerDescriptor {
        address_mode_u: ImageAddressMode::Repeat,
        address_mode_v: ImageAddressMode::Repeat,
        ..ImageSamplerDescriptor::linear()
    });
    Some(image)
}

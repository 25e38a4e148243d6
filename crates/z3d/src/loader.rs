//! Reading scenes from disk.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use glam::{Mat4, Vec3};
use z3d_decode::{DecodeOptions, Scene, decode_with};

use crate::error::{Error, Result};
use crate::texture::{FsTextureResolver, Texture};

/// Settings for [`load_with_options`].
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Directories searched after the scene's own texture paths and before
    /// the scene's directory.
    pub texture_search_paths: Vec<PathBuf>,
    /// Decode found textures into RGBA8 pixels. When off, textures are
    /// only located.
    pub decode_images: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            texture_search_paths: Vec::new(),
            decode_images: true,
        }
    }
}

/// A scene together with the file it came from.
#[derive(Debug, Clone)]
pub struct LoadedScene {
    pub path: PathBuf,
    pub scene: Scene<Arc<Texture>>,
}

impl LoadedScene {
    /// Placement of object `index` composed with all of its ancestors.
    #[must_use]
    pub fn world_matrix(&self, index: usize) -> Mat4 {
        let objects = &self.scene.objects;
        let mut matrix = Mat4::IDENTITY;
        let mut current = Some(index);
        // Parent links are acyclic; the step bound only guards bad input.
        for _ in 0..objects.len() {
            let Some(object) = current.and_then(|i| objects.get(i)) else {
                break;
            };
            matrix = object.placement * matrix;
            current = object.parent;
        }
        matrix
    }

    /// Axis-aligned bounds of every vertex in scene space.
    #[must_use]
    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        self.scene
            .objects
            .iter()
            .enumerate()
            .flat_map(|(index, object)| {
                let world = self.world_matrix(index);
                object
                    .vertices
                    .iter()
                    .map(move |vertex| world.transform_point3(vertex.position))
            })
            .fold(None, |bounds, point| match bounds {
                None => Some((point, point)),
                Some((min, max)) => Some((min.min(point), max.max(point))),
            })
    }
}

/// Load a scene with default options.
pub fn load(path: impl AsRef<Path>) -> Result<LoadedScene> {
    load_with_options(path, &LoadOptions::default())
}

/// Load a scene, resolving textures against the file's directory and
/// `options.texture_search_paths`.
pub fn load_with_options(path: impl AsRef<Path>, options: &LoadOptions) -> Result<LoadedScene> {
    let path = path.as_ref();
    let data = std::fs::read(path).map_err(|source| Error::Io {
        path: path.to_owned(),
        source,
    })?;
    tracing::info!("Loading {} ({} bytes)", path.display(), data.len());

    let local_directory = path
        .parent()
        .map(|dir| dir.to_string_lossy().into_owned())
        .unwrap_or_default();
    let scene = load_bytes(&data, &local_directory, options)?;
    Ok(LoadedScene {
        path: path.to_owned(),
        scene,
    })
}

/// Decode an in-memory file as if it had been read from `local_directory`.
pub fn load_bytes(
    data: &[u8],
    local_directory: &str,
    options: &LoadOptions,
) -> Result<Scene<Arc<Texture>>> {
    let resolver =
        FsTextureResolver::new(options.texture_search_paths.clone(), options.decode_images);
    let options = DecodeOptions::with_local_directory(local_directory);
    Ok(decode_with(data, &options, resolver)?)
}

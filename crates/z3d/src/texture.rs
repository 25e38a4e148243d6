//! Filesystem texture lookup.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use z3d_decode::TextureResolver;

/// A texture found on disk.
#[derive(Debug, Clone)]
pub struct Texture {
    /// The name as stored in the scene file.
    pub name: String,
    /// Where the file was found.
    pub path: PathBuf,
    /// RGBA8 pixels, when image decoding was requested and succeeded.
    pub image: Option<image::RgbaImage>,
}

impl Texture {
    #[must_use]
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        self.image.as_ref().map(image::RgbaImage::dimensions)
    }
}

/// Resolves texture names against the directories a scene names.
///
/// Candidates are tried in order:
///
/// 1. Each `TEXTUREPATH` entry with the name appended verbatim (paths are
///    stored with their trailing separator)
/// 2. Each extra search directory joined with the name
/// 3. The scene file's own directory joined with the name
///
/// The first existing file wins. Lookups are cached by name, misses
/// included.
#[derive(Debug, Default)]
pub struct FsTextureResolver {
    extra_directories: Vec<PathBuf>,
    decode_images: bool,
    cache: HashMap<String, Option<Arc<Texture>>>,
}

impl FsTextureResolver {
    #[must_use]
    pub fn new(extra_directories: Vec<PathBuf>, decode_images: bool) -> Self {
        Self {
            extra_directories,
            decode_images,
            cache: HashMap::new(),
        }
    }

    /// Number of distinct names looked up so far.
    #[must_use]
    pub fn lookups(&self) -> usize {
        self.cache.len()
    }

    fn candidates(&self, name: &str, search_paths: &[String], local_directory: &str) -> Vec<PathBuf> {
        let mut candidates: Vec<PathBuf> = search_paths
            .iter()
            .map(|path| PathBuf::from(format!("{path}{name}")))
            .collect();
        candidates.extend(self.extra_directories.iter().map(|dir| dir.join(name)));
        candidates.push(Path::new(local_directory).join(name));
        candidates
    }

    fn load(&self, name: &str, path: PathBuf) -> Texture {
        let image = if self.decode_images {
            decode_image(&path)
        } else {
            None
        };
        Texture {
            name: name.to_owned(),
            path,
            image,
        }
    }
}

impl TextureResolver for FsTextureResolver {
    type Handle = Arc<Texture>;

    fn resolve(
        &mut self,
        name: &str,
        search_paths: &[String],
        local_directory: &str,
    ) -> Option<Arc<Texture>> {
        if let Some(cached) = self.cache.get(name) {
            return cached.clone();
        }

        let found = self
            .candidates(name, search_paths, local_directory)
            .into_iter()
            .find(|candidate| candidate.is_file());
        let texture = match found {
            Some(path) => {
                tracing::debug!("Texture {name:?} found at {}", path.display());
                Some(Arc::new(self.load(name, path)))
            }
            None => {
                tracing::warn!("Texture {name:?} not found");
                None
            }
        };
        self.cache.insert(name.to_owned(), texture.clone());
        texture
    }
}

fn decode_image(path: &Path) -> Option<image::RgbaImage> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!("Failed to read texture {}: {e}", path.display());
            return None;
        }
    };
    match image::load_from_memory(&bytes) {
        Ok(image) => Some(image.to_rgba8()),
        Err(e) => {
            tracing::warn!("Failed to decode texture {}: {e}", path.display());
            None
        }
    }
}

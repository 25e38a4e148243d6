//! Load ZModeler Z3D scenes from disk.
//!
//! This crate wraps [`z3d_decode`] with file I/O and a filesystem texture
//! resolver. Textures are looked up in the scene's own texture paths, then
//! in caller-supplied directories, then next to the scene file, and are
//! optionally decoded into RGBA8 pixels.
//!
//! # Example
//!
//! ```no_run
//! let loaded = z3d::load("car.z3d")?;
//! for object in &loaded.scene.objects {
//!     println!("{}: {} faces", object.name, object.faces.len());
//! }
//! # Ok::<(), z3d::Error>(())
//! ```

mod error;
mod loader;
mod texture;

pub use error::{Error, Result};
pub use loader::{LoadOptions, LoadedScene, load, load_bytes, load_with_options};
pub use texture::{FsTextureResolver, Texture};

// Re-export the decoded scene types.
pub use z3d_decode::{
    AlphaMode, Diagnostic, DiagnosticKind, Face, FaceRejection, Material, Scene, SceneObject,
    TextureBinding, TextureSlot, Vertex,
};

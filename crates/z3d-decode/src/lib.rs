//! Decode ZModeler v1.x Z3D scene files.
//!
//! This crate turns the bytes of a Z3D file into a [`Scene`]: named
//! objects with vertices, triangles, per-corner UVs and object-local
//! material slots, a material table with texture bindings, and the
//! parent/child hierarchy. Decoding is a single synchronous pass over an
//! in-memory buffer; the caller reads the file and decides what to do
//! with the result.
//!
//! # Design principles
//!
//! - **Synchronous**: No async, no threading primitives
//! - **Host-agnostic**: No filesystem or rendering access; textures are
//!   resolved through a caller-supplied [`TextureResolver`]
//! - **Forgiving**: Only a bad header, truncated input or a broken
//!   compressed body abort a decode; everything else is recorded in
//!   [`Scene::diagnostics`]
//!
//! # Key functions
//!
//! - [`decode`]: Decode a file, recording texture names only
//! - [`decode_with`]: Decode a file with a texture resolver
//! - [`unwrap_body`]: Validate the header and inflate a compressed body
//! - [`recompute_normals`]: Angle-weighted vertex normals
//!
//! # Coordinate space
//!
//! Z3D files are Y-up. Decoded positions, normals and placement matrices
//! are right-handed Z-up; see [`transform`].

mod error;

pub mod chunk;
pub mod container;
pub mod cursor;
pub mod decoder;
pub mod descriptor;
pub mod diagnostic;
mod hierarchy;
mod material;
pub mod normals;
pub mod object;
pub mod scene;
mod spline;
pub mod texture;
pub mod transform;

pub use container::unwrap_body;
pub use decoder::{DecodeOptions, decode, decode_with};
pub use diagnostic::{Diagnostic, DiagnosticKind, FaceRejection};
pub use error::{DecodeError, DecodeResult};
pub use normals::recompute_normals;
pub use scene::{
    AlphaMode, Face, Material, Scene, SceneObject, TextureBinding, TextureSlot, Vertex,
};
pub use texture::{NoTextures, TextureResolver};

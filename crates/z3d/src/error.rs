//! Error types for loading Z3D scenes.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur when loading a scene.
#[derive(Debug, Error)]
pub enum Error {
    /// The scene file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file was read but is not a decodable Z3D scene.
    #[error("decode error: {0}")]
    Decode(#[from] z3d_decode::DecodeError),
}

/// Result type for loading operations.
pub type Result<T> = std::result::Result<T, Error>;

//! Decode error types.

use thiserror::Error;

/// Errors produced while decoding a Z3D file.
///
/// Only [`DecodeError::InvalidMagic`], [`DecodeError::TruncatedInput`] and
/// [`DecodeError::DecompressionFailed`] abort a decode. The scene decoder
/// turns [`DecodeError::EmptyFile`] into an empty scene and recovers from
/// [`DecodeError::MalformedChunk`] at the enclosing chunk boundary.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("not a ZModeler 1.x Z3D file (magic {found:#010x})")]
    InvalidMagic { found: u32 },

    #[error("file declares an empty body")]
    EmptyFile,

    #[error("truncated input: needed {needed} bytes at offset {offset}, {available} available")]
    TruncatedInput {
        offset: usize,
        needed: usize,
        available: usize,
    },

    #[error("failed to inflate compressed body: {0}")]
    DecompressionFailed(#[source] std::io::Error),

    #[error("expected chunk {expected:#x} at offset {offset}, found {found:#x}")]
    MalformedChunk {
        offset: usize,
        expected: u32,
        found: u32,
    },
}

impl DecodeError {
    /// Whether this error must abort the whole decode.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::InvalidMagic { .. } | Self::TruncatedInput { .. } | Self::DecompressionFailed(_)
        )
    }
}

/// Result type for decode operations.
pub type DecodeResult<T> = Result<T, DecodeError>;

//! File header validation and whole-body decompression.
//!
//! # Format
//!
//! - Bytes 0-3: magic `0x4D44335A` ("Z3DM")
//! - Bytes 4-7: flags, bit 0 marks a compressed body
//! - Bytes 8-11: uncompressed body length
//! - Bytes 12..: chunk stream, stored or deflated

use std::borrow::Cow;
use std::io::{self, Read};

use flate2::read::{DeflateDecoder, ZlibDecoder};

use crate::cursor::Cursor;
use crate::error::{DecodeError, DecodeResult};

/// Magic number at the start of every ZModeler 1.x file.
pub const MAGIC: u32 = 0x4D44_335A;

/// Size of the file header in bytes.
pub const HEADER_LEN: usize = 12;

const FLAG_COMPRESSED: u32 = 0x0001;

/// Decoded file header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub magic: u32,
    pub flags: u32,
    /// Uncompressed body length. Only meaningful for compressed files, but
    /// zero always means there is nothing to decode.
    pub length: u32,
}

impl Header {
    pub fn read(cursor: &mut Cursor<'_>) -> DecodeResult<Self> {
        let magic = cursor.read_u32()?;
        let flags = cursor.read_u32()?;
        let length = cursor.read_u32()?;
        Ok(Self {
            magic,
            flags,
            length,
        })
    }

    #[must_use]
    pub fn is_compressed(&self) -> bool {
        self.flags & FLAG_COMPRESSED != 0
    }
}

/// Validate the header and return the chunk stream.
///
/// Stored bodies are borrowed from `data`; compressed bodies are inflated
/// into a new buffer of exactly the declared length.
pub fn unwrap_body(data: &[u8]) -> DecodeResult<Cow<'_, [u8]>> {
    let mut cursor = Cursor::new(data);
    let header = Header::read(&mut cursor)?;
    if header.magic != MAGIC {
        return Err(DecodeError::InvalidMagic {
            found: header.magic,
        });
    }
    if header.length == 0 {
        return Err(DecodeError::EmptyFile);
    }

    let body = &data[HEADER_LEN..];
    if !header.is_compressed() {
        return Ok(Cow::Borrowed(body));
    }

    let inflated = inflate(body, header.length as usize).map_err(DecodeError::DecompressionFailed)?;
    tracing::debug!(
        "Inflated {} compressed bytes into {} bytes",
        body.len(),
        inflated.len()
    );
    Ok(Cow::Owned(inflated))
}

/// Inflate a zlib-wrapped or raw deflate stream to `length` bytes.
fn inflate(body: &[u8], length: usize) -> io::Result<Vec<u8>> {
    let limit = length as u64;
    let mut out = Vec::new();
    if has_zlib_header(body) {
        ZlibDecoder::new(body).take(limit).read_to_end(&mut out)?;
    } else {
        DeflateDecoder::new(body).take(limit).read_to_end(&mut out)?;
    }

    if out.len() < length {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("inflated {} bytes, header declares {length}", out.len()),
        ));
    }
    Ok(out)
}

/// RFC 1950 header check: deflate method with a valid FCHECK.
fn has_zlib_header(body: &[u8]) -> bool {
    match body {
        [cmf, flg, ..] => {
            cmf & 0x0F == 8 && ((u16::from(*cmf) << 8) | u16::from(*flg)) % 31 == 0
        }
        _ => false,
    }
}

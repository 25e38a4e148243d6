//! Little-endian byte cursor over an in-memory chunk stream.

use byteorder::{ByteOrder, LittleEndian};
use glam::Vec4;

use crate::error::{DecodeError, DecodeResult};

/// How many bytes a string read consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringLength {
    /// A `u32` length prefix precedes the string bytes.
    Prefixed,
    /// The length is already known, usually from a chunk header.
    Explicit(u32),
}

/// Forward reader with random-access seeks.
///
/// Seeks never fail; a position past the end simply makes the next read
/// return [`DecodeError::TruncatedInput`].
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Absolute position from the start of the buffer.
    #[must_use]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Total length of the buffer.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Bytes left between the position and the end of the buffer.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    pub fn seek_absolute(&mut self, pos: usize) {
        self.pos = pos;
    }

    /// Move relative to the current position, clamping at zero.
    pub fn seek_relative(&mut self, delta: isize) {
        self.pos = self.pos.checked_add_signed(delta).unwrap_or(0);
    }

    /// Skip `count` bytes forward.
    pub fn skip(&mut self, count: usize) {
        self.pos = self.pos.saturating_add(count);
    }

    pub fn read_bytes(&mut self, count: usize) -> DecodeResult<&'a [u8]> {
        let available = self.remaining();
        if count > available {
            return Err(DecodeError::TruncatedInput {
                offset: self.pos,
                needed: count,
                available,
            });
        }
        let bytes = &self.data[self.pos..self.pos + count];
        self.pos += count;
        Ok(bytes)
    }

    pub fn read_u8(&mut self) -> DecodeResult<u8> {
        Ok(self.read_bytes(1)?[0])
    }

    pub fn read_u16(&mut self) -> DecodeResult<u16> {
        self.read_bytes(2).map(LittleEndian::read_u16)
    }

    pub fn read_u32(&mut self) -> DecodeResult<u32> {
        self.read_bytes(4).map(LittleEndian::read_u32)
    }

    pub fn read_i32(&mut self) -> DecodeResult<i32> {
        self.read_bytes(4).map(LittleEndian::read_i32)
    }

    pub fn read_f32(&mut self) -> DecodeResult<f32> {
        self.read_bytes(4).map(LittleEndian::read_f32)
    }

    /// Read `N` consecutive floats.
    pub fn read_f32_array<const N: usize>(&mut self) -> DecodeResult<[f32; N]> {
        let bytes = self.read_bytes(N * 4)?;
        let mut out = [0.0; N];
        LittleEndian::read_f32_into(bytes, &mut out);
        Ok(out)
    }

    /// Read four floats as an RGBA colour.
    pub fn read_vec4(&mut self) -> DecodeResult<Vec4> {
        self.read_f32_array::<4>().map(Vec4::from_array)
    }

    /// Read a field only when `present` is set, otherwise return `default`.
    ///
    /// Every optional field in the format is gated this way, by a bit in a
    /// descriptor or per-record flag word.
    pub fn read_if<T>(
        &mut self,
        present: bool,
        default: T,
        read: impl FnOnce(&mut Self) -> DecodeResult<T>,
    ) -> DecodeResult<T> {
        if present { read(self) } else { Ok(default) }
    }

    /// Read a null-terminated string.
    ///
    /// The length includes the terminator, which is skipped rather than
    /// validated. A length of zero yields an empty string.
    pub fn read_zstring(&mut self, length: StringLength) -> DecodeResult<String> {
        let size = self.string_size(length)?;
        if size == 0 {
            return Ok(String::new());
        }
        let bytes = self.read_bytes(size - 1)?;
        self.skip(1);
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }

    /// Read a string that is not null-terminated.
    pub fn read_string(&mut self, length: StringLength) -> DecodeResult<String> {
        let size = self.string_size(length)?;
        let bytes = self.read_bytes(size)?;
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }

    fn string_size(&mut self, length: StringLength) -> DecodeResult<usize> {
        let size = match length {
            StringLength::Prefixed => self.read_u32()?,
            StringLength::Explicit(size) => size,
        };
        Ok(size as usize)
    }
}

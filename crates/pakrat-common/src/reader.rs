//! Binary reader for zero-copy parsing of byte slices.
//!
//! This module provides [`BinaryReader`], a cursor-like type that reads
//! little-endian data from a byte slice without copying.

use std::borrow::Cow;

use byteorder::{ByteOrder, LittleEndian};
use zerocopy::FromBytes;

use crate::{Error, Result};

/// A binary reader over a byte slice with a monotonically advancing position.
///
/// # Example
///
/// ```
/// use pakrat_common::BinaryReader;
///
/// let data = [0x34, 0x12, 0xAA, 0x55, 0x02, 0x00];
/// let mut reader = BinaryReader::new(&data);
///
/// assert_eq!(reader.read_u32().unwrap(), 0x55AA1234);
/// assert_eq!(reader.read_u16().unwrap(), 2);
/// assert!(reader.is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct BinaryReader<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> BinaryReader<'a> {
    /// Create a new reader from a byte slice.
    #[inline]
    pub const fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    /// Get the current position in the buffer.
    #[inline]
    pub const fn position(&self) -> usize {
        self.position
    }

    /// Get the total length of the underlying buffer.
    #[inline]
    pub const fn len(&self) -> usize {
        self.data.len()
    }

    /// Get the number of bytes remaining to read.
    #[inline]
    pub const fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.position)
    }

    /// Check if there are no more bytes to read.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.position >= self.data.len()
    }

    /// Get the remaining bytes as a slice.
    #[inline]
    pub fn remaining_bytes(&self) -> &'a [u8] {
        &self.data[self.position.min(self.data.len())..]
    }

    /// Read bytes and advance the position.
    #[inline]
    pub fn read_bytes(&mut self, count: usize) -> Result<&'a [u8]> {
        if self.remaining() < count {
            return Err(Error::UnexpectedEof {
                needed: count,
                available: self.remaining(),
            });
        }
        let bytes = &self.data[self.position..self.position + count];
        self.position += count;
        Ok(bytes)
    }

    /// Read a single byte.
    #[inline]
    pub fn read_u8(&mut self) -> Result<u8> {
        self.read_bytes(1).map(|b| b[0])
    }

    /// Read a little-endian u16.
    #[inline]
    pub fn read_u16(&mut self) -> Result<u16> {
        self.read_bytes(2).map(LittleEndian::read_u16)
    }

    /// Read a little-endian u32.
    #[inline]
    pub fn read_u32(&mut self) -> Result<u32> {
        self.read_bytes(4).map(LittleEndian::read_u32)
    }

    /// Read the raw bytes of a null-terminated string, excluding the terminator.
    ///
    /// The position only advances when a terminator is found.
    pub fn read_cstring_bytes(&mut self) -> Result<&'a [u8]> {
        let remaining = self.remaining_bytes();
        let null_pos = memchr::memchr(0, remaining).ok_or(Error::MissingNullTerminator)?;

        self.position += null_pos + 1;
        Ok(&remaining[..null_pos])
    }

    /// Read a null-terminated string, replacing invalid UTF-8 sequences.
    pub fn read_cstring_lossy(&mut self) -> Result<Cow<'a, str>> {
        self.read_cstring_bytes().map(String::from_utf8_lossy)
    }

    /// Read a struct using zerocopy.
    ///
    /// The struct must implement `FromBytes` from the zerocopy crate.
    #[inline]
    pub fn read_struct<T: FromBytes>(&mut self) -> Result<T> {
        let size = std::mem::size_of::<T>();
        let bytes = self.read_bytes(size)?;
        T::read_from_bytes(bytes).map_err(|_| Error::UnexpectedEof {
            needed: size,
            available: bytes.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_primitives() {
        let data = [
            0x01u8, 0x02, 0x03, 0x04, // u32: 0x04030201
            0xFF, 0xFF, // u16: 0xFFFF
            0x2A, // u8
        ];
        let mut reader = BinaryReader::new(&data);

        assert_eq!(reader.read_u32().unwrap(), 0x04030201);
        assert_eq!(reader.read_u16().unwrap(), 0xFFFF);
        assert_eq!(reader.read_u8().unwrap(), 0x2A);
        assert!(reader.is_empty());
    }

    #[test]
    fn test_read_cstring() {
        let data = b"models\0\0 \0";
        let mut reader = BinaryReader::new(data);

        assert_eq!(reader.read_cstring_lossy().unwrap(), "models");
        assert_eq!(reader.read_cstring_lossy().unwrap(), "");
        assert_eq!(reader.read_cstring_lossy().unwrap(), " ");
        assert!(reader.is_empty());
    }

    #[test]
    fn test_unterminated_string_does_not_advance() {
        let data = b"abc";
        let mut reader = BinaryReader::new(data);

        let err = reader.read_cstring_bytes().unwrap_err();
        assert!(matches!(err, Error::MissingNullTerminator));
        assert!(err.is_truncation());
        assert_eq!(reader.position(), 0);
    }

    #[test]
    fn test_eof_error() {
        let data = [0x01, 0x02];
        let mut reader = BinaryReader::new(&data);

        let err = reader.read_u32().unwrap_err();
        assert!(matches!(
            err,
            Error::UnexpectedEof {
                needed: 4,
                available: 2
            }
        ));
        assert_eq!(reader.position(), 0);
    }

    #[test]
    fn test_read_struct() {
        #[derive(FromBytes)]
        #[repr(C, packed)]
        struct Pair {
            a: u16,
            b: u32,
        }

        let data = [0x01, 0x00, 0x02, 0x00, 0x00, 0x00];
        let mut reader = BinaryReader::new(&data);
        let pair: Pair = reader.read_struct().unwrap();

        assert_eq!({ pair.a }, 1);
        assert_eq!({ pair.b }, 2);
        assert_eq!(reader.remaining(), 0);
    }
}

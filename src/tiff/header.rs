//! TIFF header and byte order.
//!
//! # Header Structure
//!
//! ```text
//! Bytes 0-1: Byte order (0x4949 = little-endian "II", 0x4D4D = big-endian "MM")
//! Bytes 2-3: Magic (42 = 0x002A)
//! Bytes 4-7: Offset to first directory (0 = no directories)
//! ```

use std::io::{Read, Seek};

use crate::error::{DecodeError, HeaderError};
use crate::io::OrderedReader;

// =============================================================================
// Constants
// =============================================================================

/// Magic bytes indicating little-endian byte order ("II" for Intel)
const BYTE_ORDER_LITTLE_ENDIAN: u16 = 0x4949;

/// Magic bytes indicating big-endian byte order ("MM" for Motorola)
const BYTE_ORDER_BIG_ENDIAN: u16 = 0x4D4D;

/// Magic number following the byte order marker
pub const TIFF_MAGIC: u16 = 42;

/// Size of the header in bytes
pub const TIFF_HEADER_SIZE: usize = 8;

// =============================================================================
// ByteOrder
// =============================================================================

/// Byte order (endianness) of a TIFF stream.
///
/// Declared by the first two bytes of the header; every multi-byte value
/// after that, including offsets, follows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ByteOrder {
    /// Little-endian ("II" = Intel)
    #[default]
    LittleEndian,
    /// Big-endian ("MM" = Motorola)
    BigEndian,
}

impl ByteOrder {
    /// Recognize a byte order marker.
    pub fn from_marker(marker: [u8; 2]) -> Result<Self, HeaderError> {
        // The marker is a byte pattern, not a number in the stream order
        match u16::from_le_bytes(marker) {
            BYTE_ORDER_LITTLE_ENDIAN => Ok(ByteOrder::LittleEndian),
            BYTE_ORDER_BIG_ENDIAN => Ok(ByteOrder::BigEndian),
            other => Err(HeaderError::InvalidByteOrder(other)),
        }
    }

    /// The two marker bytes written at the start of the header.
    pub const fn marker(self) -> [u8; 2] {
        match self {
            ByteOrder::LittleEndian => *b"II",
            ByteOrder::BigEndian => *b"MM",
        }
    }

    /// Read a u16 from the first 2 bytes of `bytes`.
    ///
    /// # Panics
    /// Panics if the slice has fewer than 2 bytes.
    #[inline]
    pub fn read_u16(self, bytes: &[u8]) -> u16 {
        let raw = [bytes[0], bytes[1]];
        match self {
            ByteOrder::LittleEndian => u16::from_le_bytes(raw),
            ByteOrder::BigEndian => u16::from_be_bytes(raw),
        }
    }

    /// Read a u32 from the first 4 bytes of `bytes`.
    ///
    /// # Panics
    /// Panics if the slice has fewer than 4 bytes.
    #[inline]
    pub fn read_u32(self, bytes: &[u8]) -> u32 {
        let raw = [bytes[0], bytes[1], bytes[2], bytes[3]];
        match self {
            ByteOrder::LittleEndian => u32::from_le_bytes(raw),
            ByteOrder::BigEndian => u32::from_be_bytes(raw),
        }
    }

    /// Read a u64 from the first 8 bytes of `bytes`.
    ///
    /// # Panics
    /// Panics if the slice has fewer than 8 bytes.
    #[inline]
    pub fn read_u64(self, bytes: &[u8]) -> u64 {
        let raw = [
            bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
        ];
        match self {
            ByteOrder::LittleEndian => u64::from_le_bytes(raw),
            ByteOrder::BigEndian => u64::from_be_bytes(raw),
        }
    }

    #[inline]
    pub fn u16_bytes(self, value: u16) -> [u8; 2] {
        match self {
            ByteOrder::LittleEndian => value.to_le_bytes(),
            ByteOrder::BigEndian => value.to_be_bytes(),
        }
    }

    #[inline]
    pub fn u32_bytes(self, value: u32) -> [u8; 4] {
        match self {
            ByteOrder::LittleEndian => value.to_le_bytes(),
            ByteOrder::BigEndian => value.to_be_bytes(),
        }
    }

    #[inline]
    pub fn u64_bytes(self, value: u64) -> [u8; 8] {
        match self {
            ByteOrder::LittleEndian => value.to_le_bytes(),
            ByteOrder::BigEndian => value.to_be_bytes(),
        }
    }
}

// =============================================================================
// TiffHeader
// =============================================================================

/// Parsed TIFF header: byte order plus the location of the first directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TiffHeader {
    /// Byte order for all multi-byte values in the stream
    pub byte_order: ByteOrder,

    /// Offset to the first directory, 0 when the container is empty
    pub first_ifd_offset: u32,
}

impl TiffHeader {
    /// Read the header from the start of the stream.
    ///
    /// The marker, the magic and the offset are read one after the other so
    /// a bad marker is reported as such even on a stream shorter than 8 bytes.
    /// On success the reader is switched to the declared byte order.
    pub fn read<R: Read + Seek>(reader: &mut OrderedReader<R>) -> Result<Self, DecodeError> {
        reader.seek_to(0)?;

        let byte_order = ByteOrder::from_marker(reader.read_array::<2>()?)?;
        reader.set_byte_order(byte_order);

        let magic = reader.read_u16()?;
        if magic != TIFF_MAGIC {
            return Err(HeaderError::InvalidMagic(magic).into());
        }

        let first_ifd_offset = reader.read_u32()?;

        Ok(TiffHeader {
            byte_order,
            first_ifd_offset,
        })
    }

    /// Serialize the header.
    pub fn to_bytes(&self) -> [u8; TIFF_HEADER_SIZE] {
        let mut out = [0u8; TIFF_HEADER_SIZE];
        out[0..2].copy_from_slice(&self.byte_order.marker());
        out[2..4].copy_from_slice(&self.byte_order.u16_bytes(TIFF_MAGIC));
        out[4..8].copy_from_slice(&self.byte_order.u32_bytes(self.first_ifd_offset));
        out
    }
}

// =============================================================================
// Tests
// =============================================================================

//! Wire type codes and reserved tags.
//!
//! Tag meaning is not interpreted here; the only tag the codec cares about is
//! [`SUB_IFDS`], because its value is structure rather than data.

use super::values::ValueKind;

/// Tag whose value lists absolute offsets of nested directories.
pub const SUB_IFDS: u16 = 330;

/// Largest value, in bytes, stored directly in a directory entry.
pub const INLINE_THRESHOLD: usize = 4;

// =============================================================================
// Field Types
// =============================================================================

/// Classic TIFF field types.
///
/// The type code in an entry determines the element size, which in turn
/// decides whether the value fits inline or lives at an offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum FieldType {
    /// Unsigned 8-bit integer
    Byte = 1,

    /// NUL-delimited 8-bit characters
    Ascii = 2,

    /// Unsigned 16-bit integer
    Short = 3,

    /// Unsigned 32-bit integer
    Long = 4,

    /// Two unsigned 32-bit integers: numerator, denominator
    Rational = 5,

    /// Signed 8-bit integer
    SByte = 6,

    /// Opaque bytes
    Undefined = 7,

    /// Signed 16-bit integer
    SShort = 8,

    /// Signed 32-bit integer
    SLong = 9,

    /// Two signed 32-bit integers: numerator, denominator
    SRational = 10,

    /// IEEE single precision
    Float = 11,

    /// IEEE double precision
    Double = 12,
}

impl FieldType {
    pub const ALL: [FieldType; 12] = [
        FieldType::Byte,
        FieldType::Ascii,
        FieldType::Short,
        FieldType::Long,
        FieldType::Rational,
        FieldType::SByte,
        FieldType::Undefined,
        FieldType::SShort,
        FieldType::SLong,
        FieldType::SRational,
        FieldType::Float,
        FieldType::Double,
    ];

    /// Size of a single element of this type in bytes.
    #[inline]
    pub const fn size_in_bytes(self) -> usize {
        match self {
            FieldType::Byte | FieldType::Ascii | FieldType::SByte | FieldType::Undefined => 1,
            FieldType::Short | FieldType::SShort => 2,
            FieldType::Long | FieldType::SLong | FieldType::Float => 4,
            FieldType::Rational | FieldType::SRational | FieldType::Double => 8,
        }
    }

    /// Create a FieldType from its numeric value.
    ///
    /// Returns `None` for unknown codes; such entries are skipped, not rejected.
    pub fn from_u16(value: u16) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_u16() == value)
    }

    #[inline]
    pub const fn as_u16(self) -> u16 {
        self as u16
    }

    /// Value kind this wire type decodes to.
    pub const fn kind(self) -> ValueKind {
        match self {
            FieldType::Byte => ValueKind::Byte,
            FieldType::Ascii => ValueKind::Ascii,
            FieldType::Short => ValueKind::Short,
            FieldType::Long => ValueKind::Long,
            FieldType::Rational => ValueKind::Rational,
            FieldType::SByte => ValueKind::SByte,
            FieldType::Undefined => ValueKind::Undefined,
            FieldType::SShort => ValueKind::SShort,
            FieldType::SLong => ValueKind::SLong,
            FieldType::SRational => ValueKind::SRational,
            FieldType::Float => ValueKind::Float,
            FieldType::Double => ValueKind::Double,
        }
    }

    /// Payload size in bytes for `count` elements.
    #[inline]
    pub const fn payload_size(self, count: u32) -> u64 {
        self.size_in_bytes() as u64 * count as u64
    }

    /// Check if `count` elements of this type fit in the entry's value field.
    #[inline]
    pub const fn fits_inline(self, count: u32) -> bool {
        self.payload_size(count) <= INLINE_THRESHOLD as u64
    }
}

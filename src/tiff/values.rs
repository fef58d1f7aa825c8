//! Tag values.
//!
//! Every value is a sequence of one primitive kind. The entry's count field
//! is the sequence length, not the byte length (except for ASCII, whose count
//! is the byte length including NUL terminators).

use std::fmt;

use serde::{Deserialize, Serialize};

/// Unsigned fraction stored as two 32-bit integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rational {
    pub numerator: u32,
    pub denominator: u32,
}

impl Rational {
    pub const fn new(numerator: u32, denominator: u32) -> Self {
        Self {
            numerator,
            denominator,
        }
    }
}

/// Signed fraction stored as two 32-bit integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SRational {
    pub numerator: i32,
    pub denominator: i32,
}

impl SRational {
    pub const fn new(numerator: i32, denominator: i32) -> Self {
        Self {
            numerator,
            denominator,
        }
    }
}

/// A decoded tag value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Byte(Vec<u8>),
    /// NUL-delimited strings
    Ascii(Vec<String>),
    Short(Vec<u16>),
    Long(Vec<u32>),
    Rational(Vec<Rational>),
    SByte(Vec<i8>),
    /// Opaque bytes, same layout as `Byte`
    Undefined(Vec<u8>),
    SShort(Vec<i16>),
    SLong(Vec<i32>),
    SRational(Vec<SRational>),
    Float(Vec<f32>),
    Double(Vec<f64>),
}

impl Value {
    /// Single-string ASCII value.
    pub fn ascii(s: impl Into<String>) -> Self {
        Value::Ascii(vec![s.into()])
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Byte(_) => ValueKind::Byte,
            Value::Ascii(_) => ValueKind::Ascii,
            Value::Short(_) => ValueKind::Short,
            Value::Long(_) => ValueKind::Long,
            Value::Rational(_) => ValueKind::Rational,
            Value::SByte(_) => ValueKind::SByte,
            Value::Undefined(_) => ValueKind::Undefined,
            Value::SShort(_) => ValueKind::SShort,
            Value::SLong(_) => ValueKind::SLong,
            Value::SRational(_) => ValueKind::SRational,
            Value::Float(_) => ValueKind::Float,
            Value::Double(_) => ValueKind::Double,
        }
    }

    /// Number of elements (strings, for ASCII).
    pub fn len(&self) -> usize {
        match self {
            Value::Byte(v) | Value::Undefined(v) => v.len(),
            Value::Ascii(v) => v.len(),
            Value::Short(v) => v.len(),
            Value::Long(v) => v.len(),
            Value::Rational(v) => v.len(),
            Value::SByte(v) => v.len(),
            Value::SShort(v) => v.len(),
            Value::SLong(v) => v.len(),
            Value::SRational(v) => v.len(),
            Value::Float(v) => v.len(),
            Value::Double(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Offsets under [`SUB_IFDS`](super::tags::SUB_IFDS) are stored as LONGs.
    pub fn as_longs(&self) -> Option<&[u32]> {
        match self {
            Value::Long(v) => Some(v),
            _ => None,
        }
    }
}

/// Discriminant of [`Value`]; the key coders are registered under on the
/// encode path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ValueKind {
    Byte,
    Ascii,
    Short,
    Long,
    Rational,
    SByte,
    Undefined,
    SShort,
    SLong,
    SRational,
    Float,
    Double,
}

impl ValueKind {
    pub const fn name(self) -> &'static str {
        match self {
            ValueKind::Byte => "BYTE",
            ValueKind::Ascii => "ASCII",
            ValueKind::Short => "SHORT",
            ValueKind::Long => "LONG",
            ValueKind::Rational => "RATIONAL",
            ValueKind::SByte => "SBYTE",
            ValueKind::Undefined => "UNDEFINED",
            ValueKind::SShort => "SSHORT",
            ValueKind::SLong => "SLONG",
            ValueKind::SRational => "SRATIONAL",
            ValueKind::Float => "FLOAT",
            ValueKind::Double => "DOUBLE",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

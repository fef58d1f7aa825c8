//! Type coders and their registry.
//!
//! A coder bridges one wire type code and one [`ValueKind`]: it sizes the
//! payload from the entry count, turns raw bytes into a [`Value`], and turns
//! a [`Value`] back into bytes plus the count written to the entry.
//!
//! The registry is an explicit value. Build it once (usually with
//! [`CoderRegistry::builtin`]), then share it by reference; lookups take
//! `&self` so any number of decodes and encodes can use it concurrently.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

use crate::error::{DecodeError, EncodeError};

use super::header::ByteOrder;
use super::tags::FieldType;
use super::values::{Rational, SRational, Value, ValueKind};

// =============================================================================
// Coder
// =============================================================================

/// Conversion between wire bytes and one value kind.
pub trait Coder: Send + Sync {
    /// Wire type code this coder decodes.
    fn type_code(&self) -> u16;

    /// Value kind this coder encodes.
    fn kind(&self) -> ValueKind;

    /// Payload length in bytes for an entry declaring `count`.
    fn payload_size(&self, count: u32) -> u64;

    /// Decode a payload.
    ///
    /// Fails if `bytes` is shorter than `payload_size(count)`.
    fn unmarshal(&self, bytes: &[u8], count: u32, order: ByteOrder) -> Result<Value, DecodeError>;

    /// Encode a value, returning the payload and the entry count.
    fn marshal(&self, value: &Value, order: ByteOrder) -> Result<(Vec<u8>, u32), EncodeError>;
}

// =============================================================================
// Built-in coders
// =============================================================================

/// Coder for one of the twelve classic TIFF field types.
#[derive(Debug, Clone, Copy)]
pub struct FieldCoder {
    field_type: FieldType,
}

impl FieldCoder {
    pub const fn new(field_type: FieldType) -> Self {
        Self { field_type }
    }

    pub const fn field_type(&self) -> FieldType {
        self.field_type
    }
}

impl Coder for FieldCoder {
    fn type_code(&self) -> u16 {
        self.field_type.as_u16()
    }

    fn kind(&self) -> ValueKind {
        self.field_type.kind()
    }

    fn payload_size(&self, count: u32) -> u64 {
        self.field_type.payload_size(count)
    }

    fn unmarshal(&self, bytes: &[u8], count: u32, order: ByteOrder) -> Result<Value, DecodeError> {
        let expected = self.payload_size(count);
        if (bytes.len() as u64) < expected {
            return Err(DecodeError::PayloadTooShort {
                type_code: self.type_code(),
                expected,
                actual: bytes.len() as u64,
            });
        }

        let n = count as usize;
        let payload = &bytes[..expected as usize];

        let value = match self.field_type {
            FieldType::Byte => Value::Byte(payload.to_vec()),
            FieldType::Undefined => Value::Undefined(payload.to_vec()),
            FieldType::Ascii => Value::Ascii(split_ascii(payload)),
            FieldType::SByte => Value::SByte(payload.iter().map(|&b| b as i8).collect()),
            FieldType::Short => Value::Short(read_seq(payload, n, 2, |b| order.read_u16(b))),
            FieldType::SShort => {
                Value::SShort(read_seq(payload, n, 2, |b| order.read_u16(b) as i16))
            }
            FieldType::Long => Value::Long(read_seq(payload, n, 4, |b| order.read_u32(b))),
            FieldType::SLong => Value::SLong(read_seq(payload, n, 4, |b| order.read_u32(b) as i32)),
            FieldType::Rational => Value::Rational(read_seq(payload, n, 8, |b| {
                Rational::new(order.read_u32(&b[0..4]), order.read_u32(&b[4..8]))
            })),
            FieldType::SRational => Value::SRational(read_seq(payload, n, 8, |b| {
                SRational::new(
                    order.read_u32(&b[0..4]) as i32,
                    order.read_u32(&b[4..8]) as i32,
                )
            })),
            FieldType::Float => Value::Float(read_seq(payload, n, 4, |b| {
                f32::from_bits(order.read_u32(b))
            })),
            FieldType::Double => Value::Double(read_seq(payload, n, 8, |b| {
                f64::from_bits(order.read_u64(b))
            })),
        };

        Ok(value)
    }

    fn marshal(&self, value: &Value, order: ByteOrder) -> Result<(Vec<u8>, u32), EncodeError> {
        let bytes = match (self.field_type, value) {
            (FieldType::Ascii, Value::Ascii(strings)) => return join_ascii(strings),
            (FieldType::Byte, Value::Byte(v)) | (FieldType::Undefined, Value::Undefined(v)) => {
                let count = count_of(v.len())?;
                return Ok((v.clone(), count));
            }
            (FieldType::SByte, Value::SByte(v)) => write_seq(v, |x| [*x as u8]),
            (FieldType::Short, Value::Short(v)) => write_seq(v, |x| order.u16_bytes(*x)),
            (FieldType::SShort, Value::SShort(v)) => write_seq(v, |x| order.u16_bytes(*x as u16)),
            (FieldType::Long, Value::Long(v)) => write_seq(v, |x| order.u32_bytes(*x)),
            (FieldType::SLong, Value::SLong(v)) => write_seq(v, |x| order.u32_bytes(*x as u32)),
            (FieldType::Rational, Value::Rational(v)) => write_seq(v, |r| {
                pair_bytes(order.u32_bytes(r.numerator), order.u32_bytes(r.denominator))
            }),
            (FieldType::SRational, Value::SRational(v)) => write_seq(v, |r| {
                pair_bytes(
                    order.u32_bytes(r.numerator as u32),
                    order.u32_bytes(r.denominator as u32),
                )
            }),
            (FieldType::Float, Value::Float(v)) => write_seq(v, |x| order.u32_bytes(x.to_bits())),
            (FieldType::Double, Value::Double(v)) => {
                write_seq(v, |x| order.u64_bytes(x.to_bits()))
            }
            _ => {
                return Err(EncodeError::KindMismatch {
                    type_code: self.type_code(),
                    kind: value.kind(),
                })
            }
        };

        Ok((bytes?, count_of(value.len())?))
    }
}

fn count_of(len: usize) -> Result<u32, EncodeError> {
    u32::try_from(len).map_err(|_| EncodeError::CountOverflow { len })
}

fn read_seq<T>(bytes: &[u8], count: usize, size: usize, read: impl Fn(&[u8]) -> T) -> Vec<T> {
    bytes.chunks_exact(size).take(count).map(read).collect()
}

fn write_seq<T, const N: usize>(
    values: &[T],
    write: impl Fn(&T) -> [u8; N],
) -> Result<Vec<u8>, EncodeError> {
    count_of(values.len())?;
    let mut out = Vec::with_capacity(values.len() * N);
    for value in values {
        out.extend_from_slice(&write(value));
    }
    Ok(out)
}

fn pair_bytes(first: [u8; 4], second: [u8; 4]) -> [u8; 8] {
    let mut out = [0u8; 8];
    out[..4].copy_from_slice(&first);
    out[4..].copy_from_slice(&second);
    out
}

/// Split NUL-terminated strings; empty trailing segments are dropped.
fn split_ascii(bytes: &[u8]) -> Vec<String> {
    let mut strings: Vec<String> = bytes
        .split(|&b| b == 0)
        .map(|s| String::from_utf8_lossy(s).into_owned())
        .collect();
    while strings.last().is_some_and(|s| s.is_empty()) {
        strings.pop();
    }
    strings
}

/// Each string followed by one NUL; the count is the total byte length.
fn join_ascii(strings: &[String]) -> Result<(Vec<u8>, u32), EncodeError> {
    let mut out = Vec::with_capacity(strings.iter().map(|s| s.len() + 1).sum());
    for s in strings {
        if s.as_bytes().contains(&0) {
            return Err(EncodeError::InteriorNul { value: s.clone() });
        }
        out.extend_from_slice(s.as_bytes());
        out.push(0);
    }
    let count = count_of(out.len())?;
    Ok((out, count))
}

// =============================================================================
// CoderRegistry
// =============================================================================

/// Coders indexed by wire type code (decode path) and by value kind
/// (encode path).
#[derive(Clone)]
pub struct CoderRegistry {
    by_code: HashMap<u16, Arc<dyn Coder>>,
    by_kind: HashMap<ValueKind, Arc<dyn Coder>>,
}

impl CoderRegistry {
    /// Registry with nothing registered. Every entry is skipped on decode
    /// and dropped on encode until coders are added.
    pub fn empty() -> Self {
        Self {
            by_code: HashMap::new(),
            by_kind: HashMap::new(),
        }
    }

    /// Registry with coders for all twelve classic field types.
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        for field_type in FieldType::ALL {
            registry.register(FieldCoder::new(field_type));
        }
        registry
    }

    /// Register a coder under its type code and its value kind.
    ///
    /// A previous coder under either key is replaced.
    pub fn register(&mut self, coder: impl Coder + 'static) {
        let coder: Arc<dyn Coder> = Arc::new(coder);
        self.by_code.insert(coder.type_code(), Arc::clone(&coder));
        self.by_kind.insert(coder.kind(), coder);
    }

    pub fn by_type_code(&self, code: u16) -> Option<&dyn Coder> {
        self.by_code.get(&code).map(|c| c.as_ref())
    }

    pub fn by_kind(&self, kind: ValueKind) -> Option<&dyn Coder> {
        self.by_kind.get(&kind).map(|c| c.as_ref())
    }

    /// Registered type codes in ascending order.
    pub fn type_codes(&self) -> Vec<u16> {
        let mut codes: Vec<u16> = self.by_code.keys().copied().collect();
        codes.sort_unstable();
        codes
    }
}

impl Default for CoderRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl fmt::Debug for CoderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<ValueKind> = self.by_kind.keys().copied().collect();
        kinds.sort_unstable();
        f.debug_struct("CoderRegistry")
            .field("type_codes", &self.type_codes())
            .field("kinds", &kinds)
            .finish()
    }
}

/// Shared built-in registry used by the free `decode`/`encode` functions.
pub fn builtin_registry() -> &'static CoderRegistry {
    static REGISTRY: OnceLock<CoderRegistry> = OnceLock::new();
    REGISTRY.get_or_init(CoderRegistry::builtin)
}

// =============================================================================
// Tests
// =============================================================================

use thiserror::Error;

use crate::tiff::ValueKind;

/// I/O errors raised by the stream adapter.
#[derive(Debug, Error)]
pub enum IoError {
    /// The stream ended before the requested bytes could be read
    #[error("Truncated stream: requested {requested} bytes at offset {offset}, stream is {available} bytes")]
    Truncated {
        offset: u64,
        requested: u64,
        available: u64,
    },

    /// Seeking the underlying stream failed
    #[error("Seek to offset {offset} failed: {source}")]
    Seek {
        offset: u64,
        #[source]
        source: std::io::Error,
    },

    /// Reading the underlying stream failed
    #[error("Read of {requested} bytes at offset {offset} failed: {source}")]
    Read {
        offset: u64,
        requested: u64,
        #[source]
        source: std::io::Error,
    },

    /// Writing to the output sink failed
    #[error("Write failed: {source}")]
    Write {
        #[source]
        source: std::io::Error,
    },
}

/// The 8-byte header is not a classic TIFF header.
#[derive(Debug, Clone, Error)]
pub enum HeaderError {
    /// Byte order marker is neither II nor MM
    #[error("Invalid byte order marker: expected 0x4949 (II) or 0x4D4D (MM), got 0x{0:04X}")]
    InvalidByteOrder(u16),

    /// Magic number is not 42
    #[error("Invalid magic number: expected 42, got {0}")]
    InvalidMagic(u16),
}

/// Errors that abort a decode.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("I/O error: {0}")]
    Io(#[from] IoError),

    #[error("Malformed header: {0}")]
    MalformedHeader(#[from] HeaderError),

    /// A directory offset points at the header or past the end of the stream
    #[error("Invalid directory offset {offset} (stream is {size} bytes)")]
    InvalidDirectoryOffset { offset: u64, size: u64 },

    /// A coder was handed fewer bytes than its payload size
    #[error("Payload too short for type {type_code}: expected {expected} bytes, got {actual}")]
    PayloadTooShort {
        type_code: u16,
        expected: u64,
        actual: u64,
    },

    /// The same directory was reached twice
    #[error("Directory cycle detected at offset {offset}")]
    DirectoryCycle { offset: u64 },

    #[error("Sub-directory nesting too deep at offset {offset} (depth {depth})")]
    NestingTooDeep { offset: u64, depth: usize },

    #[error("Too many directories: limit is {limit}")]
    TooManyDirectories { limit: usize },
}

/// Errors that abort an encode.
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("I/O error: {0}")]
    Io(#[from] IoError),

    /// ASCII strings are NUL-delimited on the wire
    #[error("ASCII value contains an interior NUL byte: {value:?}")]
    InteriorNul { value: String },

    /// Sequence length does not fit the 32-bit count field
    #[error("Value has {len} elements, more than a 32-bit count can describe")]
    CountOverflow { len: usize },

    /// A coder was handed a value of a kind it does not encode
    #[error("Coder for type {type_code} cannot encode a {kind} value")]
    KindMismatch { type_code: u16, kind: ValueKind },

    /// Directory entry count does not fit the 16-bit count field
    #[error("Directory has {count} entries, at most 65535 are allowed")]
    TooManyEntries { count: usize },

    /// Sub-directories nest deeper than a default decode will follow
    #[error("Sub-directory nesting too deep: depth {depth} exceeds limit {limit}")]
    NestingTooDeep { depth: usize, limit: usize },

    /// Layout grew past what a 32-bit offset can address
    #[error("Layout offset {size} exceeds the 32-bit offset range")]
    OffsetOverflow { size: usize },

    /// A patch would write outside the laid-out bytes
    #[error("Patch at {at} is outside the {len}-byte layout")]
    PatchOutOfBounds { at: usize, len: usize },
}

//! # tiff-dir
//!
//! A codec for the tag-directory structure of classic TIFF files.
//!
//! The crate reads a TIFF stream into an in-memory tree of directories and
//! writes such a tree back out with a freshly computed layout. It does not
//! interpret image data; pixel strips and tiles are carried as ordinary
//! tagged values.
//!
//! ## Features
//!
//! - **Pointer-chasing decoder**: follows the stream's own offsets over any
//!   `Read + Seek` source, with cycle detection and nesting limits
//! - **Two-pass encoder**: writes directories first, then places
//!   out-of-line values and sub-directories and patches every offset
//! - **Pluggable coders**: one coder per wire type code, swappable through a
//!   registry
//! - **Both byte orders**: decodes "II" and "MM" streams and writes either
//!
//! ## Architecture
//!
//! - [`io`] - Byte-order aware stream reader
//! - [`tiff`] - Header, values, coders, decoder and encoder
//! - [`config`] - Decode limits and CLI types
//! - [`error`] - Error types
//!
//! ## Example
//!
//! ```rust
//! use std::io::Cursor;
//! use tiff_dir::{decode, encode, ByteOrder, Container, Directory, Value};
//!
//! let container = Container::new().with_directory(
//!     Directory::new()
//!         .with_entry(256, Value::Long(vec![1024]))
//!         .with_entry(270, Value::ascii("scan")),
//! );
//!
//! let bytes = encode(&container, ByteOrder::BigEndian).unwrap();
//! let decoded = decode(Cursor::new(bytes)).unwrap();
//! assert_eq!(decoded, container);
//! ```

pub mod config;
pub mod error;
pub mod io;
pub mod tiff;

// Re-export commonly used types
pub use config::{Cli, Command, DecodeOptions};
pub use error::{DecodeError, EncodeError, HeaderError, IoError};
pub use io::OrderedReader;
pub use tiff::{
    builtin_registry, decode, encode, encode_to, ByteOrder, Coder, CoderRegistry, Container,
    Decoder, Directory, Encoder, FieldCoder, FieldType, Rational, SRational, TiffHeader, Value,
    ValueKind, INLINE_THRESHOLD, SUB_IFDS, TIFF_HEADER_SIZE, TIFF_MAGIC,
};

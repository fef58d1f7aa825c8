//! TIFF tag-directory codec.
//!
//! Reads and writes the directory structure of classic TIFF streams: the
//! header, the chain of top-level directories (IFDs), their tagged values,
//! and sub-directory trees reached through tag 330. Image data is not
//! interpreted; strips and tiles are just entries like any other.
//!
//! # Key Concepts
//!
//! - **Byte order**: the header declares it ("II" little-endian, "MM"
//!   big-endian) and every multi-byte field in the stream follows it.
//!
//! - **Inline vs out-of-line values**: a value of 4 bytes or less lives in
//!   the entry itself; anything larger lives elsewhere and the entry holds
//!   its offset.
//!
//! - **Coders**: each wire type code is handled by a [`Coder`] looked up in
//!   a [`CoderRegistry`]. The decoder skips type codes it has no coder for;
//!   the encoder drops values whose kind has no coder.
//!
//! - **Layout**: the encoder never asks the caller for offsets. Directories
//!   are placed after the header and everything else is placed by the
//!   relocation pass in `layout`.

mod coder;
mod decoder;
mod directory;
mod encoder;
mod header;
mod layout;
mod tags;
mod values;

pub use coder::{builtin_registry, Coder, CoderRegistry, FieldCoder};
pub use decoder::{decode, Decoder};
pub use directory::{Container, Directory};
pub use encoder::{encode, encode_to, Encoder};
pub use header::{ByteOrder, TiffHeader, TIFF_HEADER_SIZE, TIFF_MAGIC};
pub use tags::{FieldType, INLINE_THRESHOLD, SUB_IFDS};
pub use values::{Rational, SRational, Value, ValueKind};

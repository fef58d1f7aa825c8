//! Directory chain decoding.
//!
//! Decoding follows the stream's own pointers:
//!
//! ```text
//! header ──► IFD 0 ──next──► IFD 1 ──next──► 0
//!              │
//!              └─ tag 330 ──► [sub IFD a, sub IFD b]
//! ```
//!
//! Entries are read sequentially. A value larger than 4 bytes is fetched with
//! [`OrderedReader::jump`], which returns the cursor to the entry table
//! afterwards, so the walk never loses its place.

use std::collections::HashSet;
use std::io::{Read, Seek};

use tracing::{debug, trace};

use crate::config::DecodeOptions;
use crate::error::DecodeError;
use crate::io::OrderedReader;

use super::coder::{builtin_registry, CoderRegistry};
use super::directory::{Container, Directory};
use super::header::{TiffHeader, TIFF_HEADER_SIZE};
use super::tags::{INLINE_THRESHOLD, SUB_IFDS};
use super::values::Value;

/// Size of the entry count field at the start of a directory.
const ENTRY_COUNT_SIZE: u64 = 2;

/// Decode a stream with the built-in coders and default limits.
pub fn decode<R: Read + Seek>(reader: R) -> Result<Container, DecodeError> {
    Decoder::new(builtin_registry()).decode(reader)
}

/// Decodes a TIFF stream into a [`Container`].
///
/// Holds no per-stream state; one decoder can be reused for any number of
/// streams, from any number of threads.
#[derive(Debug, Clone)]
pub struct Decoder<'r> {
    registry: &'r CoderRegistry,
    options: DecodeOptions,
}

impl<'r> Decoder<'r> {
    pub fn new(registry: &'r CoderRegistry) -> Self {
        Self {
            registry,
            options: DecodeOptions::default(),
        }
    }

    pub fn with_options(mut self, options: DecodeOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &DecodeOptions {
        &self.options
    }

    /// Decode every directory reachable from the header.
    ///
    /// Any failure aborts the whole decode; no partial container is returned.
    pub fn decode<R: Read + Seek>(&self, reader: R) -> Result<Container, DecodeError> {
        let mut reader = OrderedReader::new(reader)?;
        let header = TiffHeader::read(&mut reader)?;

        let mut walk = Walk {
            reader,
            registry: self.registry,
            options: self.options,
            visited: HashSet::new(),
        };

        let mut container = Container::new();
        let mut offset = header.first_ifd_offset;
        while offset != 0 {
            let (directory, next) = walk.directory(offset, 0)?;
            container.push(directory);
            offset = next;
        }

        debug!(
            byte_order = ?header.byte_order,
            directories = container.len(),
            visited = walk.visited.len(),
            "Decoded TIFF container"
        );

        Ok(container)
    }
}

/// State of one decode call.
struct Walk<'r, R> {
    reader: OrderedReader<R>,
    registry: &'r CoderRegistry,
    options: DecodeOptions,
    visited: HashSet<u32>,
}

impl<'r, R: Read + Seek> Walk<'r, R> {
    /// Decode the directory at `offset` and its sub-directories.
    ///
    /// Returns the directory and its "next directory" offset.
    fn directory(&mut self, offset: u32, depth: usize) -> Result<(Directory, u32), DecodeError> {
        self.enter(offset, depth)?;
        self.reader.seek_to(offset as u64)?;

        let entry_count = self.reader.read_u16()?;
        trace!(offset, entry_count, depth, "Reading directory");

        let mut directory = Directory::new();
        for _ in 0..entry_count {
            self.entry(&mut directory)?;
        }

        let next = self.reader.read_u32()?;
        self.sub_directories(&mut directory, depth)?;

        Ok((directory, next))
    }

    /// Bookkeeping and sanity checks before a directory is read.
    fn enter(&mut self, offset: u32, depth: usize) -> Result<(), DecodeError> {
        let size = self.reader.len();
        let offset_u64 = offset as u64;
        if offset_u64 < TIFF_HEADER_SIZE as u64 || offset_u64 + ENTRY_COUNT_SIZE > size {
            return Err(DecodeError::InvalidDirectoryOffset {
                offset: offset_u64,
                size,
            });
        }
        if depth > self.options.max_depth {
            return Err(DecodeError::NestingTooDeep {
                offset: offset_u64,
                depth,
            });
        }
        if self.visited.len() >= self.options.max_directories {
            return Err(DecodeError::TooManyDirectories {
                limit: self.options.max_directories,
            });
        }
        if !self.visited.insert(offset) {
            return Err(DecodeError::DirectoryCycle { offset: offset_u64 });
        }
        Ok(())
    }

    /// Read one 12-byte entry and insert its value.
    ///
    /// Entries whose type code has no coder are skipped.
    fn entry(&mut self, directory: &mut Directory) -> Result<(), DecodeError> {
        let tag = self.reader.read_u16()?;
        let type_code = self.reader.read_u16()?;
        let count = self.reader.read_u32()?;

        let Some(coder) = self.registry.by_type_code(type_code) else {
            debug!(tag, type_code, count, "Skipping entry with unknown type");
            self.reader.skip(INLINE_THRESHOLD as u64)?;
            return Ok(());
        };

        let size = coder.payload_size(count);
        let bytes = if size <= INLINE_THRESHOLD as u64 {
            let field = self.reader.read_array::<INLINE_THRESHOLD>()?;
            field[..size as usize].to_vec()
        } else {
            let value_offset = self.reader.read_u32()?;
            self.reader
                .jump(value_offset as u64, |r| r.read_vec(size))?
        };

        let value = coder.unmarshal(&bytes, count, self.reader.byte_order())?;
        directory.insert(tag, value);
        Ok(())
    }

    /// Follow the sub-directory offsets, if any.
    ///
    /// Only a LONG value under [`SUB_IFDS`] is followed. The offsets are
    /// consumed: once the children are attached they carry no information
    /// the encoder won't regenerate.
    fn sub_directories(&mut self, directory: &mut Directory, depth: usize) -> Result<(), DecodeError> {
        let offsets = match directory.get(SUB_IFDS).and_then(Value::as_longs) {
            Some(offsets) if !offsets.is_empty() => offsets.to_vec(),
            _ => return Ok(()),
        };
        directory.remove(SUB_IFDS);

        for offset in offsets {
            // The next pointer of a sub-directory is not followed
            let (child, _next) = self.directory(offset, depth + 1)?;
            directory.sub_directories.push(child);
        }
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================

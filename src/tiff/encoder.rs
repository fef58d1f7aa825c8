//! Container encoding.
//!
//! Directories are laid out back to back after the header, in caller order,
//! so each "next directory" pointer is known when it is written. Values over
//! 4 bytes and sub-directory trees cannot be placed until every directory is
//! written; they go through [`LayoutBlock`] placeholders and are patched
//! when the root block is linked.
//!
//! ```text
//! [header][IFD 0][IFD 1]...[IFD n][pad][value][pad][value][pad][sub IFD block]...
//! ```

use std::io::Write;

use bytes::Bytes;
use tracing::{debug, trace};

use crate::config::DEFAULT_MAX_DEPTH;
use crate::error::{EncodeError, IoError};

use super::coder::{builtin_registry, CoderRegistry};
use super::directory::{Container, Directory};
use super::header::{ByteOrder, TiffHeader, TIFF_HEADER_SIZE};
use super::layout::LayoutBlock;
use super::tags::{FieldType, INLINE_THRESHOLD, SUB_IFDS};

/// Encode a container with the built-in coders.
///
/// Sub-directories nested deeper than [`DEFAULT_MAX_DEPTH`] are rejected, so
/// everything this writes decodes with the default limits.
pub fn encode(container: &Container, byte_order: ByteOrder) -> Result<Bytes, EncodeError> {
    Encoder::new(builtin_registry(), byte_order).encode(container)
}

/// Encode a container with the built-in coders and write it to `writer`.
pub fn encode_to<W: Write>(
    container: &Container,
    byte_order: ByteOrder,
    writer: W,
) -> Result<usize, EncodeError> {
    Encoder::new(builtin_registry(), byte_order).encode_to(container, writer)
}

/// Serializes a [`Container`] in one byte order.
///
/// The container is only borrowed; encoding never mutates it.
#[derive(Debug, Clone)]
pub struct Encoder<'r> {
    registry: &'r CoderRegistry,
    byte_order: ByteOrder,
    max_depth: usize,
}

/// An entry ready to be written.
struct Prepared<'a> {
    tag: u16,
    type_code: u16,
    count: u32,
    payload: Payload<'a>,
}

enum Payload<'a> {
    Bytes(Vec<u8>),
    Children(&'a [Directory]),
}

impl<'r> Encoder<'r> {
    pub fn new(registry: &'r CoderRegistry, byte_order: ByteOrder) -> Self {
        Self {
            registry,
            byte_order,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Deepest sub-directory level accepted (top-level directories are 0).
    ///
    /// Match it to the decoder's `max_depth` when raising it.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    /// Lay out and link the whole container.
    pub fn encode(&self, container: &Container) -> Result<Bytes, EncodeError> {
        let mut root = LayoutBlock::new(self.byte_order);

        let header = TiffHeader {
            byte_order: self.byte_order,
            first_ifd_offset: if container.is_empty() {
                0
            } else {
                TIFF_HEADER_SIZE as u32
            },
        };
        root.put_bytes(&header.to_bytes());

        let last = container.len().saturating_sub(1);
        for (index, directory) in container.iter().enumerate() {
            self.write_directory(&mut root, directory, index < last, 0)?;
        }

        let bytes = root.link().resolve()?;

        debug!(
            byte_order = ?self.byte_order,
            directories = container.len(),
            bytes = bytes.len(),
            "Encoded TIFF container"
        );

        Ok(Bytes::from(bytes))
    }

    /// Encode, then write the finished bytes in one go.
    ///
    /// Nothing reaches `writer` unless layout and patching both succeeded.
    pub fn encode_to<W: Write>(
        &self,
        container: &Container,
        mut writer: W,
    ) -> Result<usize, EncodeError> {
        let bytes = self.encode(container)?;
        writer
            .write_all(&bytes)
            .and_then(|()| writer.flush())
            .map_err(|source| IoError::Write { source })?;
        Ok(bytes.len())
    }

    /// Write one directory at the end of `block`.
    ///
    /// When `chained` the next pointer is the offset right after this
    /// directory, where the caller writes the following one.
    fn write_directory(
        &self,
        block: &mut LayoutBlock,
        directory: &Directory,
        chained: bool,
        depth: usize,
    ) -> Result<(), EncodeError> {
        let entries = self.prepare(directory)?;
        let entry_count = u16::try_from(entries.len()).map_err(|_| EncodeError::TooManyEntries {
            count: entries.len(),
        })?;

        trace!(
            at = block.len(),
            entry_count,
            sub_directories = directory.sub_directories.len(),
            "Writing directory"
        );

        block.put_u16(entry_count);
        for entry in entries {
            block.put_u16(entry.tag);
            block.put_u16(entry.type_code);
            block.put_u32(entry.count);

            match entry.payload {
                Payload::Bytes(bytes) if bytes.len() <= INLINE_THRESHOLD => {
                    let mut field = [0u8; INLINE_THRESHOLD];
                    field[..bytes.len()].copy_from_slice(&bytes);
                    block.put_bytes(&field);
                }
                Payload::Bytes(bytes) => {
                    let at = block.placeholder();
                    block.defer_bytes(at, bytes);
                }
                Payload::Children(children) => self.write_children(block, children, depth + 1)?,
            }
        }

        let next = if chained {
            let next = block.len() + 4;
            u32::try_from(next).map_err(|_| EncodeError::OffsetOverflow { size: next })?
        } else {
            0
        };
        block.put_u32(next);

        Ok(())
    }

    /// Write the value field of the sub-directory entry.
    ///
    /// One child: the field itself points at the child block. Several: the
    /// field points at an offset table whose slots point at each child.
    fn write_children(
        &self,
        block: &mut LayoutBlock,
        children: &[Directory],
        depth: usize,
    ) -> Result<(), EncodeError> {
        if depth > self.max_depth {
            return Err(EncodeError::NestingTooDeep {
                depth,
                limit: self.max_depth,
            });
        }

        let placeholder = block.placeholder();

        if let [child] = children {
            block.defer_block(placeholder, self.directory_block(child, depth)?);
            return Ok(());
        }

        let mut table = LayoutBlock::new(self.byte_order);
        for child in children {
            let slot = table.placeholder();
            table.defer_block(slot, self.directory_block(child, depth)?);
        }
        block.defer_block(placeholder, table);
        Ok(())
    }

    /// A sub-directory as a block of its own; its next pointer is 0.
    fn directory_block(
        &self,
        directory: &Directory,
        depth: usize,
    ) -> Result<LayoutBlock, EncodeError> {
        let mut block = LayoutBlock::new(self.byte_order);
        self.write_directory(&mut block, directory, false, depth)?;
        Ok(block)
    }

    /// Marshal entries in ascending tag order.
    ///
    /// Values with no coder for their kind are dropped. Sub-directories
    /// become a LONG entry under [`SUB_IFDS`], replacing any value the
    /// caller stored there. A LONG stored there without children would be
    /// read back as offsets, so it is dropped as well.
    fn prepare<'a>(&self, directory: &'a Directory) -> Result<Vec<Prepared<'a>>, EncodeError> {
        let children = directory.sub_directories.as_slice();
        let mut entries = Vec::with_capacity(directory.len() + 1);

        for tag in directory.sorted_tags() {
            let value = &directory.entries[&tag];

            if tag == SUB_IFDS && !children.is_empty() {
                debug!(tag, kind = %value.kind(), "Replacing stored sub-directory offsets");
                continue;
            }
            let dangling = value.as_longs().is_some_and(|offsets| !offsets.is_empty());
            if tag == SUB_IFDS && dangling {
                debug!(tag, "Dropping sub-directory offsets with no sub-directories");
                continue;
            }

            let Some(coder) = self.registry.by_kind(value.kind()) else {
                debug!(tag, kind = %value.kind(), "Dropping entry with unregistered kind");
                continue;
            };

            let (bytes, count) = coder.marshal(value, self.byte_order)?;
            entries.push(Prepared {
                tag,
                type_code: coder.type_code(),
                count,
                payload: Payload::Bytes(bytes),
            });
        }

        if !children.is_empty() {
            let count = u32::try_from(children.len()).map_err(|_| EncodeError::CountOverflow {
                len: children.len(),
            })?;
            let at = entries.partition_point(|e| e.tag < SUB_IFDS);
            entries.insert(
                at,
                Prepared {
                    tag: SUB_IFDS,
                    type_code: FieldType::Long.as_u16(),
                    count,
                    payload: Payload::Children(children),
                },
            );
        }

        Ok(entries)
    }
}

// =============================================================================
// Tests
// =============================================================================

//! Layout blocks and offset patching.
//!
//! A [`LayoutBlock`] is a byte arena plus a list of deferred items. Each
//! deferred item names a 4-byte placeholder already written to the arena and
//! the payload that placeholder must end up pointing at: either raw bytes or
//! another block.
//!
//! Linking a block appends every deferred payload, in the order recorded, at
//! the next 4-byte boundary and records a patch `(placeholder, address)`.
//! A nested block is linked first into its own span; its patches are then
//! re-based by the offset the span landed at. Addresses are relative to the
//! start of the block being linked, so the root block (which starts with
//! the file header) yields absolute offsets.
//!
//! ```text
//! root:  [header | IFD ....ph1....ph2.... | pad | raw1 | pad | child ]
//!                        │         │              ▲            ▲
//!                        └─────────┼──────────────┘            │
//!                                  └───────────────────────────┘
//! ```

use crate::error::EncodeError;

use super::header::ByteOrder;

/// Alignment of every deferred payload.
pub const ALIGNMENT: usize = 4;

/// Growable arena with deferred out-of-line payloads.
#[derive(Debug)]
pub struct LayoutBlock {
    order: ByteOrder,
    bytes: Vec<u8>,
    deferred: Vec<Deferred>,
}

#[derive(Debug)]
struct Deferred {
    placeholder: usize,
    payload: Payload,
}

#[derive(Debug)]
enum Payload {
    Raw(Vec<u8>),
    Block(LayoutBlock),
}

/// Linked bytes with unresolved offset patches.
#[derive(Debug)]
pub struct Span {
    order: ByteOrder,
    bytes: Vec<u8>,
    patches: Vec<Patch>,
}

/// Write `target` as a 4-byte offset at `at`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Patch {
    at: usize,
    target: usize,
}

impl LayoutBlock {
    pub fn new(order: ByteOrder) -> Self {
        Self {
            order,
            bytes: Vec::new(),
            deferred: Vec::new(),
        }
    }

    /// Bytes written to the arena so far; deferred payloads not included.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn put_bytes(&mut self, bytes: &[u8]) {
        self.bytes.extend_from_slice(bytes);
    }

    pub fn put_u16(&mut self, value: u16) {
        let bytes = self.order.u16_bytes(value);
        self.put_bytes(&bytes);
    }

    pub fn put_u32(&mut self, value: u32) {
        let bytes = self.order.u32_bytes(value);
        self.put_bytes(&bytes);
    }

    /// Write a zeroed 4-byte offset field and return its position.
    pub fn placeholder(&mut self) -> usize {
        let at = self.bytes.len();
        self.put_bytes(&[0; 4]);
        at
    }

    /// Place `bytes` out of line and point the placeholder at them.
    pub fn defer_bytes(&mut self, placeholder: usize, bytes: Vec<u8>) {
        self.deferred.push(Deferred {
            placeholder,
            payload: Payload::Raw(bytes),
        });
    }

    /// Place a whole block out of line and point the placeholder at its start.
    pub fn defer_block(&mut self, placeholder: usize, block: LayoutBlock) {
        self.deferred.push(Deferred {
            placeholder,
            payload: Payload::Block(block),
        });
    }

    /// Append deferred payloads and collect patches relative to this block.
    pub fn link(self) -> Span {
        let mut bytes = self.bytes;
        let mut patches = Vec::with_capacity(self.deferred.len());

        for item in self.deferred {
            pad_to_alignment(&mut bytes);
            let base = bytes.len();

            match item.payload {
                Payload::Raw(raw) => bytes.extend_from_slice(&raw),
                Payload::Block(block) => {
                    let span = block.link();
                    patches.extend(span.patches.into_iter().map(|p| Patch {
                        at: base + p.at,
                        target: base + p.target,
                    }));
                    bytes.extend_from_slice(&span.bytes);
                }
            }

            patches.push(Patch {
                at: item.placeholder,
                target: base,
            });
        }

        Span {
            order: self.order,
            bytes,
            patches,
        }
    }
}

impl Span {
    /// Overwrite every placeholder with its resolved offset.
    ///
    /// Patches only ever land on bytes that already exist.
    pub fn resolve(self) -> Result<Vec<u8>, EncodeError> {
        let mut bytes = self.bytes;
        let len = bytes.len();

        for patch in self.patches {
            let target = u32::try_from(patch.target)
                .map_err(|_| EncodeError::OffsetOverflow { size: patch.target })?;
            let end = patch
                .at
                .checked_add(4)
                .filter(|&end| end <= len)
                .ok_or(EncodeError::PatchOutOfBounds { at: patch.at, len })?;
            bytes[patch.at..end].copy_from_slice(&self.order.u32_bytes(target));
        }

        Ok(bytes)
    }
}

fn pad_to_alignment(bytes: &mut Vec<u8>) {
    let rem = bytes.len() % ALIGNMENT;
    if rem != 0 {
        bytes.resize(bytes.len() + ALIGNMENT - rem, 0);
    }
}

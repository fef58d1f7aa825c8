use std::io::{ErrorKind, Read, Seek, SeekFrom};

use crate::error::IoError;
use crate::tiff::ByteOrder;

/// Byte-order aware reader over a seekable stream.
///
/// Tracks the cursor itself so every error can name the offset it happened
/// at, and so out-of-line reads can jump away and come back without asking
/// the stream where it is.
pub struct OrderedReader<R> {
    inner: R,
    order: ByteOrder,
    position: u64,
    len: u64,
}

impl<R: Read + Seek> OrderedReader<R> {
    /// Wrap a stream. Its length is measured once and the cursor is left at 0.
    pub fn new(mut inner: R) -> Result<Self, IoError> {
        let len = inner
            .seek(SeekFrom::End(0))
            .map_err(|source| IoError::Seek { offset: 0, source })?;
        inner
            .seek(SeekFrom::Start(0))
            .map_err(|source| IoError::Seek { offset: 0, source })?;

        Ok(Self {
            inner,
            order: ByteOrder::default(),
            position: 0,
            len,
        })
    }

    #[inline]
    pub fn byte_order(&self) -> ByteOrder {
        self.order
    }

    pub fn set_byte_order(&mut self, order: ByteOrder) {
        self.order = order;
    }

    /// Current cursor position.
    #[inline]
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Total stream length in bytes.
    #[inline]
    pub fn len(&self) -> u64 {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Move the cursor to an absolute offset.
    pub fn seek_to(&mut self, offset: u64) -> Result<(), IoError> {
        if offset == self.position {
            return Ok(());
        }
        self.inner
            .seek(SeekFrom::Start(offset))
            .map_err(|source| IoError::Seek { offset, source })?;
        self.position = offset;
        Ok(())
    }

    /// Advance the cursor without reading.
    pub fn skip(&mut self, n: u64) -> Result<(), IoError> {
        self.ensure_available(n)?;
        self.seek_to(self.position + n)
    }

    /// Read exactly `len` bytes.
    ///
    /// The length is checked against the stream before anything is
    /// allocated, so a corrupt count cannot trigger a huge allocation.
    pub fn read_vec(&mut self, len: u64) -> Result<Vec<u8>, IoError> {
        self.ensure_available(len)?;
        let mut buf = vec![0u8; len as usize];
        self.fill(&mut buf)?;
        Ok(buf)
    }

    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N], IoError> {
        self.ensure_available(N as u64)?;
        let mut buf = [0u8; N];
        self.fill(&mut buf)?;
        Ok(buf)
    }

    pub fn read_u16(&mut self) -> Result<u16, IoError> {
        let bytes = self.read_array::<2>()?;
        Ok(self.order.read_u16(&bytes))
    }

    pub fn read_u32(&mut self) -> Result<u32, IoError> {
        let bytes = self.read_array::<4>()?;
        Ok(self.order.read_u32(&bytes))
    }

    /// Run `read` at `offset`, then put the cursor back where it was.
    ///
    /// This is how out-of-line values are fetched in the middle of a
    /// directory without losing the place in the entry table.
    pub fn jump<T>(
        &mut self,
        offset: u64,
        read: impl FnOnce(&mut Self) -> Result<T, IoError>,
    ) -> Result<T, IoError> {
        let saved = self.position;
        self.seek_to(offset)?;
        let value = read(self)?;
        self.seek_to(saved)?;
        Ok(value)
    }

    fn ensure_available(&self, requested: u64) -> Result<(), IoError> {
        match self.position.checked_add(requested) {
            Some(end) if end <= self.len => Ok(()),
            _ => Err(IoError::Truncated {
                offset: self.position,
                requested,
                available: self.len,
            }),
        }
    }

    fn fill(&mut self, buf: &mut [u8]) -> Result<(), IoError> {
        let offset = self.position;
        let requested = buf.len() as u64;
        let available = self.len;
        self.inner.read_exact(buf).map_err(|source| {
            if source.kind() == ErrorKind::UnexpectedEof {
                IoError::Truncated {
                    offset,
                    requested,
                    available,
                }
            } else {
                IoError::Read {
                    offset,
                    requested,
                    source,
                }
            }
        })?;
        self.position += requested;
        Ok(())
    }
}

use std::io::{self, Read, Seek, SeekFrom};

use crate::errors::{Result, TemporaryError};
use crate::seek::{self, Whence};

/// Capacity handed out for the first small write into an empty buffer.
pub const SMALL_BUFFER_SIZE: usize = 64;

/// Largest capacity a single allocation may have.
pub const MAX_ALLOCATION: usize = isize::MAX as usize;

/// Outcome of appending to a [`MemoryBuffer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferWrite {
    /// The whole slice was stored.
    Written(usize),
    /// Growth could not be satisfied. The first `accepted` bytes were
    /// stored in the capacity already held, the rest must go elsewhere.
    NeedsSpill { accepted: usize },
}

/// Append-only byte store with a read cursor that is independent from
/// the append point.
#[derive(Debug)]
pub struct MemoryBuffer {
    data: Vec<u8>,
    cursor: u64,
    limit: usize,
}

impl Default for MemoryBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBuffer {
    pub fn new() -> Self {
        Self::with_limit(MAX_ALLOCATION)
    }

    /// Create a buffer whose capacity may never exceed `limit` bytes.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            data: Vec::new(),
            cursor: 0,
            limit: limit.min(MAX_ALLOCATION),
        }
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    pub fn capacity(&self) -> usize {
        self.data.capacity()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn position(&self) -> u64 {
        self.cursor
    }

    /// Append `p`, growing the backing storage if needed.
    ///
    /// Never fails: when the allocation ceiling is hit the caller gets
    /// [`BufferWrite::NeedsSpill`] and decides what to do with the rest.
    pub fn append(&mut self, p: &[u8]) -> BufferWrite {
        match self.grow(p.len()) {
            Ok(()) => {
                self.data.extend_from_slice(p);
                BufferWrite::Written(p.len())
            }
            Err(_) => {
                let room = self.data.capacity() - self.data.len();
                let accepted = room.min(p.len());
                self.data
                    .extend_from_slice(&p[..accepted]);
                log::trace!(
                    "buffer refused to grow past {} bytes, accepted {} of {}",
                    self.data.capacity(),
                    accepted,
                    p.len()
                );
                BufferWrite::NeedsSpill { accepted }
            }
        }
    }

    /// Make room for `n` more bytes.
    ///
    /// A request that fits in half the capacity is always covered by the
    /// in-place check, so only three cases remain.
    fn grow(&mut self, n: usize) -> Result<()> {
        let len = self.data.len();
        let cap = self.data.capacity();

        if len
            .checked_add(n)
            .map_or(false, |needed| needed <= cap)
        {
            return Ok(());
        }

        let target = if cap == 0 && n <= SMALL_BUFFER_SIZE {
            let floor = SMALL_BUFFER_SIZE.min(self.limit);
            if n > floor {
                return Err(TemporaryError::BufferTooLarge);
            }
            floor
        } else {
            cap.checked_mul(2)
                .and_then(|doubled| doubled.checked_add(n))
                .filter(|&target| target <= self.limit)
                .ok_or(TemporaryError::BufferTooLarge)?
        };

        log::trace!("growing buffer from {} to {} bytes", cap, target);
        self.data
            .try_reserve_exact(target - len)
            .map_err(|_| TemporaryError::BufferTooLarge)
    }

    pub fn seek_whence(&mut self, offset: i64, whence: Whence) -> Result<u64> {
        self.cursor = seek::resolve(self.cursor, self.size(), offset, whence)?;
        Ok(self.cursor)
    }
}

impl Read for MemoryBuffer {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.cursor >= self.size() {
            return Ok(0);
        }
        let start = self.cursor as usize;
        let available = &self.data[start..];
        let n = available.len().min(buf.len());
        buf[..n].copy_from_slice(&available[..n]);
        self.cursor += n as u64;
        Ok(n)
    }
}

impl Seek for MemoryBuffer {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let (offset, whence) = seek::split(pos)?;
        Ok(self.seek_whence(offset, whence)?)
    }
}

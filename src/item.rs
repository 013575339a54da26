use std::fmt;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;

use crate::buffer::MemoryBuffer;
use crate::errors::Result;
use crate::file::FileItem;
use crate::seek::Whence;

/// Where the bytes of a temporary currently live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemporaryKind {
    Buffer,
    File,
}

impl TemporaryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TemporaryKind::Buffer => "Buffer",
            TemporaryKind::File => "File",
        }
    }
}

impl fmt::Display for TemporaryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug)]
pub(crate) enum Item {
    Buffer(MemoryBuffer),
    File(FileItem),
}

impl Item {
    pub fn size(&self) -> u64 {
        match self {
            Item::Buffer(buffer) => buffer.size(),
            Item::File(file) => file.size(),
        }
    }

    pub fn kind(&self) -> TemporaryKind {
        match self {
            Item::Buffer(_) => TemporaryKind::Buffer,
            Item::File(_) => TemporaryKind::File,
        }
    }

    pub fn name(&self) -> Option<&Path> {
        match self {
            Item::Buffer(_) => None,
            Item::File(file) => Some(file.path()),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Item::Buffer(buffer) => buffer.as_bytes(),
            Item::File(_) => &[],
        }
    }

    pub fn position(&self) -> u64 {
        match self {
            Item::Buffer(buffer) => buffer.position(),
            Item::File(file) => file.position(),
        }
    }

    pub fn sync(&self) -> Result<()> {
        match self {
            Item::Buffer(_) => Ok(()),
            Item::File(file) => file.sync(),
        }
    }

    pub fn seek_whence(&mut self, offset: i64, whence: Whence) -> Result<u64> {
        match self {
            Item::Buffer(buffer) => buffer.seek_whence(offset, whence),
            Item::File(file) => file.seek_whence(offset, whence),
        }
    }

    pub fn close(self) -> Result<()> {
        match self {
            Item::Buffer(_) => Ok(()),
            Item::File(file) => file.close(),
        }
    }
}

impl Read for Item {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Item::Buffer(buffer) => buffer.read(buf),
            Item::File(file) => file.read(buf),
        }
    }
}

impl Seek for Item {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        match self {
            Item::Buffer(buffer) => buffer.seek(pos),
            Item::File(file) => file.seek(pos),
        }
    }
}

use std::io::SeekFrom;

use crate::errors::{Result, TemporaryError};

/// Origin of a seek, numbered the POSIX way (0, 1, 2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Whence {
    Start,
    Current,
    End,
}

impl TryFrom<i32> for Whence {
    type Error = TemporaryError;

    fn try_from(value: i32) -> Result<Self> {
        match value {
            0 => Ok(Whence::Start),
            1 => Ok(Whence::Current),
            2 => Ok(Whence::End),
            other => Err(TemporaryError::InvalidWhence(other)),
        }
    }
}

/// Compute the absolute cursor for a seek.
///
/// There is no upper bound: a cursor past `size` is legal and the next
/// read reports end-of-stream.
pub(crate) fn resolve(
    cursor: u64,
    size: u64,
    offset: i64,
    whence: Whence,
) -> Result<u64> {
    let base = match whence {
        Whence::Start => 0,
        Whence::Current => cursor as i128,
        Whence::End => size as i128,
    };
    let abs = base + offset as i128;
    if abs < 0 {
        return Err(TemporaryError::NegativePosition(
            abs.max(i64::MIN as i128) as i64,
        ));
    }
    u64::try_from(abs).map_err(|_| overflow())
}

/// Turn a std seek request into an offset and origin.
///
/// Positions beyond `i64::MAX` are not addressable by any item and are
/// rejected.
pub(crate) fn split(pos: SeekFrom) -> Result<(i64, Whence)> {
    match pos {
        SeekFrom::Start(offset) => i64::try_from(offset)
            .map(|offset| (offset, Whence::Start))
            .map_err(|_| overflow()),
        SeekFrom::Current(offset) => Ok((offset, Whence::Current)),
        SeekFrom::End(offset) => Ok((offset, Whence::End)),
    }
}

fn overflow() -> TemporaryError {
    TemporaryError::Io(std::io::Error::new(
        std::io::ErrorKind::InvalidInput,
        "seek position overflows",
    ))
}

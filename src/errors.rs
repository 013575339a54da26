use std::io;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, TemporaryError>;

#[derive(Error, Debug)]
pub enum TemporaryError {
    #[error("IO error: {0}")]
    Io(io::Error),
    #[error("buffer too large")]
    BufferTooLarge,
    #[error("seek invalid whence: {0}")]
    InvalidWhence(i32),
    #[error("seek negative position: {0}")]
    NegativePosition(i64),
    #[error("population task panicked")]
    TaskPanicked,
}

// Errors travel through `std::io` traits (and `io::copy`) wrapped in an
// `io::Error`; unwrap them on the way back so the variant survives.
impl From<io::Error> for TemporaryError {
    fn from(err: io::Error) -> Self {
        let wraps_ours = err
            .get_ref()
            .map_or(false, |inner| inner.is::<TemporaryError>());
        if !wraps_ours {
            return Self::Io(err);
        }
        match err.into_inner().map(|inner| inner.downcast::<TemporaryError>())
        {
            Some(Ok(ours)) => *ours,
            _ => Self::Io(io::Error::new(
                io::ErrorKind::Other,
                "lost wrapped temporary error",
            )),
        }
    }
}

impl From<TemporaryError> for io::Error {
    fn from(err: TemporaryError) -> Self {
        let kind = match err {
            TemporaryError::Io(inner) => return inner,
            TemporaryError::BufferTooLarge => io::ErrorKind::OutOfMemory,
            TemporaryError::InvalidWhence(_)
            | TemporaryError::NegativePosition(_) => {
                io::ErrorKind::InvalidInput
            }
            TemporaryError::TaskPanicked => io::ErrorKind::Other,
        };
        io::Error::new(kind, err)
    }
}

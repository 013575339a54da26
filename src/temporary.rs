use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;
use std::thread::{self, JoinHandle};

use crate::errors::{Result, TemporaryError};
use crate::item::TemporaryKind;
use crate::options::TemporaryOptions;
use crate::seek::Whence;
use crate::spill::Spillover;

/// A source that has to be released explicitly once it has been drained.
pub trait ReadClose: Read {
    fn close(self) -> io::Result<()>;
}

impl ReadClose for File {
    fn close(self) -> io::Result<()> {
        drop(self);
        Ok(())
    }
}

/// Write-once, read-many holder of temporary data.
///
/// Bytes are kept in memory until `max_buffer_size` would be exceeded,
/// then they move to a temporary file in `dir`. Reading and seeking work
/// the same way before and after the move.
#[derive(Debug)]
pub struct Temporary {
    inner: Spillover,
}

impl Temporary {
    /// Create an empty holder to be filled through [`Write`].
    pub fn new(options: TemporaryOptions) -> Self {
        Self {
            inner: Spillover::new(options),
        }
    }

    /// Drain `reader` on the current thread and sync the result.
    pub fn from_reader<R: Read>(
        mut reader: R,
        options: TemporaryOptions,
    ) -> Result<Self> {
        let mut temporary = Self::new(options);
        temporary.populate(&mut reader)?;
        Ok(temporary)
    }

    /// Drain `reader` on a background thread.
    ///
    /// The returned handle must be waited on to get the holder.
    pub fn spawn<R>(reader: R, options: TemporaryOptions) -> PendingTemporary
    where
        R: Read + Send + 'static,
    {
        Self::spawn_with(options, move |temporary| {
            let mut reader = reader;
            temporary.populate(&mut reader)
        })
    }

    /// Like [`Temporary::spawn`], but the background thread also closes
    /// `reader` once draining is over, whether it succeeded or not.
    pub fn spawn_owned<R>(
        reader: R,
        options: TemporaryOptions,
    ) -> PendingTemporary
    where
        R: ReadClose + Send + 'static,
    {
        Self::spawn_with(options, move |temporary| {
            let mut reader = CloseOnDrop(Some(reader));
            temporary.populate(&mut reader)
        })
    }

    fn spawn_with<F>(options: TemporaryOptions, task: F) -> PendingTemporary
    where
        F: FnOnce(&mut Temporary) -> Result<()> + Send + 'static,
    {
        let label = options.label.clone();
        log::debug!("{}: populating in background", label);

        let handle = thread::spawn(move || -> Result<Temporary> {
            let mut temporary = Temporary::new(options);
            task(&mut temporary)?;
            log::debug!(
                "{}: populated {} bytes into {}",
                temporary.options().label,
                temporary.size(),
                temporary.kind()
            );
            Ok(temporary)
        });
        PendingTemporary { label, handle }
    }

    fn populate<R: Read>(&mut self, reader: &mut R) -> Result<()> {
        io::copy(reader, &mut self.inner)?;
        self.inner.sync()
    }

    pub fn options(&self) -> &TemporaryOptions {
        self.inner.options()
    }

    pub fn size(&self) -> u64 {
        self.inner.size()
    }

    pub fn kind(&self) -> TemporaryKind {
        self.inner.kind()
    }

    /// Path of the backing file, `None` while the data is in memory.
    pub fn name(&self) -> Option<&Path> {
        self.inner.name()
    }

    /// In-memory content. Only meaningful while [`Temporary::kind`] is
    /// [`TemporaryKind::Buffer`], empty afterwards.
    pub fn as_bytes(&self) -> &[u8] {
        self.inner.as_bytes()
    }

    pub fn position(&self) -> u64 {
        self.inner.position()
    }

    /// Force the content to disk. Nothing to do while in memory.
    pub fn sync(&self) -> Result<()> {
        self.inner.sync()
    }

    /// Move the content to a file now instead of waiting for the threshold.
    pub fn spill(&mut self) -> Result<()> {
        self.inner.convert()
    }

    /// Seek with a numeric whence: 0 from start, 1 from the cursor, 2 from
    /// the end. Anything else is [`TemporaryError::InvalidWhence`].
    pub fn seek_raw(&mut self, offset: i64, whence: i32) -> Result<u64> {
        let whence = Whence::try_from(whence)?;
        self.inner.seek_whence(offset, whence)
    }

    /// Release the content, removing the backing file if there is one.
    pub fn close(self) -> Result<()> {
        self.inner.close()
    }
}

impl Write for Temporary {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

impl Read for Temporary {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

impl Seek for Temporary {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.inner.seek(pos)
    }
}

/// A [`Temporary`] still being populated on a background thread.
#[derive(Debug)]
pub struct PendingTemporary {
    label: String,
    handle: JoinHandle<Result<Temporary>>,
}

impl PendingTemporary {
    /// Returns true once population is over and [`wait`] won't block.
    ///
    /// [`wait`]: PendingTemporary::wait
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Block until population is over.
    ///
    /// Gives back the populated holder, or the first error hit while
    /// draining or syncing. A failed holder is released before its
    /// error is reported.
    pub fn wait(self) -> Result<Temporary> {
        match self.handle.join() {
            Ok(result) => result,
            Err(_) => {
                log::debug!("{}: population task panicked", self.label);
                Err(TemporaryError::TaskPanicked)
            }
        }
    }
}

// Closes the source when the population task is done with it, including
// when the task unwinds. `close` consumes the source, so it sits in an
// `Option` that only `drop` takes; reads always find it present.
struct CloseOnDrop<R: ReadClose>(Option<R>);

impl<R: ReadClose> Read for CloseOnDrop<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match &mut self.0 {
            Some(reader) => reader.read(buf),
            None => Ok(0),
        }
    }
}

impl<R: ReadClose> Drop for CloseOnDrop<R> {
    fn drop(&mut self) {
        if let Some(reader) = self.0.take() {
            let _ = reader.close();
        }
    }
}

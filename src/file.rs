use std::fs::{self, File, OpenOptions};
use std::io::{self, ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::errors::Result;
use crate::seek::{self, Whence};

const RANDOM_NAME_LENGTH: usize = 10;
const MAX_CREATE_ATTEMPTS: usize = 10_000;

/// Create a new, uniquely named file in `dir`.
///
/// The last `*` in `pattern` is replaced by a random alphanumeric string,
/// without a `*` the string is appended. An empty `dir` means the system
/// temporary directory.
pub fn create_temp(
    dir: impl AsRef<Path>,
    pattern: &str,
) -> io::Result<(File, PathBuf)> {
    if pattern.contains(std::path::is_separator) {
        return Err(io::Error::new(
            ErrorKind::InvalidInput,
            "pattern contains path separator",
        ));
    }
    let dir = match dir.as_ref() {
        d if d.as_os_str().is_empty() => std::env::temp_dir(),
        d => d.to_path_buf(),
    };
    let (prefix, suffix) = match pattern.rfind('*') {
        Some(pos) => (&pattern[..pos], &pattern[pos + 1..]),
        None => (pattern, ""),
    };

    for _ in 0..MAX_CREATE_ATTEMPTS {
        let random: String = std::iter::repeat_with(fastrand::alphanumeric)
            .take(RANDOM_NAME_LENGTH)
            .collect();
        let path = dir.join(format!("{}{}{}", prefix, random, suffix));
        match OpenOptions::new()
            .read(true)
            .append(true)
            .create_new(true)
            .open(&path)
        {
            Ok(file) => return Ok((file, path)),
            Err(err) if err.kind() == ErrorKind::AlreadyExists => continue,
            Err(err) => return Err(err),
        }
    }
    Err(io::Error::new(
        ErrorKind::AlreadyExists,
        "could not find a free temporary file name",
    ))
}

/// Temporary file with a tracked logical size and its own read cursor.
///
/// Writes append at the end of the file, reads are positioned at the
/// cursor, so appending never moves a reader. The file is removed on
/// [`FileItem::close`] or when the item is dropped.
#[derive(Debug)]
pub struct FileItem {
    file: File,
    path: PathBuf,
    cursor: u64,
    size: u64,
}

impl FileItem {
    pub fn create(dir: impl AsRef<Path>, pattern: &str) -> Result<Self> {
        let (file, path) = create_temp(dir, pattern)?;
        Ok(Self {
            file,
            path,
            cursor: 0,
            size: 0,
        })
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn position(&self) -> u64 {
        self.cursor
    }

    pub fn sync(&self) -> Result<()> {
        Ok(self.file.sync_all()?)
    }

    pub fn seek_whence(&mut self, offset: i64, whence: Whence) -> Result<u64> {
        self.cursor = seek::resolve(self.cursor, self.size, offset, whence)?;
        Ok(self.cursor)
    }

    /// Remove the backing file and release the handle.
    ///
    /// A failed removal is ignored, the file may already be gone.
    pub fn close(self) -> Result<()> {
        // Drop does the work
        Ok(())
    }

    #[cfg(unix)]
    fn read_at(&self, buf: &mut [u8], offset: u64) -> io::Result<usize> {
        use std::os::unix::fs::FileExt;
        self.file.read_at(buf, offset)
    }

    #[cfg(windows)]
    fn read_at(&self, buf: &mut [u8], offset: u64) -> io::Result<usize> {
        use std::os::windows::fs::FileExt;
        self.file.seek_read(buf, offset)
    }
}

impl Write for FileItem {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.file.write(buf)?;
        self.size += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

impl Read for FileItem {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.cursor >= self.size {
            return Ok(0);
        }
        let n = self.read_at(buf, self.cursor)?;
        self.cursor += n as u64;
        Ok(n)
    }
}

impl Seek for FileItem {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let (offset, whence) = seek::split(pos)?;
        Ok(self.seek_whence(offset, whence)?)
    }
}

impl Drop for FileItem {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

//! Write-once, read-many temporary storage.
//!
//! A [`Temporary`] keeps incoming bytes in memory until a configured
//! size would be exceeded, then moves them into a uniquely named file and
//! continues there. The read cursor survives the move, and the file is
//! removed again when the holder is closed or dropped.
//!
//! ```no_run
//! use std::io::Read;
//! use fs_temporary::{Temporary, TemporaryOptions};
//!
//! # fn main() -> fs_temporary::Result<()> {
//! let source = std::fs::File::open("upload.bin")?;
//! let options = TemporaryOptions::new(1024 * 1024, "/var/tmp", "upload-*");
//!
//! let mut temporary = Temporary::spawn_owned(source, options).wait()?;
//! let mut content = Vec::new();
//! temporary.read_to_end(&mut content)?;
//! temporary.close()?;
//! # Ok(())
//! # }
//! ```

mod buffer;
mod errors;
mod file;
mod item;
mod options;
mod seek;
mod spill;
mod temporary;

pub use buffer::{BufferWrite, MemoryBuffer, MAX_ALLOCATION, SMALL_BUFFER_SIZE};
pub use errors::{Result, TemporaryError};
pub use file::{create_temp, FileItem};
pub use item::TemporaryKind;
pub use options::{TemporaryOptions, DEFAULT_MAX_BUFFER_SIZE, DEFAULT_PATTERN};
pub use seek::Whence;
pub use spill::Spillover;
pub use temporary::{PendingTemporary, ReadClose, Temporary};

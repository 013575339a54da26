use std::io::{self, Read, Seek, SeekFrom, Write};
use std::mem;
use std::path::Path;

use crate::buffer::{BufferWrite, MemoryBuffer};
use crate::errors::Result;
use crate::file::FileItem;
use crate::item::{Item, TemporaryKind};
use crate::options::TemporaryOptions;
use crate::seek::Whence;

/// Holds bytes in memory until `max_buffer_size` would be exceeded, then
/// moves them into a temporary file and keeps going there.
///
/// The switch happens at most once. The read cursor is carried over, so
/// a reader cannot tell whether a conversion took place.
#[derive(Debug)]
pub struct Spillover {
    item: Item,
    options: TemporaryOptions,
}

impl Spillover {
    pub fn new(options: TemporaryOptions) -> Self {
        let buffer = MemoryBuffer::with_limit(options.allocation_limit);
        Self {
            item: Item::Buffer(buffer),
            options,
        }
    }

    pub fn options(&self) -> &TemporaryOptions {
        &self.options
    }

    pub fn size(&self) -> u64 {
        self.item.size()
    }

    pub fn kind(&self) -> TemporaryKind {
        self.item.kind()
    }

    pub fn is_converted(&self) -> bool {
        self.kind() == TemporaryKind::File
    }

    /// Path of the spill file, `None` while the data is in memory.
    pub fn name(&self) -> Option<&Path> {
        self.item.name()
    }

    /// Content held in memory. Empty once the data lives in a file.
    pub fn as_bytes(&self) -> &[u8] {
        self.item.as_bytes()
    }

    pub fn position(&self) -> u64 {
        self.item.position()
    }

    pub fn sync(&self) -> Result<()> {
        self.item.sync()
    }

    pub fn seek_whence(&mut self, offset: i64, whence: Whence) -> Result<u64> {
        self.item.seek_whence(offset, whence)
    }

    pub fn close(self) -> Result<()> {
        self.item.close()
    }

    /// Append `p`, converting to a file first when the threshold would be
    /// crossed or when the buffer cannot grow any further.
    pub fn write_bytes(&mut self, p: &[u8]) -> Result<usize> {
        if !self.is_converted()
            && self.size().saturating_add(p.len() as u64)
                > self.options.max_buffer_size
        {
            self.convert()?;
        }

        let outcome = match &mut self.item {
            Item::Buffer(buffer) => buffer.append(p),
            Item::File(file) => return Ok(file.write(p)?),
        };
        match outcome {
            BufferWrite::Written(n) => Ok(n),
            BufferWrite::NeedsSpill { accepted } => {
                self.spill_rest(p, accepted)
            }
        }
    }

    // The buffer already holds `p[..accepted]`; those bytes move over with
    // the conversion, so only the remainder goes to the file.
    fn spill_rest(&mut self, p: &[u8], accepted: usize) -> Result<usize> {
        let rest = &p[accepted..];
        match self.convert().and_then(|()| self.write_bytes(rest)) {
            Ok(n) => Ok(accepted + n),
            // Report the short write, the next call will hit the error again
            Err(_) if accepted > 0 => Ok(accepted),
            Err(err) => Err(err),
        }
    }

    /// Move the buffered content into a new temporary file.
    ///
    /// Does nothing once converted. The file item is fully written and
    /// positioned before it replaces the buffer; on failure the buffer is
    /// left as it was.
    pub fn convert(&mut self) -> Result<()> {
        let buffer = match &mut self.item {
            Item::Buffer(buffer) => buffer,
            Item::File(_) => return Ok(()),
        };

        let position = buffer.position();
        let mut file =
            FileItem::create(&self.options.dir, &self.options.pattern)?;
        let mut content = buffer.as_bytes();
        io::copy(&mut content, &mut file)?;
        file.seek(SeekFrom::Start(position))?;

        log::debug!(
            "{}: spilled {} bytes to {}",
            self.options.label,
            file.size(),
            file.path().display()
        );

        let buffer = mem::replace(&mut self.item, Item::File(file));
        buffer.close()
    }
}

impl Write for Spillover {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(self.write_bytes(buf)?)
    }

    fn flush(&mut self) -> io::Result<()> {
        match &mut self.item {
            Item::Buffer(_) => Ok(()),
            Item::File(file) => file.flush(),
        }
    }
}

impl Read for Spillover {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.item.read(buf)
    }
}

impl Seek for Spillover {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.item.seek(pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::TemporaryError;
    use rstest::rstest;
    use tempdir::TempDir;

    fn spillover(dir: &TempDir, max_buffer_size: u64) -> Spillover {
        Spillover::new(TemporaryOptions::new(
            max_buffer_size,
            dir.path(),
            "spill-*",
        ))
    }

    fn pattern(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i % 251) as u8).collect()
    }

    #[test_log::test]
    fn stays_in_memory_up_to_threshold() {
        let dir = TempDir::new("spill").unwrap();
        let mut spill = spillover(&dir, 16);
        spill.write_all(&[1u8; 16]).unwrap();

        assert_eq!(spill.kind(), TemporaryKind::Buffer);
        assert_eq!(spill.as_bytes(), &[1u8; 16]);
        assert!(spill.name().is_none());
    }

    #[test_log::test]
    fn crossing_threshold_preserves_bytes_and_cursor() {
        let dir = TempDir::new("spill").unwrap();
        let data = pattern(100);
        let mut spill = spillover(&dir, 64);
        spill.write_all(&data[..40]).unwrap();

        let mut head = [0u8; 10];
        spill.read_exact(&mut head).unwrap();
        assert_eq!(&head[..], &data[..10]);

        spill.write_all(&data[40..]).unwrap();
        assert_eq!(spill.kind(), TemporaryKind::File);
        assert_eq!(spill.position(), 10);
        assert_eq!(spill.size(), 100);
        assert!(spill.as_bytes().is_empty());
        assert!(spill
            .name()
            .map_or(false, |name| name.starts_with(dir.path())));

        let mut rest = Vec::new();
        spill.read_to_end(&mut rest).unwrap();
        assert_eq!(rest, &data[10..]);
    }

    #[test_log::test]
    fn convert_twice_is_a_no_op() {
        let dir = TempDir::new("spill").unwrap();
        let mut spill = spillover(&dir, 1024);
        spill.write_all(b"some content").unwrap();

        spill.convert().unwrap();
        let name = spill.name().map(Path::to_path_buf);
        spill.convert().unwrap();

        assert_eq!(spill.name().map(Path::to_path_buf), name);
        assert_eq!(spill.size(), 12);
        let mut out = String::new();
        spill.read_to_string(&mut out).unwrap();
        assert_eq!(out, "some content");
    }

    #[test_log::test]
    fn writes_after_conversion_append_to_file() {
        let dir = TempDir::new("spill").unwrap();
        let mut spill = spillover(&dir, 4);
        spill.write_all(b"abcdef").unwrap();
        spill.write_all(b"ghi").unwrap();

        assert_eq!(spill.size(), 9);
        let mut out = String::new();
        spill.read_to_string(&mut out).unwrap();
        assert_eq!(out, "abcdefghi");
    }

    #[test_log::test]
    fn allocation_ceiling_spills_remainder() {
        let dir = TempDir::new("spill").unwrap();
        let mut spill = Spillover::new(
            TemporaryOptions::new(1 << 20, dir.path(), "spill-*")
                .with_allocation_limit(100),
        );
        let data = pattern(80);

        assert_eq!(spill.write_bytes(&data[..50]).unwrap(), 50);
        assert_eq!(spill.kind(), TemporaryKind::Buffer);

        let mut head = [0u8; 7];
        spill.read_exact(&mut head).unwrap();
        assert_eq!(&head[..], &data[..7]);

        // 14 bytes fit in the current capacity, 16 go to the file
        assert_eq!(spill.write_bytes(&data[50..]).unwrap(), 30);
        assert_eq!(spill.kind(), TemporaryKind::File);
        assert_eq!(spill.size(), 80);
        assert_eq!(spill.position(), 7);

        let mut out = Vec::new();
        spill.read_to_end(&mut out).unwrap();
        assert_eq!(out, &data[7..]);
    }

    #[rstest]
    #[case(64, TemporaryKind::Buffer)]
    #[case(65, TemporaryKind::File)]
    #[case(1000, TemporaryKind::File)]
    fn allocation_ceiling_boundary(
        #[case] len: usize,
        #[case] expected: TemporaryKind,
    ) {
        let dir = TempDir::new("spill").unwrap();
        let mut spill = Spillover::new(
            TemporaryOptions::new(1 << 20, dir.path(), "spill-*")
                .with_allocation_limit(64),
        );
        let data = pattern(len);
        for chunk in data.chunks(7) {
            assert_eq!(spill.write_bytes(chunk).unwrap(), chunk.len());
        }

        assert_eq!(spill.kind(), expected);
        assert_eq!(spill.size(), len as u64);
        let mut out = Vec::new();
        spill.read_to_end(&mut out).unwrap();
        assert_eq!(out, data);
    }

    #[test]
    fn single_write_over_ceiling_on_empty_buffer() {
        let dir = TempDir::new("spill").unwrap();
        let mut spill = Spillover::new(
            TemporaryOptions::new(1 << 20, dir.path(), "spill-*")
                .with_allocation_limit(32),
        );
        let data = pattern(500);
        assert_eq!(spill.write_bytes(&data).unwrap(), 500);
        assert_eq!(spill.kind(), TemporaryKind::File);

        let mut out = Vec::new();
        spill.read_to_end(&mut out).unwrap();
        assert_eq!(out, data);
    }

    #[test]
    fn failed_conversion_keeps_buffer() {
        let dir = TempDir::new("spill").unwrap();
        let mut spill = Spillover::new(TemporaryOptions::new(
            8,
            dir.path().join("missing"),
            "spill-*",
        ));
        spill.write_all(b"12345678").unwrap();
        spill.seek(SeekFrom::Start(3)).unwrap();

        let result = spill.write_bytes(b"9");
        assert!(matches!(result, Err(TemporaryError::Io(_))));
        assert_eq!(spill.kind(), TemporaryKind::Buffer);
        assert_eq!(spill.position(), 3);
        assert_eq!(spill.as_bytes(), b"12345678");
    }

    #[test]
    fn failed_spill_after_partial_accept_reports_short_write() {
        let dir = TempDir::new("spill").unwrap();
        let missing = dir.path().join("missing");
        let mut spill = Spillover::new(
            TemporaryOptions::new(1 << 20, missing, "spill-*")
                .with_allocation_limit(100),
        );
        let data = pattern(80);
        spill.write_bytes(&data[..50]).unwrap();

        assert_eq!(spill.write_bytes(&data[50..]).unwrap(), 14);
        assert_eq!(spill.size(), 64);

        // Nothing fits any more, so the error comes through
        assert!(matches!(
            spill.write_bytes(&data[64..]),
            Err(TemporaryError::Io(_))
        ));
        assert_eq!(spill.kind(), TemporaryKind::Buffer);
        assert_eq!(spill.as_bytes(), &data[..64]);
    }

    #[rstest]
    #[case(false)]
    #[case(true)]
    fn seek_errors_match_across_kinds(#[case] converted: bool) {
        let dir = TempDir::new("spill").unwrap();
        let mut spill = spillover(&dir, 1024);
        spill.write_all(b"0123456789").unwrap();
        if converted {
            spill.convert().unwrap();
        }

        assert!(matches!(
            spill.seek_whence(-1, Whence::Start),
            Err(TemporaryError::NegativePosition(-1))
        ));
        assert!(matches!(
            spill.seek_whence(-11, Whence::End),
            Err(TemporaryError::NegativePosition(-1))
        ));

        assert_eq!(spill.seek_whence(0, Whence::End).unwrap(), 10);
        assert_eq!(spill.read(&mut [0u8; 8]).unwrap(), 0);

        assert_eq!(spill.seek_whence(25, Whence::Start).unwrap(), 25);
        assert_eq!(spill.read(&mut [0u8; 8]).unwrap(), 0);
    }

    #[test]
    fn close_removes_spill_file() {
        let dir = TempDir::new("spill").unwrap();
        let mut spill = spillover(&dir, 2);
        spill.write_all(b"abc").unwrap();
        spill.sync().unwrap();

        let path = spill.name().unwrap().to_path_buf();
        assert!(path.exists());
        spill.close().unwrap();
        assert!(!path.exists());
    }
}

use std::path::PathBuf;

use crate::buffer::MAX_ALLOCATION;

const KILOBYTE: u64 = 1024;
const MEGABYTE: u64 = 1024 * KILOBYTE;

pub const DEFAULT_MAX_BUFFER_SIZE: u64 = 32 * MEGABYTE;
pub const DEFAULT_PATTERN: &str = "temporary-*";

/// Settings fixed when a temporary is constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemporaryOptions {
    /// Label for logging
    pub label: String,
    /// Bytes kept in memory before spilling to a file
    pub max_buffer_size: u64,
    /// Directory for the spill file, empty means the system temp dir
    pub dir: PathBuf,
    /// File name pattern, the last `*` is replaced by a random string
    pub pattern: String,
    /// Largest capacity the memory buffer may allocate
    pub allocation_limit: usize,
}

impl Default for TemporaryOptions {
    fn default() -> Self {
        Self {
            label: "temporary".to_owned(),
            max_buffer_size: DEFAULT_MAX_BUFFER_SIZE,
            dir: PathBuf::new(),
            pattern: DEFAULT_PATTERN.to_owned(),
            allocation_limit: MAX_ALLOCATION,
        }
    }
}

impl TemporaryOptions {
    pub fn new(
        max_buffer_size: u64,
        dir: impl Into<PathBuf>,
        pattern: impl Into<String>,
    ) -> Self {
        Self {
            max_buffer_size,
            dir: dir.into(),
            pattern: pattern.into(),
            ..Self::default()
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_max_buffer_size(mut self, max_buffer_size: u64) -> Self {
        self.max_buffer_size = max_buffer_size;
        self
    }

    pub fn with_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dir = dir.into();
        self
    }

    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = pattern.into();
        self
    }

    pub fn with_allocation_limit(mut self, allocation_limit: usize) -> Self {
        self.allocation_limit = allocation_limit;
        self
    }
}

//! Reader configuration.

/// Default upper bound on `batch_size` (128 MiB).
pub const DEFAULT_MAX_BATCH_SIZE: usize = 128 * 1024 * 1024;

/// Path component excluded from partition discovery by default.
pub const CLOUD_STORAGE_CACHE_DIR: &str = "cloud_storage_cache";

/// Configuration shared by the segment, snapshot and directory readers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReaderConfig {
    /// Largest `batch_size` accepted before a header is treated as corrupt
    /// (default: 128MB).
    pub max_batch_size: usize,

    /// Fail a batch whose records do not consume exactly the record region.
    ///
    /// When unset the mismatch is only logged.
    pub strict_record_accounting: bool,

    /// Directory names skipped while discovering partitions.
    pub excluded_dirs: Vec<String>,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        ReaderConfig {
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
            strict_record_accounting: false,
            excluded_dirs: vec![CLOUD_STORAGE_CACHE_DIR.to_string()],
        }
    }
}

impl ReaderConfig {
    /// Create a reader configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum accepted batch size (builder pattern).
    pub fn with_max_batch_size(mut self, size: usize) -> Self {
        self.max_batch_size = size;
        self
    }

    /// Enable or disable strict record accounting (builder pattern).
    pub fn with_strict_record_accounting(mut self, strict: bool) -> Self {
        self.strict_record_accounting = strict;
        self
    }

    /// Add a directory name to skip during discovery (builder pattern).
    pub fn with_excluded_dir(mut self, name: impl Into<String>) -> Self {
        self.excluded_dirs.push(name.into());
        self
    }

    /// Whether a path component is excluded from discovery.
    pub fn is_excluded(&self, name: &str) -> bool {
        self.excluded_dirs.iter().any(|d| d == name)
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), ReaderConfigError> {
        if self.max_batch_size < crate::format::HEADER_SIZE {
            return Err(ReaderConfigError::MaxBatchSizeTooSmall(self.max_batch_size));
        }
        if self.max_batch_size > i32::MAX as usize {
            return Err(ReaderConfigError::MaxBatchSizeTooLarge(self.max_batch_size));
        }
        Ok(())
    }

    /// Create a configuration for tests (strict accounting, small batches).
    pub fn for_testing() -> Self {
        ReaderConfig {
            max_batch_size: 1024 * 1024,
            strict_record_accounting: true,
            ..Self::default()
        }
    }
}

/// Reader configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReaderConfigError {
    /// Limit is below the size of a batch header.
    #[error("Max batch size {0} is smaller than a batch header")]
    MaxBatchSizeTooSmall(usize),

    /// Limit cannot be represented by the on-disk `batch_size` field.
    #[error("Max batch size {0} exceeds the i32 batch_size field")]
    MaxBatchSizeTooLarge(usize),
}

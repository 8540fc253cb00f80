//! Kvstore reconstruction configuration.

use rplog_durability::{ReaderConfig, ReaderConfigError};

/// Batch type tag of kvstore batches.
pub const KVSTORE_BATCH_TYPE: i8 = 4;

/// Configuration for [`KvStore`](crate::KvStore)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KvStoreConfig {
    /// Batch type whose records are applied; other batches are skipped
    pub batch_type: i8,
    /// Segment and snapshot reader settings
    pub reader: ReaderConfig,
    /// Skip segment records at or below the snapshot's last offset
    pub skip_snapshot_covered: bool,
}

impl Default for KvStoreConfig {
    fn default() -> Self {
        KvStoreConfig {
            batch_type: KVSTORE_BATCH_TYPE,
            reader: ReaderConfig::default(),
            skip_snapshot_covered: false,
        }
    }
}

impl KvStoreConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the applied batch type (builder pattern).
    pub fn with_batch_type(mut self, batch_type: i8) -> Self {
        self.batch_type = batch_type;
        self
    }

    /// Set reader settings (builder pattern).
    pub fn with_reader(mut self, reader: ReaderConfig) -> Self {
        self.reader = reader;
        self
    }

    /// Skip records the snapshot already covers (builder pattern).
    pub fn with_skip_snapshot_covered(mut self, skip: bool) -> Self {
        self.skip_snapshot_covered = skip;
        self
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), ReaderConfigError> {
        self.reader.validate()
    }

    /// Create a configuration for tests.
    pub fn for_testing() -> Self {
        KvStoreConfig {
            batch_type: KVSTORE_BATCH_TYPE,
            reader: ReaderConfig::for_testing(),
            skip_snapshot_covered: false,
        }
    }
}

//! Kvstore reconstruction errors.

use rplog_core::DecodeError;
use rplog_durability::{BatchError, LayoutError, ReaderConfigError, SnapshotError};

/// Errors building a kvstore from a partition directory
#[derive(Debug, thiserror::Error)]
pub enum KvStoreError {
    /// Partition directory could not be read
    #[error("Layout error: {0}")]
    Layout(#[from] LayoutError),

    /// Snapshot file could not be read
    #[error("Snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),

    /// Snapshot metadata or embedded batch is malformed
    #[error("Malformed kvstore snapshot: {0}")]
    SnapshotFormat(#[source] DecodeError),

    /// Segment batch is corrupt or unreadable
    #[error("Segment {segment}: {source}")]
    Segment {
        /// Segment path
        segment: String,
        /// Underlying batch error
        #[source]
        source: BatchError,
    },

    /// A kvstore record could not be decoded
    #[error("Malformed kvstore record at offset {offset}: {source}")]
    Entry {
        /// Offset of the record
        offset: i64,
        /// Underlying decode error
        #[source]
        source: DecodeError,
    },

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(#[from] ReaderConfigError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

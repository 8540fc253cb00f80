//! Log storage formats for rplog
//!
//! This crate reads everything a partition keeps on disk:
//!
//! - Batch header, record and batch codecs with both CRC32C checks
//! - Segment files: lazy, restartable batch iteration that stops cleanly at
//!   a torn or zero-filled tail
//! - Snapshot files: header, metadata and data blobs
//! - Partition discovery under a data directory
//! - Fixture builders for tests

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod format;
pub mod layout;
pub mod segment;
pub mod testing;

pub use config::{ReaderConfig, ReaderConfigError, CLOUD_STORAGE_CACHE_DIR, DEFAULT_MAX_BATCH_SIZE};
pub use format::{
    Batch, BatchBuilder, BatchError, BatchHeader, Record, RecordHeader, RecordIter, Snapshot,
    SnapshotError, SnapshotHeader, HEADER_SIZE, SNAPSHOT_FILE_NAME, SNAPSHOT_HEADER_SIZE,
};
pub use layout::{LayoutError, LogDir, PartitionDir};
pub use segment::{BatchIter, Segment, SegmentName};

//! On-disk byte formats for batches, records and snapshots.
//!
//! # Module Structure
//!
//! - `header`: fixed 61-byte batch header and its two checksums
//! - `record`: varint-framed records inside a batch
//! - `batch`: batch decode/validate and the test-side builder
//! - `snapshot`: snapshot file header, metadata and data blobs

pub mod batch;
pub mod header;
pub mod record;
pub mod snapshot;

pub use batch::{decode_unchecked, Batch, BatchBuilder, BatchError};
pub use header::{
    BatchHeader, ATTR_COMPRESSION_MASK, ATTR_CONTROL, ATTR_TIMESTAMP_TYPE, ATTR_TRANSACTIONAL,
    CRC_HEADER_REGION_SIZE, HEADER_SIZE,
};
pub use record::{Record, RecordHeader, RecordIter};
pub use snapshot::{
    Snapshot, SnapshotError, SnapshotHeader, SNAPSHOT_FILE_NAME, SNAPSHOT_HEADER_SIZE,
};

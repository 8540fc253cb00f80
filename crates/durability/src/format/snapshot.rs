//! Snapshot file format.
//!
//! # Layout
//!
//! ```text
//! ┌────────────────┬──────────────────┬─────────────┬───────────────────┐
//! │ header_crc (4) │ metadata_crc (4) │ version (1) │ metadata_size (4) │
//! └────────────────┴──────────────────┴─────────────┴───────────────────┘
//! ┌─────────────────────────────┬───────────────────────────────┐
//! │ metadata (metadata_size)    │ data (rest of file)           │
//! └─────────────────────────────┴───────────────────────────────┘
//! ```
//!
//! Loading does not verify either checksum. [`Snapshot::verify`] checks
//! them on request.

use std::fs;
use std::path::Path;

use byteorder::{ByteOrder, LittleEndian};
use rplog_core::{ByteReader, DecodeError};
use serde::Serialize;

/// Size of the snapshot header in bytes.
pub const SNAPSHOT_HEADER_SIZE: usize = 13;

/// File name of a partition snapshot.
pub const SNAPSHOT_FILE_NAME: &str = "snapshot";

/// Snapshot file header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SnapshotHeader {
    /// CRC32C of the remaining header fields
    pub header_crc: u32,
    /// CRC32C of the metadata blob
    pub metadata_crc: u32,
    /// Format version
    pub version: i8,
    /// Size of the metadata blob
    pub metadata_size: i32,
}

impl SnapshotHeader {
    /// Decode a header from exactly [`SNAPSHOT_HEADER_SIZE`] bytes.
    pub fn from_bytes(bytes: &[u8; SNAPSHOT_HEADER_SIZE]) -> Self {
        SnapshotHeader {
            header_crc: LittleEndian::read_u32(&bytes[0..4]),
            metadata_crc: LittleEndian::read_u32(&bytes[4..8]),
            version: bytes[8] as i8,
            metadata_size: LittleEndian::read_i32(&bytes[9..13]),
        }
    }

    /// Serialize to bytes.
    pub fn to_bytes(&self) -> [u8; SNAPSHOT_HEADER_SIZE] {
        let mut bytes = [0u8; SNAPSHOT_HEADER_SIZE];
        LittleEndian::write_u32(&mut bytes[0..4], self.header_crc);
        LittleEndian::write_u32(&mut bytes[4..8], self.metadata_crc);
        bytes[8] = self.version as u8;
        LittleEndian::write_i32(&mut bytes[9..13], self.metadata_size);
        bytes
    }

    /// CRC32C over everything after `header_crc`.
    pub fn compute_header_crc(&self) -> u32 {
        rplog_core::crc32c(&self.to_bytes()[4..])
    }
}

/// A decoded snapshot file: header, metadata blob and data blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    /// File header
    pub header: SnapshotHeader,
    /// Metadata blob (`metadata_size` bytes)
    pub metadata: Vec<u8>,
    /// Everything after the metadata
    pub data: Vec<u8>,
}

impl Snapshot {
    /// Build a snapshot with consistent size and checksum fields.
    pub fn new(version: i8, metadata: Vec<u8>, data: Vec<u8>) -> Self {
        let mut header = SnapshotHeader {
            header_crc: 0,
            metadata_crc: rplog_core::crc32c(&metadata),
            version,
            metadata_size: metadata.len() as i32,
        };
        header.header_crc = header.compute_header_crc();
        Snapshot {
            header,
            metadata,
            data,
        }
    }

    /// Read and decode a snapshot file.
    pub fn read(path: &Path) -> Result<Snapshot, SnapshotError> {
        let bytes = fs::read(path)?;
        let snapshot = Self::from_bytes(&bytes)?;
        tracing::info!(
            path = %path.display(),
            version = snapshot.header.version,
            metadata_size = snapshot.metadata.len(),
            data_size = snapshot.data.len(),
            "Read snapshot"
        );
        Ok(snapshot)
    }

    /// Decode a snapshot from its file contents.
    pub fn from_bytes(bytes: &[u8]) -> Result<Snapshot, SnapshotError> {
        if bytes.len() < SNAPSHOT_HEADER_SIZE {
            return Err(SnapshotError::FileTooSmall { size: bytes.len() });
        }
        let mut header_bytes = [0u8; SNAPSHOT_HEADER_SIZE];
        header_bytes.copy_from_slice(&bytes[..SNAPSHOT_HEADER_SIZE]);
        let header = SnapshotHeader::from_bytes(&header_bytes);

        let metadata_size = usize::try_from(header.metadata_size)
            .map_err(|_| SnapshotError::InvalidMetadataSize(header.metadata_size))?;

        let mut reader = ByteReader::new(&bytes[SNAPSHOT_HEADER_SIZE..]);
        let metadata = reader.read_bytes(metadata_size)?.to_vec();
        let data = reader.read_rest().to_vec();

        Ok(Snapshot {
            header,
            metadata,
            data,
        })
    }

    /// Serialize to file contents.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes =
            Vec::with_capacity(SNAPSHOT_HEADER_SIZE + self.metadata.len() + self.data.len());
        bytes.extend_from_slice(&self.header.to_bytes());
        bytes.extend_from_slice(&self.metadata);
        bytes.extend_from_slice(&self.data);
        bytes
    }

    /// Check the header and metadata checksums.
    pub fn verify(&self) -> Result<(), SnapshotError> {
        let computed = self.header.compute_header_crc();
        if computed != self.header.header_crc {
            return Err(SnapshotError::HeaderCrcMismatch {
                stored: self.header.header_crc,
                computed,
            });
        }
        let computed = rplog_core::crc32c(&self.metadata);
        if computed != self.header.metadata_crc {
            return Err(SnapshotError::MetadataCrcMismatch {
                stored: self.header.metadata_crc,
                computed,
            });
        }
        Ok(())
    }
}

/// Snapshot read errors
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// File shorter than a header
    #[error("Snapshot too small: {size} bytes")]
    FileTooSmall {
        /// File size
        size: usize,
    },

    /// Negative metadata size
    #[error("Invalid snapshot metadata size {0}")]
    InvalidMetadataSize(i32),

    /// Metadata or data shorter than declared
    #[error("Malformed snapshot: {0}")]
    Decode(#[from] DecodeError),

    /// Header checksum mismatch
    #[error("Snapshot header crc mismatch: stored={stored:#010x}, computed={computed:#010x}")]
    HeaderCrcMismatch {
        /// Stored checksum
        stored: u32,
        /// Computed checksum
        computed: u32,
    },

    /// Metadata checksum mismatch
    #[error("Snapshot metadata crc mismatch: stored={stored:#010x}, computed={computed:#010x}")]
    MetadataCrcMismatch {
        /// Stored checksum
        stored: u32,
        /// Computed checksum
        computed: u32,
    },
}

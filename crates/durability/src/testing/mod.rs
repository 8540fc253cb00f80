//! Fixture builders for tests
//!
//! Writes synthetic partition directories, segment files and snapshots with
//! valid checksums.
//!
//! # Example
//!
//! ```ignore
//! use rplog_durability::testing::{write_segment, PartitionFixture};
//!
//! let partition = PartitionFixture::create(base, &ntp, 0)?;
//! partition.write_segment("0-1-v1.log", &[batch])?;
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use rplog_core::Ntp;

use crate::format::{Batch, Snapshot, SNAPSHOT_FILE_NAME};

/// Write `batches` back to back into `path`.
pub fn write_segment(path: &Path, batches: &[Batch]) -> io::Result<()> {
    fs::write(path, segment_bytes(batches))
}

/// Concatenated on-disk bytes of `batches`.
pub fn segment_bytes(batches: &[Batch]) -> Vec<u8> {
    batches.iter().flat_map(|b| b.to_bytes()).collect()
}

/// A partition directory created under a base directory.
#[derive(Debug, Clone)]
pub struct PartitionFixture {
    path: PathBuf,
}

impl PartitionFixture {
    /// Create `<base>/<namespace>/<topic>/<partition>_<revision>`.
    pub fn create(base: &Path, ntp: &Ntp, revision: i64) -> io::Result<Self> {
        let path = base
            .join(&ntp.namespace)
            .join(&ntp.topic)
            .join(format!("{}_{}", ntp.partition, revision));
        fs::create_dir_all(&path)?;
        Ok(PartitionFixture { path })
    }

    /// Directory path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write a segment file named `name`.
    pub fn write_segment(&self, name: &str, batches: &[Batch]) -> io::Result<PathBuf> {
        let path = self.path.join(name);
        write_segment(&path, batches)?;
        Ok(path)
    }

    /// Write the partition snapshot.
    pub fn write_snapshot(&self, snapshot: &Snapshot) -> io::Result<PathBuf> {
        let path = self.path.join(SNAPSHOT_FILE_NAME);
        fs::write(&path, snapshot.to_bytes())?;
        Ok(path)
    }
}

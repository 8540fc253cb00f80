//! Segment files and lazy batch iteration.
//!
//! A segment is named `<base_offset>-<term>-v<version>.log` and holds
//! batches back to back. Each call to [`Segment::batches`] opens a fresh
//! file handle and starts at byte 0; the handle is closed when the iterator
//! is dropped.

use std::fmt;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Serialize;

use crate::config::ReaderConfig;
use crate::format::{Batch, BatchError};

/// Extension of segment files.
pub const SEGMENT_EXTENSION: &str = "log";

/// Parsed segment file name
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct SegmentName {
    /// Offset of the first batch in the segment
    pub base_offset: u64,
    /// Raft term the segment was opened in
    pub term: u64,
    /// Segment format version
    pub version: u32,
}

impl SegmentName {
    /// Parse a file name such as `0-1-v1.log`.
    pub fn parse(name: &str) -> Option<SegmentName> {
        let stem = name.strip_suffix(".log")?;
        let mut parts = stem.splitn(3, '-');
        let base_offset = parse_digits(parts.next()?)?;
        let term = parse_digits(parts.next()?)?;
        let version = parse_digits(parts.next()?.strip_prefix('v')?)?;
        Some(SegmentName {
            base_offset,
            term,
            version,
        })
    }
}

fn parse_digits<T: FromStr>(s: &str) -> Option<T> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

impl fmt::Display for SegmentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}-v{}.{}",
            self.base_offset, self.term, self.version, SEGMENT_EXTENSION
        )
    }
}

/// A segment file on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    path: PathBuf,
    name: Option<SegmentName>,
}

impl Segment {
    /// Wrap a segment path. The file is not opened until iteration.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(SegmentName::parse);
        Segment { path, name }
    }

    /// Path of the segment file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Parsed file name, if it follows the segment naming scheme.
    pub fn name(&self) -> Option<SegmentName> {
        self.name
    }

    /// Open the file and iterate its batches from the start.
    pub fn batches(&self, config: &ReaderConfig) -> io::Result<BatchIter<BufReader<File>>> {
        let file = File::open(&self.path)?;
        tracing::debug!(path = %self.path.display(), "Opened segment");
        Ok(BatchIter::new(BufReader::new(file), config.clone()))
    }

    /// Read every batch, failing on the first corrupt one.
    pub fn read_all(&self, config: &ReaderConfig) -> Result<Vec<Batch>, BatchError> {
        self.batches(config)?.collect()
    }
}

/// Lazy iterator over the batches of a stream.
///
/// Ends at end of data; after an error it yields nothing more.
pub struct BatchIter<R> {
    reader: R,
    config: ReaderConfig,
    index: usize,
    position: u64,
    done: bool,
}

impl<R: Read> BatchIter<R> {
    /// Iterate batches from `reader`, which must be positioned at a batch boundary.
    pub fn new(reader: R, config: ReaderConfig) -> Self {
        BatchIter {
            reader,
            config,
            index: 0,
            position: 0,
            done: false,
        }
    }

    /// Number of batches yielded so far.
    pub fn batches_read(&self) -> usize {
        self.index
    }

    /// Byte position just past the last yielded batch.
    pub fn position(&self) -> u64 {
        self.position
    }
}

impl<R: Read> Iterator for BatchIter<R> {
    type Item = Result<Batch, BatchError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match Batch::decode_one(&mut self.reader, self.index, self.position, &self.config) {
            Ok(Some(batch)) => {
                self.index += 1;
                self.position += batch.header().batch_size as u64;
                Some(Ok(batch))
            }
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

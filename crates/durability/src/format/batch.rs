//! Record batch decode and encode.
//!
//! A batch is a [`BatchHeader`] followed by `batch_size - HEADER_SIZE` bytes
//! of concatenated records. Decoding a batch validates both checksums; the
//! records themselves are parsed lazily.
//!
//! # End of data
//!
//! [`Batch::decode_one`] returns `Ok(None)` instead of an error when the
//! stream ends cleanly, ends inside a header or a body (torn write at the
//! tail of an active segment) or reaches an all-zero header (preallocated
//! tail region). A short body wins over a bad header checksum or an
//! oversized `batch_size`. A fully present batch with a checksum mismatch
//! is always an error.

use std::io::{self, Read};

use rplog_core::{ByteReader, ByteWriter, DecodeError};

use super::header::{BatchHeader, HEADER_SIZE};
use super::record::{Record, RecordIter};
use crate::config::ReaderConfig;

/// A validated record batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    header: BatchHeader,
    records: Vec<u8>,
    index: usize,
    file_position: u64,
}

impl Batch {
    /// Build a batch from a header and its raw record bytes without any
    /// checksum validation.
    pub fn from_parts(header: BatchHeader, records: Vec<u8>) -> Self {
        Batch {
            header,
            records,
            index: 0,
            file_position: 0,
        }
    }

    /// Decode the next batch from `stream`.
    ///
    /// `index` and `file_position` are recorded on the batch for diagnostics.
    /// Returns `Ok(None)` at end of data (see module docs).
    pub fn decode_one<R: Read>(
        stream: &mut R,
        index: usize,
        file_position: u64,
        config: &ReaderConfig,
    ) -> Result<Option<Batch>, BatchError> {
        let mut header_bytes = [0u8; HEADER_SIZE];
        let read = read_full(stream, &mut header_bytes)?;
        if read < HEADER_SIZE {
            if read > 0 {
                tracing::warn!(
                    position = file_position,
                    bytes = read,
                    "Segment ends inside a batch header"
                );
            }
            return Ok(None);
        }

        let header = BatchHeader::from_bytes(&header_bytes);
        if header.is_zeroed() {
            tracing::debug!(position = file_position, "Reached zero-filled tail");
            return Ok(None);
        }

        // Body before checksums: a torn tail ends the segment even behind a
        // damaged header. The read stops one byte past the size limit.
        let declared = header.records_size();
        let mut records = Vec::new();
        if let Some(size) = declared {
            let limit = size.min(config.max_batch_size.saturating_add(1));
            stream.by_ref().take(limit as u64).read_to_end(&mut records)?;
            if records.len() < limit {
                tracing::warn!(
                    base_offset = header.base_offset,
                    position = file_position,
                    expected = size,
                    available = records.len(),
                    "Segment ends inside a batch body"
                );
                return Ok(None);
            }
        }

        let computed = header.compute_header_crc();
        if computed != header.header_crc {
            records.clear();
            return Err(BatchError::HeaderCrcMismatch {
                base_offset: header.base_offset,
                stored: header.header_crc,
                computed,
                batch: Box::new(Batch {
                    header,
                    records,
                    index,
                    file_position,
                }),
            });
        }

        match declared {
            Some(size) if size <= config.max_batch_size => {}
            _ => {
                return Err(BatchError::InvalidBatchSize {
                    base_offset: header.base_offset,
                    batch_size: header.batch_size,
                })
            }
        }

        let batch = Batch {
            header,
            records,
            index,
            file_position,
        };

        let computed = header.compute_crc(&batch.records);
        if computed != header.crc {
            return Err(BatchError::BodyCrcMismatch {
                base_offset: header.base_offset,
                stored: header.crc,
                computed,
                batch: Box::new(batch),
            });
        }

        tracing::trace!(
            base_offset = header.base_offset,
            record_count = header.record_count,
            batch_type = header.batch_type,
            "Decoded batch"
        );

        Ok(Some(batch))
    }

    /// Batch header.
    pub fn header(&self) -> &BatchHeader {
        &self.header
    }

    /// Raw record bytes.
    pub fn records_bytes(&self) -> &[u8] {
        &self.records
    }

    /// Ordinal of this batch within its segment.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Byte position of the header within its segment file.
    pub fn file_position(&self) -> u64 {
        self.file_position
    }

    /// Offset of the first record.
    pub fn base_offset(&self) -> i64 {
        self.header.base_offset
    }

    /// Offset of the last record.
    pub fn last_offset(&self) -> i64 {
        self.header.last_offset()
    }

    /// Batch type tag.
    pub fn batch_type(&self) -> i8 {
        self.header.batch_type
    }

    /// Number of records declared by the header.
    pub fn record_count(&self) -> usize {
        self.header.record_count.max(0) as usize
    }

    /// Lazily decode the records.
    pub fn records(&self) -> RecordIter<'_> {
        RecordIter::new(&self.records, self.record_count())
    }

    /// Decode every record and reconcile the bytes consumed against the
    /// record region size.
    ///
    /// With `strict_record_accounting` a mismatch is an error; otherwise it
    /// is a debug assertion and a warning.
    pub fn decode_records(&self, config: &ReaderConfig) -> Result<Vec<Record>, BatchError> {
        let mut iter = self.records();
        let mut records = Vec::with_capacity(self.record_count().min(self.records.len()));
        for record in iter.by_ref() {
            records.push(record.map_err(|source| BatchError::Record {
                base_offset: self.base_offset(),
                source,
            })?);
        }

        let consumed = iter.consumed();
        if consumed != self.records.len() {
            if config.strict_record_accounting {
                return Err(BatchError::RecordAccounting {
                    base_offset: self.base_offset(),
                    expected: self.records.len(),
                    consumed,
                });
            }
            tracing::warn!(
                base_offset = self.base_offset(),
                expected = self.records.len(),
                consumed,
                "Record bytes do not reconcile with batch size"
            );
            debug_assert_eq!(consumed, self.records.len(), "record byte accounting");
        }

        Ok(records)
    }

    /// Serialize header and records to their on-disk form.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(HEADER_SIZE + self.records.len());
        bytes.extend_from_slice(&self.header.to_bytes());
        bytes.extend_from_slice(&self.records);
        bytes
    }

    /// Check both checksums without re-reading from disk.
    pub fn verify(&self) -> Result<(), BatchError> {
        let computed = self.header.compute_header_crc();
        if computed != self.header.header_crc {
            return Err(BatchError::HeaderCrcMismatch {
                base_offset: self.base_offset(),
                stored: self.header.header_crc,
                computed,
                batch: Box::new(self.clone()),
            });
        }
        let computed = self.header.compute_crc(&self.records);
        if computed != self.header.crc {
            return Err(BatchError::BodyCrcMismatch {
                base_offset: self.base_offset(),
                stored: self.header.crc,
                computed,
                batch: Box::new(self.clone()),
            });
        }
        Ok(())
    }
}

/// Builds a batch with consistent sizes, offsets and checksums.
#[derive(Debug, Clone)]
pub struct BatchBuilder {
    header: BatchHeader,
    records: Vec<Record>,
}

impl BatchBuilder {
    /// Start a batch of `batch_type` at `base_offset`.
    pub fn new(base_offset: i64, batch_type: i8) -> Self {
        BatchBuilder {
            header: BatchHeader {
                base_offset,
                batch_type,
                producer_id: -1,
                producer_epoch: -1,
                base_sequence: -1,
                ..BatchHeader::default()
            },
            records: Vec::new(),
        }
    }

    /// Set the first and max timestamps (milliseconds).
    pub fn timestamps(mut self, first: i64, max: i64) -> Self {
        self.header.first_timestamp = first;
        self.header.max_timestamp = max;
        self
    }

    /// Set the attribute bits.
    pub fn attrs(mut self, attrs: i16) -> Self {
        self.header.attrs = attrs;
        self
    }

    /// Set the producer identity.
    pub fn producer(mut self, producer_id: i64, producer_epoch: i16, base_sequence: i32) -> Self {
        self.header.producer_id = producer_id;
        self.header.producer_epoch = producer_epoch;
        self.header.base_sequence = base_sequence;
        self
    }

    /// Append a record whose offset delta is its position in the batch.
    pub fn key_value(mut self, key: Option<Vec<u8>>, value: Option<Vec<u8>>) -> Self {
        let delta = self.records.len() as i64;
        self.records.push(Record::new(delta, 0, key, value));
        self
    }

    /// Append a fully specified record.
    pub fn record(mut self, record: Record) -> Self {
        self.records.push(record);
        self
    }

    /// Finish the batch, filling in sizes and both checksums.
    pub fn build(self) -> Batch {
        let mut w = ByteWriter::new();
        for record in &self.records {
            record.encode(&mut w);
        }
        let records = w.into_inner();

        let mut header = self.header;
        header.record_count = self.records.len() as i32;
        header.last_offset_delta = self
            .records
            .iter()
            .map(|r| r.offset_delta as i32)
            .max()
            .unwrap_or(0);
        header.batch_size = (HEADER_SIZE + records.len()) as i32;
        header.crc = header.compute_crc(&records);
        header.header_crc = header.compute_header_crc();

        Batch::from_parts(header, records)
    }
}

/// Batch decoding errors.
#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    /// Header checksum does not match (corrupt batch)
    #[error("Corrupt batch at offset {base_offset}: header crc stored={stored:#010x}, computed={computed:#010x}")]
    HeaderCrcMismatch {
        /// Base offset as decoded from the corrupt header
        base_offset: i64,
        /// Stored checksum
        stored: u32,
        /// Computed checksum
        computed: u32,
        /// The offending batch (records are not kept)
        batch: Box<Batch>,
    },

    /// Body checksum does not match (corrupt batch)
    #[error("Corrupt batch at offset {base_offset}: crc stored={stored:#010x}, computed={computed:#010x}")]
    BodyCrcMismatch {
        /// Base offset of the batch
        base_offset: i64,
        /// Stored checksum
        stored: u32,
        /// Computed checksum
        computed: u32,
        /// The offending batch
        batch: Box<Batch>,
    },

    /// `batch_size` is smaller than a header or above the configured limit
    #[error("Invalid batch size {batch_size} at offset {base_offset}")]
    InvalidBatchSize {
        /// Base offset of the batch
        base_offset: i64,
        /// Declared batch size
        batch_size: i32,
    },

    /// A record inside a checksummed batch failed to decode
    #[error("Malformed record in batch at offset {base_offset}: {source}")]
    Record {
        /// Base offset of the batch
        base_offset: i64,
        /// Underlying decode error
        #[source]
        source: DecodeError,
    },

    /// Decoded records did not consume exactly the record region
    #[error("Records of batch at offset {base_offset} consumed {consumed} of {expected} bytes")]
    RecordAccounting {
        /// Base offset of the batch
        base_offset: i64,
        /// Size of the record region
        expected: usize,
        /// Bytes consumed by record decoding
        consumed: usize,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl BatchError {
    /// Whether this error is a checksum mismatch.
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            BatchError::HeaderCrcMismatch { .. } | BatchError::BodyCrcMismatch { .. }
        )
    }

    /// The corrupt batch, for checksum errors.
    pub fn batch(&self) -> Option<&Batch> {
        match self {
            BatchError::HeaderCrcMismatch { batch, .. }
            | BatchError::BodyCrcMismatch { batch, .. } => Some(&**batch),
            _ => None,
        }
    }
}

/// Decode a batch whose header and records sit back to back in `bytes`,
/// without checksum validation.
pub fn decode_unchecked(bytes: &[u8]) -> Result<Batch, DecodeError> {
    let mut reader = ByteReader::new(bytes);
    let header = BatchHeader::decode(&mut reader)?;
    let records_size = header.records_size().unwrap_or(0);
    let records = reader.read_bytes(records_size)?.to_vec();
    Ok(Batch::from_parts(header, records))
}

/// Read until `buf` is full or the stream ends; returns bytes read.
fn read_full<R: Read>(stream: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match stream.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

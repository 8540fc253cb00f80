//! Kvstore snapshot.
//!
//! The snapshot `metadata` is the `i64` last offset covered by the snapshot.
//! The `data` blob is an `i32` length followed by one batch in the
//! serialization of the producing system:
//!
//! - the 13 batch header fields, little-endian, in log order
//! - `term (i64)`, `compressed (i8)`
//! - per record: `size (u32)`, `attributes (i8)`, `timestamp_delta (i64)`,
//!   `offset_delta (i32)`, `key_size (i32)` + key iobuf,
//!   `value_size (i32)` + value iobuf, `header_count (i32)` and per header
//!   the same size + iobuf pairs for its key and value
//!
//! The embedded batch carries no checksum that is verified here.

use std::path::Path;

use rplog_core::{ByteReader, ByteWriter, DecodeResult};
use rplog_durability::{BatchHeader, Record, RecordHeader, Snapshot};

use crate::error::KvStoreError;

/// Snapshot format version written by [`KvSnapshot::to_snapshot`].
pub const KV_SNAPSHOT_VERSION: i8 = 1;

/// The batch embedded in a kvstore snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotBatch {
    /// Batch header
    pub header: BatchHeader,
    /// Term of the batch
    pub term: i64,
    /// Whether the records were compressed
    pub compressed: i8,
    /// Records in order
    pub records: Vec<Record>,
}

impl SnapshotBatch {
    /// Decode the embedded batch.
    pub fn decode(r: &mut ByteReader<'_>) -> DecodeResult<Self> {
        let header = BatchHeader::decode(r)?;
        let term = r.read_i64()?;
        let compressed = r.read_i8()?;

        let count = header.record_count.max(0) as usize;
        let mut records = Vec::with_capacity(count.min(r.remaining()));
        for _ in 0..count {
            records.push(read_record(r)?);
        }

        Ok(SnapshotBatch {
            header,
            term,
            compressed,
            records,
        })
    }

    /// Encode the embedded batch.
    pub fn encode(&self, w: &mut ByteWriter) {
        let h = &self.header;
        w.write_u32(h.header_crc);
        w.write_i32(h.batch_size);
        w.write_i64(h.base_offset);
        w.write_i8(h.batch_type);
        w.write_u32(h.crc);
        w.write_i16(h.attrs);
        w.write_i32(h.last_offset_delta);
        w.write_i64(h.first_timestamp);
        w.write_i64(h.max_timestamp);
        w.write_i64(h.producer_id);
        w.write_i16(h.producer_epoch);
        w.write_i32(h.base_sequence);
        w.write_i32(h.record_count);
        w.write_i64(self.term);
        w.write_i8(self.compressed);
        for record in &self.records {
            write_record(w, record);
        }
    }
}

fn read_record(r: &mut ByteReader<'_>) -> DecodeResult<Record> {
    let length = r.read_u32()?;
    let attributes = r.read_i8()?;
    let timestamp_delta = r.read_i64()?;
    let offset_delta = r.read_i32()?;
    let _key_size = r.read_i32()?;
    let key = r.read_iobuf()?.to_vec();
    let _value_size = r.read_i32()?;
    let value = r.read_iobuf()?.to_vec();
    let headers = r.read_vector(|r| {
        let _key_size = r.read_i32()?;
        let key = r.read_iobuf()?.to_vec();
        let _value_size = r.read_i32()?;
        let value = r.read_iobuf()?.to_vec();
        Ok(RecordHeader::new(key, Some(value)))
    })?;

    Ok(Record {
        length: i64::from(length),
        attributes,
        timestamp_delta,
        offset_delta: i64::from(offset_delta),
        key: Some(key),
        value: Some(value),
        headers,
    })
}

fn write_record(w: &mut ByteWriter, record: &Record) {
    let key = record.key.as_deref().unwrap_or_default();
    let value = record.value.as_deref().unwrap_or_default();
    w.write_u32(record.length as u32);
    w.write_i8(record.attributes);
    w.write_i64(record.timestamp_delta);
    w.write_i32(record.offset_delta as i32);
    w.write_i32(key.len() as i32);
    w.write_iobuf(key);
    w.write_i32(value.len() as i32);
    w.write_iobuf(value);
    w.write_vector(&record.headers, |w, h| {
        let value = h.value.as_deref().unwrap_or_default();
        w.write_i32(h.key.len() as i32);
        w.write_iobuf(&h.key);
        w.write_i32(value.len() as i32);
        w.write_iobuf(value);
    });
}

/// A decoded kvstore snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KvSnapshot {
    /// Last log offset reflected in the snapshot
    pub last_offset: i64,
    /// The state batch
    pub batch: SnapshotBatch,
}

impl KvSnapshot {
    /// Read and decode a kvstore snapshot file.
    pub fn read(path: &Path) -> Result<KvSnapshot, KvStoreError> {
        let snapshot = Snapshot::read(path)?;
        Self::from_snapshot(&snapshot)
    }

    /// Decode the kvstore contents of a generic snapshot.
    pub fn from_snapshot(snapshot: &Snapshot) -> Result<KvSnapshot, KvStoreError> {
        let last_offset = ByteReader::new(&snapshot.metadata)
            .read_i64()
            .map_err(KvStoreError::SnapshotFormat)?;

        let mut data = ByteReader::new(&snapshot.data);
        let batch = data
            .read_iobuf()
            .and_then(|bytes| SnapshotBatch::decode(&mut ByteReader::new(bytes)))
            .map_err(KvStoreError::SnapshotFormat)?;

        tracing::debug!(
            last_offset,
            records = batch.records.len(),
            "Decoded kvstore snapshot"
        );
        Ok(KvSnapshot { last_offset, batch })
    }

    /// Encode into a generic snapshot.
    pub fn to_snapshot(&self) -> Snapshot {
        let mut batch = ByteWriter::new();
        self.batch.encode(&mut batch);

        let mut data = ByteWriter::new();
        data.write_iobuf(batch.as_slice());

        Snapshot::new(
            KV_SNAPSHOT_VERSION,
            self.last_offset.to_le_bytes().to_vec(),
            data.into_inner(),
        )
    }
}

//! Fixture builders for kvstore batches and snapshots.

use rplog_durability::{Batch, BatchBuilder, BatchHeader, Record};

use crate::config::KVSTORE_BATCH_TYPE;
use crate::entry::{encode_value, format_timestamp};
use crate::key::DecodedKey;
use crate::snapshot::{KvSnapshot, SnapshotBatch};

/// A kvstore write: full key bytes and the new value (`None` for no payload).
pub type KvWrite = (Vec<u8>, Option<Vec<u8>>);

/// A write of `value` to `key`.
pub fn put(key: &DecodedKey, value: impl Into<Vec<u8>>) -> KvWrite {
    (key.encode(), Some(value.into()))
}

/// A write to `key` without a payload.
pub fn absent(key: &DecodedKey) -> KvWrite {
    (key.encode(), None)
}

fn records(writes: &[KvWrite]) -> Vec<Record> {
    writes
        .iter()
        .enumerate()
        .map(|(i, (key, value))| {
            Record::new(
                i as i64,
                0,
                Some(key.clone()),
                Some(encode_value(value.as_deref())),
            )
        })
        .collect()
}

/// A kvstore segment batch holding `writes` at consecutive offsets.
pub fn kv_batch(base_offset: i64, first_timestamp: i64, writes: &[KvWrite]) -> Batch {
    records(writes)
        .into_iter()
        .fold(
            BatchBuilder::new(base_offset, KVSTORE_BATCH_TYPE)
                .timestamps(first_timestamp, first_timestamp),
            BatchBuilder::record,
        )
        .build()
}

/// A kvstore snapshot covering offsets up to `last_offset`.
pub fn kv_snapshot(last_offset: i64, base_offset: i64, writes: &[KvWrite]) -> KvSnapshot {
    let records = records(writes);
    KvSnapshot {
        last_offset,
        batch: SnapshotBatch {
            header: BatchHeader {
                base_offset,
                batch_type: KVSTORE_BATCH_TYPE,
                record_count: records.len() as i32,
                last_offset_delta: records.len().saturating_sub(1) as i32,
                ..BatchHeader::default()
            },
            term: 1,
            compressed: 0,
            records,
        },
    }
}

/// Timestamp string an entry written at `millis` reports.
pub fn expected_ts(millis: i64) -> String {
    format_timestamp(millis)
}

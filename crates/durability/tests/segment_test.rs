//! Segment round-trip tests
//!
//! Batches written by the fixture builders decode back to the same headers
//! and records.

use rplog_durability::testing::write_segment;
use rplog_durability::{BatchBuilder, Record, RecordHeader, ReaderConfig, Segment};
use tempfile::TempDir;

#[test]
fn test_segment_roundtrip() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("10-2-v1.log");

    let first = BatchBuilder::new(10, 1)
        .timestamps(1_000, 1_005)
        .record(Record::new(0, 0, Some(b"k1".to_vec()), Some(b"v1".to_vec())))
        .record(
            Record::new(1, 5, Some(b"k2".to_vec()), None)
                .with_headers(vec![RecordHeader::new(b"trace".to_vec(), Some(b"abc".to_vec()))]),
        )
        .build();
    let second = BatchBuilder::new(12, 2)
        .producer(77, 3, 100)
        .key_value(None, Some(vec![0xFF; 300]))
        .build();
    write_segment(&path, &[first.clone(), second.clone()]).unwrap();

    let segment = Segment::new(&path);
    assert_eq!(segment.name().unwrap().base_offset, 10);
    assert_eq!(segment.name().unwrap().term, 2);

    let config = ReaderConfig::for_testing();
    let batches = segment.read_all(&config).unwrap();
    assert_eq!(batches.len(), 2);
    assert_eq!(batches[0].header(), first.header());
    assert_eq!(batches[1].header(), second.header());
    assert_eq!(batches[0].last_offset(), 11);
    assert_eq!(batches[1].header().producer_id, 77);

    let records = batches[0].decode_records(&config).unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].key.as_deref(), Some(&b"k1"[..]));
    assert_eq!(records[1].timestamp_delta, 5);
    assert_eq!(records[1].value, None);
    assert_eq!(records[1].headers[0].key, b"trace");
    assert_eq!(records[1].headers[0].value.as_deref(), Some(&b"abc"[..]));

    let records = batches[1].decode_records(&config).unwrap();
    assert_eq!(records[0].key, None);
    assert_eq!(records[0].value.as_ref().map(|v| v.len()), Some(300));
}

#[test]
fn test_abandoned_record_iteration() {
    let batch = BatchBuilder::new(0, 1)
        .key_value(Some(b"a".to_vec()), Some(b"1".to_vec()))
        .key_value(Some(b"b".to_vec()), Some(b"2".to_vec()))
        .build();

    let first = batch.records().next().unwrap().unwrap();
    assert_eq!(first.key.as_deref(), Some(&b"a"[..]));
    assert_eq!(batch.records().count(), 2);
}

//! Corruption and truncation tests for segment files
//!
//! These tests verify how a segment reader treats damaged files:
//! - CRC32C detects bit flips in records and header
//! - A torn tail yields the batches before it, without error
//! - A zero-filled tail ends the segment
//! - Reading stops at the first corrupt batch
//! - A torn tail wins over a damaged header or a garbage batch size

use rplog_durability::testing::{segment_bytes, write_segment};
use rplog_durability::{Batch, BatchBuilder, BatchError, ReaderConfig, Segment, HEADER_SIZE};
use std::fs::OpenOptions;
use std::io::{Read, Seek, SeekFrom, Write};
use tempfile::TempDir;

fn batch(base_offset: i64, keys: &[&str]) -> Batch {
    let builder =
        BatchBuilder::new(base_offset, 1).timestamps(1_700_000_000_000, 1_700_000_000_000);
    keys.iter()
        .fold(builder, |b, k| {
            b.key_value(Some(k.as_bytes().to_vec()), Some(format!("value-{}", k).into_bytes()))
        })
        .build()
}

fn two_batch_segment(temp_dir: &TempDir) -> (std::path::PathBuf, Vec<Batch>) {
    let path = temp_dir.path().join("0-1-v1.log");
    let batches = vec![batch(0, &["a", "b"]), batch(2, &["c", "d", "e"])];
    write_segment(&path, &batches).unwrap();
    (path, batches)
}

fn flip_byte(path: &std::path::Path, pos: u64) {
    let mut file = OpenOptions::new().read(true).write(true).open(path).unwrap();
    file.seek(SeekFrom::Start(pos)).unwrap();
    let mut buf = [0u8; 1];
    file.read_exact(&mut buf).unwrap();
    buf[0] ^= 0x04;
    file.seek(SeekFrom::Start(pos)).unwrap();
    file.write_all(&buf).unwrap();
}

// ============================================================================
// Truncation
// ============================================================================

#[test]
fn test_truncated_tail_yields_prior_batches() {
    let temp_dir = TempDir::new().unwrap();
    let (path, batches) = two_batch_segment(&temp_dir);

    let len = std::fs::metadata(&path).unwrap().len();
    let file = OpenOptions::new().write(true).open(&path).unwrap();
    file.set_len(len - 10).unwrap();

    let read = Segment::new(&path).read_all(&ReaderConfig::default()).unwrap();
    assert_eq!(read.len(), 1);
    assert_eq!(read[0].header(), batches[0].header());
}

#[test]
fn test_truncation_at_every_offset_is_clean() {
    let temp_dir = TempDir::new().unwrap();
    let batches = vec![batch(0, &["a", "b"]), batch(2, &["c"])];
    let bytes = segment_bytes(&batches);
    let first_len = batches[0].to_bytes().len();
    let path = temp_dir.path().join("0-1-v1.log");

    for cut in 0..bytes.len() {
        std::fs::write(&path, &bytes[..cut]).unwrap();
        let read = Segment::new(&path).read_all(&ReaderConfig::default()).unwrap();
        let expected = if cut < first_len { 0 } else { 1 };
        assert_eq!(read.len(), expected, "cut at {}", cut);
    }
}

#[test]
fn test_zero_filled_tail_ends_segment() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("0-1-v1.log");
    let mut bytes = batch(0, &["a"]).to_bytes();
    bytes.extend(std::iter::repeat(0u8).take(HEADER_SIZE * 4));
    std::fs::write(&path, &bytes).unwrap();

    let read = Segment::new(&path).read_all(&ReaderConfig::default()).unwrap();
    assert_eq!(read.len(), 1);
}

#[test]
fn test_all_zero_segment_has_no_batches() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("0-1-v1.log");
    std::fs::write(&path, vec![0u8; HEADER_SIZE]).unwrap();

    let read = Segment::new(&path).read_all(&ReaderConfig::default()).unwrap();
    assert!(read.is_empty());
}

// ============================================================================
// CRC enforcement
// ============================================================================

#[test]
fn test_record_bit_flip_is_detected() {
    let temp_dir = TempDir::new().unwrap();
    let (path, batches) = two_batch_segment(&temp_dir);
    let first_len = batches[0].to_bytes().len() as u64;

    // Inside the second batch's records
    flip_byte(&path, first_len + HEADER_SIZE as u64 + 3);

    let mut iter = Segment::new(&path).batches(&ReaderConfig::default()).unwrap();
    assert!(iter.next().unwrap().is_ok());
    let err = iter.next().unwrap().unwrap_err();
    assert!(matches!(err, BatchError::BodyCrcMismatch { base_offset: 2, .. }));
    assert_eq!(err.batch().unwrap().index(), 1);
    assert!(iter.next().is_none());
}

#[test]
fn test_header_bit_flip_is_detected() {
    let temp_dir = TempDir::new().unwrap();
    let (path, _) = two_batch_segment(&temp_dir);

    // base_offset field of the first batch
    flip_byte(&path, 9);

    let err = Segment::new(&path)
        .read_all(&ReaderConfig::default())
        .unwrap_err();
    assert!(matches!(err, BatchError::HeaderCrcMismatch { .. }));
    assert!(err.is_corruption());
}

#[test]
fn test_header_crc_field_flip_is_detected() {
    let temp_dir = TempDir::new().unwrap();
    let (path, _) = two_batch_segment(&temp_dir);
    flip_byte(&path, 1);

    let err = Segment::new(&path)
        .read_all(&ReaderConfig::default())
        .unwrap_err();
    assert!(matches!(err, BatchError::HeaderCrcMismatch { .. }));
}

#[test]
fn test_body_crc_field_flip_is_detected() {
    let temp_dir = TempDir::new().unwrap();
    let (path, _) = two_batch_segment(&temp_dir);
    // crc field, covered by the header crc
    flip_byte(&path, 18);

    let err = Segment::new(&path)
        .read_all(&ReaderConfig::default())
        .unwrap_err();
    assert!(matches!(err, BatchError::HeaderCrcMismatch { .. }));
}

// ============================================================================
// Torn tail behind a damaged header
// ============================================================================

#[test]
fn test_torn_tail_with_damaged_header_is_clean() {
    let temp_dir = TempDir::new().unwrap();
    let (path, batches) = two_batch_segment(&temp_dir);
    let second = batches[0].to_bytes().len() as u64;

    // base_offset of the second batch, then cut 5 bytes into its body
    flip_byte(&path, second + 9);
    let file = OpenOptions::new().write(true).open(&path).unwrap();
    file.set_len(second + HEADER_SIZE as u64 + 5).unwrap();

    let read = Segment::new(&path).read_all(&ReaderConfig::default()).unwrap();
    assert_eq!(read.len(), 1);
    assert_eq!(read[0].header(), batches[0].header());
}

#[test]
fn test_garbage_batch_size_at_tail_is_clean() {
    let temp_dir = TempDir::new().unwrap();
    let (path, batches) = two_batch_segment(&temp_dir);
    let second = batches[0].to_bytes().len() as u64;

    // High byte of the second batch's batch_size: far beyond both the file
    // and the size limit
    let mut file = OpenOptions::new().write(true).open(&path).unwrap();
    file.seek(SeekFrom::Start(second + 7)).unwrap();
    file.write_all(&[0x7F]).unwrap();
    drop(file);

    let mut iter = Segment::new(&path).batches(&ReaderConfig::default()).unwrap();
    assert!(iter.next().unwrap().is_ok());
    assert!(iter.next().is_none());
    assert_eq!(iter.batches_read(), 1);
}

#[test]
fn test_oversized_batch_with_data_present_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let (path, _) = two_batch_segment(&temp_dir);
    let config = ReaderConfig::default().with_max_batch_size(4);

    let err = Segment::new(&path).read_all(&config).unwrap_err();
    assert!(matches!(
        err,
        BatchError::InvalidBatchSize { base_offset: 0, .. }
    ));
}

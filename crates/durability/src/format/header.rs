//! Record batch header.
//!
//! # Layout (61 bytes, little-endian)
//!
//! ```text
//! ┌────────────────┬────────────────┬─────────────────┬──────────┬─────────┐
//! │ header_crc (4) │ batch_size (4) │ base_offset (8) │ type (1) │ crc (4) │
//! └────────────────┴────────────────┴─────────────────┴──────────┴─────────┘
//! ┌───────────┬───────────┬──────────┬────────┬─────────────────┐
//! │ attrs (2) │ delta (4) │ first_ts │ max_ts │ producer_id (8) │
//! │           │           │ (8)      │ (8)    │                 │
//! └───────────┴───────────┴──────────┴────────┴─────────────────┘
//! ┌────────────────────┬──────────────────┬──────────────────┐
//! │ producer_epoch (2) │ base_sequence (4)│ record_count (4) │
//! └────────────────────┴──────────────────┴──────────────────┘
//! ```
//!
//! # Checksums
//!
//! - `header_crc`: CRC32C over bytes 4..61 exactly as stored (little-endian).
//! - `crc`: CRC32C over the fields from `attrs` to `record_count` re-encoded
//!   **big-endian**, continued over the record bytes. This is the checksum a
//!   Kafka client computes over its own wire form, so it must be rebuilt
//!   big-endian even though the file is little-endian.

use byteorder::{BigEndian, ByteOrder, LittleEndian};
use rplog_core::{ByteReader, Crc32c, DecodeResult};
use serde::Serialize;

/// Size of the on-disk batch header in bytes.
pub const HEADER_SIZE: usize = 61;

/// Size of the big-endian region covered by the body `crc` (attrs..record_count).
pub const CRC_HEADER_REGION_SIZE: usize = 40;

/// Mask of the compression codec bits in `attrs`.
pub const ATTR_COMPRESSION_MASK: i16 = 0x07;
/// Timestamp type bit in `attrs` (set = log append time).
pub const ATTR_TIMESTAMP_TYPE: i16 = 0x08;
/// Transactional bit in `attrs`.
pub const ATTR_TRANSACTIONAL: i16 = 0x10;
/// Control batch bit in `attrs`.
pub const ATTR_CONTROL: i16 = 0x20;

/// Fixed-size batch header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct BatchHeader {
    /// CRC32C of the rest of the header
    pub header_crc: u32,
    /// Total batch size including this header
    pub batch_size: i32,
    /// Offset of the first record
    pub base_offset: i64,
    /// Batch type tag (raft data, configuration, kvstore, ...)
    pub batch_type: i8,
    /// Kafka-compatible CRC32C of the big-endian header tail plus records.
    ///
    /// Stored as a signed field; compared bit-for-bit with the computed CRC.
    pub crc: u32,
    /// Attribute bits (compression, timestamp type, transactional, control)
    pub attrs: i16,
    /// Offset delta of the last record
    pub last_offset_delta: i32,
    /// Timestamp of the first record (milliseconds)
    pub first_timestamp: i64,
    /// Largest record timestamp (milliseconds)
    pub max_timestamp: i64,
    /// Producer id (-1 when not idempotent)
    pub producer_id: i64,
    /// Producer epoch
    pub producer_epoch: i16,
    /// First sequence number of the batch
    pub base_sequence: i32,
    /// Number of records in the batch
    pub record_count: i32,
}

impl BatchHeader {
    /// Decode the 13 header fields in on-disk order.
    pub fn decode(reader: &mut ByteReader<'_>) -> DecodeResult<Self> {
        Ok(BatchHeader {
            header_crc: reader.read_u32()?,
            batch_size: reader.read_i32()?,
            base_offset: reader.read_i64()?,
            batch_type: reader.read_i8()?,
            crc: reader.read_u32()?,
            attrs: reader.read_i16()?,
            last_offset_delta: reader.read_i32()?,
            first_timestamp: reader.read_i64()?,
            max_timestamp: reader.read_i64()?,
            producer_id: reader.read_i64()?,
            producer_epoch: reader.read_i16()?,
            base_sequence: reader.read_i32()?,
            record_count: reader.read_i32()?,
        })
    }

    /// Decode a header from exactly [`HEADER_SIZE`] bytes.
    pub fn from_bytes(bytes: &[u8; HEADER_SIZE]) -> Self {
        BatchHeader {
            header_crc: LittleEndian::read_u32(&bytes[0..4]),
            batch_size: LittleEndian::read_i32(&bytes[4..8]),
            base_offset: LittleEndian::read_i64(&bytes[8..16]),
            batch_type: bytes[16] as i8,
            crc: LittleEndian::read_u32(&bytes[17..21]),
            attrs: LittleEndian::read_i16(&bytes[21..23]),
            last_offset_delta: LittleEndian::read_i32(&bytes[23..27]),
            first_timestamp: LittleEndian::read_i64(&bytes[27..35]),
            max_timestamp: LittleEndian::read_i64(&bytes[35..43]),
            producer_id: LittleEndian::read_i64(&bytes[43..51]),
            producer_epoch: LittleEndian::read_i16(&bytes[51..53]),
            base_sequence: LittleEndian::read_i32(&bytes[53..57]),
            record_count: LittleEndian::read_i32(&bytes[57..61]),
        }
    }

    /// Serialize the header to its on-disk bytes.
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut bytes = [0u8; HEADER_SIZE];
        LittleEndian::write_u32(&mut bytes[0..4], self.header_crc);
        LittleEndian::write_i32(&mut bytes[4..8], self.batch_size);
        LittleEndian::write_i64(&mut bytes[8..16], self.base_offset);
        bytes[16] = self.batch_type as u8;
        LittleEndian::write_u32(&mut bytes[17..21], self.crc);
        LittleEndian::write_i16(&mut bytes[21..23], self.attrs);
        LittleEndian::write_i32(&mut bytes[23..27], self.last_offset_delta);
        LittleEndian::write_i64(&mut bytes[27..35], self.first_timestamp);
        LittleEndian::write_i64(&mut bytes[35..43], self.max_timestamp);
        LittleEndian::write_i64(&mut bytes[43..51], self.producer_id);
        LittleEndian::write_i16(&mut bytes[51..53], self.producer_epoch);
        LittleEndian::write_i32(&mut bytes[53..57], self.base_sequence);
        LittleEndian::write_i32(&mut bytes[57..61], self.record_count);
        bytes
    }

    /// Check whether every field is zero (preallocated or truncated tail).
    pub fn is_zeroed(&self) -> bool {
        *self == BatchHeader::default()
    }

    /// CRC32C over fields 2..13 in their little-endian encoding.
    pub fn compute_header_crc(&self) -> u32 {
        rplog_core::crc32c(&self.to_bytes()[4..])
    }

    /// Kafka-compatible CRC32C over the big-endian header tail and `records`.
    pub fn compute_crc(&self, records: &[u8]) -> u32 {
        let mut hasher = Crc32c::new();
        hasher.update(&self.crc_region_be());
        hasher.update(records);
        hasher.finalize()
    }

    fn crc_region_be(&self) -> [u8; CRC_HEADER_REGION_SIZE] {
        let mut be = [0u8; CRC_HEADER_REGION_SIZE];
        BigEndian::write_i16(&mut be[0..2], self.attrs);
        BigEndian::write_i32(&mut be[2..6], self.last_offset_delta);
        BigEndian::write_i64(&mut be[6..14], self.first_timestamp);
        BigEndian::write_i64(&mut be[14..22], self.max_timestamp);
        BigEndian::write_i64(&mut be[22..30], self.producer_id);
        BigEndian::write_i16(&mut be[30..32], self.producer_epoch);
        BigEndian::write_i32(&mut be[32..36], self.base_sequence);
        BigEndian::write_i32(&mut be[36..40], self.record_count);
        be
    }

    /// Number of record bytes following the header, if `batch_size` is sane.
    pub fn records_size(&self) -> Option<usize> {
        usize::try_from(self.batch_size)
            .ok()
            .and_then(|size| size.checked_sub(HEADER_SIZE))
    }

    /// Offset of the last record in the batch.
    pub fn last_offset(&self) -> i64 {
        self.base_offset
            .wrapping_add(i64::from(self.record_count))
            .wrapping_sub(1)
    }

    /// Compression codec id from the attribute bits.
    pub fn compression(&self) -> i16 {
        self.attrs & ATTR_COMPRESSION_MASK
    }

    /// Whether the batch belongs to a transaction.
    pub fn is_transactional(&self) -> bool {
        self.attrs & ATTR_TRANSACTIONAL != 0
    }

    /// Whether the batch is a control batch.
    pub fn is_control(&self) -> bool {
        self.attrs & ATTR_CONTROL != 0
    }
}

//! Kvstore records as entries.
//!
//! A kvstore record key is `keyspace (i8)` followed by the keyspace-specific
//! key bytes. The record value is an `optional<iobuf>`: a presence byte and,
//! when present, an `i32` length and the payload. An entry without a payload
//! leaves the current value of its key unchanged.

use chrono::DateTime;
use rplog_core::{ByteReader, ByteWriter, DecodeResult};
use rplog_durability::{BatchHeader, Record};
use serde::Serialize;

use crate::keyspace::KeySpace;

/// Timestamp rendering of entry times (UTC).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One kvstore mutation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KvEntry {
    /// Keyspace of the key
    pub keyspace: KeySpace,
    /// Key bytes after the keyspace byte
    #[serde(serialize_with = "as_hex")]
    pub key_buf: Vec<u8>,
    /// New value, `None` when the record carries no payload
    #[serde(serialize_with = "as_hex_opt")]
    pub data: Option<Vec<u8>>,
    /// Absolute offset of the record
    pub offset: i64,
    /// Batch first timestamp (milliseconds)
    pub epoch: i64,
    /// `epoch` rendered as UTC date and time
    pub ts: String,
}

impl KvEntry {
    /// Decode a record of a kvstore batch.
    pub fn decode(header: &BatchHeader, record: &Record) -> DecodeResult<Self> {
        let key = record.key.as_deref().unwrap_or_default();
        let mut r = ByteReader::new(key);
        let keyspace = KeySpace::from_tag(r.read_i8()?);
        let key_buf = r.read_rest().to_vec();

        let data = match record.value.as_deref() {
            Some(value) => {
                let mut r = ByteReader::new(value);
                r.read_optional(|r| r.read_iobuf().map(<[u8]>::to_vec))?
            }
            None => None,
        };

        Ok(KvEntry {
            keyspace,
            key_buf,
            data,
            offset: header.base_offset.wrapping_add(record.offset_delta),
            epoch: header.first_timestamp,
            ts: format_timestamp(header.first_timestamp),
        })
    }

    /// Whether the entry carries a value.
    pub fn has_payload(&self) -> bool {
        self.data.is_some()
    }
}

/// Render milliseconds since the epoch as `YYYY-MM-DD HH:MM:SS` (UTC).
pub fn format_timestamp(millis: i64) -> String {
    DateTime::from_timestamp_millis(millis)
        .map(|dt| dt.format(TIMESTAMP_FORMAT).to_string())
        .unwrap_or_default()
}

/// Record key bytes for `keyspace` and `key_buf`.
pub fn encode_key(keyspace: KeySpace, key_buf: &[u8]) -> Vec<u8> {
    let mut w = ByteWriter::with_capacity(1 + key_buf.len());
    w.write_i8(keyspace.tag());
    w.write_bytes(key_buf);
    w.into_inner()
}

/// Record value bytes: a present payload, or an absent one for `None`.
pub fn encode_value(data: Option<&[u8]>) -> Vec<u8> {
    let mut w = ByteWriter::new();
    w.write_optional(data, ByteWriter::write_iobuf);
    w.into_inner()
}

fn as_hex<S: serde::Serializer>(bytes: &[u8], s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&hex::encode(bytes))
}

fn as_hex_opt<S: serde::Serializer>(bytes: &Option<Vec<u8>>, s: S) -> Result<S::Ok, S::Error> {
    match bytes {
        Some(b) => s.serialize_some(&hex::encode(b)),
        None => s.serialize_none(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(base_offset: i64, first_timestamp: i64) -> BatchHeader {
        BatchHeader {
            base_offset,
            first_timestamp,
            batch_type: 4,
            ..BatchHeader::default()
        }
    }

    #[test]
    fn test_decode_entry() {
        let record = Record::new(
            3,
            0,
            Some(encode_key(KeySpace::Storage, &[9, 9])),
            Some(encode_value(Some(b"payload"))),
        );
        let entry = KvEntry::decode(&header(100, 1_600_000_000_000), &record).unwrap();

        assert_eq!(entry.keyspace, KeySpace::Storage);
        assert_eq!(entry.key_buf, vec![9, 9]);
        assert_eq!(entry.data.as_deref(), Some(&b"payload"[..]));
        assert_eq!(entry.offset, 103);
        assert_eq!(entry.epoch, 1_600_000_000_000);
        assert_eq!(entry.ts, "2020-09-13 12:26:40");
        assert!(entry.has_payload());
    }

    #[test]
    fn test_absent_payload() {
        let record = Record::new(
            0,
            0,
            Some(encode_key(KeySpace::Consensus, &[1])),
            Some(encode_value(None)),
        );
        let entry = KvEntry::decode(&header(0, 0), &record).unwrap();
        assert!(!entry.has_payload());
        assert_eq!(entry.ts, "1970-01-01 00:00:00");
    }

    #[test]
    fn test_null_record_value_has_no_payload() {
        let record = Record::new(0, 0, Some(encode_key(KeySpace::Testing, b"k")), None);
        assert!(!KvEntry::decode(&header(0, 0), &record).unwrap().has_payload());
    }

    #[test]
    fn test_offset_wraps_on_extreme_delta() {
        let record = Record::new(
            1,
            0,
            Some(encode_key(KeySpace::Testing, b"k")),
            Some(encode_value(Some(b"v"))),
        );
        let entry = KvEntry::decode(&header(i64::MAX, 0), &record).unwrap();
        assert_eq!(entry.offset, i64::MIN);
    }

    #[test]
    fn test_missing_key_fails() {
        let record = Record::new(0, 0, None, Some(encode_value(Some(b"v"))));
        assert!(KvEntry::decode(&header(0, 0), &record)
            .unwrap_err()
            .is_truncated());
    }

    #[test]
    fn test_truncated_payload_fails() {
        let mut value = encode_value(Some(b"payload"));
        value.truncate(value.len() - 2);
        let record = Record::new(0, 0, Some(encode_key(KeySpace::Testing, b"k")), Some(value));
        assert!(KvEntry::decode(&header(0, 0), &record).is_err());
    }

    #[test]
    fn test_entry_json() {
        let record = Record::new(
            0,
            0,
            Some(encode_key(KeySpace::from_tag(99), &[0xAB])),
            Some(encode_value(Some(&[0x01]))),
        );
        let entry = KvEntry::decode(&header(5, 0), &record).unwrap();
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["keyspace"], "unknown");
        assert_eq!(json["key_buf"], "ab");
        assert_eq!(json["data"], "01");
        assert_eq!(json["offset"], 5);
    }
}

//! Record format inside a batch.
//!
//! # Record Layout
//!
//! ```text
//! ┌──────────────┬───────────┬────────────────┬──────────────┬─────┬───────┬─────────┐
//! │ length (var) │ attrs (1) │ ts_delta (var) │ off_delta    │ key │ value │ headers │
//! │              │           │                │ (var)        │     │       │         │
//! └──────────────┴───────────┴────────────────┴──────────────┴─────┴───────┴─────────┘
//!
//! key, value:   varint length + bytes (length <= 0 means null)
//! headers:      varint count, then per header: varint key length + key,
//!               varint value length + value
//! ```
//!
//! `length` counts the bytes after the length varint itself.

use rplog_core::varint::varint_len;
use rplog_core::{ByteReader, ByteWriter, DecodeResult};
use serde::Serialize;

/// A key/value pair attached to a record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordHeader {
    /// Header key
    pub key: Vec<u8>,
    /// Header value (`None` when null)
    pub value: Option<Vec<u8>>,
}

impl RecordHeader {
    /// Create a header.
    pub fn new(key: impl Into<Vec<u8>>, value: Option<Vec<u8>>) -> Self {
        RecordHeader {
            key: key.into(),
            value,
        }
    }

    fn decode(reader: &mut ByteReader<'_>) -> DecodeResult<Self> {
        let key = reader
            .read_length_prefixed_bytes()?
            .map(<[u8]>::to_vec)
            .unwrap_or_default();
        let value = reader.read_length_prefixed_bytes()?.map(<[u8]>::to_vec);
        Ok(RecordHeader { key, value })
    }

    fn encode(&self, writer: &mut ByteWriter) {
        writer.write_length_prefixed_bytes(Some(self.key.as_slice()));
        writer.write_length_prefixed_bytes(self.value.as_deref());
    }
}

/// A single record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Record {
    /// Encoded size after the length prefix
    pub length: i64,
    /// Record attributes (unused by current formats)
    pub attributes: i8,
    /// Timestamp relative to the batch's first timestamp
    pub timestamp_delta: i64,
    /// Offset relative to the batch's base offset
    pub offset_delta: i64,
    /// Record key (`None` when null)
    pub key: Option<Vec<u8>>,
    /// Record value (`None` when null)
    pub value: Option<Vec<u8>>,
    /// Record headers
    pub headers: Vec<RecordHeader>,
}

impl Record {
    /// Create a record; `length` is computed from the contents.
    pub fn new(
        offset_delta: i64,
        timestamp_delta: i64,
        key: Option<Vec<u8>>,
        value: Option<Vec<u8>>,
    ) -> Self {
        let mut record = Record {
            length: 0,
            attributes: 0,
            timestamp_delta,
            offset_delta,
            key,
            value,
            headers: Vec::new(),
        };
        record.length = record.body().len() as i64;
        record
    }

    /// Attach headers, recomputing `length`.
    pub fn with_headers(mut self, headers: Vec<RecordHeader>) -> Self {
        self.headers = headers;
        self.length = self.body().len() as i64;
        self
    }

    /// Decode one record, in fixed field order.
    pub fn decode(reader: &mut ByteReader<'_>) -> DecodeResult<Self> {
        let length = reader.read_varint()?;
        let attributes = reader.read_i8()?;
        let timestamp_delta = reader.read_varint()?;
        let offset_delta = reader.read_varint()?;
        let key = reader.read_length_prefixed_bytes()?.map(<[u8]>::to_vec);
        let value = reader.read_length_prefixed_bytes()?.map(<[u8]>::to_vec);
        let headers = {
            let count = reader.read_varint()?.max(0) as usize;
            let mut headers = Vec::with_capacity(count.min(reader.remaining()));
            for _ in 0..count {
                headers.push(RecordHeader::decode(reader)?);
            }
            headers
        };

        Ok(Record {
            length,
            attributes,
            timestamp_delta,
            offset_delta,
            key,
            value,
            headers,
        })
    }

    /// Encode the record, length prefix included.
    pub fn encode(&self, writer: &mut ByteWriter) {
        let body = self.body();
        writer.write_varint(body.len() as i64);
        writer.write_bytes(&body);
    }

    /// Total encoded size, length prefix included.
    pub fn encoded_len(&self) -> usize {
        let body = self.body().len();
        varint_len(body as i64) + body
    }

    fn body(&self) -> Vec<u8> {
        let mut w = ByteWriter::new();
        w.write_i8(self.attributes);
        w.write_varint(self.timestamp_delta);
        w.write_varint(self.offset_delta);
        w.write_length_prefixed_bytes(self.key.as_deref());
        w.write_length_prefixed_bytes(self.value.as_deref());
        w.write_varint(self.headers.len() as i64);
        for header in &self.headers {
            header.encode(&mut w);
        }
        w.into_inner()
    }
}

/// Lazy iterator over the records of a batch.
///
/// Yields exactly `record_count` records unless an error occurs; after an
/// error it yields nothing more. Dropping it early is fine.
pub struct RecordIter<'a> {
    reader: ByteReader<'a>,
    remaining: usize,
    failed: bool,
}

impl<'a> RecordIter<'a> {
    /// Iterate `record_count` records from `data`.
    pub fn new(data: &'a [u8], record_count: usize) -> Self {
        RecordIter {
            reader: ByteReader::new(data),
            remaining: record_count,
            failed: false,
        }
    }

    /// Bytes of the record region consumed so far.
    pub fn consumed(&self) -> usize {
        self.reader.position()
    }

    /// Bytes of the record region not yet consumed.
    pub fn unconsumed(&self) -> usize {
        self.reader.remaining()
    }
}

impl<'a> Iterator for RecordIter<'a> {
    type Item = DecodeResult<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 || self.failed {
            return None;
        }
        self.remaining -= 1;

        let result = Record::decode(&mut self.reader);
        if result.is_err() {
            self.failed = true;
        }
        Some(result)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.failed {
            (0, Some(0))
        } else {
            (0, Some(self.remaining))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn encode_all(records: &[Record]) -> Vec<u8> {
        let mut w = ByteWriter::new();
        for r in records {
            r.encode(&mut w);
        }
        w.into_inner()
    }

    #[test]
    fn test_record_roundtrip_with_headers() {
        let record = Record::new(3, 250, Some(b"k".to_vec()), Some(b"value".to_vec()))
            .with_headers(vec![
                RecordHeader::new(b"h1".to_vec(), Some(b"v1".to_vec())),
                RecordHeader::new(b"h2".to_vec(), None),
            ]);

        let bytes = encode_all(&[record.clone()]);
        assert_eq!(bytes.len(), record.encoded_len());

        let mut reader = ByteReader::new(&bytes);
        let decoded = Record::decode(&mut reader).unwrap();
        assert_eq!(decoded, record);
        assert!(reader.is_empty());
    }

    #[test]
    fn test_length_counts_bytes_after_prefix() {
        let record = Record::new(0, 0, Some(b"abc".to_vec()), None);
        let bytes = encode_all(&[record.clone()]);
        let mut reader = ByteReader::new(&bytes);
        let length = reader.read_varint().unwrap();
        assert_eq!(length as usize, reader.remaining());
        assert_eq!(length, record.length);
    }

    #[test]
    fn test_null_key_and_value() {
        let record = Record::new(0, 0, None, None);
        let bytes = encode_all(&[record.clone()]);
        let decoded = Record::decode(&mut ByteReader::new(&bytes)).unwrap();
        assert_eq!(decoded.key, None);
        assert_eq!(decoded.value, None);
    }

    #[test]
    fn test_iterator_yields_record_count() {
        let records: Vec<_> = (0..4)
            .map(|i| Record::new(i, i * 10, Some(vec![i as u8]), Some(vec![0xAA; i as usize])))
            .collect();
        let bytes = encode_all(&records);

        let mut iter = RecordIter::new(&bytes, 4);
        let decoded: Vec<_> = iter.by_ref().map(|r| r.unwrap()).collect();
        assert_eq!(decoded.len(), 4);
        assert_eq!(decoded[3].offset_delta, 3);
        assert_eq!(iter.consumed(), bytes.len());
        assert_eq!(iter.unconsumed(), 0);
    }

    #[test]
    fn test_iterator_stops_after_error() {
        let bytes = encode_all(&[Record::new(0, 0, Some(b"key".to_vec()), None)]);
        let mut iter = RecordIter::new(&bytes, 3);

        assert!(iter.next().unwrap().is_ok());
        assert!(iter.next().unwrap().unwrap_err().is_truncated());
        assert!(iter.next().is_none());
    }

    #[test]
    fn test_iterator_early_drop_is_harmless() {
        let records: Vec<_> = (0..3).map(|i| Record::new(i, 0, None, None)).collect();
        let bytes = encode_all(&records);
        let mut iter = RecordIter::new(&bytes, 3);
        assert!(iter.next().unwrap().is_ok());
        assert!(iter.unconsumed() > 0);
    }

    proptest! {
        #[test]
        fn prop_record_roundtrip(
            offset_delta in 0i64..1_000_000,
            timestamp_delta in -1_000_000i64..1_000_000,
            key in proptest::option::of(proptest::collection::vec(any::<u8>(), 1..64)),
            value in proptest::option::of(proptest::collection::vec(any::<u8>(), 1..256)),
        ) {
            let record = Record::new(offset_delta, timestamp_delta, key, value);
            let bytes = encode_all(&[record.clone()]);
            let mut reader = ByteReader::new(&bytes);
            prop_assert_eq!(Record::decode(&mut reader).unwrap(), record);
            prop_assert!(reader.is_empty());
        }
    }
}

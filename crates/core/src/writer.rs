//! Encoding counterpart of [`ByteReader`](crate::ByteReader)
//!
//! The decoder is the product; the writer exists so that fixtures and
//! round-trip checks produce bytes with exactly the layout the reader
//! expects.

use crate::varint;

/// Little-endian byte sink backed by a `Vec<u8>`
#[derive(Debug, Clone, Default)]
pub struct ByteWriter {
    buf: Vec<u8>,
}

impl ByteWriter {
    /// Create an empty writer.
    pub fn new() -> Self {
        ByteWriter { buf: Vec::new() }
    }

    /// Create an empty writer with preallocated capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        ByteWriter {
            buf: Vec::with_capacity(capacity),
        }
    }

    /// Bytes written so far.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Check whether nothing was written yet.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// View the written bytes.
    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    /// Consume the writer and return its buffer.
    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }

    /// Append raw bytes.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Write a `u8`.
    pub fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    /// Write a little-endian `u16`.
    pub fn write_u16(&mut self, v: u16) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    /// Write a little-endian `u32`.
    pub fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    /// Write a little-endian `u64`.
    pub fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    /// Write an `i8`.
    pub fn write_i8(&mut self, v: i8) {
        self.buf.push(v as u8);
    }

    /// Write a little-endian `i16`.
    pub fn write_i16(&mut self, v: i16) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    /// Write a little-endian `i32`.
    pub fn write_i32(&mut self, v: i32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    /// Write a little-endian `i64`.
    pub fn write_i64(&mut self, v: i64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    /// Write a one-byte boolean.
    pub fn write_bool(&mut self, v: bool) {
        self.buf.push(u8::from(v));
    }

    /// Write a zigzag varint.
    pub fn write_varint(&mut self, v: i64) {
        varint::encode_varint(v, &mut self.buf);
    }

    /// Write a varint length and the bytes; `None` is written as length -1.
    ///
    /// An empty slice is written as length 0, which reads back as `None`.
    pub fn write_length_prefixed_bytes(&mut self, bytes: Option<&[u8]>) {
        match bytes {
            Some(b) => {
                self.write_varint(b.len() as i64);
                self.write_bytes(b);
            }
            None => self.write_varint(-1),
        }
    }

    /// Write a presence flag and, if present, the value through `encode`.
    pub fn write_optional<T, F>(&mut self, value: Option<&T>, encode: F)
    where
        T: ?Sized,
        F: FnOnce(&mut Self, &T),
    {
        match value {
            Some(v) => {
                self.write_bool(true);
                encode(self, v);
            }
            None => self.write_bool(false),
        }
    }

    /// Write an `i32` length followed by the bytes.
    pub fn write_iobuf(&mut self, bytes: &[u8]) {
        self.write_i32(bytes.len() as i32);
        self.write_bytes(bytes);
    }

    /// Write an `i32` length followed by the UTF-8 bytes of `s`.
    pub fn write_string(&mut self, s: &str) {
        self.write_iobuf(s.as_bytes());
    }

    /// Write an `i32` count followed by each element through `encode`.
    pub fn write_vector<T, F>(&mut self, items: &[T], mut encode: F)
    where
        F: FnMut(&mut Self, &T),
    {
        self.write_i32(items.len() as i32);
        for item in items {
            encode(self, item);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ByteReader;

    #[test]
    fn test_layout_is_little_endian() {
        let mut w = ByteWriter::new();
        w.write_u32(0x0102_0304);
        w.write_i16(-2);
        assert_eq!(w.as_slice(), &[0x04, 0x03, 0x02, 0x01, 0xFE, 0xFF]);
    }

    #[test]
    fn test_optional_encoding() {
        let mut w = ByteWriter::new();
        w.write_optional(Some(&7i64), |w, v| w.write_i64(*v));
        w.write_optional(None::<&i64>, |w, v| w.write_i64(*v));
        let bytes = w.into_inner();
        assert_eq!(bytes.len(), 1 + 8 + 1);

        let mut r = ByteReader::new(&bytes);
        assert_eq!(r.read_optional(|r| r.read_i64()).unwrap(), Some(7));
        assert_eq!(r.read_optional(|r| r.read_i64()).unwrap(), None);
    }

    #[test]
    fn test_optional_unsized_value() {
        let mut w = ByteWriter::new();
        w.write_optional(Some(&b"payload"[..]), |w, v| w.write_iobuf(v));
        let bytes = w.into_inner();

        let mut r = ByteReader::new(&bytes);
        let read = r.read_optional(|r| r.read_iobuf()).unwrap();
        assert_eq!(read, Some(&b"payload"[..]));
    }

    #[test]
    fn test_len_tracks_writes() {
        let mut w = ByteWriter::with_capacity(16);
        assert!(w.is_empty());
        w.write_varint(300);
        w.write_u64(1);
        assert_eq!(w.len(), 2 + 8);
    }
}

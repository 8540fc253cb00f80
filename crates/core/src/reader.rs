//! Forward-only byte cursor
//!
//! [`ByteReader`] decodes the primitive field types used by the log,
//! snapshot and kvstore formats. All fixed-width integers are little-endian
//! two's complement. Every read advances the cursor; there is no seeking
//! backwards.
//!
//! # Length conventions
//!
//! Two framings appear on disk and they are not interchangeable:
//!
//! - Record fields use a zigzag varint length ([`ByteReader::read_length_prefixed_bytes`]),
//!   where a length of zero or below means "null".
//! - Serialized structures (NTPs, raft configuration, snapshot payloads) use
//!   an `i32` length or count ([`ByteReader::read_iobuf`], [`ByteReader::read_string`],
//!   [`ByteReader::read_vector`]).

use byteorder::{ByteOrder, LittleEndian};

use crate::error::{DecodeError, DecodeResult};
use crate::varint;

/// Little-endian cursor over a borrowed byte slice
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    /// Create a reader positioned at the start of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        ByteReader { data, pos: 0 }
    }

    /// Bytes consumed so far.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Check whether the cursor reached the end of the input.
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Take the next `n` bytes without copying.
    ///
    /// Fails with [`DecodeError::Truncated`] if fewer than `n` bytes remain;
    /// the cursor is left unchanged in that case.
    pub fn read_bytes(&mut self, n: usize) -> DecodeResult<&'a [u8]> {
        if n > self.remaining() {
            return Err(DecodeError::Truncated {
                needed: n,
                available: self.remaining(),
            });
        }
        let out = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    /// Take every byte that is left.
    pub fn read_rest(&mut self) -> &'a [u8] {
        let out = &self.data[self.pos..];
        self.pos = self.data.len();
        out
    }

    /// Read a `u8`.
    pub fn read_u8(&mut self) -> DecodeResult<u8> {
        Ok(self.read_bytes(1)?[0])
    }

    /// Read a little-endian `u16`.
    pub fn read_u16(&mut self) -> DecodeResult<u16> {
        Ok(LittleEndian::read_u16(self.read_bytes(2)?))
    }

    /// Read a little-endian `u32`.
    pub fn read_u32(&mut self) -> DecodeResult<u32> {
        Ok(LittleEndian::read_u32(self.read_bytes(4)?))
    }

    /// Read a little-endian `u64`.
    pub fn read_u64(&mut self) -> DecodeResult<u64> {
        Ok(LittleEndian::read_u64(self.read_bytes(8)?))
    }

    /// Read an `i8`.
    pub fn read_i8(&mut self) -> DecodeResult<i8> {
        Ok(self.read_u8()? as i8)
    }

    /// Read a little-endian `i16`.
    pub fn read_i16(&mut self) -> DecodeResult<i16> {
        Ok(LittleEndian::read_i16(self.read_bytes(2)?))
    }

    /// Read a little-endian `i32`.
    pub fn read_i32(&mut self) -> DecodeResult<i32> {
        Ok(LittleEndian::read_i32(self.read_bytes(4)?))
    }

    /// Read a little-endian `i64`.
    pub fn read_i64(&mut self) -> DecodeResult<i64> {
        Ok(LittleEndian::read_i64(self.read_bytes(8)?))
    }

    /// Read a one-byte boolean (any non-zero value is `true`).
    pub fn read_bool(&mut self) -> DecodeResult<bool> {
        Ok(self.read_u8()? != 0)
    }

    /// Read a zigzag varint.
    pub fn read_varint(&mut self) -> DecodeResult<i64> {
        let (value, consumed) = varint::decode_varint(&self.data[self.pos..])?;
        self.pos += consumed;
        Ok(value)
    }

    /// Read a varint length followed by that many bytes.
    ///
    /// A length of zero or below decodes to `None`.
    pub fn read_length_prefixed_bytes(&mut self) -> DecodeResult<Option<&'a [u8]>> {
        let len = self.read_varint()?;
        if len <= 0 {
            return Ok(None);
        }
        self.read_bytes(len as usize).map(Some)
    }

    /// Read a one-byte presence flag, then delegate to `decode` if present.
    pub fn read_optional<T, F>(&mut self, decode: F) -> DecodeResult<Option<T>>
    where
        F: FnOnce(&mut Self) -> DecodeResult<T>,
    {
        if self.read_bool()? {
            decode(self).map(Some)
        } else {
            Ok(None)
        }
    }

    /// Read an `i32` length followed by that many bytes.
    pub fn read_iobuf(&mut self) -> DecodeResult<&'a [u8]> {
        let len = self.read_len_i32()?;
        self.read_bytes(len)
    }

    /// Read an `i32` length followed by that many UTF-8 bytes.
    pub fn read_string(&mut self) -> DecodeResult<String> {
        let bytes = self.read_iobuf()?;
        String::from_utf8(bytes.to_vec()).map_err(|_| DecodeError::InvalidUtf8)
    }

    /// Read an `i32` element count followed by that many elements.
    pub fn read_vector<T, F>(&mut self, mut decode: F) -> DecodeResult<Vec<T>>
    where
        F: FnMut(&mut Self) -> DecodeResult<T>,
    {
        let count = self.read_len_i32()?;
        // Every element occupies at least one byte.
        let mut items = Vec::with_capacity(count.min(self.remaining()));
        for _ in 0..count {
            items.push(decode(self)?);
        }
        Ok(items)
    }

    fn read_len_i32(&mut self) -> DecodeResult<usize> {
        let len = self.read_i32()?;
        usize::try_from(len).map_err(|_| DecodeError::NegativeLength(i64::from(len)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::ByteWriter;

    #[test]
    fn test_fixed_width_little_endian() {
        let data = [
            0x01, // u8
            0x02, 0x01, // u16 = 0x0102
            0x04, 0x03, 0x02, 0x01, // u32 = 0x01020304
            0xFF, // i8 = -1
            0xFE, 0xFF, // i16 = -2
            0xFD, 0xFF, 0xFF, 0xFF, // i32 = -3
        ];
        let mut r = ByteReader::new(&data);
        assert_eq!(r.read_u8().unwrap(), 1);
        assert_eq!(r.read_u16().unwrap(), 0x0102);
        assert_eq!(r.read_u32().unwrap(), 0x0102_0304);
        assert_eq!(r.read_i8().unwrap(), -1);
        assert_eq!(r.read_i16().unwrap(), -2);
        assert_eq!(r.read_i32().unwrap(), -3);
        assert!(r.is_empty());
    }

    #[test]
    fn test_64_bit_values() {
        let mut w = ByteWriter::new();
        w.write_u64(u64::MAX - 5);
        w.write_i64(i64::MIN);
        let bytes = w.into_inner();

        let mut r = ByteReader::new(&bytes);
        assert_eq!(r.read_u64().unwrap(), u64::MAX - 5);
        assert_eq!(r.read_i64().unwrap(), i64::MIN);
    }

    #[test]
    fn test_read_bytes_truncated_keeps_position() {
        let data = [1, 2, 3];
        let mut r = ByteReader::new(&data);
        r.read_u8().unwrap();

        let err = r.read_bytes(5).unwrap_err();
        assert_eq!(
            err,
            DecodeError::Truncated {
                needed: 5,
                available: 2
            }
        );
        assert_eq!(r.position(), 1);
        assert_eq!(r.read_bytes(2).unwrap(), &[2, 3]);
    }

    #[test]
    fn test_truncated_fixed_width() {
        let data = [0u8; 3];
        let mut r = ByteReader::new(&data);
        assert!(r.read_i32().unwrap_err().is_truncated());
        assert!(r.read_i64().unwrap_err().is_truncated());
    }

    #[test]
    fn test_length_prefixed_null_and_present() {
        let mut w = ByteWriter::new();
        w.write_length_prefixed_bytes(None);
        w.write_length_prefixed_bytes(Some(b"abc"));
        w.write_varint(0);
        let bytes = w.into_inner();

        let mut r = ByteReader::new(&bytes);
        assert_eq!(r.read_length_prefixed_bytes().unwrap(), None);
        assert_eq!(r.read_length_prefixed_bytes().unwrap(), Some(&b"abc"[..]));
        assert_eq!(r.read_length_prefixed_bytes().unwrap(), None);
        assert!(r.is_empty());
    }

    #[test]
    fn test_length_prefixed_truncated_payload() {
        let mut w = ByteWriter::new();
        w.write_varint(10);
        w.write_bytes(b"short");
        let bytes = w.into_inner();

        let mut r = ByteReader::new(&bytes);
        assert!(r.read_length_prefixed_bytes().unwrap_err().is_truncated());
    }

    #[test]
    fn test_read_optional() {
        let data = [0x00, 0x01, 0x2A, 0x00, 0x00, 0x00];
        let mut r = ByteReader::new(&data);
        assert_eq!(r.read_optional(|r| r.read_i32()).unwrap(), None);
        assert_eq!(r.read_optional(|r| r.read_i32()).unwrap(), Some(42));
    }

    #[test]
    fn test_string_and_vector() {
        let mut w = ByteWriter::new();
        w.write_vector(&["kafka", "redpanda"], |w, s| w.write_string(s));
        let bytes = w.into_inner();

        let mut r = ByteReader::new(&bytes);
        let items = r.read_vector(|r| r.read_string()).unwrap();
        assert_eq!(items, vec!["kafka".to_string(), "redpanda".to_string()]);
        assert!(r.is_empty());
    }

    #[test]
    fn test_invalid_utf8() {
        let mut w = ByteWriter::new();
        w.write_iobuf(&[0xFF, 0xFE]);
        let bytes = w.into_inner();
        assert_eq!(
            ByteReader::new(&bytes).read_string(),
            Err(DecodeError::InvalidUtf8)
        );
    }

    #[test]
    fn test_negative_iobuf_length() {
        let data = (-1i32).to_le_bytes();
        assert_eq!(
            ByteReader::new(&data).read_iobuf(),
            Err(DecodeError::NegativeLength(-1))
        );
    }

    #[test]
    fn test_vector_with_garbage_count_is_truncated() {
        let data = i32::MAX.to_le_bytes();
        let err = ByteReader::new(&data)
            .read_vector(|r| r.read_i64())
            .unwrap_err();
        assert!(err.is_truncated());
    }

    #[test]
    fn test_read_rest() {
        let data = [1, 2, 3, 4];
        let mut r = ByteReader::new(&data);
        r.read_u8().unwrap();
        assert_eq!(r.read_rest(), &[2, 3, 4]);
        assert!(r.is_empty());
        assert_eq!(r.read_rest(), &[] as &[u8]);
    }
}

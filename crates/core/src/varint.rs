//! Zigzag varint codec
//!
//! Signed integers are zigzag-mapped to unsigned (0 → 0, -1 → 1, 1 → 2, ...)
//! and written as little-endian 7-bit groups. The high bit of each byte is
//! the continuation flag.

use crate::error::{DecodeError, DecodeResult};

/// Longest encoding of a 64-bit value
pub const MAX_VARINT_LEN: usize = 10;

/// Map a signed value onto the unsigned zigzag space
pub fn zigzag_encode(value: i64) -> u64 {
    ((value << 1) ^ (value >> 63)) as u64
}

/// Inverse of [`zigzag_encode`]
pub fn zigzag_decode(value: u64) -> i64 {
    ((value >> 1) as i64) ^ -((value & 1) as i64)
}

/// Append the zigzag varint encoding of `value` to `buf`.
pub fn encode_varint(value: i64, buf: &mut Vec<u8>) {
    encode_uvarint(zigzag_encode(value), buf);
}

/// Append the plain (non-zigzag) varint encoding of `value` to `buf`.
pub fn encode_uvarint(mut value: u64, buf: &mut Vec<u8>) {
    loop {
        let byte = (value & 0x7F) as u8;
        value >>= 7;
        if value == 0 {
            buf.push(byte);
            break;
        }
        buf.push(byte | 0x80);
    }
}

/// Decode a zigzag varint from the front of `data`.
///
/// Returns `(value, bytes_consumed)`.
pub fn decode_varint(data: &[u8]) -> DecodeResult<(i64, usize)> {
    let (raw, consumed) = decode_uvarint(data)?;
    Ok((zigzag_decode(raw), consumed))
}

/// Decode a plain varint from the front of `data`.
pub fn decode_uvarint(data: &[u8]) -> DecodeResult<(u64, usize)> {
    let mut result: u64 = 0;
    let mut shift = 0u32;

    for (i, &byte) in data.iter().enumerate() {
        if i >= MAX_VARINT_LEN {
            return Err(DecodeError::VarintOverflow);
        }
        result |= u64::from(byte & 0x7F) << shift;
        if byte & 0x80 == 0 {
            return Ok((result, i + 1));
        }
        shift += 7;
    }

    if data.len() >= MAX_VARINT_LEN {
        return Err(DecodeError::VarintOverflow);
    }
    Err(DecodeError::Truncated {
        needed: data.len() + 1,
        available: data.len(),
    })
}

/// Number of bytes the zigzag encoding of `value` occupies.
pub fn varint_len(value: i64) -> usize {
    let mut v = zigzag_encode(value);
    let mut len = 1;
    while v >= 0x80 {
        v >>= 7;
        len += 1;
    }
    len
}

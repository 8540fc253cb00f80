//! Core decoding primitives for rplog
//!
//! This crate holds the pieces every on-disk format in the workspace is
//! built from:
//! - ByteReader: forward-only little-endian cursor over a byte slice
//! - ByteWriter: the encoding counterpart, used to build fixtures and for
//!   round-trip checks
//! - Zigzag varints (LEB128 groups)
//! - CRC32C (Castagnoli) incremental hasher
//! - Ntp: namespace/topic/partition identity and its wire encoding
//! - DecodeError: the truncation/format error shared by all decoders

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod checksum;
pub mod error;
pub mod ntp;
pub mod reader;
pub mod varint;
pub mod writer;

pub use checksum::{crc32c, Crc32c};
pub use error::{DecodeError, DecodeResult};
pub use ntp::{Ntp, NtpParseError};
pub use reader::ByteReader;
pub use writer::ByteWriter;

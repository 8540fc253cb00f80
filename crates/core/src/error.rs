//! Error types for binary decoding
//!
//! Every decoder in the workspace reports structural problems through
//! [`DecodeError`]. Whether a truncation is fatal is decided by the caller:
//! at a batch boundary it means "end of data", inside a record it means the
//! file is malformed.

use thiserror::Error;

/// Result type alias for decode operations
pub type DecodeResult<T> = std::result::Result<T, DecodeError>;

/// Structural decode failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Fewer bytes remain than the field being decoded requires
    #[error("Truncated input: needed {needed} bytes, {available} available")]
    Truncated {
        /// Bytes the field requires
        needed: usize,
        /// Bytes left in the input
        available: usize,
    },

    /// A varint ran past 10 bytes without a terminating group
    #[error("Varint does not fit in 64 bits")]
    VarintOverflow,

    /// A length or count prefix decoded to a negative number
    #[error("Negative length prefix: {0}")]
    NegativeLength(i64),

    /// A string field is not valid UTF-8
    #[error("Invalid UTF-8 in string field")]
    InvalidUtf8,
}

impl DecodeError {
    /// Check whether this error is a truncation
    pub fn is_truncated(&self) -> bool {
        matches!(self, DecodeError::Truncated { .. })
    }
}

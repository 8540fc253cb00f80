//! CRC32C (Castagnoli) checksums
//!
//! Batch headers and bodies are protected by CRC32C, not the IEEE CRC32
//! used elsewhere. [`Crc32c`] mirrors the `crc32fast::Hasher` shape so a
//! checksum can be fed from several buffers in sequence.

/// Compute the CRC32C of a single buffer.
pub fn crc32c(data: &[u8]) -> u32 {
    crc32c::crc32c(data)
}

/// Incremental CRC32C hasher.
#[derive(Debug, Clone, Copy, Default)]
pub struct Crc32c {
    state: u32,
}

impl Crc32c {
    /// Create a hasher with an empty state.
    pub fn new() -> Self {
        Crc32c { state: 0 }
    }

    /// Continue the checksum over `data`.
    pub fn update(&mut self, data: &[u8]) {
        self.state = crc32c::crc32c_append(self.state, data);
    }

    /// Return the checksum of everything fed so far.
    pub fn finalize(self) -> u32 {
        self.state
    }
}

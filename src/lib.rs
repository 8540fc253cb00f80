//! rplog - offline decoder for partition logs and the replicated kvstore
//!
//! Reads the on-disk data of a node after the fact: segment files of
//! checksummed record batches, partition snapshots, and the kvstore state
//! rebuilt from both.
//!
//! # Quick Start
//!
//! ```ignore
//! use rplog::{KvStore, LogDir, ReaderConfig};
//!
//! let log = LogDir::scan(Path::new("/var/lib/redpanda/data"), &ReaderConfig::default())?;
//! for partition in log.topic("redpanda", "kvstore") {
//!     let state = KvStore::new(partition.clone()).decode()?;
//!     for item in state.items() {
//!         println!("{} => {}", item.key, item.value);
//!     }
//! }
//! ```
//!
//! # Architecture
//!
//! - [`primitives`]: byte reader/writer, varints, CRC32C, NTP
//! - [`durability`]: batch, segment and snapshot formats, directory layout
//! - [`kvstore`]: typed kvstore keys and values, store reconstruction

pub use rplog_core as primitives;
pub use rplog_durability as durability;
pub use rplog_kvstore as kvstore;

pub use rplog_core::{ByteReader, ByteWriter, DecodeError, Ntp};
pub use rplog_durability::{
    Batch, BatchError, BatchHeader, LogDir, PartitionDir, ReaderConfig, Record, Segment, Snapshot,
};
pub use rplog_kvstore::{
    DecodedKey, DecodedValue, KeySpace, KvItem, KvState, KvStore, KvStoreConfig, KvStoreError,
};

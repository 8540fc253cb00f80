//! Kvstore decoding for rplog
//!
//! Turns the records of kvstore batches into typed keys and values and
//! rebuilds the store of a partition from its snapshot and segments:
//!
//! - KeySpace, DecodedKey, DecodedValue: typed views with raw fallbacks
//! - ConfigDecoder: pluggable decoder for raft configuration values
//! - KvSnapshot: the snapshot-embedded state batch
//! - KvStore: snapshot bootstrap followed by last-writer-wins replay

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod entry;
pub mod error;
pub mod key;
pub mod keyspace;
pub mod raft_config;
pub mod snapshot;
pub mod store;
pub mod testing;
pub mod value;

pub use config::{KvStoreConfig, KVSTORE_BATCH_TYPE};
pub use entry::KvEntry;
pub use error::KvStoreError;
pub use key::{ConsensusKeyType, DecodedKey, KeyData, StorageKeyType};
pub use keyspace::KeySpace;
pub use raft_config::{ConfigDecoder, RaftConfig, RaftConfigDecoder, Vnode};
pub use snapshot::{KvSnapshot, SnapshotBatch};
pub use store::{KvItem, KvState, KvStore, ReplayStats};
pub use value::DecodedValue;

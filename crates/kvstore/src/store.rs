//! Kvstore reconstruction.
//!
//! Builds the state of one kvstore partition in two strictly ordered phases:
//!
//! 1. **Bootstrap**: apply every record of the snapshot batch, if a snapshot
//!    exists.
//! 2. **Replay**: apply every kvstore record of every segment in base offset
//!    order. Later records overwrite earlier ones. With
//!    [`KvStoreConfig::skip_snapshot_covered`], records at or below the
//!    snapshot's last offset are skipped instead.
//!
//! A record without a payload leaves the current value of its key in place.
//!
//! Batches of other types are skipped. A checksum or structural error aborts
//! the whole reconstruction.
//!
//! # Usage
//!
//! ```ignore
//! let store = KvStore::open(Path::new("/data/redpanda/kvstore/0_0"))?;
//! let state = store.decode()?;
//! for item in state.items() {
//!     println!("{} => {}", item.key, item.value);
//! }
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use rplog_durability::{BatchError, BatchHeader, PartitionDir, Record};
use serde::Serialize;

use crate::config::KvStoreConfig;
use crate::entry::KvEntry;
use crate::error::KvStoreError;
use crate::key::DecodedKey;
use crate::keyspace::KeySpace;
use crate::raft_config::{ConfigDecoder, RaftConfigDecoder};
use crate::snapshot::KvSnapshot;
use crate::value::DecodedValue;

/// Reconstructs the kvstore of one partition directory
pub struct KvStore {
    partition: PartitionDir,
    config: KvStoreConfig,
    configs: Box<dyn ConfigDecoder>,
}

impl KvStore {
    /// Create a store over `partition` with default configuration.
    pub fn new(partition: PartitionDir) -> Self {
        Self::with_config(partition, KvStoreConfig::default())
    }

    /// Create a store over `partition`.
    pub fn with_config(partition: PartitionDir, config: KvStoreConfig) -> Self {
        KvStore {
            partition,
            config,
            configs: Box::new(RaftConfigDecoder),
        }
    }

    /// Open the partition directory at `path`.
    pub fn open(path: &Path) -> Result<Self, KvStoreError> {
        Ok(Self::new(PartitionDir::open(path)?))
    }

    /// Replace the decoder used for `config_map` values.
    pub fn with_config_decoder(mut self, decoder: Box<dyn ConfigDecoder>) -> Self {
        self.configs = decoder;
        self
    }

    /// The partition being reconstructed.
    pub fn partition(&self) -> &PartitionDir {
        &self.partition
    }

    /// Run bootstrap and replay, returning the final state.
    pub fn decode(&self) -> Result<KvState, KvStoreError> {
        self.config.validate()?;
        tracing::info!(path = %self.partition.path.display(), "Building kvstore");

        let mut state = KvState::default();
        let watermark = self.bootstrap(&mut state)?;
        self.replay(&mut state, watermark)?;

        tracing::info!(
            keys = state.len(),
            applied = state.stats.records_applied,
            skipped = state.stats.records_skipped,
            "Kvstore replay complete"
        );
        Ok(state)
    }

    fn bootstrap(&self, state: &mut KvState) -> Result<Option<i64>, KvStoreError> {
        let Some(path) = &self.partition.snapshot else {
            tracing::warn!(
                path = %self.partition.path.display(),
                "No kvstore snapshot, replaying from the first segment"
            );
            return Ok(None);
        };

        let snapshot = KvSnapshot::read(path)?;
        tracing::debug!(last_offset = snapshot.last_offset, "Applying snapshot");

        for record in &snapshot.batch.records {
            let entry = decode_entry(&snapshot.batch.header, record)?;
            state.stats.snapshot_records += 1;
            state.apply(entry, self.configs.as_ref());
        }
        state.stats.snapshot_last_offset = Some(snapshot.last_offset);
        Ok(Some(snapshot.last_offset))
    }

    fn replay(&self, state: &mut KvState, watermark: Option<i64>) -> Result<(), KvStoreError> {
        let reader = &self.config.reader;

        for segment in &self.partition.segments {
            let segment_error = |source: BatchError| KvStoreError::Segment {
                segment: segment.path().display().to_string(),
                source,
            };
            tracing::debug!(segment = %segment.path().display(), "Replaying segment");
            state.stats.segments_read += 1;

            let batches = segment
                .batches(reader)
                .map_err(|e| segment_error(BatchError::Io(e)))?;
            for batch in batches {
                let batch = batch.map_err(segment_error)?;
                state.stats.batches_read += 1;

                if batch.batch_type() != self.config.batch_type {
                    state.stats.batches_skipped += 1;
                    continue;
                }

                for record in batch.decode_records(reader).map_err(segment_error)? {
                    let entry = decode_entry(batch.header(), &record)?;
                    state.stats.records_read += 1;

                    if let Some(w) = watermark.filter(|_| self.config.skip_snapshot_covered) {
                        if entry.offset <= w {
                            state.stats.records_skipped += 1;
                            continue;
                        }
                    }
                    state.apply(entry, self.configs.as_ref());
                    state.stats.records_applied += 1;
                }
            }
        }
        Ok(())
    }
}

fn decode_entry(header: &BatchHeader, record: &Record) -> Result<KvEntry, KvStoreError> {
    KvEntry::decode(header, record).map_err(|source| KvStoreError::Entry {
        offset: header.base_offset.wrapping_add(record.offset_delta),
        source,
    })
}

/// A decoded key and its current value
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KvItem {
    /// Decoded key
    pub key: DecodedKey,
    /// Decoded value
    pub value: DecodedValue,
    /// Offset of the write that produced the value
    #[serde(skip)]
    pub offset: i64,
    /// Time of the write that produced the value
    #[serde(skip)]
    pub ts: String,
}

/// Counters collected during reconstruction
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct ReplayStats {
    /// Last offset covered by the snapshot, if one was applied
    pub snapshot_last_offset: Option<i64>,
    /// Records applied from the snapshot
    pub snapshot_records: usize,
    /// Segments replayed
    pub segments_read: usize,
    /// Batches read from segments
    pub batches_read: usize,
    /// Batches skipped because of their type
    pub batches_skipped: usize,
    /// Kvstore records read from segments
    pub records_read: usize,
    /// Records skipped as already covered by the snapshot
    pub records_skipped: usize,
    /// Records applied from segments
    pub records_applied: usize,
    /// Records without a payload (snapshot and segments)
    pub absent_payloads: usize,
}

/// Final kvstore state
#[derive(Debug, Default, Clone)]
pub struct KvState {
    entries: BTreeMap<(KeySpace, Vec<u8>), KvItem>,
    stats: ReplayStats,
}

impl KvState {
    fn apply(&mut self, entry: KvEntry, configs: &dyn ConfigDecoder) {
        tracing::trace!(
            keyspace = %entry.keyspace,
            offset = entry.offset,
            payload = entry.has_payload(),
            "Applying kvstore entry"
        );
        let KvEntry {
            keyspace,
            key_buf,
            data,
            offset,
            ts,
            ..
        } = entry;

        match data {
            Some(data) => {
                let key = DecodedKey::decode(keyspace, &key_buf);
                let value = DecodedValue::decode(&key, &data, configs);
                self.entries.insert(
                    (keyspace, key_buf),
                    KvItem {
                        key,
                        value,
                        offset,
                        ts,
                    },
                );
            }
            None => self.stats.absent_payloads += 1,
        }
    }

    /// Every live key with its value, ordered by keyspace then key bytes.
    pub fn items(&self) -> Vec<KvItem> {
        self.entries.values().cloned().collect()
    }

    /// Iterate live items without cloning.
    pub fn iter(&self) -> impl Iterator<Item = &KvItem> {
        self.entries.values()
    }

    /// Current value of a key.
    pub fn get(&self, keyspace: KeySpace, key_buf: &[u8]) -> Option<&KvItem> {
        self.entries.get(&(keyspace, key_buf.to_vec()))
    }

    /// Number of live keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no key is live.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Reconstruction counters.
    pub fn stats(&self) -> &ReplayStats {
        &self.stats
    }
}

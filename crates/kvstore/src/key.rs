//! Key decoding per keyspace.
//!
//! A kvstore key is one keyspace byte followed by `key_buf`. Consensus keys
//! are `type (i8) + group (i64)`, storage keys are `type (i8) + ntp`. Every
//! other keyspace, and any key that fails to parse, is kept as hex.

use std::fmt;

use rplog_core::{ByteReader, ByteWriter, DecodeResult, Ntp};
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

use crate::keyspace::KeySpace;

/// Raft metadata key types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConsensusKeyType {
    /// Vote cast in the current term
    VotedFor,
    /// Offset to configuration map
    ConfigMap,
    /// Offset of the latest known configuration
    ConfigLatestKnownOffset,
    /// Last applied offset
    LastAppliedOffset,
    /// Node-local unique id
    UniqueLocalId,
    /// Next configuration index
    ConfigNextCfgIdx,
    /// Type not known to this decoder
    Unknown(i8),
}

impl ConsensusKeyType {
    /// Map a type byte.
    pub fn from_tag(tag: i8) -> Self {
        match tag {
            0 => Self::VotedFor,
            1 => Self::ConfigMap,
            2 => Self::ConfigLatestKnownOffset,
            3 => Self::LastAppliedOffset,
            4 => Self::UniqueLocalId,
            5 => Self::ConfigNextCfgIdx,
            other => Self::Unknown(other),
        }
    }

    /// The type byte.
    pub fn tag(&self) -> i8 {
        match self {
            Self::VotedFor => 0,
            Self::ConfigMap => 1,
            Self::ConfigLatestKnownOffset => 2,
            Self::LastAppliedOffset => 3,
            Self::UniqueLocalId => 4,
            Self::ConfigNextCfgIdx => 5,
            Self::Unknown(tag) => *tag,
        }
    }

    /// Name used in listings.
    pub fn name(&self) -> &'static str {
        match self {
            Self::VotedFor => "voted_for",
            Self::ConfigMap => "config_map",
            Self::ConfigLatestKnownOffset => "config_latest_known_offset",
            Self::LastAppliedOffset => "last_applied_offset",
            Self::UniqueLocalId => "unique_local_id",
            Self::ConfigNextCfgIdx => "config_next_cfg_idx",
            Self::Unknown(_) => "unknown",
        }
    }
}

/// Storage metadata key types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKeyType {
    /// Log start offset of a partition
    StartOffset,
    /// Type not known to this decoder
    Unknown(i8),
}

impl StorageKeyType {
    /// Map a type byte.
    pub fn from_tag(tag: i8) -> Self {
        match tag {
            0 => Self::StartOffset,
            other => Self::Unknown(other),
        }
    }

    /// The type byte.
    pub fn tag(&self) -> i8 {
        match self {
            Self::StartOffset => 0,
            Self::Unknown(tag) => *tag,
        }
    }

    /// Name used in listings.
    pub fn name(&self) -> &'static str {
        match self {
            Self::StartOffset => "start_offset",
            Self::Unknown(_) => "unknown",
        }
    }
}

/// Keyspace-specific key payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyData {
    /// Raft metadata key of a raft group
    Consensus {
        /// Key type
        key_type: ConsensusKeyType,
        /// Raft group id
        group: i64,
    },
    /// Storage metadata key of a partition
    Storage {
        /// Key type
        key_type: StorageKeyType,
        /// Partition the key belongs to
        ntp: Ntp,
    },
    /// Undecoded key bytes
    Raw(Vec<u8>),
}

impl Serialize for KeyData {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            KeyData::Consensus { key_type, group } => {
                let mut s = serializer.serialize_struct("ConsensusKey", 3)?;
                s.serialize_field("type", &key_type.tag())?;
                s.serialize_field("name", key_type.name())?;
                s.serialize_field("group", group)?;
                s.end()
            }
            KeyData::Storage { key_type, ntp } => {
                let mut s = serializer.serialize_struct("StorageKey", 3)?;
                s.serialize_field("type", &key_type.tag())?;
                s.serialize_field("name", key_type.name())?;
                s.serialize_field("ntp", ntp)?;
                s.end()
            }
            KeyData::Raw(bytes) => serializer.serialize_str(&hex::encode(bytes)),
        }
    }
}

/// A decoded kvstore key
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecodedKey {
    /// Keyspace of the key
    pub keyspace: KeySpace,
    /// Decoded payload
    pub data: KeyData,
}

impl DecodedKey {
    /// Decode `key_buf` (the key without its keyspace byte).
    ///
    /// Never fails: keys that do not parse are kept raw.
    pub fn decode(keyspace: KeySpace, key_buf: &[u8]) -> Self {
        let parsed = match keyspace {
            KeySpace::Consensus => decode_consensus(key_buf),
            KeySpace::Storage => decode_storage(key_buf),
            _ => Ok(KeyData::Raw(key_buf.to_vec())),
        };
        let data = parsed.unwrap_or_else(|e| {
            tracing::debug!(%keyspace, error = %e, "Keeping undecodable key as raw bytes");
            KeyData::Raw(key_buf.to_vec())
        });
        DecodedKey { keyspace, data }
    }

    /// Key layout for the consensus keyspace.
    pub fn consensus(key_type: ConsensusKeyType, group: i64) -> Self {
        DecodedKey {
            keyspace: KeySpace::Consensus,
            data: KeyData::Consensus { key_type, group },
        }
    }

    /// Key layout for the storage keyspace.
    pub fn storage(key_type: StorageKeyType, ntp: Ntp) -> Self {
        DecodedKey {
            keyspace: KeySpace::Storage,
            data: KeyData::Storage { key_type, ntp },
        }
    }

    /// Encode back to the full key bytes, keyspace byte included.
    pub fn encode(&self) -> Vec<u8> {
        let mut w = ByteWriter::new();
        w.write_i8(self.keyspace.tag());
        match &self.data {
            KeyData::Consensus { key_type, group } => {
                w.write_i8(key_type.tag());
                w.write_i64(*group);
            }
            KeyData::Storage { key_type, ntp } => {
                w.write_i8(key_type.tag());
                ntp.encode(&mut w);
            }
            KeyData::Raw(bytes) => w.write_bytes(bytes),
        }
        w.into_inner()
    }
}

impl fmt::Display for DecodedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.data {
            KeyData::Consensus { key_type, group } => {
                write!(f, "{} {} group={}", self.keyspace, key_type.name(), group)
            }
            KeyData::Storage { key_type, ntp } => {
                write!(f, "{} {} ntp={}", self.keyspace, key_type.name(), ntp)
            }
            KeyData::Raw(bytes) => write!(f, "{} {}", self.keyspace, hex::encode(bytes)),
        }
    }
}

fn decode_consensus(key_buf: &[u8]) -> DecodeResult<KeyData> {
    let mut r = ByteReader::new(key_buf);
    let key_type = ConsensusKeyType::from_tag(r.read_i8()?);
    let group = r.read_i64()?;
    Ok(KeyData::Consensus { key_type, group })
}

fn decode_storage(key_buf: &[u8]) -> DecodeResult<KeyData> {
    let mut r = ByteReader::new(key_buf);
    let key_type = StorageKeyType::from_tag(r.read_i8()?);
    let ntp = Ntp::decode(&mut r)?;
    Ok(KeyData::Storage { key_type, ntp })
}

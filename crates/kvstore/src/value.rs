//! Value decoding, dispatched on the decoded key.

use std::collections::BTreeMap;
use std::fmt;

use rplog_core::{ByteReader, DecodeResult};
use serde::{Serialize, Serializer};

use crate::key::{ConsensusKeyType, DecodedKey, KeyData, StorageKeyType};
use crate::raft_config::{ConfigDecoder, Vnode};

/// A decoded kvstore value
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedValue {
    /// `voted_for`
    VotedFor {
        /// Node voted for
        vnode: Vnode,
        /// Term of the vote
        term: i64,
    },
    /// `config_map`: configuration per offset
    ConfigMap(BTreeMap<i64, serde_json::Value>),
    /// Single offset or index
    Offset(i64),
    /// Key type without a payload (`unique_local_id`)
    Empty,
    /// Undecoded value bytes
    Raw(Vec<u8>),
}

impl DecodedValue {
    /// Decode `value` for `key`.
    ///
    /// Never fails: unknown key types and values that do not parse are kept
    /// raw.
    pub fn decode(key: &DecodedKey, value: &[u8], configs: &dyn ConfigDecoder) -> Self {
        let parsed = match &key.data {
            KeyData::Consensus { key_type, .. } => decode_consensus(*key_type, value, configs),
            KeyData::Storage {
                key_type: StorageKeyType::StartOffset,
                ..
            } => read_offset(value),
            _ => return DecodedValue::Raw(value.to_vec()),
        };
        parsed.unwrap_or_else(|e| {
            tracing::debug!(key = %key, error = %e, "Keeping undecodable value as raw bytes");
            DecodedValue::Raw(value.to_vec())
        })
    }
}

fn decode_consensus(
    key_type: ConsensusKeyType,
    value: &[u8],
    configs: &dyn ConfigDecoder,
) -> DecodeResult<DecodedValue> {
    let mut r = ByteReader::new(value);
    match key_type {
        ConsensusKeyType::VotedFor => Ok(DecodedValue::VotedFor {
            vnode: Vnode::decode(&mut r)?,
            term: r.read_i64()?,
        }),
        ConsensusKeyType::ConfigMap => {
            let count = r.read_u64()?;
            let mut map = BTreeMap::new();
            for _ in 0..count {
                let offset = r.read_i64()?;
                map.insert(offset, configs.decode_config(&mut r)?);
            }
            Ok(DecodedValue::ConfigMap(map))
        }
        ConsensusKeyType::ConfigLatestKnownOffset
        | ConsensusKeyType::LastAppliedOffset
        | ConsensusKeyType::ConfigNextCfgIdx => Ok(DecodedValue::Offset(r.read_i64()?)),
        ConsensusKeyType::UniqueLocalId => Ok(DecodedValue::Empty),
        ConsensusKeyType::Unknown(_) => Ok(DecodedValue::Raw(value.to_vec())),
    }
}

fn read_offset(value: &[u8]) -> DecodeResult<DecodedValue> {
    Ok(DecodedValue::Offset(ByteReader::new(value).read_i64()?))
}

impl Serialize for DecodedValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct VotedFor<'a> {
            vnode: &'a Vnode,
            term: i64,
        }

        match self {
            DecodedValue::VotedFor { vnode, term } => {
                VotedFor { vnode, term: *term }.serialize(serializer)
            }
            DecodedValue::ConfigMap(map) => map.serialize(serializer),
            DecodedValue::Offset(offset) => serializer.serialize_i64(*offset),
            DecodedValue::Empty => serializer.serialize_none(),
            DecodedValue::Raw(bytes) => serializer.serialize_str(&hex::encode(bytes)),
        }
    }
}

impl fmt::Display for DecodedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodedValue::VotedFor { vnode, term } => write!(
                f,
                "vnode={{id={}, revision={}}} term={}",
                vnode.id, vnode.revision, term
            ),
            DecodedValue::ConfigMap(map) => {
                let offsets: Vec<String> = map.keys().map(i64::to_string).collect();
                write!(f, "{} configurations at [{}]", map.len(), offsets.join(", "))
            }
            DecodedValue::Offset(offset) => write!(f, "{}", offset),
            DecodedValue::Empty => f.write_str("null"),
            DecodedValue::Raw(bytes) => f.write_str(&hex::encode(bytes)),
        }
    }
}

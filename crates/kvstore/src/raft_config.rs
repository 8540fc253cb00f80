//! Raft group configuration values.
//!
//! `config_map` values hold one serialized raft configuration per offset.
//! Decoding them is delegated to a [`ConfigDecoder`] so callers can plug in
//! a decoder for configuration versions this crate does not know.

use rplog_core::{ByteReader, ByteWriter, DecodeResult};
use serde::Serialize;

/// Decodes one serialized raft configuration.
pub trait ConfigDecoder: Send + Sync {
    /// Decode a configuration starting at the reader's position.
    fn decode_config(&self, reader: &mut ByteReader<'_>) -> DecodeResult<serde_json::Value>;
}

/// Decoder for the built-in configuration layout (versions up to 4 and later
/// layouts that only append fields)
#[derive(Debug, Clone, Copy, Default)]
pub struct RaftConfigDecoder;

impl ConfigDecoder for RaftConfigDecoder {
    fn decode_config(&self, reader: &mut ByteReader<'_>) -> DecodeResult<serde_json::Value> {
        let config = RaftConfig::decode(reader)?;
        Ok(serde_json::to_value(config).unwrap_or_default())
    }
}

/// Raft group member identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Vnode {
    /// Node id
    pub id: i32,
    /// Revision the node joined the group at
    pub revision: i64,
}

impl Vnode {
    /// Decode `id (i32) + revision (i64)`.
    pub fn decode(r: &mut ByteReader<'_>) -> DecodeResult<Self> {
        Ok(Vnode {
            id: r.read_i32()?,
            revision: r.read_i64()?,
        })
    }

    /// Encode `id (i32) + revision (i64)`.
    pub fn encode(&self, w: &mut ByteWriter) {
        w.write_i32(self.id);
        w.write_i64(self.revision);
    }
}

/// Kafka listener of a broker
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Endpoint {
    /// Listener name
    pub name: String,
    /// Advertised host
    pub address: String,
    /// Advertised port
    pub port: u16,
}

/// Broker metadata embedded in old configurations
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Broker {
    /// Node id
    pub id: i32,
    /// Kafka listeners
    pub kafka_endpoints: Vec<Endpoint>,
    /// Internal RPC host
    pub rpc_address: String,
    /// Internal RPC port
    pub rpc_port: u16,
    /// Rack, if assigned
    pub rack: Option<String>,
    /// CPU cores
    pub cores: u32,
    /// Available memory (GB)
    pub memory: u32,
    /// Available disk (GB)
    pub disk: u32,
    /// Data directory mount points
    pub mount_paths: Vec<String>,
    /// Free-form properties
    pub etc: Vec<(String, String)>,
}

/// Voters and learners of a configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GroupNodes {
    /// Voting members
    pub voters: Vec<Vnode>,
    /// Non-voting members
    pub learners: Vec<Vnode>,
}

/// In-flight membership change
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConfigurationUpdate {
    /// Replicas joining the group
    pub replicas_to_add: Vec<Vnode>,
    /// Replicas leaving the group
    pub replicas_to_remove: Vec<Vnode>,
}

/// A raft group configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RaftConfig {
    /// Layout version
    pub version: i8,
    /// Broker list (empty in recent versions)
    pub brokers: Vec<Broker>,
    /// Active configuration
    pub current_config: GroupNodes,
    /// Previous configuration during joint consensus
    pub prev_config: Option<GroupNodes>,
    /// Configuration revision
    pub revision: i64,
    /// Only present from version 4 on
    #[serde(skip_serializing_if = "Option::is_none")]
    pub configuration_update: Option<ConfigurationUpdate>,
}

/// First configuration version carrying `configuration_update`.
pub const CONFIGURATION_UPDATE_VERSION: i8 = 4;

impl RaftConfig {
    /// Decode a configuration.
    pub fn decode(r: &mut ByteReader<'_>) -> DecodeResult<Self> {
        let version = r.read_i8()?;
        let brokers = r.read_vector(read_broker)?;
        let current_config = read_group_nodes(r)?;
        let prev_config = r.read_optional(read_group_nodes)?;
        let revision = r.read_i64()?;
        let configuration_update = if version >= CONFIGURATION_UPDATE_VERSION {
            r.read_optional(|r| {
                Ok(ConfigurationUpdate {
                    replicas_to_add: r.read_vector(Vnode::decode)?,
                    replicas_to_remove: r.read_vector(Vnode::decode)?,
                })
            })?
        } else {
            None
        };

        Ok(RaftConfig {
            version,
            brokers,
            current_config,
            prev_config,
            revision,
            configuration_update,
        })
    }

    /// Encode a configuration.
    pub fn encode(&self, w: &mut ByteWriter) {
        w.write_i8(self.version);
        w.write_vector(&self.brokers, write_broker);
        write_group_nodes(w, &self.current_config);
        w.write_optional(self.prev_config.as_ref(), write_group_nodes);
        w.write_i64(self.revision);
        if self.version >= CONFIGURATION_UPDATE_VERSION {
            w.write_optional(self.configuration_update.as_ref(), |w, u| {
                w.write_vector(&u.replicas_to_add, |w, v| v.encode(w));
                w.write_vector(&u.replicas_to_remove, |w, v| v.encode(w));
            });
        }
    }
}

fn read_group_nodes(r: &mut ByteReader<'_>) -> DecodeResult<GroupNodes> {
    Ok(GroupNodes {
        voters: r.read_vector(Vnode::decode)?,
        learners: r.read_vector(Vnode::decode)?,
    })
}

fn write_group_nodes(w: &mut ByteWriter, nodes: &GroupNodes) {
    w.write_vector(&nodes.voters, |w, v| v.encode(w));
    w.write_vector(&nodes.learners, |w, v| v.encode(w));
}

fn read_broker(r: &mut ByteReader<'_>) -> DecodeResult<Broker> {
    Ok(Broker {
        id: r.read_i32()?,
        kafka_endpoints: r.read_vector(|r| {
            Ok(Endpoint {
                name: r.read_string()?,
                address: r.read_string()?,
                port: r.read_u16()?,
            })
        })?,
        rpc_address: r.read_string()?,
        rpc_port: r.read_u16()?,
        rack: r.read_optional(ByteReader::read_string)?,
        cores: r.read_u32()?,
        memory: r.read_u32()?,
        disk: r.read_u32()?,
        mount_paths: r.read_vector(ByteReader::read_string)?,
        etc: r.read_vector(|r| Ok((r.read_string()?, r.read_string()?)))?,
    })
}

fn write_broker(w: &mut ByteWriter, b: &Broker) {
    w.write_i32(b.id);
    w.write_vector(&b.kafka_endpoints, |w, e| {
        w.write_string(&e.name);
        w.write_string(&e.address);
        w.write_u16(e.port);
    });
    w.write_string(&b.rpc_address);
    w.write_u16(b.rpc_port);
    w.write_optional(b.rack.as_deref(), ByteWriter::write_string);
    w.write_u32(b.cores);
    w.write_u32(b.memory);
    w.write_u32(b.disk);
    w.write_vector(&b.mount_paths, |w, p| w.write_string(p));
    w.write_vector(&b.etc, |w, (k, v)| {
        w.write_string(k);
        w.write_string(v);
    });
}

//! Partition identity
//!
//! An NTP names a partition by namespace, topic and partition id. It shows up
//! in two places: as the directory path `<namespace>/<topic>/<partition>_<revision>`
//! and serialized inside kvstore keys as two `i32`-length strings followed by
//! an `i32` partition.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::DecodeResult;
use crate::reader::ByteReader;
use crate::writer::ByteWriter;

/// Namespace/topic/partition triple
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Ntp {
    /// Namespace (e.g. `kafka`, `redpanda`)
    pub namespace: String,
    /// Topic name
    pub topic: String,
    /// Partition id
    pub partition: i32,
}

impl Ntp {
    /// Create a new NTP.
    pub fn new(namespace: impl Into<String>, topic: impl Into<String>, partition: i32) -> Self {
        Ntp {
            namespace: namespace.into(),
            topic: topic.into(),
            partition,
        }
    }

    /// Decode the serialized form.
    pub fn decode(reader: &mut ByteReader<'_>) -> DecodeResult<Self> {
        let namespace = reader.read_string()?;
        let topic = reader.read_string()?;
        let partition = reader.read_i32()?;
        Ok(Ntp {
            namespace,
            topic,
            partition,
        })
    }

    /// Encode into the serialized form.
    pub fn encode(&self, writer: &mut ByteWriter) {
        writer.write_string(&self.namespace);
        writer.write_string(&self.topic);
        writer.write_i32(self.partition);
    }
}

impl fmt::Display for Ntp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.namespace, self.topic, self.partition)
    }
}

impl FromStr for Ntp {
    type Err = NtpParseError;

    /// Parse `namespace/topic/partition`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split('/');
        let (Some(namespace), Some(topic), Some(partition), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(NtpParseError::WrongShape(s.to_string()));
        };

        if namespace.is_empty() || topic.is_empty() {
            return Err(NtpParseError::WrongShape(s.to_string()));
        }

        let partition = partition
            .parse::<i32>()
            .map_err(|_| NtpParseError::InvalidPartition(partition.to_string()))?;

        Ok(Ntp::new(namespace, topic, partition))
    }
}

/// Errors parsing an NTP from text
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NtpParseError {
    /// Not of the form `namespace/topic/partition`
    #[error("Expected namespace/topic/partition, got '{0}'")]
    WrongShape(String),

    /// Partition component is not an integer
    #[error("Invalid partition id: '{0}'")]
    InvalidPartition(String),
}

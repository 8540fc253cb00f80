//! Top-level kvstore key categories.

use std::fmt;

use serde::{Serialize, Serializer};

/// Keyspace tag stored in the first byte of every kvstore key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum KeySpace {
    /// Test-only keys
    Testing,
    /// Raft metadata
    Consensus,
    /// Storage layer metadata
    Storage,
    /// Cluster metadata
    Cluster,
    /// Tag not known to this decoder
    Unknown(i8),
}

impl KeySpace {
    /// Map a tag byte to a keyspace.
    pub fn from_tag(tag: i8) -> Self {
        match tag {
            0 => KeySpace::Testing,
            1 => KeySpace::Consensus,
            2 => KeySpace::Storage,
            3 => KeySpace::Cluster,
            other => KeySpace::Unknown(other),
        }
    }

    /// The tag byte.
    pub fn tag(&self) -> i8 {
        match self {
            KeySpace::Testing => 0,
            KeySpace::Consensus => 1,
            KeySpace::Storage => 2,
            KeySpace::Cluster => 3,
            KeySpace::Unknown(tag) => *tag,
        }
    }

    /// Lower-case name used in listings.
    pub fn name(&self) -> &'static str {
        match self {
            KeySpace::Testing => "testing",
            KeySpace::Consensus => "consensus",
            KeySpace::Storage => "storage",
            KeySpace::Cluster => "cluster",
            KeySpace::Unknown(_) => "unknown",
        }
    }
}

impl fmt::Display for KeySpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for KeySpace {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

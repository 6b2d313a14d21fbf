#![warn(missing_docs)]
//! Identity of a ring participant.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;
use sha1::Digest;
use sha1::Sha1;

use crate::dht::ChordId;
use crate::dht::IdSpace;
use crate::error::Error;
use crate::error::Result;

/// Network location of an instance, rendered as `host:port`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Address {
    /// Host name or ip literal.
    pub host: String,
    /// Port number.
    pub port: u16,
}

impl Address {
    /// Build an address from its parts.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

impl FromStr for Address {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (host, port) = s
            .rsplit_once(':')
            .ok_or_else(|| Error::InvalidAddress(s.to_string()))?;
        if host.is_empty() {
            return Err(Error::InvalidAddress(s.to_string()));
        }
        let port = port
            .parse::<u16>()
            .map_err(|_| Error::InvalidAddress(s.to_string()))?;
        Ok(Self::new(host, port))
    }
}

/// A ring participant: where it is, and where it sits on the ring.
///
/// Two nodes are equal iff both address and id match.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Node {
    /// Where the instance is reachable.
    pub address: Address,
    /// Position on the ring.
    pub id: ChordId,
}

impl Node {
    /// Build a node from an address and an already known id.
    pub fn new(address: Address, id: ChordId) -> Self {
        Self { address, id }
    }

    /// Build a node whose id is derived from its address: the first eight bytes of
    /// `sha1("host:port")`, big endian, reduced into `space`.
    pub fn from_address(address: Address, space: IdSpace) -> Self {
        let digest = Sha1::digest(address.to_string().as_bytes());
        let mut head = [0u8; 8];
        head.copy_from_slice(&digest[..8]);
        let id = space.constrain(u64::from_be_bytes(head) as i128);
        Self { address, id }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.id, self.address)
    }
}

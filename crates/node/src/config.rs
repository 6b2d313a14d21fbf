//! Node configuration file.
#![allow(missing_docs)]
use std::fs;
use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use chordring_core::consts::DEFAULT_MAX_LOOKUP_HOPS;
use chordring_core::consts::DEFAULT_MAX_UPDATE_HOPS;
use chordring_core::consts::DEFAULT_RING_BITS;
use chordring_core::dht::Address;
use chordring_core::dht::ChordConfig;
use chordring_core::dht::ChordId;
use chordring_core::dht::IdSpace;
use chordring_core::dht::Node;
use serde::Deserialize;
use serde::Serialize;

use crate::error::Error;
use crate::error::Result;
use crate::util::ensure_parent_dir;
use crate::util::expand_home;

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:50000";
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 5000;
pub const DEFAULT_CONFIG_LOCATION: &str = "~/.chordring/config.yaml";

fn default_ring_bits() -> u8 {
    DEFAULT_RING_BITS
}

fn default_bind_addr() -> String {
    DEFAULT_BIND_ADDR.to_string()
}

fn default_max_lookup_hops() -> usize {
    DEFAULT_MAX_LOOKUP_HOPS
}

fn default_max_update_hops() -> usize {
    DEFAULT_MAX_UPDATE_HOPS
}

fn default_request_timeout_ms() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_MS
}

/// Where to enter an existing ring.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct BootstrapConfig {
    pub address: String,
    /// Resolved by asking the bootstrap when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// Ring size `m`, must match every other member.
    #[serde(default = "default_ring_bits")]
    pub ring_bits: u8,
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    /// Address announced to peers, defaults to the bound address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_addr: Option<String>,
    /// Derived from the announced address when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_id: Option<u64>,
    /// Start a new ring when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bootstrap: Option<BootstrapConfig>,
    #[serde(default = "default_max_lookup_hops")]
    pub max_lookup_hops: usize,
    #[serde(default = "default_max_update_hops")]
    pub max_update_hops: usize,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ring_bits: DEFAULT_RING_BITS,
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            external_addr: None,
            node_id: None,
            bootstrap: None,
            max_lookup_hops: DEFAULT_MAX_LOOKUP_HOPS,
            max_update_hops: DEFAULT_MAX_UPDATE_HOPS,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
        }
    }
}

impl Config {
    pub fn write_fs<P>(&self, path: P) -> Result<String>
    where P: AsRef<std::path::Path> {
        let path = expand_home(path)?;
        ensure_parent_dir(&path)?;
        let f =
            fs::File::create(path.as_path()).map_err(|e| Error::CreateFileError(e.to_string()))?;
        let f_writer = io::BufWriter::new(f);
        serde_yaml::to_writer(f_writer, self)?;
        Ok(path.to_string_lossy().to_string())
    }

    pub fn read_fs<P>(path: P) -> Result<Config>
    where P: AsRef<std::path::Path> {
        let path = expand_home(path)?;
        tracing::debug!("Read config from: {:?}", path);
        let f = fs::File::open(path).map_err(|e| Error::OpenFileError(e.to_string()))?;
        let f_rdr = io::BufReader::new(f);
        Ok(serde_yaml::from_reader(f_rdr)?)
    }

    pub fn chord_config(&self) -> Result<ChordConfig> {
        Ok(ChordConfig {
            space: IdSpace::new(self.ring_bits)?,
            max_lookup_hops: self.max_lookup_hops,
            max_update_hops: self.max_update_hops,
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Identity announced to the ring once the listener is bound at `bound`.
    pub fn node(&self, bound: SocketAddr) -> Result<Node> {
        let space = IdSpace::new(self.ring_bits)?;
        let address = match &self.external_addr {
            Some(addr) => addr.parse::<Address>()?,
            None => Address::new(bound.ip().to_string(), bound.port()),
        };
        match self.node_id {
            Some(id) => {
                let id = space.validate(ChordId(id))?;
                Ok(Node::new(address, id))
            }
            None => Ok(Node::from_address(address, space)),
        }
    }

    pub fn bootstrap_address(&self) -> Result<Option<Address>> {
        match &self.bootstrap {
            Some(b) => Ok(Some(b.address.parse::<Address>()?)),
            None => Ok(None),
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.chord_config()?;
        self.bootstrap_address()?;
        if self.request_timeout_ms == 0 {
            return Err(Error::InvalidConfig(
                "request_timeout_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

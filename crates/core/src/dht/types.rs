#![warn(missing_docs)]
//! Traits and shared types of the ring protocol.
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde::Serialize;

use crate::consts::DEFAULT_MAX_LOOKUP_HOPS;
use crate::consts::DEFAULT_MAX_UPDATE_HOPS;
use crate::dht::ChordId;
use crate::dht::FingerEntry;
use crate::dht::IdSpace;
use crate::dht::Node;
use crate::error::Result;

/// Operations a ring instance exposes to its peers.
///
/// Every cross-instance interaction of the protocol goes through this trait, so the
/// protocol code never reads another instance's fields directly. It is implemented by
/// [ChordInstance](super::ChordInstance) itself for in-process rings and by network
/// clients for remote instances.
#[async_trait]
pub trait ChordPeer: Send + Sync {
    /// Identity of the instance behind this handle.
    async fn get_node(&self) -> Result<Node>;

    /// Resolve the node owning `id`.
    async fn find_successor(&self, id: ChordId) -> Result<Node>;

    /// The peer's `finger[0].successor`.
    async fn get_successor(&self) -> Result<Node>;

    /// The peer's predecessor link.
    async fn get_predecessor(&self) -> Result<Node>;

    /// Overwrite the peer's successor, which is also its finger slot 0.
    async fn set_successor(&self, node: Node) -> Result<()>;

    /// Overwrite the peer's predecessor link.
    async fn set_predecessor(&self, node: Node) -> Result<()>;

    /// Highest finger of the peer strictly between the peer and `id`.
    async fn closest_preceding_node(&self, id: ChordId) -> Result<Node>;

    /// Offer `candidate` for finger slot `index`.
    ///
    /// Returns the next peer the same offer must be forwarded to, or `None` when the
    /// propagation stops here. Forwarding is left to the caller.
    async fn update_finger_table(&self, candidate: Node, index: usize) -> Result<Option<Node>>;

    /// Snapshot of the peer's finger table.
    async fn get_finger_table(&self) -> Result<Vec<FingerEntry>>;

    /// Liveness probe.
    async fn is_alive(&self) -> Result<bool>;
}

/// Resolve a [Node] into a callable [ChordPeer] handle.
#[async_trait]
pub trait PeerConnector: Send + Sync {
    /// Get a handle for `node`.
    async fn connect(&self, node: &Node) -> Result<Arc<dyn ChordPeer>>;
}

/// Lifecycle of an instance with respect to ring membership.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum JoinPhase {
    /// Constructed, links point at itself, `join` not called yet.
    Unattached,
    /// `join` is running.
    Joining,
    /// Part of a ring.
    Attached,
}

impl fmt::Display for JoinPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JoinPhase::Unattached => "unattached",
            JoinPhase::Joining => "joining",
            JoinPhase::Attached => "attached",
        };
        write!(f, "{}", s)
    }
}

/// Protocol parameters of an instance.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChordConfig {
    /// Identifier space, shared by every member of the ring.
    pub space: IdSpace,
    /// Upper bound of `find_predecessor` iterations.
    pub max_lookup_hops: usize,
    /// Upper bound of peers visited by one finger update propagation.
    pub max_update_hops: usize,
}

impl Default for ChordConfig {
    fn default() -> Self {
        Self {
            space: IdSpace::default(),
            max_lookup_hops: DEFAULT_MAX_LOOKUP_HOPS,
            max_update_hops: DEFAULT_MAX_UPDATE_HOPS,
        }
    }
}

impl ChordConfig {
    /// Defaults over a `bits`-bit ring.
    pub fn with_bits(bits: u8) -> Result<Self> {
        Ok(Self {
            space: IdSpace::new(bits)?,
            ..Default::default()
        })
    }
}

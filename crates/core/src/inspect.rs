//! Serializable snapshots of ring state.
#![allow(missing_docs)]
use serde::Deserialize;
use serde::Serialize;

use crate::dht::ChordInstance;
use crate::dht::ChordPeer;
use crate::dht::FingerEntry;
use crate::dht::JoinPhase;
use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RingInspect {
    pub node: String,
    pub id: u64,
    /// Only known for instances in the same process.
    #[serde(default)]
    pub phase: Option<JoinPhase>,
    pub successor: String,
    pub predecessor: String,
    pub finger_table: Vec<FingerInspect>,
    /// Runs of consecutive slots sharing a successor: `(successor, first slot, count)`.
    pub finger_runs: Vec<(String, u64, u64)>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FingerInspect {
    pub start: u64,
    pub successor: String,
    pub successor_id: u64,
}

impl From<&FingerEntry> for FingerInspect {
    fn from(entry: &FingerEntry) -> Self {
        Self {
            start: entry.start.0,
            successor: entry.successor.to_string(),
            successor_id: entry.successor.id.0,
        }
    }
}

impl RingInspect {
    /// Snapshot an instance of this process.
    pub fn inspect(instance: &ChordInstance) -> Result<Self> {
        let state = instance.lock_state()?;
        let finger = state.finger.list();
        Ok(Self {
            node: instance.node().to_string(),
            id: instance.node().id.0,
            phase: Some(state.phase),
            successor: state.finger.first().to_string(),
            predecessor: state.predecessor.to_string(),
            finger_table: finger.iter().map(FingerInspect::from).collect(),
            finger_runs: compress_iter(finger.iter().map(|e| e.successor.to_string())),
        })
    }

    /// Snapshot any peer through its channel operations.
    pub async fn inspect_peer(peer: &dyn ChordPeer) -> Result<Self> {
        let node = peer.get_node().await?;
        let successor = peer.get_successor().await?;
        let predecessor = peer.get_predecessor().await?;
        let finger = peer.get_finger_table().await?;
        Ok(Self {
            node: node.to_string(),
            id: node.id.0,
            phase: None,
            successor: successor.to_string(),
            predecessor: predecessor.to_string(),
            finger_table: finger.iter().map(FingerInspect::from).collect(),
            finger_runs: compress_iter(finger.iter().map(|e| e.successor.to_string())),
        })
    }
}

impl ChordInstance {
    /// Snapshot of this instance, see [RingInspect].
    pub fn inspect(&self) -> Result<RingInspect> {
        RingInspect::inspect(self)
    }
}

pub fn compress_iter<T>(iter: impl Iterator<Item = T>) -> Vec<(T, u64, u64)>
where T: PartialEq {
    let mut result: Vec<(T, u64, u64)> = vec![];
    for (i, item) in iter.enumerate() {
        match result.last_mut() {
            Some((last, _, count)) if *last == item => *count += 1,
            _ => result.push((item, i as u64, 1)),
        }
    }
    result
}

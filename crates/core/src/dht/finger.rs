#![warn(missing_docs)]
use std::fmt;
use std::ops::Index;

use serde::Deserialize;
use serde::Serialize;

use crate::dht::is_between;
use crate::dht::Bounds;
use crate::dht::ChordId;
use crate::dht::IdSpace;
use crate::dht::Node;
use crate::error::Error;
use crate::error::Result;

/// One slot of a finger table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FingerEntry {
    /// `owner.id + 2^i`, fixed when the table is created.
    pub start: ChordId,
    /// Node currently believed to own `start`.
    pub successor: Node,
}

/// Finger table of a Chord instance.
///
/// Exactly `m` slots; slot `i` covers ids starting at `owner.id + 2^i`.
/// Slot 0 doubles as the immediate successor of the owner.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FingerTable {
    owner: Node,
    finger: Vec<FingerEntry>,
}

impl FingerTable {
    /// Build the trivial table of an unjoined instance: every slot points at `owner`.
    pub fn new(owner: Node, space: IdSpace) -> Self {
        let finger = (0..space.bits() as usize)
            .map(|i| FingerEntry {
                start: space.add_pow2(owner.id, i),
                successor: owner.clone(),
            })
            .collect();
        Self { owner, finger }
    }

    /// Node owning this table.
    pub fn owner(&self) -> &Node {
        &self.owner
    }

    /// Number of slots, always `m`.
    pub fn len(&self) -> usize {
        self.finger.len()
    }

    /// is empty
    pub fn is_empty(&self) -> bool {
        self.finger.is_empty()
    }

    /// getter
    pub fn get(&self, index: usize) -> Option<&FingerEntry> {
        self.finger.get(index)
    }

    /// Start id of slot `index`.
    pub fn start(&self, index: usize) -> Result<ChordId> {
        self.entry(index).map(|e| e.start)
    }

    /// Successor recorded in slot `index`.
    pub fn successor(&self, index: usize) -> Result<&Node> {
        self.entry(index).map(|e| &e.successor)
    }

    fn entry(&self, index: usize) -> Result<&FingerEntry> {
        self.finger.get(index).ok_or(Error::FingerIndexOutOfRange {
            index,
            size: self.finger.len(),
        })
    }

    /// setter
    pub fn set(&mut self, index: usize, node: Node) -> Result<()> {
        let size = self.finger.len();
        let entry = self
            .finger
            .get_mut(index)
            .ok_or(Error::FingerIndexOutOfRange { index, size })?;
        tracing::debug!(
            "{} set finger[{}] (start {}) from {} to {}",
            self.owner,
            index,
            entry.start,
            entry.successor,
            node
        );
        entry.successor = node;
        Ok(())
    }

    /// The immediate successor, slot 0.
    pub fn first(&self) -> &Node {
        // new() always creates m >= 1 slots
        &self.finger[0].successor
    }

    /// Point every slot at `node`.
    pub fn fill(&mut self, node: &Node) {
        for entry in self.finger.iter_mut() {
            entry.successor = node.clone();
        }
    }

    /// get finger list
    pub fn list(&self) -> &[FingerEntry] {
        &self.finger
    }

    /// Highest finger strictly between the owner and `id`, or the owner itself.
    ///
    /// A slot pointing back at the owner never qualifies, even when the interval
    /// `(owner, id)` degenerates to the whole ring.
    pub fn closest_preceding(&self, id: ChordId) -> &Node {
        for entry in self.finger.iter().rev() {
            let candidate = &entry.successor;
            if candidate.id == self.owner.id {
                continue;
            }
            if is_between(candidate.id, self.owner.id, id, Bounds::Open) {
                return candidate;
            }
        }
        &self.owner
    }
}

impl Index<usize> for FingerTable {
    type Output = FingerEntry;
    fn index(&self, index: usize) -> &Self::Output {
        &self.finger[index]
    }
}

impl fmt::Display for FingerTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "finger table of {}", self.owner)?;
        writeln!(f, "{:>5} {:>20}  successor", "slot", "start")?;
        for (i, entry) in self.finger.iter().enumerate() {
            writeln!(f, "{:>5} {:>20}  {}", i, entry.start, entry.successor)?;
        }
        Ok(())
    }
}

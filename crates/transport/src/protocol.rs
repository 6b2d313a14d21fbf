//! Messages of the peer channel, one variant per peer operation.
#![allow(missing_docs)]
use chordring_core::dht::ChordId;
use chordring_core::dht::FingerEntry;
use chordring_core::dht::Node;
use serde::Deserialize;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Request {
    GetNode,
    FindSuccessor(ChordId),
    GetSuccessor,
    GetPredecessor,
    SetSuccessor(Node),
    SetPredecessor(Node),
    ClosestPrecedingNode(ChordId),
    UpdateFingerTable { candidate: Node, index: u32 },
    GetFingerTable,
    IsAlive,
}

impl Request {
    /// Operation name, for logs and errors.
    pub fn name(&self) -> &'static str {
        match self {
            Request::GetNode => "get_node",
            Request::FindSuccessor(_) => "find_successor",
            Request::GetSuccessor => "get_successor",
            Request::GetPredecessor => "get_predecessor",
            Request::SetSuccessor(_) => "set_successor",
            Request::SetPredecessor(_) => "set_predecessor",
            Request::ClosestPrecedingNode(_) => "closest_preceding_node",
            Request::UpdateFingerTable { .. } => "update_finger_table",
            Request::GetFingerTable => "get_finger_table",
            Request::IsAlive => "is_alive",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Response {
    Node(Node),
    MaybeNode(Option<Node>),
    FingerTable(Vec<FingerEntry>),
    Alive(bool),
    Done,
    Error(String),
}

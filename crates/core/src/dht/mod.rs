#![warn(missing_docs)]
//! Implementation of the Chord ring, ref: <https://pdos.csail.mit.edu/papers/ton:chord/paper-ton.pdf>
//! A lookup contacts O(log N) instances of an N-instance ring with high probability.

mod chord;
/// Finger table of an instance.
pub mod finger;
pub mod id;
mod local;
pub mod node;
mod types;

pub use chord::ChordInstance;
pub use finger::FingerEntry;
pub use finger::FingerTable;
pub use id::is_between;
pub use id::Bounds;
pub use id::ChordId;
pub use id::IdSpace;
pub use local::LocalNetwork;
pub use node::Address;
pub use node::Node;
pub use types::ChordConfig;
pub use types::ChordPeer;
pub use types::JoinPhase;
pub use types::PeerConnector;

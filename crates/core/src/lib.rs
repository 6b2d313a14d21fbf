#![warn(missing_docs)]
//! Chord ring membership and routing.
//!
//! A ring is made of [ChordInstance](dht::ChordInstance)s, each owning one slice of an
//! m-bit circular identifier space. Every instance keeps a [FingerTable](dht::FingerTable)
//! so that `find_successor` resolves in O(log N) hops, and new instances enter the ring
//! through the join protocol, which initializes their own table and propagates the
//! necessary updates to the finger tables of existing members.
//!
//! Instances talk to each other only through the [ChordPeer](dht::ChordPeer) trait, so
//! the same protocol code runs with every instance in one process
//! ([LocalNetwork](dht::LocalNetwork)) or with each instance behind a network service.
//!
//! Preconditions shared by every deployment:
//!
//! - all instances of a ring use the same ring size `m`,
//! - identifiers are unique,
//! - at most one join is in flight ring-wide.

pub mod consts;
pub mod dht;
pub mod error;
pub mod inspect;

#[cfg(test)]
mod tests;

pub use error::Error;
pub use error::Result;

//! Error of chordring_core
#![allow(missing_docs)]

use crate::consts::MAX_RING_BITS;
use crate::dht::Address;
use crate::dht::ChordId;
use crate::dht::JoinPhase;

/// A wrap `Result` contains custom errors.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors collections in chordring-core.
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("Ring bits must be within 1..={}, got {0}", MAX_RING_BITS)]
    InvalidRingBits(u8),

    #[error("Identifier {id} is outside of a {bits}-bit ring")]
    IdOutOfRange { id: u64, bits: u8 },

    #[error("Finger index {index} out of range, table size is {size}")]
    FingerIndexOutOfRange { index: usize, size: usize },

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Peer {address} is unreachable: {reason}")]
    PeerUnreachable { address: Address, reason: String },

    #[error("Peer {address} failed to serve request: {message}")]
    RemoteFailure { address: Address, message: String },

    #[error("Peer at {address} is {actual}, expected {expected}")]
    PeerIdentityMismatch {
        address: Address,
        expected: ChordId,
        actual: ChordId,
    },

    #[error("Lookup of {id} did not converge after {hops} hops")]
    RoutingDidNotConverge { id: ChordId, hops: usize },

    #[error("Finger update of slot {index} for {candidate} exceeded {hops} hops")]
    UpdateHopLimit {
        index: usize,
        candidate: ChordId,
        hops: usize,
    },

    #[error("Cannot join while instance is {0}")]
    InvalidJoinState(JoinPhase),

    #[error("Chord instance has been dropped")]
    InstanceDropped,

    #[error("Failed to lock ring state")]
    StateLock,
}

#![allow(missing_docs)]
use chordring_core::dht::Address;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Bincode error: {0}")]
    Bincode(#[from] bincode::Error),

    #[error("Frame of {0} bytes exceeds the limit of {1} bytes")]
    FrameTooLarge(usize, usize),

    #[error("Connection closed before a response arrived")]
    ConnectionClosed,

    #[error("Request timed out after {0} ms")]
    Timeout(u64),

    #[error("Unexpected response to {0}")]
    UnexpectedResponse(&'static str),

    #[error("Peer replied with error: {0}")]
    Remote(String),
}

impl Error {
    /// Map into the error seen by the ring protocol for a call to `address`.
    pub fn into_core(self, address: &Address) -> chordring_core::Error {
        match self {
            Error::Remote(message) => chordring_core::Error::RemoteFailure {
                address: address.clone(),
                message,
            },
            Error::UnexpectedResponse(op) => chordring_core::Error::RemoteFailure {
                address: address.clone(),
                message: format!("unexpected response to {}", op),
            },
            e => chordring_core::Error::PeerUnreachable {
                address: address.clone(),
                reason: e.to_string(),
            },
        }
    }
}

#![warn(missing_docs)]
#![doc = include_str!("../README.md")]
pub mod client;
pub mod error;
pub mod framing;
pub mod protocol;
pub mod server;

pub use client::RemotePeer;
pub use client::TcpConnector;
pub use server::PeerServer;

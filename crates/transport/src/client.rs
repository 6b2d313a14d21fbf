//! Reach remote ring instances.
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chordring_core::dht::Address;
use chordring_core::dht::ChordId;
use chordring_core::dht::ChordPeer;
use chordring_core::dht::FingerEntry;
use chordring_core::dht::Node;
use chordring_core::dht::PeerConnector;
use tokio::net::TcpStream;

use crate::error::Error;
use crate::error::Result;
use crate::framing;
use crate::protocol::Request;
use crate::protocol::Response;

/// Default bound of one request/response exchange.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Handle of an instance behind a [PeerServer](crate::PeerServer).
///
/// Every call opens a fresh connection, sends one request and waits for its
/// response within the timeout.
#[derive(Clone, Debug)]
pub struct RemotePeer {
    address: Address,
    timeout: Duration,
}

impl RemotePeer {
    /// Handle for the server at `address`.
    pub fn new(address: Address, timeout: Duration) -> Self {
        Self { address, timeout }
    }

    /// Address this handle talks to.
    pub fn address(&self) -> &Address {
        &self.address
    }

    /// Send `request` and wait for the response.
    pub async fn call(&self, request: Request) -> Result<Response> {
        let name = request.name();
        tracing::debug!("call {} on {}", name, self.address);
        let exchange = async {
            let mut stream =
                TcpStream::connect((self.address.host.as_str(), self.address.port)).await?;
            framing::send(&mut stream, &request).await?;
            let response = framing::recv::<_, Response>(&mut stream)
                .await?
                .ok_or(Error::ConnectionClosed)?;
            Ok::<_, Error>(response)
        };
        let response = tokio::time::timeout(self.timeout, exchange)
            .await
            .map_err(|_| Error::Timeout(self.timeout.as_millis() as u64))??;
        match response {
            Response::Error(message) => Err(Error::Remote(message)),
            response => Ok(response),
        }
    }

    async fn request(&self, request: Request) -> chordring_core::Result<Response> {
        self.call(request)
            .await
            .map_err(|e| e.into_core(&self.address))
    }

    fn unexpected(&self, op: &'static str) -> chordring_core::Error {
        Error::UnexpectedResponse(op).into_core(&self.address)
    }

    async fn request_node(&self, request: Request) -> chordring_core::Result<Node> {
        let name = request.name();
        match self.request(request).await? {
            Response::Node(node) => Ok(node),
            _ => Err(self.unexpected(name)),
        }
    }

    async fn request_done(&self, request: Request) -> chordring_core::Result<()> {
        let name = request.name();
        match self.request(request).await? {
            Response::Done => Ok(()),
            _ => Err(self.unexpected(name)),
        }
    }
}

#[async_trait]
impl ChordPeer for RemotePeer {
    async fn get_node(&self) -> chordring_core::Result<Node> {
        self.request_node(Request::GetNode).await
    }

    async fn find_successor(&self, id: ChordId) -> chordring_core::Result<Node> {
        self.request_node(Request::FindSuccessor(id)).await
    }

    async fn get_successor(&self) -> chordring_core::Result<Node> {
        self.request_node(Request::GetSuccessor).await
    }

    async fn get_predecessor(&self) -> chordring_core::Result<Node> {
        self.request_node(Request::GetPredecessor).await
    }

    async fn set_successor(&self, node: Node) -> chordring_core::Result<()> {
        self.request_done(Request::SetSuccessor(node)).await
    }

    async fn set_predecessor(&self, node: Node) -> chordring_core::Result<()> {
        self.request_done(Request::SetPredecessor(node)).await
    }

    async fn closest_preceding_node(&self, id: ChordId) -> chordring_core::Result<Node> {
        self.request_node(Request::ClosestPrecedingNode(id)).await
    }

    async fn update_finger_table(
        &self,
        candidate: Node,
        index: usize,
    ) -> chordring_core::Result<Option<Node>> {
        let request = Request::UpdateFingerTable {
            candidate,
            index: index as u32,
        };
        match self.request(request).await? {
            Response::MaybeNode(next) => Ok(next),
            _ => Err(self.unexpected("update_finger_table")),
        }
    }

    async fn get_finger_table(&self) -> chordring_core::Result<Vec<FingerEntry>> {
        match self.request(Request::GetFingerTable).await? {
            Response::FingerTable(finger) => Ok(finger),
            _ => Err(self.unexpected("get_finger_table")),
        }
    }

    async fn is_alive(&self) -> chordring_core::Result<bool> {
        match self.request(Request::IsAlive).await? {
            Response::Alive(alive) => Ok(alive),
            _ => Err(self.unexpected("is_alive")),
        }
    }
}

/// [PeerConnector] handing out [RemotePeer]s.
///
/// The identity of the remote instance is not verified here; callers that only
/// know an address resolve the id with [ChordPeer::get_node] first.
#[derive(Clone, Debug)]
pub struct TcpConnector {
    timeout: Duration,
}

impl Default for TcpConnector {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl TcpConnector {
    /// Connector whose peers use `timeout` per request.
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Handle for an address whose id is not known yet.
    pub fn remote(&self, address: Address) -> RemotePeer {
        RemotePeer::new(address, self.timeout)
    }
}

#[async_trait]
impl PeerConnector for TcpConnector {
    async fn connect(&self, node: &Node) -> chordring_core::Result<Arc<dyn ChordPeer>> {
        Ok(Arc::new(self.remote(node.address.clone())))
    }
}

//! Serve a local ring instance to remote peers.
use std::net::SocketAddr;
use std::sync::Arc;

use chordring_core::dht::ChordPeer;
use tokio::net::TcpListener;
use tokio::net::TcpStream;
use tokio_util::sync::CancellationToken;

use crate::error::Result;
use crate::framing;
use crate::protocol::Request;
use crate::protocol::Response;

/// TCP front of a [ChordPeer].
///
/// Each accepted connection gets its own task and may carry any number of
/// request/response exchanges until the client closes it.
pub struct PeerServer {
    listener: TcpListener,
    shutdown: CancellationToken,
}

impl PeerServer {
    /// Bind a listener on `addr`. Port 0 picks a free port.
    pub async fn bind(addr: &str) -> Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self {
            listener,
            shutdown: CancellationToken::new(),
        })
    }

    /// Address actually bound.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Token stopping [serve](Self::serve) when cancelled.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Accept connections and dispatch their requests to `handler` until shutdown.
    pub async fn serve(self, handler: Arc<dyn ChordPeer>) -> Result<()> {
        tracing::info!("peer server listening on {}", self.local_addr()?);
        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    tracing::info!("peer server shutting down");
                    return Ok(());
                }
                accepted = self.listener.accept() => {
                    let (stream, remote) = match accepted {
                        Ok(v) => v,
                        Err(e) => {
                            tracing::error!("accept failed: {}", e);
                            continue;
                        }
                    };
                    let handler = handler.clone();
                    let shutdown = self.shutdown.child_token();
                    tokio::spawn(async move {
                        tokio::select! {
                            _ = shutdown.cancelled() => {}
                            res = handle_connection(stream, handler) => {
                                if let Err(e) = res {
                                    tracing::error!("connection from {} failed: {}", remote, e);
                                }
                            }
                        }
                    });
                }
            }
        }
    }
}

async fn handle_connection(mut stream: TcpStream, handler: Arc<dyn ChordPeer>) -> Result<()> {
    while let Some(request) = framing::recv::<_, Request>(&mut stream).await? {
        let response = dispatch(handler.as_ref(), request).await;
        framing::send(&mut stream, &response).await?;
    }
    Ok(())
}

/// Run one request against `handler`. Failures are turned into [Response::Error].
pub async fn dispatch(handler: &dyn ChordPeer, request: Request) -> Response {
    let name = request.name();
    tracing::debug!("serving {:?}", request);
    let result = match request {
        Request::GetNode => handler.get_node().await.map(Response::Node),
        Request::FindSuccessor(id) => handler.find_successor(id).await.map(Response::Node),
        Request::GetSuccessor => handler.get_successor().await.map(Response::Node),
        Request::GetPredecessor => handler.get_predecessor().await.map(Response::Node),
        Request::SetSuccessor(node) => handler.set_successor(node).await.map(|_| Response::Done),
        Request::SetPredecessor(node) => {
            handler.set_predecessor(node).await.map(|_| Response::Done)
        }
        Request::ClosestPrecedingNode(id) => handler
            .closest_preceding_node(id)
            .await
            .map(Response::Node),
        Request::UpdateFingerTable { candidate, index } => handler
            .update_finger_table(candidate, index as usize)
            .await
            .map(Response::MaybeNode),
        Request::GetFingerTable => handler.get_finger_table().await.map(Response::FingerTable),
        Request::IsAlive => handler.is_alive().await.map(Response::Alive),
    };
    match result {
        Ok(response) => response,
        Err(e) => {
            tracing::error!("{} failed: {}", name, e);
            Response::Error(e.to_string())
        }
    }
}

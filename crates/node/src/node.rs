//! A ring instance served over TCP.
use std::sync::Arc;

use chordring_core::dht::ChordInstance;
use chordring_core::dht::ChordPeer;
use chordring_core::dht::Node;
use chordring_transport::PeerServer;
use chordring_transport::error::Result as TransportResult;
use chordring_transport::TcpConnector;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::error::Error;
use crate::error::Result;

/// One ring member: a bound [PeerServer] in front of a [ChordInstance].
pub struct ChordNode {
    instance: Arc<ChordInstance>,
    server: PeerServer,
    connector: Arc<TcpConnector>,
    config: Config,
}

impl ChordNode {
    /// Bind the listener and build the unattached instance.
    pub async fn start(config: Config) -> Result<Self> {
        config.validate()?;
        let server = PeerServer::bind(&config.bind_addr).await?;
        let node = config.node(server.local_addr()?)?;
        let connector = Arc::new(TcpConnector::new(config.request_timeout()));
        let instance = ChordInstance::new(node, config.chord_config()?, connector.clone())?;
        tracing::info!("node {} bound on {}", instance.node(), server.local_addr()?);
        Ok(Self {
            instance,
            server,
            connector,
            config,
        })
    }

    /// The served instance.
    pub fn instance(&self) -> &Arc<ChordInstance> {
        &self.instance
    }

    /// Token stopping [run](Self::run).
    pub fn shutdown_token(&self) -> CancellationToken {
        self.server.shutdown_token()
    }

    /// Identity of the configured bootstrap, asking it when its id is unknown.
    pub async fn resolve_bootstrap(&self) -> Result<Option<Node>> {
        let Some(address) = self.config.bootstrap_address()? else {
            return Ok(None);
        };
        if address == self.instance.node().address {
            tracing::info!("bootstrap {} is this node", address);
            return Ok(Some(self.instance.node().clone()));
        }
        let known = self.config.bootstrap.as_ref().and_then(|b| b.id);
        let node = match known {
            Some(id) => Node::new(address, id.into()),
            None => {
                let node = self
                    .connector
                    .remote(address.clone())
                    .get_node()
                    .await?;
                tracing::info!("bootstrap {} is {}", address, node);
                node
            }
        };
        Ok(Some(node))
    }

    /// Serve peers, join the ring, then keep serving until Ctrl-C or shutdown.
    pub async fn run(self) -> Result<()> {
        let shutdown = self.server.shutdown_token();
        let bootstrap = self.resolve_bootstrap().await?;
        let serving = tokio::spawn(self.server.serve(self.instance.clone()));

        if let Err(e) = self.instance.join(bootstrap).await {
            tracing::error!("join failed: {}", e);
            shutdown.cancel();
            if let Err(server_err) = wait_server(serving).await {
                tracing::error!("server stopped with error: {}", server_err);
            }
            return Err(e.into());
        }

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("received Ctrl-C");
                shutdown.cancel();
            }
            _ = shutdown.cancelled() => {}
        }

        wait_server(serving).await
    }
}

async fn wait_server(serving: JoinHandle<TransportResult<()>>) -> Result<()> {
    match serving.await {
        Ok(res) => res.map_err(Into::into),
        Err(e) => {
            tracing::error!("server task failed: {}", e);
            Err(Error::ServerTaskFailed(e.to_string()))
        }
    }
}

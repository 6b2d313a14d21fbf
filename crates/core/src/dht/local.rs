#![warn(missing_docs)]
//! In-process peer channel.
use std::sync::Arc;
use std::sync::Weak;

use async_trait::async_trait;
use dashmap::DashMap;

use crate::dht::Address;
use crate::dht::ChordConfig;
use crate::dht::ChordInstance;
use crate::dht::ChordPeer;
use crate::dht::Node;
use crate::dht::PeerConnector;
use crate::error::Error;
use crate::error::Result;

/// Registry of instances living in the same process.
///
/// Peer calls become direct method calls on the registered instance. Entries are
/// weak, so dropping the last handle of an instance makes its address unreachable.
#[derive(Default)]
pub struct LocalNetwork {
    instances: DashMap<Address, Weak<ChordInstance>>,
}

impl LocalNetwork {
    /// Create an empty network.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Create an unattached instance for `node` and register it.
    pub fn spawn(self: &Arc<Self>, node: Node, config: ChordConfig) -> Result<Arc<ChordInstance>> {
        let instance = ChordInstance::new(node, config, self.clone())?;
        self.register(&instance);
        Ok(instance)
    }

    /// Make `instance` reachable at its address, replacing any previous entry.
    pub fn register(&self, instance: &Arc<ChordInstance>) {
        let address = instance.node().address.clone();
        tracing::debug!("local network register {}", instance.node());
        self.instances.insert(address, Arc::downgrade(instance));
    }

    /// Make `address` unreachable.
    pub fn remove(&self, address: &Address) {
        self.instances.remove(address);
    }

    /// Number of registered addresses.
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    /// is empty
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}

#[async_trait]
impl PeerConnector for LocalNetwork {
    async fn connect(&self, node: &Node) -> Result<Arc<dyn ChordPeer>> {
        let instance = self
            .instances
            .get(&node.address)
            .and_then(|entry| entry.value().upgrade())
            .ok_or_else(|| Error::PeerUnreachable {
                address: node.address.clone(),
                reason: "no instance registered".to_string(),
            })?;
        if instance.node().id != node.id {
            return Err(Error::PeerIdentityMismatch {
                address: node.address.clone(),
                expected: node.id,
                actual: instance.node().id,
            });
        }
        Ok(instance)
    }
}

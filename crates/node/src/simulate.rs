//! In-process rings built by sequential joins.
use std::sync::Arc;

use chordring_core::dht::Address;
use chordring_core::dht::ChordConfig;
use chordring_core::dht::ChordId;
use chordring_core::dht::ChordInstance;
use chordring_core::dht::LocalNetwork;
use chordring_core::dht::Node;
use chordring_core::inspect::RingInspect;

use crate::error::Error;
use crate::error::Result;

/// Host name of simulated instances; the port is the position in the join order.
pub const SIMULATED_HOST: &str = "local";

/// Build a ring from `ids`, each instance bootstrapping from the one joined just
/// before it, and return the final inspection of every instance together with its
/// rendered finger table.
pub async fn simulate(bits: u8, ids: &[u64]) -> Result<Vec<(RingInspect, String)>> {
    if ids.len() > u16::MAX as usize {
        return Err(Error::InvalidConfig(format!(
            "cannot simulate {} instances, at most {} ports",
            ids.len(),
            u16::MAX
        )));
    }
    let net = LocalNetwork::new();
    let config = ChordConfig::with_bits(bits)?;
    let mut ring: Vec<Arc<ChordInstance>> = vec![];
    for (port, id) in (1..=u16::MAX).zip(ids) {
        let node = Node::new(Address::new(SIMULATED_HOST, port), ChordId(*id));
        let instance = net.spawn(node, config)?;
        let bootstrap = ring.last().map(|prev| prev.node().clone());
        instance.join(bootstrap).await?;
        ring.push(instance);
    }
    let mut report = vec![];
    for instance in &ring {
        report.push((instance.inspect()?, instance.finger_table()?.to_string()));
    }
    Ok(report)
}

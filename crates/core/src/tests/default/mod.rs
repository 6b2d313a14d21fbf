use std::sync::Arc;

use crate::dht::Address;
use crate::dht::ChordConfig;
use crate::dht::ChordId;
use crate::dht::ChordInstance;
use crate::dht::LocalNetwork;
use crate::dht::Node;

mod test_join;
mod test_routing;

pub fn gen_node(id: u64) -> Node {
    Node::new(Address::new("127.0.0.1", 10000 + id as u16), ChordId(id))
}

/// Build a ring by sequential joins. `pick` chooses the bootstrap among the
/// instances joined so far.
pub async fn gen_ring(
    bits: u8,
    ids: &[u64],
    pick: impl Fn(&[Arc<ChordInstance>]) -> usize,
) -> (Arc<LocalNetwork>, Vec<Arc<ChordInstance>>) {
    let net = LocalNetwork::new();
    let config = ChordConfig::with_bits(bits).unwrap();
    let mut ring: Vec<Arc<ChordInstance>> = vec![];
    for id in ids {
        let instance = net.spawn(gen_node(*id), config).unwrap();
        let bootstrap = if ring.is_empty() {
            None
        } else {
            Some(ring[pick(&ring)].node().clone())
        };
        instance.join(bootstrap).await.unwrap();
        ring.push(instance);
    }
    (net, ring)
}

/// First id of `ids` met walking clockwise from `x`.
pub fn oracle_successor(ids: &[u64], x: u64) -> u64 {
    let mut sorted = ids.to_vec();
    sorted.sort();
    sorted
        .iter()
        .copied()
        .find(|id| *id >= x)
        .unwrap_or(sorted[0])
}

pub fn oracle_predecessor(ids: &[u64], x: u64) -> u64 {
    let mut sorted = ids.to_vec();
    sorted.sort();
    sorted
        .iter()
        .rev()
        .copied()
        .find(|id| *id < x)
        .unwrap_or(sorted[sorted.len() - 1])
}

pub fn finger_pairs(instance: &ChordInstance) -> Vec<(u64, u64)> {
    instance
        .finger_table()
        .unwrap()
        .list()
        .iter()
        .map(|e| (e.start.0, e.successor.id.0))
        .collect()
}

use std::sync::Arc;

use crate::dht::ChordConfig;
use crate::dht::ChordId;
use crate::dht::ChordInstance;
use crate::dht::LocalNetwork;
use crate::error::Error;
use crate::tests::default::gen_node;
use crate::tests::default::finger_pairs;
use crate::tests::default::gen_ring;
use crate::tests::default::oracle_predecessor;
use crate::tests::default::oracle_successor;

const RING_IDS: [u64; 7] = [32, 5, 48, 17, 60, 1, 40];

fn find(ring: &[Arc<ChordInstance>], id: u64) -> &Arc<ChordInstance> {
    ring.iter().find(|i| i.node().id.0 == id).unwrap()
}

fn assert_links(ids: &[u64], ring: &[Arc<ChordInstance>]) {
    let mut sorted = ids.to_vec();
    sorted.sort();

    // one full turn of successor links visits every instance in order
    let start = find(ring, sorted[0]);
    let mut walk = vec![start.node().id.0];
    let mut cur = start.successor().unwrap();
    while cur != *start.node() {
        walk.push(cur.id.0);
        cur = find(ring, cur.id.0).successor().unwrap();
        assert!(walk.len() <= ids.len(), "successor walk does not close: {:?}", walk);
    }
    assert_eq!(walk, sorted);

    for instance in ring {
        let id = instance.node().id.0;
        assert_eq!(
            instance.predecessor().unwrap().id.0,
            oracle_predecessor(ids, id),
            "predecessor of {}",
            id
        );
    }
}

async fn assert_lookups(ids: &[u64], ring: &[Arc<ChordInstance>], size: u64) {
    for instance in ring {
        for x in 0..size {
            let owner = instance.find_successor(ChordId(x)).await.unwrap();
            assert_eq!(
                owner.id.0,
                oracle_successor(ids, x),
                "lookup of {} from {}",
                x,
                instance.node()
            );
            let pred = instance.find_predecessor(ChordId(x)).await.unwrap();
            assert_eq!(find(ring, pred.id.0).successor().unwrap(), owner);
        }
    }
}

#[tokio::test]
async fn test_ring_joined_through_latest_member() {
    let (_net, ring) = gen_ring(6, &RING_IDS, |r| r.len() - 1).await;
    assert_links(&RING_IDS, &ring);
    assert_lookups(&RING_IDS, &ring, 64).await;
    for instance in &ring {
        for (start, successor) in finger_pairs(instance) {
            assert_eq!(successor, oracle_successor(&RING_IDS, start));
        }
    }
}

#[tokio::test]
async fn test_ring_joined_through_first_member() {
    let (_net, ring) = gen_ring(6, &RING_IDS, |_| 0).await;
    assert_links(&RING_IDS, &ring);
    assert_lookups(&RING_IDS, &ring, 64).await;
}

#[tokio::test]
async fn test_every_prefix_of_joins_is_consistent() {
    for n in 1..=RING_IDS.len() {
        let ids = &RING_IDS[..n];
        let (_net, ring) = gen_ring(6, ids, |r| r.len() / 2).await;
        assert_links(ids, &ring);
        assert_lookups(ids, &ring, 64).await;
    }
}

#[tokio::test]
async fn test_sparse_twelve_bit_ring() {
    let ids = [
        2652, 1235, 3234, 395, 593, 771, 2995, 475, 1758, 307, 704, 3552,
    ];
    let (_net, ring) = gen_ring(12, &ids, |r| r.len() / 2).await;
    assert_links(&ids, &ring);
    assert_lookups(&ids, &ring, 4096).await;
}

#[tokio::test]
async fn test_lookup_rejects_id_outside_ring() {
    let (_net, ring) = gen_ring(6, &RING_IDS[..3], |_| 0).await;
    assert!(ring[0].find_successor(ChordId(64)).await.is_err());
    assert!(ring[0].closest_preceding_node(ChordId(1 << 40)).is_err());
}

#[tokio::test]
async fn test_lookup_hop_cap_counts_the_last_hop() {
    let net = LocalNetwork::new();
    let config = ChordConfig {
        max_lookup_hops: 1,
        ..ChordConfig::with_bits(6).unwrap()
    };
    let a = net.spawn(gen_node(32), config).unwrap();
    let b = net.spawn(gen_node(5), config).unwrap();
    a.join(None).await.unwrap();
    // every lookup during this join needs exactly one hop
    b.join(Some(a.node().clone())).await.unwrap();
    assert_eq!(b.find_successor(ChordId(4)).await.unwrap(), gen_node(5));
    assert_eq!(b.find_predecessor(ChordId(4)).await.unwrap(), gen_node(32));
}

/// Spawn an unattached walker at 33 whose only link is a successor of 40.
async fn walker(net: &Arc<LocalNetwork>, max_lookup_hops: usize) -> Arc<ChordInstance> {
    let config = ChordConfig {
        max_lookup_hops,
        ..ChordConfig::with_bits(6).unwrap()
    };
    let walker = net.spawn(gen_node(33), config).unwrap();
    walker.set_successor(gen_node(40)).unwrap();
    walker
}

#[tokio::test]
async fn test_lookup_past_hop_cap_does_not_converge() {
    let (net, ring) = gen_ring(6, &RING_IDS, |r| r.len() - 1).await;
    assert_eq!(finger_pairs(find(&ring, 40))[5], (8, 17));

    // 33 -> 40 -> 17, and 20 lies in (17, 32]
    let capped = walker(&net, 1).await;
    assert!(matches!(
        capped.find_successor(ChordId(20)).await,
        Err(Error::RoutingDidNotConverge { id: ChordId(20), hops: 1 })
    ));

    let enough = walker(&net, 2).await;
    assert_eq!(enough.find_successor(ChordId(20)).await.unwrap(), gen_node(32));
    assert_eq!(enough.find_predecessor(ChordId(20)).await.unwrap(), gen_node(17));
}

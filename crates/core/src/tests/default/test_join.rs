use crate::dht::ChordConfig;
use crate::dht::ChordId;
use crate::dht::ChordPeer;
use crate::dht::JoinPhase;
use crate::dht::LocalNetwork;
use crate::error::Error;
use crate::error::Result;
use crate::tests::default::finger_pairs;
use crate::tests::default::gen_node;
use crate::tests::default::gen_ring;
use crate::tests::default::oracle_successor;
use crate::tests::setup_tracing;

#[tokio::test]
async fn test_fresh_instance_points_at_itself() -> Result<()> {
    let net = LocalNetwork::new();
    let a = net.spawn(gen_node(4), ChordConfig::with_bits(8)?)?;
    assert_eq!(a.phase()?, JoinPhase::Unattached);
    assert_eq!(a.successor()?, gen_node(4));
    assert_eq!(a.predecessor()?, gen_node(4));
    assert!(finger_pairs(&a).iter().all(|(_, s)| *s == 4));
    Ok(())
}

#[tokio::test]
async fn test_singleton_ring() -> Result<()> {
    let net = LocalNetwork::new();
    let a = net.spawn(gen_node(4), ChordConfig::with_bits(5)?)?;
    a.join(None).await?;
    assert_eq!(a.phase()?, JoinPhase::Attached);
    for x in 0..32 {
        assert_eq!(a.find_successor(ChordId(x)).await?, gen_node(4));
        assert_eq!(a.find_predecessor(ChordId(x)).await?, gen_node(4));
    }
    Ok(())
}

#[tokio::test]
async fn test_join_self_as_bootstrap_forms_singleton() -> Result<()> {
    let net = LocalNetwork::new();
    let a = net.spawn(gen_node(7), ChordConfig::with_bits(4)?)?;
    a.join(Some(gen_node(7))).await?;
    assert_eq!(a.phase()?, JoinPhase::Attached);
    assert_eq!(a.find_successor(ChordId(3)).await?, gen_node(7));
    Ok(())
}

#[tokio::test]
async fn test_three_node_scenario() -> Result<()> {
    let net = LocalNetwork::new();
    let config = ChordConfig::with_bits(8)?;
    let a = net.spawn(gen_node(4), config)?;
    let b = net.spawn(gen_node(0), config)?;
    let c = net.spawn(gen_node(1), config)?;

    a.join(None).await?;
    b.join(Some(a.node().clone())).await?;
    c.join(Some(b.node().clone())).await?;

    // 4 -> 0 -> 1 -> 4
    assert_eq!(a.successor()?, gen_node(0));
    assert_eq!(b.successor()?, gen_node(1));
    assert_eq!(c.successor()?, gen_node(4));
    assert_eq!(a.predecessor()?, gen_node(1));
    assert_eq!(b.predecessor()?, gen_node(4));
    assert_eq!(c.predecessor()?, gen_node(0));

    assert_eq!(finger_pairs(&a), vec![
        (5, 0),
        (6, 0),
        (8, 0),
        (12, 0),
        (20, 0),
        (36, 0),
        (68, 0),
        (132, 0)
    ]);
    assert_eq!(finger_pairs(&b), vec![
        (1, 1),
        (2, 4),
        (4, 4),
        (8, 0),
        (16, 0),
        (32, 0),
        (64, 0),
        (128, 0)
    ]);
    assert_eq!(finger_pairs(&c), vec![
        (2, 4),
        (3, 4),
        (5, 0),
        (9, 0),
        (17, 0),
        (33, 0),
        (65, 0),
        (129, 0)
    ]);

    assert_eq!(c.find_successor(ChordId(2)).await?, gen_node(4));
    Ok(())
}

#[tokio::test]
async fn test_inherited_fingers_match_bootstrap_lookup() {
    let ids = [32, 5, 48, 17, 60, 1, 40];
    for n in 2..=ids.len() {
        let (_net, ring) = gen_ring(6, &ids[..n], |r| r.len() - 1).await;
        let joined = &ring[n - 1];
        let bootstrap = &ring[n - 2];
        for entry in joined.finger_table().unwrap().list() {
            assert_eq!(
                entry.successor,
                bootstrap.find_successor(entry.start).await.unwrap(),
                "finger of {} at start {}",
                joined.node(),
                entry.start
            );
            assert_eq!(
                entry.successor.id.0,
                oracle_successor(&ids[..n], entry.start.0)
            );
        }
    }
}

#[tokio::test]
async fn test_second_join_is_rejected() -> Result<()> {
    let net = LocalNetwork::new();
    let config = ChordConfig::with_bits(6)?;
    let a = net.spawn(gen_node(10), config)?;
    let b = net.spawn(gen_node(20), config)?;
    a.join(None).await?;
    b.join(Some(a.node().clone())).await?;

    assert!(matches!(
        a.join(None).await,
        Err(Error::InvalidJoinState(JoinPhase::Attached))
    ));
    assert!(matches!(
        b.join(Some(a.node().clone())).await,
        Err(Error::InvalidJoinState(JoinPhase::Attached))
    ));
    Ok(())
}

#[tokio::test]
async fn test_unreachable_bootstrap_fails_join() -> Result<()> {
    let net = LocalNetwork::new();
    let a = net.spawn(gen_node(3), ChordConfig::with_bits(6)?)?;
    let result = a.join(Some(gen_node(40))).await;
    assert!(matches!(result, Err(Error::PeerUnreachable { .. })));
    assert_eq!(a.phase()?, JoinPhase::Joining);
    assert!(matches!(
        a.join(None).await,
        Err(Error::InvalidJoinState(JoinPhase::Joining))
    ));
    Ok(())
}

#[tokio::test]
async fn test_bootstrap_outside_ring_is_rejected() -> Result<()> {
    let net = LocalNetwork::new();
    let a = net.spawn(gen_node(3), ChordConfig::with_bits(6)?)?;
    let result = a.join(Some(gen_node(64))).await;
    assert!(matches!(result, Err(Error::IdOutOfRange { id: 64, bits: 6 })));
    Ok(())
}

#[tokio::test]
async fn test_update_propagation_is_bounded() -> Result<()> {
    let net = LocalNetwork::new();
    let config = ChordConfig {
        max_update_hops: 0,
        ..ChordConfig::with_bits(6)?
    };
    let a = net.spawn(gen_node(10), config)?;
    let b = net.spawn(gen_node(30), config)?;
    a.join(None).await?;
    let result = b.join(Some(a.node().clone())).await;
    assert!(matches!(
        result,
        Err(Error::UpdateHopLimit { index: 0, hops: 0, .. })
    ));
    Ok(())
}

#[tokio::test]
async fn test_update_finger_table_keeps_exact_finger() -> Result<()> {
    setup_tracing();
    let (_net, ring) = gen_ring(4, &[0, 1, 8], |_| 0).await;
    let zero = &ring[0];
    // slot 0 of 0 starts at 1 and already points at 1
    assert_eq!(finger_pairs(zero)[0], (1, 1));
    let next = zero.update_finger_table(gen_node(1), 0)?;
    assert_eq!(next, None);
    assert_eq!(zero.successor()?, gen_node(1));

    // slot 2 of 0 starts at 4 and points at 8; 5 would be closer
    assert_eq!(finger_pairs(zero)[2], (4, 8));
    let next = zero.update_finger_table(gen_node(5), 2)?;
    assert_eq!(next, Some(gen_node(8)));
    assert_eq!(finger_pairs(zero)[2], (4, 5));

    // 2 is outside [8, 0)
    assert_eq!(zero.update_finger_table(gen_node(2), 3)?, None);
    assert!(matches!(
        ChordPeer::update_finger_table(zero.as_ref(), gen_node(9), 4).await,
        Err(Error::FingerIndexOutOfRange { index: 4, size: 4 })
    ));
    Ok(())
}

#![warn(missing_docs)]
//! Routing and join protocol of a single ring instance.
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::Weak;

use async_trait::async_trait;

use crate::dht::is_between;
use crate::dht::Bounds;
use crate::dht::ChordConfig;
use crate::dht::ChordId;
use crate::dht::ChordPeer;
use crate::dht::FingerEntry;
use crate::dht::FingerTable;
use crate::dht::JoinPhase;
use crate::dht::Node;
use crate::dht::PeerConnector;
use crate::error::Error;
use crate::error::Result;

/// Mutable part of an instance, guarded by one lock.
#[derive(Clone, Debug)]
pub(crate) struct RingState {
    /// Slot 0 is the successor; it is stored nowhere else.
    pub(crate) finger: FingerTable,
    pub(crate) predecessor: Node,
    pub(crate) phase: JoinPhase,
}

/// One participant of a Chord ring.
///
/// An instance owns a [FingerTable] plus its predecessor link and runs the routing
/// and join algorithms. Other instances are reached only through the
/// [PeerConnector] given at construction, so the protocol is the same whether peers
/// live in the same process or behind a network channel.
///
/// The state lock is held only for a single local read or mutation and never while
/// waiting on a peer, so concurrent requests from peers cannot deadlock against a
/// running join.
pub struct ChordInstance {
    node: Node,
    config: ChordConfig,
    connector: Arc<dyn PeerConnector>,
    state: Mutex<RingState>,
    me: Weak<ChordInstance>,
}

impl std::fmt::Debug for ChordInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChordInstance")
            .field("node", &self.node)
            .field("config", &self.config)
            .finish()
    }
}

impl ChordInstance {
    /// Create an unattached instance. Its successor, predecessor and every finger
    /// point at itself until [join](Self::join) is called.
    pub fn new(
        node: Node,
        config: ChordConfig,
        connector: Arc<dyn PeerConnector>,
    ) -> Result<Arc<Self>> {
        config.space.validate(node.id)?;
        let state = RingState {
            finger: FingerTable::new(node.clone(), config.space),
            predecessor: node.clone(),
            phase: JoinPhase::Unattached,
        };
        Ok(Arc::new_cyclic(|me| Self {
            node,
            config,
            connector,
            state: Mutex::new(state),
            me: me.clone(),
        }))
    }

    /// Identity of this instance.
    pub fn node(&self) -> &Node {
        &self.node
    }

    /// Protocol parameters.
    pub fn config(&self) -> &ChordConfig {
        &self.config
    }

    /// Lock and return MutexGuard of the ring state.
    pub(crate) fn lock_state(&self) -> Result<MutexGuard<RingState>> {
        self.state.lock().map_err(|_| Error::StateLock)
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> Result<JoinPhase> {
        Ok(self.lock_state()?.phase)
    }

    /// Immediate successor, `finger[0].successor`.
    pub fn successor(&self) -> Result<Node> {
        Ok(self.lock_state()?.finger.first().clone())
    }

    /// Predecessor link.
    pub fn predecessor(&self) -> Result<Node> {
        Ok(self.lock_state()?.predecessor.clone())
    }

    /// Copy of the finger table.
    pub fn finger_table(&self) -> Result<FingerTable> {
        Ok(self.lock_state()?.finger.clone())
    }

    /// Handle to `node`. Resolves to this very instance when `node` is itself.
    async fn peer(&self, node: &Node) -> Result<Arc<dyn ChordPeer>> {
        if *node == self.node {
            let me: Arc<dyn ChordPeer> = self.me.upgrade().ok_or(Error::InstanceDropped)?;
            return Ok(me);
        }
        self.connector.connect(node).await
    }

    /// Reject nodes reported by peers whose id does not fit the local ring.
    fn check(&self, node: Node) -> Result<Node> {
        self.config.space.validate(node.id)?;
        Ok(node)
    }

    /// Resolve the node owning `id`.
    pub async fn find_successor(&self, id: ChordId) -> Result<Node> {
        let (_, successor) = self.locate(id).await?;
        Ok(successor)
    }

    /// Resolve the node immediately preceding `id`.
    pub async fn find_predecessor(&self, id: ChordId) -> Result<Node> {
        let (predecessor, _) = self.locate(id).await?;
        Ok(predecessor)
    }

    /// Walk the ring from this instance towards `id`.
    ///
    /// Returns the first node `n` with `id` in `(n, n.successor]`, together with that
    /// successor.
    async fn locate(&self, id: ChordId) -> Result<(Node, Node)> {
        let id = self.config.space.validate(id)?;
        let mut n = self.node.clone();
        let mut n_succ = self.successor()?;

        let mut hops = 0;
        loop {
            if is_between(id, n.id, n_succ.id, Bounds::IncludeHi) {
                tracing::debug!(
                    "{} located {}: predecessor {}, successor {} after {} hops",
                    self.node,
                    id,
                    n,
                    n_succ,
                    hops
                );
                return Ok((n, n_succ));
            }
            if hops >= self.config.max_lookup_hops {
                tracing::warn!("{} lookup of {} gave up at {}", self.node, id, n);
                return Err(Error::RoutingDidNotConverge { id, hops });
            }
            let next = self
                .check(self.peer(&n).await?.closest_preceding_node(id).await?)?;
            if next == n {
                tracing::warn!("{} lookup of {} stuck at {}", self.node, id, n);
                return Err(Error::RoutingDidNotConverge { id, hops });
            }
            hops += 1;
            n_succ = self.check(self.peer(&next).await?.get_successor().await?)?;
            n = next;
        }
    }

    /// Highest finger strictly between this instance and `id`, or the instance itself.
    pub fn closest_preceding_node(&self, id: ChordId) -> Result<Node> {
        let id = self.config.space.validate(id)?;
        Ok(self.lock_state()?.finger.closest_preceding(id).clone())
    }

    /// Enter a ring through `bootstrap`, or form a new ring when it is `None`.
    ///
    /// Only an unattached instance may join. A bootstrap equal to this instance is
    /// the same as `None`. Any failing peer call aborts the join and leaves the
    /// instance in [JoinPhase::Joining].
    pub async fn join(&self, bootstrap: Option<Node>) -> Result<()> {
        {
            let mut state = self.lock_state()?;
            if state.phase != JoinPhase::Unattached {
                return Err(Error::InvalidJoinState(state.phase));
            }
            state.phase = JoinPhase::Joining;
        }

        match bootstrap.filter(|b| *b != self.node) {
            None => {
                tracing::info!("{} starts a new ring", self.node);
                let mut state = self.lock_state()?;
                state.finger.fill(&self.node);
                state.predecessor = self.node.clone();
            }
            Some(bootstrap) => {
                tracing::info!("{} joining ring via {}", self.node, bootstrap);
                let bootstrap = self.check(bootstrap)?;
                let peer = self.peer(&bootstrap).await?;
                self.init_finger_table(peer.as_ref()).await?;
                self.update_others().await?;
                for i in 1..self.config.space.bits() as usize {
                    let predecessor = self.predecessor()?;
                    self.propagate_finger_update(predecessor, self.node.clone(), i)
                        .await?;
                }
            }
        }

        let mut state = self.lock_state()?;
        state.phase = JoinPhase::Attached;
        tracing::info!(
            "{} attached, successor {}, predecessor {}",
            self.node,
            state.finger.first(),
            state.predecessor
        );
        Ok(())
    }

    /// Fill the finger table by asking `bootstrap`, and splice this instance
    /// between its successor and the successor's old predecessor.
    async fn init_finger_table(&self, bootstrap: &dyn ChordPeer) -> Result<()> {
        let start = self.lock_state()?.finger.start(0)?;
        let successor = self.check(bootstrap.find_successor(start).await?)?;
        self.lock_state()?.finger.set(0, successor.clone())?;

        let successor_peer = self.peer(&successor).await?;
        let predecessor = self.check(successor_peer.get_predecessor().await?)?;
        self.lock_state()?.predecessor = predecessor.clone();
        successor_peer.set_predecessor(self.node.clone()).await?;
        self.peer(&predecessor)
            .await?
            .set_successor(self.node.clone())
            .await?;
        tracing::debug!(
            "{} spliced between {} and {}",
            self.node,
            predecessor,
            successor
        );

        for i in 0..self.config.space.bits() as usize - 1 {
            let (next_start, prev) = {
                let state = self.lock_state()?;
                (state.finger.start(i + 1)?, state.finger.successor(i)?.clone())
            };
            let next = if is_between(next_start, self.node.id, prev.id, Bounds::IncludeLo) {
                prev
            } else {
                self.check(bootstrap.find_successor(next_start).await?)?
            };
            self.lock_state()?.finger.set(i + 1, next)?;
        }
        Ok(())
    }

    /// Offer this instance to every node whose finger `i` may now point to it.
    async fn update_others(&self) -> Result<()> {
        for i in 0..self.config.space.bits() as usize {
            let target = self.config.space.sub_pow2(self.node.id, i);
            let mut p = self.find_predecessor(target).await?;
            if p == self.node {
                p = self.predecessor()?;
            }
            self.propagate_finger_update(p, self.node.clone(), i).await?;
        }
        Ok(())
    }

    /// Deliver one finger update, starting at `first` and following the next hops
    /// returned by each visited peer.
    async fn propagate_finger_update(
        &self,
        first: Node,
        candidate: Node,
        index: usize,
    ) -> Result<()> {
        let mut target = Some(first);
        let mut hops = 0;
        while let Some(node) = target {
            if hops >= self.config.max_update_hops {
                tracing::warn!(
                    "{} finger update of slot {} for {} gave up at {}",
                    self.node,
                    index,
                    candidate,
                    node
                );
                return Err(Error::UpdateHopLimit {
                    index,
                    candidate: candidate.id,
                    hops,
                });
            }
            hops += 1;
            let next = self
                .peer(&node)
                .await?
                .update_finger_table(candidate.clone(), index)
                .await?;
            target = next.map(|n| self.check(n)).transpose()?;
        }
        Ok(())
    }

    /// Apply an offer of `candidate` for finger slot `index` to this instance.
    ///
    /// The slot is replaced when the candidate falls in `[start, successor)`, unless
    /// the current successor already sits exactly on the start. Returns the
    /// predecessor as next hop after a replacement, unless it is the candidate.
    pub fn update_finger_table(&self, candidate: Node, index: usize) -> Result<Option<Node>> {
        let candidate = self.check(candidate)?;
        let mut state = self.lock_state()?;
        let (start, current) = {
            let entry = state.finger.get(index).ok_or(Error::FingerIndexOutOfRange {
                index,
                size: state.finger.len(),
            })?;
            (entry.start, entry.successor.id)
        };
        if current == start {
            tracing::warn!(
                "{} keeps exact finger {} at {}, ignoring {}",
                self.node,
                index,
                current,
                candidate
            );
            return Ok(None);
        }
        if !is_between(candidate.id, start, current, Bounds::IncludeLo) {
            return Ok(None);
        }
        state.finger.set(index, candidate.clone())?;
        if state.predecessor == candidate {
            Ok(None)
        } else {
            Ok(Some(state.predecessor.clone()))
        }
    }

    /// Overwrite the successor, which is finger slot 0.
    pub fn set_successor(&self, node: Node) -> Result<()> {
        let node = self.check(node)?;
        self.lock_state()?.finger.set(0, node)
    }

    /// Overwrite the predecessor link.
    pub fn set_predecessor(&self, node: Node) -> Result<()> {
        let node = self.check(node)?;
        tracing::debug!("{} set predecessor to {}", self.node, node);
        self.lock_state()?.predecessor = node;
        Ok(())
    }
}

#[async_trait]
impl ChordPeer for ChordInstance {
    async fn get_node(&self) -> Result<Node> {
        Ok(self.node.clone())
    }

    async fn find_successor(&self, id: ChordId) -> Result<Node> {
        ChordInstance::find_successor(self, id).await
    }

    async fn get_successor(&self) -> Result<Node> {
        self.successor()
    }

    async fn get_predecessor(&self) -> Result<Node> {
        self.predecessor()
    }

    async fn set_successor(&self, node: Node) -> Result<()> {
        ChordInstance::set_successor(self, node)
    }

    async fn set_predecessor(&self, node: Node) -> Result<()> {
        ChordInstance::set_predecessor(self, node)
    }

    async fn closest_preceding_node(&self, id: ChordId) -> Result<Node> {
        ChordInstance::closest_preceding_node(self, id)
    }

    async fn update_finger_table(&self, candidate: Node, index: usize) -> Result<Option<Node>> {
        ChordInstance::update_finger_table(self, candidate, index)
    }

    async fn get_finger_table(&self) -> Result<Vec<FingerEntry>> {
        Ok(self.lock_state()?.finger.list().to_vec())
    }

    async fn is_alive(&self) -> Result<bool> {
        Ok(true)
    }
}

//! Ordered peer ring with supermajority arithmetic.
//!
//! A `ClusterOrdering` is a value: each round takes its own snapshot
//! copy and rotates it independently. For a cluster of `N` peers the
//! fault bound is `f = (N - 1) / 3` and supermajority is `2f + 1`
//! votes. The first `2f + 1` positions form the validate set; once the
//! leader index moves past it, no rotation within this snapshot can
//! still reach supermajority.

use crate::types::Peer;

use super::error::ConsensusError;

/// Ordered sequence of peers with the current leader position.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClusterOrdering {
    order: Vec<Peer>,
    index: usize,
}

impl ClusterOrdering {
    /// Creates an ordering over a non-empty peer set.
    ///
    /// An empty set is rejected loudly: no live round can run over it,
    /// and silently wrapping an index over zero peers hides the bug.
    pub fn new(order: Vec<Peer>) -> Result<Self, ConsensusError> {
        if order.is_empty() {
            return Err(ConsensusError::EmptyCluster);
        }
        Ok(Self { order, index: 0 })
    }

    /// Fault bound `f = (N - 1) / 3` for this cluster size.
    fn max_faulty(&self) -> usize {
        (self.order.len() - 1) / 3
    }

    /// Peer at the current leader position.
    ///
    /// Positions past the end wrap to the first peer.
    pub fn current_leader(&self) -> &Peer {
        let at = if self.index >= self.order.len() {
            0
        } else {
            self.index
        };
        &self.order[at]
    }

    /// Advances the leader position by one and returns self for
    /// chaining. Used on timeout or when the leader produced nothing.
    pub fn switch_to_next(&mut self) -> &mut Self {
        self.index += 1;
        self
    }

    /// `true` while the leader position has not walked off the ring.
    pub fn has_next(&self) -> bool {
        self.index < self.order.len()
    }

    /// `true` while the leader position is within the validate set
    /// (positions `0..=2f`).
    pub fn leader_in_validate_set(&self) -> bool {
        self.index <= 2 * self.max_faulty()
    }

    /// `true` if `votes` reaches supermajority (`2f + 1`) for this
    /// cluster size.
    pub fn have_supermajority(&self, votes: usize) -> bool {
        votes >= 2 * self.max_faulty() + 1
    }

    /// Number of peers in the ordering.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// `false` always: construction rejects empty orderings.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// All peers in ring order.
    pub fn peers(&self) -> &[Peer] {
        &self.order
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PublicKey;

    fn peer(byte: u8) -> Peer {
        Peer {
            address: format!("127.0.0.1:{}", 10_000 + byte as u16),
            public_key: PublicKey([byte; 32]),
        }
    }

    fn ordering(n: u8) -> ClusterOrdering {
        ClusterOrdering::new((0..n).map(peer).collect()).expect("non-empty")
    }

    #[test]
    fn empty_cluster_is_rejected() {
        assert_eq!(
            ClusterOrdering::new(Vec::new()).unwrap_err(),
            ConsensusError::EmptyCluster
        );
    }

    #[test]
    fn supermajority_thresholds() {
        // (N, threshold = 2 * ((N - 1) / 3) + 1)
        let expected: [(usize, usize); 8] =
            [(1, 1), (2, 1), (3, 1), (4, 3), (5, 3), (6, 3), (7, 5), (10, 7)];
        for (n, threshold) in expected {
            let o = ordering(n as u8);
            assert!(!o.have_supermajority(threshold - 1), "N={n}");
            assert!(o.have_supermajority(threshold), "N={n}");
            assert!(o.have_supermajority(n), "N={n}");
        }
    }

    #[test]
    fn rotation_walks_the_ring() {
        let mut o = ordering(4);
        assert_eq!(o.current_leader(), &peer(0));
        assert!(o.has_next());

        o.switch_to_next();
        assert_eq!(o.current_leader(), &peer(1));

        o.switch_to_next().switch_to_next();
        assert_eq!(o.current_leader(), &peer(3));
        assert!(o.has_next());

        o.switch_to_next();
        assert!(!o.has_next());
        // Past the end the leader accessor wraps to the front.
        assert_eq!(o.current_leader(), &peer(0));
    }

    #[test]
    fn validate_set_covers_first_2f_plus_1_positions() {
        // N = 4 -> f = 1 -> validate set is positions 0, 1, 2.
        let mut o = ordering(4);
        assert!(o.leader_in_validate_set());
        o.switch_to_next();
        assert!(o.leader_in_validate_set());
        o.switch_to_next();
        assert!(o.leader_in_validate_set());
        o.switch_to_next();
        assert!(!o.leader_in_validate_set());
    }

    #[test]
    fn snapshots_rotate_independently() {
        let mut a = ordering(4);
        let b = a.clone();
        a.switch_to_next();
        assert_eq!(a.current_leader(), &peer(1));
        assert_eq!(b.current_leader(), &peer(0));
    }
}

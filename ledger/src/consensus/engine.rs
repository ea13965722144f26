//! YAC round state machine.
//!
//! One engine instance drives one consensus round at a time: it signs
//! and broadcasts the local vote, tallies inbound votes by
//! [`YacHash`], emits a commit once any hash reaches supermajority, a
//! reject once no hash can, and rotates the leader on timeout until
//! the validate set is exhausted.
//!
//! The engine is single-writer: every entry point takes `&mut self`
//! and callers serialize access, normally by owning the engine inside
//! a mailbox task (see [`super::service`]). Outcome consumers
//! subscribe via [`YacEngine::commits`] / [`YacEngine::rejects`];
//! emissions happen in detection order on a broadcast channel, and a
//! consumer that lags behind [`OUTCOME_BUFFER`] pending outcomes loses
//! the oldest ones.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::broadcast;

use crate::types::{Peer, PublicKey};

use super::cluster::ClusterOrdering;
use super::crypto::CryptoProvider;
use super::error::ConsensusError;
use super::messages::{CommitMessage, RejectMessage, VoteMessage, YacHash};
use super::network::Network;
use super::timer::RoundTimer;

/// Outcome fan-out buffer per subscriber.
pub const OUTCOME_BUFFER: usize = 16;

/// Lifecycle of the current round.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RoundState {
    /// No local vote yet; inbound votes are tallied (cold start).
    Idle,
    /// Voting is open and the round timer is running.
    Voting,
    /// Supermajority was observed; the round is over.
    Committed,
    /// Supermajority became impossible; the round is over.
    Rejected,
    /// Rotation left the validate set; upstream must re-seed.
    Abandoned,
}

impl RoundState {
    fn is_terminal(self) -> bool {
        matches!(
            self,
            RoundState::Committed | RoundState::Rejected | RoundState::Abandoned
        )
    }
}

/// Per-round BFT voting engine.
///
/// Generic over the [`Network`], [`CryptoProvider`], and
/// [`RoundTimer`] seams so tests can drive it deterministically.
pub struct YacEngine<N, C, T> {
    network: N,
    crypto: C,
    timer: T,
    vote_delay: Duration,
    ordering: ClusterOrdering,
    state: RoundState,
    /// Collected votes per candidate hash.
    tally: HashMap<YacHash, Vec<VoteMessage>>,
    /// First hash each peer voted for; later conflicting votes are
    /// recorded here only.
    voted: HashMap<PublicKey, YacHash>,
    last_vote: Option<VoteMessage>,
    commit_tx: broadcast::Sender<CommitMessage>,
    reject_tx: broadcast::Sender<RejectMessage>,
}

impl<N, C, T> YacEngine<N, C, T>
where
    N: Network,
    C: CryptoProvider,
    T: RoundTimer,
{
    /// Creates an engine over an initial cluster snapshot.
    ///
    /// The snapshot is needed even before a local vote: cold-started
    /// engines tally inbound votes and must know the cluster size for
    /// supermajority arithmetic. A later [`vote`](Self::vote) replaces
    /// the snapshot for its round.
    pub fn new(
        network: N,
        crypto: C,
        timer: T,
        vote_delay: Duration,
        ordering: ClusterOrdering,
    ) -> Self {
        let (commit_tx, _) = broadcast::channel(OUTCOME_BUFFER);
        let (reject_tx, _) = broadcast::channel(OUTCOME_BUFFER);
        Self {
            network,
            crypto,
            timer,
            vote_delay,
            ordering,
            state: RoundState::Idle,
            tally: HashMap::new(),
            voted: HashMap::new(),
            last_vote: None,
            commit_tx,
            reject_tx,
        }
    }

    /// Current round state.
    pub fn state(&self) -> RoundState {
        self.state
    }

    /// Cluster snapshot of the current round.
    pub fn ordering(&self) -> &ClusterOrdering {
        &self.ordering
    }

    /// Subscribes to committed outcomes.
    pub fn commits(&self) -> broadcast::Receiver<CommitMessage> {
        self.commit_tx.subscribe()
    }

    /// Subscribes to rejected outcomes.
    pub fn rejects(&self) -> broadcast::Receiver<RejectMessage> {
        self.reject_tx.subscribe()
    }

    /// Signs a vote for `hash` and sends it to every peer in
    /// `ordering`, self included, then arms the round timer.
    ///
    /// After a terminal round this opens a fresh one: the previous
    /// round's tallies are discarded. A vote during an open round
    /// keeps the tallies, so cold-start votes collected before the
    /// local vote still count.
    pub fn vote(&mut self, hash: YacHash, ordering: ClusterOrdering) {
        if self.state.is_terminal() {
            self.tally.clear();
            self.voted.clear();
        }
        let vote = self.crypto.get_vote(hash);
        tracing::debug!(
            proposal = %hash.proposal_hash.to_hex(),
            block = %hash.block_hash.to_hex(),
            peers = ordering.len(),
            "voting"
        );
        self.last_vote = Some(vote.clone());
        self.ordering = ordering;
        self.state = RoundState::Voting;
        for peer in self.ordering.peers() {
            self.network.send_vote(peer, vote.clone());
        }
        self.timer.start(self.vote_delay);
    }

    /// Handles one inbound vote.
    ///
    /// Invalid signatures surface [`ConsensusError::InvalidSignature`]
    /// and change nothing. Duplicate votes are idempotent; a second
    /// vote for a *different* hash by the same peer is a protocol
    /// violation, so only the first counts and the conflict is logged.
    pub fn on_vote(&mut self, from: &Peer, vote: VoteMessage) -> Result<(), ConsensusError> {
        if !self.crypto.verify_vote(&vote) {
            return Err(ConsensusError::InvalidSignature);
        }
        if self.state.is_terminal() {
            // Late votes after commit/reject are harmless.
            return Ok(());
        }

        let voter = *vote.voter();
        match self.voted.get(&voter) {
            Some(prev) if *prev == vote.hash => return Ok(()),
            Some(prev) => {
                tracing::warn!(
                    peer = %from.address,
                    first = %prev.block_hash.to_hex(),
                    second = %vote.hash.block_hash.to_hex(),
                    "conflicting votes from one peer in a single round"
                );
                return Ok(());
            }
            None => {}
        }

        self.voted.insert(voter, vote.hash);
        let hash = vote.hash;
        let count = {
            let votes = self.tally.entry(hash).or_default();
            votes.push(vote);
            votes.len()
        };

        // Supermajority is checked after every tallied vote so the
        // vote completing it triggers the commit immediately.
        if self.ordering.have_supermajority(count) {
            self.commit_locally(hash);
        } else {
            self.try_reject();
        }
        Ok(())
    }

    /// Handles an inbound commit message.
    ///
    /// Replays on an already-terminal round are no-ops.
    pub fn on_commit(&mut self, from: &Peer, commit: CommitMessage) -> Result<(), ConsensusError> {
        if self.state.is_terminal() {
            return Ok(());
        }
        if !self.crypto.verify_commit(&commit) {
            return Err(ConsensusError::InvalidSignature);
        }
        if !self.ordering.have_supermajority(commit.unique_voters()) {
            return Err(ConsensusError::InvalidMessage("commit below supermajority"));
        }
        tracing::info!(peer = %from.address, "commit received");
        self.state = RoundState::Committed;
        self.timer.deny();
        let _ = self.commit_tx.send(commit);
        Ok(())
    }

    /// Handles an inbound reject message.
    pub fn on_reject(&mut self, from: &Peer, reject: RejectMessage) -> Result<(), ConsensusError> {
        if self.state.is_terminal() {
            return Ok(());
        }
        if !self.crypto.verify_reject(&reject) {
            return Err(ConsensusError::InvalidSignature);
        }
        if !self.reject_proves_impossibility(&reject) {
            return Err(ConsensusError::InvalidMessage(
                "reject does not prove supermajority impossible",
            ));
        }
        tracing::info!(peer = %from.address, "reject received");
        self.state = RoundState::Rejected;
        self.timer.deny();
        let _ = self.reject_tx.send(reject);
        Ok(())
    }

    /// Handles expiry of the round timer.
    ///
    /// Rotates the leader; inside the validate set the local vote is
    /// rebroadcast and the timer re-armed, beyond it the round is
    /// abandoned.
    pub fn on_timeout(&mut self) -> Result<(), ConsensusError> {
        if self.state.is_terminal() {
            return Ok(());
        }
        self.ordering.switch_to_next();
        if self.ordering.leader_in_validate_set() {
            tracing::debug!(
                leader = %self.ordering.current_leader().address,
                "round timed out, rotating leader"
            );
            if let Some(vote) = self.last_vote.clone() {
                for peer in self.ordering.peers() {
                    self.network.send_vote(peer, vote.clone());
                }
            }
            self.timer.start(self.vote_delay);
            Ok(())
        } else {
            tracing::warn!("rotation left the validate set, abandoning round");
            self.state = RoundState::Abandoned;
            self.timer.deny();
            Err(ConsensusError::RoundAbandoned)
        }
    }

    /// Emits a commit built from the locally collected votes for
    /// `hash`.
    fn commit_locally(&mut self, hash: YacHash) {
        let votes = self.tally.get(&hash).cloned().unwrap_or_default();
        tracing::info!(
            block = %hash.block_hash.to_hex(),
            votes = votes.len(),
            "supermajority reached"
        );
        self.state = RoundState::Committed;
        self.timer.deny();
        let _ = self.commit_tx.send(CommitMessage::new(votes));
    }

    /// Emits a reject if no candidate hash can still reach
    /// supermajority with the votes that remain outstanding.
    fn try_reject(&mut self) {
        let outstanding = self.ordering.len().saturating_sub(self.voted.len());
        let best = self.tally.values().map(Vec::len).max().unwrap_or(0);
        if self.ordering.have_supermajority(best + outstanding) {
            return;
        }
        let votes: Vec<VoteMessage> = self.tally.values().flatten().cloned().collect();
        tracing::info!(votes = votes.len(), "supermajority impossible, rejecting round");
        self.state = RoundState::Rejected;
        self.timer.deny();
        let _ = self.reject_tx.send(RejectMessage::new(votes));
    }

    /// Checks that the votes inside a reject message really rule out
    /// supermajority for every hash, given this cluster snapshot.
    fn reject_proves_impossibility(&self, reject: &RejectMessage) -> bool {
        let mut per_hash: HashMap<YacHash, usize> = HashMap::new();
        let mut voters = std::collections::HashSet::new();
        for vote in &reject.votes {
            if voters.insert(*vote.voter()) {
                *per_hash.entry(vote.hash).or_default() += 1;
            }
        }
        let outstanding = self.ordering.len().saturating_sub(voters.len());
        let best = per_hash.values().copied().max().unwrap_or(0);
        !self.ordering.have_supermajority(best + outstanding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consensus::crypto::Ed25519Crypto;
    use crate::types::Hash256;
    use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
    use std::sync::{Arc, Mutex};

    /// What a fake network saw leave the engine.
    #[derive(Debug)]
    enum Sent {
        Vote(Peer),
        Commit(Peer),
        Reject(Peer),
    }

    #[derive(Clone, Default)]
    struct FakeNetwork {
        sent: Arc<Mutex<Vec<Sent>>>,
    }

    impl FakeNetwork {
        fn votes_sent(&self) -> usize {
            self.count(|s| matches!(s, Sent::Vote(_)))
        }

        fn commits_sent(&self) -> usize {
            self.count(|s| matches!(s, Sent::Commit(_)))
        }

        fn rejects_sent(&self) -> usize {
            self.count(|s| matches!(s, Sent::Reject(_)))
        }

        fn count(&self, pred: impl Fn(&Sent) -> bool) -> usize {
            self.sent.lock().unwrap().iter().filter(|s| pred(s)).count()
        }
    }

    impl Network for FakeNetwork {
        fn send_vote(&self, peer: &Peer, _vote: VoteMessage) {
            self.sent.lock().unwrap().push(Sent::Vote(peer.clone()));
        }

        fn send_commit(&self, peer: &Peer, _commit: CommitMessage) {
            self.sent.lock().unwrap().push(Sent::Commit(peer.clone()));
        }

        fn send_reject(&self, peer: &Peer, _reject: RejectMessage) {
            self.sent.lock().unwrap().push(Sent::Reject(peer.clone()));
        }
    }

    #[derive(Clone, Default)]
    struct FakeTimer {
        started: Arc<AtomicUsize>,
        denied: Arc<AtomicUsize>,
    }

    impl RoundTimer for FakeTimer {
        fn start(&mut self, _delay: Duration) {
            self.started.fetch_add(1, AtomicOrdering::SeqCst);
        }

        fn deny(&mut self) {
            self.denied.fetch_add(1, AtomicOrdering::SeqCst);
        }
    }

    /// Wraps a real provider and counts vote verifications.
    struct CountingCrypto {
        inner: Ed25519Crypto,
        vote_verifications: Arc<AtomicUsize>,
    }

    impl CryptoProvider for CountingCrypto {
        fn public_key(&self) -> PublicKey {
            self.inner.public_key()
        }

        fn get_vote(&self, hash: YacHash) -> VoteMessage {
            self.inner.get_vote(hash)
        }

        fn verify_vote(&self, vote: &VoteMessage) -> bool {
            self.vote_verifications.fetch_add(1, AtomicOrdering::SeqCst);
            self.inner.verify_vote(vote)
        }

        fn verify_commit(&self, commit: &CommitMessage) -> bool {
            self.inner.verify_commit(commit)
        }

        fn verify_reject(&self, reject: &RejectMessage) -> bool {
            self.inner.verify_reject(reject)
        }
    }

    fn crypto_at(i: u8) -> Ed25519Crypto {
        Ed25519Crypto::from_seed([i + 1; 32])
    }

    fn peer_at(i: u8) -> Peer {
        Peer {
            address: format!("127.0.0.1:{}", 5_550 + i as u16),
            public_key: crypto_at(i).public_key(),
        }
    }

    fn ordering_of(n: u8) -> ClusterOrdering {
        ClusterOrdering::new((0..n).map(peer_at).collect()).expect("non-empty")
    }

    fn yac_hash(p: &[u8], b: &[u8]) -> YacHash {
        YacHash::new(Hash256::compute(p), Hash256::compute(b))
    }

    struct Harness {
        engine: YacEngine<FakeNetwork, CountingCrypto, FakeTimer>,
        network: FakeNetwork,
        timer: FakeTimer,
        vote_verifications: Arc<AtomicUsize>,
    }

    fn harness(n: u8) -> Harness {
        let network = FakeNetwork::default();
        let timer = FakeTimer::default();
        let vote_verifications = Arc::new(AtomicUsize::new(0));
        let crypto = CountingCrypto {
            inner: crypto_at(0),
            vote_verifications: vote_verifications.clone(),
        };
        let engine = YacEngine::new(
            network.clone(),
            crypto,
            timer.clone(),
            Duration::from_millis(100),
            ordering_of(n),
        );
        Harness {
            engine,
            network,
            timer,
            vote_verifications,
        }
    }

    #[test]
    fn cold_start_single_vote_emits_nothing() {
        let mut h = harness(4);
        let mut commits = h.engine.commits();
        let hash = yac_hash(b"my_proposal", b"my_block");

        h.engine
            .on_vote(&peer_at(1), crypto_at(1).get_vote(hash))
            .expect("valid vote");

        assert!(commits.try_recv().is_err());
        assert_eq!(h.network.votes_sent(), 0);
        assert_eq!(h.network.commits_sent(), 0);
        assert_eq!(h.network.rejects_sent(), 0);
        assert_eq!(h.vote_verifications.load(AtomicOrdering::SeqCst), 1);
        assert_eq!(h.engine.state(), RoundState::Idle);
    }

    #[test]
    fn cold_start_supermajority_commits_once() {
        let mut h = harness(4);
        let mut commits = h.engine.commits();
        let hash = yac_hash(b"my_proposal", b"my_block");

        for i in 0..4 {
            h.engine
                .on_vote(&peer_at(i), crypto_at(i).get_vote(hash))
                .expect("valid vote");
        }

        let commit = commits.try_recv().expect("one commit emitted");
        assert_eq!(commit.hash(), Some(&hash));
        // 2f + 1 = 3 votes completed the commit; the fourth was late.
        assert_eq!(commit.votes.len(), 3);
        assert!(commits.try_recv().is_err(), "exactly one emission");

        assert_eq!(h.engine.state(), RoundState::Committed);
        assert!(h.timer.denied.load(AtomicOrdering::SeqCst) >= 1);
        assert_eq!(h.network.votes_sent(), 0);
        assert_eq!(h.vote_verifications.load(AtomicOrdering::SeqCst), 4);
    }

    #[test]
    fn commit_message_arrival_commits_and_denies_timer() {
        let mut h = harness(4);
        let mut commits = h.engine.commits();
        let hash = yac_hash(b"my_proposal", b"my_block");

        let commit = CommitMessage::new((0..4).map(|i| crypto_at(i).get_vote(hash)).collect());
        h.engine
            .on_commit(&peer_at(0), commit.clone())
            .expect("valid commit");

        let emitted = commits.try_recv().expect("one commit emitted");
        assert_eq!(emitted.hash(), Some(&hash));
        assert!(h.timer.denied.load(AtomicOrdering::SeqCst) >= 1);
        assert_eq!(h.engine.state(), RoundState::Committed);

        // Replaying the same commit on a committed round is a no-op.
        h.engine.on_commit(&peer_at(1), commit).expect("idempotent");
        assert!(commits.try_recv().is_err());
    }

    #[test]
    fn local_vote_broadcasts_to_every_peer() {
        let mut h = harness(4);
        let mut commits = h.engine.commits();
        let mut rejects = h.engine.rejects();

        h.engine
            .vote(yac_hash(b"my_proposal", b"my_block"), ordering_of(4));

        assert_eq!(h.network.votes_sent(), 4);
        assert_eq!(h.network.commits_sent(), 0);
        assert_eq!(h.network.rejects_sent(), 0);
        assert!(commits.try_recv().is_err());
        assert!(rejects.try_recv().is_err());
        assert_eq!(h.timer.started.load(AtomicOrdering::SeqCst), 1);
        assert_eq!(h.engine.state(), RoundState::Voting);
    }

    #[test]
    fn invalid_signature_is_dropped_and_not_counted() {
        let mut h = harness(4);
        let hash = yac_hash(b"p", b"b");

        let mut forged = crypto_at(1).get_vote(hash);
        forged.hash = yac_hash(b"p", b"forged");
        assert_eq!(
            h.engine.on_vote(&peer_at(1), forged),
            Err(ConsensusError::InvalidSignature)
        );

        // The forging peer can still vote properly afterwards; commit
        // requires three valid votes regardless of the dropped one.
        let mut commits = h.engine.commits();
        for i in 1..4 {
            h.engine
                .on_vote(&peer_at(i), crypto_at(i).get_vote(hash))
                .expect("valid vote");
        }
        assert!(commits.try_recv().is_ok());
    }

    #[test]
    fn duplicate_votes_are_idempotent() {
        let mut h = harness(4);
        let mut commits = h.engine.commits();
        let hash = yac_hash(b"p", b"b");

        let repeated = crypto_at(1).get_vote(hash);
        h.engine.on_vote(&peer_at(1), repeated.clone()).expect("first");
        h.engine.on_vote(&peer_at(1), repeated).expect("duplicate");
        assert!(commits.try_recv().is_err());

        h.engine
            .on_vote(&peer_at(2), crypto_at(2).get_vote(hash))
            .expect("second voter");
        assert!(commits.try_recv().is_err());

        h.engine
            .on_vote(&peer_at(3), crypto_at(3).get_vote(hash))
            .expect("third voter");
        let commit = commits.try_recv().expect("commit at three distinct voters");
        assert_eq!(commit.unique_voters(), 3);
    }

    #[test]
    fn conflicting_vote_counts_only_the_first() {
        let mut h = harness(4);
        let mut commits = h.engine.commits();
        let first = yac_hash(b"p", b"first");
        let second = yac_hash(b"p", b"second");

        h.engine
            .on_vote(&peer_at(1), crypto_at(1).get_vote(first))
            .expect("first vote");
        // Same peer equivocates; only the first vote may count.
        h.engine
            .on_vote(&peer_at(1), crypto_at(1).get_vote(second))
            .expect("conflict is swallowed");

        h.engine
            .on_vote(&peer_at(2), crypto_at(2).get_vote(second))
            .expect("vote");
        h.engine
            .on_vote(&peer_at(3), crypto_at(3).get_vote(second))
            .expect("vote");
        assert!(
            commits.try_recv().is_err(),
            "two distinct voters are below supermajority"
        );

        h.engine
            .on_vote(&peer_at(0), crypto_at(0).get_vote(second))
            .expect("vote");
        let commit = commits.try_recv().expect("commit for the second hash");
        assert_eq!(commit.hash(), Some(&second));
        assert!(commit.votes.iter().all(|v| *v.voter() != peer_at(1).public_key));
    }

    #[test]
    fn reject_emitted_when_supermajority_impossible() {
        let mut h = harness(4);
        let mut rejects = h.engine.rejects();

        // Three peers split across three hashes: best = 1, outstanding
        // = 1, so no hash can reach 3 votes anymore.
        h.engine
            .on_vote(&peer_at(0), crypto_at(0).get_vote(yac_hash(b"p", b"a")))
            .expect("vote");
        h.engine
            .on_vote(&peer_at(1), crypto_at(1).get_vote(yac_hash(b"p", b"b")))
            .expect("vote");
        assert!(rejects.try_recv().is_err(), "still possible after two votes");

        h.engine
            .on_vote(&peer_at(2), crypto_at(2).get_vote(yac_hash(b"p", b"c")))
            .expect("vote");

        let reject = rejects.try_recv().expect("reject emitted");
        assert_eq!(reject.unique_voters(), 3);
        assert_eq!(h.engine.state(), RoundState::Rejected);
        assert!(h.timer.denied.load(AtomicOrdering::SeqCst) >= 1);
    }

    #[test]
    fn reject_message_arrival_is_verified_against_the_cluster() {
        let mut h = harness(4);
        let mut rejects = h.engine.rejects();

        // A "reject" whose votes all agree does not prove impossibility.
        let agreeing = RejectMessage::new(
            (0..3)
                .map(|i| crypto_at(i).get_vote(yac_hash(b"p", b"b")))
                .collect(),
        );
        assert_eq!(
            h.engine.on_reject(&peer_at(1), agreeing),
            Err(ConsensusError::InvalidMessage(
                "reject does not prove supermajority impossible"
            ))
        );

        let split = RejectMessage::new(vec![
            crypto_at(0).get_vote(yac_hash(b"p", b"a")),
            crypto_at(1).get_vote(yac_hash(b"p", b"b")),
            crypto_at(2).get_vote(yac_hash(b"p", b"c")),
        ]);
        h.engine.on_reject(&peer_at(1), split).expect("valid reject");
        assert!(rejects.try_recv().is_ok());
        assert_eq!(h.engine.state(), RoundState::Rejected);
    }

    #[test]
    fn timeout_rotates_within_the_validate_set() {
        let mut h = harness(4);
        h.engine.vote(yac_hash(b"p", b"b"), ordering_of(4));
        assert_eq!(h.network.votes_sent(), 4);
        assert_eq!(h.timer.started.load(AtomicOrdering::SeqCst), 1);

        // N = 4, f = 1: positions 1 and 2 are still in the validate
        // set, so two timeouts rebroadcast and re-arm.
        h.engine.on_timeout().expect("rotation 1");
        assert_eq!(h.network.votes_sent(), 8);
        assert_eq!(h.timer.started.load(AtomicOrdering::SeqCst), 2);

        h.engine.on_timeout().expect("rotation 2");
        assert_eq!(h.network.votes_sent(), 12);

        // Position 3 is beyond the validate set: the round dies.
        assert_eq!(h.engine.on_timeout(), Err(ConsensusError::RoundAbandoned));
        assert_eq!(h.engine.state(), RoundState::Abandoned);

        // A straggling timer tick after abandonment is a no-op.
        h.engine.on_timeout().expect("terminal no-op");
        assert_eq!(h.network.votes_sent(), 12);
    }

    #[test]
    fn votes_after_commit_change_nothing() {
        let mut h = harness(4);
        let mut commits = h.engine.commits();
        let hash = yac_hash(b"p", b"b");

        for i in 0..3 {
            h.engine
                .on_vote(&peer_at(i), crypto_at(i).get_vote(hash))
                .expect("vote");
        }
        assert!(commits.try_recv().is_ok());

        h.engine
            .on_vote(&peer_at(3), crypto_at(3).get_vote(hash))
            .expect("late vote is a no-op");
        assert!(commits.try_recv().is_err());
        assert_eq!(h.engine.state(), RoundState::Committed);
    }

    #[test]
    fn voting_after_a_terminal_round_discards_old_tallies() {
        let mut h = harness(4);
        let mut commits = h.engine.commits();
        let hash = yac_hash(b"p", b"b");

        for i in 0..3 {
            h.engine
                .on_vote(&peer_at(i), crypto_at(i).get_vote(hash))
                .expect("vote");
        }
        assert!(commits.try_recv().is_ok());

        // A fresh round over the same peers: their round-one votes
        // must not register as conflicts.
        let next = yac_hash(b"p2", b"b2");
        h.engine.vote(next, ordering_of(4));
        assert_eq!(h.engine.state(), RoundState::Voting);

        for i in 0..3 {
            h.engine
                .on_vote(&peer_at(i), crypto_at(i).get_vote(next))
                .expect("vote");
        }
        let commit = commits.try_recv().expect("second round commits");
        assert_eq!(commit.hash(), Some(&next));
    }

    #[test]
    fn commit_below_supermajority_is_refused() {
        let mut h = harness(4);
        let hash = yac_hash(b"p", b"b");
        let thin = CommitMessage::new((0..2).map(|i| crypto_at(i).get_vote(hash)).collect());
        assert_eq!(
            h.engine.on_commit(&peer_at(0), thin),
            Err(ConsensusError::InvalidMessage("commit below supermajority"))
        );
        assert_eq!(h.engine.state(), RoundState::Idle);
    }
}

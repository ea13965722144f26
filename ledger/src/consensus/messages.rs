//! YAC wire messages.
//!
//! A round votes on a [`YacHash`], the two-component identity of a
//! proposal and the block built from it. Votes are signed individually;
//! a commit is a collection of votes on the same hash that together
//! exceed supermajority, and a reject is a collection of votes proving
//! that no hash can reach supermajority anymore.
//!
//! Canonical encoding is bincode 2 with the `standard()` config:
//! length-prefixed, field-ordered, identical across nodes.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::types::{Hash256, PeerSignature, PublicKey};

/// Two-component identity of what a round is voting on.
///
/// Equality and hashing combine both components; two rounds over the
/// same proposal but different blocks are distinct.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct YacHash {
    /// Hash of the ordered transaction proposal.
    pub proposal_hash: Hash256,
    /// Hash of the block built from the proposal.
    pub block_hash: Hash256,
}

impl YacHash {
    pub fn new(proposal_hash: Hash256, block_hash: Hash256) -> Self {
        Self {
            proposal_hash,
            block_hash,
        }
    }

    /// Canonical bincode-2 encoding, the byte string votes sign over.
    pub fn canonical_bytes(&self) -> Vec<u8> {
        let cfg = bincode::config::standard();
        bincode::serde::encode_to_vec(self, cfg).expect("YacHash should always be serializable")
    }
}

/// One peer's signed vote for a [`YacHash`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteMessage {
    pub hash: YacHash,
    pub signature: PeerSignature,
}

impl VoteMessage {
    /// Public key of the voter.
    pub fn voter(&self) -> &PublicKey {
        &self.signature.public_key
    }

    /// Canonical bincode-2 encoding for the wire.
    pub fn canonical_bytes(&self) -> Vec<u8> {
        let cfg = bincode::config::standard();
        bincode::serde::encode_to_vec(self, cfg).expect("VoteMessage should always be serializable")
    }

    /// Decodes a vote from its canonical encoding.
    pub fn decode(bytes: &[u8]) -> Option<Self> {
        let cfg = bincode::config::standard();
        let (vote, _) = bincode::serde::decode_from_slice(bytes, cfg).ok()?;
        Some(vote)
    }
}

/// Proof that the cluster agreed on one hash: votes for the same
/// [`YacHash`] exceeding supermajority.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitMessage {
    pub votes: Vec<VoteMessage>,
}

impl CommitMessage {
    pub fn new(votes: Vec<VoteMessage>) -> Self {
        Self { votes }
    }

    /// The agreed hash, if the message carries any votes at all.
    pub fn hash(&self) -> Option<&YacHash> {
        self.votes.first().map(|v| &v.hash)
    }

    /// `true` if every vote targets the same hash.
    pub fn is_unanimous(&self) -> bool {
        match self.votes.split_first() {
            None => false,
            Some((first, rest)) => rest.iter().all(|v| v.hash == first.hash),
        }
    }

    /// Number of distinct voters; duplicates never count twice toward
    /// supermajority.
    pub fn unique_voters(&self) -> usize {
        self.votes
            .iter()
            .map(VoteMessage::voter)
            .collect::<HashSet<_>>()
            .len()
    }

    /// Canonical bincode-2 encoding for the wire.
    pub fn canonical_bytes(&self) -> Vec<u8> {
        let cfg = bincode::config::standard();
        bincode::serde::encode_to_vec(self, cfg)
            .expect("CommitMessage should always be serializable")
    }

    /// Decodes a commit from its canonical encoding.
    pub fn decode(bytes: &[u8]) -> Option<Self> {
        let cfg = bincode::config::standard();
        let (commit, _) = bincode::serde::decode_from_slice(bytes, cfg).ok()?;
        Some(commit)
    }
}

/// Proof that no hash can reach supermajority in this round.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectMessage {
    pub votes: Vec<VoteMessage>,
}

impl RejectMessage {
    pub fn new(votes: Vec<VoteMessage>) -> Self {
        Self { votes }
    }

    /// Number of distinct voters across the collected votes.
    pub fn unique_voters(&self) -> usize {
        self.votes
            .iter()
            .map(VoteMessage::voter)
            .collect::<HashSet<_>>()
            .len()
    }

    /// Canonical bincode-2 encoding for the wire.
    pub fn canonical_bytes(&self) -> Vec<u8> {
        let cfg = bincode::config::standard();
        bincode::serde::encode_to_vec(self, cfg)
            .expect("RejectMessage should always be serializable")
    }

    /// Decodes a reject from its canonical encoding.
    pub fn decode(bytes: &[u8]) -> Option<Self> {
        let cfg = bincode::config::standard();
        let (reject, _) = bincode::serde::decode_from_slice(bytes, cfg).ok()?;
        Some(reject)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{SIGNATURE_LEN, SignatureBytes};

    fn yac_hash(p: &[u8], b: &[u8]) -> YacHash {
        YacHash::new(Hash256::compute(p), Hash256::compute(b))
    }

    fn vote(hash: YacHash, voter: u8) -> VoteMessage {
        VoteMessage {
            hash,
            signature: PeerSignature {
                public_key: PublicKey([voter; 32]),
                signature: SignatureBytes([voter; SIGNATURE_LEN]),
            },
        }
    }

    #[test]
    fn yac_hash_equality_combines_both_components() {
        let a = yac_hash(b"p", b"b");
        assert_eq!(a, yac_hash(b"p", b"b"));
        assert_ne!(a, yac_hash(b"p", b"other"));
        assert_ne!(a, yac_hash(b"other", b"b"));
    }

    #[test]
    fn commit_unanimity_and_voter_counting() {
        let h = yac_hash(b"p", b"b");
        let commit = CommitMessage::new(vec![vote(h, 1), vote(h, 2), vote(h, 1)]);
        assert!(commit.is_unanimous());
        assert_eq!(commit.unique_voters(), 2);
        assert_eq!(commit.hash(), Some(&h));

        let mixed = CommitMessage::new(vec![vote(h, 1), vote(yac_hash(b"p", b"x"), 2)]);
        assert!(!mixed.is_unanimous());

        assert!(!CommitMessage::new(Vec::new()).is_unanimous());
    }

    #[test]
    fn vote_wire_roundtrip() {
        let v = vote(yac_hash(b"p", b"b"), 7);
        let decoded = VoteMessage::decode(&v.canonical_bytes()).expect("decode");
        assert_eq!(v, decoded);
    }
}

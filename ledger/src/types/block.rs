//! Block type and hashing.
//!
//! Blocks form an append-only chain: each block links to its parent by
//! hash and carries a serial-chained integrity root over its
//! transactions. The genesis block has height 1 and a zero previous
//! hash.
//!
//! Serialization uses **bincode 2** with the `serde` integration and an
//! explicit `standard()` config; the block hash covers the canonical
//! encoding of the payload fields only (signatures and the derived
//! `hash` field are excluded).

use serde::{Deserialize, Serialize};

use super::merkle::MerkleAccumulator;
use super::{Hash256, PeerSignature, Transaction};

/// A committed unit of the chain: header fields plus transactions.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// Position in the chain; the genesis block has height 1.
    pub height: u64,

    /// Wall-clock creation timestamp, milliseconds since Unix epoch.
    pub created_ts: u64,

    /// Hash of the previous block; zero for genesis.
    pub prev_hash: Hash256,

    /// Serial-chained root over the payload hashes of `transactions`.
    pub merkle_root: Hash256,

    /// Transaction count, redundant with `transactions.len()` but kept
    /// in the payload so the hash commits to it.
    pub txs_number: u16,

    /// Ordered list of transactions in this block.
    pub transactions: Vec<Transaction>,

    /// Payload hash of this block, fixed at production time.
    pub hash: Hash256,

    /// Validator signatures over the payload.
    #[serde(default)]
    pub signatures: Vec<PeerSignature>,
}

/// Borrowed view of the hashed portion of a block.
///
/// Field order defines the canonical payload encoding; it must not be
/// reordered.
#[derive(Serialize)]
struct BlockPayload<'a> {
    height: u64,
    created_ts: u64,
    prev_hash: &'a Hash256,
    merkle_root: &'a Hash256,
    txs_number: u16,
    transactions: &'a [Transaction],
}

impl Block {
    /// Builds a block on top of `prev_hash`, deriving the merkle root,
    /// the transaction count, and the block hash from the contents.
    ///
    /// The root folds every transaction's payload hash in insertion
    /// order.
    pub fn produce(
        height: u64,
        prev_hash: Hash256,
        created_ts: u64,
        transactions: Vec<Transaction>,
    ) -> Self {
        let leaf_hashes: Vec<Hash256> = transactions.iter().map(Transaction::hash).collect();
        let merkle_root = MerkleAccumulator::root_of(&leaf_hashes);
        let mut block = Block {
            height,
            created_ts,
            prev_hash,
            merkle_root,
            txs_number: transactions.len() as u16,
            transactions,
            hash: Hash256::ZERO,
            signatures: Vec::new(),
        };
        block.hash = block.compute_hash();
        block
    }

    /// Builds the genesis block (height 1, zero previous hash).
    pub fn genesis(created_ts: u64, transactions: Vec<Transaction>) -> Self {
        Self::produce(1, Hash256::ZERO, created_ts, transactions)
    }

    /// Canonical bincode-2 encoding of the payload fields.
    ///
    /// # Panics
    ///
    /// Panics if encoding fails, which would mean a non-serializable
    /// payload field and is a programming error.
    pub fn payload_bytes(&self) -> Vec<u8> {
        let payload = BlockPayload {
            height: self.height,
            created_ts: self.created_ts,
            prev_hash: &self.prev_hash,
            merkle_root: &self.merkle_root,
            txs_number: self.txs_number,
            transactions: &self.transactions,
        };
        let cfg = bincode::config::standard();
        bincode::serde::encode_to_vec(&payload, cfg)
            .expect("block payload should always be serializable")
    }

    /// SHA3-256 digest of the canonical payload encoding.
    ///
    /// `produce` stores this in the `hash` field; recomputing lets
    /// consumers check integrity of blocks received from elsewhere.
    pub fn compute_hash(&self) -> Hash256 {
        Hash256::compute(&self.payload_bytes())
    }

    /// Appends a validator signature.
    pub fn add_signature(&mut self, signature: PeerSignature) {
        self.signatures.push(signature);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AccountId, PublicKey, SIGNATURE_LEN, SignatureBytes};

    fn dummy_tx(creator: &str, counter: u64) -> Transaction {
        Transaction::new(
            AccountId::new(creator, "test"),
            counter,
            1_600_000_000_000 + counter,
            Vec::new(),
        )
    }

    #[test]
    fn produce_links_and_counts() {
        let genesis = Block::genesis(1_600_000_000_000, vec![dummy_tx("alice", 0)]);
        assert_eq!(genesis.height, 1);
        assert!(genesis.prev_hash.is_zero());
        assert_eq!(genesis.txs_number, 1);
        assert_eq!(genesis.hash, genesis.compute_hash());

        let next = Block::produce(
            2,
            genesis.hash,
            1_600_000_001_000,
            vec![dummy_tx("alice", 1), dummy_tx("bob", 0)],
        );
        assert_eq!(next.height, genesis.height + 1);
        assert_eq!(next.prev_hash, genesis.hash);
        assert_eq!(next.txs_number, 2);
    }

    #[test]
    fn hash_is_stable_under_signing() {
        let mut block = Block::genesis(1_600_000_000_000, vec![dummy_tx("alice", 0)]);
        let before = block.hash;
        block.add_signature(PeerSignature {
            public_key: PublicKey([1; 32]),
            signature: SignatureBytes([2; SIGNATURE_LEN]),
        });
        assert_eq!(before, block.compute_hash());
    }

    #[test]
    fn merkle_root_covers_every_transaction_in_order() {
        let txs = vec![dummy_tx("alice", 0), dummy_tx("bob", 0)];
        let block = Block::genesis(1_600_000_000_000, txs.clone());

        let mut reversed = txs;
        reversed.reverse();
        let swapped = Block::genesis(1_600_000_000_000, reversed);

        assert_ne!(block.merkle_root, swapped.merkle_root);
        assert_ne!(block.hash, swapped.hash);

        // A single-transaction block must not have the empty root: the
        // first leaf is folded in like every other one.
        let single = Block::genesis(1_600_000_000_000, vec![dummy_tx("alice", 0)]);
        assert_ne!(single.merkle_root, Hash256::ZERO);
    }

    #[test]
    fn empty_block_has_zero_merkle_root() {
        let block = Block::genesis(1_600_000_000_000, Vec::new());
        assert_eq!(block.merkle_root, Hash256::ZERO);
        assert_eq!(block.txs_number, 0);
    }
}

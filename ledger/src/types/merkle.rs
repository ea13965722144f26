//! Serial-chaining hash accumulator for block integrity roots.
//!
//! The accumulator folds a sequence of leaf digests into a single root:
//! starting from the zero digest, each leaf updates the state as
//! `state := H(state || leaf)`. The root over the empty sequence is the
//! zero digest. Serial chaining is order- and prefix-sensitive, which is
//! all block hashing needs; block hashes depend on this exact rule, so it
//! must not change.

use super::{HASH_LEN, Hash256};

/// Deterministic accumulator producing one root over a leaf sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MerkleAccumulator {
    state: Hash256,
}

impl Default for MerkleAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

impl MerkleAccumulator {
    /// Creates an empty accumulator whose root is the zero digest.
    pub fn new() -> Self {
        Self {
            state: Hash256::ZERO,
        }
    }

    /// Folds one leaf into the accumulator state.
    pub fn add(&mut self, leaf: &Hash256) {
        let mut buf = [0u8; HASH_LEN * 2];
        buf[..HASH_LEN].copy_from_slice(self.state.as_bytes());
        buf[HASH_LEN..].copy_from_slice(leaf.as_bytes());
        self.state = Hash256::compute(&buf);
    }

    /// Returns the current root.
    pub fn root(&self) -> Hash256 {
        self.state
    }

    /// Convenience: folds every leaf of an iterator and returns the root.
    pub fn root_of<'a, I>(leaves: I) -> Hash256
    where
        I: IntoIterator<Item = &'a Hash256>,
    {
        let mut acc = Self::new();
        for leaf in leaves {
            acc.add(leaf);
        }
        acc.root()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaves(words: &[&str]) -> Vec<Hash256> {
        words.iter().map(|w| Hash256::compute(w.as_bytes())).collect()
    }

    #[test]
    fn empty_root_is_zero() {
        assert_eq!(MerkleAccumulator::new().root(), Hash256::ZERO);
    }

    #[test]
    fn root_of_same_sequence_matches() {
        let seq = leaves(&["The", "quick", "brown", "fox"]);
        let a = MerkleAccumulator::root_of(&seq);
        let b = MerkleAccumulator::root_of(&seq);
        assert_eq!(a, b);
        assert_ne!(a, Hash256::ZERO);
    }

    #[test]
    fn root_is_prefix_sensitive() {
        let long = leaves(&["The", "quick", "brown", "fox"]);
        let short = leaves(&["The", "quick", "brown"]);
        assert_ne!(
            MerkleAccumulator::root_of(&long),
            MerkleAccumulator::root_of(&short)
        );
    }

    #[test]
    fn root_is_order_sensitive() {
        let seq = leaves(&["The", "quick", "brown", "fox"]);
        let mut shuffled = seq.clone();
        shuffled.swap(0, 3);
        assert_ne!(
            MerkleAccumulator::root_of(&seq),
            MerkleAccumulator::root_of(&shuffled)
        );
    }

    #[test]
    fn incremental_and_batch_roots_agree() {
        let seq = leaves(&["a", "b", "c"]);
        let mut acc = MerkleAccumulator::new();
        for leaf in &seq {
            acc.add(leaf);
        }
        assert_eq!(acc.root(), MerkleAccumulator::root_of(&seq));
    }
}

//! In-memory block store.
//!
//! Blocks live in a `Vec` ordered by height, so height `h` sits at
//! index `h - 1`. Useful for unit tests, benchmarks, and small
//! devnets.

use crate::types::Block;

use super::{BlockStore, extends_chain};

/// In-memory implementation of [`BlockStore`].
#[derive(Default)]
pub struct InMemoryBlockStore {
    blocks: Vec<Block>,
}

impl InMemoryBlockStore {
    /// Creates a new, empty in-memory block store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of blocks currently stored.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Returns `true` if no blocks are stored.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

impl BlockStore for InMemoryBlockStore {
    fn insert(&mut self, block: Block) -> bool {
        if !extends_chain(self.blocks.last(), &block) {
            return false;
        }
        self.blocks.push(block);
        true
    }

    fn get_by_height(&self, height: u64) -> Option<Block> {
        if height == 0 {
            return None;
        }
        self.blocks.get(height as usize - 1).cloned()
    }

    fn top_height(&self) -> Option<u64> {
        match self.blocks.len() {
            0 => None,
            n => Some(n as u64),
        }
    }

    fn drop_storage(&mut self) {
        self.blocks.clear();
    }
}

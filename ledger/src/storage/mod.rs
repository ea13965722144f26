//! Block storage backends.
//!
//! The store is an append-only log of blocks indexed by height. Insert
//! enforces the chain invariants; a violating block is refused and the
//! store is left unchanged. Concrete backends:
//!
//! - [`mem::InMemoryBlockStore`] for tests and devnets,
//! - [`rocksdb::RocksDbBlockStore`] for persistent nodes.

use crate::types::Block;

pub mod mem;
pub mod rocksdb;

pub use mem::InMemoryBlockStore;
pub use rocksdb::{RocksDbBlockStore, RocksDbConfig, StorageError};

/// Append-only block log.
///
/// Readers may run concurrently with the single writer; a block is
/// visible atomically once `insert` has returned `true`.
pub trait BlockStore {
    /// Appends a block if it extends the chain.
    ///
    /// The first block must have height 1 and a zero previous hash;
    /// every later block must have `height = top.height + 1` and
    /// `prev_hash = top.hash`. Returns `false` (store unchanged) on
    /// violation.
    fn insert(&mut self, block: Block) -> bool;

    /// Random read by height. Heights start at 1.
    fn get_by_height(&self, height: u64) -> Option<Block>;

    /// Height of the newest block, if any.
    fn top_height(&self) -> Option<u64>;

    /// Removes every block atomically.
    fn drop_storage(&mut self);
}

/// Shared admissibility rule for [`BlockStore::insert`].
pub(crate) fn extends_chain(top: Option<&Block>, block: &Block) -> bool {
    if block.txs_number as usize != block.transactions.len() {
        return false;
    }
    match top {
        None => block.height == 1 && block.prev_hash.is_zero(),
        Some(top) => block.height == top.height + 1 && block.prev_hash == top.hash,
    }
}

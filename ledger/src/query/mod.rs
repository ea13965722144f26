//! Ledger query layer.
//!
//! Read-only, paginated views over the committed chain: newest-first
//! block and transaction history with a content-addressed cursor. See
//! [`block_query::BlockQuery`] for the operations.

use crate::types::Hash256;

pub mod block_query;

pub use block_query::BlockQuery;

/// Cursor for paginated history queries.
///
/// `tx_hash` is an *exclusive* cursor: when the hash occurs in the
/// filtered newest-first stream, results start right after it. The
/// zero digest means "no cursor"; a hash that never occurs in the
/// stream is treated the same way. `limit` caps the number of emitted
/// transactions; zero yields the empty sequence.
///
/// The cursor is content-addressed, so it stays stable across storage
/// compaction, unlike block numbers or offsets.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pager {
    pub tx_hash: Hash256,
    pub limit: u32,
}

impl Pager {
    pub fn new(tx_hash: Hash256, limit: u32) -> Self {
        Self { tx_hash, limit }
    }

    /// A pager with no cursor: the newest `limit` matches.
    pub fn latest(limit: u32) -> Self {
        Self {
            tx_hash: Hash256::ZERO,
            limit,
        }
    }
}

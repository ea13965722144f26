//! Paginated queries over the committed chain.
//!
//! All history queries walk blocks newest to oldest and, within each
//! block, transactions in reverse insertion order. The iterators are
//! lazy and consumer-driven: one block is materialized at a time, and
//! nothing past the pager limit is ever read.
//!
//! A query borrows the store for its whole lifetime, which pins the
//! view: the single writer cannot append mid-scan, so a consumed
//! iterator reflects one consistent chain state.

use crate::storage::BlockStore;
use crate::types::{AccountId, AssetId, Block, Command, Hash256, Transaction};

use super::Pager;

/// Read-only query handle over a block store.
pub struct BlockQuery<'a, S> {
    store: &'a S,
}

impl<'a, S> Clone for BlockQuery<'a, S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, S> Copy for BlockQuery<'a, S> {}

impl<'a, S: BlockStore> BlockQuery<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// The most recent `n` blocks, newest first.
    pub fn top_blocks(&self, n: u32) -> impl Iterator<Item = Block> + use<'a, S> {
        let store = self.store;
        let top = store.top_height().unwrap_or(0);
        let lo = top.saturating_sub(n as u64) + 1;
        (lo..=top).rev().filter_map(move |h| store.get_by_height(h))
    }

    /// For each requested hash, in input order, the matching
    /// transaction or `None` when it is unknown to the chain. The
    /// output length always equals the input length.
    pub fn transactions(
        &self,
        hashes: &[Hash256],
    ) -> impl Iterator<Item = Option<Transaction>> + use<'a, S> {
        let q = *self;
        let hashes = hashes.to_vec();
        hashes
            .into_iter()
            .map(move |h| q.transactions_rev().find(|tx| tx.hash() == h))
    }

    /// Transactions created by `account_id`, newest first, filtered by
    /// `pager`.
    pub fn account_transactions(
        &self,
        account_id: &AccountId,
        pager: &Pager,
    ) -> Box<dyn Iterator<Item = Transaction> + 'a> {
        let account = account_id.clone();
        self.paged(move |tx| tx.creator_account_id == account, pager)
    }

    /// Transactions in which `account_id` participates through at
    /// least one of `asset_ids`, newest first, filtered by `pager`.
    ///
    /// Participation: the account created the transaction, or it is
    /// the source or destination of a `TransferAsset` over one of the
    /// assets, or it is the target of an `AddAssetQuantity` /
    /// `SubtractAssetQuantity` over one of them. An empty asset set
    /// matches nothing.
    pub fn account_asset_transactions(
        &self,
        account_id: &AccountId,
        asset_ids: &[AssetId],
        pager: &Pager,
    ) -> Box<dyn Iterator<Item = Transaction> + 'a> {
        if asset_ids.is_empty() {
            return Box::new(std::iter::empty());
        }
        let account = account_id.clone();
        let assets = asset_ids.to_vec();
        self.paged(move |tx| participates(tx, &account, &assets), pager)
    }

    /// Every transaction on the chain, newest block first and in
    /// reverse insertion order within a block.
    fn transactions_rev(&self) -> impl Iterator<Item = Transaction> + use<'a, S> {
        let store = self.store;
        let top = store.top_height().unwrap_or(0);
        (1..=top)
            .rev()
            .filter_map(move |h| store.get_by_height(h))
            .flat_map(|b| b.transactions.into_iter().rev())
    }

    /// Applies the shared pager rule to a filtered stream.
    fn paged<F>(&self, filter: F, pager: &Pager) -> Box<dyn Iterator<Item = Transaction> + 'a>
    where
        F: Fn(&Transaction) -> bool + Clone + 'a,
    {
        if pager.limit == 0 {
            return Box::new(std::iter::empty());
        }
        let limit = pager.limit as usize;
        let cursor = pager.tx_hash;

        // An absent cursor degrades to the zero sentinel, so the probe
        // scan only runs for a non-zero hash.
        let cursor_seen = !cursor.is_zero() && {
            let probe = filter.clone();
            self.transactions_rev()
                .filter(move |tx| probe(tx))
                .any(|tx| tx.hash() == cursor)
        };

        let stream = self.transactions_rev().filter(move |tx| filter(tx));
        if cursor_seen {
            Box::new(
                stream
                    .skip_while(move |tx| tx.hash() != cursor)
                    .skip(1)
                    .take(limit),
            )
        } else {
            Box::new(stream.take(limit))
        }
    }
}

fn participates(tx: &Transaction, account: &AccountId, assets: &[AssetId]) -> bool {
    if tx.creator_account_id == *account {
        return true;
    }
    tx.commands.iter().any(|command| match command {
        Command::TransferAsset {
            src_account_id,
            dest_account_id,
            asset_id,
            ..
        } => (src_account_id == account || dest_account_id == account) && assets.contains(asset_id),
        Command::AddAssetQuantity {
            account_id,
            asset_id,
            ..
        }
        | Command::SubtractAssetQuantity {
            account_id,
            asset_id,
            ..
        } => account_id == account && assets.contains(asset_id),
        _ => false,
    })
}

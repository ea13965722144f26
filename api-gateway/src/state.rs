//! Shared application state and the queued transaction pool.

use std::collections::VecDeque;
use std::sync::Arc;

use tokio::sync::Mutex;

use ledger::{MetricsRegistry, RocksDbBlockStore, Transaction};

/// Simple in-memory transaction pool backed by a FIFO queue.
///
/// HTTP handlers push submitted transactions in; the block producer
/// drains them when sealing blocks.
#[derive(Default)]
pub struct QueuedTxPool {
    queue: VecDeque<Transaction>,
}

impl QueuedTxPool {
    pub fn new() -> Self {
        Self {
            queue: VecDeque::new(),
        }
    }

    /// Enqueues a transaction for inclusion in a future block.
    pub fn push(&mut self, tx: Transaction) {
        self.queue.push_back(tx);
    }

    /// Removes and returns up to `max_txs` transactions in FIFO order.
    pub fn drain(&mut self, max_txs: usize) -> Vec<Transaction> {
        let take = max_txs.min(self.queue.len());
        self.queue.drain(0..take).collect()
    }
}

/// Shared state held by the API handlers and background tasks.
///
/// Wrapped in an [`Arc`] and passed to handlers via Axum's `State`
/// extractor.
pub struct AppState {
    /// Persistent block store; readers take the lock briefly per
    /// request, the producer holds it while sealing a block.
    pub store: Mutex<RocksDbBlockStore>,
    /// Pool feeding the block producer.
    pub tx_pool: Mutex<QueuedTxPool>,
    /// Metrics registry shared with the producer loop.
    pub metrics: Arc<MetricsRegistry>,
}

/// Thread-safe alias for `AppState`.
pub type SharedState = Arc<AppState>;

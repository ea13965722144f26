// api-gateway/src/main.rs

//! API gateway binary.
//!
//! This binary exposes the client-facing HTTP API of a ledger node:
//!
//! - `GET  /health`
//! - `GET  /blocks`
//! - `GET  /transactions/{hash}`
//! - `GET  /accounts/{id}/transactions`
//! - `GET  /accounts/{id}/assets/transactions`
//! - `POST /transactions`
//!
//! It embeds a RocksDB-backed block store, a queued transaction pool,
//! a background block producer that seals queued transactions, and a
//! Prometheus metrics exporter on `/metrics`.

mod config;
mod routes;
mod state;

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use axum::{
    Router,
    routing::{get, post},
};
use tokio::net::TcpListener;

use ledger::{Block, BlockStore, MetricsRegistry, NodeConfig, run_metrics_http_server};

use config::ApiConfig;
use routes::{health, history};
use state::{AppState, QueuedTxPool, SharedState};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "api_gateway=info,ledger=info".to_string()),
        )
        .init();

    if let Err(e) = run().await {
        eprintln!("fatal error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), String> {
    let api_cfg = ApiConfig::from_env();
    let node_cfg = NodeConfig::from_env();

    // ---------------------------
    // Metrics
    // ---------------------------

    let metrics = Arc::new(
        MetricsRegistry::new().map_err(|e| format!("failed to initialise metrics registry: {e}"))?,
    );

    if node_cfg.metrics.enabled {
        let metrics_clone = metrics.clone();
        let addr = node_cfg.metrics.listen_addr;
        tokio::spawn(async move {
            if let Err(e) = run_metrics_http_server(metrics_clone, addr).await {
                tracing::error!(error = %e, "metrics HTTP server error");
            }
        });
        tracing::info!("metrics exporter listening on http://{addr}/metrics");
    }

    // ---------------------------
    // Storage + genesis
    // ---------------------------

    let mut store = ledger::RocksDbBlockStore::open(&node_cfg.storage).map_err(|e| {
        format!(
            "failed to open RocksDB store at {}: {e}",
            node_cfg.storage.path
        )
    })?;

    if store.top_height().is_none() {
        let genesis = Block::genesis(current_millis(), Vec::new());
        if !store.insert(genesis) {
            return Err("failed to write the genesis block".to_string());
        }
        tracing::info!("empty store seeded with a genesis block");
    }

    // ---------------------------
    // Shared state
    // ---------------------------

    let app_state: SharedState = Arc::new(AppState {
        store: tokio::sync::Mutex::new(store),
        tx_pool: tokio::sync::Mutex::new(QueuedTxPool::new()),
        metrics: metrics.clone(),
    });

    // ---------------------------
    // Block producer loop
    // ---------------------------

    {
        let state = app_state.clone();
        let interval = Duration::from_millis(node_cfg.consensus.proposal_delay_ms);
        let max_txs = node_cfg.consensus.max_proposal_size;
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(interval).await;
                seal_pending(&state, max_txs).await;
            }
        });
    }

    // ---------------------------
    // HTTP server
    // ---------------------------

    let router = Router::new()
        .route("/health", get(health::health))
        .route("/blocks", get(history::list_blocks))
        .route("/transactions", post(history::submit_transaction))
        .route("/transactions/{hash}", get(history::get_transaction))
        .route(
            "/accounts/{id}/transactions",
            get(history::account_transactions),
        )
        .route(
            "/accounts/{id}/assets/transactions",
            get(history::account_asset_transactions),
        )
        .with_state(app_state);

    let listener = TcpListener::bind(api_cfg.listen_addr)
        .await
        .map_err(|e| format!("failed to bind {}: {e}", api_cfg.listen_addr))?;
    tracing::info!("API listening on http://{}", api_cfg.listen_addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutting down");
        })
        .await
        .map_err(|e| format!("HTTP server error: {e}"))
}

/// Seals queued transactions into a block on top of the current chain.
async fn seal_pending(state: &SharedState, max_txs: usize) {
    let txs = state.tx_pool.lock().await.drain(max_txs);
    if txs.is_empty() {
        return;
    }

    let mut store = state.store.lock().await;
    let (height, prev_hash) = match store.top_height() {
        Some(top) => match store.get_by_height(top) {
            Some(block) => (top + 1, block.hash),
            None => {
                tracing::error!(top, "top block missing from storage, dropping batch");
                return;
            }
        },
        None => (1, ledger::Hash256::ZERO),
    };

    let count = txs.len();
    let block = Block::produce(height, prev_hash, current_millis(), txs);
    let hash = block.hash;
    if store.insert(block) {
        state.metrics.consensus.block_height.set(height as i64);
        tracing::info!(height, txs = count, hash = %hash.to_hex(), "block sealed");
    } else {
        tracing::error!(height, "sealed block refused by storage");
    }
}

/// Returns the current wall-clock time as milliseconds since Unix
/// epoch, or 0 if the system clock predates the epoch.
fn current_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_else(|_| Duration::from_secs(0))
        .as_millis() as u64
}

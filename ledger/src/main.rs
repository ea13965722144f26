// src/main.rs
//
// Single-host validator node wiring up the ledger library:
//
// - RocksDB-backed block storage
// - YAC round engine behind a mailbox service
// - In-process channel networking (one-peer cluster)
// - Prometheus metrics exporter on /metrics
// - A proposal loop that builds a block, votes, and applies the commit.

use std::{
    sync::Arc,
    time::{Duration, Instant, SystemTime, UNIX_EPOCH},
};

use ledger::{
    Block, BlockStore, ChannelHub, ClusterOrdering, CryptoProvider, Ed25519Crypto, Hash256,
    MetricsRegistry, NodeConfig, Peer, RocksDbBlockStore, RoundEvent, TokioTimer, YacEngine,
    YacHash, YacService, forward_network_events, run_metrics_http_server,
};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "ledger=info".to_string()))
        .init();

    if let Err(err) = run_node().await {
        eprintln!("fatal error: {err}");
        std::process::exit(1);
    }
}

async fn run_node() -> Result<(), String> {
    let cfg = NodeConfig::from_env();

    // ---------------------------
    // Metrics registry + exporter
    // ---------------------------

    let metrics = Arc::new(
        MetricsRegistry::new().map_err(|e| format!("failed to initialise metrics registry: {e}"))?,
    );

    if cfg.metrics.enabled {
        let metrics_clone = metrics.clone();
        let addr = cfg.metrics.listen_addr;
        tokio::spawn(async move {
            if let Err(e) = run_metrics_http_server(metrics_clone, addr).await {
                tracing::error!(error = %e, "metrics HTTP server error");
            }
        });
        tracing::info!("metrics exporter listening on http://{addr}/metrics");
    }

    // ---------------------------
    // Storage backend (RocksDB)
    // ---------------------------

    let mut store = RocksDbBlockStore::open(&cfg.storage)
        .map_err(|e| format!("failed to open RocksDB store at {}: {e}", cfg.storage.path))?;

    // ---------------------------
    // Key material + peer identity
    // ---------------------------

    let crypto = load_crypto(&cfg.peer.private_key_path);
    let me = Peer {
        address: cfg.peer.peer_address(),
        public_key: crypto.public_key(),
    };
    tracing::info!(address = %me.address, key = %me.public_key.to_hex(), "local peer");

    // A one-peer cluster: supermajority is the node's own vote. A wire
    // transport feeding more peers into the hub extends this to a real
    // cluster without touching the engine.
    let ordering =
        ClusterOrdering::new(vec![me.clone()]).map_err(|e| format!("cluster setup: {e}"))?;

    // ---------------------------
    // Consensus service
    // ---------------------------

    let hub = ChannelHub::new();
    let (network, network_rx) = hub.join(me);

    let (inbox_tx, inbox_rx) = YacService::inbox();
    let timer = TokioTimer::new({
        let inbox = inbox_tx.clone();
        move || {
            let _ = inbox.send(RoundEvent::Timeout);
        }
    });

    let engine = YacEngine::new(
        network,
        crypto,
        timer,
        Duration::from_millis(cfg.consensus.vote_delay_ms),
        ordering.clone(),
    );
    let mut commits = engine.commits();

    let service = YacService::start(
        engine,
        inbox_tx.clone(),
        inbox_rx,
        Some(metrics.consensus.clone()),
    );
    forward_network_events(inbox_tx, network_rx);

    // ---------------------------
    // Proposal loop
    // ---------------------------

    let proposal_delay = Duration::from_millis(cfg.consensus.proposal_delay_ms);
    let load_delay = Duration::from_millis(cfg.consensus.load_delay_ms);
    tracing::info!(
        proposal_delay_ms = cfg.consensus.proposal_delay_ms,
        "starting proposal loop"
    );

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("shutting down");
                break;
            }
            _ = tokio::time::sleep(proposal_delay) => {
                run_round(&service, &ordering, &mut store, &mut commits, &metrics, load_delay).await?;
            }
        }
    }

    service.shutdown();
    Ok(())
}

/// One consensus round: build a block on the current top, vote its
/// hash, and apply the committed block to the store.
async fn run_round(
    service: &YacService,
    ordering: &ClusterOrdering,
    store: &mut RocksDbBlockStore,
    commits: &mut tokio::sync::broadcast::Receiver<ledger::CommitMessage>,
    metrics: &MetricsRegistry,
    load_delay: Duration,
) -> Result<(), String> {
    let started = Instant::now();

    let (height, prev_hash) = match store.top_height() {
        None => (1, Hash256::ZERO),
        Some(top) => {
            let top_block = store
                .get_by_height(top)
                .ok_or_else(|| format!("top block at height {top} missing from storage"))?;
            (top + 1, top_block.hash)
        }
    };

    // The transaction processor pipeline feeds proposals in a full
    // deployment; this loop seals what it has, which may be nothing.
    let block = Block::produce(height, prev_hash, current_millis(), Vec::new());
    let hash = YacHash::new(block.merkle_root, block.hash);

    // Outcomes of earlier rounds that arrived after their deadline are
    // stale by now.
    while commits.try_recv().is_ok() {}

    service.vote(hash, ordering.clone());

    match tokio::time::timeout(load_delay, commits.recv()).await {
        Ok(Ok(commit)) => {
            if commit.hash() != Some(&hash) {
                tracing::warn!("round committed a different hash, skipping local block");
                return Ok(());
            }
            if !store.insert(block.clone()) {
                tracing::warn!(height, "committed block refused by storage");
                return Ok(());
            }
            metrics.consensus.block_height.set(block.height as i64);
            metrics
                .consensus
                .round_duration_seconds
                .observe(started.elapsed().as_secs_f64());
            tracing::info!(
                height = block.height,
                hash = %block.hash.to_hex(),
                "block applied"
            );
        }
        Ok(Err(e)) => return Err(format!("commit stream closed: {e}")),
        Err(_) => {
            tracing::warn!(height, "round produced no commit within the load delay");
        }
    }
    Ok(())
}

/// Loads the node key from disk, falling back to a throwaway devnet
/// key when the file is unavailable.
fn load_crypto(path: &str) -> Ed25519Crypto {
    match std::fs::read_to_string(path) {
        Ok(hex_seed) => match Ed25519Crypto::from_hex(&hex_seed) {
            Ok(crypto) => return crypto,
            Err(e) => {
                tracing::warn!(path, error = %e, "unusable private key material");
            }
        },
        Err(e) => {
            tracing::warn!(path, error = %e, "private key unavailable");
        }
    }
    tracing::warn!("deriving a throwaway devnet key; do not use in production");
    Ed25519Crypto::from_seed(Hash256::compute(b"ledger-devnet-node").0)
}

/// Returns the current wall-clock time as milliseconds since Unix
/// epoch. On error (system clock before epoch) this falls back to 0.
fn current_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_else(|_| Duration::from_secs(0))
        .as_millis() as u64
}

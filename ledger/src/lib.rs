//! Ledger library crate.
//!
//! This crate provides the core building blocks of a permissioned
//! blockchain node:
//!
//! - strongly-typed domain types (`types`),
//! - the YAC leader-rotation BFT voting engine (`consensus`),
//! - append-only block storage backends (`storage`),
//! - the paginated history query layer (`query`),
//! - Prometheus-based metrics (`metrics`),
//! - and a top-level node configuration (`config`).
//!
//! Higher-level binaries compose these pieces into validator nodes,
//! client gateways, and experiment harnesses.

pub mod config;
pub mod consensus;
pub mod metrics;
pub mod query;
pub mod storage;
pub mod types;

// Re-export top-level configuration types.
pub use config::{MetricsConfig, NodeConfig, PeerConfig};

// Re-export "core" consensus types and traits.
pub use consensus::{
    ChannelHub, ChannelNetwork, ClusterOrdering, CommitMessage, ConsensusConfig, ConsensusError,
    CryptoProvider, Ed25519Crypto, Network, NetworkEvent, RejectMessage, RoundEvent, RoundState,
    RoundTimer, TokioTimer, VoteMessage, YacEngine, YacHash, YacService, forward_network_events,
};

// Re-export storage backends.
pub use storage::{BlockStore, InMemoryBlockStore, RocksDbBlockStore, RocksDbConfig, StorageError};

// Re-export the query layer.
pub use query::{BlockQuery, Pager};

// Re-export metrics registry and exporter.
pub use metrics::{ConsensusMetrics, MetricsRegistry, run_metrics_http_server};

// Re-export domain types at the crate root for convenience.
pub use types::*;

/// Type alias for the engine stack a "typical" node runs:
/// in-process channel networking, Ed25519 votes, tokio round timers.
pub type DefaultYacEngine = YacEngine<ChannelNetwork, Ed25519Crypto, TokioTimer>;

/// Type alias for the default persistent block store backend.
pub type DefaultBlockStore = RocksDbBlockStore;

//! Top-level configuration for a ledger node.
//!
//! This module aggregates configuration for:
//!
//! - the peer identity and listen endpoints (`PeerConfig`),
//! - consensus tuning (`ConsensusConfig`),
//! - block storage (`RocksDbConfig`),
//! - the metrics exporter (`MetricsConfig`).
//!
//! Every knob has a default plus a matching `LEDGER_*` environment
//! variable, so `NodeConfig::from_env()` is all a binary needs. A
//! command-line front end can layer on top of the same struct.

use std::net::SocketAddr;

use crate::consensus::ConsensusConfig;
use crate::storage::RocksDbConfig;

/// Bounds for the delay knobs, in milliseconds.
const DELAY_MIN_MS: u64 = 1;
const DELAY_MAX_MS: u64 = 100_000;

/// Bounds for the proposal size knob, in transactions.
const PROPOSAL_SIZE_MIN: usize = 1;
const PROPOSAL_SIZE_MAX: usize = 100_000;

/// Identity and endpoints of the local peer.
#[derive(Clone, Debug)]
pub struct PeerConfig {
    /// Host the peer listens on for consensus traffic.
    pub host: String,
    /// Port the peer listens on for consensus traffic.
    pub port: u16,
    /// Host of the client-facing API.
    pub api_host: String,
    /// Port of the client-facing API.
    pub api_port: u16,
    /// Path to the hex-encoded Ed25519 public key.
    pub public_key_path: String,
    /// Path to the hex-encoded Ed25519 private key seed.
    pub private_key_path: String,
}

impl PeerConfig {
    /// `host:port` address of the consensus endpoint.
    pub fn peer_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for PeerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 10_001,
            api_host: "127.0.0.1".to_string(),
            api_port: 50_051,
            public_key_path: "config/node.pub".to_string(),
            private_key_path: "config/node.priv".to_string(),
        }
    }
}

/// Configuration for the Prometheus metrics exporter.
#[derive(Clone, Debug)]
pub struct MetricsConfig {
    /// Whether to run a `/metrics` HTTP exporter.
    pub enabled: bool,
    /// Address to bind the metrics HTTP server to.
    pub listen_addr: SocketAddr,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        // Safe to unwrap: this is a fixed, valid address literal.
        let addr: SocketAddr = "127.0.0.1:9898"
            .parse()
            .expect("hard-coded metrics listen address should parse");
        Self {
            enabled: true,
            listen_addr: addr,
        }
    }
}

/// Aggregated configuration for a ledger node.
#[derive(Clone, Debug, Default)]
pub struct NodeConfig {
    pub peer: PeerConfig,
    pub consensus: ConsensusConfig,
    pub storage: RocksDbConfig,
    pub metrics: MetricsConfig,
}

impl NodeConfig {
    /// Defaults overridden by `LEDGER_*` environment variables.
    ///
    /// Unparsable values are logged and ignored; delay and size knobs
    /// are clamped into their valid ranges.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        override_string("LEDGER_PEER_HOST", &mut cfg.peer.host);
        override_parsed("LEDGER_PEER_PORT", &mut cfg.peer.port);
        override_string("LEDGER_API_HOST", &mut cfg.peer.api_host);
        override_parsed("LEDGER_API_PORT", &mut cfg.peer.api_port);
        override_string("LEDGER_PEER_PUBKEY", &mut cfg.peer.public_key_path);
        override_string("LEDGER_PEER_PRIVKEY", &mut cfg.peer.private_key_path);

        override_string("LEDGER_BLOCKSPATH", &mut cfg.storage.path);

        override_parsed("LEDGER_VOTE_DELAY", &mut cfg.consensus.vote_delay_ms);
        override_parsed("LEDGER_PROPOSAL_DELAY", &mut cfg.consensus.proposal_delay_ms);
        override_parsed("LEDGER_LOAD_DELAY", &mut cfg.consensus.load_delay_ms);
        override_parsed("LEDGER_PROPOSAL_SIZE", &mut cfg.consensus.max_proposal_size);

        override_parsed("LEDGER_METRICS_ENABLED", &mut cfg.metrics.enabled);
        override_parsed("LEDGER_METRICS_ADDR", &mut cfg.metrics.listen_addr);

        cfg.consensus.vote_delay_ms = clamp_delay("vote delay", cfg.consensus.vote_delay_ms);
        cfg.consensus.proposal_delay_ms =
            clamp_delay("proposal delay", cfg.consensus.proposal_delay_ms);
        cfg.consensus.load_delay_ms = clamp_delay("load delay", cfg.consensus.load_delay_ms);
        cfg.consensus.max_proposal_size = cfg
            .consensus
            .max_proposal_size
            .clamp(PROPOSAL_SIZE_MIN, PROPOSAL_SIZE_MAX);

        cfg
    }
}

fn override_string(var: &str, target: &mut String) {
    if let Ok(value) = std::env::var(var) {
        if !value.is_empty() {
            *target = value;
        }
    }
}

fn override_parsed<T: std::str::FromStr>(var: &str, target: &mut T) {
    if let Ok(raw) = std::env::var(var) {
        match raw.parse() {
            Ok(value) => *target = value,
            Err(_) => tracing::warn!(var, value = %raw, "ignoring unparsable override"),
        }
    }
}

fn clamp_delay(name: &str, value: u64) -> u64 {
    let clamped = value.clamp(DELAY_MIN_MS, DELAY_MAX_MS);
    if clamped != value {
        tracing::warn!(name, value, clamped, "delay outside valid range");
    }
    clamped
}

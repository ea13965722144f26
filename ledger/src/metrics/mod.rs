//! Metrics and instrumentation for the node.
//!
//! Prometheus-compatible counters and histograms for the consensus
//! round service, plus a small HTTP exporter serving `/metrics` in
//! text exposition format.

pub mod prometheus;

pub use prometheus::{ConsensusMetrics, MetricsRegistry, run_metrics_http_server};

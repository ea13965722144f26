//! Prometheus-backed metrics and HTTP exporter.
//!
//! [`MetricsRegistry`] owns a Prometheus registry plus the
//! strongly-typed consensus metrics; the async exporter serves
//! `GET /metrics` in the text exposition format over `hyper`.

use std::{convert::Infallible, net::SocketAddr, sync::Arc};

use bytes::Bytes;
use http_body_util::Full;
use hyper::{
    Method, Request, Response, StatusCode, body::Incoming, header, server::conn::http1,
    service::service_fn,
};
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;

use prometheus::{
    self, Encoder, Histogram, HistogramOpts, IntCounter, IntGauge, Opts, Registry, TextEncoder,
};

/// Consensus and chain metrics, updated by the round service and the
/// block applier.
#[derive(Clone)]
pub struct ConsensusMetrics {
    /// Votes received from peers, valid or not.
    pub votes_received_total: IntCounter,
    /// Messages dropped for failing verification or structural checks.
    pub invalid_messages_total: IntCounter,
    /// Rounds that ended in a commit.
    pub commits_total: IntCounter,
    /// Rounds that ended in a reject.
    pub rejects_total: IntCounter,
    /// Leader rotations caused by round timeouts.
    pub leader_rotations_total: IntCounter,
    /// Wall-clock duration of a round from vote to applied block.
    pub round_duration_seconds: Histogram,
    /// Height of the newest committed block.
    pub block_height: IntGauge,
}

impl ConsensusMetrics {
    /// Registers the consensus metrics into the given `Registry`.
    pub fn register(registry: &Registry) -> Result<Self, prometheus::Error> {
        let votes_received_total = IntCounter::with_opts(Opts::new(
            "consensus_votes_received_total",
            "Total votes received from peers, before verification",
        ))?;
        registry.register(Box::new(votes_received_total.clone()))?;

        let invalid_messages_total = IntCounter::with_opts(Opts::new(
            "consensus_invalid_messages_total",
            "Total consensus messages dropped as invalid",
        ))?;
        registry.register(Box::new(invalid_messages_total.clone()))?;

        let commits_total = IntCounter::with_opts(Opts::new(
            "consensus_commits_total",
            "Total rounds that reached supermajority",
        ))?;
        registry.register(Box::new(commits_total.clone()))?;

        let rejects_total = IntCounter::with_opts(Opts::new(
            "consensus_rejects_total",
            "Total rounds where supermajority became impossible",
        ))?;
        registry.register(Box::new(rejects_total.clone()))?;

        let leader_rotations_total = IntCounter::with_opts(Opts::new(
            "consensus_leader_rotations_total",
            "Total leader rotations triggered by round timeouts",
        ))?;
        registry.register(Box::new(leader_rotations_total.clone()))?;

        let round_duration_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "consensus_round_duration_seconds",
                "Time from local vote to applied block, in seconds",
            )
            .buckets(vec![
                0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0,
            ]),
        )?;
        registry.register(Box::new(round_duration_seconds.clone()))?;

        let block_height = IntGauge::with_opts(Opts::new(
            "chain_block_height",
            "Height of the newest committed block",
        ))?;
        registry.register(Box::new(block_height.clone()))?;

        Ok(Self {
            votes_received_total,
            invalid_messages_total,
            commits_total,
            rejects_total,
            leader_rotations_total,
            round_duration_seconds,
            block_height,
        })
    }
}

/// Wrapper around a Prometheus registry and the consensus metrics.
///
/// The main handle passed around a node; wrap it in an [`Arc`] to
/// share across tasks.
#[derive(Clone)]
pub struct MetricsRegistry {
    registry: Registry,
    pub consensus: ConsensusMetrics,
}

impl MetricsRegistry {
    /// Creates a registry under the `ledger` namespace and registers
    /// the consensus metrics.
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new_custom(Some("ledger".to_string()), None)?;
        let consensus = ConsensusMetrics::register(&registry)?;
        Ok(Self { registry, consensus })
    }

    /// Encodes all metrics into the Prometheus text format.
    pub fn gather_text(&self) -> String {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        let encoder = TextEncoder::new();
        if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
            tracing::error!(error = %e, "failed to encode metrics");
            return String::new();
        }
        String::from_utf8(buffer).unwrap_or_default()
    }
}

/// Serves `GET /metrics` on `addr`; every other path is a 404.
///
/// Intended to be spawned onto the node's runtime:
///
/// ```ignore
/// let registry = Arc::new(MetricsRegistry::new()?);
/// let addr: SocketAddr = "127.0.0.1:9898".parse()?;
/// tokio::spawn(run_metrics_http_server(registry.clone(), addr));
/// ```
pub async fn run_metrics_http_server(
    metrics: Arc<MetricsRegistry>,
    addr: SocketAddr,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let listener = TcpListener::bind(addr).await?;

    loop {
        let (stream, _) = listener.accept().await?;
        let io = TokioIo::new(stream);
        let metrics = metrics.clone();

        tokio::spawn(async move {
            let svc = service_fn(move |req| {
                let metrics = metrics.clone();
                handle_request(req, metrics)
            });

            if let Err(err) = http1::Builder::new().serve_connection(io, svc).await {
                tracing::error!(error = %err, "metrics connection error");
            }
        });
    }
}

async fn handle_request(
    req: Request<Incoming>,
    metrics: Arc<MetricsRegistry>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    match (req.method(), req.uri().path()) {
        (&Method::GET, "/metrics") => {
            let body = metrics.gather_text();
            Ok(Response::builder()
                .status(StatusCode::OK)
                .header(header::CONTENT_TYPE, "text/plain; version=0.0.4")
                .body(Full::new(Bytes::from(body)))
                .unwrap())
        }
        _ => Ok(Response::builder()
            .status(StatusCode::NOT_FOUND)
            .body(Full::new(Bytes::from("not found")))
            .unwrap()),
    }
}

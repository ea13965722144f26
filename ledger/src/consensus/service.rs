//! Mailbox wrapper around the round engine.
//!
//! The engine itself is single-writer; the service owns it inside one
//! spawned task and serializes every state transition through an
//! unbounded mpsc inbox. Local votes, inbound network events, and
//! round-timer expiries all arrive as [`RoundEvent`]s, so there is no
//! lock around the engine at all. Outcome consumers still subscribe on
//! the engine's broadcast channels before the engine moves into the
//! service.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::metrics::ConsensusMetrics;

use super::cluster::ClusterOrdering;
use super::crypto::CryptoProvider;
use super::engine::{RoundState, YacEngine};
use super::error::ConsensusError;
use super::messages::YacHash;
use super::network::{Network, NetworkEvent};
use super::timer::RoundTimer;

/// One unit of work for the engine task.
#[derive(Debug)]
pub enum RoundEvent {
    /// Start (or restart) a round by voting locally.
    Vote {
        hash: YacHash,
        ordering: ClusterOrdering,
    },
    /// A message arrived from a peer.
    Incoming(NetworkEvent),
    /// The round timer expired.
    Timeout,
}

/// Handle to a running engine task.
pub struct YacService {
    inbox: mpsc::UnboundedSender<RoundEvent>,
    task: JoinHandle<()>,
}

impl YacService {
    /// Creates the inbox pair for a service.
    ///
    /// The sender is needed before the engine exists: the round timer's
    /// expiry callback feeds [`RoundEvent::Timeout`] into the same
    /// inbox.
    pub fn inbox() -> (
        mpsc::UnboundedSender<RoundEvent>,
        mpsc::UnboundedReceiver<RoundEvent>,
    ) {
        mpsc::unbounded_channel()
    }

    /// Moves the engine into its task and starts draining the inbox.
    pub fn start<N, C, T>(
        mut engine: YacEngine<N, C, T>,
        inbox: mpsc::UnboundedSender<RoundEvent>,
        mut events: mpsc::UnboundedReceiver<RoundEvent>,
        metrics: Option<ConsensusMetrics>,
    ) -> Self
    where
        N: Network + Send + 'static,
        C: CryptoProvider + Send + 'static,
        T: RoundTimer + Send + 'static,
    {
        let task = tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                let before = engine.state();
                handle_event(&mut engine, event, metrics.as_ref());
                if let Some(m) = &metrics {
                    let after = engine.state();
                    if before != after {
                        match after {
                            RoundState::Committed => m.commits_total.inc(),
                            RoundState::Rejected => m.rejects_total.inc(),
                            _ => {}
                        }
                    }
                }
            }
        });
        Self { inbox, task }
    }

    /// A clonable handle for feeding events into the engine.
    pub fn sender(&self) -> mpsc::UnboundedSender<RoundEvent> {
        self.inbox.clone()
    }

    /// Enqueues a local vote starting a new round.
    pub fn vote(&self, hash: YacHash, ordering: ClusterOrdering) {
        let _ = self.inbox.send(RoundEvent::Vote { hash, ordering });
    }

    /// Stops the engine task.
    pub fn shutdown(self) {
        self.task.abort();
    }
}

fn handle_event<N, C, T>(
    engine: &mut YacEngine<N, C, T>,
    event: RoundEvent,
    metrics: Option<&ConsensusMetrics>,
) where
    N: Network,
    C: CryptoProvider,
    T: RoundTimer,
{
    match event {
        RoundEvent::Vote { hash, ordering } => engine.vote(hash, ordering),
        RoundEvent::Incoming(NetworkEvent::Vote { from, vote }) => {
            if let Some(m) = metrics {
                m.votes_received_total.inc();
            }
            if let Err(e) = engine.on_vote(&from, vote) {
                drop_message(metrics, &from.address, "vote", e);
            }
        }
        RoundEvent::Incoming(NetworkEvent::Commit { from, commit }) => {
            if let Err(e) = engine.on_commit(&from, commit) {
                drop_message(metrics, &from.address, "commit", e);
            }
        }
        RoundEvent::Incoming(NetworkEvent::Reject { from, reject }) => {
            if let Err(e) = engine.on_reject(&from, reject) {
                drop_message(metrics, &from.address, "reject", e);
            }
        }
        RoundEvent::Timeout => match engine.on_timeout() {
            Ok(()) => {
                if let Some(m) = metrics {
                    m.leader_rotations_total.inc();
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "round is over without an outcome");
            }
        },
    }
}

fn drop_message(
    metrics: Option<&ConsensusMetrics>,
    peer: &str,
    kind: &'static str,
    error: ConsensusError,
) {
    if let Some(m) = metrics {
        m.invalid_messages_total.inc();
    }
    tracing::warn!(peer = %peer, kind, error = %error, "dropping message");
}

/// Bridges a peer's inbound network stream into a service inbox.
pub fn forward_network_events(
    inbox: mpsc::UnboundedSender<RoundEvent>,
    mut events: mpsc::UnboundedReceiver<NetworkEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            if inbox.send(RoundEvent::Incoming(event)).is_err() {
                break;
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consensus::crypto::Ed25519Crypto;
    use crate::consensus::network::ChannelHub;
    use crate::consensus::timer::TokioTimer;
    use crate::types::{Hash256, Peer};
    use std::time::Duration;

    #[tokio::test]
    async fn single_peer_round_commits_through_the_mailbox() {
        let crypto = Ed25519Crypto::from_seed([42; 32]);
        let me = Peer {
            address: "127.0.0.1:5551".to_string(),
            public_key: crypto.public_key(),
        };
        let ordering = ClusterOrdering::new(vec![me.clone()]).expect("non-empty");

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
            Duration::from_millis(500),
            ordering.clone(),
        );
        let mut commits = engine.commits();

        let service = YacService::start(engine, inbox_tx.clone(), inbox_rx, None);
        forward_network_events(inbox_tx, network_rx);

        let hash = YacHash::new(Hash256::compute(b"p"), Hash256::compute(b"b"));
        service.vote(hash, ordering);

        let commit = tokio::time::timeout(Duration::from_secs(1), commits.recv())
            .await
            .expect("commit before timeout")
            .expect("channel open");
        assert_eq!(commit.hash(), Some(&hash));

        service.shutdown();
    }
}

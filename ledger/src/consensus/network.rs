//! Network seam for consensus messages.
//!
//! The engine only needs best-effort point-to-point sends; delivery
//! receipts do not exist and the timeout-plus-rotation path is the
//! recovery mechanism for anything lost. The wire transport between
//! hosts lives outside this crate; [`ChannelHub`] provides the
//! in-process implementation used by single-host clusters and tests.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tokio::sync::mpsc;

use crate::types::{Peer, PublicKey};

use super::messages::{CommitMessage, RejectMessage, VoteMessage};

/// Best-effort message delivery to cluster peers.
pub trait Network {
    fn send_vote(&self, peer: &Peer, vote: VoteMessage);
    fn send_commit(&self, peer: &Peer, commit: CommitMessage);
    fn send_reject(&self, peer: &Peer, reject: RejectMessage);
}

/// An inbound consensus message together with its sender.
#[derive(Clone, Debug)]
pub enum NetworkEvent {
    Vote { from: Peer, vote: VoteMessage },
    Commit { from: Peer, commit: CommitMessage },
    Reject { from: Peer, reject: RejectMessage },
}

type Routes = Arc<RwLock<HashMap<PublicKey, mpsc::UnboundedSender<NetworkEvent>>>>;

/// Shared in-process routing table keyed by peer public key.
///
/// Every peer that joins gets a [`ChannelNetwork`] handle for sending
/// and a receiver for its own inbound events.
#[derive(Clone, Default)]
pub struct ChannelHub {
    routes: Routes,
}

impl ChannelHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `local` with the hub and returns its send handle plus
    /// the stream of events addressed to it.
    pub fn join(&self, local: Peer) -> (ChannelNetwork, mpsc::UnboundedReceiver<NetworkEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        self.routes
            .write()
            .expect("network route table lock poisoned")
            .insert(local.public_key, tx);
        (
            ChannelNetwork {
                local,
                routes: self.routes.clone(),
            },
            rx,
        )
    }
}

/// [`Network`] implementation routing over in-process channels.
#[derive(Clone)]
pub struct ChannelNetwork {
    local: Peer,
    routes: Routes,
}

impl ChannelNetwork {
    fn deliver(&self, peer: &Peer, event: NetworkEvent) {
        let routes = self
            .routes
            .read()
            .expect("network route table lock poisoned");
        match routes.get(&peer.public_key) {
            Some(tx) => {
                // A closed receiver is the same as a lost datagram.
                let _ = tx.send(event);
            }
            None => {
                tracing::debug!(peer = %peer.address, "dropping message to unknown peer");
            }
        }
    }
}

impl Network for ChannelNetwork {
    fn send_vote(&self, peer: &Peer, vote: VoteMessage) {
        self.deliver(
            peer,
            NetworkEvent::Vote {
                from: self.local.clone(),
                vote,
            },
        );
    }

    fn send_commit(&self, peer: &Peer, commit: CommitMessage) {
        self.deliver(
            peer,
            NetworkEvent::Commit {
                from: self.local.clone(),
                commit,
            },
        );
    }

    fn send_reject(&self, peer: &Peer, reject: RejectMessage) {
        self.deliver(
            peer,
            NetworkEvent::Reject {
                from: self.local.clone(),
                reject,
            },
        );
    }
}

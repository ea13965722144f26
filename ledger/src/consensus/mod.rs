//! YAC consensus layer.
//!
//! This module provides the leader-rotation BFT voting engine and its
//! seams:
//!
//! - cluster ordering and supermajority arithmetic ([`cluster`]),
//! - signed vote/commit/reject messages ([`messages`]),
//! - the crypto envelope ([`crypto`]),
//! - best-effort peer messaging ([`network`]),
//! - the round timer ([`timer`]),
//! - the round state machine itself ([`engine`]),
//! - and a mailbox service that serializes access to it ([`service`]).

pub mod cluster;
pub mod config;
pub mod crypto;
pub mod engine;
pub mod error;
pub mod messages;
pub mod network;
pub mod service;
pub mod timer;

pub use cluster::ClusterOrdering;
pub use config::ConsensusConfig;
pub use crypto::{CryptoProvider, Ed25519Crypto, KeyError};
pub use engine::{RoundState, YacEngine};
pub use error::ConsensusError;
pub use messages::{CommitMessage, RejectMessage, VoteMessage, YacHash};
pub use network::{ChannelHub, ChannelNetwork, Network, NetworkEvent};
pub use service::{RoundEvent, YacService, forward_network_events};
pub use timer::{RoundTimer, TokioTimer};

//! Transaction and command types.
//!
//! A transaction is an ordered list of commands issued by a creator
//! account, plus the signatures authorizing it. Commands are a tagged
//! enum with one case per kind; the set below covers account, domain,
//! and asset management plus transfers.
//!
//! Hashing follows the payload rule used everywhere in the ledger:
//! serialize the payload fields (everything except signatures) with
//! bincode 2 and apply SHA3-256. Re-signing a transaction never changes
//! its hash.

use serde::{Deserialize, Serialize};

use super::{AccountId, Amount, AssetId, Hash256, PeerSignature, PublicKey};

/// A single state-changing instruction inside a transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    /// Registers a new domain with a default role for its accounts.
    CreateDomain {
        domain_id: String,
        default_role: String,
    },

    /// Registers a new account under an existing domain.
    CreateAccount {
        account_name: String,
        domain_id: String,
        public_key: PublicKey,
    },

    /// Registers a new asset under an existing domain.
    CreateAsset {
        asset_name: String,
        domain_id: String,
        precision: u8,
    },

    /// Credits an account with an amount of an asset.
    AddAssetQuantity {
        account_id: AccountId,
        asset_id: AssetId,
        amount: Amount,
    },

    /// Debits an account by an amount of an asset.
    SubtractAssetQuantity {
        account_id: AccountId,
        asset_id: AssetId,
        amount: Amount,
    },

    /// Moves an amount of an asset between two accounts.
    TransferAsset {
        src_account_id: AccountId,
        dest_account_id: AccountId,
        asset_id: AssetId,
        amount: Amount,
    },
}

/// A signed bundle of commands from one creator account.
///
/// Immutable once hashed: consumers treat the payload fields as frozen
/// and only ever append signatures.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Account that authored the transaction.
    pub creator_account_id: AccountId,

    /// Anti-replay counter relative to the creator account.
    pub tx_counter: u64,

    /// Wall-clock creation timestamp, milliseconds since Unix epoch.
    pub created_ts: u64,

    /// Ordered list of commands to apply atomically.
    pub commands: Vec<Command>,

    /// Signatures over the canonical payload encoding.
    #[serde(default)]
    pub signatures: Vec<PeerSignature>,

    /// Number of signatures required for the transaction to be valid.
    pub quorum: u8,
}

/// Borrowed view of the hashed portion of a transaction.
///
/// Field order here defines the canonical payload encoding; it must not
/// be reordered.
#[derive(Serialize)]
struct TxPayload<'a> {
    creator_account_id: &'a AccountId,
    tx_counter: u64,
    created_ts: u64,
    commands: &'a [Command],
    quorum: u8,
}

impl Transaction {
    /// Creates an unsigned transaction.
    pub fn new(
        creator_account_id: AccountId,
        tx_counter: u64,
        created_ts: u64,
        commands: Vec<Command>,
    ) -> Self {
        Self {
            creator_account_id,
            tx_counter,
            created_ts,
            commands,
            signatures: Vec::new(),
            quorum: 1,
        }
    }

    /// Canonical bincode-2 encoding of the payload fields.
    ///
    /// Signatures are never part of the payload.
    ///
    /// # Panics
    ///
    /// Panics if encoding fails, which would mean a non-serializable
    /// payload field and is a programming error.
    pub fn payload_bytes(&self) -> Vec<u8> {
        let payload = TxPayload {
            creator_account_id: &self.creator_account_id,
            tx_counter: self.tx_counter,
            created_ts: self.created_ts,
            commands: &self.commands,
            quorum: self.quorum,
        };
        let cfg = bincode::config::standard();
        bincode::serde::encode_to_vec(&payload, cfg)
            .expect("transaction payload should always be serializable")
    }

    /// SHA3-256 digest of the canonical payload encoding.
    pub fn hash(&self) -> Hash256 {
        Hash256::compute(&self.payload_bytes())
    }

    /// Appends a signature produced by `public_key` over the payload.
    pub fn add_signature(&mut self, signature: PeerSignature) {
        self.signatures.push(signature);
    }

    /// Returns `true` if a signature by `key` is attached.
    pub fn signed_by(&self, key: &PublicKey) -> bool {
        self.signatures.iter().any(|s| s.public_key == *key)
    }
}

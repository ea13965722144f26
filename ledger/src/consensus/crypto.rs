//! Crypto envelope for YAC messages.
//!
//! The [`CryptoProvider`] trait is the seam between the round state
//! machine and key material: it signs local votes and verifies inbound
//! votes, commits, and rejects. The production implementation is
//! Ed25519 via `ed25519-dalek`, signing the canonical encoding of the
//! [`YacHash`] being voted on.

use std::fmt;

use ed25519_dalek::{Signature as DalekSignature, Signer, SigningKey, Verifier, VerifyingKey};

use crate::types::{PUBKEY_LEN, PeerSignature, PublicKey, SignatureBytes};

use super::messages::{CommitMessage, RejectMessage, VoteMessage, YacHash};

/// Signing and verification operations used by the round engine.
///
/// Verification of a commit or reject requires per-vote signature
/// verification plus the message's structural rules (a commit is
/// unanimous on one hash; both are non-empty).
pub trait CryptoProvider {
    /// The local signing identity.
    fn public_key(&self) -> PublicKey;

    /// Signs a vote for `hash` with the local key.
    fn get_vote(&self, hash: YacHash) -> VoteMessage;

    /// Verifies one vote's signature against its embedded public key.
    fn verify_vote(&self, vote: &VoteMessage) -> bool;

    /// Verifies a commit: non-empty, unanimous, every vote valid.
    fn verify_commit(&self, commit: &CommitMessage) -> bool;

    /// Verifies a reject: non-empty, every vote valid.
    fn verify_reject(&self, reject: &RejectMessage) -> bool;
}

/// Error produced when loading key material.
#[derive(Debug)]
pub enum KeyError {
    /// The input was not valid hex.
    InvalidHex(hex::FromHexError),
    /// The decoded key had the wrong length.
    InvalidLength { expected: usize, got: usize },
}

impl From<hex::FromHexError> for KeyError {
    fn from(e: hex::FromHexError) -> Self {
        KeyError::InvalidHex(e)
    }
}

impl fmt::Display for KeyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyError::InvalidHex(e) => write!(f, "invalid hex in key material: {e}"),
            KeyError::InvalidLength { expected, got } => {
                write!(f, "key material has {got} bytes, expected {expected}")
            }
        }
    }
}

impl std::error::Error for KeyError {}

/// Ed25519-backed [`CryptoProvider`].
pub struct Ed25519Crypto {
    signing: SigningKey,
}

impl Ed25519Crypto {
    /// Builds a provider from a 32-byte Ed25519 seed.
    pub fn from_seed(seed: [u8; 32]) -> Self {
        Self {
            signing: SigningKey::from_bytes(&seed),
        }
    }

    /// Builds a provider from a hex-encoded 32-byte seed, the format
    /// the key manager stores on disk.
    pub fn from_hex(s: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode(s.trim())?;
        let seed: [u8; 32] = bytes.as_slice().try_into().map_err(|_| KeyError::InvalidLength {
            expected: 32,
            got: bytes.len(),
        })?;
        Ok(Self::from_seed(seed))
    }

    fn verify_with(key: &PublicKey, message: &[u8], signature: &SignatureBytes) -> bool {
        let Ok(verifying) = VerifyingKey::from_bytes(key.as_bytes()) else {
            return false;
        };
        let sig = DalekSignature::from_bytes(signature.as_bytes());
        verifying.verify(message, &sig).is_ok()
    }
}

impl CryptoProvider for Ed25519Crypto {
    fn public_key(&self) -> PublicKey {
        let bytes: [u8; PUBKEY_LEN] = self.signing.verifying_key().to_bytes();
        PublicKey(bytes)
    }

    fn get_vote(&self, hash: YacHash) -> VoteMessage {
        let message = hash.canonical_bytes();
        let signature = self.signing.sign(&message);
        VoteMessage {
            hash,
            signature: PeerSignature {
                public_key: self.public_key(),
                signature: SignatureBytes(signature.to_bytes()),
            },
        }
    }

    fn verify_vote(&self, vote: &VoteMessage) -> bool {
        let message = vote.hash.canonical_bytes();
        Self::verify_with(vote.voter(), &message, &vote.signature.signature)
    }

    fn verify_commit(&self, commit: &CommitMessage) -> bool {
        commit.is_unanimous() && commit.votes.iter().all(|v| self.verify_vote(v))
    }

    fn verify_reject(&self, reject: &RejectMessage) -> bool {
        !reject.votes.is_empty() && reject.votes.iter().all(|v| self.verify_vote(v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Hash256;

    fn provider(seed: u8) -> Ed25519Crypto {
        Ed25519Crypto::from_seed([seed; 32])
    }

    fn yac_hash(p: &[u8], b: &[u8]) -> YacHash {
        YacHash::new(Hash256::compute(p), Hash256::compute(b))
    }

    #[test]
    fn own_vote_verifies() {
        let crypto = provider(1);
        let vote = crypto.get_vote(yac_hash(b"p", b"b"));
        assert!(crypto.verify_vote(&vote));
    }

    #[test]
    fn tampered_vote_fails() {
        let crypto = provider(1);
        let mut vote = crypto.get_vote(yac_hash(b"p", b"b"));
        vote.hash = yac_hash(b"p", b"tampered");
        assert!(!crypto.verify_vote(&vote));
    }

    #[test]
    fn commit_requires_unanimity() {
        let crypto = provider(1);
        let other = provider(2);
        let h = yac_hash(b"p", b"b");

        let unanimous =
            CommitMessage::new(vec![crypto.get_vote(h), other.get_vote(h)]);
        assert!(crypto.verify_commit(&unanimous));

        let mixed = CommitMessage::new(vec![
            crypto.get_vote(h),
            other.get_vote(yac_hash(b"p", b"x")),
        ]);
        assert!(!crypto.verify_commit(&mixed));

        assert!(!crypto.verify_commit(&CommitMessage::new(Vec::new())));
    }

    #[test]
    fn seed_hex_roundtrip() {
        let crypto = Ed25519Crypto::from_hex(&hex::encode([7u8; 32])).expect("valid seed");
        let vote = crypto.get_vote(yac_hash(b"p", b"b"));
        assert!(crypto.verify_vote(&vote));
        assert!(Ed25519Crypto::from_hex("abcd").is_err());
    }
}

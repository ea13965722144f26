//! Core domain types shared across the ledger.
//!
//! This module defines strongly-typed hashes, key material, peer
//! identities, account and asset identifiers, and fixed-point amounts.
//! The goal is to avoid "naked" byte buffers and strings in public APIs
//! and instead use domain-specific newtypes.
//!
//! All binary serialization in the crate goes through **bincode 2** with
//! the `serde` integration and an explicit `standard()` config; the
//! fixed-size byte newtypes below additionally render as hex strings
//! under human-readable serializers (e.g. `serde_json`).

use std::fmt;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha3::{Digest, Sha3_256};

pub mod block;
pub mod merkle;
pub mod tx;

pub use block::Block;
pub use merkle::MerkleAccumulator;
pub use tx::{Command, Transaction};

/// Length in bytes of all 256-bit hash types used in this crate.
pub const HASH_LEN: usize = 32;

/// Length in bytes of an Ed25519 public key.
pub const PUBKEY_LEN: usize = 32;

/// Length in bytes of an Ed25519 detached signature.
pub const SIGNATURE_LEN: usize = 64;

/// Error produced when decoding a fixed-size byte type from hex.
#[derive(Debug)]
pub enum CodecError {
    /// The input was not valid hex.
    Hex(hex::FromHexError),
    /// The decoded byte string had the wrong length.
    Length { expected: usize, got: usize },
}

impl From<hex::FromHexError> for CodecError {
    fn from(e: hex::FromHexError) -> Self {
        CodecError::Hex(e)
    }
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodecError::Hex(e) => write!(f, "invalid hex encoding: {e}"),
            CodecError::Length { expected, got } => {
                write!(f, "expected {expected} bytes, got {got}")
            }
        }
    }
}

impl std::error::Error for CodecError {}

/// Serde visitor for fixed-size byte arrays in binary formats.
struct FixedBytesVisitor<const N: usize>;

impl<'de, const N: usize> Visitor<'de> for FixedBytesVisitor<N> {
    type Value = [u8; N];

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "a byte string of length {N}")
    }

    fn visit_bytes<E: de::Error>(self, v: &[u8]) -> Result<Self::Value, E> {
        v.try_into().map_err(|_| E::invalid_length(v.len(), &self))
    }
}

/// Strongly-typed 256-bit digest (SHA3-256).
///
/// This type backs every fixed-size hash in the ledger: transaction and
/// block hashes, merkle roots, and pager cursors. It is always exactly
/// [`HASH_LEN`] bytes long and orders lexicographically by byte value.
/// The all-zero digest is the "empty / no previous" sentinel.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Hash256(pub [u8; HASH_LEN]);

impl Hash256 {
    /// The all-zero sentinel digest.
    pub const ZERO: Hash256 = Hash256([0u8; HASH_LEN]);

    /// Computes a new [`Hash256`] as the SHA3-256 digest of `data`.
    pub fn compute(data: &[u8]) -> Self {
        let digest = Sha3_256::digest(data);
        Hash256(digest.into())
    }

    /// Returns `true` if this is the all-zero sentinel.
    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }

    /// Returns the underlying 32-byte digest as a borrowed array.
    pub fn as_bytes(&self) -> &[u8; HASH_LEN] {
        &self.0
    }

    /// Lowercase hex rendering of the digest.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parses a digest from a 64-character hex string.
    pub fn from_hex(s: &str) -> Result<Self, CodecError> {
        let bytes = hex::decode(s)?;
        let arr: [u8; HASH_LEN] = bytes.as_slice().try_into().map_err(|_| CodecError::Length {
            expected: HASH_LEN,
            got: bytes.len(),
        })?;
        Ok(Hash256(arr))
    }
}

impl fmt::Debug for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash256({})", self.to_hex())
    }
}

impl Serialize for Hash256 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&self.to_hex())
        } else {
            serializer.serialize_bytes(&self.0)
        }
    }
}

impl<'de> Deserialize<'de> for Hash256 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            let s = String::deserialize(deserializer)?;
            Hash256::from_hex(&s).map_err(de::Error::custom)
        } else {
            deserializer
                .deserialize_bytes(FixedBytesVisitor::<HASH_LEN>)
                .map(Hash256)
        }
    }
}

/// Ed25519 public key bytes, wrapped to avoid naked arrays.
///
/// The key is opaque to this module: it carries the material through
/// the API without interpreting it. Verification lives in
/// [`crate::consensus::crypto`].
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PublicKey(pub [u8; PUBKEY_LEN]);

impl PublicKey {
    /// Returns the raw public key bytes.
    pub fn as_bytes(&self) -> &[u8; PUBKEY_LEN] {
        &self.0
    }

    /// Lowercase hex rendering of the key.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parses a public key from a 64-character hex string.
    pub fn from_hex(s: &str) -> Result<Self, CodecError> {
        let bytes = hex::decode(s)?;
        let arr: [u8; PUBKEY_LEN] = bytes.as_slice().try_into().map_err(|_| CodecError::Length {
            expected: PUBKEY_LEN,
            got: bytes.len(),
        })?;
        Ok(PublicKey(arr))
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", self.to_hex())
    }
}

impl Serialize for PublicKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&self.to_hex())
        } else {
            serializer.serialize_bytes(&self.0)
        }
    }
}

impl<'de> Deserialize<'de> for PublicKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            let s = String::deserialize(deserializer)?;
            PublicKey::from_hex(&s).map_err(de::Error::custom)
        } else {
            deserializer
                .deserialize_bytes(FixedBytesVisitor::<PUBKEY_LEN>)
                .map(PublicKey)
        }
    }
}

/// Ed25519 detached signature bytes.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct SignatureBytes(pub [u8; SIGNATURE_LEN]);

impl SignatureBytes {
    /// Returns the raw signature bytes.
    pub fn as_bytes(&self) -> &[u8; SIGNATURE_LEN] {
        &self.0
    }

    /// Lowercase hex rendering of the signature.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for SignatureBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SignatureBytes({})", self.to_hex())
    }
}

impl Serialize for SignatureBytes {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&self.to_hex())
        } else {
            serializer.serialize_bytes(&self.0)
        }
    }
}

impl<'de> Deserialize<'de> for SignatureBytes {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            let s = String::deserialize(deserializer)?;
            let bytes = hex::decode(&s).map_err(de::Error::custom)?;
            let arr: [u8; SIGNATURE_LEN] = bytes
                .as_slice()
                .try_into()
                .map_err(|_| de::Error::invalid_length(bytes.len(), &"64 bytes"))?;
            Ok(SignatureBytes(arr))
        } else {
            deserializer
                .deserialize_bytes(FixedBytesVisitor::<SIGNATURE_LEN>)
                .map(SignatureBytes)
        }
    }
}

/// A signature together with the public key that produced it.
///
/// Votes, transactions, and blocks all carry signatures in this form so
/// that verification needs no out-of-band key lookup.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerSignature {
    pub public_key: PublicKey,
    pub signature: SignatureBytes,
}

/// A validator node identity: where to reach it and how it signs.
///
/// Within a cluster the public key is unique; the address is purely a
/// transport concern.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Peer {
    /// Host:port the peer listens on.
    pub address: String,
    /// The peer's Ed25519 public key.
    pub public_key: PublicKey,
}

/// Account identifier in `name@domain` form.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AccountId(pub String);

impl AccountId {
    /// Builds an account id from a name and a domain.
    pub fn new(name: &str, domain: &str) -> Self {
        AccountId(format!("{name}@{domain}"))
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Asset identifier in `name#domain` form.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AssetId(pub String);

impl AssetId {
    /// Builds an asset id from a name and a domain.
    pub fn new(name: &str, domain: &str) -> Self {
        AssetId(format!("{name}#{domain}"))
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Fixed-point asset amount.
///
/// `value` carries the digits, `precision` the number of decimal places,
/// so `123.4` is `{ value: 1234, precision: 1 }`. Arithmetic on amounts
/// belongs to the execution layer; the ledger only stores and displays
/// them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Amount {
    pub value: u64,
    pub precision: u8,
}

impl Amount {
    /// Parses a decimal string like `"123.4"` or `"20"`.
    ///
    /// Returns `None` on empty input, non-digit characters, or overflow.
    pub fn parse(s: &str) -> Option<Self> {
        let (int_part, frac_part) = match s.split_once('.') {
            Some((i, f)) => (i, f),
            None => (s, ""),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return None;
        }
        let digits: String = int_part.chars().chain(frac_part.chars()).collect();
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        let value: u64 = digits.parse().ok()?;
        Some(Amount {
            value,
            precision: frac_part.len() as u8,
        })
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.value.to_string();
        let precision = self.precision as usize;
        if precision == 0 {
            f.write_str(&digits)
        } else if digits.len() <= precision {
            write!(f, "0.{digits:0>precision$}")
        } else {
            let (int_part, frac_part) = digits.split_at(digits.len() - precision);
            write!(f, "{int_part}.{frac_part}")
        }
    }
}

//! Core shared types for the Palisade multi-chain wallet.
//!
//! This crate defines all fundamental types used across the workspace.
//! No other crate should define shared types — everything lives here.
//! It performs no cryptography and holds no secret material.

pub mod config;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// ChainFamily
// ---------------------------------------------------------------------------

/// A class of blockchains sharing one signature scheme and one set of
/// derivation rules.
///
/// Every keyring lookup and every signing dispatch takes the chain
/// family as an explicit parameter and matches on it exhaustively.
/// Adding a variant here is a compile error at every dispatch site
/// until the new family is handled.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChainFamily {
    /// Ed25519 curve, SLIP-0010 hardened-only derivation (coin type 501).
    Ed25519,
    /// secp256k1 curve, BIP-32 derivation with mixed hardening (coin type 60).
    Secp256k1,
}

impl ChainFamily {
    /// Every chain family the wallet can derive keys for.
    pub const ALL: [ChainFamily; 2] = [ChainFamily::Ed25519, ChainFamily::Secp256k1];

    /// Legacy default applied **only** when a wire request omits the
    /// chain family field entirely. Requests that name a family are
    /// never remapped — an unknown or mismatched family is an error,
    /// not a fallback to this value.
    pub const LEGACY_WIRE_DEFAULT: ChainFamily = ChainFamily::Ed25519;

    /// BIP-44 coin type for this family's account paths.
    pub fn coin_type(&self) -> u32 {
        match self {
            Self::Ed25519 => 501,
            Self::Secp256k1 => 60,
        }
    }

    /// Canonical lowercase name used on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ed25519 => "ed25519",
            Self::Secp256k1 => "secp256k1",
        }
    }
}

impl fmt::Display for ChainFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChainFamily {
    type Err = WalletError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "ed25519" => Ok(Self::Ed25519),
            "secp256k1" => Ok(Self::Secp256k1),
            other => Err(WalletError::TransportError {
                reason: format!("unknown chain family '{other}'"),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// AccountPublicKey
// ---------------------------------------------------------------------------

/// Public key of a derived account, curve-agnostic.
///
/// 32 bytes for Ed25519, 33 bytes (SEC1 compressed) for secp256k1.
/// Displayed and parsed as base58, which is the wire encoding.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct AccountPublicKey(Vec<u8>);

impl AccountPublicKey {
    /// Creates an [`AccountPublicKey`] from raw key bytes.
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Returns the underlying key bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Returns the base58 rendering used on the wire.
    pub fn to_base58(&self) -> String {
        bs58::encode(&self.0).into_string()
    }
}

impl fmt::Display for AccountPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_base58())
    }
}

impl FromStr for AccountPublicKey {
    type Err = WalletError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let bytes = bs58::decode(s)
            .into_vec()
            .map_err(|e| WalletError::TransportError {
                reason: format!("invalid base58 public key: {e}"),
            })?;
        Ok(Self(bytes))
    }
}

// ---------------------------------------------------------------------------
// DerivationPath
// ---------------------------------------------------------------------------

/// One segment of a BIP-32-style derivation path.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct PathSegment {
    /// Child index, without the hardened offset applied.
    pub index: u32,
    /// Whether this step is hardened (rendered with a `'` suffix).
    pub hardened: bool,
}

/// An ordered sequence of derivation steps, rendered as a string such
/// as `m/44'/501'/0'/0'`.
///
/// The exact string rendering is part of the compatibility surface:
/// it determines which addresses a recovery phrase resolves to, so the
/// `Display`/`FromStr` pair must round-trip byte-identically.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct DerivationPath {
    segments: Vec<PathSegment>,
}

impl DerivationPath {
    /// Builds a path from explicit segments.
    pub fn new(segments: Vec<PathSegment>) -> Self {
        Self { segments }
    }

    /// Returns the path segments in order.
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Returns `true` if every segment is hardened.
    pub fn all_hardened(&self) -> bool {
        self.segments.iter().all(|s| s.hardened)
    }

    /// Canonical account path for `family` at `account_index`.
    ///
    /// - Ed25519: `m/44'/501'/<account>'/0'` (hardened throughout, as
    ///   SLIP-0010 requires for this curve).
    /// - secp256k1: `m/44'/60'/0'/0/<account>` (BIP-44 external chain).
    pub fn account_path(family: ChainFamily, account_index: u32) -> Self {
        let h = |index| PathSegment { index, hardened: true };
        let n = |index| PathSegment { index, hardened: false };
        match family {
            ChainFamily::Ed25519 => Self::new(vec![
                h(44),
                h(family.coin_type()),
                h(account_index),
                h(0),
            ]),
            ChainFamily::Secp256k1 => Self::new(vec![
                h(44),
                h(family.coin_type()),
                h(0),
                n(0),
                n(account_index),
            ]),
        }
    }
}

impl fmt::Display for DerivationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("m")?;
        for seg in &self.segments {
            write!(f, "/{}", seg.index)?;
            if seg.hardened {
                f.write_str("'")?;
            }
        }
        Ok(())
    }
}

impl FromStr for DerivationPath {
    type Err = WalletError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let trimmed = s.trim();
        let rest = trimmed
            .strip_prefix("m/")
            .ok_or_else(|| WalletError::ConfigError {
                reason: format!("derivation path must start with 'm/', got '{trimmed}'"),
            })?;

        if rest.is_empty() {
            return Err(WalletError::ConfigError {
                reason: "derivation path must have at least one component".into(),
            });
        }

        let mut segments = Vec::new();
        for part in rest.split('/') {
            if part.is_empty() {
                return Err(WalletError::ConfigError {
                    reason: "empty component in derivation path".into(),
                });
            }

            // `'` and `h` are both accepted hardened markers.
            let (num_str, hardened) = match part.strip_suffix('\'').or_else(|| part.strip_suffix('h')) {
                Some(stripped) => (stripped, true),
                None => (part, false),
            };

            let index: u32 = num_str.parse().map_err(|e| WalletError::ConfigError {
                reason: format!("invalid index '{num_str}' in derivation path: {e}"),
            })?;

            if index >= 0x8000_0000 {
                return Err(WalletError::ConfigError {
                    reason: format!("index {index} exceeds maximum ({})", 0x8000_0000u32 - 1),
                });
            }

            segments.push(PathSegment { index, hardened });
        }

        Ok(Self { segments })
    }
}

impl Serialize for DerivationPath {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for DerivationPath {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Commitment
// ---------------------------------------------------------------------------

/// Network-defined threshold of confirmation finality for a broadcast
/// transaction. Variants are ordered from weakest to strongest so that
/// `observed >= target` expresses "the target level has been reached".
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Commitment {
    /// The transaction was processed by a node.
    Processed,
    /// A supermajority of the cluster voted on the containing block.
    Confirmed,
    /// The containing block is rooted and cannot be rolled back.
    Finalized,
}

impl fmt::Display for Commitment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Processed => f.write_str("processed"),
            Self::Confirmed => f.write_str("confirmed"),
            Self::Finalized => f.write_str("finalized"),
        }
    }
}

impl FromStr for Commitment {
    type Err = WalletError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "processed" => Ok(Self::Processed),
            "confirmed" => Ok(Self::Confirmed),
            "finalized" => Ok(Self::Finalized),
            other => Err(WalletError::ConfigError {
                reason: format!("unknown commitment level '{other}'"),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// OriginDescriptor
// ---------------------------------------------------------------------------

/// Identity of the surface asking for a signature (a dApp page, the
/// extension popup, a CLI). Attached to every inbound request and
/// checked against the transport's allow-list before dispatch.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct OriginDescriptor {
    /// Human-readable name of the requesting surface.
    pub name: String,
    /// Stable address of the surface (URL origin or local identifier).
    pub address: String,
}

// ---------------------------------------------------------------------------
// SigningRequest / SigningOutcome
// ---------------------------------------------------------------------------

/// Payload of a signing request, tagged by operation kind.
///
/// The kind is carried in the variant so request routing is an
/// exhaustive `match` — there is no separate kind field that could
/// disagree with the payload shape.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SigningPayload {
    /// A single serialized transaction to sign.
    Transaction(Vec<u8>),
    /// An arbitrary message to sign (off-chain proof of ownership).
    Message(Vec<u8>),
    /// A batch of serialized transactions, signed all-or-nothing.
    BatchTransaction(Vec<Vec<u8>>),
}

/// A fully decoded signing request, one round trip, discarded after
/// its correlation id is matched or times out.
#[derive(Clone, Debug)]
pub struct SigningRequest {
    /// Fresh correlation id assigned by the transport on ingress.
    pub correlation_id: Uuid,
    /// Chain family the caller is signing for. Required: the keyring
    /// lookup uses this value and never substitutes another family.
    pub chain_family: ChainFamily,
    /// Account to sign with, located within the family's keyring.
    pub public_key: AccountPublicKey,
    /// What to sign.
    pub payload: SigningPayload,
    /// Who is asking.
    pub origin: OriginDescriptor,
}

/// Signature bytes produced for a request.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SignedPayload {
    /// Signature over a single transaction or message.
    Single(Vec<u8>),
    /// One signature per batch item, in request order.
    Batch(Vec<Vec<u8>>),
}

/// Terminal outcome of a signing request.
///
/// `Declined` is deliberately not an error: callers must be able to
/// distinguish "the user rejected this" from "something failed".
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SigningOutcome {
    /// The request was approved and signed.
    Signed(SignedPayload),
    /// The user (or policy gate) declined the request. Never retried.
    Declined,
}

// ---------------------------------------------------------------------------
// WalletEvent
// ---------------------------------------------------------------------------

/// Typed events published by the wallet core to subscribed consumers.
///
/// Replaces ad-hoc connect/disconnect/account-changed callbacks with an
/// explicit channel; see `palisade-transport`'s event bus.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum WalletEvent {
    /// The keyring store transitioned to unlocked.
    Unlocked,
    /// The keyring store was locked and all key material zeroed.
    Locked,
    /// A new account was derived and appended to a keyring.
    AccountAdded {
        /// Family the account belongs to.
        chain_family: ChainFamily,
        /// Public key of the new account.
        public_key: AccountPublicKey,
    },
    /// An account was removed from a keyring. Its derivation index is
    /// retired and never reused.
    AccountRemoved {
        /// Family the account belonged to.
        chain_family: ChainFamily,
        /// Public key of the removed account.
        public_key: AccountPublicKey,
    },
    /// A transaction was broadcast to the network.
    TransactionSubmitted {
        /// Network signature id returned by the broadcast.
        signature_id: String,
    },
    /// A broadcast transaction reached the requested commitment level.
    TransactionConfirmed {
        /// Network signature id of the confirmed transaction.
        signature_id: String,
        /// Commitment level that was observed.
        commitment: Commitment,
    },
}

// ---------------------------------------------------------------------------
// WalletError
// ---------------------------------------------------------------------------

/// Central error type for the Palisade wallet core.
///
/// All crates in the workspace convert their internal errors into
/// variants of this enum, ensuring a unified error handling surface.
/// The first ten variants are the wire-visible taxonomy; the rest are
/// ambient failures that never leave the process boundary unmapped.
#[derive(Debug, Error)]
pub enum WalletError {
    /// A recovery phrase failed wordlist or checksum validation.
    #[error("invalid mnemonic: {reason}")]
    InvalidMnemonic {
        /// Human-readable description of the validation failure.
        reason: String,
    },

    /// Decryption of the secret payload failed authentication.
    ///
    /// Reported for *any* AEAD tag mismatch — the cipher fails closed
    /// and never yields plaintext garbage.
    #[error("wrong password")]
    WrongPassword,

    /// The keyring store holds no plaintext key material.
    #[error("keyring store is locked")]
    Locked,

    /// No keyring exists for the requested chain family.
    ///
    /// This is a terminal error: a request for family A is never
    /// served by a keyring registered for family B.
    #[error("no keyring for chain family '{family}'")]
    NoKeyringForChain {
        /// The family the caller asked for.
        family: ChainFamily,
    },

    /// The requested public key is not present in the resolved keyring.
    #[error("no account with public key '{public_key}'")]
    NoSuchAccount {
        /// Base58 rendering of the missing key.
        public_key: String,
    },

    /// The user declined the request. Never retried automatically.
    #[error("user declined the request")]
    UserDeclined,

    /// A pending request saw no response within its window.
    #[error("request timed out")]
    Timeout,

    /// Broadcast failed after exhausting the retry budget.
    #[error("send failed after {attempts} attempts: {reason}")]
    SendFailed {
        /// Number of attempts made before giving up.
        attempts: u32,
        /// Description of the final failure.
        reason: String,
    },

    /// The requested commitment level was not observed in time.
    #[error("confirmation timed out for signature '{signature_id}'")]
    ConfirmationTimeout {
        /// Signature id that was being polled.
        signature_id: String,
    },

    /// A dry-run simulation failed. Reported, not fatal to the caller.
    #[error("simulation failed: {reason}")]
    SimulationFailed {
        /// Description of the simulation failure.
        reason: String,
    },

    /// A cryptographic operation failed (derivation, signing, encryption).
    #[error("crypto error: {reason}")]
    CryptoError {
        /// Human-readable description of the cryptographic failure.
        reason: String,
    },

    /// A configuration value is invalid or missing.
    #[error("config error: {reason}")]
    ConfigError {
        /// Human-readable description of the configuration problem.
        reason: String,
    },

    /// A persistence operation failed (vault file read/write).
    #[error("storage error: {reason}")]
    StorageError {
        /// Human-readable description of the storage failure.
        reason: String,
    },

    /// A transport-layer failure (malformed wire message, rejected origin).
    #[error("transport error: {reason}")]
    TransportError {
        /// Human-readable description of the transport failure.
        reason: String,
    },
}

impl WalletError {
    /// Stable snake_case kind string for the wire `error` field.
    ///
    /// Callers use this to decide whether to prompt for a password
    /// retry, show a "rejected" state, or offer a network retry.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidMnemonic { .. } => "invalid_mnemonic",
            Self::WrongPassword => "wrong_password",
            Self::Locked => "locked",
            Self::NoKeyringForChain { .. } => "no_keyring_for_chain",
            Self::NoSuchAccount { .. } => "no_such_account",
            Self::UserDeclined => "user_declined",
            Self::Timeout => "timeout",
            Self::SendFailed { .. } => "send_failed",
            Self::ConfirmationTimeout { .. } => "confirmation_timeout",
            Self::SimulationFailed { .. } => "simulation_failed",
            Self::CryptoError { .. } => "crypto_error",
            Self::ConfigError { .. } => "config_error",
            Self::StorageError { .. } => "storage_error",
            Self::TransportError { .. } => "transport_error",
        }
    }
}

// ---------------------------------------------------------------------------
// Result alias
// ---------------------------------------------------------------------------

/// Convenience result type using [`WalletError`].
pub type Result<T> = std::result::Result<T, WalletError>;

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

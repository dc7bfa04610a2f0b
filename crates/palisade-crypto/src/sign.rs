//! Per-curve signing keypairs and signature verification.
//!
//! Two curve families are supported: Ed25519 (`ed25519-dalek`) and
//! secp256k1 ECDSA (`k256`). [`AccountKeypair`] is the tagged union
//! over both — every operation on it is an exhaustive `match`, so a
//! new chain family cannot be added without updating every dispatch
//! point.
//!
//! Private key material is zeroized on drop by the underlying curve
//! libraries. None of the keypair types implement `Clone` or `Debug`.

use ed25519_dalek::{Signer as _, SigningKey, VerifyingKey};
use k256::ecdsa;
use k256::ecdsa::signature::{Signer as _, Verifier as _};
use palisade_types::{AccountPublicKey, ChainFamily, Result, WalletError};

// ---------------------------------------------------------------------------
// Ed25519Keypair
// ---------------------------------------------------------------------------

/// Ed25519 signing keypair.
///
/// Wraps an `ed25519-dalek` [`SigningKey`]. The private key is
/// automatically zeroized when this struct is dropped, courtesy of
/// `ed25519-dalek`'s `ZeroizeOnDrop` implementation.
pub struct Ed25519Keypair {
    signing_key: SigningKey,
}

impl Ed25519Keypair {
    /// Reconstructs a keypair deterministically from a 32-byte seed.
    ///
    /// Given the same seed, this always produces the same keypair.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(seed),
        }
    }

    /// Returns the 32-byte public key.
    pub fn public_key_bytes(&self) -> [u8; 32] {
        self.signing_key.verifying_key().to_bytes()
    }

    /// Signs an arbitrary message and returns the 64-byte signature.
    ///
    /// Deterministic: the same keypair + message always yields the
    /// same signature (Ed25519 is deterministic per RFC 8032).
    pub fn sign(&self, message: &[u8]) -> [u8; 64] {
        self.signing_key.sign(message).to_bytes()
    }
}

// ---------------------------------------------------------------------------
// EcdsaKeypair
// ---------------------------------------------------------------------------

/// secp256k1 ECDSA signing keypair.
///
/// Signatures are RFC 6979 deterministic over SHA-256 of the message
/// bytes. Chain-specific envelope hashing (e.g. keccak for EVM
/// transactions) is the envelope builder's concern; the bytes reaching
/// this keypair are already the exact string the chain expects signed.
pub struct EcdsaKeypair {
    signing_key: ecdsa::SigningKey,
}

impl EcdsaKeypair {
    /// Wraps an existing `k256` signing key (used by HD derivation).
    pub(crate) fn from_signing_key(signing_key: ecdsa::SigningKey) -> Self {
        Self { signing_key }
    }

    /// Reconstructs a keypair from a 32-byte secret scalar.
    ///
    /// # Errors
    ///
    /// Returns [`WalletError::CryptoError`] if the bytes are not a
    /// valid non-zero scalar.
    pub fn from_bytes(bytes: &[u8; 32]) -> Result<Self> {
        let signing_key =
            ecdsa::SigningKey::from_slice(bytes).map_err(|e| WalletError::CryptoError {
                reason: format!("invalid secp256k1 secret key: {e}"),
            })?;
        Ok(Self { signing_key })
    }

    /// Returns the 33-byte SEC1 compressed public key.
    pub fn public_key_bytes(&self) -> Vec<u8> {
        let verifying_key = ecdsa::VerifyingKey::from(&self.signing_key);
        verifying_key.to_sec1_bytes().to_vec()
    }

    /// Signs a message and returns the 64-byte fixed-size signature.
    pub fn sign(&self, message: &[u8]) -> Vec<u8> {
        let signature: ecdsa::Signature = self.signing_key.sign(message);
        signature.to_bytes().to_vec()
    }

    /// Returns the 32-byte secret scalar.
    ///
    /// # Security
    ///
    /// The returned bytes are sensitive key material, exposed only for
    /// derivation test vectors. Callers **must** zeroize or discard
    /// the copy as soon as it is no longer needed.
    pub fn secret_bytes(&self) -> [u8; 32] {
        self.signing_key.to_bytes().into()
    }
}

// ---------------------------------------------------------------------------
// AccountKeypair
// ---------------------------------------------------------------------------

/// A derived account keypair, tagged by chain family.
///
/// Exclusively owned by the keyring store while unlocked; never copied
/// into caller-facing structures. Signing borrows the keypair for the
/// duration of the call only.
pub enum AccountKeypair {
    /// Ed25519 family account.
    Ed25519(Ed25519Keypair),
    /// secp256k1 family account.
    Secp256k1(EcdsaKeypair),
}

impl AccountKeypair {
    /// The chain family this keypair belongs to.
    pub fn chain_family(&self) -> ChainFamily {
        match self {
            Self::Ed25519(_) => ChainFamily::Ed25519,
            Self::Secp256k1(_) => ChainFamily::Secp256k1,
        }
    }

    /// Public key in the family's canonical encoding (32 bytes raw
    /// for Ed25519, 33 bytes SEC1 compressed for secp256k1).
    pub fn public_key(&self) -> AccountPublicKey {
        match self {
            Self::Ed25519(kp) => AccountPublicKey::new(kp.public_key_bytes().to_vec()),
            Self::Secp256k1(kp) => AccountPublicKey::new(kp.public_key_bytes()),
        }
    }

    /// Signs `message` with the family's signature scheme.
    pub fn sign(&self, message: &[u8]) -> Vec<u8> {
        match self {
            Self::Ed25519(kp) => kp.sign(message).to_vec(),
            Self::Secp256k1(kp) => kp.sign(message),
        }
    }
}

// ---------------------------------------------------------------------------
// Verification
// ---------------------------------------------------------------------------

/// Verifies a signature against a public key and message for the given
/// chain family.
///
/// Returns `Ok(())` if the signature is valid, or
/// [`WalletError::CryptoError`] if parsing or verification fails.
pub fn verify(
    family: ChainFamily,
    public_key: &AccountPublicKey,
    message: &[u8],
    signature: &[u8],
) -> Result<()> {
    match family {
        ChainFamily::Ed25519 => {
            let key_bytes: [u8; 32] =
                public_key
                    .as_bytes()
                    .try_into()
                    .map_err(|_| WalletError::CryptoError {
                        reason: format!(
                            "ed25519 public key must be 32 bytes, got {}",
                            public_key.as_bytes().len()
                        ),
                    })?;
            let vk = VerifyingKey::from_bytes(&key_bytes).map_err(|e| {
                WalletError::CryptoError {
                    reason: format!("invalid ed25519 public key: {e}"),
                }
            })?;
            let sig = ed25519_dalek::Signature::from_slice(signature).map_err(|e| {
                WalletError::CryptoError {
                    reason: format!("invalid ed25519 signature: {e}"),
                }
            })?;
            vk.verify_strict(message, &sig)
                .map_err(|e| WalletError::CryptoError {
                    reason: format!("ed25519 verification failed: {e}"),
                })
        }
        ChainFamily::Secp256k1 => {
            let vk = ecdsa::VerifyingKey::from_sec1_bytes(public_key.as_bytes()).map_err(|e| {
                WalletError::CryptoError {
                    reason: format!("invalid secp256k1 public key: {e}"),
                }
            })?;
            let sig = ecdsa::Signature::from_slice(signature).map_err(|e| {
                WalletError::CryptoError {
                    reason: format!("invalid secp256k1 signature: {e}"),
                }
            })?;
            vk.verify(message, &sig)
                .map_err(|e| WalletError::CryptoError {
                    reason: format!("secp256k1 verification failed: {e}"),
                })
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

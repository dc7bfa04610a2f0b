//! Password-based authenticated encryption of the secret phrase.
//!
//! The recovery phrase (or seed) leaves memory in exactly one form:
//! an [`EncryptedSecretPayload`]. The payload records every parameter
//! needed to decrypt it later — KDF name, iteration count, digest,
//! salt, nonce — so the on-disk format is self-describing.
//!
//! - **Key derivation**: PBKDF2-HMAC-SHA256, 600 000 iterations by
//!   default, fresh random 16-byte salt per encryption.
//! - **Encryption**: XChaCha20-Poly1305 with a fresh random 24-byte
//!   nonce per encryption.
//!
//! Decryption fails closed: any authentication-tag mismatch is
//! reported as [`WalletError::WrongPassword`], never as plaintext
//! garbage.

use chacha20poly1305::aead::{Aead, KeyInit, Payload};
use chacha20poly1305::{Key, XChaCha20Poly1305, XNonce};
use hmac::Hmac;
use palisade_types::{Result, WalletError};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use zeroize::{Zeroize, ZeroizeOnDrop};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// KDF label recorded in every payload this module produces.
pub const KDF_PBKDF2: &str = "pbkdf2";

/// Digest label recorded in every payload this module produces.
pub const DIGEST_SHA256: &str = "sha256";

/// Default PBKDF2 iteration count. High enough to make offline
/// password guessing expensive on commodity hardware.
pub const DEFAULT_ITERATIONS: u32 = 600_000;

/// Additional authenticated data binding ciphertexts to this payload
/// format. Decryption under a different AAD fails authentication.
const SECRET_AAD: &[u8] = b"palisade-secret-v1";

/// Salt length in bytes.
const SALT_LEN: usize = 16;

/// XChaCha20-Poly1305 nonce length in bytes.
const NONCE_LEN: usize = 24;

// ---------------------------------------------------------------------------
// KdfParams
// ---------------------------------------------------------------------------

/// Tunable parameters for the password KDF.
///
/// Production code uses [`Default`]; tests substitute a low iteration
/// count to keep the suite fast.
#[derive(Clone, Copy, Debug)]
pub struct KdfParams {
    /// PBKDF2 iteration count. Must be ≥ 1.
    pub iterations: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
        }
    }
}

// ---------------------------------------------------------------------------
// EncryptedSecretPayload
// ---------------------------------------------------------------------------

/// The durable, self-describing form of the wallet secret.
///
/// This is the only representation of the seed/mnemonic permitted to
/// leave memory. Contains no plaintext key material.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EncryptedSecretPayload {
    /// XChaCha20-Poly1305 ciphertext with the 16-byte tag appended.
    pub ciphertext: Vec<u8>,
    /// Nonce used for this encryption. Unique per payload.
    pub nonce: [u8; 24],
    /// PBKDF2 salt. Unique per payload.
    pub salt: [u8; 16],
    /// KDF label (always [`KDF_PBKDF2`] for payloads we produce).
    pub kdf_algorithm: String,
    /// PBKDF2 iteration count used to derive the key.
    pub iterations: u32,
    /// Digest label (always [`DIGEST_SHA256`] for payloads we produce).
    pub digest_algorithm: String,
}

// ---------------------------------------------------------------------------
// DerivedKey
// ---------------------------------------------------------------------------

/// 256-bit key derived from the password. Zeroized on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
struct DerivedKey([u8; 32]);

/// Runs PBKDF2-HMAC-SHA256 over the password and salt.
fn derive_key(password: &[u8], salt: &[u8], iterations: u32) -> Result<DerivedKey> {
    if iterations == 0 {
        return Err(WalletError::ConfigError {
            reason: "KDF iteration count must be greater than 0".into(),
        });
    }

    let mut output = [0u8; 32];
    pbkdf2::pbkdf2::<Hmac<Sha256>>(password, salt, iterations, &mut output).map_err(|e| {
        WalletError::CryptoError {
            reason: format!("PBKDF2-HMAC-SHA256 failed: {e}"),
        }
    })?;

    Ok(DerivedKey(output))
}

// ---------------------------------------------------------------------------
// Encrypt
// ---------------------------------------------------------------------------

/// Encrypts `plaintext` under `password` with the default KDF cost.
///
/// Salt and nonce are drawn fresh from OS entropy on every call, so
/// they are never reused across encryptions — even of the same
/// plaintext under the same password.
pub fn encrypt_secret(plaintext: &[u8], password: &str) -> Result<EncryptedSecretPayload> {
    encrypt_secret_with_params(plaintext, password, &KdfParams::default())
}

/// Encrypts `plaintext` under `password` with explicit KDF parameters.
pub fn encrypt_secret_with_params(
    plaintext: &[u8],
    password: &str,
    params: &KdfParams,
) -> Result<EncryptedSecretPayload> {
    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);

    let mut nonce = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce);

    let key = derive_key(password.as_bytes(), &salt, params.iterations)?;

    let cipher = XChaCha20Poly1305::new(Key::from_slice(&key.0));
    let ciphertext = cipher
        .encrypt(
            XNonce::from_slice(&nonce),
            Payload {
                msg: plaintext,
                aad: SECRET_AAD,
            },
        )
        .map_err(|e| WalletError::CryptoError {
            reason: format!("XChaCha20-Poly1305 encryption failed: {e}"),
        })?;

    Ok(EncryptedSecretPayload {
        ciphertext,
        nonce,
        salt,
        kdf_algorithm: KDF_PBKDF2.to_string(),
        iterations: params.iterations,
        digest_algorithm: DIGEST_SHA256.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Decrypt
// ---------------------------------------------------------------------------

/// Decrypts a payload with `password`.
///
/// The caller is responsible for zeroizing the returned plaintext as
/// soon as it is no longer needed.
///
/// # Errors
///
/// - [`WalletError::CryptoError`] if the payload records an algorithm
///   this module does not implement (checked before any key
///   derivation).
/// - [`WalletError::WrongPassword`] for **any** authentication
///   failure — wrong password, tampered ciphertext, or mismatched
///   AAD all look identical to the caller.
pub fn decrypt_secret(payload: &EncryptedSecretPayload, password: &str) -> Result<Vec<u8>> {
    if payload.kdf_algorithm != KDF_PBKDF2 {
        return Err(WalletError::CryptoError {
            reason: format!("unsupported KDF '{}'", payload.kdf_algorithm),
        });
    }
    if payload.digest_algorithm != DIGEST_SHA256 {
        return Err(WalletError::CryptoError {
            reason: format!("unsupported digest '{}'", payload.digest_algorithm),
        });
    }

    let key = derive_key(password.as_bytes(), &payload.salt, payload.iterations)?;

    let cipher = XChaCha20Poly1305::new(Key::from_slice(&key.0));
    cipher
        .decrypt(
            XNonce::from_slice(&payload.nonce),
            Payload {
                msg: &payload.ciphertext,
                aad: SECRET_AAD,
            },
        )
        .map_err(|_| WalletError::WrongPassword)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! Binary vault file format: header validation, read, and write.
//!
//! The encrypted persistence contract is a key-value blob store: one
//! [`EncryptedSecretPayload`] under a fixed file name. This module is
//! the file-backed implementation of that contract.
//!
//! # File layout
//!
//! ```text
//! Offset  Size  Field
//! ------  ----  -----
//!   0       4   Magic bytes: b"PLSD"
//!   4       1   Version: 0x01
//!   5       4   Payload length: u32 little-endian
//!   9     var   Payload (bincode-serialized EncryptedSecretPayload)
//! ```
//!
//! Magic, version, and length are verified **before** any
//! deserialization to prevent feeding malformed data to bincode.

use std::path::Path;

use palisade_crypto::cipher::EncryptedSecretPayload;
use palisade_types::{Result, WalletError};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Magic bytes identifying a Palisade vault file.
pub const VAULT_MAGIC: [u8; 4] = *b"PLSD";

/// Current vault file format version.
pub const VAULT_FILE_VERSION: u8 = 1;

/// Fixed file name the vault blob is stored under.
pub const VAULT_FILE_NAME: &str = "vault.dat";

/// Total fixed header size: magic (4) + version (1) + length (4).
const HEADER_SIZE: usize = 4 + 1 + 4;

/// Minimum plausible payload size in bytes.
///
/// A serialized payload carries a 16-byte tag, 16-byte salt, 24-byte
/// nonce and the KDF labels before any ciphertext; anything smaller is
/// a truncated file.
const MIN_PAYLOAD_SIZE: usize = 64;

// ---------------------------------------------------------------------------
// Write
// ---------------------------------------------------------------------------

/// Writes the encrypted payload to a vault file.
///
/// # Errors
///
/// Returns [`WalletError::StorageError`] if serialization or the file
/// write fails.
pub fn write_vault_file(path: &Path, payload: &EncryptedSecretPayload) -> Result<()> {
    let body = bincode::serialize(payload).map_err(|e| WalletError::StorageError {
        reason: format!("failed to serialize vault payload: {e}"),
    })?;

    let mut data = Vec::with_capacity(HEADER_SIZE + body.len());
    data.extend_from_slice(&VAULT_MAGIC);
    data.push(VAULT_FILE_VERSION);
    data.extend_from_slice(&(body.len() as u32).to_le_bytes());
    data.extend_from_slice(&body);

    std::fs::write(path, &data).map_err(|e| WalletError::StorageError {
        reason: format!("failed to write vault file: {e}"),
    })
}

// ---------------------------------------------------------------------------
// Read
// ---------------------------------------------------------------------------

/// Reads and validates a vault file.
///
/// # Validation order
///
/// 1. File size ≥ header + minimum payload.
/// 2. Magic bytes match `b"PLSD"`.
/// 3. Version byte matches the current version.
/// 4. Declared payload length matches the actual remainder.
/// 5. Payload deserialized via bincode.
///
/// # Errors
///
/// Returns [`WalletError::StorageError`] for I/O failures, truncated
/// files, magic mismatch, version mismatch, or length inconsistency.
pub fn read_vault_file(path: &Path) -> Result<EncryptedSecretPayload> {
    let data = std::fs::read(path).map_err(|e| WalletError::StorageError {
        reason: format!("failed to read vault file: {e}"),
    })?;

    // 1. Minimum size.
    let min_file_size = HEADER_SIZE + MIN_PAYLOAD_SIZE;
    if data.len() < min_file_size {
        return Err(WalletError::StorageError {
            reason: format!(
                "vault file truncated: expected at least {min_file_size} bytes, got {}",
                data.len()
            ),
        });
    }

    // 2. Magic bytes.
    let magic = &data[0..4];
    if magic != VAULT_MAGIC {
        return Err(WalletError::StorageError {
            reason: format!(
                "vault file magic mismatch: expected {:?}, got {:?}",
                &VAULT_MAGIC, magic
            ),
        });
    }

    // 3. Version byte.
    let version = data[4];
    if version != VAULT_FILE_VERSION {
        return Err(WalletError::StorageError {
            reason: format!(
                "vault file version mismatch: expected {VAULT_FILE_VERSION}, got {version}"
            ),
        });
    }

    // 4. Length consistency.
    let declared = u32::from_le_bytes([data[5], data[6], data[7], data[8]]) as usize;
    let body = &data[HEADER_SIZE..];
    if declared != body.len() {
        return Err(WalletError::StorageError {
            reason: format!(
                "vault file length mismatch: header declares {declared} bytes, found {}",
                body.len()
            ),
        });
    }

    // 5. Deserialize payload.
    bincode::deserialize(body).map_err(|e| WalletError::StorageError {
        reason: format!("failed to deserialize vault payload: {e}"),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

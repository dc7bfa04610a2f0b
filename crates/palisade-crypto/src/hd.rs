//! Hierarchical deterministic key derivation for both chain families.
//!
//! - **Ed25519**: SLIP-0010 derivation from a BIP39 seed. Only
//!   hardened derivation is supported, as required by the SLIP-0010
//!   Ed25519 spec — non-hardened segments are rejected, which closes
//!   the parent-key-extension attack for this family.
//! - **secp256k1**: standard BIP-32 derivation via the `bip32` crate;
//!   hardened and non-hardened segments may be mixed.
//!
//! Derivation is pure and deterministic: the same (seed, path) always
//! yields the same keypair. This is the only way accounts are
//! recoverable from a backup phrase.
//!
//! References:
//! - <https://github.com/satoshilabs/slips/blob/master/slip-0010.md>
//! - <https://github.com/bitcoin/bips/blob/master/bip-0032.mediawiki>

use hmac::{Hmac, Mac};
use palisade_types::{ChainFamily, DerivationPath, Result, WalletError};
use sha2::Sha512;
use zeroize::Zeroize;

use crate::mnemonic::Seed;
use crate::sign::{AccountKeypair, EcdsaKeypair, Ed25519Keypair};

/// HMAC-SHA512 type alias used throughout SLIP-0010.
type HmacSha512 = Hmac<Sha512>;

/// The hardened index offset (0x80000000) per BIP-32/SLIP-0010.
const HARDENED_OFFSET: u32 = 0x8000_0000;

/// HMAC key for Ed25519 master key generation per SLIP-0010 §2.
const ED25519_MASTER_HMAC_KEY: &[u8] = b"ed25519 seed";

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Derives an account keypair from a seed at `path` for `family`.
///
/// The chain family selects the derivation algorithm; the dispatch is
/// an exhaustive `match` and there is no default arm.
///
/// # Errors
///
/// - [`WalletError::ConfigError`] if the path violates the family's
///   hardening rules (Ed25519 requires every segment hardened).
/// - [`WalletError::CryptoError`] if the underlying derivation fails.
pub fn derive_keypair(
    seed: &Seed,
    path: &DerivationPath,
    family: ChainFamily,
) -> Result<AccountKeypair> {
    match family {
        ChainFamily::Ed25519 => derive_ed25519(seed, path).map(AccountKeypair::Ed25519),
        ChainFamily::Secp256k1 => derive_secp256k1(seed, path).map(AccountKeypair::Secp256k1),
    }
}

// ---------------------------------------------------------------------------
// Ed25519 (SLIP-0010)
// ---------------------------------------------------------------------------

/// Derives an Ed25519 keypair via the SLIP-0010 hardened-only chain.
///
/// # Process (SLIP-0010 §2–§3)
///
/// 1. Master key: `HMAC-SHA512(key="ed25519 seed", data=seed)`.
///    - Left 32 bytes → master private key.
///    - Right 32 bytes → master chain code.
/// 2. For each hardened child index `i` in the path:
///    `HMAC-SHA512(key=chain_code, data=0x00 || private_key || ser32(i | 0x80000000))`.
/// 3. Final private key is used as the Ed25519 seed.
fn derive_ed25519(seed: &Seed, path: &DerivationPath) -> Result<Ed25519Keypair> {
    for segment in path.segments() {
        if !segment.hardened {
            return Err(WalletError::ConfigError {
                reason: format!(
                    "SLIP-0010 Ed25519 requires hardened derivation only, \
                     got non-hardened index {} in '{path}'",
                    segment.index
                ),
            });
        }
    }

    let (mut key, mut chain_code) = master_key_from_seed(seed.as_bytes())?;

    for segment in path.segments() {
        let (child_key, child_chain) = derive_hardened_child(&key, &chain_code, segment.index)?;
        key.zeroize();
        chain_code.zeroize();
        key = child_key;
        chain_code = child_chain;
    }

    let keypair = Ed25519Keypair::from_seed(&key);

    key.zeroize();
    chain_code.zeroize();

    Ok(keypair)
}

/// Generates the Ed25519 master private key and chain code from a seed.
///
/// `I = HMAC-SHA512(key="ed25519 seed", data=seed)`
/// `IL = I[0..32]` = master key, `IR = I[32..64]` = chain code.
fn master_key_from_seed(seed: &[u8]) -> Result<([u8; 32], [u8; 32])> {
    let i = hmac_sha512(ED25519_MASTER_HMAC_KEY, seed)?;

    let mut key = [0u8; 32];
    let mut chain_code = [0u8; 32];
    key.copy_from_slice(&i[..32]);
    chain_code.copy_from_slice(&i[32..]);

    Ok((key, chain_code))
}

/// Derives a hardened child key from a parent key and chain code.
///
/// `I = HMAC-SHA512(key=chain_code, data=0x00 || parent_key || ser32(index | 0x80000000))`
/// `IL = I[0..32]` = child key, `IR = I[32..64]` = child chain code.
fn derive_hardened_child(
    parent_key: &[u8; 32],
    parent_chain_code: &[u8; 32],
    index: u32,
) -> Result<([u8; 32], [u8; 32])> {
    // data = 0x00 || parent_key (32 bytes) || index_be (4 bytes) = 37 bytes
    let mut data = [0u8; 37];
    data[0] = 0x00;
    data[1..33].copy_from_slice(parent_key);
    data[33..37].copy_from_slice(&(index | HARDENED_OFFSET).to_be_bytes());

    let i = hmac_sha512(parent_chain_code, &data)?;
    data.zeroize();

    let mut child_key = [0u8; 32];
    let mut child_chain = [0u8; 32];
    child_key.copy_from_slice(&i[..32]);
    child_chain.copy_from_slice(&i[32..]);

    Ok((child_key, child_chain))
}

/// Computes HMAC-SHA512 and returns the 64-byte output.
fn hmac_sha512(key: &[u8], data: &[u8]) -> Result<[u8; 64]> {
    let mut mac = HmacSha512::new_from_slice(key).map_err(|e| WalletError::CryptoError {
        reason: format!("HMAC-SHA512 key init failed: {e}"),
    })?;
    mac.update(data);
    let result = mac.finalize().into_bytes();

    let mut output = [0u8; 64];
    output.copy_from_slice(&result);
    Ok(output)
}

// ---------------------------------------------------------------------------
// secp256k1 (BIP-32)
// ---------------------------------------------------------------------------

/// Derives a secp256k1 keypair via standard BIP-32.
///
/// The path string rendering is handed to the `bip32` crate unchanged,
/// so hardened/non-hardened mixing follows BIP-32 rules exactly.
fn derive_secp256k1(seed: &Seed, path: &DerivationPath) -> Result<EcdsaKeypair> {
    let bip32_path: bip32::DerivationPath =
        path.to_string().parse().map_err(|e| WalletError::ConfigError {
            reason: format!("invalid BIP-32 path '{path}': {e}"),
        })?;

    let xprv = bip32::XPrv::derive_from_path(seed.as_bytes(), &bip32_path).map_err(|e| {
        WalletError::CryptoError {
            reason: format!("BIP-32 derivation failed at '{path}': {e}"),
        }
    })?;

    Ok(EcdsaKeypair::from_signing_key(xprv.private_key().clone()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

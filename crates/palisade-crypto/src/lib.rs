//! Cryptographic primitives for the Palisade multi-chain wallet.
//!
//! This crate is the **sole** location for all cryptographic operations.
//! No other crate in the workspace may perform raw crypto directly.
//!
//! # Modules
//!
//! - [`mnemonic`] — BIP39 recovery phrase generation, validation, and
//!   seed derivation
//! - [`hd`] — hierarchical deterministic key derivation (SLIP-0010
//!   Ed25519 and BIP-32 secp256k1)
//! - [`cipher`] — password-based authenticated encryption of the seed
//!   phrase for persistence
//! - [`sign`] — per-curve signing keypairs and signature verification

pub mod cipher;
pub mod hd;
pub mod mnemonic;
pub mod sign;

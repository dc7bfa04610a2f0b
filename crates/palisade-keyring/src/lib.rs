//! Keyring lifecycle management for Palisade.
//!
//! Handles the full keyring lifecycle:
//!
//! - **Create / import** from a BIP39 recovery phrase
//! - **Encrypt** the phrase to a vault file (PBKDF2 + XChaCha20-Poly1305)
//! - **Lock / Unlock** with a password
//! - **Per-chain-family keyrings** with monotone account derivation
//!   indices that are never reused
//!
//! While unlocked, the [`store::KeyringStore`] is the single owner of
//! all resident secret material. Locking drops every keypair and the
//! seed, all of which zeroize on drop.

pub mod store;
pub mod vault_file;

//! Integration tests for palisade-keyring.
//!
//! All tests use deterministic BIP39 mnemonics (all-zero and all-FF
//! entropy) and fixed passwords. No test relies on randomness for its
//! assertions — only for store-internal salt/nonce generation, which
//! does not affect test correctness.

use palisade_crypto::cipher::KdfParams;
use palisade_keyring::store::KeyringStore;
use palisade_keyring::vault_file::{read_vault_file, write_vault_file};
use palisade_types::{AccountPublicKey, ChainFamily, WalletError};

// ---------------------------------------------------------------------------
// Test constants (deterministic BIP39 mnemonics)
// ---------------------------------------------------------------------------

/// BIP39 mnemonic from all-zero 128-bit entropy.
const MNEMONIC_A: &str = "abandon abandon abandon abandon abandon abandon \
                          abandon abandon abandon abandon abandon about";

/// BIP39 mnemonic from all-0xFF 128-bit entropy.
const MNEMONIC_B: &str = "zoo zoo zoo zoo zoo zoo zoo zoo zoo zoo zoo wrong";

const PASSWORD: &str = "correct horse battery staple";
const WRONG_PASSWORD: &str = "wrong password entirely";

/// Light KDF parameters so the suite stays fast.
const TEST_KDF: KdfParams = KdfParams { iterations: 16 };

fn store_for(mnemonic: &str) -> KeyringStore {
    KeyringStore::create_with_params(mnemonic, PASSWORD, &TEST_KDF)
        .expect("store creation succeeds")
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// RAII guard that removes a temporary file on drop.
struct TempFile(std::path::PathBuf);

impl TempFile {
    fn new(name: &str) -> Self {
        let path = std::env::temp_dir().join(format!(
            "palisade_keyring_{name}_{}.dat",
            std::process::id()
        ));
        Self(path)
    }

    fn path(&self) -> &std::path::Path {
        &self.0
    }
}

impl Drop for TempFile {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.0);
    }
}

// ---------------------------------------------------------------------------
// 1. Create → Unlock → Lock cycle
// ---------------------------------------------------------------------------

#[test]
fn create_unlock_lock_cycle() -> Result<(), WalletError> {
    let mut store = store_for(MNEMONIC_A);
    assert!(!store.is_unlocked());

    store.unlock(PASSWORD)?;
    assert!(store.is_unlocked());

    // Both chain families resolved, each with its default account.
    for family in ChainFamily::ALL {
        let entry = store.keyring_for(family)?;
        assert_eq!(entry.accounts().len(), 1);
    }

    store.lock();
    assert!(!store.is_unlocked());
    assert!(matches!(
        store.keyring_for(ChainFamily::Ed25519),
        Err(WalletError::Locked)
    ));

    // Unlock again to verify repeatability.
    store.unlock(PASSWORD)?;
    assert!(store.is_unlocked());
    Ok(())
}

#[test]
fn wrong_password_never_unlocks() {
    let mut store = store_for(MNEMONIC_A);
    let result = store.unlock(WRONG_PASSWORD);
    assert!(matches!(result, Err(WalletError::WrongPassword)));
    assert!(!store.is_unlocked());
}

// ---------------------------------------------------------------------------
// 2. Determinism across stores and recovery
// ---------------------------------------------------------------------------

#[test]
fn same_mnemonic_same_accounts_regardless_of_password() -> Result<(), WalletError> {
    let mut s1 = store_for(MNEMONIC_A);
    let mut s2 = KeyringStore::create_with_params(MNEMONIC_A, "another password", &TEST_KDF)?;

    s1.unlock(PASSWORD)?;
    s2.unlock("another password")?;

    for family in ChainFamily::ALL {
        let k1 = s1.keyring_for(family)?.accounts()[0].public_key().clone();
        let k2 = s2.keyring_for(family)?.accounts()[0].public_key().clone();
        assert_eq!(k1, k2, "family {family}");
    }

    // But encrypted payloads differ (different salt, nonce, password).
    assert_ne!(s1.payload().ciphertext, s2.payload().ciphertext);
    Ok(())
}

#[test]
fn different_mnemonics_different_accounts() -> Result<(), WalletError> {
    let mut s1 = store_for(MNEMONIC_A);
    let mut s2 = store_for(MNEMONIC_B);
    s1.unlock(PASSWORD)?;
    s2.unlock(PASSWORD)?;

    let k1 = s1.keyring_for(ChainFamily::Ed25519)?.accounts()[0].public_key().clone();
    let k2 = s2.keyring_for(ChainFamily::Ed25519)?.accounts()[0].public_key().clone();
    assert_ne!(k1, k2);
    Ok(())
}

#[test]
fn import_restores_identical_accounts() -> Result<(), WalletError> {
    let mut original = store_for(MNEMONIC_A);
    original.unlock(PASSWORD)?;
    original.add_account(ChainFamily::Ed25519)?;
    let accounts: Vec<AccountPublicKey> = original
        .keyring_for(ChainFamily::Ed25519)?
        .accounts()
        .iter()
        .map(|a| a.public_key().clone())
        .collect();

    // Fresh device: import the phrase, re-derive the same accounts.
    let mut restored = KeyringStore::import(MNEMONIC_A, "new device password")?;
    restored.unlock("new device password")?;
    restored.add_account(ChainFamily::Ed25519)?;
    let restored_accounts: Vec<AccountPublicKey> = restored
        .keyring_for(ChainFamily::Ed25519)?
        .accounts()
        .iter()
        .map(|a| a.public_key().clone())
        .collect();

    assert_eq!(accounts, restored_accounts);
    Ok(())
}

// ---------------------------------------------------------------------------
// 3. Chain family isolation
// ---------------------------------------------------------------------------

#[test]
fn unsupported_family_is_not_remapped() -> Result<(), WalletError> {
    let mut store = store_for(MNEMONIC_A);
    // Only the ed25519 keyring is populated.
    store.unlock_families(PASSWORD, &[ChainFamily::Ed25519])?;

    // A secp256k1 request must fail, not fall through to ed25519.
    match store.keyring_for(ChainFamily::Secp256k1) {
        Err(WalletError::NoKeyringForChain { family }) => {
            assert_eq!(family, ChainFamily::Secp256k1);
        }
        Err(other) => panic!("expected NoKeyringForChain, got {other}"),
        Ok(_) => panic!("expected NoKeyringForChain, got a keyring"),
    }
    Ok(())
}

#[test]
fn family_keys_never_overlap() -> Result<(), WalletError> {
    let mut store = store_for(MNEMONIC_A);
    store.unlock(PASSWORD)?;

    let ed = store.keyring_for(ChainFamily::Ed25519)?.accounts()[0].public_key().clone();
    let k = store.keyring_for(ChainFamily::Secp256k1)?.accounts()[0].public_key().clone();

    assert_ne!(ed.as_bytes(), k.as_bytes());
    assert!(store.keyring_for(ChainFamily::Secp256k1)?.find_account(&ed).is_err());
    assert!(store.keyring_for(ChainFamily::Ed25519)?.find_account(&k).is_err());
    Ok(())
}

// ---------------------------------------------------------------------------
// 4. Vault file persistence
// ---------------------------------------------------------------------------

#[test]
fn vault_file_roundtrip_preserves_accounts() -> Result<(), WalletError> {
    let file = TempFile::new("persist");

    let mut store = store_for(MNEMONIC_A);
    store.unlock(PASSWORD)?;
    let original_key = store
        .keyring_for(ChainFamily::Secp256k1)?
        .accounts()[0]
        .public_key()
        .clone();

    write_vault_file(file.path(), store.payload())?;

    // Reload from disk into a fresh (locked) store.
    let payload = read_vault_file(file.path())?;
    let mut reloaded = KeyringStore::from_payload(payload);
    assert!(!reloaded.is_unlocked());

    reloaded.unlock(PASSWORD)?;
    let reloaded_key = reloaded
        .keyring_for(ChainFamily::Secp256k1)?
        .accounts()[0]
        .public_key()
        .clone();

    assert_eq!(original_key, reloaded_key);
    Ok(())
}

#[test]
fn reloaded_vault_still_rejects_wrong_password() -> Result<(), WalletError> {
    let file = TempFile::new("wrongpw");

    let store = store_for(MNEMONIC_A);
    write_vault_file(file.path(), store.payload())?;

    let mut reloaded = KeyringStore::from_payload(read_vault_file(file.path())?);
    let result = reloaded.unlock(WRONG_PASSWORD);
    assert!(matches!(result, Err(WalletError::WrongPassword)));
    Ok(())
}

// ---------------------------------------------------------------------------
// 5. Signing through the store boundary
// ---------------------------------------------------------------------------

#[test]
fn sign_and_verify_per_family() -> Result<(), WalletError> {
    let mut store = store_for(MNEMONIC_A);
    store.unlock(PASSWORD)?;

    let msg = b"zero-value self transfer";
    for family in ChainFamily::ALL {
        let entry = store.keyring_for(family)?;
        let account = &entry.accounts()[0];
        let sig = account.sign(msg);
        palisade_crypto::sign::verify(family, account.public_key(), msg, &sig)?;
    }
    Ok(())
}

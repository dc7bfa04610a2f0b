//! Vault file persistence for the daemon.
//!
//! Thin wrapper over [`palisade_keyring::vault_file`] adding atomic
//! writes (tmp + rename), so a crash mid-save never leaves a corrupt
//! vault behind. No plaintext secret material is written to disk.

use std::path::Path;

use palisade_keyring::store::KeyringStore;
use palisade_keyring::vault_file::{read_vault_file, write_vault_file};

/// Saves a store's encrypted payload atomically.
pub fn save_store(path: &Path, store: &KeyringStore) -> Result<(), String> {
    let tmp_path = path.with_extension("dat.tmp");

    write_vault_file(&tmp_path, store.payload())
        .map_err(|e| format!("failed to write vault file: {e}"))?;

    std::fs::rename(&tmp_path, path).map_err(|e| {
        let _ = std::fs::remove_file(&tmp_path);
        format!("failed to rename vault file: {e}")
    })?;

    tracing::info!(path = %path.display(), "vault saved");
    Ok(())
}

/// Loads a store from a vault file.
///
/// Returns a **locked** store. Call `store.unlock(password)` after
/// loading.
pub fn load_store(path: &Path) -> Result<KeyringStore, String> {
    if !path.exists() {
        return Err(format!("vault file not found: {}", path.display()));
    }

    let payload =
        read_vault_file(path).map_err(|e| format!("failed to load vault file: {e}"))?;
    Ok(KeyringStore::from_payload(payload))
}

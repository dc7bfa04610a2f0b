//! Keyring store: lock/unlock lifecycle and per-family account sets.
//!
//! A [`KeyringStore`] keeps the recovery phrase encrypted at rest as an
//! [`EncryptedSecretPayload`]. Unlocking decrypts the phrase, derives
//! the seed, and populates one [`KeyringEntry`] per enabled chain
//! family. Locking drops the seed and every keypair; both zeroize on
//! drop.
//!
//! # Invariants
//!
//! - Every account in an entry belongs to exactly that entry's chain
//!   family (enforced at insert).
//! - An entry is absent until at least one account has been derived
//!   for its family; lookups for absent families fail with
//!   `NoKeyringForChain` — they are **never** served by another
//!   family's keyring.
//! - `next_derivation_index` only ever increases. Removing an account
//!   retires its index permanently, so re-derived wallets never
//!   collide with previously handed-out addresses.
//! - State transitions to `Unlocked` only after every derivation has
//!   succeeded; a failed or cancelled unlock leaves the store locked.

use std::collections::HashMap;

use palisade_crypto::cipher::{
    decrypt_secret, encrypt_secret_with_params, EncryptedSecretPayload, KdfParams,
};
use palisade_crypto::hd::derive_keypair;
use palisade_crypto::mnemonic::{mnemonic_to_seed, validate_mnemonic, Seed};
use palisade_crypto::sign::AccountKeypair;
use palisade_types::{
    AccountPublicKey, ChainFamily, DerivationPath, Result, WalletError,
};
use zeroize::Zeroize;

// ---------------------------------------------------------------------------
// Account
// ---------------------------------------------------------------------------

/// One derived account inside a keyring.
///
/// The keypair is private to this module: callers can read the public
/// key and request signatures, but the secret never crosses the API
/// boundary.
pub struct Account {
    public_key: AccountPublicKey,
    derivation_index: u32,
    path: DerivationPath,
    keypair: AccountKeypair,
}

impl Account {
    fn new(keypair: AccountKeypair, derivation_index: u32, path: DerivationPath) -> Self {
        Self {
            public_key: keypair.public_key(),
            derivation_index,
            path,
            keypair,
        }
    }

    /// Public key in the family's canonical encoding.
    pub fn public_key(&self) -> &AccountPublicKey {
        &self.public_key
    }

    /// Account index within the derivation path.
    pub fn derivation_index(&self) -> u32 {
        self.derivation_index
    }

    /// Full derivation path of this account.
    pub fn path(&self) -> &DerivationPath {
        &self.path
    }

    /// Chain family this account belongs to.
    pub fn chain_family(&self) -> ChainFamily {
        self.keypair.chain_family()
    }

    /// Signs `message` with this account's key.
    ///
    /// The secret is borrowed for the duration of this call only; no
    /// caller may retain a copy of it.
    pub fn sign(&self, message: &[u8]) -> Vec<u8> {
        self.keypair.sign(message)
    }
}

// Account does not implement Clone/Debug to prevent key leakage.

// ---------------------------------------------------------------------------
// KeyringEntry
// ---------------------------------------------------------------------------

/// The set of derived accounts for one chain family.
pub struct KeyringEntry {
    chain_family: ChainFamily,
    accounts: Vec<Account>,
    active_index: usize,
    next_derivation_index: u32,
}

impl KeyringEntry {
    fn new(chain_family: ChainFamily) -> Self {
        Self {
            chain_family,
            accounts: Vec::new(),
            active_index: 0,
            next_derivation_index: 0,
        }
    }

    /// The chain family this entry holds accounts for.
    pub fn chain_family(&self) -> ChainFamily {
        self.chain_family
    }

    /// All accounts, in derivation order.
    pub fn accounts(&self) -> &[Account] {
        &self.accounts
    }

    /// Index of the currently active account.
    pub fn active_index(&self) -> usize {
        self.active_index
    }

    /// The currently active account, if any accounts remain.
    pub fn active(&self) -> Option<&Account> {
        self.accounts.get(self.active_index)
    }

    /// Next derivation index the watermark will hand out.
    pub fn next_derivation_index(&self) -> u32 {
        self.next_derivation_index
    }

    /// Locates an account by public key.
    ///
    /// # Errors
    ///
    /// Returns [`WalletError::NoSuchAccount`] if the key is not in
    /// this keyring.
    pub fn find_account(&self, public_key: &AccountPublicKey) -> Result<&Account> {
        self.accounts
            .iter()
            .find(|a| a.public_key() == public_key)
            .ok_or_else(|| WalletError::NoSuchAccount {
                public_key: public_key.to_base58(),
            })
    }

    /// Appends an account, enforcing the family invariant.
    fn push_account(&mut self, account: Account) -> Result<()> {
        if account.chain_family() != self.chain_family {
            return Err(WalletError::CryptoError {
                reason: format!(
                    "account family {} does not match keyring family {}",
                    account.chain_family(),
                    self.chain_family
                ),
            });
        }
        self.accounts.push(account);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Store state
// ---------------------------------------------------------------------------

/// Resident secret material while unlocked: the seed plus the derived
/// keyrings. Dropped as a unit on lock.
struct UnlockedKeyrings {
    seed: Seed,
    entries: HashMap<ChainFamily, KeyringEntry>,
}

enum StoreState {
    Locked,
    Unlocked(UnlockedKeyrings),
}

// ---------------------------------------------------------------------------
// KeyringStore
// ---------------------------------------------------------------------------

/// Encrypted keyring store with a password-based lock/unlock lifecycle.
///
/// At rest the store holds only the [`EncryptedSecretPayload`] of the
/// recovery phrase. While unlocked it is the single owner of the seed
/// and all derived keypairs; no other component may retain secret
/// material beyond the duration of a signing call.
pub struct KeyringStore {
    payload: EncryptedSecretPayload,
    state: StoreState,
}

impl KeyringStore {
    // -- Construction -----------------------------------------------------

    /// Creates a store from a freshly generated recovery phrase.
    ///
    /// Validates the phrase, encrypts it under `password`, and returns
    /// the store in the **Locked** state.
    pub fn create(mnemonic: &str, password: &str) -> Result<Self> {
        Self::create_with_params(mnemonic, password, &KdfParams::default())
    }

    /// Imports an existing recovery phrase.
    ///
    /// Identical to [`create`](Self::create) — the phrase is validated
    /// and never partially accepted — but logged as an import so
    /// operators can tell restores from fresh wallets.
    pub fn import(mnemonic: &str, password: &str) -> Result<Self> {
        let store = Self::create(mnemonic, password)?;
        tracing::info!("keyring imported from existing recovery phrase");
        Ok(store)
    }

    /// Creates a store with explicit KDF parameters (tests use light
    /// parameters; production uses the default).
    pub fn create_with_params(
        mnemonic: &str,
        password: &str,
        params: &KdfParams,
    ) -> Result<Self> {
        validate_mnemonic(mnemonic)?;
        let payload = encrypt_secret_with_params(mnemonic.as_bytes(), password, params)?;
        Ok(Self {
            payload,
            state: StoreState::Locked,
        })
    }

    /// Reconstructs a locked store from a persisted payload (see
    /// [`crate::vault_file`]).
    pub fn from_payload(payload: EncryptedSecretPayload) -> Self {
        Self {
            payload,
            state: StoreState::Locked,
        }
    }

    // -- Accessors --------------------------------------------------------

    /// The durable encrypted payload, for persistence.
    pub fn payload(&self) -> &EncryptedSecretPayload {
        &self.payload
    }

    /// Returns `true` if key material is currently resident.
    pub fn is_unlocked(&self) -> bool {
        matches!(self.state, StoreState::Unlocked(_))
    }

    // -- Lifecycle --------------------------------------------------------

    /// Unlocks the store, deriving the default account for every chain
    /// family.
    pub fn unlock(&mut self, password: &str) -> Result<()> {
        self.unlock_families(password, &ChainFamily::ALL)
    }

    /// Unlocks the store for an explicit set of chain families.
    ///
    /// # Process
    ///
    /// 1. Decrypt the recovery phrase (any tag mismatch →
    ///    [`WalletError::WrongPassword`]).
    /// 2. Derive the 64-byte seed.
    /// 3. Derive account index 0 for each requested family.
    /// 4. Only once **all** derivations succeed, transition to
    ///    `Unlocked`. A failure at any step leaves the store locked —
    ///    there is no partially-unlocked state.
    ///
    /// If the store is already unlocked, this is a no-op.
    pub fn unlock_families(&mut self, password: &str, families: &[ChainFamily]) -> Result<()> {
        if self.is_unlocked() {
            return Ok(());
        }

        let plaintext = decrypt_secret(&self.payload, password)?;
        let mut mnemonic = String::from_utf8(plaintext).map_err(|e| {
            let mut bad = e.into_bytes();
            bad.zeroize();
            WalletError::CryptoError {
                reason: "decrypted payload is not valid UTF-8".into(),
            }
        })?;

        // Derive everything before touching self.state. Zeroize the
        // phrase on every path out.
        let result = (|| -> Result<UnlockedKeyrings> {
            let seed = mnemonic_to_seed(&mnemonic, "")?;

            let mut entries = HashMap::new();
            for &family in families {
                let path = DerivationPath::account_path(family, 0);
                let keypair = derive_keypair(&seed, &path, family)?;

                let mut entry = KeyringEntry::new(family);
                entry.push_account(Account::new(keypair, 0, path))?;
                entry.next_derivation_index = 1;
                entries.insert(family, entry);
            }

            Ok(UnlockedKeyrings { seed, entries })
        })();

        mnemonic.zeroize();

        self.state = StoreState::Unlocked(result?);
        tracing::debug!(families = families.len(), "keyring store unlocked");
        Ok(())
    }

    /// Locks the store, dropping all resident secret material.
    ///
    /// The seed and every keypair zeroize on drop before this method
    /// returns. Subsequent lookups fail with [`WalletError::Locked`].
    /// If already locked, this is a no-op.
    pub fn lock(&mut self) {
        self.state = StoreState::Locked;
        tracing::debug!("keyring store locked");
    }

    // -- Keyring access ---------------------------------------------------

    /// Resolves the keyring for `family`.
    ///
    /// The family always comes from the caller's request. A missing
    /// entry is [`WalletError::NoKeyringForChain`] — it is never
    /// remapped to a different family's keyring.
    pub fn keyring_for(&self, family: ChainFamily) -> Result<&KeyringEntry> {
        match &self.state {
            StoreState::Locked => Err(WalletError::Locked),
            StoreState::Unlocked(unlocked) => unlocked
                .entries
                .get(&family)
                .ok_or(WalletError::NoKeyringForChain { family }),
        }
    }

    /// Derives and appends the next account for `family`.
    ///
    /// Uses the entry's derivation watermark, which only ever
    /// increases; indices retired by [`remove_account`](Self::remove_account)
    /// are never handed out again. If no entry exists yet for the
    /// family, one is created with its first account.
    pub fn add_account(&mut self, family: ChainFamily) -> Result<AccountPublicKey> {
        let unlocked = match &mut self.state {
            StoreState::Locked => return Err(WalletError::Locked),
            StoreState::Unlocked(unlocked) => unlocked,
        };

        let next_index = unlocked
            .entries
            .get(&family)
            .map(|e| e.next_derivation_index)
            .unwrap_or(0);

        let path = DerivationPath::account_path(family, next_index);
        let keypair = derive_keypair(&unlocked.seed, &path, family)?;
        let account = Account::new(keypair, next_index, path);
        let public_key = account.public_key().clone();

        let entry = unlocked
            .entries
            .entry(family)
            .or_insert_with(|| KeyringEntry::new(family));
        entry.push_account(account)?;
        entry.next_derivation_index = next_index + 1;

        tracing::debug!(%family, index = next_index, "account derived");
        Ok(public_key)
    }

    /// Removes an account from its family's keyring.
    ///
    /// The derivation watermark is left untouched: the removed index
    /// is retired permanently.
    pub fn remove_account(
        &mut self,
        family: ChainFamily,
        public_key: &AccountPublicKey,
    ) -> Result<()> {
        let unlocked = match &mut self.state {
            StoreState::Locked => return Err(WalletError::Locked),
            StoreState::Unlocked(unlocked) => unlocked,
        };

        let entry = unlocked
            .entries
            .get_mut(&family)
            .ok_or(WalletError::NoKeyringForChain { family })?;

        let position = entry
            .accounts
            .iter()
            .position(|a| a.public_key() == public_key)
            .ok_or_else(|| WalletError::NoSuchAccount {
                public_key: public_key.to_base58(),
            })?;

        entry.accounts.remove(position);

        // Keep the active index pointing at the same account where
        // possible, falling back to the first remaining account.
        if position < entry.active_index {
            entry.active_index -= 1;
        } else if entry.active_index >= entry.accounts.len() {
            entry.active_index = 0;
        }

        Ok(())
    }

    /// Marks an account as the active one for its family.
    pub fn set_active_account(
        &mut self,
        family: ChainFamily,
        public_key: &AccountPublicKey,
    ) -> Result<()> {
        let unlocked = match &mut self.state {
            StoreState::Locked => return Err(WalletError::Locked),
            StoreState::Unlocked(unlocked) => unlocked,
        };

        let entry = unlocked
            .entries
            .get_mut(&family)
            .ok_or(WalletError::NoKeyringForChain { family })?;

        let position = entry
            .accounts
            .iter()
            .position(|a| a.public_key() == public_key)
            .ok_or_else(|| WalletError::NoSuchAccount {
                public_key: public_key.to_base58(),
            })?;

        entry.active_index = position;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! The signing service: request → keyring → signature.
//!
//! Dispatch rules:
//!
//! - The keyring lookup uses the chain family **from the request**.
//!   There is no default arm: a request for family A is never served
//!   by family B's keyring, even if B is the only one unlocked.
//! - Signing operations against the same account are serialized via a
//!   per-account mutex. Different accounts and different families
//!   proceed fully in parallel.
//! - Batch requests are all-or-nothing: every item is validated before
//!   the first signature is produced, and a single aggregated failure
//!   is reported if any item is unusable.

use std::collections::HashMap;
use std::sync::Arc;

use palisade_keyring::store::KeyringStore;
use palisade_types::{
    AccountPublicKey, Result, SignedPayload, SigningOutcome, SigningPayload, SigningRequest,
    WalletError,
};
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

use crate::approval::{ApprovalDecision, ApprovalGate};

// ---------------------------------------------------------------------------
// AccountGuard
// ---------------------------------------------------------------------------

/// Exclusive serialization guard for one account.
///
/// While held, no other signing request for the same account can
/// proceed. Multi-step flows (prepare → sign → broadcast) hold the
/// guard across every step that assigns shared per-account state such
/// as a recent blockhash, then drop it to release the account.
pub struct AccountGuard {
    public_key: AccountPublicKey,
    _guard: OwnedMutexGuard<()>,
}

impl AccountGuard {
    /// The account this guard serializes.
    pub fn public_key(&self) -> &AccountPublicKey {
        &self.public_key
    }
}

// ---------------------------------------------------------------------------
// SigningService
// ---------------------------------------------------------------------------

/// Dispatches signing requests to the keyring store.
///
/// Holds the store behind an async `RwLock`: signing takes a read
/// guard, so unrelated requests overlap freely while lifecycle
/// operations (unlock, lock, add account) briefly take the write side.
pub struct SigningService {
    store: Arc<RwLock<KeyringStore>>,
    gate: Arc<dyn ApprovalGate>,
    /// One mutex per account public key. Entries are created lazily on
    /// first use and live for the service's lifetime.
    account_locks: Mutex<HashMap<AccountPublicKey, Arc<Mutex<()>>>>,
}

impl SigningService {
    /// Creates a service over a shared keyring store and approval gate.
    pub fn new(store: Arc<RwLock<KeyringStore>>, gate: Arc<dyn ApprovalGate>) -> Self {
        Self {
            store,
            gate,
            account_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Shared handle to the underlying keyring store.
    pub fn store(&self) -> Arc<RwLock<KeyringStore>> {
        Arc::clone(&self.store)
    }

    /// Signs a request end to end.
    ///
    /// Acquires the account's serialization guard for the duration of
    /// the call, then delegates to [`sign_locked`](Self::sign_locked).
    pub async fn sign(&self, request: &SigningRequest) -> Result<SigningOutcome> {
        let guard = self.lock_account(&request.public_key).await;
        self.sign_locked(&guard, request).await
    }

    /// Acquires the serialization guard for `public_key`.
    ///
    /// Callers orchestrating a multi-step flow (prepare → sign →
    /// broadcast) take the guard once up front and pass it to
    /// [`sign_locked`](Self::sign_locked), so the whole flow for one
    /// account runs to completion before the next request for that
    /// account starts. Requests for other accounts are unaffected.
    pub async fn lock_account(&self, public_key: &AccountPublicKey) -> AccountGuard {
        let lock = {
            let mut locks = self.account_locks.lock().await;
            locks
                .entry(public_key.clone())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        AccountGuard {
            public_key: public_key.clone(),
            _guard: lock.lock_owned().await,
        }
    }

    /// Signs a request while the caller already holds the account's
    /// guard.
    ///
    /// # Flow
    ///
    /// 1. Approval gate — a decline resolves as
    ///    [`SigningOutcome::Declined`] without touching the keyring.
    /// 2. Payload validation — batch items are checked up front so a
    ///    bad batch produces zero signatures.
    /// 3. Keyring resolution by the request's chain family, account
    ///    lookup by public key, then the curve-appropriate signature.
    pub async fn sign_locked(
        &self,
        guard: &AccountGuard,
        request: &SigningRequest,
    ) -> Result<SigningOutcome> {
        if guard.public_key() != &request.public_key {
            return Err(WalletError::ConfigError {
                reason: "account guard does not match the request's account".into(),
            });
        }

        if self.gate.review(request).await == ApprovalDecision::Declined {
            tracing::info!(
                correlation_id = %request.correlation_id,
                origin = %request.origin.address,
                "signing request declined"
            );
            return Ok(SigningOutcome::Declined);
        }

        validate_payload(&request.payload)?;

        let store = self.store.read().await;
        let keyring = store.keyring_for(request.chain_family)?;
        let account = keyring.find_account(&request.public_key)?;

        let signed = match &request.payload {
            SigningPayload::Transaction(bytes) => SignedPayload::Single(account.sign(bytes)),
            SigningPayload::Message(bytes) => SignedPayload::Single(account.sign(bytes)),
            SigningPayload::BatchTransaction(items) => {
                SignedPayload::Batch(items.iter().map(|item| account.sign(item)).collect())
            }
        };

        tracing::debug!(
            correlation_id = %request.correlation_id,
            family = %request.chain_family,
            "request signed"
        );
        Ok(SigningOutcome::Signed(signed))
    }
}

// ---------------------------------------------------------------------------
// Payload validation
// ---------------------------------------------------------------------------

/// Rejects unusable payloads before any signature is produced.
///
/// For batches this is the all-or-nothing contract: one aggregated
/// error naming every bad item, zero signatures returned.
fn validate_payload(payload: &SigningPayload) -> Result<()> {
    match payload {
        SigningPayload::Transaction(bytes) | SigningPayload::Message(bytes) => {
            if bytes.is_empty() {
                return Err(WalletError::TransportError {
                    reason: "signing payload is empty".into(),
                });
            }
            Ok(())
        }
        SigningPayload::BatchTransaction(items) => {
            if items.is_empty() {
                return Err(WalletError::TransportError {
                    reason: "batch signing request contains no items".into(),
                });
            }
            let empty: Vec<usize> = items
                .iter()
                .enumerate()
                .filter(|(_, item)| item.is_empty())
                .map(|(i, _)| i)
                .collect();
            if !empty.is_empty() {
                return Err(WalletError::TransportError {
                    reason: format!("batch items {empty:?} are empty; no items were signed"),
                });
            }
            Ok(())
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use palisade_crypto::cipher::KdfParams;
    use palisade_types::{ChainFamily, OriginDescriptor, SigningRequest};
    use uuid::Uuid;

    const MNEMONIC: &str = "abandon abandon abandon abandon abandon abandon \
                            abandon abandon abandon abandon abandon about";
    const PASSWORD: &str = "test password";

    struct DeclineAll;

    #[async_trait]
    impl ApprovalGate for DeclineAll {
        async fn review(&self, _request: &SigningRequest) -> ApprovalDecision {
            ApprovalDecision::Declined
        }
    }

    fn unlocked_store(families: &[ChainFamily]) -> Arc<RwLock<KeyringStore>> {
        let mut store = KeyringStore::create_with_params(
            MNEMONIC,
            PASSWORD,
            &KdfParams { iterations: 16 },
        )
        .expect("store creation succeeds");
        store
            .unlock_families(PASSWORD, families)
            .expect("unlock succeeds");
        Arc::new(RwLock::new(store))
    }

    async fn default_key(
        store: &Arc<RwLock<KeyringStore>>,
        family: ChainFamily,
    ) -> AccountPublicKey {
        store
            .read()
            .await
            .keyring_for(family)
            .expect("keyring exists")
            .accounts()[0]
            .public_key()
            .clone()
    }

    fn request(
        family: ChainFamily,
        public_key: AccountPublicKey,
        payload: SigningPayload,
    ) -> SigningRequest {
        SigningRequest {
            correlation_id: Uuid::new_v4(),
            chain_family: family,
            public_key,
            payload,
            origin: OriginDescriptor {
                name: "test".into(),
                address: "https://dapp.example".into(),
            },
        }
    }

    #[tokio::test]
    async fn signs_transaction_for_requested_family() -> Result<()> {
        let store = unlocked_store(&ChainFamily::ALL);
        let service = SigningService::new(Arc::clone(&store), Arc::new(crate::approval::AutoApprove));

        for family in ChainFamily::ALL {
            let key = default_key(&store, family).await;
            let req = request(family, key.clone(), SigningPayload::Transaction(b"tx".to_vec()));
            match service.sign(&req).await? {
                SigningOutcome::Signed(SignedPayload::Single(sig)) => {
                    palisade_crypto::sign::verify(family, &key, b"tx", &sig)?;
                }
                other => panic!("expected single signature, got {other:?}"),
            }
        }
        Ok(())
    }

    #[tokio::test]
    async fn never_remaps_to_another_family() -> Result<()> {
        // Only ed25519 is unlocked; a secp256k1 request must fail with
        // NoKeyringForChain, not be served by the ed25519 keyring.
        let store = unlocked_store(&[ChainFamily::Ed25519]);
        let service = SigningService::new(Arc::clone(&store), Arc::new(crate::approval::AutoApprove));

        let ed_key = default_key(&store, ChainFamily::Ed25519).await;
        let req = request(
            ChainFamily::Secp256k1,
            ed_key,
            SigningPayload::Transaction(b"tx".to_vec()),
        );

        match service.sign(&req).await {
            Err(WalletError::NoKeyringForChain { family }) => {
                assert_eq!(family, ChainFamily::Secp256k1);
            }
            Err(other) => panic!("expected NoKeyringForChain, got {other}"),
            Ok(_) => panic!("request must not be served by another family's keyring"),
        }
        Ok(())
    }

    #[tokio::test]
    async fn unknown_account_fails_no_such_account() -> Result<()> {
        let store = unlocked_store(&ChainFamily::ALL);
        let service = SigningService::new(store, Arc::new(crate::approval::AutoApprove));

        let ghost = AccountPublicKey::new(vec![0xEE; 32]);
        let req = request(
            ChainFamily::Ed25519,
            ghost,
            SigningPayload::Transaction(b"tx".to_vec()),
        );

        assert!(matches!(
            service.sign(&req).await,
            Err(WalletError::NoSuchAccount { .. })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn locked_store_fails_locked() -> Result<()> {
        let store = unlocked_store(&ChainFamily::ALL);
        let key = default_key(&store, ChainFamily::Ed25519).await;
        store.write().await.lock();

        let service = SigningService::new(store, Arc::new(crate::approval::AutoApprove));
        let req = request(
            ChainFamily::Ed25519,
            key,
            SigningPayload::Transaction(b"tx".to_vec()),
        );

        assert!(matches!(service.sign(&req).await, Err(WalletError::Locked)));
        Ok(())
    }

    #[tokio::test]
    async fn declined_is_not_an_error() -> Result<()> {
        let store = unlocked_store(&ChainFamily::ALL);
        let key = default_key(&store, ChainFamily::Ed25519).await;
        let service = SigningService::new(store, Arc::new(DeclineAll));

        let req = request(
            ChainFamily::Ed25519,
            key,
            SigningPayload::Transaction(b"tx".to_vec()),
        );

        assert_eq!(service.sign(&req).await?, SigningOutcome::Declined);
        Ok(())
    }

    #[tokio::test]
    async fn batch_signs_every_item_in_order() -> Result<()> {
        let store = unlocked_store(&ChainFamily::ALL);
        let key = default_key(&store, ChainFamily::Ed25519).await;
        let service = SigningService::new(store, Arc::new(crate::approval::AutoApprove));

        let items: Vec<Vec<u8>> = vec![b"tx-0".to_vec(), b"tx-1".to_vec(), b"tx-2".to_vec()];
        let req = request(
            ChainFamily::Ed25519,
            key.clone(),
            SigningPayload::BatchTransaction(items.clone()),
        );

        match service.sign(&req).await? {
            SigningOutcome::Signed(SignedPayload::Batch(sigs)) => {
                assert_eq!(sigs.len(), items.len());
                for (item, sig) in items.iter().zip(&sigs) {
                    palisade_crypto::sign::verify(ChainFamily::Ed25519, &key, item, sig)?;
                }
            }
            other => panic!("expected batch signatures, got {other:?}"),
        }
        Ok(())
    }

    #[tokio::test]
    async fn batch_with_bad_item_is_all_or_nothing() -> Result<()> {
        let store = unlocked_store(&ChainFamily::ALL);
        let key = default_key(&store, ChainFamily::Ed25519).await;
        let service = SigningService::new(store, Arc::new(crate::approval::AutoApprove));

        let items = vec![b"tx-0".to_vec(), Vec::new(), b"tx-2".to_vec()];
        let req = request(
            ChainFamily::Ed25519,
            key,
            SigningPayload::BatchTransaction(items),
        );

        // One aggregated failure; no partial results.
        match service.sign(&req).await {
            Err(WalletError::TransportError { reason }) => {
                assert!(reason.contains("[1]"), "failure names the bad item: {reason}");
            }
            Err(other) => panic!("expected aggregated batch failure, got {other}"),
            Ok(_) => panic!("batch with an empty item must not sign"),
        }
        Ok(())
    }

    #[tokio::test]
    async fn guard_for_wrong_account_is_rejected() -> Result<()> {
        let store = unlocked_store(&ChainFamily::ALL);
        let ed_key = default_key(&store, ChainFamily::Ed25519).await;
        let k_key = default_key(&store, ChainFamily::Secp256k1).await;
        let service = SigningService::new(store, Arc::new(crate::approval::AutoApprove));

        let guard = service.lock_account(&k_key).await;
        let req = request(
            ChainFamily::Ed25519,
            ed_key,
            SigningPayload::Transaction(b"tx".to_vec()),
        );

        assert!(matches!(
            service.sign_locked(&guard, &req).await,
            Err(WalletError::ConfigError { .. })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn different_accounts_sign_in_parallel() -> Result<()> {
        let store = unlocked_store(&ChainFamily::ALL);
        let ed_key = default_key(&store, ChainFamily::Ed25519).await;
        let k_key = default_key(&store, ChainFamily::Secp256k1).await;
        let service = Arc::new(SigningService::new(store, Arc::new(crate::approval::AutoApprove)));

        let a = {
            let service = Arc::clone(&service);
            let req = request(
                ChainFamily::Ed25519,
                ed_key,
                SigningPayload::Transaction(b"transfer-a".to_vec()),
            );
            tokio::spawn(async move { service.sign(&req).await })
        };
        let b = {
            let service = Arc::clone(&service);
            let req = request(
                ChainFamily::Secp256k1,
                k_key,
                SigningPayload::Transaction(b"transfer-b".to_vec()),
            );
            tokio::spawn(async move { service.sign(&req).await })
        };

        let (ra, rb) = tokio::join!(a, b);
        assert!(matches!(
            ra.expect("task completes")?,
            SigningOutcome::Signed(_)
        ));
        assert!(matches!(
            rb.expect("task completes")?,
            SigningOutcome::Signed(_)
        ));
        Ok(())
    }
}

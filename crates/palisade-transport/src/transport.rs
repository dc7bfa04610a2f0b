//! Correlated request/response handling across the trust boundary.
//!
//! Each inbound wire request is validated, assigned a fresh
//! correlation id, and dispatched to the signing service on its own
//! task. The response travels back through a oneshot registered in the
//! pending map, which guarantees at-most-once delivery; a request that
//! sees no response within the timeout window is resolved as `Timeout`
//! and its correlation entry removed, so the map cannot leak.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use palisade_signer::service::SigningService;
use palisade_types::{Result, SigningOutcome, WalletError};
use tokio::sync::{oneshot, Mutex};
use uuid::Uuid;

use crate::events::EventBus;
use crate::message::{self, WireRequest, WireResponse};
use crate::origin::OriginPolicy;

// ---------------------------------------------------------------------------
// SecureTransport
// ---------------------------------------------------------------------------

/// Pending correlation map shared with in-flight signing tasks.
type PendingMap = Arc<Mutex<HashMap<Uuid, oneshot::Sender<Result<SigningOutcome>>>>>;

/// The wallet side of the trust boundary.
///
/// Owns the origin policy, the pending correlation map, and the event
/// bus. Constructed once at startup and torn down explicitly — no
/// process-global state.
pub struct SecureTransport {
    origin_policy: OriginPolicy,
    request_timeout: Duration,
    pending: PendingMap,
    events: EventBus,
}

impl SecureTransport {
    /// Creates a transport with the given admission policy and
    /// per-request timeout.
    pub fn new(origin_policy: OriginPolicy, request_timeout: Duration, events: EventBus) -> Self {
        Self {
            origin_policy,
            request_timeout,
            pending: Arc::new(Mutex::new(HashMap::new())),
            events,
        }
    }

    /// The wallet event bus.
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Handles one wire request end to end and produces the response
    /// to send back.
    ///
    /// # Flow
    ///
    /// 1. Decode; malformed requests are answered immediately.
    /// 2. Origin validation; rejected origins never reach the signer.
    /// 3. Register a fresh correlation id in the pending map.
    /// 4. Dispatch signing on its own task; its result resolves the
    ///    correlation entry (at most once).
    /// 5. Await the oneshot with the configured timeout. On timeout
    ///    the entry is removed and the caller gets `timeout` — a late
    ///    signer result finds no entry and is dropped.
    pub async fn handle(&self, wire: WireRequest, signer: Arc<SigningService>) -> WireResponse {
        let wire_id = wire.id.clone();

        let request = match message::decode_request(&wire) {
            Ok(request) => request,
            Err(e) => return message::encode_response(&wire_id, &Err(e)),
        };

        if let Err(e) = self.origin_policy.validate(&request.origin) {
            tracing::warn!(
                id = %wire_id,
                origin = %request.origin.address,
                "rejected request from disallowed origin"
            );
            return message::encode_response(&wire_id, &Err(e));
        }

        let correlation_id = request.correlation_id;
        let (tx, rx) = oneshot::channel();
        self.pending.lock().await.insert(correlation_id, tx);

        {
            let pending = Arc::clone(&self.pending);
            tokio::spawn(async move {
                let outcome = signer.sign(&request).await;
                // Resolve at most once; a timed-out request already
                // removed its entry, so a late result is dropped here.
                if let Some(tx) = pending.lock().await.remove(&correlation_id) {
                    let _ = tx.send(outcome);
                } else {
                    tracing::debug!(%correlation_id, "dropping response for expired correlation id");
                }
            });
        }

        match tokio::time::timeout(self.request_timeout, rx).await {
            Ok(Ok(outcome)) => message::encode_response(&wire_id, &outcome),
            Ok(Err(_closed)) => {
                // Sender dropped without resolving (e.g. shutdown).
                message::encode_response(&wire_id, &Err(WalletError::Timeout))
            }
            Err(_elapsed) => {
                self.pending.lock().await.remove(&correlation_id);
                tracing::warn!(id = %wire_id, %correlation_id, "signing request timed out");
                message::encode_response(&wire_id, &Err(WalletError::Timeout))
            }
        }
    }

    /// Number of requests currently awaiting a response.
    pub async fn pending_len(&self) -> usize {
        self.pending.lock().await.len()
    }

    /// Tears the transport down: every pending request resolves as
    /// `Timeout` on the caller side and the map is emptied.
    pub async fn shutdown(&self) {
        let drained = {
            let mut pending = self.pending.lock().await;
            pending.drain().count()
        };
        if drained > 0 {
            tracing::info!(drained, "transport shut down with requests still pending");
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! Prepare, simulate, broadcast, and confirm transactions.
//!
//! Retry semantics:
//!
//! - `send` retries transient broadcast failures with bounded
//!   exponential backoff, then surfaces `SendFailed`. The bound is
//!   fixed at construction; there is no unbounded retry anywhere.
//! - `confirm` polls the node until the requested commitment level is
//!   observed or the deadline passes (`ConfirmationTimeout`).
//! - `simulate` failures are reported as `SimulationFailed` and are
//!   never fatal to the surrounding flow.

use std::sync::Arc;
use std::time::Duration;

use palisade_types::config::CoreConfig;
use palisade_types::{AccountPublicKey, Commitment, Result, WalletError};

use crate::cache::{BlockhashCache, CacheStatus};
use crate::rpc::{RpcNode, SimulationResult, TransactionEnvelope};

// ---------------------------------------------------------------------------
// PipelineConfig
// ---------------------------------------------------------------------------

/// Retry and timing parameters for the pipeline.
#[derive(Clone, Debug)]
pub struct PipelineConfig {
    /// Maximum broadcast attempts before surfacing `SendFailed`.
    pub max_send_attempts: u32,
    /// Base backoff delay; doubles per failed attempt.
    pub backoff_base: Duration,
    /// Total budget for confirmation polling.
    pub confirm_timeout: Duration,
    /// Delay between confirmation polls.
    pub confirm_poll_interval: Duration,
    /// How long a cached blockhash stays fresh.
    pub blockhash_ttl: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_send_attempts: 5,
            backoff_base: Duration::from_millis(200),
            confirm_timeout: Duration::from_secs(60),
            confirm_poll_interval: Duration::from_millis(500),
            blockhash_ttl: Duration::from_secs(30),
        }
    }
}

impl PipelineConfig {
    /// Derives pipeline parameters from the core configuration.
    pub fn from_core(config: &CoreConfig) -> Self {
        Self {
            max_send_attempts: config.send_max_attempts,
            backoff_base: Duration::from_millis(config.send_backoff_base_ms),
            confirm_timeout: Duration::from_secs(config.confirm_timeout_secs),
            confirm_poll_interval: Duration::from_millis(config.confirm_poll_interval_ms),
            blockhash_ttl: Duration::from_secs(config.blockhash_ttl_secs),
        }
    }
}

// ---------------------------------------------------------------------------
// TransactionPipeline
// ---------------------------------------------------------------------------

/// Carries transactions from preparation to confirmation against one
/// RPC node.
pub struct TransactionPipeline<N: RpcNode> {
    node: Arc<N>,
    config: PipelineConfig,
    blockhash_cache: BlockhashCache,
}

impl<N: RpcNode> TransactionPipeline<N> {
    /// Creates a pipeline over `node` with the given parameters.
    pub fn new(node: Arc<N>, config: PipelineConfig) -> Self {
        let blockhash_cache = BlockhashCache::new(config.blockhash_ttl);
        Self {
            node,
            config,
            blockhash_cache,
        }
    }

    // -- Prepare ----------------------------------------------------------

    /// Fills `recent_blockhash` and `fee_payer` when absent.
    ///
    /// Caller-supplied values are never overwritten: a caller that
    /// pinned a durable nonce or a custom fee payer keeps it.
    pub async fn prepare(
        &self,
        envelope: &mut TransactionEnvelope,
        default_fee_payer: &AccountPublicKey,
    ) -> Result<()> {
        if envelope.recent_blockhash.is_none() {
            envelope.recent_blockhash = Some(self.recent_blockhash().await?);
        }
        if envelope.fee_payer.is_none() {
            envelope.fee_payer = Some(default_fee_payer.clone());
        }
        Ok(())
    }

    /// Returns a fresh recent blockhash, consulting the cache first.
    pub async fn recent_blockhash(&self) -> Result<String> {
        if let CacheStatus::Fresh(hash) = self.blockhash_cache.get() {
            return Ok(hash);
        }

        let hash = self.node.latest_blockhash().await?;
        self.blockhash_cache.store(hash.clone());
        Ok(hash)
    }

    // -- Simulate ---------------------------------------------------------

    /// Dry-runs the transaction for fee/compute estimation.
    ///
    /// An RPC failure maps to [`WalletError::SimulationFailed`];
    /// callers report it and continue — a failed simulation never
    /// blocks the rest of their flow.
    pub async fn simulate(&self, envelope: &TransactionEnvelope) -> Result<SimulationResult> {
        self.node
            .simulate_transaction(envelope)
            .await
            .map_err(|e| WalletError::SimulationFailed {
                reason: e.to_string(),
            })
    }

    // -- Send -------------------------------------------------------------

    /// Broadcasts the envelope, retrying transient failures.
    ///
    /// Backoff is exponential from `backoff_base`, capped at
    /// `max_send_attempts` attempts, after which the last failure is
    /// surfaced as [`WalletError::SendFailed`].
    pub async fn send(&self, envelope: &TransactionEnvelope) -> Result<String> {
        let attempts = self.config.max_send_attempts;
        let mut last_reason = String::new();

        for attempt in 1..=attempts {
            match self.node.send_raw_transaction(&envelope.raw_bytes).await {
                Ok(signature_id) => {
                    tracing::debug!(%signature_id, attempt, "transaction broadcast");
                    return Ok(signature_id);
                }
                Err(e) => {
                    last_reason = e.to_string();
                    tracing::warn!(attempt, max = attempts, error = %last_reason, "broadcast failed");
                    if attempt < attempts {
                        let backoff = self.config.backoff_base * 2u32.pow(attempt - 1);
                        tokio::time::sleep(backoff).await;
                    }
                }
            }
        }

        Err(WalletError::SendFailed {
            attempts,
            reason: last_reason,
        })
    }

    // -- Confirm ----------------------------------------------------------

    /// Polls until `signature_id` reaches `target` commitment or the
    /// configured deadline passes.
    ///
    /// Node errors during polling are treated as missed polls, not
    /// terminal failures — the deadline is the only exit for an
    /// unresponsive node.
    pub async fn confirm(&self, signature_id: &str, target: Commitment) -> Result<Commitment> {
        let deadline = tokio::time::Instant::now() + self.config.confirm_timeout;

        loop {
            match self.node.confirmation_status(signature_id).await {
                Ok(Some(observed)) if observed >= target => {
                    tracing::debug!(%signature_id, %observed, "transaction confirmed");
                    return Ok(observed);
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::debug!(%signature_id, error = %e, "confirmation poll failed");
                }
            }

            if tokio::time::Instant::now() + self.config.confirm_poll_interval > deadline {
                return Err(WalletError::ConfirmationTimeout {
                    signature_id: signature_id.to_string(),
                });
            }
            tokio::time::sleep(self.config.confirm_poll_interval).await;
        }
    }
}

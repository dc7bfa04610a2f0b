//! External collaborator contract: the chain RPC node.
//!
//! The core calls a node only through [`RpcNode`] and assumes nothing
//! about the implementation beyond this contract. Transport
//! reliability below this boundary is out of scope.

use async_trait::async_trait;
use palisade_types::{AccountPublicKey, Commitment, Result};

// ---------------------------------------------------------------------------
// TransactionEnvelope
// ---------------------------------------------------------------------------

/// A transaction being carried through the pipeline.
///
/// `recent_blockhash` and `fee_payer` start as `None` when the caller
/// leaves them to the pipeline; [`prepare`](crate::pipeline::TransactionPipeline::prepare)
/// fills absent fields and never overwrites present ones.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TransactionEnvelope {
    /// Serialized transaction bytes as the chain expects them.
    pub raw_bytes: Vec<u8>,
    /// Recent blockhash (or durable nonce) anchoring the transaction.
    pub recent_blockhash: Option<String>,
    /// Account paying the transaction fee.
    pub fee_payer: Option<AccountPublicKey>,
    /// Signatures attached so far, in signer order.
    pub signatures: Vec<Vec<u8>>,
}

impl TransactionEnvelope {
    /// Creates an envelope around raw transaction bytes with no
    /// blockhash, fee payer, or signatures attached yet.
    pub fn new(raw_bytes: Vec<u8>) -> Self {
        Self {
            raw_bytes,
            recent_blockhash: None,
            fee_payer: None,
            signatures: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// SimulationResult
// ---------------------------------------------------------------------------

/// Outcome of a dry-run against the network.
///
/// Used for fee and compute estimation before broadcast. A result
/// with `error` set is still a *successful* simulation call — the
/// caller decides what to do with the verdict.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SimulationResult {
    /// Whether the transaction would have executed successfully.
    pub success: bool,
    /// Program log lines emitted during the dry run.
    pub logs: Vec<String>,
    /// Compute units the dry run consumed, when reported.
    pub units_consumed: Option<u64>,
    /// Execution error, when the dry run failed.
    pub error: Option<String>,
}

// ---------------------------------------------------------------------------
// RpcNode
// ---------------------------------------------------------------------------

/// Contract the pipeline requires from a chain RPC endpoint.
#[async_trait]
pub trait RpcNode: Send + Sync {
    /// Returns the latest blockhash (or nonce) usable as a
    /// transaction anchor.
    async fn latest_blockhash(&self) -> Result<String>;

    /// Dry-runs the transaction without broadcasting it.
    async fn simulate_transaction(&self, envelope: &TransactionEnvelope)
        -> Result<SimulationResult>;

    /// Broadcasts raw transaction bytes, returning the network
    /// signature id.
    async fn send_raw_transaction(&self, raw_bytes: &[u8]) -> Result<String>;

    /// Reports the highest commitment level observed for a broadcast
    /// transaction, or `None` if the network has not seen it yet.
    async fn confirmation_status(&self, signature_id: &str) -> Result<Option<Commitment>>;
}

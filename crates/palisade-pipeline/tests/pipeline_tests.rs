//! Integration tests for the transaction pipeline.
//!
//! All tests run against a scripted in-process [`RpcNode`] and the
//! paused tokio clock, so backoff and timeout behavior is asserted
//! without wall-clock delays.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Mutex;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use palisade_pipeline::pipeline::{PipelineConfig, TransactionPipeline};
use palisade_pipeline::rpc::{RpcNode, SimulationResult, TransactionEnvelope};
use palisade_types::{AccountPublicKey, Commitment, Result, WalletError};

// ---------------------------------------------------------------------------
// Scripted RPC node
// ---------------------------------------------------------------------------

/// In-process node with scriptable failure behavior.
struct MockNode {
    /// Monotone counter backing `latest_blockhash`.
    blockhash_counter: AtomicU64,
    /// Number of initial `send_raw_transaction` calls that fail.
    send_failures: AtomicU32,
    /// Every successfully broadcast payload, in order.
    sent: Mutex<Vec<Vec<u8>>>,
    /// Number of status polls that report nothing before the
    /// commitment ladder starts.
    polls_before_visible: AtomicU32,
    /// Commitment level reported once visible.
    visible_level: Mutex<Commitment>,
    /// Scripted simulation outcome; `None` makes the RPC call fail.
    simulation: Mutex<Option<SimulationResult>>,
}

impl MockNode {
    fn new() -> Self {
        Self {
            blockhash_counter: AtomicU64::new(0),
            send_failures: AtomicU32::new(0),
            sent: Mutex::new(Vec::new()),
            polls_before_visible: AtomicU32::new(0),
            visible_level: Mutex::new(Commitment::Finalized),
            simulation: Mutex::new(Some(SimulationResult {
                success: true,
                logs: Vec::new(),
                units_consumed: Some(150),
                error: None,
            })),
        }
    }

    fn fail_next_sends(&self, n: u32) {
        self.send_failures.store(n, Ordering::SeqCst);
    }

    fn sent_count(&self) -> usize {
        self.sent.lock().expect("mutex").len()
    }
}

#[async_trait]
impl RpcNode for MockNode {
    async fn latest_blockhash(&self) -> Result<String> {
        let n = self.blockhash_counter.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!("blockhash-{n}"))
    }

    async fn simulate_transaction(
        &self,
        _envelope: &TransactionEnvelope,
    ) -> Result<SimulationResult> {
        match self.simulation.lock().expect("mutex").clone() {
            Some(result) => Ok(result),
            None => Err(WalletError::TransportError {
                reason: "simulation endpoint unavailable".into(),
            }),
        }
    }

    async fn send_raw_transaction(&self, raw_bytes: &[u8]) -> Result<String> {
        let remaining = self.send_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.send_failures.store(remaining - 1, Ordering::SeqCst);
            return Err(WalletError::TransportError {
                reason: "connection reset by peer".into(),
            });
        }
        let mut sent = self.sent.lock().expect("mutex");
        sent.push(raw_bytes.to_vec());
        Ok(format!("sig-{}", sent.len()))
    }

    async fn confirmation_status(&self, _signature_id: &str) -> Result<Option<Commitment>> {
        let remaining = self.polls_before_visible.load(Ordering::SeqCst);
        if remaining > 0 {
            self.polls_before_visible.store(remaining - 1, Ordering::SeqCst);
            return Ok(None);
        }
        Ok(Some(*self.visible_level.lock().expect("mutex")))
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn fast_config() -> PipelineConfig {
    PipelineConfig {
        max_send_attempts: 5,
        backoff_base: Duration::from_millis(10),
        confirm_timeout: Duration::from_secs(5),
        confirm_poll_interval: Duration::from_millis(50),
        blockhash_ttl: Duration::from_secs(30),
    }
}

fn pipeline_over(node: Arc<MockNode>) -> TransactionPipeline<MockNode> {
    TransactionPipeline::new(node, fast_config())
}

fn fee_payer() -> AccountPublicKey {
    AccountPublicKey::new(vec![0xAB; 32])
}

// ---------------------------------------------------------------------------
// Prepare
// ---------------------------------------------------------------------------

#[tokio::test]
async fn prepare_fills_absent_fields() -> Result<()> {
    let node = Arc::new(MockNode::new());
    let pipeline = pipeline_over(Arc::clone(&node));

    let mut envelope = TransactionEnvelope::new(b"raw tx".to_vec());
    pipeline.prepare(&mut envelope, &fee_payer()).await?;

    assert_eq!(envelope.recent_blockhash.as_deref(), Some("blockhash-1"));
    assert_eq!(envelope.fee_payer.as_ref(), Some(&fee_payer()));
    Ok(())
}

#[tokio::test]
async fn prepare_never_overwrites_caller_values() -> Result<()> {
    let node = Arc::new(MockNode::new());
    let pipeline = pipeline_over(Arc::clone(&node));

    let pinned_payer = AccountPublicKey::new(vec![0xCD; 32]);
    let mut envelope = TransactionEnvelope::new(b"raw tx".to_vec());
    envelope.recent_blockhash = Some("pinned-nonce".into());
    envelope.fee_payer = Some(pinned_payer.clone());

    pipeline.prepare(&mut envelope, &fee_payer()).await?;

    assert_eq!(envelope.recent_blockhash.as_deref(), Some("pinned-nonce"));
    assert_eq!(envelope.fee_payer.as_ref(), Some(&pinned_payer));
    // The node was never even asked.
    assert_eq!(node.blockhash_counter.load(Ordering::SeqCst), 0);
    Ok(())
}

#[tokio::test]
async fn prepare_reuses_fresh_cached_blockhash() -> Result<()> {
    let node = Arc::new(MockNode::new());
    let pipeline = pipeline_over(Arc::clone(&node));

    let mut first = TransactionEnvelope::new(b"tx-1".to_vec());
    let mut second = TransactionEnvelope::new(b"tx-2".to_vec());
    pipeline.prepare(&mut first, &fee_payer()).await?;
    pipeline.prepare(&mut second, &fee_payer()).await?;

    assert_eq!(first.recent_blockhash, second.recent_blockhash);
    assert_eq!(node.blockhash_counter.load(Ordering::SeqCst), 1);
    Ok(())
}

// ---------------------------------------------------------------------------
// Simulate
// ---------------------------------------------------------------------------

#[tokio::test]
async fn simulate_passes_through_node_verdict() -> Result<()> {
    let node = Arc::new(MockNode::new());
    *node.simulation.lock().expect("mutex") = Some(SimulationResult {
        success: false,
        logs: vec!["program log: insufficient funds".into()],
        units_consumed: None,
        error: Some("InstructionError".into()),
    });
    let pipeline = pipeline_over(Arc::clone(&node));

    // A failed *execution* is still a successful simulation call.
    let result = pipeline
        .simulate(&TransactionEnvelope::new(b"tx".to_vec()))
        .await?;
    assert!(!result.success);
    assert_eq!(result.error.as_deref(), Some("InstructionError"));
    Ok(())
}

#[tokio::test]
async fn simulate_rpc_failure_maps_to_simulation_failed() {
    let node = Arc::new(MockNode::new());
    *node.simulation.lock().expect("mutex") = None;
    let pipeline = pipeline_over(Arc::clone(&node));

    let result = pipeline
        .simulate(&TransactionEnvelope::new(b"tx".to_vec()))
        .await;
    assert!(matches!(result, Err(WalletError::SimulationFailed { .. })));
}

// ---------------------------------------------------------------------------
// Send
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn send_retries_transient_failures() -> Result<()> {
    let node = Arc::new(MockNode::new());
    node.fail_next_sends(2);
    let pipeline = pipeline_over(Arc::clone(&node));

    let signature_id = pipeline
        .send(&TransactionEnvelope::new(b"tx".to_vec()))
        .await?;

    assert_eq!(signature_id, "sig-1");
    assert_eq!(node.sent_count(), 1);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn send_surfaces_send_failed_after_attempt_ceiling() {
    let node = Arc::new(MockNode::new());
    node.fail_next_sends(u32::MAX);
    let pipeline = pipeline_over(Arc::clone(&node));

    let result = pipeline.send(&TransactionEnvelope::new(b"tx".to_vec())).await;

    match result {
        Err(WalletError::SendFailed { attempts, .. }) => assert_eq!(attempts, 5),
        other => panic!("expected SendFailed, got {other:?}"),
    }
    assert_eq!(node.sent_count(), 0);
}

// ---------------------------------------------------------------------------
// Confirm
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn confirm_waits_for_target_commitment() -> Result<()> {
    let node = Arc::new(MockNode::new());
    node.polls_before_visible.store(3, Ordering::SeqCst);
    *node.visible_level.lock().expect("mutex") = Commitment::Confirmed;
    let pipeline = pipeline_over(Arc::clone(&node));

    let observed = pipeline.confirm("sig-1", Commitment::Confirmed).await?;
    assert_eq!(observed, Commitment::Confirmed);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn confirm_accepts_stronger_commitment_than_target() -> Result<()> {
    let node = Arc::new(MockNode::new());
    *node.visible_level.lock().expect("mutex") = Commitment::Finalized;
    let pipeline = pipeline_over(Arc::clone(&node));

    let observed = pipeline.confirm("sig-1", Commitment::Confirmed).await?;
    assert_eq!(observed, Commitment::Finalized);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn confirm_does_not_settle_for_weaker_commitment() {
    // Node only ever reaches Processed; target is Finalized.
    let node = Arc::new(MockNode::new());
    *node.visible_level.lock().expect("mutex") = Commitment::Processed;
    let pipeline = pipeline_over(Arc::clone(&node));

    let result = pipeline.confirm("sig-1", Commitment::Finalized).await;
    assert!(matches!(
        result,
        Err(WalletError::ConfirmationTimeout { .. })
    ));
}

#[tokio::test(start_paused = true)]
async fn confirm_times_out_when_never_visible() {
    let node = Arc::new(MockNode::new());
    node.polls_before_visible.store(u32::MAX, Ordering::SeqCst);
    let pipeline = pipeline_over(Arc::clone(&node));

    let result = pipeline.confirm("sig-ghost", Commitment::Confirmed).await;
    match result {
        Err(WalletError::ConfirmationTimeout { signature_id }) => {
            assert_eq!(signature_id, "sig-ghost");
        }
        other => panic!("expected ConfirmationTimeout, got {other:?}"),
    }
}

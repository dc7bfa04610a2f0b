//! Approval gate: the seam where a human confirms or declines.
//!
//! The signing service consults the gate before touching any key
//! material. A declined request resolves as
//! [`SigningOutcome::Declined`](palisade_types::SigningOutcome) —
//! deliberately not an error, so callers can render "rejected"
//! distinctly from "failed". Declines are never retried.

use async_trait::async_trait;
use palisade_types::SigningRequest;

// ---------------------------------------------------------------------------
// ApprovalDecision
// ---------------------------------------------------------------------------

/// Verdict returned by an [`ApprovalGate`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ApprovalDecision {
    /// Proceed with signing.
    Approved,
    /// The user (or policy) rejected the request.
    Declined,
}

// ---------------------------------------------------------------------------
// ApprovalGate
// ---------------------------------------------------------------------------

/// Reviews a signing request before any key material is used.
///
/// Implementations range from an interactive confirmation prompt to a
/// policy engine. The gate sees the request metadata (origin, family,
/// account, payload kind) but never any key material.
#[async_trait]
pub trait ApprovalGate: Send + Sync {
    /// Reviews `request` and decides whether signing may proceed.
    async fn review(&self, request: &SigningRequest) -> ApprovalDecision;
}

// ---------------------------------------------------------------------------
// AutoApprove
// ---------------------------------------------------------------------------

/// Gate that approves every request.
///
/// For headless deployments where the transport's origin allow-list is
/// the sole admission control. Interactive surfaces supply their own
/// gate instead.
#[derive(Clone, Copy, Debug, Default)]
pub struct AutoApprove;

#[async_trait]
impl ApprovalGate for AutoApprove {
    async fn review(&self, _request: &SigningRequest) -> ApprovalDecision {
        ApprovalDecision::Approved
    }
}

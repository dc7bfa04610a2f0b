//! JSON wire codec for the security boundary.
//!
//! # Wire shapes
//!
//! Request:
//!
//! ```json
//! {
//!   "id": "req-1",
//!   "chainFamily": "ed25519",
//!   "kind": "sign_tx",
//!   "publicKey": "<base58>",
//!   "payload": "<base64>",
//!   "origin": { "name": "Example dApp", "address": "https://dapp.example" }
//! }
//! ```
//!
//! `payload` is a base64 string, or an array of base64 strings for
//! `sign_all`. Response: `{ "id": ..., "result": ... }` on success,
//! `{ "id": ..., "error": "<kind>" }` otherwise, matched by `id`.
//!
//! `chainFamily` may be omitted by legacy callers only; in that case
//! the request resolves to [`ChainFamily::LEGACY_WIRE_DEFAULT`] and a
//! warning is logged. A *present but unknown* family is an error —
//! it is never coerced to another family.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use palisade_types::{
    AccountPublicKey, ChainFamily, OriginDescriptor, Result, SignedPayload, SigningOutcome,
    SigningPayload, SigningRequest, WalletError,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Wire request
// ---------------------------------------------------------------------------

/// Operation kind on the wire.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WireKind {
    /// Sign a single transaction.
    SignTx,
    /// Sign an arbitrary message.
    SignMessage,
    /// Sign a batch of transactions, all-or-nothing.
    SignAll,
}

/// Payload field: one base64 string, or an array for `sign_all`.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WirePayload {
    /// Single base64-encoded payload.
    Single(String),
    /// Batch of base64-encoded payloads.
    Batch(Vec<String>),
}

/// Origin block of a wire request.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WireOrigin {
    /// Human-readable name of the requesting surface.
    pub name: String,
    /// Stable origin address (URL origin or local identifier).
    pub address: String,
}

/// A signing request as it arrives from the untrusted side.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireRequest {
    /// Caller-chosen id; echoed verbatim in the response.
    pub id: String,
    /// Chain family name. Optional for legacy callers only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_family: Option<String>,
    /// Operation kind.
    pub kind: WireKind,
    /// Base58-encoded account public key.
    pub public_key: String,
    /// Payload bytes, base64-encoded.
    pub payload: WirePayload,
    /// Who is asking.
    pub origin: WireOrigin,
}

// ---------------------------------------------------------------------------
// Wire response
// ---------------------------------------------------------------------------

/// Result field of a successful response.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WireResult {
    /// Base58 signature for `sign_tx` / `sign_message`.
    Signature(String),
    /// Base58 signatures in batch order for `sign_all`.
    Signatures(Vec<String>),
}

/// A response as sent back across the boundary.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WireResponse {
    /// The request's `id`, echoed for matching.
    pub id: String,
    /// Present on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<WireResult>,
    /// Stable error kind string on failure or decline.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Decodes a wire request into a [`SigningRequest`] with a fresh
/// correlation id.
///
/// # Errors
///
/// [`WalletError::TransportError`] for an unknown chain family, bad
/// base58/base64, or a payload shape that does not match the kind.
pub fn decode_request(wire: &WireRequest) -> Result<SigningRequest> {
    let chain_family = match &wire.chain_family {
        Some(name) => name.parse::<ChainFamily>()?,
        None => {
            // The single documented legacy default: only when the
            // field is absent entirely.
            tracing::warn!(
                id = %wire.id,
                origin = %wire.origin.address,
                "request omitted chainFamily; applying legacy default {}",
                ChainFamily::LEGACY_WIRE_DEFAULT
            );
            ChainFamily::LEGACY_WIRE_DEFAULT
        }
    };

    let public_key: AccountPublicKey = wire.public_key.parse()?;

    let payload = match (wire.kind, &wire.payload) {
        (WireKind::SignTx, WirePayload::Single(b64)) => {
            SigningPayload::Transaction(decode_base64(b64)?)
        }
        (WireKind::SignMessage, WirePayload::Single(b64)) => {
            SigningPayload::Message(decode_base64(b64)?)
        }
        (WireKind::SignAll, WirePayload::Batch(items)) => SigningPayload::BatchTransaction(
            items.iter().map(|b64| decode_base64(b64)).collect::<Result<_>>()?,
        ),
        (kind, _) => {
            return Err(WalletError::TransportError {
                reason: format!("payload shape does not match kind {kind:?}"),
            })
        }
    };

    Ok(SigningRequest {
        correlation_id: Uuid::new_v4(),
        chain_family,
        public_key,
        payload,
        origin: OriginDescriptor {
            name: wire.origin.name.clone(),
            address: wire.origin.address.clone(),
        },
    })
}

fn decode_base64(input: &str) -> Result<Vec<u8>> {
    BASE64.decode(input).map_err(|e| WalletError::TransportError {
        reason: format!("invalid base64 payload: {e}"),
    })
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

/// Builds the response for a resolved request.
///
/// A decline travels in the `error` slot with the stable
/// `user_declined` kind — the caller distinguishes it from failure by
/// kind, and from success by the absent `result`.
pub fn encode_response(wire_id: &str, outcome: &Result<SigningOutcome>) -> WireResponse {
    match outcome {
        Ok(SigningOutcome::Signed(SignedPayload::Single(sig))) => WireResponse {
            id: wire_id.to_string(),
            result: Some(WireResult::Signature(bs58::encode(sig).into_string())),
            error: None,
        },
        Ok(SigningOutcome::Signed(SignedPayload::Batch(sigs))) => WireResponse {
            id: wire_id.to_string(),
            result: Some(WireResult::Signatures(
                sigs.iter().map(|s| bs58::encode(s).into_string()).collect(),
            )),
            error: None,
        },
        Ok(SigningOutcome::Declined) => WireResponse {
            id: wire_id.to_string(),
            result: None,
            error: Some(WalletError::UserDeclined.kind().to_string()),
        },
        Err(e) => WireResponse {
            id: wire_id.to_string(),
            result: None,
            error: Some(e.kind().to_string()),
        },
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

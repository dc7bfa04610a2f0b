//! Security-boundary transport for the Palisade multi-chain wallet.
//!
//! Untrusted surfaces (dApp pages, UI renderers) talk to the wallet
//! core exclusively through this crate: a request/response protocol
//! where the caller can submit a signing request and receive a
//! signature or a typed error — and nothing else. Key material never
//! crosses this boundary.
//!
//! # Modules
//!
//! - [`message`] — the JSON wire codec and request decoding
//! - [`origin`] — allow-list validation of requesting origins
//! - [`transport`] — correlation-id matching, timeouts, dispatch
//! - [`events`] — typed wallet events over a broadcast channel

pub mod events;
pub mod message;
pub mod origin;
pub mod transport;

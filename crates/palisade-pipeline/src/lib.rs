//! Transaction pipeline for the Palisade multi-chain wallet.
//!
//! Drives a transaction from envelope preparation through broadcast
//! and confirmation against an [`rpc::RpcNode`] — the external
//! collaborator contract for a chain's RPC endpoint.
//!
//! # Modules
//!
//! - [`rpc`] — the `RpcNode` trait, envelope, and simulation result
//! - [`cache`] — recent-blockhash cache with an explicit TTL tag
//! - [`pipeline`] — prepare / simulate / send-with-backoff / confirm

pub mod cache;
pub mod pipeline;
pub mod rpc;

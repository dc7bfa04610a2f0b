//! Signing dispatch for the Palisade multi-chain wallet.
//!
//! [`service::SigningService`] resolves each request to the keyring of
//! the **requested** chain family, locates the account by public key,
//! and performs the signature. Requests for the same account are
//! serialized; requests for different accounts or families proceed in
//! parallel.
//!
//! [`approval::ApprovalGate`] is the seam where a UI confirms or
//! declines a request; a decline is a distinct terminal outcome, not
//! an error.

pub mod approval;
pub mod service;

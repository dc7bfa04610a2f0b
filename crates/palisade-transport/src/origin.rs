//! Origin validation for inbound signing requests.
//!
//! Every request carries an [`OriginDescriptor`] naming the surface
//! that sent it. The policy is checked **before** the request reaches
//! the signing service: a rejected origin never touches the keyring.

use std::collections::HashSet;

use palisade_types::{OriginDescriptor, Result, WalletError};

// ---------------------------------------------------------------------------
// OriginPolicy
// ---------------------------------------------------------------------------

/// Admission policy for request origins.
#[derive(Clone, Debug)]
pub enum OriginPolicy {
    /// All origins admitted. For trusted local surfaces only (e.g. a
    /// popup served from the extension bundle itself), where the
    /// transport substrate already guarantees who the peer is.
    Open,
    /// Only origins whose `address` is in the set are admitted.
    AllowList(HashSet<String>),
}

impl OriginPolicy {
    /// Builds an allow-list policy from origin addresses.
    pub fn allow_list<I, S>(addresses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::AllowList(addresses.into_iter().map(Into::into).collect())
    }

    /// Checks whether `origin` may submit requests.
    ///
    /// # Errors
    ///
    /// Returns [`WalletError::TransportError`] naming the rejected
    /// origin address.
    pub fn validate(&self, origin: &OriginDescriptor) -> Result<()> {
        match self {
            Self::Open => Ok(()),
            Self::AllowList(allowed) => {
                if allowed.contains(&origin.address) {
                    Ok(())
                } else {
                    Err(WalletError::TransportError {
                        reason: format!("origin '{}' is not on the allow-list", origin.address),
                    })
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn origin(address: &str) -> OriginDescriptor {
        OriginDescriptor {
            name: "test surface".into(),
            address: address.into(),
        }
    }

    #[test]
    fn open_policy_admits_anything() -> Result<()> {
        OriginPolicy::Open.validate(&origin("https://anywhere.example"))
    }

    #[test]
    fn allow_list_admits_member() -> Result<()> {
        let policy = OriginPolicy::allow_list(["https://dapp.example"]);
        policy.validate(&origin("https://dapp.example"))
    }

    #[test]
    fn allow_list_rejects_unknown() {
        let policy = OriginPolicy::allow_list(["https://dapp.example"]);
        let result = policy.validate(&origin("https://evil.example"));
        assert!(matches!(result, Err(WalletError::TransportError { .. })));
    }

    #[test]
    fn empty_allow_list_rejects_everything() {
        let policy = OriginPolicy::allow_list(Vec::<String>::new());
        assert!(policy.validate(&origin("https://dapp.example")).is_err());
    }

    #[test]
    fn matching_is_exact_not_prefix() {
        let policy = OriginPolicy::allow_list(["https://dapp.example"]);
        assert!(policy.validate(&origin("https://dapp.example.evil.com")).is_err());
    }
}

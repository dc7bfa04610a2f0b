//! Core configuration with documented defaults.
//!
//! All operational parameters of the wallet core are centralized here.
//! Components receive a [`CoreConfig`] (or a slice of it) explicitly at
//! construction — there is no ambient or process-global configuration.

use serde::{Deserialize, Serialize};

use crate::{ChainFamily, Result, WalletError};

/// Operational configuration for the wallet core.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Chain families to populate on unlock. A family not listed here
    /// gets no keyring, and requests for it fail with
    /// `NoKeyringForChain` rather than being served by another family.
    pub enabled_families: Vec<ChainFamily>,

    /// Seconds an inbound signing request may stay pending before the
    /// transport resolves it as `Timeout` and drops its correlation
    /// entry.
    pub request_timeout_secs: u64,

    /// Maximum broadcast attempts before `send` surfaces `SendFailed`.
    pub send_max_attempts: u32,

    /// Base delay in milliseconds for broadcast retry backoff. Doubles
    /// per attempt.
    pub send_backoff_base_ms: u64,

    /// Seconds to poll for the requested commitment level before
    /// `confirm` surfaces `ConfirmationTimeout`.
    pub confirm_timeout_secs: u64,

    /// Milliseconds between confirmation status polls.
    pub confirm_poll_interval_ms: u64,

    /// Seconds a cached recent blockhash counts as fresh.
    pub blockhash_ttl_secs: u64,

    /// Origin addresses allowed to submit signing requests. Empty
    /// means no remote origin is accepted (the transport can still be
    /// constructed in open mode for a trusted local surface).
    pub allowed_origins: Vec<String>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            enabled_families: ChainFamily::ALL.to_vec(),
            request_timeout_secs: 30,
            send_max_attempts: 5,
            send_backoff_base_ms: 200,
            confirm_timeout_secs: 60,
            confirm_poll_interval_ms: 500,
            blockhash_ttl_secs: 30,
            allowed_origins: Vec::new(),
        }
    }
}

impl CoreConfig {
    /// Validates all configuration values.
    ///
    /// Returns an error if any value is outside its acceptable range.
    pub fn validate(&self) -> Result<()> {
        if self.enabled_families.is_empty() {
            return Err(WalletError::ConfigError {
                reason: "enabled_families must name at least one chain family".into(),
            });
        }

        if self.request_timeout_secs == 0 {
            return Err(WalletError::ConfigError {
                reason: "request_timeout_secs must be greater than 0".into(),
            });
        }

        if self.send_max_attempts == 0 {
            return Err(WalletError::ConfigError {
                reason: "send_max_attempts must be greater than 0".into(),
            });
        }

        if self.confirm_timeout_secs == 0 {
            return Err(WalletError::ConfigError {
                reason: "confirm_timeout_secs must be greater than 0".into(),
            });
        }

        if self.confirm_poll_interval_ms == 0 {
            return Err(WalletError::ConfigError {
                reason: "confirm_poll_interval_ms must be greater than 0".into(),
            });
        }

        if self.blockhash_ttl_secs == 0 {
            return Err(WalletError::ConfigError {
                reason: "blockhash_ttl_secs must be greater than 0".into(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() -> Result<()> {
        CoreConfig::default().validate()
    }

    #[test]
    fn default_enables_all_families() {
        let cfg = CoreConfig::default();
        assert_eq!(cfg.enabled_families, ChainFamily::ALL.to_vec());
    }

    #[test]
    fn empty_families_rejected() {
        let cfg = CoreConfig {
            enabled_families: Vec::new(),
            ..CoreConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn zero_attempts_rejected() {
        let cfg = CoreConfig {
            send_max_attempts: 0,
            ..CoreConfig::default()
        };
        assert!(cfg.validate().is_err());
    }
}

//! # Runtime Configuration
//!
//! ## Security Requirements
//!
//! - `tee_private_key` and `user_master_key` MUST NOT be the default zero
//!   value in production; [`RuntimeConfig::validate_for_production`] panics
//!   if either is.

use std::time::Duration;

use ledger_manager::ScanBudget;

/// Complete enclave runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Secrets held in enclave-resident memory for the process lifetime.
    pub secrets: SecretsConfig,
    /// Batch-cycle scheduling.
    pub cycle: CycleConfig,
    /// Deposit-scan bounds, passed through to each invocation.
    pub scan_budget: ScanBudget,
    /// Event bus capacity.
    pub bus_capacity: usize,
}

impl RuntimeConfig {
    /// Validate configuration for production readiness.
    ///
    /// # Panics
    ///
    /// Panics if either master secret is the default zero value.
    pub fn validate_for_production(&self) {
        if self.secrets.tee_private_key == [0u8; 32] {
            panic!(
                "SECURITY VIOLATION: TEE private key is default zero value. \
                 Set LITGHOST_TEE_PRIVATE_KEY or provide in config."
            );
        }
        if self.secrets.user_master_key == [0u8; 32] {
            panic!(
                "SECURITY VIOLATION: user master key is default zero value. \
                 Set LITGHOST_USER_MASTER_KEY or provide in config."
            );
        }
    }

    /// Load from environment variables, falling back to defaults (which
    /// fail [`Self::validate_for_production`] on purpose).
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            secrets: SecretsConfig::from_env(),
            cycle: CycleConfig::default(),
            scan_budget: ScanBudget::default(),
            bus_capacity: ledger_bus::DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

/// The enclave's long-term master secrets.
#[derive(Clone)]
pub struct SecretsConfig {
    /// The TEE's secp256k1 private key (§4.2).
    pub tee_private_key: [u8; 32],
    /// The per-user deterministic-derivation master key (§4.2).
    pub user_master_key: [u8; 32],
}

impl std::fmt::Debug for SecretsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretsConfig")
            .field("tee_private_key", &"[redacted]")
            .field("user_master_key", &"[redacted]")
            .finish()
    }
}

impl Default for SecretsConfig {
    fn default() -> Self {
        Self {
            tee_private_key: [0u8; 32],
            user_master_key: [0u8; 32],
        }
    }
}

fn hex_env_to_32_bytes(var: &str) -> Option<[u8; 32]> {
    let raw = std::env::var(var).ok()?;
    let decoded = hex::decode(raw.trim()).ok()?;
    decoded.try_into().ok()
}

impl SecretsConfig {
    /// Load from `LITGHOST_TEE_PRIVATE_KEY` / `LITGHOST_USER_MASTER_KEY`
    /// (64 hex characters each); missing or malformed values fall back to
    /// the zero default, which fails production validation.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            tee_private_key: hex_env_to_32_bytes("LITGHOST_TEE_PRIVATE_KEY").unwrap_or_default(),
            user_master_key: hex_env_to_32_bytes("LITGHOST_USER_MASTER_KEY").unwrap_or_default(),
        }
    }
}

/// Batch-cycle scheduling.
#[derive(Debug, Clone, Copy)]
pub struct CycleConfig {
    /// Delay between the end of one batch cycle and the start of the next.
    pub interval: Duration,
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
        }
    }
}

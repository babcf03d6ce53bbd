//! # Manager API — Inbound Port
//!
//! The single operation the enclave host drives per cycle.

use async_trait::async_trait;
use ledger_types::{PayoutRequest, SkippedOp, TransferRequest, UpdateBatch};
use std::time::Duration;

use crate::errors::ManagerError;

/// Parameters bounding one deposit-scan pass (spec §4.6.1, §5).
#[derive(Clone, Copy, Debug)]
pub struct ScanBudget {
    /// Wall-clock budget for the scan loop.
    pub time_budget: Duration,
    /// Stop once this many deposits have been collected.
    pub deposit_cap: usize,
}

impl Default for ScanBudget {
    fn default() -> Self {
        Self {
            time_budget: Duration::from_secs(5),
            deposit_cap: 100,
        }
    }
}

/// One invocation's proposed operations, alongside the enclave's master
/// secrets.
pub struct BatchRequest {
    /// The TEE's long-term secp256k1 private key.
    pub tee_private_key: [u8; 32],
    /// The enclave's user-master key, for deterministic user derivation.
    pub user_master_key: [u8; 32],
    /// Proposed internal transfers, in internal cents.
    pub transfers: Vec<TransferRequest>,
    /// Proposed withdrawals.
    pub payouts: Vec<PayoutRequest>,
    /// Deposit-scan bounds.
    pub scan_budget: ScanBudget,
}

/// The manager's public operation.
#[async_trait]
pub trait ManagerApi: Send + Sync {
    /// Run one batch-assembly cycle.
    ///
    /// Returns `Ok(None)` when scanning found nothing new and no
    /// transfers/payouts were proposed — there is nothing to seal.
    async fn run_batch(
        &self,
        request: BatchRequest,
    ) -> Result<Option<(UpdateBatch, Vec<SkippedOp>)>, ManagerError>;
}

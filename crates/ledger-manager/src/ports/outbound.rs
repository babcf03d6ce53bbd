//! # Ledger Gateway — Outbound Port
//!
//! Typed replacement for spec §9's "runtime-erased contract ABIs" redesign
//! flag: one method per read row of spec §6's external-interfaces table.
//! Both `ledger-manager` and `ledger-client` depend on this trait rather
//! than on a concrete transport, following the teacher's single
//! typed-interface convention.

use async_trait::async_trait;
use ledger_types::{Counters, DepositEvent, LeafChangeEvent, Leaf, PublicKey, UserInfo};

/// Read-only access to the ledger contract's state and event log.
///
/// Implementations bind to a concrete transport (JSON-RPC, an in-process
/// mock, …). The manager and client never call a transport directly.
#[async_trait]
pub trait LedgerGateway: Send + Sync {
    /// `getStatus()`: current on-chain counters.
    async fn get_status(&self) -> Result<Counters, String>;

    /// `getUserInfo(userPublicKey)`: registration status and current leaf
    /// for one user.
    async fn get_user_info(&self, user_public_key: &PublicKey) -> Result<UserInfo, String>;

    /// `getUserLeaves(userPublicKeys[])`: global user indices for a batch
    /// of public keys (0 ⇔ unregistered).
    async fn get_user_indices(&self, user_public_keys: &[PublicKey]) -> Result<Vec<u32>, String>;

    /// `getLeaves(leafIndices[])`: current packed leaves by index.
    async fn get_leaves(&self, leaf_indices: &[u32]) -> Result<Vec<Leaf>, String>;

    /// `getUserPublicKeys(userIndices[])`: x-only public keys by global
    /// user index.
    async fn get_user_public_keys(
        &self,
        user_indices: &[u32],
    ) -> Result<Vec<PublicKey>, String>;

    /// `OpDeposit` events in `[from_block, to_block]`, inclusive.
    async fn get_deposit_events(
        &self,
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<DepositEvent>, String>;

    /// `LeafChange(leafIdx)` events from `from_block` onward, for the
    /// client's backfill.
    async fn get_leaf_change_events(
        &self,
        leaf_idx: u32,
        from_block: u64,
    ) -> Result<Vec<LeafChangeEvent>, String>;

    /// The chain's current head height, bounding deposit-scan chunks.
    async fn latest_block(&self) -> Result<u64, String>;
}

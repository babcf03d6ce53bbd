//! # In-Memory Ledger Gateway
//!
//! A [`LedgerGateway`] double that mimics the on-chain contract's read
//! surface and invariants closely enough to drive [`ManagerService`]
//! end-to-end in tests, without an actual chain. Exposed (not
//! `#[cfg(test)]`-gated) so integration suites outside this crate can
//! seed a ledger and apply batches the same way.
//!
//! [`ManagerService`]: crate::service::ManagerService

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use ledger_types::{
    leaf_index_of, Counters, DepositEvent, Leaf, LeafChangeEvent, PublicKey, UpdateBatch,
    UserInfo, LEAF_CAPACITY, SENTINEL_USER_INDEX,
};

use crate::ports::outbound::LedgerGateway;

#[derive(Default)]
struct State {
    counters: Counters,
    leaves: HashMap<u32, Leaf>,
    user_indices: HashMap<PublicKey, u32>,
    user_public_keys: HashMap<u32, PublicKey>,
    deposit_events: Vec<DepositEvent>,
    leaf_change_events: Vec<LeafChangeEvent>,
    latest_block: u64,
}

/// An in-memory stand-in for the ledger contract.
pub struct InMemoryLedger {
    state: Mutex<State>,
}

impl InMemoryLedger {
    /// A fresh, empty ledger at the given chain height.
    #[must_use]
    pub fn new(latest_block: u64) -> Self {
        Self {
            state: Mutex::new(State {
                latest_block,
                ..State::default()
            }),
        }
    }

    /// Append a raw `OpDeposit` event (test setup helper; real indexers
    /// populate this from chain logs).
    pub fn seed_deposit(&self, event: DepositEvent) {
        self.state.lock().expect("lock").deposit_events.push(event);
    }

    /// Advance the chain head without changing processed state.
    pub fn set_latest_block(&self, block: u64) {
        self.state.lock().expect("lock").latest_block = block;
    }

    /// Apply a sealed [`UpdateBatch`] the way the on-chain contract would:
    /// write leaves, register new users, and advance counters. Does not
    /// itself verify the batch's transcript — callers that want that
    /// check should verify it themselves first.
    pub fn apply_batch(&self, batch: &UpdateBatch) {
        let mut state = self.state.lock().expect("lock");

        // New registrations must land before the leaf loop below, which
        // relinks `user_indices` from whatever `user_public_keys` knows —
        // including users this same batch just registered.
        let base_index = state.counters.user_count;
        for (i, public_key) in batch.new_users.iter().enumerate() {
            let global_index = base_index + 1 + i as u32;
            state.user_public_keys.insert(global_index, *public_key);
            state.user_indices.insert(*public_key, global_index);
        }
        state.counters.user_count += batch.new_users.len() as u32;

        for leaf in &batch.updates {
            let leaf_idx = leaf.idx;
            for slot in 0..LEAF_CAPACITY as usize {
                let global_index = leaf_idx * LEAF_CAPACITY + slot as u32;
                if global_index == SENTINEL_USER_INDEX {
                    continue;
                }
                if let Some(&public_key) = state.user_public_keys.get(&global_index) {
                    state.user_indices.entry(public_key).or_insert(global_index);
                }
            }
            state.leaves.insert(leaf_idx, leaf.clone());
            state.leaf_change_events.push(LeafChangeEvent {
                leaf_idx,
                leaf: leaf.clone(),
                block_number: state.latest_block,
                tx_hash: [0u8; 32],
            });
        }

        state.counters.processed_ops = batch.op_start + batch.op_count;
        state.counters.last_processed_block = batch.next_block;
    }
}

#[async_trait]
impl LedgerGateway for InMemoryLedger {
    async fn get_status(&self) -> Result<Counters, String> {
        Ok(self.state.lock().expect("lock").counters)
    }

    async fn get_user_info(&self, user_public_key: &PublicKey) -> Result<UserInfo, String> {
        let state = self.state.lock().expect("lock");
        let user_index = state
            .user_indices
            .get(user_public_key)
            .copied()
            .unwrap_or(SENTINEL_USER_INDEX);
        let leaf = if user_index == SENTINEL_USER_INDEX {
            None
        } else {
            state.leaves.get(&leaf_index_of(user_index)).cloned()
        };
        Ok(UserInfo { user_index, leaf })
    }

    async fn get_user_indices(&self, user_public_keys: &[PublicKey]) -> Result<Vec<u32>, String> {
        let state = self.state.lock().expect("lock");
        Ok(user_public_keys
            .iter()
            .map(|key| {
                state
                    .user_indices
                    .get(key)
                    .copied()
                    .unwrap_or(SENTINEL_USER_INDEX)
            })
            .collect())
    }

    async fn get_leaves(&self, leaf_indices: &[u32]) -> Result<Vec<Leaf>, String> {
        let state = self.state.lock().expect("lock");
        Ok(leaf_indices
            .iter()
            .map(|&idx| state.leaves.get(&idx).cloned().unwrap_or_else(|| Leaf::empty(idx)))
            .collect())
    }

    async fn get_user_public_keys(&self, user_indices: &[u32]) -> Result<Vec<PublicKey>, String> {
        let state = self.state.lock().expect("lock");
        user_indices
            .iter()
            .map(|idx| {
                state
                    .user_public_keys
                    .get(idx)
                    .copied()
                    .ok_or_else(|| format!("no public key registered for user index {idx}"))
            })
            .collect()
    }

    async fn get_deposit_events(
        &self,
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<DepositEvent>, String> {
        let state = self.state.lock().expect("lock");
        Ok(state
            .deposit_events
            .iter()
            .filter(|e| e.block_number >= from_block && e.block_number <= to_block)
            .cloned()
            .collect())
    }

    async fn get_leaf_change_events(
        &self,
        leaf_idx: u32,
        from_block: u64,
    ) -> Result<Vec<LeafChangeEvent>, String> {
        let state = self.state.lock().expect("lock");
        Ok(state
            .leaf_change_events
            .iter()
            .filter(|e| e.leaf_idx == leaf_idx && e.block_number >= from_block)
            .cloned()
            .collect())
    }

    async fn latest_block(&self) -> Result<u64, String> {
        Ok(self.state.lock().expect("lock").latest_block)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fresh_ledger_reports_zero_counters() {
        let ledger = InMemoryLedger::new(100);
        let counters = ledger.get_status().await.unwrap();
        assert_eq!(counters.user_count, 0);
        assert_eq!(counters.processed_ops, 0);
        assert_eq!(ledger.latest_block().await.unwrap(), 100);
    }

    #[tokio::test]
    async fn unregistered_user_info_is_sentinel() {
        let ledger = InMemoryLedger::new(0);
        let info = ledger.get_user_info(&[0xAAu8; 32]).await.unwrap();
        assert_eq!(info.user_index, SENTINEL_USER_INDEX);
        assert!(info.leaf.is_none());
    }

    #[tokio::test]
    async fn missing_leaves_come_back_empty_not_missing() {
        let ledger = InMemoryLedger::new(0);
        let leaves = ledger.get_leaves(&[3, 7]).await.unwrap();
        assert_eq!(leaves.len(), 2);
        assert_eq!(leaves[0], Leaf::empty(3));
        assert_eq!(leaves[1], Leaf::empty(7));
    }
}

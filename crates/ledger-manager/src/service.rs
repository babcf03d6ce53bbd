//! # Manager Service — Batch Orchestration (4.6 end-to-end)
//!
//! Ties the pure domain modules together against a concrete
//! [`LedgerGateway`]: scan deposits, resolve touched usernames against
//! their on-chain registration state, compute the balance plan, pick
//! chaff, shuffle leaf order, re-encrypt every touched leaf, and seal the
//! result into a transcript-bound [`UpdateBatch`].
//!
//! The manager itself holds no state across invocations (spec §5): every
//! [`ManagerService::run_batch`] call starts from whatever the gateway
//! reports as current.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use ledger_crypto::keys::{derive_user_keypair, ecdh_shared_secret};
use ledger_crypto::leaf_cipher::decrypt_balance;
use ledger_types::{
    leaf_index_of, slot_of, Leaf, Payout, PublicKey, UpdateBatch, CHAFF_MULTIPLIER, LEAF_CAPACITY,
    SENTINEL_USER_INDEX,
};
use tracing::{info, warn};

use crate::domain::chaff::select_chaff;
use crate::domain::plan::{build_plan, CreditedDeposit};
use crate::domain::reencrypt::reencrypt_leaf;
use crate::domain::scale::to_cents;
use crate::domain::scan::scan_deposits;
use crate::domain::shuffle::shuffle_leaf_order;
use crate::errors::ManagerError;
use crate::ports::inbound::{BatchRequest, ManagerApi};
use crate::ports::outbound::LedgerGateway;

/// Stateless batch-assembly manager.
///
/// Generic over the gateway so tests can plug in an in-memory double
/// without a trait object; production composition still stores this
/// behind `Arc<dyn LedgerGateway>` at the binary's edge.
pub struct ManagerService<G> {
    gateway: Arc<G>,
}

impl<G: LedgerGateway> ManagerService<G> {
    /// Build a manager bound to the given gateway.
    pub fn new(gateway: Arc<G>) -> Self {
        Self { gateway }
    }

    /// Resolve every touched username to its deterministic keypair and
    /// its current on-chain registration (global index, 0 if unregistered).
    async fn resolve_usernames(
        &self,
        user_master_key: &[u8; 32],
        usernames: &BTreeSet<String>,
    ) -> Result<(HashMap<String, PublicKey>, HashMap<String, u32>), ManagerError> {
        let mut username_pubkey = HashMap::with_capacity(usernames.len());
        let mut pubkeys_ordered = Vec::with_capacity(usernames.len());

        for username in usernames {
            let keypair = derive_user_keypair(user_master_key, username)?;
            username_pubkey.insert(username.clone(), *keypair.public_key());
            pubkeys_ordered.push(*keypair.public_key());
        }

        let indices = self
            .gateway
            .get_user_indices(&pubkeys_ordered)
            .await
            .map_err(ManagerError::LedgerUnavailable)?;

        if indices.len() != usernames.len() {
            return Err(ManagerError::InconsistentState(format!(
                "gateway returned {} indices for {} usernames",
                indices.len(),
                usernames.len()
            )));
        }

        let username_index = usernames.iter().cloned().zip(indices).collect();
        Ok((username_pubkey, username_index))
    }

    /// Decrypt the current balance of every already-registered username.
    async fn fetch_existing_balances(
        &self,
        tee_private_key: &[u8; 32],
        username_pubkey: &HashMap<String, PublicKey>,
        username_index: &HashMap<String, u32>,
    ) -> Result<HashMap<String, u32>, ManagerError> {
        let registered_leaves: BTreeSet<u32> = username_index
            .values()
            .filter(|&&idx| idx != SENTINEL_USER_INDEX)
            .map(|&idx| leaf_index_of(idx))
            .collect();

        let leaf_indices: Vec<u32> = registered_leaves.iter().copied().collect();
        let fetched = self
            .gateway
            .get_leaves(&leaf_indices)
            .await
            .map_err(ManagerError::LedgerUnavailable)?;

        if fetched.len() != leaf_indices.len() {
            return Err(ManagerError::InconsistentState(format!(
                "gateway returned {} leaves for {} requested indices",
                fetched.len(),
                leaf_indices.len()
            )));
        }

        let leaf_cache: HashMap<u32, Leaf> = leaf_indices.into_iter().zip(fetched).collect();

        let mut existing_balances = HashMap::with_capacity(username_index.len());
        for (username, &global_index) in username_index {
            if global_index == SENTINEL_USER_INDEX {
                continue;
            }
            let leaf_idx = leaf_index_of(global_index);
            let slot = slot_of(global_index);
            let leaf = leaf_cache.get(&leaf_idx).ok_or_else(|| {
                ManagerError::InconsistentState(format!("leaf {leaf_idx} not returned"))
            })?;
            let public_key = username_pubkey[username];
            let shared = ecdh_shared_secret(tee_private_key, &public_key)?;
            let balance = decrypt_balance(&leaf.encrypted_balances[slot], &shared, leaf.nonce)?;
            existing_balances.insert(username.clone(), balance);
        }

        Ok(existing_balances)
    }
}

#[async_trait::async_trait]
impl<G: LedgerGateway> ManagerApi for ManagerService<G> {
    async fn run_batch(
        &self,
        request: BatchRequest,
    ) -> Result<Option<(UpdateBatch, Vec<ledger_types::SkippedOp>)>, ManagerError> {
        info!("batch cycle: scanning");
        let counters = self
            .gateway
            .get_status()
            .await
            .map_err(ManagerError::LedgerUnavailable)?;

        let scan = scan_deposits(
            self.gateway.as_ref(),
            &request.tee_private_key,
            counters.last_processed_block,
            counters.processed_ops,
            request.scan_budget,
        )
        .await?;

        let op_count = (scan.deposits.len() + scan.invalid.len()) as u64;

        if op_count == 0 && request.transfers.is_empty() && request.payouts.is_empty() {
            info!(next_block = scan.next_block, "nothing to do this cycle");
            return Ok(None);
        }

        info!(
            deposits = scan.deposits.len(),
            invalid = scan.invalid.len(),
            transfers = request.transfers.len(),
            payouts = request.payouts.len(),
            "batch cycle: planning"
        );

        let mut usernames: BTreeSet<String> = BTreeSet::new();
        for d in &scan.deposits {
            usernames.insert(d.username.clone());
        }
        for t in &request.transfers {
            usernames.insert(t.from.clone());
            usernames.insert(t.to.clone());
        }
        for p in &request.payouts {
            if !p.username.is_empty() {
                usernames.insert(p.username.clone());
            }
        }

        let (username_pubkey, username_index) = self
            .resolve_usernames(&request.user_master_key, &usernames)
            .await?;

        let existing_balances = self
            .fetch_existing_balances(&request.tee_private_key, &username_pubkey, &username_index)
            .await?;

        let credited: Vec<CreditedDeposit> = scan
            .deposits
            .iter()
            .map(|d| CreditedDeposit {
                username: d.username.clone(),
                amount_cents: to_cents(d.event.amount),
                depositor: d.event.from,
            })
            .collect();

        let plan = build_plan(
            &credited,
            &request.transfers,
            &request.payouts,
            &existing_balances,
        );

        for skipped in &plan.skipped {
            warn!(kind = ?skipped.kind, reason = %skipped.reason, details = %skipped.details, "operation skipped");
        }

        // New global indices are assigned past the highest already-assigned
        // index; index 0 is the permanent unregistered sentinel, so the
        // first real user is always index 1 (spec's "starting at current
        // userCount" is read here as "starting at userCount + 1").
        let mut next_index = counters.user_count + 1;
        let mut user_index = username_index.clone();
        for username in &plan.new_users {
            user_index.insert(username.clone(), next_index);
            next_index += 1;
        }
        let user_count_after = counters.user_count + plan.new_users.len() as u32;

        let real_leaves: BTreeSet<u32> = plan
            .balances
            .keys()
            .map(|username| leaf_index_of(user_index[username]))
            .collect();

        let total_leaf_count = user_count_after.div_ceil(LEAF_CAPACITY);
        let chaff = select_chaff(
            &request.tee_private_key,
            counters.processed_ops,
            op_count,
            &real_leaves,
            total_leaf_count,
            CHAFF_MULTIPLIER,
        );

        let shuffled_order = shuffle_leaf_order(
            &request.tee_private_key,
            counters.processed_ops,
            &real_leaves,
            &chaff,
        );

        info!(
            real_leaves = real_leaves.len(),
            chaff_leaves = chaff.len(),
            "batch cycle: encrypting"
        );

        // Known occupants: touched usernames' own public keys, keyed by
        // their (possibly freshly assigned) global index.
        let mut occupant_public_keys: HashMap<u32, PublicKey> = user_index
            .iter()
            .filter(|(_, &idx)| idx != SENTINEL_USER_INDEX)
            .map(|(username, &idx)| (idx, username_pubkey[username]))
            .collect();

        let mut balance_overrides: HashMap<u32, u32> = HashMap::new();
        for (username, &balance) in &plan.balances {
            balance_overrides.insert(user_index[username], balance);
        }

        let mut to_fetch: Vec<u32> = Vec::new();
        for &leaf_idx in &shuffled_order {
            for slot in 0..LEAF_CAPACITY as usize {
                let global_index = leaf_idx * LEAF_CAPACITY + slot as u32;
                if global_index == SENTINEL_USER_INDEX || global_index >= user_count_after {
                    continue;
                }
                if !occupant_public_keys.contains_key(&global_index) {
                    to_fetch.push(global_index);
                }
            }
        }

        if !to_fetch.is_empty() {
            let fetched_keys = self
                .gateway
                .get_user_public_keys(&to_fetch)
                .await
                .map_err(ManagerError::LedgerUnavailable)?;
            if fetched_keys.len() != to_fetch.len() {
                return Err(ManagerError::InconsistentState(format!(
                    "gateway returned {} public keys for {} requested indices",
                    fetched_keys.len(),
                    to_fetch.len()
                )));
            }
            for (global_index, public_key) in to_fetch.into_iter().zip(fetched_keys) {
                occupant_public_keys.insert(global_index, public_key);
            }
        }

        let old_leaves_fetched = self
            .gateway
            .get_leaves(&shuffled_order)
            .await
            .map_err(ManagerError::LedgerUnavailable)?;
        if old_leaves_fetched.len() != shuffled_order.len() {
            return Err(ManagerError::InconsistentState(format!(
                "gateway returned {} leaves for {} requested indices",
                old_leaves_fetched.len(),
                shuffled_order.len()
            )));
        }

        let mut updates = Vec::with_capacity(shuffled_order.len());
        let mut old_leaves = Vec::with_capacity(shuffled_order.len());
        for (leaf_idx, old_leaf) in shuffled_order.iter().zip(old_leaves_fetched) {
            let rewrite = reencrypt_leaf(
                &request.tee_private_key,
                *leaf_idx,
                Some(&old_leaf),
                &occupant_public_keys,
                &balance_overrides,
                user_count_after,
            )?;
            old_leaves.push(rewrite.old_leaf);
            updates.push(rewrite.new_leaf);
        }

        let new_user_public_keys: Vec<PublicKey> = plan
            .new_users
            .iter()
            .map(|username| username_pubkey[username])
            .collect();

        let mut payouts: Vec<Payout> = scan
            .invalid
            .iter()
            .map(|invalid| Payout {
                to_who: invalid.from,
                amount: invalid.amount,
            })
            .collect();
        payouts.extend(plan.payouts);

        let transcript = ledger_transcript::compute_transcript(
            counters.processed_ops,
            op_count,
            &updates,
            &old_leaves,
            counters.user_count,
            &new_user_public_keys,
            &payouts,
        )?;

        let batch = UpdateBatch {
            op_start: counters.processed_ops,
            op_count,
            next_block: scan.next_block,
            updates,
            new_users: new_user_public_keys,
            payouts,
            transcript,
        };

        info!(
            op_start = batch.op_start,
            op_count = batch.op_count,
            leaves_touched = batch.updates.len(),
            new_users = batch.new_users.len(),
            payouts = batch.payouts.len(),
            "batch cycle: sealed"
        );

        Ok(Some((batch, plan.skipped)))
    }
}

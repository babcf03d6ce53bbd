//! # Balance Lookup & Watch (4.7)

use std::collections::VecDeque;
use std::sync::Arc;

use ledger_bus::{EventFilter, LedgerEvent, LedgerEventBus, Subscription};
use ledger_crypto::keys::ecdh_shared_secret;
use ledger_crypto::leaf_cipher::decrypt_balance;
use ledger_manager::LedgerGateway;
use ledger_types::{leaf_index_of, slot_of, Hash, PrivateKey, PublicKey, SENTINEL_USER_INDEX};
use tracing::debug;

use crate::errors::ClientError;

/// A balance observation tied to the on-chain event that produced it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BalanceUpdate {
    /// Block height the owning leaf change was mined at.
    pub block_number: u64,
    /// The decrypted balance, internal cents.
    pub balance: u32,
    /// The leaf's nonce after this update.
    pub nonce: u32,
    /// The transaction carrying the leaf update.
    pub tx_hash: Hash,
}

/// A read-only client over one user's own balance.
///
/// Reference: spec §4.7.
pub struct UserClient<G> {
    gateway: Arc<G>,
    event_bus: Arc<LedgerEventBus>,
    user_private_key: PrivateKey,
    user_public_key: PublicKey,
    tee_public_key: PublicKey,
}

impl<G: LedgerGateway> UserClient<G> {
    /// Build a client for one user, given their own keypair (bootstrapped
    /// out-of-band from the enclave's deterministic derivation) and the
    /// TEE's long-term public key.
    pub fn new(
        gateway: Arc<G>,
        event_bus: Arc<LedgerEventBus>,
        user_private_key: PrivateKey,
        user_public_key: PublicKey,
        tee_public_key: PublicKey,
    ) -> Self {
        Self {
            gateway,
            event_bus,
            user_private_key,
            user_public_key,
            tee_public_key,
        }
    }

    /// Look up this user's global index, failing `NotRegistered` if none
    /// is assigned yet.
    async fn require_registration(&self) -> Result<u32, ClientError> {
        let info = self
            .gateway
            .get_user_info(&self.user_public_key)
            .await
            .map_err(ClientError::LedgerUnavailable)?;
        if info.user_index == SENTINEL_USER_INDEX {
            return Err(ClientError::NotRegistered);
        }
        Ok(info.user_index)
    }

    /// Fetch and decrypt the current balance.
    ///
    /// Reference: spec §4.7 "get_balance()".
    pub async fn get_balance(&self) -> Result<u32, ClientError> {
        let user_index = self.require_registration().await?;
        let leaf_idx = leaf_index_of(user_index);
        let slot = slot_of(user_index);

        let leaves = self
            .gateway
            .get_leaves(&[leaf_idx])
            .await
            .map_err(ClientError::LedgerUnavailable)?;
        let leaf = leaves.into_iter().next().ok_or_else(|| {
            ClientError::InconsistentState(format!("leaf {leaf_idx} not returned"))
        })?;

        let shared = ecdh_shared_secret(&self.user_private_key, &self.tee_public_key)?;
        let balance = decrypt_balance(&leaf.encrypted_balances[slot], &shared, leaf.nonce)?;
        Ok(balance)
    }

    /// Start a restartable, monotonic-nonce-filtered balance-update
    /// sequence, backfilling from `from_block` before following live
    /// events.
    ///
    /// Reference: spec §4.7 "watch_balance()".
    pub async fn watch_balance(&self, from_block: u64) -> Result<BalanceWatch, ClientError> {
        let user_index = self.require_registration().await?;
        let leaf_idx = leaf_index_of(user_index);
        let slot = slot_of(user_index);
        let shared = ecdh_shared_secret(&self.user_private_key, &self.tee_public_key)?;

        let events = self
            .gateway
            .get_leaf_change_events(leaf_idx, from_block)
            .await
            .map_err(ClientError::LedgerUnavailable)?;

        let mut backfill = VecDeque::with_capacity(events.len());
        for event in events {
            let balance =
                decrypt_balance(&event.leaf.encrypted_balances[slot], &shared, event.leaf.nonce)?;
            backfill.push_back(BalanceUpdate {
                block_number: event.block_number,
                balance,
                nonce: event.leaf.nonce,
                tx_hash: event.tx_hash,
            });
        }

        let subscription = self.event_bus.subscribe(EventFilter::for_leaf(leaf_idx));

        Ok(BalanceWatch {
            backfill,
            subscription,
            leaf_idx,
            slot,
            shared_secret: shared,
            last_nonce: None,
        })
    }
}

/// A lazy, restartable sequence of [`BalanceUpdate`]s for one leaf slot.
///
/// Dropping this (ending iteration) releases the underlying event
/// subscription — cancellation needs no explicit call.
pub struct BalanceWatch {
    backfill: VecDeque<BalanceUpdate>,
    subscription: Subscription,
    leaf_idx: u32,
    slot: usize,
    shared_secret: ledger_crypto::SharedSecretBytes,
    last_nonce: Option<u32>,
}

impl BalanceWatch {
    /// Admit `nonce` if it is strictly greater than the last yielded
    /// nonce, recording it as the new high-water mark.
    fn accept(&mut self, nonce: u32) -> bool {
        if let Some(last) = self.last_nonce {
            if nonce <= last {
                return false;
            }
        }
        self.last_nonce = Some(nonce);
        true
    }

    /// Yield the next balance update, backfill first, then live events.
    ///
    /// Returns `Ok(None)` once the publisher side has shut down.
    pub async fn next(&mut self) -> Result<Option<BalanceUpdate>, ClientError> {
        loop {
            if let Some(update) = self.backfill.pop_front() {
                if self.accept(update.nonce) {
                    return Ok(Some(update));
                }
                continue;
            }

            let Some(event) = self.subscription.recv().await else {
                return Ok(None);
            };

            let LedgerEvent::LeafChanged(change) = event else {
                continue;
            };
            if change.leaf_idx != self.leaf_idx {
                continue;
            }
            if !self.accept(change.leaf.nonce) {
                debug!(nonce = change.leaf.nonce, "stale leaf change dropped");
                continue;
            }

            let balance = decrypt_balance(
                &change.leaf.encrypted_balances[self.slot],
                &self.shared_secret,
                change.leaf.nonce,
            )?;
            return Ok(Some(BalanceUpdate {
                block_number: change.block_number,
                balance,
                nonce: change.leaf.nonce,
                tx_hash: change.tx_hash,
            }));
        }
    }
}

//! # Full-Leaf Re-encryption (4.6.6)
//!
//! Every touched leaf (real or chaff) is rewritten in full: all six slots
//! are decrypted under the old nonce, the changed slots are overwritten,
//! and all six are re-encrypted under `newNonce = oldNonce + 1`. Primitive
//! failures here are on already-validated inputs, so they propagate and
//! abort the invocation rather than becoming a skipped record (spec §7).

use ledger_crypto::keys::ecdh_shared_secret;
use ledger_crypto::leaf_cipher::{decrypt_balance, encrypt_balance};
use ledger_crypto::CryptoError;
use ledger_types::{Leaf, PublicKey, LEAF_CAPACITY, SENTINEL_USER_INDEX};
use std::collections::HashMap;

/// One leaf's before/after pair, as needed for both the batch's `updates[]`
/// and the transcript's old-leaf reference.
#[derive(Clone, Debug)]
pub struct LeafRewrite {
    /// The leaf index rewritten.
    pub leaf_idx: u32,
    /// The leaf as it stood before this batch (all-zero if newly created).
    pub old_leaf: Leaf,
    /// The leaf after re-encryption.
    pub new_leaf: Leaf,
}

/// Re-encrypt one leaf.
///
/// `occupant_public_keys` must carry an entry for every occupied slot
/// (global index in `1..user_count_after`, excluding the sentinel).
/// `balance_overrides` carries the new balance for every global index
/// whose balance changed this batch; indices absent from it keep their
/// current decrypted value.
pub fn reencrypt_leaf(
    tee_private_key: &[u8; 32],
    leaf_idx: u32,
    existing_leaf: Option<&Leaf>,
    occupant_public_keys: &HashMap<u32, PublicKey>,
    balance_overrides: &HashMap<u32, u32>,
    user_count_after: u32,
) -> Result<LeafRewrite, CryptoError> {
    let old_leaf = existing_leaf.cloned().unwrap_or_else(|| Leaf::empty(leaf_idx));
    let new_nonce = old_leaf.nonce + 1;
    let mut new_balances = [[0u8; 4]; 6];

    for (slot, new_balance) in new_balances.iter_mut().enumerate() {
        let global_index = leaf_idx * LEAF_CAPACITY + slot as u32;
        if global_index == SENTINEL_USER_INDEX || global_index >= user_count_after {
            continue;
        }

        let Some(public_key) = occupant_public_keys.get(&global_index) else {
            continue;
        };

        let shared = ecdh_shared_secret(tee_private_key, public_key)?;

        let balance = match balance_overrides.get(&global_index) {
            Some(&balance) => balance,
            None => decrypt_balance(&old_leaf.encrypted_balances[slot], &shared, old_leaf.nonce)?,
        };

        *new_balance = encrypt_balance(balance, &shared, new_nonce);
    }

    let new_leaf = Leaf {
        encrypted_balances: new_balances,
        idx: leaf_idx,
        nonce: new_nonce,
    };

    Ok(LeafRewrite {
        leaf_idx,
        old_leaf,
        new_leaf,
    })
}

//! # Ledger Transcript — Byte-Exact Verifier Hash Chain (C5)
//!
//! The transcript is a linear chain of keccak-256 hashes over canonically
//! encoded tuples, binding a batch's entire effect into a single 32-byte
//! digest. Byte-exact equivalence with the on-chain verifier is a hard
//! requirement (spec §4.5), so every width below is pinned exactly as the
//! spec states it (`u64`, `u32`, `u256`, `bytes32`) rather than left to a
//! generic serializer.

mod encoding;
mod errors;

pub use errors::TranscriptError;

use encoding::Encoder;
use ledger_types::{Hash, Leaf, Payout, PublicKey};
use sha3::{Digest, Keccak256};

fn hash(bytes: &[u8]) -> Hash {
    let mut hasher = Keccak256::new();
    hasher.update(bytes);
    hasher.finalize().into()
}

/// Compute the transcript hash for a batch, given the leaves it replaces.
///
/// `old_leaves` must be parallel to `updates`: `old_leaves[i]` is the leaf
/// currently stored at `updates[i].idx` (or `Leaf::empty(updates[i].idx)`
/// if no leaf exists yet at that index), per spec §4.5 step 2.
///
/// Reference: spec §4.5, steps 1-6.
pub fn compute_transcript(
    op_start: u64,
    op_count: u64,
    updates: &[Leaf],
    old_leaves: &[Leaf],
    user_count_before: u32,
    new_users: &[PublicKey],
    payouts: &[Payout],
) -> Result<Hash, TranscriptError> {
    if old_leaves.len() != updates.len() {
        return Err(TranscriptError::LeafCountMismatch {
            updates: updates.len(),
            old_leaves: old_leaves.len(),
        });
    }

    // Step 1.
    let mut t = hash(
        Encoder::new()
            .push_u64(op_start)
            .push_u64(op_count)
            .push_u256_from_usize(updates.len())
            .finish(),
    );

    // Step 2.
    for (new_leaf, old_leaf) in updates.iter().zip(old_leaves.iter()) {
        t = hash(
            Encoder::new()
                .push_bytes32(&t)
                .push_leaf(old_leaf)
                .push_leaf(new_leaf)
                .finish(),
        );
    }

    // Step 3.
    t = hash(
        Encoder::new()
            .push_bytes32(&t)
            .push_u32(user_count_before)
            .push_u32(new_users.len() as u32)
            .finish(),
    );

    // Step 4.
    for (i, public_key) in new_users.iter().enumerate() {
        t = hash(
            Encoder::new()
                .push_bytes32(&t)
                .push_u32(user_count_before + i as u32)
                .push_bytes32(public_key)
                .finish(),
        );
    }

    // Step 5.
    t = hash(
        Encoder::new()
            .push_bytes32(&t)
            .push_u256_from_usize(payouts.len())
            .finish(),
    );

    // Step 6.
    for payout in payouts {
        t = hash(
            Encoder::new()
                .push_bytes32(&t)
                .push_address(&payout.to_who)
                .push_u256(payout.amount)
                .finish(),
        );
    }

    Ok(t)
}

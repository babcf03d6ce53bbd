//! # Chaff Leaf Selection (4.6.4)
//!
//! Deterministically pads the set of touched leaves so an observer of the
//! touched-leaf-index set alone cannot tell which leaves carry a real
//! balance delta.

use ledger_crypto::bytes::{hmac_ns, keccak256};
use ledger_types::{CHAFF_SATURATION_FACTOR, NS_CHAFF};
use std::collections::BTreeSet;

/// Select chaff leaves for a batch.
///
/// `real` is the set of leaf indices already touched by applied deltas and
/// payouts; `total_leaf_count` is `⌈currentUserCount / LEAF_CAPACITY⌉`.
///
/// Reference: spec §4.6.4.
pub fn select_chaff(
    tee_private_key: &[u8; 32],
    op_start: u64,
    op_count: u64,
    real: &BTreeSet<u32>,
    total_leaf_count: u32,
    chaff_multiplier: usize,
) -> BTreeSet<u32> {
    let mut chaff = BTreeSet::new();
    if total_leaf_count == 0 {
        return chaff;
    }

    let target = real.len() * chaff_multiplier;
    if target == 0 {
        return chaff;
    }

    let max_iterations = target as u64 * CHAFF_SATURATION_FACTOR;

    let mut seed = {
        let mut data = Vec::with_capacity(16);
        data.extend_from_slice(&op_start.to_be_bytes());
        data.extend_from_slice(&op_count.to_be_bytes());
        hmac_ns(tee_private_key, NS_CHAFF, &data)
    };

    for _ in 0..max_iterations {
        if chaff.len() >= target {
            break;
        }
        let mut candidate_bytes = [0u8; 4];
        candidate_bytes.copy_from_slice(&seed[..4]);
        let candidate = u32::from_be_bytes(candidate_bytes) % total_leaf_count;

        if !real.contains(&candidate) {
            chaff.insert(candidate);
        }

        seed = keccak256(&seed);
    }

    chaff
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chaff_set_is_deterministic() {
        let tee_priv = [0x42u8; 32];
        let real: BTreeSet<u32> = [1].into_iter().collect();

        let a = select_chaff(&tee_priv, 7, 2, &real, 4, 3);
        let b = select_chaff(&tee_priv, 7, 2, &real, 4, 3);
        assert_eq!(a, b);
    }

    #[test]
    fn chaff_never_includes_real_leaves() {
        let tee_priv = [0x42u8; 32];
        let real: BTreeSet<u32> = [0, 1].into_iter().collect();
        let chaff = select_chaff(&tee_priv, 1, 1, &real, 10, 3);
        assert!(chaff.is_disjoint(&real));
    }

    #[test]
    fn chaff_saturates_gracefully_for_small_ledgers() {
        let tee_priv = [0x42u8; 32];
        let real: BTreeSet<u32> = [0].into_iter().collect();
        // Only 1 leaf total; no room for chaff beyond the real leaf.
        let chaff = select_chaff(&tee_priv, 1, 1, &real, 1, 3);
        assert!(chaff.is_empty());
    }

    #[test]
    fn empty_real_set_yields_no_chaff() {
        let tee_priv = [0x42u8; 32];
        let chaff = select_chaff(&tee_priv, 1, 1, &BTreeSet::new(), 10, 3);
        assert!(chaff.is_empty());
    }
}

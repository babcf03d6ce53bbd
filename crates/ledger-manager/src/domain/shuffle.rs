//! # Leaf Order Shuffle (4.6.5)

use ledger_crypto::bytes::hmac_ns;
use ledger_types::NS_LEAF_ORDER;
use std::collections::BTreeSet;

/// Order the union of real and chaff leaves by
/// `hmac_ns(teePriv, "leaf.order-ns", opStart ∥ leafIdx)`, byte-lexicographically.
///
/// Reference: spec §4.6.5.
#[must_use]
pub fn shuffle_leaf_order(
    tee_private_key: &[u8; 32],
    op_start: u64,
    real: &BTreeSet<u32>,
    chaff: &BTreeSet<u32>,
) -> Vec<u32> {
    let mut union: Vec<u32> = real.union(chaff).copied().collect();

    union.sort_by_key(|leaf_idx| {
        let mut data = Vec::with_capacity(12);
        data.extend_from_slice(&op_start.to_be_bytes());
        data.extend_from_slice(&leaf_idx.to_be_bytes());
        hmac_ns(tee_private_key, NS_LEAF_ORDER, &data)
    });

    union
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shuffle_is_deterministic_and_covers_the_union() {
        let tee_priv = [0x11u8; 32];
        let real: BTreeSet<u32> = [1, 3].into_iter().collect();
        let chaff: BTreeSet<u32> = [0, 2].into_iter().collect();

        let a = shuffle_leaf_order(&tee_priv, 7, &real, &chaff);
        let b = shuffle_leaf_order(&tee_priv, 7, &real, &chaff);
        assert_eq!(a, b);

        let mut sorted = a.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, vec![0, 1, 2, 3]);
    }

    #[test]
    fn different_op_start_can_change_order() {
        let tee_priv = [0x11u8; 32];
        let real: BTreeSet<u32> = [0, 1, 2, 3, 4].into_iter().collect();

        let a = shuffle_leaf_order(&tee_priv, 1, &real, &BTreeSet::new());
        let b = shuffle_leaf_order(&tee_priv, 2, &real, &BTreeSet::new());
        assert_ne!(a, b);
    }
}

//! Scaling between on-chain full-decimal amounts and internal cents.
//!
//! Reference: spec §3 "Scalar primitives", §6 "Domain constants" (`D`).

use ledger_types::D;
use primitive_types::U256;

/// Convert a full-decimal on-chain amount to internal cents, saturating at
/// `u32::MAX` rather than panicking on overflow — any amount that large
/// will exceed every real balance check downstream anyway.
#[must_use]
pub fn to_cents(full_decimals: U256) -> u32 {
    let cents = full_decimals / U256::from(D);
    if cents > U256::from(u32::MAX) {
        u32::MAX
    } else {
        cents.as_u32()
    }
}

/// Convert internal cents to a full-decimal on-chain amount.
#[must_use]
pub fn to_full_decimals(cents: u32) -> U256 {
    U256::from(cents) * U256::from(D)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_for_exact_multiples() {
        assert_eq!(to_cents(to_full_decimals(12_345)), 12_345);
    }

    #[test]
    fn truncates_sub_cent_remainder() {
        let full = to_full_decimals(1) + U256::from(1);
        assert_eq!(to_cents(full), 1);
    }

    #[test]
    fn saturates_instead_of_panicking() {
        let huge = U256::MAX;
        assert_eq!(to_cents(huge), u32::MAX);
    }
}

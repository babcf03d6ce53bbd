//! Quantified-invariant property tests run against the domain layer
//! directly (chaff selection, leaf re-encryption, plan construction) and
//! against the full manager pipeline (determinism).

use std::collections::HashMap;

use ledger_crypto::deposit::{blind_username, unblind_username};
use ledger_crypto::keys::generate_keypair;
use ledger_manager::domain::chaff::select_chaff;
use ledger_manager::domain::plan::{build_plan, CreditedDeposit};
use ledger_manager::domain::reencrypt::reencrypt_leaf;
use ledger_manager::ManagerApi;
use ledger_types::MAX_BALANCE;
use primitive_types::U256;
use proptest::prelude::*;

proptest! {
    /// Chaff indistinguishability (structural): the padded set has size in
    /// `[|real|, |real| * (1 + chaffMultiplier)]` and never overlaps `real`.
    #[test]
    fn chaff_set_is_bounded_and_disjoint_from_real(
        real_indices in prop::collection::btree_set(0u32..20, 0..6),
        total_leaf_count in 20u32..40,
        chaff_multiplier in 0usize..4,
        op_start in 0u64..1000,
        op_count in 0u64..50,
    ) {
        let tee_private_key = [0x33u8; 32];
        let chaff = select_chaff(
            &tee_private_key,
            op_start,
            op_count,
            &real_indices,
            total_leaf_count,
            chaff_multiplier,
        );

        prop_assert!(chaff.is_disjoint(&real_indices));
        let union_size = real_indices.len() + chaff.len();
        prop_assert!(union_size >= real_indices.len());
        prop_assert!(union_size <= real_indices.len() * (1 + chaff_multiplier));

        // Determinism: identical parameters produce the identical set.
        let chaff_again = select_chaff(
            &tee_private_key,
            op_start,
            op_count,
            &real_indices,
            total_leaf_count,
            chaff_multiplier,
        );
        prop_assert_eq!(chaff, chaff_again);
    }

    /// Nonce monotonicity: re-encrypting a leaf that already exists always
    /// produces `new_nonce == old_nonce + 1`, chained across repeated
    /// rewrites of the same leaf.
    #[test]
    fn reencryption_advances_the_nonce_by_exactly_one(
        rewrites in 1usize..8,
    ) {
        let tee = generate_keypair();
        let mut leaf = None;

        for i in 0..rewrites {
            let prior_nonce = leaf.as_ref().map_or(0, |l: &ledger_types::Leaf| l.nonce);
            let rewrite = reencrypt_leaf(
                tee.private_key(),
                0,
                leaf.as_ref(),
                &HashMap::new(),
                &HashMap::new(),
                0,
            )
            .unwrap();
            prop_assert_eq!(rewrite.new_leaf.nonce, prior_nonce + 1);
            prop_assert_eq!(rewrite.old_leaf.nonce, prior_nonce);
            leaf = Some(rewrite.new_leaf);
        }
    }

    /// Balance constraint: after a plan is built from arbitrary deposits,
    /// every balance sits in `[0, MAX_BALANCE]` and no overflow deposit is
    /// left uncapped.
    #[test]
    fn plan_balances_never_exceed_max_balance(
        amounts in prop::collection::vec(0u32..=MAX_BALANCE, 1..5),
    ) {
        let deposits: Vec<CreditedDeposit> = amounts
            .iter()
            .enumerate()
            .map(|(i, &amount_cents)| CreditedDeposit {
                username: "alice".into(),
                amount_cents,
                depositor: [i as u8; 20],
            })
            .collect();

        let plan = build_plan(&deposits, &[], &[], &HashMap::new());
        for &balance in plan.balances.values() {
            prop_assert!(balance <= MAX_BALANCE);
        }
    }

    /// Round-trip blinding: unblinding a username blinded under the same
    /// shared secret always recovers the original, across arbitrary
    /// well-formed usernames and shared secrets.
    #[test]
    fn round_trip_blinding_holds_for_any_username_and_shared_secret(
        username in "[a-zA-Z][a-zA-Z0-9]{0,30}",
        shared_secret in prop::collection::vec(any::<u8>(), 1..64),
    ) {
        let blinded = blind_username(&username, &shared_secret).unwrap();
        let recovered = unblind_username(&blinded, &shared_secret).unwrap();
        prop_assert_eq!(recovered, username);
    }
}

#[tokio::test]
async fn determinism_two_independent_runs_from_the_same_snapshot_agree() {
    let tee_private_key = [0x44u8; 32];
    let user_master_key = [0x55u8; 32];

    // A deterministic TEE keypair (not `generate_keypair`, which is
    // random) so both runs below share an identical identity.
    let tee = ledger_crypto::keys::derive_user_keypair(&tee_private_key, "tee-fixture").unwrap();

    let build = || {
        let ledger = std::sync::Arc::new(ledger_manager::testing::InMemoryLedger::new(0));
        let manager = ledger_manager::ManagerService::new(ledger.clone());
        (ledger, manager)
    };

    let (ledger_a, manager_a) = build();
    let (ledger_b, manager_b) = build();

    let (intent, _) = ledger_crypto::deposit::create_deposit_intent("alice", tee.public_key()).unwrap();
    for ledger in [&ledger_a, &ledger_b] {
        ledger.seed_deposit(ledger_types::DepositEvent {
            idx: 1,
            from: [0x01u8; 20],
            rand_key: intent.rand,
            to_user: intent.user,
            amount: U256::from(100_000_000u64),
            block_number: 1,
            removed: false,
        });
    }

    let request_a = ledger_manager::BatchRequest {
        tee_private_key: *tee.private_key(),
        user_master_key,
        transfers: vec![],
        payouts: vec![],
        scan_budget: ledger_manager::ScanBudget::default(),
    };
    let request_b = ledger_manager::BatchRequest {
        tee_private_key: *tee.private_key(),
        user_master_key,
        transfers: vec![],
        payouts: vec![],
        scan_budget: ledger_manager::ScanBudget::default(),
    };

    let (batch_a, _) = manager_a.run_batch(request_a).await.unwrap().unwrap();
    let (batch_b, _) = manager_b.run_batch(request_b).await.unwrap().unwrap();

    assert_eq!(batch_a.transcript, batch_b.transcript);
    assert_eq!(batch_a.updates, batch_b.updates);
    assert_eq!(batch_a.new_users, batch_b.new_users);
}

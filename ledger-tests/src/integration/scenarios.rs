use std::collections::BTreeSet;

use ledger_manager::domain::chaff::select_chaff;
use ledger_manager::domain::shuffle::shuffle_leaf_order;
use ledger_types::{PayoutRequest, TransferRequest, MAX_BALANCE};
use primitive_types::U256;

use crate::harness::Fixture;

#[tokio::test]
async fn three_independent_deposits_share_one_leaf() {
    let fx = Fixture::new();
    fx.seed_deposit(1, [0xA1u8; 20], "alice", U256::from(100_000_000u64));
    fx.seed_deposit(2, [0xA2u8; 20], "bob", U256::from(100_000_000u64));
    fx.seed_deposit(3, [0xA3u8; 20], "carol", U256::from(100_000_000u64));

    let (batch, skipped) = fx.run_and_apply(vec![], vec![]).await.expect("batch sealed");
    assert!(skipped.is_empty());
    assert_eq!(batch.new_users.len(), 3);
    assert_eq!(batch.updates.len(), 1);
    assert_eq!(batch.updates[0].idx, 0);
    assert_eq!(batch.updates[0].nonce, 1);

    assert_eq!(fx.decrypt_balance("alice").await, 10_000);
    assert_eq!(fx.decrypt_balance("bob").await, 10_000);
    assert_eq!(fx.decrypt_balance("carol").await, 10_000);
}

#[tokio::test]
async fn internal_transfer_within_the_same_leaf() {
    let fx = Fixture::new();
    fx.seed_deposit(1, [0xA1u8; 20], "alice", U256::from(100_000_000u64));
    fx.seed_deposit(2, [0xA2u8; 20], "bob", U256::from(100_000_000u64));
    fx.seed_deposit(3, [0xA3u8; 20], "carol", U256::from(100_000_000u64));
    fx.run_and_apply(vec![], vec![]).await.expect("registrations sealed");

    let transfer = TransferRequest {
        from: "alice".into(),
        to: "bob".into(),
        amount: 3_000,
    };
    let (batch, skipped) = fx.run_and_apply(vec![transfer], vec![]).await.expect("transfer sealed");
    assert!(skipped.is_empty());
    assert_eq!(batch.new_users.len(), 0);
    assert_eq!(batch.updates[0].nonce, 2);

    assert_eq!(fx.decrypt_balance("alice").await, 7_000);
    assert_eq!(fx.decrypt_balance("bob").await, 13_000);
    assert_eq!(fx.decrypt_balance("carol").await, 10_000);
}

#[tokio::test]
async fn payout_with_decimal_scaling() {
    let fx = Fixture::new();
    fx.seed_deposit(1, [0xA1u8; 20], "alice", U256::from(100_000_000u64));
    fx.seed_deposit(2, [0xA2u8; 20], "bob", U256::from(100_000_000u64));
    fx.run_and_apply(vec![], vec![]).await.expect("registrations sealed");

    let transfer = TransferRequest {
        from: "alice".into(),
        to: "bob".into(),
        amount: 3_000,
    };
    fx.run_and_apply(vec![transfer], vec![]).await.expect("transfer sealed");
    assert_eq!(fx.decrypt_balance("alice").await, 7_000);

    let payout = PayoutRequest {
        username: "alice".into(),
        to_address: [0xAAu8; 20],
        amount_full_decimals: U256::from(50_000_000u64),
    };
    let (batch, skipped) = fx.run_and_apply(vec![], vec![payout]).await.expect("payout sealed");
    assert!(skipped.is_empty());
    assert_eq!(batch.payouts.len(), 1);
    assert_eq!(batch.payouts[0].to_who, [0xAAu8; 20]);
    assert_eq!(batch.payouts[0].amount, U256::from(50_000_000u64));
    assert_eq!(batch.updates[0].nonce, 3);

    assert_eq!(fx.decrypt_balance("alice").await, 2_000);
}

#[tokio::test]
async fn deposit_overflow_triggers_an_auto_refund() {
    let fx = Fixture::new();
    fx.seed_deposit(1, [0xA1u8; 20], "alice", U256::from((MAX_BALANCE as u64 - 100) * 10_000));
    fx.run_and_apply(vec![], vec![]).await.expect("initial credit sealed");
    assert_eq!(fx.decrypt_balance("alice").await, MAX_BALANCE - 100);

    fx.seed_deposit(2, [0xB1u8; 20], "alice", U256::from(500u64 * 10_000));
    let (batch, skipped) = fx.run_and_apply(vec![], vec![]).await.expect("overflow batch sealed");
    assert!(skipped.is_empty());
    assert_eq!(batch.payouts.len(), 1);
    assert_eq!(batch.payouts[0].to_who, [0xB1u8; 20]);
    assert_eq!(batch.payouts[0].amount, U256::from(400u64 * 10_000));

    assert_eq!(fx.decrypt_balance("alice").await, MAX_BALANCE);
}

#[tokio::test]
async fn invalid_recipient_transfer_is_skipped_not_applied() {
    let fx = Fixture::new();
    fx.seed_deposit(1, [0xA1u8; 20], "alice", U256::from(100_000_000u64));
    fx.run_and_apply(vec![], vec![]).await.expect("registration sealed");

    let transfer = TransferRequest {
        from: "alice".into(),
        to: "has__double_underscore".into(),
        amount: 500,
    };
    let result = fx.run_and_apply(vec![transfer], vec![]).await;

    // Nothing sealed this cycle: no deposits pending and the only
    // proposed op was rejected before touching any balance.
    let (_, skipped) = result.expect("a batch still seals to report the skip");
    assert_eq!(skipped.len(), 1);
    assert_eq!(skipped[0].reason, "invalid recipient username");

    assert_eq!(fx.decrypt_balance("alice").await, 10_000);
}

#[test]
fn chaff_shuffle_is_a_fixed_permutation_given_identical_parameters() {
    let tee_private_key = [0x77u8; 32];
    let op_start = 7;
    let op_count = 2;
    let total_leaf_count = 4; // currentUserCount = 24, four leaves total
    let real: BTreeSet<u32> = [1].into_iter().collect();

    let chaff_a = select_chaff(&tee_private_key, op_start, op_count, &real, total_leaf_count, 3);
    let chaff_b = select_chaff(&tee_private_key, op_start, op_count, &real, total_leaf_count, 3);
    assert_eq!(chaff_a, chaff_b);

    let order_a = shuffle_leaf_order(&tee_private_key, op_start, &real, &chaff_a);
    let order_b = shuffle_leaf_order(&tee_private_key, op_start, &real, &chaff_b);
    assert_eq!(order_a, order_b);

    assert!(chaff_a.len() <= real.len() * 3);
    assert!(!chaff_a.contains(&1));
}

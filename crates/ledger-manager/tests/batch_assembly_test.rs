//! # Batch Assembly Integration Tests
//!
//! Drives [`ManagerService`] end-to-end against [`InMemoryLedger`],
//! covering the seed scenarios of a deposit-triggered registration and a
//! subsequent internal transfer.

use std::sync::Arc;

use ledger_crypto::deposit::create_deposit_intent;
use ledger_crypto::keys::{derive_user_keypair, generate_keypair};
use ledger_manager::testing::InMemoryLedger;
use ledger_manager::{BatchRequest, ManagerApi, ManagerService, ScanBudget};
use ledger_types::{DepositEvent, TransferRequest};
use primitive_types::U256;

fn default_request(
    tee_private_key: [u8; 32],
    user_master_key: [u8; 32],
    transfers: Vec<TransferRequest>,
) -> BatchRequest {
    BatchRequest {
        tee_private_key,
        user_master_key,
        transfers,
        payouts: vec![],
        scan_budget: ScanBudget::default(),
    }
}

#[tokio::test]
async fn deposit_registers_a_new_user_and_credits_balance() {
    let tee = generate_keypair();
    let user_master_key = [0x7Au8; 32];

    let ledger = Arc::new(InMemoryLedger::new(10));

    let (intent, _ephemeral) = create_deposit_intent("alice", tee.public_key()).unwrap();
    ledger.seed_deposit(DepositEvent {
        idx: 1,
        from: [0x11u8; 20],
        rand_key: intent.rand,
        to_user: intent.user,
        amount: U256::from(50_000_000u64), // 5000.00 tokens at D=10_000
        block_number: 5,
        removed: false,
    });

    let manager = ManagerService::new(ledger.clone());
    let request = default_request(*tee.private_key(), user_master_key, vec![]);

    let (batch, skipped) = manager
        .run_batch(request)
        .await
        .expect("run_batch should succeed")
        .expect("a deposit is pending, batch should be produced");

    assert!(skipped.is_empty());
    assert_eq!(batch.op_count, 1);
    assert_eq!(batch.new_users.len(), 1);
    assert_eq!(batch.updates.len(), 1, "a single new leaf should be touched");

    ledger.apply_batch(&batch);
    let counters = ledger.get_status().await.unwrap();
    assert_eq!(counters.user_count, 1);
    assert_eq!(counters.processed_ops, 1);
}

#[tokio::test]
async fn internal_transfer_moves_balance_between_two_registered_users() {
    let tee = generate_keypair();
    let user_master_key = [0x7Au8; 32];
    let ledger = Arc::new(InMemoryLedger::new(10));
    let manager = ManagerService::new(ledger.clone());

    // First batch: deposits register alice and bob.
    let (alice_intent, _) = create_deposit_intent("alice", tee.public_key()).unwrap();
    let (bob_intent, _) = create_deposit_intent("bob", tee.public_key()).unwrap();
    ledger.seed_deposit(DepositEvent {
        idx: 1,
        from: [0x01u8; 20],
        rand_key: alice_intent.rand,
        to_user: alice_intent.user,
        amount: U256::from(100_000_000u64),
        block_number: 1,
        removed: false,
    });
    ledger.seed_deposit(DepositEvent {
        idx: 2,
        from: [0x02u8; 20],
        rand_key: bob_intent.rand,
        to_user: bob_intent.user,
        amount: U256::from(100_000_000u64),
        block_number: 1,
        removed: false,
    });

    let request = default_request(*tee.private_key(), user_master_key, vec![]);
    let (batch, _) = manager.run_batch(request).await.unwrap().unwrap();
    ledger.apply_batch(&batch);

    // Second batch: alice transfers 2500 cents to bob. No new deposits.
    let transfers = vec![TransferRequest {
        from: "alice".into(),
        to: "bob".into(),
        amount: 2_500,
    }];
    let request = default_request(*tee.private_key(), user_master_key, transfers);
    let (batch, skipped) = manager
        .run_batch(request)
        .await
        .unwrap()
        .expect("a transfer is pending, batch should be produced");
    assert!(skipped.is_empty());
    assert_eq!(batch.op_count, 0, "transfers consume no on-chain op slots");
    assert!(batch.new_users.is_empty());

    ledger.apply_batch(&batch);

    // Decrypt both balances the way the client would, to confirm the
    // transfer landed.
    let alice_keypair = derive_user_keypair(&user_master_key, "alice").unwrap();
    let bob_keypair = derive_user_keypair(&user_master_key, "bob").unwrap();
    let alice_info = ledger.get_user_info(alice_keypair.public_key()).await.unwrap();
    let bob_info = ledger.get_user_info(bob_keypair.public_key()).await.unwrap();

    let alice_leaf = alice_info.leaf.unwrap();
    let bob_leaf = bob_info.leaf.unwrap();

    let alice_shared =
        ledger_crypto::keys::ecdh_shared_secret(tee.private_key(), alice_keypair.public_key())
            .unwrap();
    let bob_shared =
        ledger_crypto::keys::ecdh_shared_secret(tee.private_key(), bob_keypair.public_key())
            .unwrap();

    let alice_slot = ledger_types::slot_of(alice_info.user_index);
    let bob_slot = ledger_types::slot_of(bob_info.user_index);

    let alice_balance = ledger_crypto::leaf_cipher::decrypt_balance(
        &alice_leaf.encrypted_balances[alice_slot],
        &alice_shared,
        alice_leaf.nonce,
    )
    .unwrap();
    let bob_balance = ledger_crypto::leaf_cipher::decrypt_balance(
        &bob_leaf.encrypted_balances[bob_slot],
        &bob_shared,
        bob_leaf.nonce,
    )
    .unwrap();

    assert_eq!(alice_balance, 10_000 - 2_500);
    assert_eq!(bob_balance, 10_000 + 2_500);
}

#[tokio::test]
async fn no_pending_work_yields_no_batch() {
    let tee = generate_keypair();
    let ledger = Arc::new(InMemoryLedger::new(0));
    let manager = ManagerService::new(ledger);

    let request = default_request(*tee.private_key(), [0x01u8; 32], vec![]);
    let result = manager.run_batch(request).await.unwrap();
    assert!(result.is_none());
}

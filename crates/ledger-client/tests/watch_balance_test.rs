//! Integration tests for `UserClient` against `InMemoryLedger`.

use std::sync::Arc;
use std::time::Duration;

use ledger_bus::{EventPublisher, LedgerEvent, LedgerEventBus};
use ledger_client::{ClientError, UserClient};
use ledger_crypto::keys::generate_keypair;
use ledger_manager::testing::InMemoryLedger;
use ledger_manager::{BatchRequest, ManagerApi, ManagerService, ScanBudget};
use ledger_crypto::deposit::create_deposit_intent;
use ledger_types::{DepositEvent, LeafChangeEvent};
use primitive_types::U256;
use tokio::time::timeout;

#[tokio::test]
async fn unregistered_user_get_balance_fails() {
    let tee = generate_keypair();
    let alice = generate_keypair();
    let ledger = Arc::new(InMemoryLedger::new(0));
    let bus = Arc::new(LedgerEventBus::new());

    let client = UserClient::new(
        ledger,
        bus,
        *alice.private_key(),
        *alice.public_key(),
        *tee.public_key(),
    );

    let err = client.get_balance().await.unwrap_err();
    assert!(matches!(err, ClientError::NotRegistered));
}

#[tokio::test]
async fn get_balance_reflects_a_sealed_deposit() {
    let tee = generate_keypair();
    let user_master_key = [0x55u8; 32];
    let ledger = Arc::new(InMemoryLedger::new(10));
    let bus = Arc::new(LedgerEventBus::new());
    let manager = ManagerService::new(ledger.clone());

    let (intent, _) = create_deposit_intent("alice", tee.public_key()).unwrap();
    ledger.seed_deposit(DepositEvent {
        idx: 1,
        from: [0x01u8; 20],
        rand_key: intent.rand,
        to_user: intent.user,
        amount: U256::from(30_000_000u64),
        block_number: 1,
        removed: false,
    });

    let request = BatchRequest {
        tee_private_key: *tee.private_key(),
        user_master_key,
        transfers: vec![],
        payouts: vec![],
        scan_budget: ScanBudget::default(),
    };
    let (batch, _) = manager.run_batch(request).await.unwrap().unwrap();
    ledger.apply_batch(&batch);

    let alice_keypair = ledger_crypto::keys::derive_user_keypair(&user_master_key, "alice").unwrap();
    let client = UserClient::new(
        ledger,
        bus,
        *alice_keypair.private_key(),
        *alice_keypair.public_key(),
        *tee.public_key(),
    );

    let balance = client.get_balance().await.unwrap();
    assert_eq!(balance, 3_000);
}

#[tokio::test]
async fn watch_balance_backfills_then_follows_live_events_with_monotonic_nonce() {
    let tee = generate_keypair();
    let alice = generate_keypair();
    let ledger = Arc::new(InMemoryLedger::new(0));
    let bus = Arc::new(LedgerEventBus::new());

    // Seed a leaf-change event directly as "chain history" for backfill.
    // Alice will be registered as global index 1: leaf 0, slot 1.
    let mut leaf = ledger_types::Leaf::empty(0);
    leaf.nonce = 1;
    let shared = ledger_crypto::keys::ecdh_shared_secret(alice.private_key(), tee.public_key()).unwrap();
    leaf.encrypted_balances[1] = ledger_crypto::leaf_cipher::encrypt_balance(500, &shared, 1);

    // Register alice directly at index 1 (leaf 0, slot 1) via a synthetic
    // batch application so `get_user_info` resolves her leaf.
    let batch = ledger_types::UpdateBatch {
        op_start: 0,
        op_count: 0,
        next_block: 0,
        updates: vec![leaf.clone()],
        new_users: vec![*alice.public_key()],
        payouts: vec![],
        transcript: [0u8; 32],
    };
    ledger.apply_batch(&batch);

    let client = UserClient::new(
        ledger.clone(),
        bus.clone(),
        *alice.private_key(),
        *alice.public_key(),
        *tee.public_key(),
    );

    let mut watch = client.watch_balance(0).await.unwrap();

    // The registration batch itself produced a leaf-change event (nonce
    // 1), so backfill yields it first.
    let backfilled = timeout(Duration::from_millis(200), watch.next())
        .await
        .expect("timeout")
        .unwrap()
        .expect("the registration leaf change");
    assert_eq!(backfilled.balance, 500);
    assert_eq!(backfilled.nonce, 1);

    // Now push a live event with nonce 2.
    let mut leaf2 = leaf.clone();
    leaf2.nonce = 2;
    leaf2.encrypted_balances[1] = ledger_crypto::leaf_cipher::encrypt_balance(750, &shared, 2);
    bus.publish(LedgerEvent::LeafChanged(LeafChangeEvent {
        leaf_idx: 0,
        leaf: leaf2,
        block_number: 5,
        tx_hash: [0xABu8; 32],
    }))
    .await;

    let update = timeout(Duration::from_millis(200), watch.next())
        .await
        .expect("timeout")
        .unwrap()
        .expect("an update");
    assert_eq!(update.balance, 750);
    assert_eq!(update.nonce, 2);

    // Replaying the same nonce again must be dropped, not yielded.
    let mut leaf2_replay = leaf.clone();
    leaf2_replay.nonce = 2;
    leaf2_replay.encrypted_balances[1] = ledger_crypto::leaf_cipher::encrypt_balance(750, &shared, 2);
    bus.publish(LedgerEvent::LeafChanged(LeafChangeEvent {
        leaf_idx: 0,
        leaf: leaf2_replay,
        block_number: 5,
        tx_hash: [0xABu8; 32],
    }))
    .await;

    let mut leaf3 = leaf.clone();
    leaf3.nonce = 3;
    leaf3.encrypted_balances[1] = ledger_crypto::leaf_cipher::encrypt_balance(900, &shared, 3);
    bus.publish(LedgerEvent::LeafChanged(LeafChangeEvent {
        leaf_idx: 0,
        leaf: leaf3,
        block_number: 6,
        tx_hash: [0xCDu8; 32],
    }))
    .await;

    let update = timeout(Duration::from_millis(200), watch.next())
        .await
        .expect("timeout")
        .unwrap()
        .expect("an update");
    assert_eq!(update.balance, 900);
    assert_eq!(update.nonce, 3);
}

//! Full-stack test: a sealed batch's leaf updates, published to the event
//! bus the way `enclave-runtime`'s cycle loop does, reach a `UserClient`
//! watching that user's balance.

use std::sync::Arc;
use std::time::Duration;

use ledger_bus::{EventPublisher, LedgerEvent, LedgerEventBus};
use ledger_client::UserClient;
use ledger_crypto::deposit::create_deposit_intent;
use ledger_crypto::keys::{derive_user_keypair, generate_keypair};
use ledger_manager::testing::InMemoryLedger;
use ledger_manager::{BatchRequest, ManagerApi, ManagerService, ScanBudget};
use ledger_types::{DepositEvent, TransferRequest};
use primitive_types::U256;
use tokio::time::timeout;

#[tokio::test]
async fn client_watches_balance_through_a_live_sealed_batch() {
    let tee = generate_keypair();
    let user_master_key = [0x66u8; 32];
    let ledger = Arc::new(InMemoryLedger::new(0));
    let bus = Arc::new(LedgerEventBus::new());
    let manager = ManagerService::new(ledger.clone());

    let (intent, _) = create_deposit_intent("alice", tee.public_key()).unwrap();
    ledger.seed_deposit(DepositEvent {
        idx: 1,
        from: [0x01u8; 20],
        rand_key: intent.rand,
        to_user: intent.user,
        amount: U256::from(100_000_000u64),
        block_number: 1,
        removed: false,
    });

    let alice = derive_user_keypair(&user_master_key, "alice").unwrap();
    let client = UserClient::new(
        ledger.clone(),
        bus.clone(),
        *alice.private_key(),
        *alice.public_key(),
        *tee.public_key(),
    );

    // Register alice and publish the resulting leaf change, the way
    // enclave-runtime's cycle loop does it.
    let request = BatchRequest {
        tee_private_key: *tee.private_key(),
        user_master_key,
        transfers: vec![],
        payouts: vec![],
        scan_budget: ScanBudget::default(),
    };
    let (batch, _) = manager.run_batch(request).await.unwrap().unwrap();
    for leaf in &batch.updates {
        bus.publish(LedgerEvent::LeafChanged(ledger_types::LeafChangeEvent {
            leaf_idx: leaf.idx,
            leaf: leaf.clone(),
            block_number: batch.next_block,
            tx_hash: batch.transcript,
        }))
        .await;
    }
    ledger.apply_batch(&batch);

    let mut watch = client.watch_balance(0).await.unwrap();
    let first = timeout(Duration::from_millis(200), watch.next())
        .await
        .expect("timeout")
        .unwrap()
        .expect("registration update");
    assert_eq!(first.balance, 10_000);
    assert_eq!(first.nonce, 1);

    // A second cycle moving balance via a transfer must also reach the
    // same watch, with a strictly greater nonce.
    let request2 = BatchRequest {
        tee_private_key: *tee.private_key(),
        user_master_key,
        transfers: vec![TransferRequest {
            from: "alice".into(),
            to: "bob".into(),
            amount: 1_000,
        }],
        payouts: vec![],
        scan_budget: ScanBudget::default(),
    };
    let (batch2, _) = manager.run_batch(request2).await.unwrap().unwrap();
    for leaf in &batch2.updates {
        bus.publish(LedgerEvent::LeafChanged(ledger_types::LeafChangeEvent {
            leaf_idx: leaf.idx,
            leaf: leaf.clone(),
            block_number: batch2.next_block,
            tx_hash: batch2.transcript,
        }))
        .await;
    }
    ledger.apply_batch(&batch2);

    let second = timeout(Duration::from_millis(200), watch.next())
        .await
        .expect("timeout")
        .unwrap()
        .expect("transfer update");
    assert_eq!(second.balance, 9_000);
    assert!(second.nonce > first.nonce);
}

//! Criterion benchmarks for the manager's batch-assembly hot path:
//! scanning, chaff selection, and full-batch sealing at growing
//! registered-user counts.

use std::collections::BTreeSet;
use std::sync::Arc;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use ledger_crypto::deposit::create_deposit_intent;
use ledger_crypto::keys::generate_keypair;
use ledger_manager::domain::chaff::select_chaff;
use ledger_manager::domain::shuffle::shuffle_leaf_order;
use ledger_manager::testing::InMemoryLedger;
use ledger_manager::{BatchRequest, ManagerApi, ManagerService, ScanBudget};
use ledger_types::DepositEvent;
use primitive_types::U256;
use tokio::runtime::Runtime;

fn bench_chaff_selection(c: &mut Criterion) {
    let tee_private_key = [0x11u8; 32];
    let mut group = c.benchmark_group("chaff_selection");

    for &user_count in &[6u32, 60, 600, 6_000] {
        let total_leaf_count = user_count.div_ceil(6);
        let real: BTreeSet<u32> = (0..total_leaf_count.min(5)).collect();

        group.bench_with_input(
            BenchmarkId::from_parameter(user_count),
            &total_leaf_count,
            |b, &total_leaf_count| {
                b.iter(|| select_chaff(&tee_private_key, 0, 1, &real, total_leaf_count, 3));
            },
        );
    }
    group.finish();
}

fn bench_leaf_order_shuffle(c: &mut Criterion) {
    let tee_private_key = [0x22u8; 32];
    let mut group = c.benchmark_group("leaf_order_shuffle");

    for &leaf_count in &[10u32, 100, 1_000] {
        let real: BTreeSet<u32> = (0..leaf_count).collect();
        group.bench_with_input(BenchmarkId::from_parameter(leaf_count), &real, |b, real| {
            b.iter(|| shuffle_leaf_order(&tee_private_key, 0, real, &BTreeSet::new()));
        });
    }
    group.finish();
}

/// End-to-end `run_batch` over a ledger freshly seeded with `n` deposits
/// destined for `n` distinct new users — the worst case for the manager,
/// since every leaf touched this cycle is a fresh registration.
fn bench_run_batch_fresh_registrations(c: &mut Criterion) {
    let rt = Runtime::new().expect("tokio runtime");
    let tee = generate_keypair();
    let mut group = c.benchmark_group("run_batch_fresh_registrations");

    for &n in &[6u64, 60, 300] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter_batched(
                || {
                    let ledger = Arc::new(InMemoryLedger::new(0));
                    for i in 0..n {
                        let username = format!("user{i}");
                        let (intent, _) =
                            create_deposit_intent(&username, tee.public_key()).unwrap();
                        ledger.seed_deposit(DepositEvent {
                            idx: i + 1,
                            from: [i as u8; 20],
                            rand_key: intent.rand,
                            to_user: intent.user,
                            amount: U256::from(100_000_000u64),
                            block_number: i + 1,
                            removed: false,
                        });
                    }
                    ledger
                },
                |ledger| {
                    let manager = ManagerService::new(ledger.clone());
                    let request = BatchRequest {
                        tee_private_key: *tee.private_key(),
                        user_master_key: [0x33u8; 32],
                        transfers: vec![],
                        payouts: vec![],
                        scan_budget: ScanBudget::default(),
                    };
                    rt.block_on(manager.run_batch(request)).unwrap()
                },
                criterion::BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_chaff_selection,
    bench_leaf_order_shuffle,
    bench_run_batch_fresh_registrations,
);
criterion_main!(benches);

//! # LitGhost Enclave Runtime
//!
//! The composition root for the stateless manager (spec §4.6): wires a
//! ledger gateway, an event bus, and [`ManagerService`] into a running
//! batch-assembly loop.
//!
//! This binary ships an in-memory ledger gateway ([`ledger_manager::testing::InMemoryLedger`])
//! rather than a concrete chain-RPC adapter — no on-chain contract
//! implementation is part of this system's scope (spec Non-goals), so
//! there is nothing for a real adapter to bind to yet. Swapping in one
//! later only touches [`run`]'s construction of `gateway`.

mod config;

use std::sync::Arc;

use anyhow::Result;
use ledger_bus::{EventPublisher, LedgerEvent, LedgerEventBus};
use ledger_manager::testing::InMemoryLedger;
use ledger_manager::{BatchRequest, ManagerApi, ManagerService};
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use config::RuntimeConfig;

async fn run_cycle(
    manager: &ManagerService<InMemoryLedger>,
    ledger: &InMemoryLedger,
    bus: &LedgerEventBus,
    config: &RuntimeConfig,
) -> Result<()> {
    let request = BatchRequest {
        tee_private_key: config.secrets.tee_private_key,
        user_master_key: config.secrets.user_master_key,
        transfers: vec![],
        payouts: vec![],
        scan_budget: config.scan_budget,
    };

    let Some((batch, skipped)) = manager.run_batch(request).await? else {
        return Ok(());
    };

    for op in &skipped {
        warn!(kind = ?op.kind, reason = %op.reason, "operation skipped this cycle");
    }

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

    info!(
        op_start = batch.op_start,
        op_count = batch.op_count,
        leaves = batch.updates.len(),
        new_users = batch.new_users.len(),
        payouts = batch.payouts.len(),
        "cycle complete, batch applied"
    );

    Ok(())
}

async fn run(config: RuntimeConfig) -> Result<()> {
    let ledger = Arc::new(InMemoryLedger::new(0));
    let bus = Arc::new(LedgerEventBus::with_capacity(config.bus_capacity));
    let manager = ManagerService::new(ledger.clone());

    info!(interval = ?config.cycle.interval, "batch-assembly loop starting");

    loop {
        if let Err(err) = run_cycle(&manager, &ledger, &bus, &config).await {
            error!(%err, "batch cycle failed, will retry next interval");
        }

        tokio::select! {
            () = tokio::time::sleep(config.cycle.interval) => {}
            _ = tokio::signal::ctrl_c() => {
                info!("shutdown requested, exiting cleanly");
                return Ok(());
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("===========================================");
    info!("  LitGhost Enclave Runtime v0.1.0");
    info!("===========================================");

    let config = RuntimeConfig::from_env();
    config.validate_for_production();

    run(config).await
}

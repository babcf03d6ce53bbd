//! # Deposit Event Scanning (4.6.1)

use ledger_crypto::deposit::open_deposit_intent;
use ledger_types::{Address, DepositEvent, DepositIntent, PrivateKey};
use primitive_types::U256;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::errors::ManagerError;
use crate::ports::inbound::ScanBudget;
use crate::ports::outbound::LedgerGateway;

/// Block range fetched per `getOpDeposit` query.
const SCAN_CHUNK_BLOCKS: u64 = 2_000;

/// A deposit whose recipient was successfully unblinded.
#[derive(Clone, Debug)]
pub struct UnblindedDeposit {
    /// The raw on-chain event.
    pub event: DepositEvent,
    /// The recipient's username, recovered via C3.
    pub username: String,
}

/// A deposit that could not be credited (corrupt intent or bad username);
/// the depositor is refunded in full.
#[derive(Clone, Debug)]
pub struct InvalidDeposit {
    /// The depositor's on-chain address.
    pub from: Address,
    /// The deposited amount, full on-chain decimals.
    pub amount: U256,
}

/// Outcome of one deposit-scan pass.
#[derive(Clone, Debug, Default)]
pub struct ScanOutcome {
    /// Deposits that unblinded successfully.
    pub deposits: Vec<UnblindedDeposit>,
    /// Deposits that did not and will be auto-refunded.
    pub invalid: Vec<InvalidDeposit>,
    /// The block the next invocation should resume scanning from.
    pub next_block: u64,
}

/// Scan `OpDeposit` events from `last_processed_block + 1` onward, honoring
/// the scan budget, and unblind each recipient.
///
/// Reference: spec §4.6.1.
pub async fn scan_deposits(
    gateway: &dyn LedgerGateway,
    tee_private_key: &PrivateKey,
    last_processed_block: u64,
    processed_ops: u64,
    budget: ScanBudget,
) -> Result<ScanOutcome, ManagerError> {
    let latest = gateway
        .latest_block()
        .await
        .map_err(ManagerError::LedgerUnavailable)?;

    let deadline = Instant::now() + budget.time_budget;
    let mut outcome = ScanOutcome {
        next_block: last_processed_block,
        ..ScanOutcome::default()
    };

    let mut from_block = last_processed_block.saturating_add(1);

    while from_block <= latest {
        if Instant::now() >= deadline {
            debug!(from_block, "deposit scan stopped: time budget exhausted");
            break;
        }

        let to_block = from_block
            .saturating_add(SCAN_CHUNK_BLOCKS - 1)
            .min(latest);

        let events = gateway
            .get_deposit_events(from_block, to_block)
            .await
            .map_err(ManagerError::LedgerUnavailable)?;

        let mut cap_hit_at_block = None;

        for event in events {
            if event.removed || event.idx <= processed_ops {
                continue;
            }

            let total = outcome.deposits.len() + outcome.invalid.len();
            if total >= budget.deposit_cap {
                cap_hit_at_block = Some(event.block_number);
                break;
            }

            let intent = DepositIntent {
                rand: event.rand_key,
                user: event.to_user,
            };

            match open_deposit_intent(&intent, tee_private_key) {
                Ok(username) => outcome.deposits.push(UnblindedDeposit { event, username }),
                Err(reason) => {
                    warn!(from = ?event.from, %reason, "deposit intent could not be opened, auto-refunding");
                    outcome.invalid.push(InvalidDeposit {
                        from: event.from,
                        amount: event.amount,
                    });
                }
            }
        }

        if let Some(block) = cap_hit_at_block {
            // Leave the cursor on the block with unprocessed deposits so
            // the next invocation rescans it in full.
            outcome.next_block = block.saturating_sub(1).max(last_processed_block);
            return Ok(outcome);
        }

        outcome.next_block = to_block;
        from_block = to_block.saturating_add(1);
    }

    Ok(outcome)
}

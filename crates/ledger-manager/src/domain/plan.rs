//! # Delta Computation & Payout Processing (4.6.2, 4.6.3)
//!
//! Applies deposits, then transfers, then payouts against a running
//! in-memory balance map, in the order spec §4.6 prescribes. Usernames
//! first touched in this pass (not present in the caller-supplied
//! `existing_balances`) are new registrations (§4.6.7): their order of
//! first touch becomes `newUsers[]`'s assignment order.

use ledger_crypto::deposit::validate_username;
use ledger_types::{Address, OpKind, Payout, PayoutRequest, SkippedOp, TransferRequest, MAX_BALANCE};
use primitive_types::U256;
use std::collections::HashMap;

use super::scale::{to_cents, to_full_decimals};

/// A deposit credited to a username, already unblinded and scaled to
/// internal cents.
#[derive(Clone, Debug)]
pub struct CreditedDeposit {
    /// The recipient's username.
    pub username: String,
    /// Credited amount, internal cents.
    pub amount_cents: u32,
    /// The depositor's address, for an overflow refund.
    pub depositor: Address,
}

/// The result of applying one batch's deposits, transfers, and payouts.
#[derive(Clone, Debug, Default)]
pub struct PlanResult {
    /// Final balance (internal cents) for every username touched.
    pub balances: HashMap<String, u32>,
    /// Usernames first touched in this batch, in first-touch order —
    /// these need a global index assigned.
    pub new_users: Vec<String>,
    /// Payouts to submit (explicit withdrawals + overflow refunds).
    pub payouts: Vec<Payout>,
    /// Operations the manager declined to apply.
    pub skipped: Vec<SkippedOp>,
}

fn touch(
    balances: &mut HashMap<String, u32>,
    new_users: &mut Vec<String>,
    username: &str,
) {
    if !balances.contains_key(username) {
        balances.insert(username.to_string(), 0);
        new_users.push(username.to_string());
    }
}

/// Build a plan from proposed deposits, transfers, and payouts.
///
/// `existing_balances` must contain an entry for every username already
/// registered on-chain, with its current decrypted balance; a username
/// absent from this map is treated as unregistered.
pub fn build_plan(
    deposits: &[CreditedDeposit],
    transfers: &[TransferRequest],
    payouts: &[PayoutRequest],
    existing_balances: &HashMap<String, u32>,
) -> PlanResult {
    let mut result = PlanResult {
        balances: existing_balances.clone(),
        ..PlanResult::default()
    };

    // §4.6.2 — deposits.
    for deposit in deposits {
        touch(&mut result.balances, &mut result.new_users, &deposit.username);
        let balance = result.balances.get_mut(&deposit.username).expect("just touched");
        let headroom = MAX_BALANCE - *balance;
        if deposit.amount_cents <= headroom {
            *balance += deposit.amount_cents;
        } else {
            let excess = deposit.amount_cents - headroom;
            *balance = MAX_BALANCE;
            result.payouts.push(Payout {
                to_who: deposit.depositor,
                amount: to_full_decimals(excess),
            });
        }
    }

    // §4.6.2 — internal transfers.
    for transfer in transfers {
        if validate_username(&transfer.from).is_err() {
            result.skipped.push(SkippedOp {
                kind: OpKind::Transfer,
                reason: "invalid sender username".into(),
                details: format!("from={}", transfer.from),
            });
            continue;
        }
        if validate_username(&transfer.to).is_err() {
            result.skipped.push(SkippedOp {
                kind: OpKind::Transfer,
                reason: "invalid recipient username".into(),
                details: format!("to={}", transfer.to),
            });
            continue;
        }

        let available = result.balances.get(&transfer.from).copied().unwrap_or(0);
        let recipient_headroom = MAX_BALANCE - result.balances.get(&transfer.to).copied().unwrap_or(0);
        let amount = transfer.amount.min(available).min(recipient_headroom);

        if amount == 0 {
            result.skipped.push(SkippedOp {
                kind: OpKind::Transfer,
                reason: "zero transferable amount".into(),
                details: format!(
                    "from={} to={} requested={}",
                    transfer.from, transfer.to, transfer.amount
                ),
            });
            continue;
        }

        touch(&mut result.balances, &mut result.new_users, &transfer.from);
        touch(&mut result.balances, &mut result.new_users, &transfer.to);

        *result.balances.get_mut(&transfer.from).expect("touched") -= amount;
        *result.balances.get_mut(&transfer.to).expect("touched") += amount;
    }

    // §4.6.3 — payouts.
    for payout in payouts {
        if payout.username.is_empty() {
            result.payouts.push(Payout {
                to_who: payout.to_address,
                amount: payout.amount_full_decimals,
            });
            continue;
        }

        if validate_username(&payout.username).is_err() {
            result.skipped.push(SkippedOp {
                kind: OpKind::Payout,
                reason: "invalid username".into(),
                details: format!("username={}", payout.username),
            });
            continue;
        }

        let amount_cents = to_cents(payout.amount_full_decimals);
        let current = result.balances.get(&payout.username).copied().unwrap_or(0);
        if amount_cents > current {
            result.skipped.push(SkippedOp {
                kind: OpKind::Payout,
                reason: "insufficient balance".into(),
                details: format!(
                    "username={} requested_cents={} available_cents={}",
                    payout.username, amount_cents, current
                ),
            });
            continue;
        }

        touch(&mut result.balances, &mut result.new_users, &payout.username);

        *result.balances.get_mut(&payout.username).expect("touched") -= amount_cents;
        result.payouts.push(Payout {
            to_who: payout.to_address,
            amount: payout.amount_full_decimals,
        });
    }

    result
}

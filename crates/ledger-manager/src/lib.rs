//! # Ledger Manager — Stateless Batch-Assembly Engine (C6)
//!
//! The TEE-resident core: given the ledger's current on-chain counters, a
//! window of unprocessed `OpDeposit` events, and a caller-proposed set of
//! transfers and payouts, assembles one fully re-encrypted, transcript-bound
//! [`UpdateBatch`] ready for submission.
//!
//! Reference: spec §4.6, §5 (no state is kept across invocations — every
//! [`service::ManagerService::run_batch`] call re-derives everything it
//! needs from the gateway).
//!
//! | Module | Spec section |
//! |--------|--------------|
//! | `domain::scan` | §4.6.1 deposit scanning |
//! | `domain::plan` | §4.6.2, §4.6.3 delta computation and payouts |
//! | `domain::chaff` | §4.6.4 chaff leaf selection |
//! | `domain::shuffle` | §4.6.5 leaf order shuffle |
//! | `domain::reencrypt` | §4.6.6 full-leaf re-encryption |
//! | `service` | end-to-end orchestration against a [`ports::outbound::LedgerGateway`] |

#![warn(missing_docs)]

pub mod domain;
pub mod errors;
pub mod ports;
pub mod service;
pub mod testing;

pub use errors::ManagerError;
pub use ports::inbound::{BatchRequest, ManagerApi, ScanBudget};
pub use ports::outbound::LedgerGateway;
pub use service::ManagerService;

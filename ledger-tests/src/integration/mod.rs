//! End-to-end scenarios driving the full deposit → plan → chaff → shuffle
//! → reencrypt → seal pipeline against an in-memory ledger.

mod client_watch;
mod scenarios;

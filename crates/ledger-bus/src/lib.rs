//! # Ledger Bus — Event Stream Primitives
//!
//! A broadcast-based pub/sub bus carrying `LeafChanged` and `Deposit`
//! events from the enclave's scan loop to the user client's live balance
//! watch.
//!
//! Reference: spec §4.7 (`watch_balance`).

pub mod events;
pub mod publisher;
pub mod subscriber;

pub use events::{EventFilter, EventTopic, LedgerEvent};
pub use publisher::{EventPublisher, LedgerEventBus};
pub use subscriber::{EventStream, Subscription, SubscriptionError};

/// Events to buffer per subscriber before the slowest consumer starts
/// lagging and dropping events.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;

//! # Ledger Events
//!
//! The events a running enclave emits as it scans the chain and seals
//! batches, carried over the bus for the user client's live balance watch.

use ledger_types::{DepositEvent, LeafChangeEvent};

/// All events that can be published to the ledger bus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerEvent {
    /// A leaf was rewritten by a sealed batch.
    LeafChanged(LeafChangeEvent),
    /// A deposit was observed on-chain (pre-credit, for indexers/UIs).
    Deposit(DepositEvent),
}

impl LedgerEvent {
    /// The topic this event belongs to, for subscription filtering.
    #[must_use]
    pub fn topic(&self) -> EventTopic {
        match self {
            Self::LeafChanged(_) => EventTopic::LeafChange,
            Self::Deposit(_) => EventTopic::Deposit,
        }
    }

    /// The leaf index this event pertains to, if any.
    ///
    /// `None` for deposit events: a deposit is only tied to a leaf once the
    /// enclave assigns the recipient a user index, which happens at batch
    /// sealing, not at deposit time.
    #[must_use]
    pub fn leaf_idx(&self) -> Option<u32> {
        match self {
            Self::LeafChanged(event) => Some(event.leaf_idx),
            Self::Deposit(_) => None,
        }
    }
}

/// Event topics for subscription filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventTopic {
    /// `LeafChanged` events.
    LeafChange,
    /// `Deposit` events.
    Deposit,
    /// All events (no filtering).
    All,
}

/// Filter for subscribing to a subset of bus events.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Topics to include. Empty means all topics.
    pub topics: Vec<EventTopic>,
    /// Restrict to a single leaf index. `None` means all leaves.
    pub leaf_idx: Option<u32>,
}

impl EventFilter {
    /// A filter that accepts every event on the bus.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// A filter scoped to a single leaf's `LeafChanged` events, the shape
    /// `UserClient::watch_balance` subscribes with.
    #[must_use]
    pub fn for_leaf(leaf_idx: u32) -> Self {
        Self {
            topics: vec![EventTopic::LeafChange],
            leaf_idx: Some(leaf_idx),
        }
    }

    /// Whether `event` matches this filter.
    #[must_use]
    pub fn matches(&self, event: &LedgerEvent) -> bool {
        let topic_match = self.topics.is_empty()
            || self.topics.contains(&EventTopic::All)
            || self.topics.contains(&event.topic());

        let leaf_match = match self.leaf_idx {
            Some(wanted) => event.leaf_idx() == Some(wanted),
            None => true,
        };

        topic_match && leaf_match
    }
}

//! # Event Publisher
//!
//! The publishing side of the ledger bus.

use crate::events::{EventFilter, LedgerEvent};
use crate::subscriber::{EventStream, Subscription};
use crate::DEFAULT_CHANNEL_CAPACITY;
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Trait for publishing events to the bus. Implemented by whatever drives
/// the enclave's scan loop (`enclave-runtime`'s wiring).
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish an event, returning the number of live subscribers it reached.
    async fn publish(&self, event: LedgerEvent) -> usize;

    /// Total events published over this bus's lifetime.
    fn events_published(&self) -> u64;
}

/// In-memory, single-process ledger event bus.
///
/// Built on `tokio::sync::broadcast`: every subscriber sees every event
/// matching its filter, independent of how many other subscribers exist.
pub struct LedgerEventBus {
    sender: broadcast::Sender<LedgerEvent>,
    live_subscribers: Arc<AtomicUsize>,
    events_published: AtomicU64,
    capacity: usize,
}

impl LedgerEventBus {
    /// Create a bus with the default channel capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Create a bus with an explicit channel capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            live_subscribers: Arc::new(AtomicUsize::new(0)),
            events_published: AtomicU64::new(0),
            capacity,
        }
    }

    /// Subscribe to events matching `filter`.
    #[must_use]
    pub fn subscribe(&self, filter: EventFilter) -> Subscription {
        let receiver = self.sender.subscribe();
        debug!(topics = ?filter.topics, leaf_idx = ?filter.leaf_idx, "new subscription");
        Subscription::new(receiver, filter, self.live_subscribers.clone())
    }

    /// Subscribe and wrap the result as a `Stream`.
    #[must_use]
    pub fn event_stream(&self, filter: EventFilter) -> EventStream {
        EventStream::new(self.subscribe(filter))
    }

    /// Number of subscriptions currently alive.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.live_subscribers.load(Ordering::SeqCst)
    }

    /// The channel capacity this bus was built with.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for LedgerEventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventPublisher for LedgerEventBus {
    async fn publish(&self, event: LedgerEvent) -> usize {
        let topic = event.topic();
        self.events_published.fetch_add(1, Ordering::Relaxed);

        match self.sender.send(event) {
            Ok(receivers) => {
                debug!(?topic, receivers, "event published");
                receivers
            }
            Err(_) => {
                warn!(?topic, "event dropped, no receivers");
                0
            }
        }
    }

    fn events_published(&self) -> u64 {
        self.events_published.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledger_types::{Leaf, LeafChangeEvent};

    fn leaf_event(leaf_idx: u32) -> LedgerEvent {
        LedgerEvent::LeafChanged(LeafChangeEvent {
            leaf_idx,
            leaf: Leaf::empty(leaf_idx),
            block_number: 1,
            tx_hash: [0u8; 32],
        })
    }

    #[tokio::test]
    async fn publish_with_no_subscribers_counts_but_reaches_none() {
        let bus = LedgerEventBus::new();
        let receivers = bus.publish(leaf_event(0)).await;
        assert_eq!(receivers, 0);
        assert_eq!(bus.events_published(), 1);
    }

    #[tokio::test]
    async fn publish_reaches_matching_subscriber() {
        let bus = LedgerEventBus::new();
        let _sub = bus.subscribe(EventFilter::all());
        let receivers = bus.publish(leaf_event(0)).await;
        assert_eq!(receivers, 1);
    }

    #[tokio::test]
    async fn custom_capacity_is_reported() {
        let bus = LedgerEventBus::with_capacity(64);
        assert_eq!(bus.capacity(), 64);
    }
}

//! # Event Subscriber
//!
//! The subscription side of the ledger bus.

use crate::events::{EventFilter, LedgerEvent};
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use thiserror::Error;
use tokio::sync::broadcast;
use tokio_stream::Stream;
use tracing::debug;

/// Errors from subscription operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubscriptionError {
    /// The event bus was closed.
    #[error("event bus closed")]
    Closed,
}

/// A subscription handle for receiving ledger events.
///
/// When dropped, the subscription's slot against the bus's live count is
/// released.
pub struct Subscription {
    receiver: broadcast::Receiver<LedgerEvent>,
    filter: EventFilter,
    live_count: Arc<AtomicUsize>,
}

impl Subscription {
    pub(crate) fn new(
        receiver: broadcast::Receiver<LedgerEvent>,
        filter: EventFilter,
        live_count: Arc<AtomicUsize>,
    ) -> Self {
        live_count.fetch_add(1, Ordering::SeqCst);
        Self {
            receiver,
            filter,
            live_count,
        }
    }

    /// Receive the next event that matches the filter, blocking until one
    /// arrives.
    ///
    /// Returns `None` once the publisher side has been dropped.
    pub async fn recv(&mut self) -> Option<LedgerEvent> {
        loop {
            let event = match self.receiver.recv().await {
                Ok(event) => event,
                Err(broadcast::error::RecvError::Closed) => return None,
                Err(broadcast::error::RecvError::Lagged(count)) => {
                    debug!(lagged = count, "subscriber lagged, events dropped");
                    continue;
                }
            };

            if self.filter.matches(&event) {
                return Some(event);
            }
        }
    }

    /// Try to receive the next matching event without blocking.
    pub fn try_recv(&mut self) -> Result<Option<LedgerEvent>, SubscriptionError> {
        loop {
            let event = match self.receiver.try_recv() {
                Ok(event) => event,
                Err(broadcast::error::TryRecvError::Empty) => return Ok(None),
                Err(broadcast::error::TryRecvError::Closed) => {
                    return Err(SubscriptionError::Closed)
                }
                Err(broadcast::error::TryRecvError::Lagged(count)) => {
                    debug!(lagged = count, "subscriber lagged, events dropped");
                    continue;
                }
            };

            if self.filter.matches(&event) {
                return Ok(Some(event));
            }
        }
    }

    /// The filter this subscription was created with.
    #[must_use]
    pub fn filter(&self) -> &EventFilter {
        &self.filter
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.live_count.fetch_sub(1, Ordering::SeqCst);
    }
}

/// A `Stream` wrapper over a `Subscription`.
pub struct EventStream {
    subscription: Subscription,
}

impl EventStream {
    /// Wrap a subscription as a stream.
    #[must_use]
    pub fn new(subscription: Subscription) -> Self {
        Self { subscription }
    }

    /// The filter this stream was created with.
    #[must_use]
    pub fn filter(&self) -> &EventFilter {
        self.subscription.filter()
    }
}

impl Stream for EventStream {
    type Item = LedgerEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        match self.subscription.try_recv() {
            Ok(Some(event)) => Poll::Ready(Some(event)),
            Ok(None) => {
                cx.waker().wake_by_ref();
                Poll::Pending
            }
            Err(SubscriptionError::Closed) => Poll::Ready(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::publisher::{EventPublisher, LedgerEventBus};
    use ledger_types::{DepositEvent, Leaf, LeafChangeEvent};
    use std::time::Duration;
    use tokio::time::timeout;

    fn leaf_event(leaf_idx: u32) -> LedgerEvent {
        LedgerEvent::LeafChanged(LeafChangeEvent {
            leaf_idx,
            leaf: Leaf::empty(leaf_idx),
            block_number: 1,
            tx_hash: [0u8; 32],
        })
    }

    #[tokio::test]
    async fn subscription_recv_delivers_matching_events() {
        let bus = LedgerEventBus::new();
        let mut sub = bus.subscribe(EventFilter::for_leaf(2));

        bus.publish(leaf_event(1)).await;
        bus.publish(leaf_event(2)).await;

        let received = timeout(Duration::from_millis(100), sub.recv())
            .await
            .expect("timeout")
            .expect("event");

        match received {
            LedgerEvent::LeafChanged(event) => assert_eq!(event.leaf_idx, 2),
            _ => panic!("unexpected event"),
        }
    }

    #[tokio::test]
    async fn subscription_drop_releases_live_count() {
        let bus = LedgerEventBus::new();
        {
            let _sub1 = bus.subscribe(EventFilter::all());
            let _sub2 = bus.subscribe(EventFilter::all());
            assert_eq!(bus.subscriber_count(), 2);
        }
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn try_recv_is_non_blocking() {
        let bus = LedgerEventBus::new();
        let mut sub = bus.subscribe(EventFilter::all());
        assert!(matches!(sub.try_recv(), Ok(None)));

        bus.publish(LedgerEvent::Deposit(DepositEvent {
            idx: 0,
            from: [0u8; 20],
            rand_key: [0u8; 32],
            to_user: [0u8; 32],
            amount: primitive_types::U256::zero(),
            block_number: 1,
            removed: false,
        }))
        .await;

        assert!(matches!(sub.try_recv(), Ok(Some(LedgerEvent::Deposit(_)))));
    }
}

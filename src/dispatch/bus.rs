//! Event bus fan-out.
//!
//! One publisher, any number of independent subscribers. Publishing never
//! blocks and never fails because of a subscriber: a subscriber that lags or
//! drops its handle only affects itself.

// ============================================================================
// Imports
// ============================================================================

use futures_util::Stream;
use futures_util::stream;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tracing::{trace, warn};

use crate::protocol::{Event, StreamType};

// ============================================================================
// Constants
// ============================================================================

/// Default number of events buffered per subscriber.
pub const DEFAULT_EVENT_CAPACITY: usize = 1024;

// ============================================================================
// EventBus
// ============================================================================

/// Publish/subscribe channel for classified events.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<Event>,
}

impl EventBus {
    /// Creates a bus buffering up to `capacity` events per subscriber.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publishes an event to every current subscriber.
    ///
    /// Returns the number of subscribers the event was queued for.
    pub fn publish(&self, event: Event) -> usize {
        let stream_type = event.stream_type.clone();
        let receivers = self.sender.send(event).unwrap_or_default();
        trace!(%stream_type, receivers, "Event published");
        receivers
    }

    /// Creates a new subscription.
    ///
    /// The subscription sees events published after this call.
    #[must_use]
    pub fn subscribe(&self) -> Subscription {
        Subscription {
            receiver: self.sender.subscribe(),
        }
    }

    /// Returns the number of live subscriptions.
    #[inline]
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}

// ============================================================================
// Subscription
// ============================================================================

/// Handle to a stream of events.
///
/// Dropping the handle unsubscribes; nothing further is buffered for it.
#[derive(Debug)]
pub struct Subscription {
    receiver: broadcast::Receiver<Event>,
}

impl Subscription {
    /// Receives the next event.
    ///
    /// Skips events lost to lag. Returns `None` once the bus is gone.
    pub async fn recv(&mut self) -> Option<Event> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Subscriber lagged, events dropped");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Receives the next event of the given type.
    pub async fn recv_type(&mut self, stream_type: &StreamType) -> Option<Event> {
        loop {
            let event = self.recv().await?;
            if event.is(stream_type) {
                return Some(event);
            }
        }
    }

    /// Returns the next buffered event without waiting.
    pub fn try_recv(&mut self) -> Option<Event> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => return Some(event),
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    warn!(skipped, "Subscriber lagged, events dropped");
                }
                Err(_) => return None,
            }
        }
    }

    /// Converts the subscription into a [`Stream`] of events.
    pub fn into_stream(self) -> impl Stream<Item = Event> + Send + 'static {
        stream::unfold(self, |mut subscription| async move {
            subscription.recv().await.map(|event| (event, subscription))
        })
    }
}

// ============================================================================
// Tests
// ============================================================================

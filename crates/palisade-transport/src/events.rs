//! Typed wallet events over an explicit broadcast channel.
//!
//! Consumers subscribe and receive [`WalletEvent`]s; dropping the
//! [`Subscription`] handle unsubscribes — there is no callback
//! registry to forget to clean up, and no listener can outlive its
//! owner by accident.

use palisade_types::WalletEvent;
use tokio::sync::broadcast;

/// Default capacity of the event channel.
const DEFAULT_CAPACITY: usize = 64;

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Publish side of the wallet event channel.
///
/// Cheap to clone; all clones publish into the same channel.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<WalletEvent>,
}

impl EventBus {
    /// Creates a bus with the default capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Creates a bus holding at most `capacity` undelivered events per
    /// subscriber before older ones are dropped.
    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Publishes an event to all current subscribers.
    ///
    /// An event with no subscribers is simply dropped; publishing
    /// never blocks and never fails.
    pub fn publish(&self, event: WalletEvent) {
        let _ = self.tx.send(event);
    }

    /// Opens a new subscription. Only events published after this
    /// call are delivered.
    pub fn subscribe(&self) -> Subscription {
        Subscription {
            rx: self.tx.subscribe(),
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Subscription
// ---------------------------------------------------------------------------

/// Receive side of the wallet event channel.
///
/// Dropping this handle unsubscribes.
pub struct Subscription {
    rx: broadcast::Receiver<WalletEvent>,
}

impl Subscription {
    /// Waits for the next event.
    ///
    /// Returns `None` once the bus (every publish handle) has been
    /// dropped. A slow subscriber that missed events skips them and
    /// continues with the oldest still-buffered event.
    pub async fn next(&mut self) -> Option<WalletEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    tracing::warn!(missed, "event subscriber lagged; skipping");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

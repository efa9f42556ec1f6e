//! Change Notifier
//!
//! Holds the latest table snapshot and pushes every new one to registered
//! observers.
//!
//! ## Semantics
//! - **Replay-latest**: `subscribe()` queues the current snapshot on the new
//!   subscription before anything else, so a late subscriber always starts
//!   with data
//! - **In-order delivery**: observers receive pushes in the order they were
//!   published, each observer exactly once per publish, observers served in
//!   registration order
//! - **No buffering while idle**: with no observers a publish only replaces
//!   the latest snapshot
//! - **Monotonic**: a publish older than the latest snapshot re-delivers the
//!   latest, so no observer ever steps back to an older view
//!
//! Registration and publication share one lock, so a subscriber sees either
//! the replay or the push of any given snapshot, never a gap.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use parking_lot::Mutex;

use crate::model::Snapshot;

/// Identifies one subscription for `unsubscribe`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// Whether anyone is listening
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifierState {
    /// No observers; publishes are not delivered anywhere
    Idle,
    /// At least one observer
    Active,
}

struct Observer {
    id: SubscriptionId,
    sender: Sender<Snapshot>,
}

struct Inner {
    latest: Snapshot,
    /// Registration order
    observers: Vec<Observer>,
}

/// Tracks the latest snapshot and fans it out to subscribers
pub struct ChangeNotifier {
    inner: Mutex<Inner>,
    next_id: AtomicU64,
}

impl ChangeNotifier {
    /// Create an idle notifier whose latest snapshot is `initial`
    pub fn new(initial: Snapshot) -> Self {
        Self {
            inner: Mutex::new(Inner {
                latest: initial,
                observers: Vec::new(),
            }),
            next_id: AtomicU64::new(1),
        }
    }

    /// Register an observer; the latest snapshot is queued on it immediately
    pub fn subscribe(&self) -> Subscription {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let (sender, receiver) = channel::unbounded();

        let mut inner = self.inner.lock();
        // The receiver is alive, so this cannot fail
        let _ = sender.send(inner.latest.clone());
        inner.observers.push(Observer { id, sender });
        tracing::debug!(%id, observers = inner.observers.len(), "Subscribed");

        Subscription { id, receiver }
    }

    /// Remove an observer. Returns `false` if it was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut inner = self.inner.lock();
        let before = inner.observers.len();
        inner.observers.retain(|observer| observer.id != id);
        let removed = inner.observers.len() < before;
        if removed {
            tracing::debug!(%id, observers = inner.observers.len(), "Unsubscribed");
        }
        removed
    }

    /// Record `snapshot` as latest and push it to every observer
    ///
    /// Observers whose `Subscription` was dropped are pruned here.
    pub fn publish(&self, snapshot: Snapshot) {
        let mut inner = self.inner.lock();

        if snapshot.version() >= inner.latest.version() {
            inner.latest = snapshot;
        }

        if inner.observers.is_empty() {
            tracing::trace!(version = inner.latest.version(), "No observers, push dropped");
            return;
        }

        let latest = inner.latest.clone();
        inner.observers.retain(|observer| {
            let delivered = observer.sender.send(latest.clone()).is_ok();
            if !delivered {
                tracing::debug!(id = %observer.id, "Pruning disconnected observer");
            }
            delivered
        });
    }

    /// The most recent snapshot
    pub fn latest(&self) -> Snapshot {
        self.inner.lock().latest.clone()
    }

    pub fn state(&self) -> NotifierState {
        if self.inner.lock().observers.is_empty() {
            NotifierState::Idle
        } else {
            NotifierState::Active
        }
    }

    pub fn observer_count(&self) -> usize {
        self.inner.lock().observers.len()
    }
}

/// Receiving end of a subscription
///
/// Dropping it is enough to stop deliveries; `unsubscribe` with its `id()`
/// does the same eagerly.
pub struct Subscription {
    id: SubscriptionId,
    receiver: Receiver<Snapshot>,
}

impl Subscription {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Block until the next snapshot arrives
    ///
    /// Returns `None` once the subscription is unsubscribed (or the notifier
    /// dropped) and every queued snapshot has been taken.
    pub fn recv(&self) -> Option<Snapshot> {
        self.receiver.recv().ok()
    }

    /// Next queued snapshot, without blocking
    pub fn try_recv(&self) -> Option<Snapshot> {
        match self.receiver.try_recv() {
            Ok(snapshot) => Some(snapshot),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Wait up to `timeout` for the next snapshot
    pub fn recv_timeout(&self, timeout: Duration) -> Option<Snapshot> {
        match self.receiver.recv_timeout(timeout) {
            Ok(snapshot) => Some(snapshot),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Drain the queue and return the newest snapshot in it
    pub fn latest(&self) -> Option<Snapshot> {
        self.receiver.try_iter().last()
    }

    /// Number of snapshots waiting to be received
    pub fn pending(&self) -> usize {
        self.receiver.len()
    }
}

impl Iterator for Subscription {
    type Item = Snapshot;

    fn next(&mut self) -> Option<Snapshot> {
        self.recv()
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("pending", &self.receiver.len())
            .finish()
    }
}

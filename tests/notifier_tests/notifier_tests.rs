//! Tests for ChangeNotifier
//!
//! These tests verify:
//! - Replay of the latest snapshot on subscribe
//! - In-order delivery to every observer
//! - Unsubscribe and pruning of dropped subscriptions
//! - Idle/Active state tracking
//! - Stale publishes never move observers backwards

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use wordkv::{ChangeNotifier, Entry, NotifierState, Snapshot};

// =============================================================================
// Helper Functions
// =============================================================================

fn snapshot(version: u64, keys: &[&str]) -> Snapshot {
    Snapshot::from_entries(version, keys.iter().map(|k| Entry::new(*k).unwrap()))
}

// =============================================================================
// Replay Tests
// =============================================================================

#[test]
fn test_subscribe_replays_latest() {
    let notifier = ChangeNotifier::new(snapshot(3, &["cobra", "crocodile", "dolphin"]));

    let sub = notifier.subscribe();

    let first = sub.try_recv().unwrap();
    assert_eq!(first.keys(), vec!["cobra", "crocodile", "dolphin"]);
    assert_eq!(first.version(), 3);
    assert!(sub.try_recv().is_none());
}

#[test]
fn test_late_subscriber_gets_current_not_history() {
    let notifier = ChangeNotifier::new(Snapshot::empty());
    notifier.publish(snapshot(1, &["a"]));
    notifier.publish(snapshot(2, &["a", "b"]));

    let sub = notifier.subscribe();

    assert_eq!(sub.try_recv().unwrap().keys(), vec!["a", "b"]);
    assert_eq!(sub.pending(), 0);
}

// =============================================================================
// Delivery Tests
// =============================================================================

#[test]
fn test_publish_reaches_all_observers_in_order() {
    let notifier = ChangeNotifier::new(Snapshot::empty());
    let first = notifier.subscribe();
    let second = notifier.subscribe();

    notifier.publish(snapshot(1, &["a"]));
    notifier.publish(snapshot(2, &["a", "b"]));

    for sub in [&first, &second] {
        let versions: Vec<u64> = std::iter::from_fn(|| sub.try_recv())
            .map(|s| s.version())
            .collect();
        assert_eq!(versions, vec![0, 1, 2]);
    }
}

#[test]
fn test_subscription_as_iterator() {
    let notifier = ChangeNotifier::new(Snapshot::empty());
    let sub = notifier.subscribe();

    notifier.publish(snapshot(1, &["a"]));
    notifier.publish(snapshot(2, &["a", "b"]));

    let lengths: Vec<usize> = sub.take(3).map(|s| s.len()).collect();
    assert_eq!(lengths, vec![0, 1, 2]);
}

#[test]
fn test_subscription_latest_drains_queue() {
    let notifier = ChangeNotifier::new(Snapshot::empty());
    let sub = notifier.subscribe();

    notifier.publish(snapshot(1, &["x"]));
    notifier.publish(snapshot(2, &["x", "y"]));

    assert_eq!(sub.pending(), 3);
    assert_eq!(sub.latest().unwrap().version(), 2);
    assert_eq!(sub.pending(), 0);
}

#[test]
fn test_idle_publish_updates_latest_only() {
    let notifier = ChangeNotifier::new(Snapshot::empty());

    notifier.publish(snapshot(4, &["z"]));

    assert_eq!(notifier.latest().version(), 4);
    assert_eq!(notifier.state(), NotifierState::Idle);
}

#[test]
fn test_stale_publish_redelivers_latest() {
    let notifier = ChangeNotifier::new(Snapshot::empty());
    let sub = notifier.subscribe();
    let _ = sub.try_recv();

    notifier.publish(snapshot(5, &["new"]));
    notifier.publish(snapshot(4, &["old"]));

    assert_eq!(sub.try_recv().unwrap().version(), 5);
    let redelivered = sub.try_recv().unwrap();
    assert_eq!(redelivered.version(), 5);
    assert_eq!(redelivered.keys(), vec!["new"]);
    assert_eq!(notifier.latest().version(), 5);
}

#[test]
fn test_blocking_receive_across_threads() {
    let notifier = Arc::new(ChangeNotifier::new(Snapshot::empty()));
    let sub = notifier.subscribe();
    let _ = sub.try_recv();

    let publisher = {
        let notifier = Arc::clone(&notifier);
        thread::spawn(move || notifier.publish(snapshot(1, &["from-thread"])))
    };

    let received = sub.recv_timeout(Duration::from_secs(5)).unwrap();
    assert_eq!(received.keys(), vec!["from-thread"]);
    publisher.join().unwrap();
}

// =============================================================================
// Unsubscribe / State Tests
// =============================================================================

#[test]
fn test_state_transitions() {
    let notifier = ChangeNotifier::new(Snapshot::empty());
    assert_eq!(notifier.state(), NotifierState::Idle);

    let sub = notifier.subscribe();
    assert_eq!(notifier.state(), NotifierState::Active);

    assert!(notifier.unsubscribe(sub.id()));
    assert_eq!(notifier.state(), NotifierState::Idle);
}

#[test]
fn test_unsubscribe_stops_delivery() {
    let notifier = ChangeNotifier::new(Snapshot::empty());
    let sub = notifier.subscribe();
    let _ = sub.try_recv();

    notifier.unsubscribe(sub.id());
    notifier.publish(snapshot(1, &["missed"]));

    assert!(sub.try_recv().is_none());
    // Sender is gone, so the blocking receive ends instead of hanging
    assert!(sub.recv().is_none());
}

#[test]
fn test_unsubscribe_unknown_id() {
    let notifier = ChangeNotifier::new(Snapshot::empty());
    let sub = notifier.subscribe();

    assert!(notifier.unsubscribe(sub.id()));
    assert!(!notifier.unsubscribe(sub.id()));
}

#[test]
fn test_dropped_subscription_is_pruned() {
    let notifier = ChangeNotifier::new(Snapshot::empty());
    let kept = notifier.subscribe();
    let dropped = notifier.subscribe();
    assert_eq!(notifier.observer_count(), 2);

    drop(dropped);
    notifier.publish(snapshot(1, &["a"]));

    assert_eq!(notifier.observer_count(), 1);
    assert_eq!(kept.pending(), 2);
}

#[test]
fn test_subscription_ids_are_distinct() {
    let notifier = ChangeNotifier::new(Snapshot::empty());
    let a = notifier.subscribe();
    let b = notifier.subscribe();

    assert_ne!(a.id(), b.id());
    assert!(a.id().to_string().starts_with("sub-"));
}

//! MemTable implementation
//!
//! BTreeSet-based key table with RwLock for concurrency.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::RwLock;

/// Keys plus the LSN of the last mutation applied to them, guarded together
/// so readers always see a matching pair
#[derive(Default)]
struct TableState {
    keys: BTreeSet<String>,
    last_lsn: u64,
}

/// In-memory, ordered set of every live key
///
/// All methods take `&self`; the engine's write lock decides who may mutate,
/// the inner RwLock keeps readers from observing a half-applied change.
pub struct MemTable {
    state: RwLock<TableState>,
    /// Approximate size in bytes (sum of key lengths)
    size: AtomicUsize,
}

impl MemTable {
    /// Create a new empty MemTable
    pub fn new() -> Self {
        Self {
            state: RwLock::new(TableState::default()),
            size: AtomicUsize::new(0),
        }
    }

    /// Build a MemTable from keys loaded off disk
    pub fn from_keys(keys: impl IntoIterator<Item = String>, last_lsn: u64) -> Self {
        let keys: BTreeSet<String> = keys.into_iter().collect();
        let size = keys.iter().map(String::len).sum();
        Self {
            state: RwLock::new(TableState { keys, last_lsn }),
            size: AtomicUsize::new(size),
        }
    }

    /// Check whether a key is present (read lock)
    pub fn contains(&self, key: &str) -> bool {
        self.state.read().keys.contains(key)
    }

    /// Insert a key logged at `lsn` (write lock)
    ///
    /// Returns `false` and leaves the table untouched if the key was
    /// already present.
    pub fn insert(&self, key: String, lsn: u64) -> bool {
        let mut state = self.state.write();
        let len = key.len();
        let inserted = state.keys.insert(key);
        if inserted {
            state.last_lsn = state.last_lsn.max(lsn);
            self.size.fetch_add(len, Ordering::Relaxed);
        }
        inserted
    }

    /// Remove every key as of `lsn`, returning how many were removed
    pub fn clear(&self, lsn: u64) -> usize {
        let mut state = self.state.write();
        let removed = state.keys.len();
        state.keys.clear();
        state.last_lsn = state.last_lsn.max(lsn);
        self.size.store(0, Ordering::Relaxed);
        removed
    }

    /// Get approximate size in bytes
    pub fn size(&self) -> usize {
        self.size.load(Ordering::Relaxed)
    }

    /// Get entry count
    pub fn entry_count(&self) -> usize {
        self.state.read().keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.read().keys.is_empty()
    }

    /// LSN of the last applied mutation
    pub fn last_lsn(&self) -> u64 {
        self.state.read().last_lsn
    }

    /// Copy all keys out in ascending order, with the LSN they reflect
    ///
    /// Taken under a single read lock, so the result is one consistent state.
    pub fn snapshot(&self) -> (u64, Vec<String>) {
        let state = self.state.read();
        (state.last_lsn, state.keys.iter().cloned().collect())
    }
}

impl Default for MemTable {
    fn default() -> Self {
        Self::new()
    }
}

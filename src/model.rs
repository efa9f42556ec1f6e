//! Data Model
//!
//! `Entry` is the only entity the store holds; `Snapshot` is an ordered,
//! immutable view over all entries at one point in time.

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use crate::error::{Result, WordKvError};

/// Longest accepted key, in bytes
pub const MAX_KEY_LEN: usize = 4096;

/// A single unique-key record
///
/// Constructing an `Entry` validates the key, so every `Entry` that exists
/// holds a key the store accepts.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Entry {
    key: String,
}

impl Entry {
    /// Validate `key` and wrap it
    ///
    /// Rejects empty keys, keys longer than [`MAX_KEY_LEN`] bytes and keys
    /// containing control characters.
    pub fn new(key: impl Into<String>) -> Result<Self> {
        let key = key.into();

        if key.is_empty() {
            return Err(WordKvError::InvalidKey("key must not be empty".to_string()));
        }
        if key.len() > MAX_KEY_LEN {
            return Err(WordKvError::InvalidKey(format!(
                "key is {} bytes, limit is {}",
                key.len(),
                MAX_KEY_LEN
            )));
        }
        if key.chars().any(char::is_control) {
            return Err(WordKvError::InvalidKey(
                "key must not contain control characters".to_string(),
            ));
        }

        Ok(Self { key })
    }

    /// Wrap a key that was already validated on its way into storage
    pub(crate) fn from_trusted(key: String) -> Self {
        Self { key }
    }

    /// The key
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn into_key(self) -> String {
        self.key
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key)
    }
}

impl AsRef<str> for Entry {
    fn as_ref(&self) -> &str {
        &self.key
    }
}

/// Ordered, immutable view of the table
///
/// Entries are sorted by key ascending. Cloning is cheap (shared slice), and
/// a snapshot is never mutated after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    /// LSN of the last mutation reflected here (0 = nothing ever written)
    version: u64,
    entries: Arc<[Entry]>,
}

impl Snapshot {
    /// Build a snapshot from entries that are already sorted and unique
    pub(crate) fn from_sorted(version: u64, entries: Vec<Entry>) -> Self {
        debug_assert!(entries.windows(2).all(|w| w[0] < w[1]));
        Self {
            version,
            entries: entries.into(),
        }
    }

    /// Build a snapshot from entries in any order; duplicates collapse
    pub fn from_entries(version: u64, entries: impl IntoIterator<Item = Entry>) -> Self {
        let mut entries: Vec<Entry> = entries.into_iter().collect();
        entries.sort_unstable();
        entries.dedup();
        Self::from_sorted(version, entries)
    }

    /// An empty snapshot at version 0
    pub fn empty() -> Self {
        Self::from_sorted(0, Vec::new())
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Keys in ascending order
    pub fn keys(&self) -> Vec<&str> {
        self.entries.iter().map(Entry::key).collect()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries
            .binary_search_by(|entry| entry.key().cmp(key))
            .is_ok()
    }
}

impl Default for Snapshot {
    fn default() -> Self {
        Self::empty()
    }
}

impl Deref for Snapshot {
    type Target = [Entry];

    fn deref(&self) -> &[Entry] {
        &self.entries
    }
}

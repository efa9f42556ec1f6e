//! Access Layer
//!
//! Typed data-access contract for the table, independent of how the table
//! is stored. Inputs are validated here, before they reach the engine.
//!
//! Every call that changes the table is followed by a fresh
//! `list_ordered()` snapshot handed to the change notifier.

use std::sync::Arc;

use crate::engine::Engine;
use crate::error::Result;
use crate::model::{Entry, Snapshot};
use crate::notifier::ChangeNotifier;

/// Data-access operations over the single table
pub trait EntryAccess: Send + Sync {
    /// Insert an entry; a duplicate key is a silent no-op (`Ok(false)`)
    fn insert(&self, entry: &Entry) -> Result<bool>;

    /// Remove every entry, returning how many were removed
    fn delete_all(&self) -> Result<usize>;

    /// All entries in ascending key order
    fn list_ordered(&self) -> Result<Snapshot>;

    /// Validate a raw key, then insert it
    fn insert_key(&self, key: &str) -> Result<bool> {
        let entry = Entry::new(key)?;
        self.insert(&entry)
    }
}

/// `EntryAccess` backed by the store engine
pub struct EngineAccess {
    engine: Arc<Engine>,
    notifier: Arc<ChangeNotifier>,
}

impl EngineAccess {
    pub fn new(engine: Arc<Engine>, notifier: Arc<ChangeNotifier>) -> Self {
        Self { engine, notifier }
    }

    pub fn engine(&self) -> &Arc<Engine> {
        &self.engine
    }

    fn refresh(&self) -> Result<()> {
        let snapshot = self.list_ordered()?;
        self.notifier.publish(snapshot);
        Ok(())
    }
}

impl EntryAccess for EngineAccess {
    fn insert(&self, entry: &Entry) -> Result<bool> {
        let inserted = self.engine.insert(entry.key())?;
        if inserted {
            self.refresh()?;
        }
        Ok(inserted)
    }

    fn delete_all(&self) -> Result<usize> {
        let removed = self.engine.delete_all()?;
        if removed > 0 {
            self.refresh()?;
        }
        Ok(removed)
    }

    fn list_ordered(&self) -> Result<Snapshot> {
        Ok(self.engine.list_ordered())
    }
}

//! Store Registry
//!
//! Explicit replacement for a process-wide singleton: create one registry at
//! startup, pass it by reference, and ask it for stores. It never opens two
//! stores over the same directory.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::config::Config;
use crate::error::{Result, WordKvError};

use super::WordStore;

/// Shared-instance registry keyed by canonical data directory
#[derive(Default)]
pub struct StoreRegistry {
    stores: RwLock<HashMap<PathBuf, Arc<WordStore>>>,
}

impl StoreRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the store for `config.data_dir`, opening it on first use
    ///
    /// Double-checked: a read-locked lookup serves the common case; opening
    /// happens under the write lock after a second lookup, so concurrent
    /// callers for one directory all get the same instance.
    ///
    /// When the store is already open, `config` is ignored.
    pub fn get_or_open(&self, config: Config) -> Result<Arc<WordStore>> {
        let key = canonical_dir(&config.data_dir)?;

        if let Some(store) = self.stores.read().get(&key) {
            return Ok(Arc::clone(store));
        }

        let mut stores = self.stores.write();
        if let Some(store) = stores.get(&key) {
            return Ok(Arc::clone(store));
        }

        let store = Arc::new(WordStore::open(config)?);
        tracing::info!(data_dir = %key.display(), "Store registered");
        stores.insert(key, Arc::clone(&store));
        Ok(store)
    }

    /// The open store for `path`, if any
    pub fn get(&self, path: &Path) -> Option<Arc<WordStore>> {
        let key = fs::canonicalize(path).ok()?;
        self.stores.read().get(&key).cloned()
    }

    /// Forget the store for `path` and hand it back
    ///
    /// The next `get_or_open` for that directory opens a fresh store, so the
    /// caller must be done with (ideally `close`) the returned one first.
    pub fn release(&self, path: &Path) -> Option<Arc<WordStore>> {
        let key = fs::canonicalize(path).ok()?;
        self.stores.write().remove(&key)
    }

    pub fn open_count(&self) -> usize {
        self.stores.read().len()
    }

    /// Close every store this registry holds the last handle to
    ///
    /// Stores still referenced elsewhere are dropped from the registry and
    /// left to their other owners. Returns the first close error.
    pub fn close_all(&self) -> Result<()> {
        let drained: Vec<_> = self.stores.write().drain().collect();
        let mut first_error = None;

        for (path, store) in drained {
            match Arc::try_unwrap(store) {
                Ok(store) => {
                    if let Err(e) = store.close() {
                        tracing::error!(data_dir = %path.display(), error = %e, "Close failed");
                        first_error.get_or_insert(e);
                    }
                }
                Err(_) => {
                    tracing::warn!(data_dir = %path.display(), "Store still in use, not closed");
                }
            }
        }

        first_error.map_or(Ok(()), Err)
    }
}

/// Create the directory if needed and resolve it to a canonical path
fn canonical_dir(path: &Path) -> Result<PathBuf> {
    fs::create_dir_all(path)
        .and_then(|_| fs::canonicalize(path))
        .map_err(|e| WordKvError::unavailable(path, e))
}

//! Store Facade
//!
//! The single entry point for callers: owns the engine, the change notifier
//! and the background writer for one data directory.
//!
//! ## Responsibilities
//! - Validate keys synchronously, then queue writes off the caller's thread
//! - Expose the current snapshot and subscriptions to it
//! - Apply the configured seed policy once on open
//! - Shut down cleanly (drain queue, checkpoint, sync)
//!
//! `StoreRegistry` hands out one shared `WordStore` per data directory.

mod registry;
mod worker;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::access::{EngineAccess, EntryAccess};
use crate::config::{Config, SeedPolicy};
use crate::engine::Engine;
use crate::error::Result;
use crate::model::{Entry, Snapshot};
use crate::notifier::{ChangeNotifier, NotifierState, Subscription, SubscriptionId};

pub use registry::StoreRegistry;

use worker::{Job, Writer};

/// Observable word store over one data directory
pub struct WordStore {
    data_dir: PathBuf,
    engine: Arc<Engine>,
    notifier: Arc<ChangeNotifier>,
    writer: Writer,
}

impl WordStore {
    /// Open the store, start its writer and queue the seed policy
    ///
    /// Fails with `StorageUnavailable` if the data directory cannot be
    /// opened, or `InvalidKey` if a seed word is not a valid key.
    pub fn open(config: Config) -> Result<Self> {
        let seed_words = match &config.seed_policy {
            SeedPolicy::None => &[][..],
            SeedPolicy::IfEmpty(words) | SeedPolicy::ResetOnOpen(words) => &words[..],
        };
        for word in seed_words {
            Entry::new(word.as_str())?;
        }

        let seed_policy = config.seed_policy.clone();
        let data_dir = config.data_dir.clone();

        let engine = Arc::new(Engine::open(config)?);
        let notifier = Arc::new(ChangeNotifier::new(engine.list_ordered()));
        let access: Arc<dyn EntryAccess> = Arc::new(EngineAccess::new(
            Arc::clone(&engine),
            Arc::clone(&notifier),
        ));

        let writer = Writer::spawn(access)?;
        if seed_policy != SeedPolicy::None {
            writer.submit(Job::Seed(seed_policy))?;
        }

        Ok(Self {
            data_dir,
            engine,
            notifier,
            writer,
        })
    }

    /// Latest published snapshot of the table
    ///
    /// Subscribe to be told when it changes.
    pub fn get_current_words(&self) -> Snapshot {
        self.notifier.latest()
    }

    /// Read the table directly from the engine
    ///
    /// Unlike `get_current_words`, this includes writes applied but not yet
    /// published.
    pub fn list_ordered(&self) -> Snapshot {
        self.engine.list_ordered()
    }

    /// Register an observer; it immediately receives the latest snapshot
    pub fn subscribe(&self) -> Subscription {
        self.notifier.subscribe()
    }

    /// Stop deliveries to a subscription. Returns `false` if it was unknown.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.notifier.unsubscribe(id)
    }

    /// Queue an insert
    ///
    /// The key is validated here (`InvalidKey` comes back synchronously); the
    /// write itself runs on the background writer. Duplicates are ignored.
    pub fn insert(&self, key: &str) -> Result<()> {
        let entry = Entry::new(key)?;
        self.writer.submit(Job::Insert(entry))
    }

    /// Queue removal of every entry
    pub fn delete_all(&self) -> Result<()> {
        self.writer.submit(Job::DeleteAll)
    }

    /// Wait for every write queued before this call to be applied
    ///
    /// Returns the first background write error since the previous `sync`.
    pub fn sync(&self) -> Result<()> {
        self.writer.barrier()
    }

    pub fn notifier_state(&self) -> NotifierState {
        self.notifier.state()
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Drain the write queue, stop the writer, checkpoint and sync
    pub fn close(self) -> Result<()> {
        let WordStore {
            data_dir,
            engine,
            mut writer,
            ..
        } = self;

        writer.shutdown();

        // The writer held the only other engine handle
        match Arc::try_unwrap(engine) {
            Ok(engine) => engine.close(),
            Err(engine) => {
                tracing::warn!(data_dir = %data_dir.display(), "Engine still shared at close");
                engine.checkpoint()
            }
        }
    }
}

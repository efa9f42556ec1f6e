//! Engine Module
//!
//! The store engine that coordinates all durable components.
//!
//! ## Responsibilities
//! - Coordinate WAL, MemTable, and checkpoint storage
//! - Enforce key uniqueness (conflict-ignore inserts)
//! - Handle concurrent read/write access
//! - Checkpoint when the WAL grows past its threshold
//! - Manage crash recovery on startup

use std::fs;
use std::path::Path;

use parking_lot::Mutex;

use crate::config::Config;
use crate::error::{Result, WordKvError};
use crate::memtable::MemTable;
use crate::model::{Entry, Snapshot};
use crate::storage::{DirLock, StorageManager};
use crate::wal::{Operation, WalRecovery, WalWriter};

/// The store engine
///
/// ## Concurrency Model: Single-Writer / Multiple-Reader (SWMR)
///
/// - **Writes** (insert/delete_all/checkpoint): Serialized by `write_lock`
///   - Only ONE write operation at a time
///   - Must acquire: write_lock → membership check → WAL → memtable
///   - The membership check and the insert happen under the same lock, so
///     two racing inserts of one key produce exactly one entry
///
/// - **Reads** (list_ordered/contains): No write_lock needed
///   - MemTable's RwLock gives each read one consistent state, either
///     before or after any concurrent write
pub struct Engine {
    /// Engine configuration
    config: Config,

    /// Write-ahead log for durability (exclusive access needed)
    wal: Mutex<WalWriter>,

    /// In-memory table of live keys (internal RwLock)
    memtable: MemTable,

    /// Checkpoint storage
    storage: StorageManager,

    /// Serializes write operations
    write_lock: Mutex<()>,

    /// Exclusive hold on the data directory, released on drop
    dir_lock: DirLock,
}

impl Engine {
    // =========================================================================
    // Internal Path Constants
    // =========================================================================
    const WAL_FILENAME: &'static str = "wal.log";

    /// Open or create an engine with the given config
    ///
    /// On startup:
    /// 1. Open/create data directory and lock it
    /// 2. Load the checkpoint (rebuilding if its format is foreign)
    /// 3. Replay the WAL on top of it, truncating a damaged tail
    /// 4. Fold recovered entries into a fresh checkpoint
    /// 5. Ready to serve requests
    ///
    /// Any I/O failure here is reported as `StorageUnavailable`, as is a
    /// directory already locked by another engine.
    pub fn open(config: Config) -> Result<Self> {
        let data_dir = config.data_dir.clone();
        Self::open_inner(config).map_err(|e| match e {
            WordKvError::Io(io) => WordKvError::unavailable(&data_dir, io),
            other => other,
        })
    }

    fn open_inner(config: Config) -> Result<Self> {
        // Step 1: Create data directory if it doesn't exist
        fs::create_dir_all(&config.data_dir)?;
        let dir_lock = DirLock::acquire(&config.data_dir)?;
        let wal_path = config.data_dir.join(Self::WAL_FILENAME);

        // Step 2: Load checkpoint
        let storage = StorageManager::open(&config.data_dir)?;
        let checkpoint = match storage.load() {
            Ok(checkpoint) => checkpoint,
            Err(WordKvError::IncompatibleFormat(reason)) if config.destructive_rebuild => {
                tracing::warn!(
                    data_dir = %config.data_dir.display(),
                    %reason,
                    "Incompatible on-disk format, rebuilding empty store"
                );
                storage.wipe()?;
                if wal_path.exists() {
                    fs::remove_file(&wal_path)?;
                }
                None
            }
            Err(WordKvError::IncompatibleFormat(reason)) => {
                return Err(WordKvError::unavailable(&config.data_dir, reason));
            }
            Err(e) => return Err(e),
        };

        let (checkpoint_lsn, keys) = checkpoint
            .map(|cp| (cp.last_lsn, cp.keys))
            .unwrap_or_default();
        let memtable = MemTable::from_keys(keys, checkpoint_lsn);

        // Step 3: Replay WAL entries newer than the checkpoint
        let mut replayed = 0u64;
        let mut wal_dirty = false;
        let mut last_lsn = checkpoint_lsn;

        if wal_path.exists() {
            let (entries, result) = WalRecovery::recover(&wal_path)?;
            wal_dirty = result.entries_recovered > 0 || result.was_truncated;

            for entry in entries {
                last_lsn = last_lsn.max(entry.lsn);
                if entry.lsn <= checkpoint_lsn {
                    continue;
                }
                match entry.operation {
                    Operation::Insert { key } => {
                        memtable.insert(key, entry.lsn);
                    }
                    Operation::DeleteAll => {
                        memtable.clear(entry.lsn);
                    }
                }
                replayed += 1;
            }

            if replayed > 0 || result.entries_corrupted > 0 {
                tracing::info!(
                    recovered = result.entries_recovered,
                    replayed,
                    corrupted = result.entries_corrupted,
                    last_lsn = result.last_lsn,
                    "WAL recovery"
                );
            }
        }

        let mut wal = WalWriter::open_at(&wal_path, config.wal_sync_strategy, last_lsn + 1)?;

        // Step 4: Make recovered state durable in a checkpoint, then truncate
        if wal_dirty {
            let (lsn, keys) = memtable.snapshot();
            storage.write_checkpoint(keys.iter().map(String::as_str), lsn)?;
            wal.truncate()?;
            tracing::debug!(entries = keys.len(), lsn, "Checkpointed recovered state");
        }

        tracing::info!(
            data_dir = %config.data_dir.display(),
            entries = memtable.entry_count(),
            last_lsn,
            "Engine opened"
        );

        Ok(Self {
            config,
            wal: Mutex::new(wal),
            memtable,
            storage,
            write_lock: Mutex::new(()),
            dir_lock,
        })
    }

    /// Open with a path (convenience method)
    ///
    /// Uses default config with the specified data directory
    pub fn open_path(path: &Path) -> Result<Self> {
        let config = Config::builder().data_dir(path).build();
        Self::open(config)
    }

    /// Insert a key unless it is already present
    ///
    /// Returns `true` if the key was added, `false` for a duplicate (nothing
    /// is logged for duplicates).
    ///
    /// Steps:
    /// 1. Acquire write lock
    /// 2. Check membership
    /// 3. Write to WAL (durability)
    /// 4. Write to MemTable
    /// 5. Checkpoint if the WAL is long enough
    pub fn insert(&self, key: &str) -> Result<bool> {
        let _write_guard = self.write_lock.lock();

        if self.memtable.contains(key) {
            tracing::trace!(key, "Duplicate insert ignored");
            return Ok(false);
        }

        let lsn = self.wal.lock().append(Operation::Insert {
            key: key.to_string(),
        })?;

        self.memtable.insert(key.to_string(), lsn);
        tracing::debug!(key, lsn, "Inserted");

        self.maybe_checkpoint();
        Ok(true)
    }

    /// Remove every key, returning how many were removed
    ///
    /// Truncating an empty table logs nothing.
    pub fn delete_all(&self) -> Result<usize> {
        let _write_guard = self.write_lock.lock();

        if self.memtable.is_empty() {
            return Ok(0);
        }

        let lsn = self.wal.lock().append(Operation::DeleteAll)?;
        let removed = self.memtable.clear(lsn);
        tracing::debug!(removed, lsn, "Deleted all entries");

        self.maybe_checkpoint();
        Ok(removed)
    }

    /// All entries in ascending key order
    ///
    /// Reflects every write that completed before the call.
    pub fn list_ordered(&self) -> Snapshot {
        let (lsn, keys) = self.memtable.snapshot();
        let entries = keys.into_iter().map(Entry::from_trusted).collect();
        Snapshot::from_sorted(lsn, entries)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.memtable.contains(key)
    }

    /// Write a checkpoint and truncate the WAL (public API)
    ///
    /// Forces a checkpoint regardless of WAL length
    pub fn checkpoint(&self) -> Result<()> {
        let _write_guard = self.write_lock.lock();
        self.checkpoint_internal()
    }

    /// Internal checkpoint implementation (called with write lock held)
    fn checkpoint_internal(&self) -> Result<()> {
        let (lsn, keys) = self.memtable.snapshot();

        // Step 1: Persist the full table (atomic rename inside)
        let meta = self
            .storage
            .write_checkpoint(keys.iter().map(String::as_str), lsn)?;

        // Step 2: Truncate WAL (entries are now durable in the checkpoint)
        self.wal.lock().truncate()?;

        tracing::info!(entries = meta.entry_count, lsn, bytes = meta.file_size, "Checkpoint written");
        Ok(())
    }

    /// Checkpoint once the WAL has reached the threshold
    ///
    /// Runs after a write has committed, so a failure does not fail that
    /// write: the WAL keeps every entry and the next write tries again.
    fn maybe_checkpoint(&self) {
        let threshold = self.config.checkpoint_threshold;
        let pending = self.wal.lock().entry_count();
        if threshold == 0 || pending < threshold {
            return;
        }
        if let Err(e) = self.checkpoint_internal() {
            tracing::warn!(error = %e, pending, "Checkpoint failed, keeping WAL for retry");
        }
    }

    /// Close the engine gracefully
    ///
    /// Folds any pending WAL entries into a checkpoint and syncs to disk
    pub fn close(self) -> Result<()> {
        let _write_guard = self.write_lock.lock();

        if self.wal.lock().entry_count() > 0 {
            self.checkpoint_internal()?;
        }
        self.wal.lock().sync()?;

        tracing::info!(
            data_dir = %self.config.data_dir.display(),
            lock = %self.dir_lock.path().display(),
            "Engine closed"
        );
        Ok(())
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Get the data directory path
    pub fn data_dir(&self) -> &Path {
        &self.config.data_dir
    }

    /// Get the number of live entries
    pub fn len(&self) -> usize {
        self.memtable.entry_count()
    }

    pub fn is_empty(&self) -> bool {
        self.memtable.is_empty()
    }

    /// LSN of the last applied mutation
    pub fn last_lsn(&self) -> u64 {
        self.memtable.last_lsn()
    }

    /// Entries currently in the WAL (since the last checkpoint)
    pub fn wal_entry_count(&self) -> u64 {
        self.wal.lock().entry_count()
    }

    /// Checkpoints written since open
    pub fn checkpoint_count(&self) -> u64 {
        self.storage.checkpoints_written()
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }
}

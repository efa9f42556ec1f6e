//! Configuration for WordKV
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

/// Main configuration for a WordKV store
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Root directory for all data files
    /// Internal structure:
    ///   {data_dir}/
    ///     ├── wal.log          (write-ahead log)
    ///     └── checkpoint.wkv   (sorted table image)
    pub data_dir: PathBuf,

    /// Wipe and rebuild the data directory when its on-disk format cannot be
    /// read by this version, instead of refusing to open
    pub destructive_rebuild: bool,

    // -------------------------------------------------------------------------
    // WAL Configuration
    // -------------------------------------------------------------------------
    /// Sync strategy: how often to fsync WAL
    pub wal_sync_strategy: WalSyncStrategy,

    /// Number of WAL entries after which the table is checkpointed and the
    /// WAL truncated
    pub checkpoint_threshold: u64,

    // -------------------------------------------------------------------------
    // Facade Configuration
    // -------------------------------------------------------------------------
    /// What to write into the table right after it is opened
    pub seed_policy: SeedPolicy,
}

/// WAL sync strategy
#[derive(Debug, Clone, Copy)]
pub enum WalSyncStrategy {
    /// fsync after every write (safest, slowest)
    EveryWrite,

    /// fsync after N uncommitted entries (balanced durability/performance)
    EveryNEntries { count: usize },
}

/// Bootstrap policy applied once when a store is opened
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SeedPolicy {
    /// Leave the table untouched
    #[default]
    None,

    /// Insert the words only if the table is empty
    IfEmpty(Vec<String>),

    /// Truncate the table, then insert the words. Discards everything the
    /// table held before the open.
    ResetOnOpen(Vec<String>),
}

impl SeedPolicy {
    /// Words the word-list sample starts with
    pub const SAMPLE_WORDS: [&'static str; 3] = ["dolphin", "crocodile", "cobra"];

    /// The sample application's policy: reset to the fixed word set on open
    pub fn sample() -> Self {
        SeedPolicy::ResetOnOpen(Self::SAMPLE_WORDS.iter().map(|w| w.to_string()).collect())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./wordkv_data"),
            destructive_rebuild: true,
            wal_sync_strategy: WalSyncStrategy::EveryNEntries { count: 100 },
            checkpoint_threshold: 10_000,
            seed_policy: SeedPolicy::None,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the data directory (root for all storage)
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_dir = path.into();
        self
    }

    /// Allow or forbid wiping data written in an incompatible format
    pub fn destructive_rebuild(mut self, enabled: bool) -> Self {
        self.config.destructive_rebuild = enabled;
        self
    }

    /// Set the WAL sync strategy
    pub fn wal_sync_strategy(mut self, strategy: WalSyncStrategy) -> Self {
        self.config.wal_sync_strategy = strategy;
        self
    }

    /// Set how many WAL entries trigger a checkpoint (0 disables automatic
    /// checkpoints)
    pub fn checkpoint_threshold(mut self, entries: u64) -> Self {
        self.config.checkpoint_threshold = entries;
        self
    }

    /// Set the seed policy applied on open
    pub fn seed_policy(mut self, policy: SeedPolicy) -> Self {
        self.config.seed_policy = policy;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

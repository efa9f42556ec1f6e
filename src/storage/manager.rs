//! Storage Manager
//!
//! Owns the checkpoint file and replaces it atomically.
//!
//! ## Responsibilities
//! - Load the current checkpoint on startup
//! - Write new checkpoints via temp file + rename
//! - Clean up leftovers of an interrupted checkpoint
//! - Wipe on-disk state for a destructive rebuild

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::Result;

use super::{Checkpoint, CheckpointBuilder, CheckpointMeta, CheckpointReader};

/// Manages the checkpoint file of one data directory
///
/// ## Concurrency:
/// - Checkpoint writes are only issued by the engine under its write lock
/// - `checkpoints_written`: Atomic counter (lock-free)
pub struct StorageManager {
    /// Directory holding the checkpoint
    data_dir: PathBuf,

    /// Number of checkpoints written since open
    checkpoints_written: AtomicU64,
}

impl StorageManager {
    const CHECKPOINT_FILENAME: &'static str = "checkpoint.wkv";
    const TEMP_FILENAME: &'static str = "checkpoint.wkv.tmp";

    /// Open storage in the given directory
    ///
    /// Creates the directory if needed and removes any temp file left by a
    /// checkpoint that never reached its rename.
    pub fn open(path: &Path) -> Result<Self> {
        fs::create_dir_all(path)?;

        let manager = Self {
            data_dir: path.to_path_buf(),
            checkpoints_written: AtomicU64::new(0),
        };
        remove_if_exists(&manager.temp_path())?;

        Ok(manager)
    }

    /// Load the current checkpoint, if one has been written
    pub fn load(&self) -> Result<Option<Checkpoint>> {
        let path = self.checkpoint_path();
        if !path.exists() {
            return Ok(None);
        }
        CheckpointReader::load(&path).map(Some)
    }

    /// Write `keys` (ascending) as the new checkpoint at `last_lsn`
    ///
    /// The previous checkpoint stays intact until the new one is fully on
    /// disk; the swap is a rename.
    pub fn write_checkpoint<'a>(
        &self,
        keys: impl IntoIterator<Item = &'a str>,
        last_lsn: u64,
    ) -> Result<CheckpointMeta> {
        let temp_path = self.temp_path();
        let final_path = self.checkpoint_path();

        let mut builder = CheckpointBuilder::new(&temp_path)?;
        for key in keys {
            builder.add(key)?;
        }
        let mut meta = builder.finish(last_lsn)?;

        fs::rename(&temp_path, &final_path)?;
        sync_dir(&self.data_dir);
        meta.path = final_path;

        self.checkpoints_written.fetch_add(1, Ordering::SeqCst);

        Ok(meta)
    }

    /// Remove the checkpoint and any temp file
    pub fn wipe(&self) -> Result<()> {
        remove_if_exists(&self.checkpoint_path())?;
        remove_if_exists(&self.temp_path())?;
        Ok(())
    }

    /// Number of checkpoints written since open
    pub fn checkpoints_written(&self) -> u64 {
        self.checkpoints_written.load(Ordering::SeqCst)
    }

    /// Get the data directory path
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn checkpoint_path(&self) -> PathBuf {
        self.data_dir.join(Self::CHECKPOINT_FILENAME)
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn temp_path(&self) -> PathBuf {
        self.data_dir.join(Self::TEMP_FILENAME)
    }
}

fn remove_if_exists(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Persist a rename. Directories cannot be opened for sync on every
/// platform, so failure here is only logged.
fn sync_dir(dir: &Path) {
    if let Err(e) = fs::File::open(dir).and_then(|d| d.sync_all()) {
        tracing::debug!(dir = %dir.display(), error = %e, "Directory sync skipped");
    }
}

//! Data Directory Lock
//!
//! An exclusive advisory lock on `{data_dir}/LOCK`, held by the engine for
//! its whole lifetime. A second engine on the same directory, in this
//! process or another, fails to acquire it.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use fs2::FileExt;

use crate::error::{Result, WordKvError};

/// Held lock; released when dropped
#[derive(Debug)]
pub struct DirLock {
    path: PathBuf,
    _file: File,
}

impl DirLock {
    const FILENAME: &'static str = "LOCK";

    /// Lock `dir`, failing with `StorageUnavailable` if it is already locked
    pub fn acquire(dir: &Path) -> Result<Self> {
        let path = dir.join(Self::FILENAME);
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&path)?;

        file.try_lock_exclusive().map_err(|e| {
            tracing::warn!(path = %path.display(), error = %e, "Data directory already locked");
            WordKvError::unavailable(dir, "data directory is in use by another engine")
        })?;

        Ok(Self { path, _file: file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

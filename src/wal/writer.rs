//! WAL Writer
//!
//! Handles appending entries to the WAL file.
//!
//! Each frame goes to the file in a single `write_all`, with no userspace
//! buffer in between, so a failed append can only leave bytes on disk. The
//! writer tracks where the last complete frame ends and cuts the file back
//! there before anything else is appended.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::config::WalSyncStrategy;
use crate::error::Result;

use super::reader::{Frame, WalReader};
use super::{Operation, WalEntry};

/// Writes entries to the WAL file
pub struct WalWriter {
    path: PathBuf,
    /// Opened in append mode
    file: File,
    /// LSN the next appended entry receives
    next_lsn: u64,
    sync_strategy: WalSyncStrategy,
    /// Entries written since the last fsync
    unsynced: usize,
    /// Entries currently held in the file
    entry_count: u64,
    /// End of the last complete frame
    valid_len: u64,
    /// Bytes past `valid_len` may be on disk and must be cut before the next
    /// append
    tail_dirty: bool,
}

impl WalWriter {
    /// Open or create a WAL file, continuing after the last valid entry
    ///
    /// LSNs start at 1 for an empty file. A damaged tail after the last
    /// valid entry is cut off, so new entries never land behind it.
    pub fn open(path: &Path, sync_strategy: WalSyncStrategy) -> Result<Self> {
        let mut last_lsn = 0;
        let mut entry_count = 0;
        let mut valid_len = 0;

        if path.exists() {
            let mut reader = WalReader::open(path)?;
            while let Frame::Entry(entry) = reader.next_frame()? {
                last_lsn = entry.lsn;
                entry_count += 1;
            }
            valid_len = reader.position();
        }

        let mut writer = Self::open_at(path, sync_strategy, last_lsn + 1)?;
        writer.entry_count = entry_count;
        if writer.valid_len != valid_len {
            writer.valid_len = valid_len;
            writer.tail_dirty = true;
            writer.discard_tail()?;
        }
        Ok(writer)
    }

    /// Open or create a WAL file, assigning `next_lsn` to the next append
    ///
    /// Used after recovery, when the caller already knows the highest LSN
    /// (which may live in a checkpoint rather than this file) and the file
    /// holds only complete frames.
    pub fn open_at(path: &Path, sync_strategy: WalSyncStrategy, next_lsn: u64) -> Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let valid_len = file.metadata()?.len();

        Ok(Self {
            path: path.to_path_buf(),
            file,
            next_lsn: next_lsn.max(1),
            sync_strategy,
            unsynced: 0,
            entry_count: 0,
            valid_len,
            tail_dirty: false,
        })
    }

    /// Append an operation to the WAL, returning its LSN
    ///
    /// On failure the LSN is not consumed and whatever part of the frame
    /// reached the file is cut off again.
    pub fn append(&mut self, operation: Operation) -> Result<u64> {
        if self.tail_dirty {
            self.discard_tail()?;
        }

        let lsn = self.next_lsn;
        let frame = WalEntry::new(lsn, operation).serialize()?;

        if let Err(e) = self.write_frame(&frame) {
            self.tail_dirty = true;
            if let Err(cut) = self.discard_tail() {
                tracing::error!(
                    path = %self.path.display(),
                    error = %cut,
                    "Could not cut failed WAL append, retrying before the next one"
                );
            }
            return Err(e);
        }

        self.valid_len += frame.len() as u64;
        self.next_lsn += 1;
        self.entry_count += 1;

        Ok(lsn)
    }

    fn write_frame(&mut self, frame: &[u8]) -> Result<()> {
        // Reaching the OS on every append means a process crash loses
        // nothing already appended; only fsync is deferred.
        self.file.write_all(frame)?;
        self.unsynced += 1;

        let should_sync = match self.sync_strategy {
            WalSyncStrategy::EveryWrite => true,
            WalSyncStrategy::EveryNEntries { count } => self.unsynced >= count.max(1),
        };
        if should_sync {
            self.sync()?;
        }
        Ok(())
    }

    /// Cut the file back to the end of the last complete frame
    fn discard_tail(&mut self) -> Result<()> {
        tracing::warn!(
            path = %self.path.display(),
            valid_len = self.valid_len,
            "Discarding incomplete WAL tail"
        );
        self.file.set_len(self.valid_len)?;
        self.file.sync_all()?;
        self.tail_dirty = false;
        Ok(())
    }

    /// Force sync to disk
    pub fn sync(&mut self) -> Result<()> {
        self.file.sync_data()?;
        self.unsynced = 0;
        Ok(())
    }

    /// Drop every entry from the file. LSNs keep counting from where they were.
    pub fn truncate(&mut self) -> Result<()> {
        self.file.set_len(0)?;
        self.file.sync_all()?;
        self.unsynced = 0;
        self.entry_count = 0;
        self.valid_len = 0;
        self.tail_dirty = false;
        Ok(())
    }

    /// Get the LSN the next append will receive
    pub fn current_lsn(&self) -> u64 {
        self.next_lsn
    }

    /// Number of entries in the file since it was opened or truncated
    pub fn entry_count(&self) -> u64 {
        self.entry_count
    }

    /// Size of the file up to the end of the last complete frame
    pub fn valid_len(&self) -> u64 {
        self.valid_len
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

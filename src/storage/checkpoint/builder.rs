//! Checkpoint Builder
//!
//! Writes sorted keys to a new checkpoint file.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::error::{Result, WordKvError};

use super::{CheckpointMeta, HEADER_SIZE, MAGIC, VERSION};

/// Builder for creating a checkpoint from sorted keys
pub struct CheckpointBuilder {
    /// Output file path
    path: PathBuf,
    /// Buffered writer for performance
    writer: BufWriter<File>,
    /// Number of keys written
    entry_count: u64,
    /// Last key written, to enforce strictly ascending order
    last_key: Option<String>,
    /// Running CRC hasher for data section
    data_hasher: crc32fast::Hasher,
}

impl CheckpointBuilder {
    /// Create a new checkpoint builder
    ///
    /// Writes the header immediately; call `add()` in ascending key order,
    /// then `finish()` to write the footer.
    pub fn new(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;

        let mut writer = BufWriter::new(file);

        // Count and LSN are placeholders, patched in finish()
        writer.write_all(MAGIC)?;
        writer.write_all(&VERSION.to_le_bytes())?;
        writer.write_all(&0u64.to_le_bytes())?;
        writer.write_all(&0u64.to_le_bytes())?;

        Ok(Self {
            path: path.to_path_buf(),
            writer,
            entry_count: 0,
            last_key: None,
            data_hasher: crc32fast::Hasher::new(),
        })
    }

    /// Add a key (must be strictly greater than the previous one)
    pub fn add(&mut self, key: &str) -> Result<()> {
        if let Some(last) = &self.last_key {
            if key <= last.as_str() {
                return Err(WordKvError::Corruption(format!(
                    "checkpoint keys out of order: {:?} after {:?}",
                    key, last
                )));
            }
        }

        let key_len = u32::try_from(key.len()).map_err(|_| {
            WordKvError::Serialization(format!("key of {} bytes too long", key.len()))
        })?;
        let key_len_bytes = key_len.to_le_bytes();

        self.writer.write_all(&key_len_bytes)?;
        self.writer.write_all(key.as_bytes())?;

        self.data_hasher.update(&key_len_bytes);
        self.data_hasher.update(key.as_bytes());

        self.entry_count += 1;
        self.last_key = Some(key.to_string());

        Ok(())
    }

    /// Finish building: write footer, patch header, fsync, return metadata
    pub fn finish(mut self, last_lsn: u64) -> Result<CheckpointMeta> {
        let data_crc = self.data_hasher.finalize();

        self.writer.write_all(&data_crc.to_le_bytes())?;
        self.writer.write_all(&[0u8; 4])?;
        self.writer.flush()?;

        let mut file = self
            .writer
            .into_inner()
            .map_err(|e| WordKvError::Io(e.into_error()))?;
        file.seek(SeekFrom::Start(6))?; // After magic + version
        file.write_all(&self.entry_count.to_le_bytes())?;
        file.write_all(&last_lsn.to_le_bytes())?;
        file.sync_all()?;

        let file_size = file.metadata()?.len();
        debug_assert!(file_size >= HEADER_SIZE);

        Ok(CheckpointMeta {
            path: self.path,
            entry_count: self.entry_count,
            last_lsn,
            file_size,
        })
    }
}

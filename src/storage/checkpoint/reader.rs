//! Checkpoint Reader
//!
//! Loads and validates a checkpoint file in one pass.

use std::fs;
use std::path::Path;

use crate::error::{Result, WordKvError};

use super::{FOOTER_SIZE, HEADER_SIZE, MAGIC, VERSION};

/// Contents of a checkpoint file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checkpoint {
    /// LSN of the last WAL entry folded in
    pub last_lsn: u64,
    /// Keys, ascending
    pub keys: Vec<String>,
}

/// Reader for checkpoint files
pub struct CheckpointReader;

impl CheckpointReader {
    /// Read and validate a checkpoint
    ///
    /// Errors:
    /// - `IncompatibleFormat`: wrong magic or version (written by something else)
    /// - `Corruption`: truncated file, bad CRC, count mismatch, non-UTF-8 key
    pub fn load(path: &Path) -> Result<Checkpoint> {
        let bytes = fs::read(path)?;

        if bytes.len() < 6 || &bytes[0..4] != MAGIC {
            return Err(WordKvError::IncompatibleFormat(format!(
                "{} is not a WordKV checkpoint",
                path.display()
            )));
        }

        let version = u16::from_le_bytes([bytes[4], bytes[5]]);
        if version != VERSION {
            return Err(WordKvError::IncompatibleFormat(format!(
                "unsupported checkpoint version {} (expected {})",
                version, VERSION
            )));
        }

        let min_len = (HEADER_SIZE + FOOTER_SIZE) as usize;
        if bytes.len() < min_len {
            return Err(WordKvError::Corruption(format!(
                "checkpoint is {} bytes, smaller than header + footer",
                bytes.len()
            )));
        }

        let entry_count = read_u64(&bytes, 6);
        let last_lsn = read_u64(&bytes, 14);

        let data_end = bytes.len() - FOOTER_SIZE as usize;
        let data = &bytes[HEADER_SIZE as usize..data_end];
        let expected_crc = read_u32(&bytes, data_end);

        let actual_crc = crc32fast::hash(data);
        if actual_crc != expected_crc {
            return Err(WordKvError::Corruption(format!(
                "checkpoint CRC mismatch: expected {:#010x}, got {:#010x}",
                expected_crc, actual_crc
            )));
        }

        let mut keys = Vec::new();
        let mut pos = 0;
        while pos < data.len() {
            if pos + 4 > data.len() {
                return Err(WordKvError::Corruption("truncated key length".to_string()));
            }
            let key_len = read_u32(data, pos) as usize;
            pos += 4;

            if pos + key_len > data.len() {
                return Err(WordKvError::Corruption("truncated key".to_string()));
            }
            let key = std::str::from_utf8(&data[pos..pos + key_len])
                .map_err(|e| WordKvError::Corruption(format!("key is not UTF-8: {}", e)))?;
            pos += key_len;

            keys.push(key.to_string());
        }

        if keys.len() as u64 != entry_count {
            return Err(WordKvError::Corruption(format!(
                "checkpoint header says {} keys, found {}",
                entry_count,
                keys.len()
            )));
        }

        Ok(Checkpoint { last_lsn, keys })
    }
}

fn read_u64(bytes: &[u8], at: usize) -> u64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&bytes[at..at + 8]);
    u64::from_le_bytes(buf)
}

fn read_u32(bytes: &[u8], at: usize) -> u32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(&bytes[at..at + 4]);
    u32::from_le_bytes(buf)
}

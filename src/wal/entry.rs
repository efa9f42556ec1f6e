//! WAL Entry definitions
//!
//! Defines the structure of individual WAL log entries and their framing.

use std::time::{SystemTime, UNIX_EPOCH};

use bytes::{BufMut, BytesMut};
use serde::{Deserialize, Serialize};

use crate::error::{Result, WordKvError};

/// Frame header size: LSN (8) + CRC (4) + Len (4)
pub const HEADER_SIZE: usize = 16;

/// Upper bound on a single frame's payload. Anything larger is treated as
/// a torn or corrupted length field rather than allocated.
pub(crate) const MAX_PAYLOAD_SIZE: u32 = 1024 * 1024;

/// A single entry in the WAL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalEntry {
    /// Log Sequence Number - monotonically increasing
    pub lsn: u64,

    /// The operation to perform
    pub operation: Operation,

    /// Timestamp (unix millis) when entry was created
    pub timestamp: u64,
}

/// Operations that can be logged
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    /// Add a key (only logged when the key was absent)
    Insert { key: String },

    /// Truncate the table
    DeleteAll,
}

/// Decoded frame header
#[derive(Debug, Clone, Copy)]
pub(crate) struct FrameHeader {
    pub lsn: u64,
    pub crc: u32,
    pub len: u32,
}

impl FrameHeader {
    pub(crate) fn parse(bytes: &[u8; HEADER_SIZE]) -> Self {
        let mut lsn = [0u8; 8];
        let mut crc = [0u8; 4];
        let mut len = [0u8; 4];
        lsn.copy_from_slice(&bytes[0..8]);
        crc.copy_from_slice(&bytes[8..12]);
        len.copy_from_slice(&bytes[12..16]);

        Self {
            lsn: u64::from_le_bytes(lsn),
            crc: u32::from_le_bytes(crc),
            len: u32::from_le_bytes(len),
        }
    }
}

impl WalEntry {
    /// Create an entry stamped with the current time
    pub fn new(lsn: u64, operation: Operation) -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);

        Self {
            lsn,
            operation,
            timestamp,
        }
    }

    /// Encode as a complete frame: `[LSN][CRC][Len][payload]`
    pub fn serialize(&self) -> Result<Vec<u8>> {
        let payload = bincode::serialize(&(&self.operation, self.timestamp))?;
        let len = u32::try_from(payload.len())
            .ok()
            .filter(|len| *len <= MAX_PAYLOAD_SIZE)
            .ok_or_else(|| {
                WordKvError::Serialization(format!(
                    "WAL payload of {} bytes exceeds frame limit",
                    payload.len()
                ))
            })?;

        let crc = compute_crc(self.lsn, len, &payload);

        let mut frame = BytesMut::with_capacity(HEADER_SIZE + payload.len());
        frame.put_u64_le(self.lsn);
        frame.put_u32_le(crc);
        frame.put_u32_le(len);
        frame.put_slice(&payload);

        Ok(frame.to_vec())
    }

    /// Decode one complete frame, verifying its checksum
    pub fn deserialize(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_SIZE {
            return Err(WordKvError::WalCorruption(format!(
                "frame too short: {} bytes",
                bytes.len()
            )));
        }

        let mut header = [0u8; HEADER_SIZE];
        header.copy_from_slice(&bytes[..HEADER_SIZE]);
        let header = FrameHeader::parse(&header);

        let payload = &bytes[HEADER_SIZE..];
        if payload.len() != header.len as usize {
            return Err(WordKvError::WalCorruption(format!(
                "payload length mismatch: header says {}, got {}",
                header.len,
                payload.len()
            )));
        }

        Self::from_parts(header, payload)
    }

    /// Decode a payload whose header has already been read
    pub(crate) fn from_parts(header: FrameHeader, payload: &[u8]) -> Result<Self> {
        let actual = compute_crc(header.lsn, header.len, payload);
        if actual != header.crc {
            return Err(WordKvError::WalCorruption(format!(
                "CRC mismatch at LSN {}: expected {:#010x}, got {:#010x}",
                header.lsn, header.crc, actual
            )));
        }

        let (operation, timestamp): (Operation, u64) = bincode::deserialize(payload)?;

        Ok(Self {
            lsn: header.lsn,
            operation,
            timestamp,
        })
    }

    /// Size of this entry once framed
    pub fn encoded_len(&self) -> Result<usize> {
        Ok(HEADER_SIZE + bincode::serialized_size(&(&self.operation, self.timestamp))? as usize)
    }
}

fn compute_crc(lsn: u64, len: u32, payload: &[u8]) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(&lsn.to_le_bytes());
    hasher.update(&len.to_le_bytes());
    hasher.update(payload);
    hasher.finalize()
}

//! Checkpoint Module
//!
//! Sorted, immutable on-disk image of the whole table at one LSN.
//!
//! ## File Format
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │ Header (22 bytes)                                       │
//! │   Magic: "WKVC" (4) | Version: u16 (2)                  │
//! │   Count: u64 (8)    | LastLSN: u64 (8)                  │
//! ├─────────────────────────────────────────────────────────┤
//! │ Data Block (variable)                                   │
//! │   [KeyLen: u32][Key (UTF-8)]                            │
//! │   ... repeated for each key, ascending ...              │
//! ├─────────────────────────────────────────────────────────┤
//! │ Footer (8 bytes)                                        │
//! │   DataCRC: u32 (4) | Padding (4)                        │
//! └─────────────────────────────────────────────────────────┘
//! ```

mod builder;
mod reader;

use std::path::PathBuf;

pub use builder::CheckpointBuilder;
pub use reader::{Checkpoint, CheckpointReader};

// =============================================================================
// Shared Constants (used by builder and reader)
// =============================================================================

/// Magic bytes identifying a WordKV checkpoint file
pub(crate) const MAGIC: &[u8; 4] = b"WKVC";

/// Current checkpoint format version
pub(crate) const VERSION: u16 = 1;

/// Header size: Magic (4) + Version (2) + EntryCount (8) + LastLSN (8)
pub(crate) const HEADER_SIZE: u64 = 22;

/// Footer size: DataCRC (4) + Padding (4)
pub(crate) const FOOTER_SIZE: u64 = 8;

/// Metadata describing a checkpoint file that was just written
#[derive(Debug, Clone)]
pub struct CheckpointMeta {
    /// Path to the checkpoint file
    pub path: PathBuf,
    /// Number of keys stored
    pub entry_count: u64,
    /// LSN of the last WAL entry folded into this checkpoint
    pub last_lsn: u64,
    /// File size in bytes
    pub file_size: u64,
}

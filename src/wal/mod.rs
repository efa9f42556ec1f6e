//! Write-Ahead Log (WAL)
//!
//! Every mutation of the table is appended here before it touches the
//! memtable. The log only holds what happened since the last checkpoint; a
//! checkpoint truncates it, and LSNs keep counting across truncations.
//!
//! ## Frame Layout
//! ```text
//!  0        8        12       16                16 + Len
//!  ┌────────┬────────┬────────┬──────────────────┐
//!  │  LSN   │  CRC   │  Len   │     payload      │
//!  │ u64 LE │ u32 LE │ u32 LE │ bincode (op, ts) │
//!  └────────┴────────┴────────┴──────────────────┘
//! ```
//!
//! The CRC covers LSN, Len and payload. Frames are written back to back with
//! no file header.
//!
//! ## Damage Handling
//! Reading stops at the first frame that is cut short (an interrupted
//! append) or fails its checksum. Recovery keeps the entries before it and
//! truncates the file there.

mod entry;
mod reader;
mod recovery;
mod writer;

pub use entry::{Operation, WalEntry, HEADER_SIZE};
pub use reader::{WalIterator, WalReader};
pub use recovery::{RecoveryResult, WalRecovery};
pub use writer::WalWriter;

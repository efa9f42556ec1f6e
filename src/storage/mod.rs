//! Storage Module
//!
//! Persistent image of the table, complementing the WAL.
//!
//! ## Responsibilities
//! - Persist the full key set in sorted order (checkpoint)
//! - Replace checkpoints atomically so a crash leaves the old or the new one
//! - Detect foreign or damaged files on load
//! - Keep a second engine off a directory that is in use
//!
//! The WAL holds every mutation since the last checkpoint; the checkpoint
//! holds everything before it. Together they reconstruct the table.

mod checkpoint;
mod lock;
mod manager;

pub use checkpoint::{Checkpoint, CheckpointBuilder, CheckpointMeta, CheckpointReader};
pub use lock::DirLock;
pub use manager::StorageManager;

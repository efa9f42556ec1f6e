//! MemTable Module
//!
//! In-memory image of the table.
//!
//! ## Responsibilities
//! - Fast membership checks for the conflict-ignore insert policy
//! - Single-writer/multi-reader access pattern
//! - Ordered iteration for snapshots and checkpoints
//!
//! ## Data Structure Choice
//! The table holds keys only, so a `BTreeSet<String>` behind an RwLock:
//! - Ordered keys (snapshots and checkpoints come out sorted for free)
//! - Uniqueness enforced by the set itself

mod table;

pub use table::MemTable;

//! # WordKV
//!
//! A durable, observable single-table key store with:
//! - Unique string keys, conflict-ignore inserts and whole-table truncation
//! - Write-Ahead Logging (WAL) plus sorted checkpoints for durability
//! - Crash recovery with partial write handling
//! - Single-writer/multi-reader concurrency model
//! - Snapshot subscriptions with replay-latest semantics
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 WordStore (facade)                          │
//! │     insert / delete_all ──▶ background writer thread        │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                Access Layer (EntryAccess)                   │
//! │        validation, then refresh ──▶ ChangeNotifier ──▶ subs │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                      Engine                                 │
//! │            (Single Writer / Multi Reader)                   │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │     WAL     │          │  MemTable   │
//!   │  (Append)   │          │  (RwLock)   │
//!   └──────┬──────┘          └─────────────┘
//!          │ checkpoint
//!          ▼
//!   ┌─────────────┐
//!   │ Checkpoint  │
//!   │  (sorted)   │
//!   └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;
pub mod model;

pub mod wal;
pub mod memtable;
pub mod storage;
pub mod engine;

pub mod access;
pub mod notifier;
pub mod store;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{WordKvError, Result};
pub use config::{Config, SeedPolicy, WalSyncStrategy};
pub use model::{Entry, Snapshot};
pub use engine::Engine;
pub use access::{EngineAccess, EntryAccess};
pub use notifier::{ChangeNotifier, NotifierState, Subscription, SubscriptionId};
pub use store::{StoreRegistry, WordStore};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of WordKV
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

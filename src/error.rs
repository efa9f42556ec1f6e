//! Error types for WordKV
//!
//! Provides a unified error type for all operations.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using WordKvError
pub type Result<T> = std::result::Result<T, WordKvError>;

/// Unified error type for WordKV operations
#[derive(Debug, Error)]
pub enum WordKvError {
    // -------------------------------------------------------------------------
    // Construction Errors
    // -------------------------------------------------------------------------
    /// The durable medium could not be opened or created. Fatal: no store
    /// instance exists after this error.
    #[error("Storage unavailable at {}: {reason}", path.display())]
    StorageUnavailable { path: PathBuf, reason: String },

    // -------------------------------------------------------------------------
    // Input Errors
    // -------------------------------------------------------------------------
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // WAL Errors
    // -------------------------------------------------------------------------
    #[error("WAL corruption detected: {0}")]
    WalCorruption(String),

    // -------------------------------------------------------------------------
    // Storage Errors
    // -------------------------------------------------------------------------
    #[error("Checkpoint corruption detected: {0}")]
    Corruption(String),

    /// On-disk data was written by an incompatible format version
    #[error("Incompatible storage format: {0}")]
    IncompatibleFormat(String),

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("Serialization error: {0}")]
    Serialization(String),

    // -------------------------------------------------------------------------
    // Lifecycle Errors
    // -------------------------------------------------------------------------
    #[error("Store is closed")]
    Closed,
}

impl WordKvError {
    /// Wrap any error raised while opening `path` as `StorageUnavailable`
    pub(crate) fn unavailable(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        WordKvError::StorageUnavailable {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

impl From<bincode::Error> for WordKvError {
    fn from(err: bincode::Error) -> Self {
        WordKvError::Serialization(err.to_string())
    }
}

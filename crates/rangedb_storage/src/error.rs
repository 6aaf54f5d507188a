//! Error types for engine operations.

use std::io;
use thiserror::Error;

/// Result type for engine operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur inside a storage engine.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The engine rejected a key or value payload.
    #[error("invalid argument: {message}")]
    InvalidArgument {
        /// Why the payload was rejected.
        message: String,
    },

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The on-disk store is corrupted.
    #[error("store corrupted: {message}")]
    Corrupted {
        /// Description of the corruption.
        message: String,
    },

    /// Another process holds the store lock.
    #[error("store locked: another process has exclusive access")]
    Locked,

    /// The store does not exist, or exists when it must not.
    #[error("cannot open store: {message}")]
    Open {
        /// Why the store could not be opened.
        message: String,
    },

    /// The engine handle is closed.
    #[error("engine is closed")]
    Closed,
}

impl StorageError {
    /// Creates an invalid argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Creates a corruption error.
    pub fn corrupted(message: impl Into<String>) -> Self {
        Self::Corrupted {
            message: message.into(),
        }
    }

    /// Creates an open error.
    pub fn open(message: impl Into<String>) -> Self {
        Self::Open {
            message: message.into(),
        }
    }
}

//! Error types for the access layer.

use rangedb_storage::StorageError;
use thiserror::Error;

/// Result type for access-layer operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in the access layer.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A key or value payload was rejected.
    #[error("invalid argument: {message}")]
    InvalidArgument {
        /// Why the payload was rejected.
        message: String,
    },

    /// `next_entry` was called on a cursor with no entry remaining.
    ///
    /// Recoverable: check [`crate::Cursor::has_next`] first.
    #[error("cursor exhausted: no entry remains")]
    Exhausted,

    /// The underlying store failed to open, repair, or destroy.
    #[error("store open failed: {message}")]
    Open {
        /// The engine's failure message, preserved verbatim.
        message: String,
    },

    /// An engine-level failure, propagated unchanged.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// The database handle is closed.
    #[error("database is closed")]
    DatabaseClosed,

    /// The snapshot was used after `close`.
    #[error("snapshot is closed")]
    SnapshotClosed,
}

impl CoreError {
    /// Creates an invalid argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Wraps an engine failure from the open/repair/destroy path,
    /// preserving its message.
    pub fn open(source: StorageError) -> Self {
        Self::Open {
            message: source.to_string(),
        }
    }
}

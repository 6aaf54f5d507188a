//! Atomic write batches.

use crate::error::CoreResult;
use crate::types::check_payload;
use rangedb_storage::WriteBatch;

/// An accumulator of put and delete operations applied atomically.
///
/// Operations are recorded in order and stay invisible to every reader
/// until the owning [`crate::Database::batch`] call commits them. Within a
/// batch the last write to a key wins. A batch lives only for the closure
/// that builds it; if the closure fails, nothing is committed.
#[derive(Debug, Default)]
pub struct Batch {
    inner: WriteBatch,
}

impl Batch {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Records a put operation.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CoreError::InvalidArgument`] if the key or value
    /// bytes cannot be framed by the engine.
    pub fn put(&mut self, key: &[u8], value: &[u8]) -> CoreResult<()> {
        check_payload(key, "key")?;
        check_payload(value, "value")?;
        self.inner.put(key, value);
        Ok(())
    }

    /// Records a delete operation.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CoreError::InvalidArgument`] if the key bytes
    /// cannot be framed by the engine.
    pub fn delete(&mut self, key: &[u8]) -> CoreResult<()> {
        check_payload(key, "key")?;
        self.inner.delete(key);
        Ok(())
    }

    /// Returns the number of recorded operations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Reports whether the batch records no operations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub(crate) fn into_inner(self) -> WriteBatch {
        self.inner
    }
}

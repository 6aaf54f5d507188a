//! Point-in-time read views.

use crate::error::{CoreError, CoreResult};
use rangedb_storage::RawSnapshot;

/// A read-only view of the store frozen at creation time.
///
/// Writes performed on the store after the snapshot was taken are never
/// observable through it. The snapshot owns an engine-level marker that
/// must be released with [`Snapshot::close`]; dropping the snapshot
/// releases it best-effort.
///
/// # Example
///
/// ```rust,ignore
/// db.put(b"one", b"1")?;
/// let snapshot = db.snapshot()?;
/// db.put(b"one", b"3")?;
/// assert_eq!(snapshot.get(b"one")?, Some(b"1".to_vec()));
/// snapshot.close()?;
/// ```
pub struct Snapshot {
    marker: Box<dyn RawSnapshot>,
    closed: bool,
}

impl Snapshot {
    pub(crate) fn new(marker: Box<dyn RawSnapshot>) -> Self {
        Self {
            marker,
            closed: false,
        }
    }

    /// Reads the value visible for `key` at the snapshot's point in time.
    ///
    /// Returns `Ok(None)` if no such key existed then - distinct from a
    /// key that existed with an empty value.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::SnapshotClosed`] if the snapshot has been
    /// closed, or [`CoreError::InvalidArgument`] if the engine rejects the
    /// key bytes.
    pub fn get(&self, key: &[u8]) -> CoreResult<Option<Vec<u8>>> {
        if self.closed {
            return Err(CoreError::SnapshotClosed);
        }
        Ok(self.marker.get(key)?)
    }

    /// Releases the underlying point-in-time marker.
    ///
    /// Idempotent. Reads after close fail with
    /// [`CoreError::SnapshotClosed`].
    ///
    /// # Errors
    ///
    /// Propagates an engine release failure.
    pub fn close(&mut self) -> CoreResult<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.marker.close()?;
        Ok(())
    }
}

impl Drop for Snapshot {
    fn drop(&mut self) {
        if !self.closed {
            let _ = self.marker.close();
        }
    }
}

impl std::fmt::Debug for Snapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Snapshot")
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rangedb_storage::{MemoryEngine, StorageEngine};

    #[test]
    fn snapshot_ignores_later_writes() {
        let engine = MemoryEngine::new();
        engine.put(b"one", b"1").unwrap();

        let snapshot = Snapshot::new(engine.snapshot().unwrap());
        engine.put(b"one", b"3").unwrap();
        engine.put(b"new", b"value").unwrap();

        assert_eq!(snapshot.get(b"one").unwrap(), Some(b"1".to_vec()));
        assert_eq!(snapshot.get(b"new").unwrap(), None);
    }

    #[test]
    fn absent_key_is_none() {
        let engine = MemoryEngine::new();
        let snapshot = Snapshot::new(engine.snapshot().unwrap());
        assert_eq!(snapshot.get(b"missing").unwrap(), None);
    }

    #[test]
    fn empty_value_is_found() {
        let engine = MemoryEngine::new();
        engine.put(b"key", b"").unwrap();
        let snapshot = Snapshot::new(engine.snapshot().unwrap());
        assert_eq!(snapshot.get(b"key").unwrap(), Some(Vec::new()));
    }

    #[test]
    fn get_after_close_fails_cleanly() {
        let engine = MemoryEngine::new();
        engine.put(b"one", b"1").unwrap();

        let mut snapshot = Snapshot::new(engine.snapshot().unwrap());
        snapshot.close().unwrap();
        snapshot.close().unwrap();

        assert!(matches!(
            snapshot.get(b"one"),
            Err(CoreError::SnapshotClosed)
        ));
    }
}

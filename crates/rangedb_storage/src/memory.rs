//! In-memory storage engine.

use crate::engine::{RawIterator, RawSnapshot, StorageEngine, WriteBatch};
use crate::error::{StorageError, StorageResult};
use crate::tree::KeyTree;
use parking_lot::RwLock;

/// An ordered in-memory storage engine.
///
/// This engine keeps all data in a sorted in-memory tree and is suitable
/// for:
/// - Unit tests
/// - Integration tests
/// - Ephemeral stores that don't need persistence
///
/// # Thread Safety
///
/// This engine is thread-safe and can be shared across threads.
///
/// # Example
///
/// ```rust
/// use rangedb_storage::{MemoryEngine, StorageEngine};
///
/// let engine = MemoryEngine::new();
/// engine.put(b"key", b"value").unwrap();
/// assert_eq!(engine.get(b"key").unwrap(), Some(b"value".to_vec()));
/// ```
#[derive(Debug, Default)]
pub struct MemoryEngine {
    tree: KeyTree,
    open: RwLock<bool>,
}

impl MemoryEngine {
    /// Creates a new empty in-memory engine.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tree: KeyTree::new(),
            open: RwLock::new(true),
        }
    }

    /// Returns the number of stored entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    /// Reports whether the engine stores no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tree.len() == 0
    }

    /// Removes all entries.
    pub fn clear(&self) {
        self.tree.clear();
    }

    fn ensure_open(&self) -> StorageResult<()> {
        if *self.open.read() {
            Ok(())
        } else {
            Err(StorageError::Closed)
        }
    }
}

impl StorageEngine for MemoryEngine {
    fn get(&self, key: &[u8]) -> StorageResult<Option<Vec<u8>>> {
        self.ensure_open()?;
        Ok(self.tree.get(key))
    }

    fn put(&self, key: &[u8], value: &[u8]) -> StorageResult<()> {
        self.ensure_open()?;
        self.tree.insert(key, value);
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> StorageResult<()> {
        self.ensure_open()?;
        self.tree.remove(key);
        Ok(())
    }

    fn raw_iterator(&self) -> StorageResult<Box<dyn RawIterator>> {
        self.ensure_open()?;
        Ok(Box::new(self.tree.iter()))
    }

    fn apply_batch(&self, batch: &WriteBatch) -> StorageResult<()> {
        self.ensure_open()?;
        self.tree.apply(batch);
        Ok(())
    }

    fn snapshot(&self) -> StorageResult<Box<dyn RawSnapshot>> {
        self.ensure_open()?;
        Ok(Box::new(self.tree.freeze()))
    }

    fn compact_range(&self, _from: Option<&[u8]>, _to: Option<&[u8]>) -> StorageResult<()> {
        // The tree has no stale representation to compact
        self.ensure_open()
    }

    fn sync(&self) -> StorageResult<()> {
        // In-memory engine has no pending writes
        self.ensure_open()
    }

    fn close(&self) -> StorageResult<()> {
        *self.open.write() = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_new_is_empty() {
        let engine = MemoryEngine::new();
        assert!(engine.is_empty());
        assert_eq!(engine.len(), 0);
    }

    #[test]
    fn memory_put_get_round_trip() {
        let engine = MemoryEngine::new();
        engine.put(b"some", b"value").unwrap();
        assert_eq!(engine.get(b"some").unwrap(), Some(b"value".to_vec()));
    }

    #[test]
    fn memory_get_absent_key() {
        let engine = MemoryEngine::new();
        assert_eq!(engine.get(b"hello").unwrap(), None);
    }

    #[test]
    fn memory_empty_value_is_found() {
        let engine = MemoryEngine::new();
        engine.put(b"key", b"").unwrap();
        assert_eq!(engine.get(b"key").unwrap(), Some(Vec::new()));
    }

    #[test]
    fn memory_delete_removes() {
        let engine = MemoryEngine::new();
        engine.put(b"some", b"value").unwrap();
        engine.delete(b"some").unwrap();
        assert_eq!(engine.get(b"some").unwrap(), None);
    }

    #[test]
    fn memory_delete_absent_key_succeeds() {
        let engine = MemoryEngine::new();
        assert!(engine.delete(b"missing").is_ok());
    }

    #[test]
    fn memory_batch_is_atomic_per_reader() {
        let engine = MemoryEngine::new();
        engine.put(b"some", b"value").unwrap();

        let mut batch = WriteBatch::new();
        batch.delete(b"some");
        batch.put(b"another", b"value");
        batch.put(b"more", b"data");
        engine.apply_batch(&batch).unwrap();

        assert_eq!(engine.get(b"some").unwrap(), None);
        assert_eq!(engine.get(b"another").unwrap(), Some(b"value".to_vec()));
        assert_eq!(engine.get(b"more").unwrap(), Some(b"data".to_vec()));
    }

    #[test]
    fn memory_snapshot_ignores_later_writes() {
        let engine = MemoryEngine::new();
        engine.put(b"one", b"1").unwrap();

        let snapshot = engine.snapshot().unwrap();
        engine.put(b"one", b"3").unwrap();

        assert_eq!(snapshot.get(b"one").unwrap(), Some(b"1".to_vec()));
        assert_eq!(engine.get(b"one").unwrap(), Some(b"3".to_vec()));
    }

    #[test]
    fn memory_closed_engine_rejects_operations() {
        let engine = MemoryEngine::new();
        engine.put(b"k", b"v").unwrap();
        engine.close().unwrap();
        engine.close().unwrap();

        assert!(matches!(engine.get(b"k"), Err(StorageError::Closed)));
        assert!(matches!(engine.put(b"k", b"v"), Err(StorageError::Closed)));
        assert!(matches!(engine.raw_iterator(), Err(StorageError::Closed)));
    }

    #[test]
    fn memory_iterator_sees_sorted_keys() {
        let engine = MemoryEngine::new();
        engine.put(b"b", b"2").unwrap();
        engine.put(b"a", b"1").unwrap();
        engine.put(b"c", b"3").unwrap();

        let mut iter = engine.raw_iterator().unwrap();
        iter.seek_to_first();
        let mut keys = Vec::new();
        while let Some((key, _)) = iter.peek_next() {
            keys.push(key);
            iter.advance();
        }
        assert_eq!(keys, vec![b"a".to_vec(), b"b".to_vec(), b"c".to_vec()]);
    }
}

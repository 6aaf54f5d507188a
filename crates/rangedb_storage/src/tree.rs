//! Shared ordered key-value state for the bundled engines.
//!
//! Both bundled engines keep their readable state in a [`KeyTree`]: a
//! `BTreeMap` behind a `parking_lot::RwLock`. The tree's byte-key ordering
//! is exactly the engine contract's total order, so iterators and snapshots
//! are implemented once here and reused by both engines.

use crate::engine::{BatchOp, RawIterator, RawSnapshot, WriteBatch};
use crate::error::{StorageError, StorageResult};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::Arc;

/// Ordered in-memory key-value state shared between an engine handle and
/// the iterators it hands out.
#[derive(Debug, Default, Clone)]
pub(crate) struct KeyTree {
    entries: Arc<RwLock<BTreeMap<Vec<u8>, Vec<u8>>>>,
}

impl KeyTree {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.entries.read().get(key).cloned()
    }

    pub(crate) fn insert(&self, key: &[u8], value: &[u8]) {
        self.entries.write().insert(key.to_vec(), value.to_vec());
    }

    pub(crate) fn remove(&self, key: &[u8]) {
        self.entries.write().remove(key);
    }

    /// Applies every batch operation under one write lock, so no reader
    /// observes a partially applied batch.
    pub(crate) fn apply(&self, batch: &WriteBatch) {
        let mut entries = self.entries.write();
        for op in batch.ops() {
            match op {
                BatchOp::Put { key, value } => {
                    entries.insert(key.clone(), value.clone());
                }
                BatchOp::Delete { key } => {
                    entries.remove(key);
                }
            }
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub(crate) fn clear(&self) {
        self.entries.write().clear();
    }

    /// Clones the current entries, sorted by key.
    pub(crate) fn dump(&self) -> Vec<(Vec<u8>, Vec<u8>)> {
        self.entries
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    pub(crate) fn iter(&self) -> TreeIterator {
        TreeIterator {
            tree: self.clone(),
            edge: Vec::new(),
            closed: false,
        }
    }

    pub(crate) fn freeze(&self) -> TreeSnapshot {
        TreeSnapshot {
            frozen: Some(Arc::new(self.entries.read().clone())),
        }
    }
}

/// A [`RawIterator`] over a live [`KeyTree`].
///
/// The gap position is a byte string `edge`: the gap sits just before the
/// first key `>= edge`. Every primitive re-reads the tree under the lock,
/// so writes that land mid-traversal are observed - the weak-consistency
/// behavior the access layer documents for plain scans.
#[derive(Debug)]
pub(crate) struct TreeIterator {
    tree: KeyTree,
    edge: Vec<u8>,
    closed: bool,
}

impl TreeIterator {
    /// Smallest key strictly greater than `key` in byte-lexicographic
    /// order: `key` with a zero byte appended.
    fn successor(key: &[u8]) -> Vec<u8> {
        let mut next = Vec::with_capacity(key.len() + 1);
        next.extend_from_slice(key);
        next.push(0);
        next
    }
}

impl RawIterator for TreeIterator {
    fn seek_to_first(&mut self) {
        self.edge.clear();
    }

    fn seek_to_last(&mut self) {
        let entries = self.tree.entries.read();
        match entries.keys().next_back() {
            Some(last) => {
                self.edge.clear();
                self.edge.extend_from_slice(last);
            }
            None => self.edge.clear(),
        }
    }

    fn seek(&mut self, key: &[u8]) {
        self.edge.clear();
        self.edge.extend_from_slice(key);
    }

    fn has_next(&self) -> bool {
        self.peek_next().is_some()
    }

    fn has_prev(&self) -> bool {
        if self.closed {
            return false;
        }
        let entries = self.tree.entries.read();
        entries.range::<[u8], _>((Bound::Unbounded, Bound::Excluded(self.edge.as_slice()))).next_back().is_some()
    }

    fn peek_next(&self) -> Option<(Vec<u8>, Vec<u8>)> {
        if self.closed {
            return None;
        }
        let entries = self.tree.entries.read();
        entries
            .range::<[u8], _>((Bound::Included(self.edge.as_slice()), Bound::Unbounded))
            .next()
            .map(|(k, v)| (k.clone(), v.clone()))
    }

    fn advance(&mut self) -> bool {
        if self.closed {
            return false;
        }
        let entries = self.tree.entries.read();
        let Some((current, _)) = entries.range::<[u8], _>((Bound::Included(self.edge.as_slice()), Bound::Unbounded)).next() else {
            return false;
        };
        self.edge = Self::successor(current);
        entries.range::<[u8], _>((Bound::Included(self.edge.as_slice()), Bound::Unbounded)).next().is_some()
    }

    fn retreat(&mut self) -> bool {
        if self.closed {
            return false;
        }
        let entries = self.tree.entries.read();
        let Some((previous, _)) = entries.range::<[u8], _>((Bound::Unbounded, Bound::Excluded(self.edge.as_slice()))).next_back() else {
            return false;
        };
        self.edge.clone_from(previous);
        true
    }

    fn close(&mut self) -> StorageResult<()> {
        self.closed = true;
        Ok(())
    }
}

/// A [`RawSnapshot`] holding a frozen copy of the tree.
#[derive(Debug)]
pub(crate) struct TreeSnapshot {
    frozen: Option<Arc<BTreeMap<Vec<u8>, Vec<u8>>>>,
}

impl RawSnapshot for TreeSnapshot {
    fn get(&self, key: &[u8]) -> StorageResult<Option<Vec<u8>>> {
        match &self.frozen {
            Some(frozen) => Ok(frozen.get(key).cloned()),
            None => Err(StorageError::Closed),
        }
    }

    fn close(&mut self) -> StorageResult<()> {
        self.frozen = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree_with(pairs: &[(&[u8], &[u8])]) -> KeyTree {
        let tree = KeyTree::new();
        for (k, v) in pairs {
            tree.insert(k, v);
        }
        tree
    }

    fn sample() -> KeyTree {
        tree_with(&[
            (b"five", b"5"),
            (b"four", b"4"),
            (b"one", b"1"),
            (b"three", b"3"),
            (b"two", b"2"),
        ])
    }

    #[test]
    fn peek_reads_without_consuming() {
        let tree = sample();
        let iter = tree.iter();
        assert_eq!(iter.peek_next().unwrap().0, b"five");
        assert_eq!(iter.peek_next().unwrap().0, b"five");
    }

    #[test]
    fn advance_walks_forward_in_key_order() {
        let tree = sample();
        let mut iter = tree.iter();
        iter.seek_to_first();

        let mut seen = Vec::new();
        while let Some((key, _)) = iter.peek_next() {
            seen.push(key);
            iter.advance();
        }
        assert_eq!(seen, vec![b"five".to_vec(), b"four".to_vec(), b"one".to_vec(), b"three".to_vec(), b"two".to_vec()]);
    }

    #[test]
    fn advance_reports_position_validity() {
        let tree = tree_with(&[(b"a", b"1"), (b"b", b"2")]);
        let mut iter = tree.iter();
        iter.seek_to_first();

        assert!(iter.advance());
        assert!(!iter.advance());
        assert!(!iter.has_next());
    }

    #[test]
    fn seek_to_last_peeks_last_entry() {
        let tree = sample();
        let mut iter = tree.iter();
        iter.seek_to_last();
        assert_eq!(iter.peek_next().unwrap().0, b"two");
    }

    #[test]
    fn retreat_walks_backward() {
        let tree = sample();
        let mut iter = tree.iter();
        iter.seek_to_last();

        let mut seen = vec![iter.peek_next().unwrap().0];
        while iter.retreat() {
            seen.push(iter.peek_next().unwrap().0);
        }
        assert_eq!(seen, vec![b"two".to_vec(), b"three".to_vec(), b"one".to_vec(), b"four".to_vec(), b"five".to_vec()]);
    }

    #[test]
    fn retreat_at_start_does_not_move() {
        let tree = sample();
        let mut iter = tree.iter();
        iter.seek_to_first();
        assert!(!iter.retreat());
        assert_eq!(iter.peek_next().unwrap().0, b"five");
    }

    #[test]
    fn seek_lands_on_first_key_at_or_after_target() {
        let tree = sample();
        let mut iter = tree.iter();

        iter.seek(b"four");
        assert_eq!(iter.peek_next().unwrap().0, b"four");

        iter.seek(b"f");
        assert_eq!(iter.peek_next().unwrap().0, b"five");

        iter.seek(b"zzz");
        assert!(iter.peek_next().is_none());
        assert!(!iter.has_next());
        assert!(iter.has_prev());
    }

    #[test]
    fn retreat_after_overshooting_seek() {
        let tree = sample();
        let mut iter = tree.iter();
        iter.seek(b"three\xff");
        assert_eq!(iter.peek_next().unwrap().0, b"two");
        assert!(iter.retreat());
        assert_eq!(iter.peek_next().unwrap().0, b"three");
    }

    #[test]
    fn empty_tree_iterator() {
        let tree = KeyTree::new();
        let mut iter = tree.iter();
        iter.seek_to_first();
        assert!(!iter.has_next());
        iter.seek_to_last();
        assert!(!iter.has_next());
        assert!(!iter.has_prev());
        assert!(!iter.retreat());
    }

    #[test]
    fn iterator_observes_live_writes() {
        let tree = tree_with(&[(b"a", b"1")]);
        let mut iter = tree.iter();
        iter.seek_to_first();
        iter.advance();
        assert!(!iter.has_next());

        tree.insert(b"b", b"2");
        assert_eq!(iter.peek_next().unwrap().0, b"b");
    }

    #[test]
    fn closed_iterator_yields_nothing() {
        let tree = sample();
        let mut iter = tree.iter();
        iter.close().unwrap();
        iter.close().unwrap();
        assert!(!iter.has_next());
        assert!(iter.peek_next().is_none());
    }

    #[test]
    fn empty_key_is_a_valid_entry() {
        let tree = tree_with(&[(b"", b"empty"), (b"a", b"1")]);
        let mut iter = tree.iter();
        iter.seek_to_first();
        assert_eq!(iter.peek_next().unwrap().0, b"");
        assert!(iter.advance());
        assert_eq!(iter.peek_next().unwrap().0, b"a");
    }

    #[test]
    fn snapshot_is_frozen() {
        let tree = sample();
        let snapshot = tree.freeze();
        tree.insert(b"one", b"changed");
        tree.remove(b"two");

        assert_eq!(snapshot.get(b"one").unwrap(), Some(b"1".to_vec()));
        assert_eq!(snapshot.get(b"two").unwrap(), Some(b"2".to_vec()));
    }

    #[test]
    fn closed_snapshot_fails_cleanly() {
        let tree = sample();
        let mut snapshot = tree.freeze();
        snapshot.close().unwrap();
        assert!(matches!(snapshot.get(b"one"), Err(StorageError::Closed)));
    }

    #[test]
    fn apply_batch_last_writer_wins() {
        let tree = KeyTree::new();
        let mut batch = WriteBatch::new();
        batch.put(b"k", b"first");
        batch.delete(b"k");
        batch.put(b"k", b"last");
        tree.apply(&batch);
        assert_eq!(tree.get(b"k"), Some(b"last".to_vec()));
    }
}

//! Storage engine trait definitions.

use crate::error::StorageResult;

/// An ordered key-value storage engine for RangeDB.
///
/// Engines are **opaque byte stores** with a total order on keys: unsigned
/// byte-lexicographic comparison, shorter-is-less on a common prefix. RangeDB
/// owns all iteration, bounding, and transaction semantics - engines provide
/// only the primitives below.
///
/// # Invariants
///
/// - `get` returns exactly the bytes previously written for that key
/// - `apply_batch` is atomic: either every operation in the batch lands or
///   none does, and no reader observes an intermediate state
/// - `snapshot` pins the engine state at the moment of the call
/// - Engines must be `Send + Sync` for concurrent access
///
/// # Implementors
///
/// - [`super::MemoryEngine`] - ordered in-memory engine for tests and
///   ephemeral stores
/// - [`super::FileEngine`] - log-backed persistent engine
pub trait StorageEngine: Send + Sync {
    /// Reads the value stored for `key`.
    ///
    /// Returns `Ok(None)` if the key is not present. A present key with an
    /// empty value returns `Ok(Some(vec![]))` - the two are distinct.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine rejects the key bytes or the handle
    /// is closed.
    fn get(&self, key: &[u8]) -> StorageResult<Option<Vec<u8>>>;

    /// Inserts or overwrites the value stored for `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine rejects the key or value bytes, or if
    /// the write cannot be recorded.
    fn put(&self, key: &[u8], value: &[u8]) -> StorageResult<()>;

    /// Removes the value stored for `key`.
    ///
    /// Deleting an absent key is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine rejects the key bytes, or if the
    /// write cannot be recorded.
    fn delete(&self, key: &[u8]) -> StorageResult<()>;

    /// Creates a raw position-based iterator over the whole key space.
    ///
    /// Creating the iterator performs no seek; the caller positions it with
    /// the [`RawIterator`] primitives. The iterator reads live engine state:
    /// writes that land during a traversal may or may not be observed.
    ///
    /// # Errors
    ///
    /// Returns an error if the handle is closed.
    fn raw_iterator(&self) -> StorageResult<Box<dyn RawIterator>>;

    /// Applies every operation in `batch` as one indivisible unit.
    ///
    /// Operations apply in recording order, so a later write to a key
    /// supersedes an earlier one within the same batch.
    ///
    /// # Errors
    ///
    /// Returns an error if any operation is rejected or the commit cannot
    /// be recorded; in that case no operation from the batch is applied.
    fn apply_batch(&self, batch: &WriteBatch) -> StorageResult<()>;

    /// Pins a point-in-time marker over the current engine state.
    ///
    /// # Errors
    ///
    /// Returns an error if the handle is closed.
    fn snapshot(&self) -> StorageResult<Box<dyn RawSnapshot>>;

    /// Compacts the stored representation of the key range `[from, to]`.
    ///
    /// `None` bounds extend the range to the corresponding end of the key
    /// space. Engines without a meaningful compaction step may treat this
    /// as a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the rewrite fails; the pre-compaction data
    /// remains readable in that case.
    fn compact_range(&self, from: Option<&[u8]>, to: Option<&[u8]>) -> StorageResult<()>;

    /// Forces buffered writes to durable storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the flush operation fails.
    fn sync(&self) -> StorageResult<()>;

    /// Closes the engine handle.
    ///
    /// Closing is idempotent. Operations on a closed handle fail with
    /// [`crate::StorageError::Closed`].
    ///
    /// # Errors
    ///
    /// Returns an error if the final flush fails.
    fn close(&self) -> StorageResult<()>;
}

/// A positionable iterator over an engine's sorted key space.
///
/// The iterator models a *gap* between entries: [`RawIterator::peek_next`]
/// reads the entry just after the gap without consuming it, and
/// [`RawIterator::advance`] / [`RawIterator::retreat`] move the gap one
/// entry forward or backward.
pub trait RawIterator: Send {
    /// Places the gap before the first entry in the key space.
    fn seek_to_first(&mut self);

    /// Places the gap just before the last entry, so that
    /// [`RawIterator::peek_next`] reads the last entry. On an empty key
    /// space this is the same as [`RawIterator::seek_to_first`].
    fn seek_to_last(&mut self);

    /// Places the gap just before the first entry whose key is `>= key`.
    ///
    /// If every key is `< key`, the gap lands past the end and
    /// [`RawIterator::peek_next`] reads nothing.
    fn seek(&mut self, key: &[u8]);

    /// Reports whether an entry exists after the gap.
    fn has_next(&self) -> bool;

    /// Reports whether an entry exists before the gap.
    fn has_prev(&self) -> bool;

    /// Reads the entry just after the gap without moving it.
    fn peek_next(&self) -> Option<(Vec<u8>, Vec<u8>)>;

    /// Moves the gap past the entry [`RawIterator::peek_next`] reads.
    ///
    /// Returns whether an entry exists at the new position; `false` means
    /// the iterator stepped past the last entry.
    fn advance(&mut self) -> bool;

    /// Moves the gap back before the previous entry, so that
    /// [`RawIterator::peek_next`] reads it.
    ///
    /// Returns `false` without moving if no entry precedes the gap.
    fn retreat(&mut self) -> bool;

    /// Releases the iterator's engine resources. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine reports a release failure.
    fn close(&mut self) -> StorageResult<()>;
}

/// A point-in-time marker over an engine's state.
///
/// The marker owns the frozen view; reads through it never observe writes
/// made after its creation.
pub trait RawSnapshot: Send + Sync {
    /// Reads the value visible for `key` at the marker's point in time.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine rejects the key bytes.
    fn get(&self, key: &[u8]) -> StorageResult<Option<Vec<u8>>>;

    /// Releases the marker. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine reports a release failure.
    fn close(&mut self) -> StorageResult<()>;
}

/// A single recorded batch operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOp {
    /// Insert or overwrite a key.
    Put {
        /// Key bytes.
        key: Vec<u8>,
        /// Value bytes.
        value: Vec<u8>,
    },
    /// Remove a key.
    Delete {
        /// Key bytes.
        key: Vec<u8>,
    },
}

/// An ordered list of write operations applied atomically.
///
/// Recorded operations are not visible to any reader until the batch is
/// committed with [`StorageEngine::apply_batch`]. Dropping an uncommitted
/// batch discards it.
#[derive(Debug, Clone, Default)]
pub struct WriteBatch {
    ops: Vec<BatchOp>,
}

impl WriteBatch {
    /// Creates an empty batch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a put operation.
    pub fn put(&mut self, key: &[u8], value: &[u8]) {
        self.ops.push(BatchOp::Put {
            key: key.to_vec(),
            value: value.to_vec(),
        });
    }

    /// Records a delete operation.
    pub fn delete(&mut self, key: &[u8]) {
        self.ops.push(BatchOp::Delete { key: key.to_vec() });
    }

    /// Returns the recorded operations in order.
    #[must_use]
    pub fn ops(&self) -> &[BatchOp] {
        &self.ops
    }

    /// Returns the number of recorded operations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Reports whether the batch records no operations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

/// Configuration recognized when constructing an engine.
///
/// Engines use the options they understand and ignore the rest; an ignored
/// option is not an error.
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Create the store if it does not exist.
    pub create_if_missing: bool,
    /// Fail if the store already exists.
    pub error_if_exists: bool,
    /// Treat mid-log corruption as a hard error instead of a torn tail.
    pub paranoid_checks: bool,
    /// Buffer size for the write path, in bytes.
    pub write_buffer_size: usize,
    /// Maximum number of open files. Ignored by the bundled engines.
    pub max_open_files: u32,
    /// Block restart interval. Ignored by the bundled engines.
    pub block_restart_interval: u32,
    /// Block size in bytes. Ignored by the bundled engines.
    pub block_size: usize,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            create_if_missing: true,
            error_if_exists: false,
            paranoid_checks: false,
            write_buffer_size: 4 * 1024 * 1024, // 4 MiB
            max_open_files: 1000,
            block_restart_interval: 16,
            block_size: 4096,
        }
    }
}

//! Database facade.

use crate::batch::Batch;
use crate::config::Config;
use crate::cursor::Cursor;
use crate::error::{CoreError, CoreResult};
use crate::scan::ScanSpec;
use crate::snapshot::Snapshot;
use crate::types::check_payload;
use parking_lot::RwLock;
use rangedb_storage::{FileEngine, MemoryEngine, StorageEngine};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, trace};

/// The main store handle.
///
/// `Database` composes the engine underneath with the cursor, snapshot,
/// and batch constructs into the single API consumers use:
/// - `get` / `put` / `delete` for single records
/// - [`Database::scan`] for bounded, directional range scans
/// - [`Database::batch`] for atomic multi-operation writes
/// - [`Database::snapshot`] for point-in-time reads
///
/// # Opening a store
///
/// ```rust,ignore
/// use rangedb_core::{Config, Database, ScanSpec};
///
/// let db = Database::open(Path::new("my_store"))?;
/// db.put(b"one", b"1")?;
///
/// let mut cursor = db.scan(ScanSpec::new())?;
/// while cursor.has_next() {
///     let entry = cursor.next_entry()?;
///     // ...
/// }
/// cursor.close()?;
/// db.close()?;
/// ```
///
/// # In-memory stores
///
/// For tests and ephemeral data, use [`Database::open_in_memory`].
pub struct Database {
    config: Config,
    engine: Arc<dyn StorageEngine>,
    is_open: RwLock<bool>,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("config", &self.config)
            .field("is_open", &self.is_open)
            .finish_non_exhaustive()
    }
}

impl Database {
    /// Opens a store at `path` with default configuration.
    ///
    /// Creates the store if it does not exist (the default
    /// `create_if_missing` is true).
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Open`] if the engine cannot open the store;
    /// the engine's message is preserved.
    pub fn open(path: &Path) -> CoreResult<Self> {
        Self::open_with_config(path, Config::default())
    }

    /// Opens a store at `path` with custom configuration.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let config = Config::new().create_if_missing(false);
    /// let db = Database::open_with_config(Path::new("my_store"), config)?;
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Open`] if the engine cannot open the store -
    /// the store is missing with `create_if_missing` disabled, exists with
    /// `error_if_exists` enabled, is locked by another process, or fails
    /// its log replay.
    pub fn open_with_config(path: &Path, config: Config) -> CoreResult<Self> {
        let engine =
            FileEngine::open(path, &config.engine_options()).map_err(CoreError::open)?;
        debug!(store = %path.display(), "database opened");
        Ok(Self::compose(config, Arc::new(engine)))
    }

    /// Opens a fresh in-memory store.
    ///
    /// Data lives only as long as the handle; nothing touches disk.
    #[must_use]
    pub fn open_in_memory() -> Self {
        Self::compose(Config::default(), Arc::new(MemoryEngine::new()))
    }

    /// Wraps an already-constructed engine.
    ///
    /// This is the lower-level constructor for callers that bring their
    /// own [`StorageEngine`] implementation; prefer [`Database::open`]
    /// otherwise.
    #[must_use]
    pub fn with_engine(config: Config, engine: Arc<dyn StorageEngine>) -> Self {
        Self::compose(config, engine)
    }

    fn compose(config: Config, engine: Arc<dyn StorageEngine>) -> Self {
        Self {
            config,
            engine,
            is_open: RwLock::new(true),
        }
    }

    /// Repairs the store at `path`, discarding a corrupt log tail.
    ///
    /// The store must not be open elsewhere.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Open`] if the store is missing, locked, or
    /// unreadable.
    pub fn repair(path: &Path) -> CoreResult<()> {
        FileEngine::repair(path).map_err(CoreError::open)
    }

    /// Destroys the store at `path` entirely.
    ///
    /// Destroying a store that does not exist is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Open`] if the store is locked or removal
    /// fails.
    pub fn destroy(path: &Path) -> CoreResult<()> {
        FileEngine::destroy(path).map_err(CoreError::open)
    }

    /// Reads the value stored for `key`.
    ///
    /// Returns `Ok(None)` if the key is not present - distinct from a
    /// present key holding an empty value.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidArgument`] if the engine rejects the
    /// key bytes, or [`CoreError::DatabaseClosed`] after close.
    pub fn get(&self, key: &[u8]) -> CoreResult<Option<Vec<u8>>> {
        self.ensure_open()?;
        check_payload(key, "key")?;
        Ok(self.engine.get(key)?)
    }

    /// Inserts or overwrites the value stored for `key`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidArgument`] if the engine rejects the
    /// key or value bytes, or [`CoreError::DatabaseClosed`] after close.
    pub fn put(&self, key: &[u8], value: &[u8]) -> CoreResult<()> {
        self.ensure_open()?;
        check_payload(key, "key")?;
        check_payload(value, "value")?;
        Ok(self.engine.put(key, value)?)
    }

    /// Removes the value stored for `key`.
    ///
    /// Deleting an absent key is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidArgument`] if the engine rejects the
    /// key bytes, or [`CoreError::DatabaseClosed`] after close.
    pub fn delete(&self, key: &[u8]) -> CoreResult<()> {
        self.ensure_open()?;
        check_payload(key, "key")?;
        Ok(self.engine.delete(key)?)
    }

    /// Creates a cursor over the key space, configured by `spec`.
    ///
    /// Construction is lazy: no seek happens until the cursor is first
    /// pulled. The cursor must be closed (or dropped, or fully consumed
    /// through [`Cursor::each`]) to release its engine iterator.
    ///
    /// A plain scan reads live engine state: writes committed while the
    /// traversal is in progress may be observed mid-scan. Read through a
    /// [`Snapshot`] when point-in-time consistency matters.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::DatabaseClosed`] after close.
    pub fn scan(&self, spec: ScanSpec) -> CoreResult<Cursor> {
        self.ensure_open()?;
        let raw = self.engine.raw_iterator()?;
        Ok(Cursor::new(raw, spec))
    }

    /// Runs `build` against a fresh [`Batch`], committing atomically on
    /// success.
    ///
    /// If `build` returns `Ok`, every recorded operation is applied to the
    /// store as one indivisible unit; no reader observes a partial batch.
    /// If `build` returns `Err`, nothing is committed and the batch is
    /// discarded. The batch resource is released either way.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// db.batch(|batch| {
    ///     batch.delete(b"some")?;
    ///     batch.put(b"another", b"value")?;
    ///     batch.put(b"more", b"data")?;
    ///     Ok(())
    /// })?;
    /// ```
    ///
    /// # Errors
    ///
    /// Propagates the closure's error without committing, or the engine's
    /// commit failure - in which case the store is left unmodified by this
    /// batch.
    pub fn batch<F, T>(&self, build: F) -> CoreResult<T>
    where
        F: FnOnce(&mut Batch) -> CoreResult<T>,
    {
        self.ensure_open()?;
        let mut batch = Batch::new();
        let out = build(&mut batch)?;
        trace!(ops = batch.len(), "committing batch");
        self.engine.apply_batch(&batch.into_inner())?;
        Ok(out)
    }

    /// Pins a read-only view of the store at this instant.
    ///
    /// Writes performed after this call are never observable through the
    /// returned snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::DatabaseClosed`] after close.
    pub fn snapshot(&self) -> CoreResult<Snapshot> {
        self.ensure_open()?;
        Ok(Snapshot::new(self.engine.snapshot()?))
    }

    /// Compacts the stored representation of the key range `[from, to]`.
    ///
    /// `None` bounds extend the range to the corresponding end of the key
    /// space.
    ///
    /// # Errors
    ///
    /// Propagates the engine's compaction failure.
    pub fn compact_range(&self, from: Option<&[u8]>, to: Option<&[u8]>) -> CoreResult<()> {
        self.ensure_open()?;
        self.engine.compact_range(from, to)?;
        Ok(())
    }

    /// Closes the store.
    ///
    /// Idempotent. Subsequent operations fail with
    /// [`CoreError::DatabaseClosed`]; cursors and snapshots created
    /// earlier keep their own lifecycles.
    ///
    /// # Errors
    ///
    /// Propagates the engine's final flush failure.
    pub fn close(&self) -> CoreResult<()> {
        let mut is_open = self.is_open.write();
        if !*is_open {
            return Ok(());
        }
        self.engine.close()?;
        *is_open = false;
        debug!("database closed");
        Ok(())
    }

    /// Reports whether the handle is open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        *self.is_open.read()
    }

    /// Returns the configuration the store was opened with.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    fn ensure_open(&self) -> CoreResult<()> {
        if *self.is_open.read() {
            Ok(())
        } else {
            Err(CoreError::DatabaseClosed)
        }
    }
}

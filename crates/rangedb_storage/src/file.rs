//! Log-backed persistent storage engine.
//!
//! Store layout:
//!
//! ```text
//! <store_path>/
//! ├─ LOCK       # Advisory lock for single-process access
//! └─ store.log  # Append-only record log
//! ```
//!
//! Every write appends a CRC-framed record to the log (see [`crate::log`]);
//! the full key space is rebuilt from the log into an in-memory ordered
//! tree at open. Batches are single records, so replay can never observe
//! half a batch.

use crate::engine::{
    EngineOptions, RawIterator, RawSnapshot, StorageEngine, WriteBatch,
};
use crate::error::{StorageError, StorageResult};
use crate::log::{LogRecord, LogReplay};
use crate::tree::KeyTree;
use fs2::FileExt;
use parking_lot::{Mutex, RwLock};
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// File names within the store directory.
const LOCK_FILE: &str = "LOCK";
const LOG_FILE: &str = "store.log";
/// Temporary file for atomic log rewrites.
const LOG_TEMP: &str = "store.log.tmp";

/// A persistent engine backed by an append-only record log.
///
/// The engine holds its full key space in memory and replays the log at
/// open, so open cost and memory are proportional to store size. Writes
/// are appended to the log before they become visible to readers.
///
/// # Thread Safety
///
/// The engine is thread-safe; an exclusive advisory lock on the store
/// directory prevents concurrent access from other processes.
pub struct FileEngine {
    path: PathBuf,
    tree: KeyTree,
    log: Mutex<BufWriter<File>>,
    open: RwLock<bool>,
    /// Held for the lifetime of the engine; releasing it unlocks the store.
    _lock_file: File,
}

impl FileEngine {
    /// Opens or creates a store at `path`.
    ///
    /// Replays the record log into memory, honoring `create_if_missing`,
    /// `error_if_exists`, `paranoid_checks`, and `write_buffer_size` from
    /// `options`; the remaining options do not apply to this engine and
    /// are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The store does not exist and `create_if_missing` is false
    /// - The store exists and `error_if_exists` is true
    /// - Another process holds the store lock (`Locked`)
    /// - The log is corrupted and `paranoid_checks` is true
    /// - I/O errors occur
    pub fn open(path: &Path, options: &EngineOptions) -> StorageResult<Self> {
        if !path.exists() {
            if !options.create_if_missing {
                return Err(StorageError::open(format!(
                    "store does not exist and create_if_missing is false: {}",
                    path.display()
                )));
            }
            fs::create_dir_all(path)?;
        } else if !path.is_dir() {
            return Err(StorageError::open(format!(
                "path is not a directory: {}",
                path.display()
            )));
        }

        let log_path = path.join(LOG_FILE);
        if options.error_if_exists && log_path.exists() {
            return Err(StorageError::open(format!(
                "store already exists and error_if_exists is true: {}",
                path.display()
            )));
        }

        let lock_file = Self::acquire_lock(path)?;

        let tree = KeyTree::new();
        let mut log_file = OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(&log_path)?;

        let mut image = Vec::new();
        log_file.read_to_end(&mut image)?;
        let replayed = Self::replay(&tree, &image, options.paranoid_checks)?;
        if replayed < image.len() as u64 {
            // Discard the torn tail so appends continue from a good boundary
            log_file.set_len(replayed)?;
            log_file.sync_all()?;
        }
        debug!(
            store = %path.display(),
            entries = tree.len(),
            log_bytes = replayed,
            "opened store"
        );

        Ok(Self {
            path: path.to_path_buf(),
            tree,
            log: Mutex::new(BufWriter::with_capacity(
                options.write_buffer_size.max(4096),
                log_file,
            )),
            open: RwLock::new(true),
            _lock_file: lock_file,
        })
    }

    /// Truncates a corrupt log tail in place.
    ///
    /// The store must not be open. Everything up to the last decodable
    /// record is kept; the rest is discarded.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is missing, locked, or unreadable.
    pub fn repair(path: &Path) -> StorageResult<()> {
        if !path.is_dir() {
            return Err(StorageError::open(format!(
                "store does not exist: {}",
                path.display()
            )));
        }
        let _lock_file = Self::acquire_lock(path)?;

        let log_path = path.join(LOG_FILE);
        if !log_path.exists() {
            return Ok(());
        }

        let image = fs::read(&log_path)?;
        let mut replay = LogReplay::new(&image);
        for result in &mut replay {
            if result.is_err() {
                break;
            }
        }
        let keep = replay.valid_len();
        if keep < image.len() as u64 {
            debug!(
                store = %path.display(),
                discarded = image.len() as u64 - keep,
                "repair truncated log tail"
            );
            let log_file = OpenOptions::new().write(true).open(&log_path)?;
            log_file.set_len(keep)?;
            log_file.sync_all()?;
        }
        Ok(())
    }

    /// Removes the store at `path` entirely.
    ///
    /// Destroying a store that does not exist is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is locked or removal fails.
    pub fn destroy(path: &Path) -> StorageResult<()> {
        if !path.exists() {
            return Ok(());
        }
        // Refuse to delete a store another process is using
        let lock_file = Self::acquire_lock(path)?;
        debug!(store = %path.display(), "destroying store");
        drop(lock_file);
        fs::remove_dir_all(path)?;
        Ok(())
    }

    fn acquire_lock(path: &Path) -> StorageResult<File> {
        let lock_path = path.join(LOCK_FILE);
        let lock_file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)?;
        if lock_file.try_lock_exclusive().is_err() {
            return Err(StorageError::Locked);
        }
        Ok(lock_file)
    }

    fn replay(tree: &KeyTree, image: &[u8], paranoid: bool) -> StorageResult<u64> {
        let mut replay = LogReplay::new(image);
        for result in &mut replay {
            match result {
                Ok(record) => Self::apply_record(tree, record),
                Err(e) if paranoid => return Err(e),
                // Treat corruption past the last good record as a torn
                // tail; the caller truncates at valid_len
                Err(_) => break,
            }
        }
        if paranoid && replay.valid_len() < image.len() as u64 {
            return Err(StorageError::corrupted(
                "log ends in a truncated record and paranoid_checks is true",
            ));
        }
        Ok(replay.valid_len())
    }

    fn apply_record(tree: &KeyTree, record: LogRecord) {
        match record {
            LogRecord::Put { key, value } => tree.insert(&key, &value),
            LogRecord::Delete { key } => tree.remove(&key),
            LogRecord::Batch { ops } => {
                let mut batch = WriteBatch::new();
                for op in ops {
                    match op {
                        crate::engine::BatchOp::Put { key, value } => batch.put(&key, &value),
                        crate::engine::BatchOp::Delete { key } => batch.delete(&key),
                    }
                }
                tree.apply(&batch);
            }
        }
    }

    fn append(log: &mut BufWriter<File>, record: &LogRecord) -> StorageResult<()> {
        let encoded = record.encode()?;
        log.write_all(&encoded)?;
        log.flush()?;
        Ok(())
    }

    fn ensure_open(&self) -> StorageResult<()> {
        if *self.open.read() {
            Ok(())
        } else {
            Err(StorageError::Closed)
        }
    }
}

impl StorageEngine for FileEngine {
    fn get(&self, key: &[u8]) -> StorageResult<Option<Vec<u8>>> {
        self.ensure_open()?;
        Ok(self.tree.get(key))
    }

    fn put(&self, key: &[u8], value: &[u8]) -> StorageResult<()> {
        self.ensure_open()?;
        let record = LogRecord::Put {
            key: key.to_vec(),
            value: value.to_vec(),
        };
        // The log lock spans the tree update so log order matches apply
        // order
        let mut log = self.log.lock();
        Self::append(&mut log, &record)?;
        self.tree.insert(key, value);
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> StorageResult<()> {
        self.ensure_open()?;
        let record = LogRecord::Delete { key: key.to_vec() };
        let mut log = self.log.lock();
        Self::append(&mut log, &record)?;
        self.tree.remove(key);
        Ok(())
    }

    fn raw_iterator(&self) -> StorageResult<Box<dyn RawIterator>> {
        self.ensure_open()?;
        Ok(Box::new(self.tree.iter()))
    }

    fn apply_batch(&self, batch: &WriteBatch) -> StorageResult<()> {
        self.ensure_open()?;
        if batch.is_empty() {
            return Ok(());
        }
        let record = LogRecord::Batch {
            ops: batch.ops().to_vec(),
        };
        let mut log = self.log.lock();
        Self::append(&mut log, &record)?;
        self.tree.apply(batch);
        Ok(())
    }

    fn snapshot(&self) -> StorageResult<Box<dyn RawSnapshot>> {
        self.ensure_open()?;
        Ok(Box::new(self.tree.freeze()))
    }

    fn compact_range(&self, _from: Option<&[u8]>, _to: Option<&[u8]>) -> StorageResult<()> {
        self.ensure_open()?;

        // A single log can only be rewritten whole, which compacts any
        // requested subrange along with the rest
        let mut log = self.log.lock();
        let entries = self.tree.dump();

        let temp_path = self.path.join(LOG_TEMP);
        let mut temp = BufWriter::new(File::create(&temp_path)?);
        for (key, value) in entries {
            let record = LogRecord::Put { key, value };
            temp.write_all(&record.encode()?)?;
        }
        let temp = temp
            .into_inner()
            .map_err(|e| StorageError::Io(e.into_error()))?;
        temp.sync_all()?;
        drop(temp);

        let log_path = self.path.join(LOG_FILE);
        fs::rename(&temp_path, &log_path)?;
        sync_directory(&self.path)?;

        let log_file = OpenOptions::new().append(true).open(&log_path)?;
        let capacity = log.capacity();
        *log = BufWriter::with_capacity(capacity, log_file);
        debug!(store = %self.path.display(), "compacted log");
        Ok(())
    }

    fn sync(&self) -> StorageResult<()> {
        self.ensure_open()?;
        let mut log = self.log.lock();
        log.flush()?;
        log.get_ref().sync_all()?;
        Ok(())
    }

    fn close(&self) -> StorageResult<()> {
        let mut open = self.open.write();
        if !*open {
            return Ok(());
        }
        let mut log = self.log.lock();
        log.flush()?;
        log.get_ref().sync_all()?;
        *open = false;
        Ok(())
    }
}

impl Drop for FileEngine {
    fn drop(&mut self) {
        // Best-effort flush; explicit close reports failures instead
        if *self.open.read() {
            let mut log = self.log.lock();
            let _ = log.flush();
        }
    }
}

/// Fsyncs a directory so renames and truncations within it are durable.
#[cfg(unix)]
fn sync_directory(path: &Path) -> StorageResult<()> {
    let dir = File::open(path)?;
    dir.sync_all()?;
    Ok(())
}

#[cfg(not(unix))]
fn sync_directory(_path: &Path) -> StorageResult<()> {
    // Windows NTFS journaling covers metadata durability
    Ok(())
}

//! # RangeDB Storage
//!
//! Ordered key-value engine contract and bundled engines for RangeDB.
//!
//! This crate defines the seam between RangeDB's access layer and the
//! storage engine underneath it. Engines are **opaque byte stores** with a
//! byte-lexicographic total order on keys - they provide point reads and
//! writes, a positionable raw iterator, atomic batch application, and
//! point-in-time snapshot markers. Everything above that (directional
//! scans, bounds, limits, transactional semantics) belongs to the access
//! layer.
//!
//! ## Design Principles
//!
//! - Keys and values are opaque byte strings; empty bytes are valid
//! - Batches are all-or-nothing; no reader observes a partial batch
//! - Snapshot markers freeze the key space at creation
//! - Engines must be `Send + Sync` for concurrent access
//!
//! ## Available Engines
//!
//! - [`MemoryEngine`] - for testing and ephemeral stores
//! - [`FileEngine`] - persistent, backed by an append-only record log
//!
//! ## Example
//!
//! ```rust
//! use rangedb_storage::{MemoryEngine, StorageEngine};
//!
//! let engine = MemoryEngine::new();
//! engine.put(b"one", b"1").unwrap();
//!
//! let mut iter = engine.raw_iterator().unwrap();
//! iter.seek_to_first();
//! assert_eq!(iter.peek_next().unwrap().0, b"one");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod engine;
mod error;
mod file;
mod log;
mod memory;
mod tree;

pub use engine::{
    BatchOp, EngineOptions, RawIterator, RawSnapshot, StorageEngine, WriteBatch,
};
pub use error::{StorageError, StorageResult};
pub use file::FileEngine;
pub use memory::MemoryEngine;

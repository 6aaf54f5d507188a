//! # RangeDB Core
//!
//! A thin, idiomatic access layer over an embedded, ordered key-value
//! storage engine.
//!
//! This crate provides:
//! - [`Cursor`] - a stateful, resumable, bidirectional, boundable iterator
//!   over the engine's sorted key space, with lazy positioning and a
//!   single-entry look-ahead for non-destructive `has_next` checks
//! - Lazy transformation over scans: [`Cursor`] implements [`Iterator`],
//!   so `map`/`filter` chains are pull-based and touch the engine only
//!   when driven
//! - [`Snapshot`] - a read-only view frozen at creation time
//! - [`Batch`] - an atomic unit of put/delete operations
//! - [`Database`] - the facade composing all of the above with
//!   single-record CRUD
//!
//! The engine underneath is pluggable (see [`rangedb_storage`]); the
//! bundled engines cover in-memory and log-backed persistent stores.
//!
//! ## Example
//!
//! ```rust
//! use rangedb_core::{Database, ScanSpec};
//!
//! let db = Database::open_in_memory();
//! for (key, value) in [("one", "1"), ("two", "2"), ("three", "3")] {
//!     db.put(key.as_bytes(), value.as_bytes()).unwrap();
//! }
//!
//! // Descending scan bounded below at "three", at most 2 entries
//! let cursor = db
//!     .scan(ScanSpec::new().from(b"three").limit(2).reverse())
//!     .unwrap();
//! let keys: Vec<_> = cursor.map(|entry| entry.into_parts().0).collect();
//! assert_eq!(keys, vec![b"three".to_vec(), b"one".to_vec()]);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod batch;
mod config;
mod cursor;
mod database;
mod error;
mod scan;
mod snapshot;
mod types;

pub use batch::Batch;
pub use config::Config;
pub use cursor::Cursor;
pub use database::Database;
pub use error::{CoreError, CoreResult};
pub use scan::ScanSpec;
pub use snapshot::Snapshot;
pub use types::{Entry, MAX_PAYLOAD_LEN};

//! Bounded, directional, resumable cursor over an engine's key space.

use crate::error::{CoreError, CoreResult};
use crate::scan::ScanSpec;
use crate::types::Entry;
use rangedb_storage::RawIterator;

/// The cursor's look-ahead cache.
///
/// `Empty` and `Consumed` both trigger a recompute on the next pull.
/// Exhaustion is tracked in a separate flag, never inferred from the
/// cache: an entry holding empty bytes is still an entry.
#[derive(Debug)]
enum LookAhead {
    /// Nothing computed yet.
    Empty,
    /// A computed entry waiting for `next_entry`.
    Cached(Entry),
    /// The previous entry was taken; the next pull recomputes.
    Consumed,
}

/// A stateful, resumable traversal of a bounded, directional slice of the
/// key space.
///
/// Construction performs no seek: positioning is deferred to the first
/// pull, so building a cursor and never consuming it costs nothing. The
/// cursor holds exactly one look-ahead entry to support non-destructive
/// [`Cursor::has_next`] checks, and owns the raw engine iterator
/// underneath - it must be closed (or dropped) to release it.
///
/// Within one cursor, entries arrive in strictly monotonic key order,
/// ascending or descending per the spec. A cursor over a plain scan reads
/// live engine state and may observe writes made during the traversal;
/// use a snapshot read path when point-in-time consistency is required.
///
/// # Example
///
/// ```rust,ignore
/// let mut cursor = db.scan(ScanSpec::new().from(b"three").limit(2))?;
/// while cursor.has_next() {
///     let entry = cursor.next_entry()?;
///     // ...
/// }
/// cursor.close()?;
/// ```
pub struct Cursor {
    raw: Box<dyn RawIterator>,
    spec: ScanSpec,
    look_ahead: LookAhead,
    positioned: bool,
    exhausted: bool,
    yielded: u64,
    closed: bool,
}

impl Cursor {
    /// Creates a cursor over `raw` configured by `spec`.
    ///
    /// The raw iterator is owned exclusively by this cursor and must not
    /// be pulled from anywhere else.
    #[must_use]
    pub fn new(raw: Box<dyn RawIterator>, spec: ScanSpec) -> Self {
        Self {
            raw,
            spec,
            look_ahead: LookAhead::Empty,
            positioned: false,
            exhausted: false,
            yielded: 0,
            closed: false,
        }
    }

    /// Consumes and returns the current look-ahead entry.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Exhausted`] if no entry remains. This is
    /// recoverable: check [`Cursor::has_next`] first.
    pub fn next_entry(&mut self) -> CoreResult<Entry> {
        self.fill();
        match std::mem::replace(&mut self.look_ahead, LookAhead::Consumed) {
            LookAhead::Cached(entry) => Ok(entry),
            state => {
                self.look_ahead = state;
                Err(CoreError::Exhausted)
            }
        }
    }

    /// Reports whether another entry remains, computing the look-ahead if
    /// absent.
    ///
    /// Safe to call repeatedly; beyond memoizing the look-ahead it has no
    /// side effects.
    pub fn has_next(&mut self) -> bool {
        self.fill();
        matches!(self.look_ahead, LookAhead::Cached(_))
    }

    /// Rewinds the cursor to its starting position.
    ///
    /// Clears the look-ahead, resets exhaustion and the yield count, and
    /// re-derives the seek position lazily on the next pull. A replayed
    /// traversal yields the same sequence as the first, assuming the
    /// underlying data has not changed.
    pub fn rewind(&mut self) {
        self.look_ahead = LookAhead::Empty;
        self.positioned = false;
        self.exhausted = false;
        self.yielded = 0;
    }

    /// Rewinds, drives a full pass invoking `consumer` per entry, then
    /// closes the cursor.
    ///
    /// This is the convenience path for callers that do not need
    /// resumability.
    ///
    /// # Errors
    ///
    /// Propagates engine release errors from the final close.
    pub fn each<F>(mut self, mut consumer: F) -> CoreResult<()>
    where
        F: FnMut(Entry),
    {
        self.rewind();
        while self.has_next() {
            consumer(self.next_entry()?);
        }
        self.close()
    }

    /// Releases the underlying raw iterator.
    ///
    /// Idempotent; safe to call after exhaustion. A closed cursor yields
    /// no further entries and cannot be rewound back to life.
    ///
    /// # Errors
    ///
    /// Propagates an engine release failure.
    pub fn close(&mut self) -> CoreResult<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.look_ahead = LookAhead::Empty;
        self.raw.close()?;
        Ok(())
    }

    /// Ensures the look-ahead is computed if an entry remains.
    fn fill(&mut self) {
        if matches!(self.look_ahead, LookAhead::Cached(_)) {
            return;
        }
        if self.closed || self.exhausted {
            return;
        }
        if !self.positioned {
            self.position();
            self.positioned = true;
            if self.exhausted {
                return;
            }
        }
        if let Some(limit) = self.spec.limit {
            if self.yielded >= limit {
                return;
            }
        }
        self.compute();
    }

    /// Derives the starting seek position from the spec.
    fn position(&mut self) {
        if let Some(from) = &self.spec.from {
            self.raw.seek(from);
            if self.spec.reverse {
                match self.raw.peek_next() {
                    // Seek landed past the end of the key space: start at
                    // the last key overall. Forward mode has no such
                    // fallback.
                    None => self.raw.seek_to_last(),
                    // Seek landed beyond `from`: start at the nearest key
                    // on the descending side instead
                    Some((key, _)) if key > *from => {
                        if !self.raw.retreat() {
                            self.exhausted = true;
                        }
                    }
                    Some(_) => {}
                }
            }
        } else if self.spec.reverse {
            self.raw.seek_to_last();
        } else {
            self.raw.seek_to_first();
        }
    }

    /// Peeks the current raw position, applies the bounds, and on success
    /// caches the entry and steps the raw position once in the scan
    /// direction.
    fn compute(&mut self) {
        let Some((key, value)) = self.raw.peek_next() else {
            // True end of data
            self.exhausted = true;
            return;
        };

        // A bound violation halts yielding exactly like end-of-data; a
        // later rewind starts the scan over either way
        if self.spec.reverse {
            if let Some(to) = &self.spec.to {
                if key < *to {
                    self.exhausted = true;
                    return;
                }
            }
            if let Some(from) = &self.spec.from {
                // Guards the seek-to-last fallback landing past `from`
                if key > *from {
                    self.exhausted = true;
                    return;
                }
            }
        } else if let Some(to) = &self.spec.to {
            if key > *to {
                self.exhausted = true;
                return;
            }
        }

        self.yielded += 1;
        let stepped = if self.spec.reverse {
            self.raw.retreat()
        } else {
            self.raw.advance()
        };
        if !stepped {
            self.exhausted = true;
        }
        self.look_ahead = LookAhead::Cached(Entry::new(key, value));
    }
}

impl Iterator for Cursor {
    type Item = Entry;

    fn next(&mut self) -> Option<Self::Item> {
        if self.has_next() {
            self.next_entry().ok()
        } else {
            None
        }
    }
}

impl Drop for Cursor {
    fn drop(&mut self) {
        if !self.closed {
            let _ = self.raw.close();
        }
    }
}

impl std::fmt::Debug for Cursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cursor")
            .field("spec", &self.spec)
            .field("positioned", &self.positioned)
            .field("exhausted", &self.exhausted)
            .field("yielded", &self.yielded)
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

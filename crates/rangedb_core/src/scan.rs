//! Scan configuration.

/// Configuration for a directional, bounded range scan.
///
/// - `from` is the starting position: the scan begins at this key if it is
///   present, otherwise at the nearest key on the scan's advancing side.
/// - `to` is the inclusive stop bound: in an ascending scan keys greater
///   than `to` are excluded, in a descending scan keys less than `to` are
///   excluded.
/// - `limit` caps the number of entries yielded regardless of bounds.
///
/// # Example
///
/// ```rust
/// use rangedb_core::ScanSpec;
///
/// let spec = ScanSpec::new().from(b"a").to(b"m").limit(10);
/// assert!(!spec.reverse);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ScanSpec {
    /// Starting position, inclusive when present in the store.
    pub from: Option<Vec<u8>>,
    /// Inclusive stop bound on the scan's advancing side.
    pub to: Option<Vec<u8>>,
    /// Scan in descending key order.
    pub reverse: bool,
    /// Maximum number of entries to yield.
    pub limit: Option<u64>,
}

impl ScanSpec {
    /// Creates an unbounded ascending scan over the whole key space.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the starting position.
    #[must_use]
    pub fn from(mut self, key: impl Into<Vec<u8>>) -> Self {
        self.from = Some(key.into());
        self
    }

    /// Sets the inclusive stop bound.
    #[must_use]
    pub fn to(mut self, key: impl Into<Vec<u8>>) -> Self {
        self.to = Some(key.into());
        self
    }

    /// Scans in descending key order.
    #[must_use]
    pub const fn reverse(mut self) -> Self {
        self.reverse = true;
        self
    }

    /// Caps the number of entries yielded.
    #[must_use]
    pub const fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }
}

//! Core type definitions for the access layer.

use crate::error::{CoreError, CoreResult};
use std::fmt;

/// Largest key or value the layer's log format can frame: lengths are
/// carried in 4-byte fields.
pub const MAX_PAYLOAD_LEN: usize = u32::MAX as usize;

/// Rejects byte payloads the engines cannot frame.
pub(crate) fn check_payload(bytes: &[u8], what: &str) -> CoreResult<()> {
    if bytes.len() > MAX_PAYLOAD_LEN {
        return Err(CoreError::invalid_argument(format!(
            "{what} of {} bytes exceeds the {MAX_PAYLOAD_LEN}-byte limit",
            bytes.len()
        )));
    }
    Ok(())
}

/// A key-value pair produced by a scan.
///
/// Entries are immutable and owned by the caller once yielded; they do not
/// borrow from the cursor or the engine.
#[derive(Clone, PartialEq, Eq)]
pub struct Entry {
    key: Vec<u8>,
    value: Vec<u8>,
}

impl Entry {
    /// Creates an entry from owned key and value bytes.
    #[must_use]
    pub fn new(key: Vec<u8>, value: Vec<u8>) -> Self {
        Self { key, value }
    }

    /// Returns the key bytes.
    #[must_use]
    pub fn key(&self) -> &[u8] {
        &self.key
    }

    /// Returns the value bytes.
    #[must_use]
    pub fn value(&self) -> &[u8] {
        &self.value
    }

    /// Consumes the entry, returning its key and value.
    #[must_use]
    pub fn into_parts(self) -> (Vec<u8>, Vec<u8>) {
        (self.key, self.value)
    }
}

impl fmt::Debug for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entry")
            .field("key", &String::from_utf8_lossy(&self.key))
            .field("value", &String::from_utf8_lossy(&self.value))
            .finish()
    }
}

impl From<(Vec<u8>, Vec<u8>)> for Entry {
    fn from((key, value): (Vec<u8>, Vec<u8>)) -> Self {
        Self::new(key, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_accessors() {
        let entry = Entry::new(b"one".to_vec(), b"1".to_vec());
        assert_eq!(entry.key(), b"one");
        assert_eq!(entry.value(), b"1");
    }

    #[test]
    fn entry_into_parts() {
        let entry = Entry::new(b"one".to_vec(), b"1".to_vec());
        let (key, value) = entry.into_parts();
        assert_eq!(key, b"one");
        assert_eq!(value, b"1");
    }

    #[test]
    fn empty_value_is_representable() {
        let entry = Entry::new(b"key".to_vec(), Vec::new());
        assert_eq!(entry.value(), b"");
    }
}

//! Store configuration.

use rangedb_storage::EngineOptions;

/// Configuration for opening a store.
///
/// One field per recognized option, defaulted when absent; the set matches
/// what LevelDB-style engines accept. Options an engine does not
/// understand are ignored at construction time, never rejected.
#[derive(Debug, Clone)]
pub struct Config {
    /// Whether to create the store if it doesn't exist.
    pub create_if_missing: bool,

    /// Whether to error if the store already exists.
    pub error_if_exists: bool,

    /// Whether to treat detected corruption as a hard open error.
    pub paranoid_checks: bool,

    /// Write buffer size in bytes.
    pub write_buffer_size: usize,

    /// Maximum number of files the engine may hold open.
    pub max_open_files: u32,

    /// Number of keys between block restart points.
    pub block_restart_interval: u32,

    /// Approximate block size in bytes.
    pub block_size: usize,
}

impl Default for Config {
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

impl Config {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether to create the store if missing.
    #[must_use]
    pub const fn create_if_missing(mut self, value: bool) -> Self {
        self.create_if_missing = value;
        self
    }

    /// Sets whether to error if the store exists.
    #[must_use]
    pub const fn error_if_exists(mut self, value: bool) -> Self {
        self.error_if_exists = value;
        self
    }

    /// Sets whether to treat detected corruption as a hard open error.
    #[must_use]
    pub const fn paranoid_checks(mut self, value: bool) -> Self {
        self.paranoid_checks = value;
        self
    }

    /// Sets the write buffer size.
    #[must_use]
    pub const fn write_buffer_size(mut self, size: usize) -> Self {
        self.write_buffer_size = size;
        self
    }

    /// Sets the maximum number of open files.
    #[must_use]
    pub const fn max_open_files(mut self, count: u32) -> Self {
        self.max_open_files = count;
        self
    }

    /// Sets the block restart interval.
    #[must_use]
    pub const fn block_restart_interval(mut self, interval: u32) -> Self {
        self.block_restart_interval = interval;
        self
    }

    /// Sets the block size.
    #[must_use]
    pub const fn block_size(mut self, size: usize) -> Self {
        self.block_size = size;
        self
    }

    /// Translates this configuration into engine construction parameters.
    #[must_use]
    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            create_if_missing: self.create_if_missing,
            error_if_exists: self.error_if_exists,
            paranoid_checks: self.paranoid_checks,
            write_buffer_size: self.write_buffer_size,
            max_open_files: self.max_open_files,
            block_restart_interval: self.block_restart_interval,
            block_size: self.block_size,
        }
    }
}

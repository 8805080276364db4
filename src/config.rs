//! Configuration for Sett
//!
//! Centralized configuration with sensible defaults. Passed explicitly at
//! open time; there are no process-wide mutable defaults.

use std::path::PathBuf;

use crate::codec::KeyEncoding;
use crate::error::{Result, SettError};

/// Main configuration for a Sett instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Root directory for the store file
    /// Internal structure:
    ///   {data_dir}/
    ///     └── sett.redb       (redb database file)
    pub data_dir: PathBuf,

    /// Page cache size handed to the store, `None` keeps the store default
    pub cache_size_bytes: Option<usize>,

    // -------------------------------------------------------------------------
    // Table Configuration
    // -------------------------------------------------------------------------
    /// How table names are combined with logical keys
    pub key_encoding: KeyEncoding,

    /// Lower-case table names when a table is selected
    pub lowercase_tables: bool,

    // -------------------------------------------------------------------------
    // Batch Configuration
    // -------------------------------------------------------------------------
    /// Items per chunk when a batch is flushed
    pub chunk_size: usize,

    /// Upper bound on concurrent chunk writers, `None` means the available
    /// parallelism
    pub max_writers: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./sett_data"),
            cache_size_bytes: None,
            key_encoding: KeyEncoding::LengthPrefixed,
            lowercase_tables: true,
            chunk_size: 500,
            max_writers: None,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Check values that would make batch flushing impossible
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(SettError::Config("chunk_size must be greater than 0".into()));
        }
        if self.max_writers == Some(0) {
            return Err(SettError::Config("max_writers must be greater than 0".into()));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the data directory (root for all storage)
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_dir = path.into();
        self
    }

    /// Set the store page cache size (in bytes)
    pub fn cache_size_bytes(mut self, bytes: usize) -> Self {
        self.config.cache_size_bytes = Some(bytes);
        self
    }

    /// Set the key encoding
    pub fn key_encoding(mut self, encoding: KeyEncoding) -> Self {
        self.config.key_encoding = encoding;
        self
    }

    /// Enable or disable table name lower-casing
    pub fn lowercase_tables(mut self, enabled: bool) -> Self {
        self.config.lowercase_tables = enabled;
        self
    }

    /// Set the number of items per flushed chunk
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.config.chunk_size = size;
        self
    }

    /// Bound the number of concurrent chunk writers
    pub fn max_writers(mut self, count: usize) -> Self {
        self.config.max_writers = Some(count);
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

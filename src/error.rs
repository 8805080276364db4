//! Error types for Sett
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using SettError
pub type Result<T> = std::result::Result<T, SettError>;

/// Unified error type for Sett operations
#[derive(Debug, Error)]
pub enum SettError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Store Errors
    // -------------------------------------------------------------------------
    /// Any failure surfaced by the underlying transactional store
    #[error("Store error: {0}")]
    Store(String),

    /// The store handle has been closed
    #[error("Store is closed")]
    Closed,

    // -------------------------------------------------------------------------
    // Table Errors
    // -------------------------------------------------------------------------
    #[error("Key {key:?} not found in table {table:?}")]
    NotFound { table: String, key: String },

    /// A store failure annotated with the table and key it happened on
    #[error("{op} failed on table {table:?}, key {key:?}: {source}")]
    Operation {
        op: &'static str,
        table: String,
        key: String,
        #[source]
        source: Box<SettError>,
    },

    #[error("Invalid table name: {0}")]
    InvalidTable(String),

    /// Drop is atomic: when this is returned no key of the table was deleted
    #[error("Dropping table {table:?} failed after collecting {collected} keys: {source}")]
    DropFailed {
        table: String,
        collected: usize,
        #[source]
        source: Box<SettError>,
    },

    // -------------------------------------------------------------------------
    // Batch Errors
    // -------------------------------------------------------------------------
    #[error("No batch ready: accumulator is empty")]
    EmptyBatch,

    #[error(transparent)]
    Batch(#[from] BatchError),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl SettError {
    /// Returns true for a Get on an absent key
    pub fn is_not_found(&self) -> bool {
        matches!(self, SettError::NotFound { .. })
    }

    /// Attach table/key context to a store failure.
    ///
    /// `NotFound` and `Closed` already say everything and pass through as-is.
    pub(crate) fn context(self, op: &'static str, table: &str, key: &[u8]) -> SettError {
        match self {
            SettError::NotFound { .. } | SettError::Closed => self,
            source => SettError::Operation {
                op,
                table: table.to_string(),
                key: String::from_utf8_lossy(key).into_owned(),
                source: Box::new(source),
            },
        }
    }
}

/// One or more chunk writers failed during a batch flush.
///
/// Chunks not listed in `failures` were committed.
#[derive(Debug, Error)]
#[error("{} of {} batch chunks failed, first: {}", .failures.len(), .total_chunks, first_cause(.failures))]
pub struct BatchError {
    /// Number of chunks the batch was split into
    pub total_chunks: usize,

    /// Failed chunks, ordered by chunk index
    pub failures: Vec<ChunkFailure>,
}

impl BatchError {
    /// Total number of items that were not written
    pub fn failed_items(&self) -> usize {
        self.failures.iter().map(|f| f.items).sum()
    }
}

/// A single chunk whose write transaction did not commit
#[derive(Debug)]
pub struct ChunkFailure {
    /// Position of the chunk within the batch (0-based)
    pub index: usize,

    /// Number of items in the chunk
    pub items: usize,

    /// Why the chunk's transaction failed
    pub error: SettError,
}

fn first_cause(failures: &[ChunkFailure]) -> String {
    failures
        .first()
        .map(|f| format!("chunk {}: {}", f.index, f.error))
        .unwrap_or_else(|| "none".to_string())
}

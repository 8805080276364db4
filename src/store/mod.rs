//! Store Module
//!
//! The transactional key-value store that tables are layered on.
//!
//! ## Responsibilities
//! - Run closures inside read-only (`view`) and read-write (`update`)
//!   transactions
//! - Point lookups, sets and deletes on physical keys
//! - Ordered prefix iteration (seek to prefix, walk while the key matches)
//!
//! ## Transaction Contract
//! - `update` commits when the closure returns `Ok` and aborts when it
//!   returns `Err`; an aborted transaction leaves no partial writes behind
//! - Deleting an absent key is not an error
//! - Prefix visits happen in ascending lexicographic key order
//!
//! ## Backends
//! - [`RedbStore`]: durable, single redb database file
//! - [`MemoryStore`]: ordered in-memory map, nothing survives the process

mod memory;
mod redb_backend;

pub use memory::MemoryStore;
pub use redb_backend::RedbStore;

use crate::error::Result;

/// Callback invoked for every `(physical key, value)` during a prefix visit
pub type Visitor<'a> = dyn FnMut(&[u8], &[u8]) -> Result<()> + 'a;

/// Operations available inside a read-only transaction
pub trait ReadTxn {
    /// Look up a physical key
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>>;

    /// Visit every entry whose key starts with `prefix`, in key order
    ///
    /// An error returned by `visit` stops the iteration and is propagated.
    fn scan_prefix(&self, prefix: &[u8], visit: &mut Visitor<'_>) -> Result<()>;
}

/// Operations available inside a read-write transaction
pub trait WriteTxn: ReadTxn {
    /// Insert or overwrite a physical key
    fn set(&mut self, key: &[u8], value: &[u8]) -> Result<()>;

    /// Remove a physical key (no-op if absent)
    fn delete(&mut self, key: &[u8]) -> Result<()>;
}

/// An embedded, ordered, transactional key-value store
///
/// Shared across threads by reference: batch flushes run one `update` per
/// chunk concurrently against the same store.
pub trait KvStore: Send + Sync {
    /// Run `f` inside a read-only transaction
    fn view<R, F>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&dyn ReadTxn) -> Result<R>;

    /// Run `f` inside a read-write transaction, committing on `Ok`
    fn update<R, F>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&mut dyn WriteTxn) -> Result<R>;

    /// Release the store
    fn close(self) -> Result<()>
    where
        Self: Sized;
}

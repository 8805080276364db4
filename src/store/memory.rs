//! In-memory store
//!
//! BTreeMap-based store with RwLock for concurrency.
//!
//! ## Concurrency Model
//! - `view` holds the read lock (many concurrent readers)
//! - `update` holds the write lock (one writer at a time), stages changes in
//!   an overlay and applies the overlay only if the closure succeeds

use std::collections::BTreeMap;
use std::ops::Bound;

use parking_lot::RwLock;

use crate::error::Result;

use super::{KvStore, ReadTxn, Visitor, WriteTxn};

/// Ordered in-memory key-value store
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: RwLock<BTreeMap<Vec<u8>, Vec<u8>>>,
}

impl MemoryStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of physical keys currently stored
    pub fn entry_count(&self) -> usize {
        self.data.read().len()
    }

    /// Check if the store holds no keys
    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }
}

impl KvStore for MemoryStore {
    fn view<R, F>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&dyn ReadTxn) -> Result<R>,
    {
        let data = self.data.read();
        f(&MemoryReadTxn { data: &data })
    }

    fn update<R, F>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&mut dyn WriteTxn) -> Result<R>,
    {
        let mut data = self.data.write();

        let mut txn = MemoryWriteTxn {
            base: &data,
            staged: BTreeMap::new(),
        };
        let result = f(&mut txn)?;
        let staged = txn.staged;

        // Commit: closure succeeded, apply the overlay
        for (key, change) in staged {
            match change {
                Some(value) => {
                    data.insert(key, value);
                }
                None => {
                    data.remove(&key);
                }
            }
        }

        Ok(result)
    }

    fn close(self) -> Result<()> {
        Ok(())
    }
}

// =============================================================================
// Transactions
// =============================================================================

struct MemoryReadTxn<'a> {
    data: &'a BTreeMap<Vec<u8>, Vec<u8>>,
}

impl ReadTxn for MemoryReadTxn<'_> {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        Ok(self.data.get(key).cloned())
    }

    fn scan_prefix(&self, prefix: &[u8], visit: &mut Visitor<'_>) -> Result<()> {
        for (key, value) in prefix_range(self.data, prefix) {
            visit(key, value)?;
        }
        Ok(())
    }
}

/// Write transaction; `None` in `staged` marks a pending delete
struct MemoryWriteTxn<'a> {
    base: &'a BTreeMap<Vec<u8>, Vec<u8>>,
    staged: BTreeMap<Vec<u8>, Option<Vec<u8>>>,
}

impl ReadTxn for MemoryWriteTxn<'_> {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        match self.staged.get(key) {
            Some(change) => Ok(change.clone()),
            None => Ok(self.base.get(key).cloned()),
        }
    }

    fn scan_prefix(&self, prefix: &[u8], visit: &mut Visitor<'_>) -> Result<()> {
        // Merge committed entries with this transaction's own changes
        let mut merged: BTreeMap<&[u8], &[u8]> = prefix_range(self.base, prefix)
            .map(|(k, v)| (k.as_slice(), v.as_slice()))
            .collect();

        for (key, change) in prefix_range(&self.staged, prefix) {
            match change {
                Some(value) => {
                    merged.insert(key.as_slice(), value.as_slice());
                }
                None => {
                    merged.remove(key.as_slice());
                }
            }
        }

        for (key, value) in merged {
            visit(key, value)?;
        }
        Ok(())
    }
}

impl WriteTxn for MemoryWriteTxn<'_> {
    fn set(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        self.staged.insert(key.to_vec(), Some(value.to_vec()));
        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> Result<()> {
        self.staged.insert(key.to_vec(), None);
        Ok(())
    }
}

/// Entries from `prefix` onwards while the key still has the prefix
fn prefix_range<'a, V>(
    map: &'a BTreeMap<Vec<u8>, V>,
    prefix: &'a [u8],
) -> impl Iterator<Item = (&'a Vec<u8>, &'a V)> + 'a {
    map.range::<[u8], _>((Bound::Included(prefix), Bound::Unbounded))
        .take_while(move |(key, _)| key.starts_with(prefix))
}

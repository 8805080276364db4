//! Table handle
//!
//! A view of one virtual table. Holds only the table name and its key
//! codec; all durable state lives in the store.
//!
//! ## Operations
//! - `get` / `set` / `delete`: one transaction each
//! - `scan`: one read-only transaction, see [`crate::scan`]
//! - `drop_table`: list keys in a read-only transaction, then delete them
//!   all in one read-write transaction
//! - `batch`: start a batch session, see [`crate::batch`]

use std::sync::Arc;

use crate::batch::Batch;
use crate::codec::KeyCodec;
use crate::config::Config;
use crate::error::{Result, SettError};
use crate::handle::Shared;
use crate::scan::{self, ScanResult};
use crate::store::KvStore;

/// Handle bound to a single table
pub struct Table<S: KvStore> {
    shared: Arc<Shared<S>>,

    /// Table name after normalization
    name: String,

    codec: KeyCodec,
}

impl<S: KvStore> Clone for Table<S> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            name: self.name.clone(),
            codec: self.codec.clone(),
        }
    }
}

impl<S: KvStore> Table<S> {
    pub(crate) fn new(shared: Arc<Shared<S>>, name: String, codec: KeyCodec) -> Self {
        Self { shared, name, codec }
    }

    /// Get a value by key
    ///
    /// Returns `SettError::NotFound` if the key is absent.
    pub fn get(&self, key: impl AsRef<[u8]>) -> Result<Vec<u8>> {
        let key = key.as_ref();
        let physical = self.codec.encode(key);

        self.shared
            .with_store(|store| store.view(|txn| txn.get(&physical)))
            .map_err(|e| e.context("get", &self.name, key))?
            .ok_or_else(|| SettError::NotFound {
                table: self.name.clone(),
                key: String::from_utf8_lossy(key).into_owned(),
            })
    }

    /// Put a key-value pair, overwriting any previous value
    pub fn set(&self, key: impl AsRef<[u8]>, value: impl AsRef<[u8]>) -> Result<()> {
        let key = key.as_ref();
        let physical = self.codec.encode(key);

        self.shared
            .with_store(|store| store.update(|txn| txn.set(&physical, value.as_ref())))
            .map_err(|e| e.context("set", &self.name, key))
    }

    /// Delete a key
    ///
    /// Deleting an absent key is not an error.
    pub fn delete(&self, key: impl AsRef<[u8]>) -> Result<()> {
        let key = key.as_ref();
        let physical = self.codec.encode(key);

        self.shared
            .with_store(|store| store.update(|txn| txn.delete(&physical)))
            .map_err(|e| e.context("delete", &self.name, key))
    }

    /// Return every entry whose logical key starts with `filter`
    ///
    /// `None` returns the whole table. Keys in the result exclude the table
    /// prefix.
    pub fn scan(&self, filter: Option<&[u8]>) -> Result<ScanResult> {
        self.shared
            .with_store(|store| scan::scan(store, &self.codec, filter))
            .map_err(|e| e.context("scan", &self.name, filter.unwrap_or_default()))
    }

    /// Return every entry of the table
    pub fn scan_all(&self) -> Result<ScanResult> {
        self.scan(None)
    }

    /// Delete every key of the table
    ///
    /// Atomic: either all collected keys are deleted or, on
    /// `SettError::DropFailed`, none are. Returns the number of deleted
    /// keys. With `KeyEncoding::LengthPrefixed` other tables are untouched.
    /// With `KeyEncoding::Concatenated` every key starting with the table
    /// name goes too: dropping `"t"` also empties `"table"`, and dropping
    /// the default table empties the whole store.
    pub fn drop_table(&self) -> Result<usize> {
        self.shared.with_store(|store| {
            // Phase 1: list keys (iteration ends before any mutation)
            let keys = store
                .view(|txn| scan::collect_keys(txn, &self.codec))
                .map_err(|e| e.context("drop", &self.name, b""))?;

            if keys.is_empty() {
                tracing::debug!(table = %self.name, "drop: table already empty");
                return Ok(0);
            }

            // Phase 2: delete in one transaction, first failure aborts it
            store
                .update(|txn| {
                    for key in &keys {
                        txn.delete(key)?;
                    }
                    Ok(())
                })
                .map_err(|e| SettError::DropFailed {
                    table: self.name.clone(),
                    collected: keys.len(),
                    source: Box::new(e),
                })?;

            tracing::info!(table = %self.name, deleted = keys.len(), "Table dropped");
            Ok(keys.len())
        })
    }

    /// Start a batch session for this table
    pub fn batch(&self) -> Batch<'_, S> {
        Batch::new(self)
    }

    /// Release the store shared by every table of the owning handle
    pub fn close(&self) -> Result<()> {
        self.shared.close()
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Table name after normalization
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Key codec bound to this table
    pub fn codec(&self) -> &KeyCodec {
        &self.codec
    }

    pub(crate) fn shared(&self) -> &Shared<S> {
        &self.shared
    }

    pub(crate) fn config(&self) -> &Config {
        self.shared.config()
    }
}

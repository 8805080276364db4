//! redb-backed store
//!
//! All tables share one redb table of raw bytes; virtual tables exist only
//! as key prefixes.
//!
//! ## Concurrency
//! - Read transactions run concurrently with each other and with a writer
//! - redb serializes write transactions: concurrent `update` calls queue on
//!   `begin_write`

use std::fs;
use std::path::{Path, PathBuf};

use redb::{Database, ReadableTable, TableDefinition};

use crate::config::Config;
use crate::error::{Result, SettError};

use super::{KvStore, ReadTxn, Visitor, WriteTxn};

/// The single redb table holding every physical key
const DATA_TABLE: TableDefinition<&[u8], &[u8]> = TableDefinition::new("sett");

/// Durable store backed by a redb database file
pub struct RedbStore {
    db: Database,
    path: PathBuf,
}

impl RedbStore {
    // =========================================================================
    // Internal Path Constants
    // =========================================================================
    const DB_FILENAME: &'static str = "sett.redb";

    /// Open or create the database under `config.data_dir`
    ///
    /// On startup:
    /// 1. Create data directory
    /// 2. Open/create the database file
    /// 3. Make sure the data table exists so readers never see it missing
    pub fn open(config: &Config) -> Result<Self> {
        // Step 1: Create data directory if it doesn't exist
        fs::create_dir_all(&config.data_dir)?;
        let path = config.data_dir.join(Self::DB_FILENAME);

        // Step 2: Open database, cache size passed through as-is
        let mut builder = Database::builder();
        if let Some(bytes) = config.cache_size_bytes {
            builder.set_cache_size(bytes);
        }
        let db = builder.create(&path).map_err(store_err)?;

        // Step 3: Create the data table
        let txn = db.begin_write().map_err(store_err)?;
        txn.open_table(DATA_TABLE).map_err(store_err)?;
        txn.commit().map_err(store_err)?;

        tracing::debug!(path = %path.display(), "opened redb store");

        Ok(Self { db, path })
    }

    /// Path of the database file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl KvStore for RedbStore {
    fn view<R, F>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&dyn ReadTxn) -> Result<R>,
    {
        let txn = self.db.begin_read().map_err(store_err)?;
        let table = txn.open_table(DATA_TABLE).map_err(store_err)?;
        f(&RedbReadTxn { table })
    }

    fn update<R, F>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&mut dyn WriteTxn) -> Result<R>,
    {
        let txn = self.db.begin_write().map_err(store_err)?;

        let result = {
            let table = txn.open_table(DATA_TABLE).map_err(store_err)?;
            let mut write = RedbWriteTxn { table };
            f(&mut write)
        };

        match result {
            Ok(value) => {
                txn.commit().map_err(store_err)?;
                Ok(value)
            }
            Err(e) => {
                txn.abort().map_err(store_err)?;
                Err(e)
            }
        }
    }

    fn close(self) -> Result<()> {
        // redb flushes and releases the file lock on drop
        tracing::debug!(path = %self.path.display(), "closing redb store");
        drop(self.db);
        Ok(())
    }
}

// =============================================================================
// Transactions
// =============================================================================

struct RedbReadTxn {
    table: redb::ReadOnlyTable<&'static [u8], &'static [u8]>,
}

impl ReadTxn for RedbReadTxn {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        read_get(&self.table, key)
    }

    fn scan_prefix(&self, prefix: &[u8], visit: &mut Visitor<'_>) -> Result<()> {
        read_prefix(&self.table, prefix, visit)
    }
}

struct RedbWriteTxn<'txn> {
    table: redb::Table<'txn, &'static [u8], &'static [u8]>,
}

impl ReadTxn for RedbWriteTxn<'_> {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        read_get(&self.table, key)
    }

    fn scan_prefix(&self, prefix: &[u8], visit: &mut Visitor<'_>) -> Result<()> {
        read_prefix(&self.table, prefix, visit)
    }
}

impl WriteTxn for RedbWriteTxn<'_> {
    fn set(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        self.table.insert(key, value).map_err(store_err)?;
        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> Result<()> {
        self.table.remove(key).map_err(store_err)?;
        Ok(())
    }
}

fn read_get<T>(table: &T, key: &[u8]) -> Result<Option<Vec<u8>>>
where
    T: ReadableTable<&'static [u8], &'static [u8]>,
{
    let value = table.get(key).map_err(store_err)?;
    Ok(value.map(|guard| guard.value().to_vec()))
}

/// Seek to `prefix` and walk forward while keys keep the prefix
fn read_prefix<T>(table: &T, prefix: &[u8], visit: &mut Visitor<'_>) -> Result<()>
where
    T: ReadableTable<&'static [u8], &'static [u8]>,
{
    for entry in table.range::<&[u8]>(prefix..).map_err(store_err)? {
        let (key, value) = entry.map_err(store_err)?;
        let key = key.value();
        if !key.starts_with(prefix) {
            break;
        }
        visit(key, value.value())?;
    }
    Ok(())
}

fn store_err(e: impl Into<redb::Error>) -> SettError {
    SettError::Store(e.into().to_string())
}

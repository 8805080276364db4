//! Store handle
//!
//! Owns the one physical store instance for the process and hands out
//! table handles bound to it.
//!
//! ## Lifecycle
//! - `open` (or `with_store`) once at startup; failures are returned, never
//!   fatal
//! - `table` as often as needed; tables are cheap and share the store
//! - `close` once at shutdown; afterwards every table operation returns
//!   `SettError::Closed`. Dropping the last handle/table also releases the
//!   store.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::codec::KeyCodec;
use crate::config::Config;
use crate::error::{Result, SettError};
use crate::store::{KvStore, MemoryStore, RedbStore};
use crate::table::Table;

/// State shared by a handle and every table derived from it
pub(crate) struct Shared<S> {
    /// `None` once closed. Operations hold the read lock for their whole
    /// duration, so `close` waits for in-flight work.
    store: RwLock<Option<S>>,

    config: Config,
}

impl<S: KvStore> Shared<S> {
    /// Run `f` against the open store
    pub(crate) fn with_store<R>(&self, f: impl FnOnce(&S) -> Result<R>) -> Result<R> {
        let guard = self.store.read();
        match &*guard {
            Some(store) => f(store),
            None => Err(SettError::Closed),
        }
    }

    pub(crate) fn config(&self) -> &Config {
        &self.config
    }

    pub(crate) fn close(&self) -> Result<()> {
        let store = self.store.write().take();
        match store {
            Some(store) => {
                store.close()?;
                tracing::info!("Store closed");
                Ok(())
            }
            None => Err(SettError::Closed),
        }
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.store.read().is_none()
    }
}

/// Handle to an open store
///
/// Clones share the same store.
pub struct Sett<S: KvStore = RedbStore> {
    shared: Arc<Shared<S>>,
}

impl<S: KvStore> Clone for Sett<S> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl Sett<RedbStore> {
    /// Open or create the on-disk store described by `config`
    pub fn open(config: Config) -> Result<Self> {
        config.validate()?;
        let store = RedbStore::open(&config)?;

        tracing::info!(
            data_dir = %config.data_dir.display(),
            chunk_size = config.chunk_size,
            "Store opened"
        );

        Self::with_store(store, config)
    }
}

impl Sett<MemoryStore> {
    /// Create a handle over a fresh in-memory store
    pub fn in_memory(config: Config) -> Result<Self> {
        Self::with_store(MemoryStore::new(), config)
    }
}

impl<S: KvStore> Sett<S> {
    /// Wrap an already opened store
    pub fn with_store(store: S, config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            shared: Arc::new(Shared {
                store: RwLock::new(Some(store)),
                config,
            }),
        })
    }

    /// Select a table
    ///
    /// The name is lower-cased when `Config::lowercase_tables` is set. The
    /// empty name is the default table.
    pub fn table(&self, name: &str) -> Result<Table<S>> {
        let config = self.shared.config();
        let name = if config.lowercase_tables {
            name.to_lowercase()
        } else {
            name.to_string()
        };

        let codec = KeyCodec::new(config.key_encoding, &name)?;
        Ok(Table::new(Arc::clone(&self.shared), name, codec))
    }

    /// The unnamed table
    pub fn default_table(&self) -> Result<Table<S>> {
        self.table("")
    }

    /// Release the store
    ///
    /// Returns `SettError::Closed` if it was already closed.
    pub fn close(&self) -> Result<()> {
        self.shared.close()
    }

    /// Check if `close` has been called
    pub fn is_closed(&self) -> bool {
        self.shared.is_closed()
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        self.shared.config()
    }
}

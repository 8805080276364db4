//! # Sett
//!
//! Virtual tables on top of an embedded, ordered, transactional key-value
//! store:
//! - Table-scoped get/set/delete by key prefixing
//! - Prefix-bounded scans with an optional sub-filter
//! - Whole-table drops
//! - Batched bulk inserts written by a pool of concurrent writers
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Sett (store handle)                      │
//! │              open / table / close, owns the store            │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ table(name)
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                  Table (one virtual table)                   │
//! │        get / set / delete / scan / drop_table / batch        │
//! └──────┬───────────────────────┬──────────────────────┬───────┘
//!        │                       │                      │
//!        ▼                       ▼                      ▼
//!   ┌──────────┐          ┌─────────────┐        ┌─────────────┐
//!   │ KeyCodec │          │ Scan engine │        │    Batch    │
//!   │ (prefix) │          │  (prefix    │        │ (chunked,   │
//!   └──────────┘          │  iteration) │        │ concurrent) │
//!                         └──────┬──────┘        └──────┬──────┘
//!                                │                      │
//!                         ┌──────▼──────────────────────▼──────┐
//!                         │   KvStore (view / update txns)     │
//!                         │      RedbStore | MemoryStore       │
//!                         └────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use sett::{Config, Sett};
//!
//! # fn main() -> sett::Result<()> {
//! let sett = Sett::open(Config::builder().data_dir("./data").build())?;
//!
//! let users = sett.table("users")?;
//! users.set("alice", "admin")?;
//! assert_eq!(users.get("alice")?, b"admin".to_vec());
//!
//! let mut batch = users.batch();
//! for i in 0..1_000 {
//!     batch.batchup(format!("user{i}"), "member");
//! }
//! batch.flush()?;
//!
//! sett.close()?;
//! # Ok(())
//! # }
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod codec;
pub mod store;
pub mod scan;
pub mod batch;
pub mod table;
pub mod handle;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{BatchError, ChunkFailure, Result, SettError};
pub use config::Config;
pub use codec::{KeyCodec, KeyEncoding};
pub use store::{KvStore, MemoryStore, ReadTxn, RedbStore, WriteTxn};
pub use scan::ScanResult;
pub use batch::{Batch, FlushReport};
pub use table::Table;
pub use handle::Sett;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of Sett
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! Batch coordinator
//!
//! Accumulates pending writes for one table and flushes them with a pool of
//! concurrent writers.
//!
//! ## States
//! ```text
//!   Empty ──batchup──▶ Accumulating ──flush──▶ Flushing ──join──▶ Empty
//!                        ▲      │
//!                        └──────┘ batchup
//! ```
//!
//! ## Flush
//! 1. Take the accumulator (it is empty from here on, whatever happens)
//! 2. Split items into contiguous chunks of `chunk_size`, the last chunk
//!    takes the remainder
//! 3. Queue the chunks on a channel and start the writer pool (bounded by
//!    `max_writers`, or the available parallelism); each writer commits one
//!    chunk per read-write transaction
//! 4. Join every writer, then collect per-chunk results from the result
//!    channel. Failed chunks are reported together in a [`BatchError`];
//!    chunks that succeeded stay committed.
//!
//! ## Ordering
//! Inside a chunk items are written in accumulation order and commit
//! all-or-nothing. Chunks commit in no particular order.
//!
//! A session is owned by one caller (`&mut self`); share it across threads
//! only behind your own lock.

use std::num::NonZeroUsize;
use std::ops::Range;
use std::thread;

use crossbeam::channel;

use crate::codec::KeyCodec;
use crate::error::{BatchError, ChunkFailure, Result, SettError};
use crate::store::KvStore;
use crate::table::Table;

/// Pool size when the available parallelism cannot be determined
const DEFAULT_WRITERS: usize = 4;

/// A pending (logical key, value) pair
type BatchItem = (Vec<u8>, Vec<u8>);

/// Summary of a successful flush
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlushReport {
    /// Items written
    pub items: usize,

    /// Chunks the items were split into
    pub chunks: usize,

    /// Concurrent writers used
    pub writers: usize,
}

/// A batch session bound to one table
pub struct Batch<'t, S: KvStore> {
    table: &'t Table<S>,
    items: Vec<BatchItem>,
}

impl<'t, S: KvStore> Batch<'t, S> {
    pub(crate) fn new(table: &'t Table<S>) -> Self {
        Self {
            table,
            items: Vec::new(),
        }
    }

    /// Queue a key-value pair for the next flush
    pub fn batchup(&mut self, key: impl AsRef<[u8]>, value: impl AsRef<[u8]>) {
        self.items
            .push((key.as_ref().to_vec(), value.as_ref().to_vec()));
    }

    /// Number of pending items
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if nothing is pending
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Write every pending item
    ///
    /// Fails with `SettError::EmptyBatch` if nothing is pending, and with
    /// `SettError::Batch` if any chunk failed. The session is empty after
    /// any call that got past the empty check.
    pub fn flush(&mut self) -> Result<FlushReport> {
        if self.items.is_empty() {
            return Err(SettError::EmptyBatch);
        }

        let items = std::mem::take(&mut self.items);
        let config = self.table.config();
        let bounds = chunk_bounds(items.len(), config.chunk_size);
        let writers = writer_count(config.max_writers, bounds.len());

        tracing::debug!(
            table = %self.table.name(),
            items = items.len(),
            chunks = bounds.len(),
            writers,
            "flushing batch"
        );

        let codec = self.table.codec();
        let mut failures = self
            .table
            .shared()
            .with_store(|store| run_writers(store, codec, &items, &bounds, writers))?;

        if !failures.is_empty() {
            failures.sort_by_key(|f| f.index);
            for failure in &failures {
                tracing::warn!(
                    table = %self.table.name(),
                    chunk = failure.index,
                    items = failure.items,
                    error = %failure.error,
                    "batch chunk failed"
                );
            }
            return Err(BatchError {
                total_chunks: bounds.len(),
                failures,
            }
            .into());
        }

        tracing::info!(
            table = %self.table.name(),
            items = items.len(),
            chunks = bounds.len(),
            "Batch flushed"
        );

        Ok(FlushReport {
            items: items.len(),
            chunks: bounds.len(),
            writers,
        })
    }
}

/// Split `item_count` items into contiguous ranges of `chunk_size`
///
/// `ceil(item_count / chunk_size)` ranges; the last one absorbs the
/// remainder.
pub fn chunk_bounds(item_count: usize, chunk_size: usize) -> Vec<Range<usize>> {
    if chunk_size == 0 {
        return Vec::new();
    }
    (0..item_count)
        .step_by(chunk_size)
        .map(|start| start..(start + chunk_size).min(item_count))
        .collect()
}

/// Writers to start for `chunks` chunks
///
/// Never more than one per chunk. Without an explicit bound the pool is
/// sized to the available parallelism; chunks queue for a free writer.
pub fn writer_count(max_writers: Option<usize>, chunks: usize) -> usize {
    let limit = max_writers.unwrap_or_else(|| {
        thread::available_parallelism()
            .map(NonZeroUsize::get)
            .unwrap_or(DEFAULT_WRITERS)
    });
    limit.min(chunks).max(1)
}

/// Start `writers` scoped threads over a queue of chunks and gather failures
fn run_writers<S: KvStore>(
    store: &S,
    codec: &KeyCodec,
    items: &[BatchItem],
    bounds: &[Range<usize>],
    writers: usize,
) -> Result<Vec<ChunkFailure>> {
    let (work_tx, work_rx) = channel::unbounded::<(usize, &[BatchItem])>();
    for (index, range) in bounds.iter().enumerate() {
        work_tx
            .send((index, &items[range.clone()]))
            .map_err(|_| SettError::Store("batch work queue closed".into()))?;
    }
    // Writers stop once the queue drains
    drop(work_tx);

    let (result_tx, result_rx) = channel::unbounded::<(usize, usize, Result<()>)>();

    let spawned = crossbeam::thread::scope(|scope| {
        for id in 0..writers {
            let work_rx = work_rx.clone();
            let result_tx = result_tx.clone();
            let spawned = scope
                .builder()
                .name(format!("sett-writer-{id}"))
                .spawn(move |_| {
                    for (index, chunk) in work_rx.iter() {
                        let outcome = write_chunk(store, codec, chunk);
                        if result_tx.send((index, chunk.len(), outcome)).is_err() {
                            break;
                        }
                    }
                });

            if let Err(e) = spawned {
                // Writers already running still drain the whole queue
                if id == 0 {
                    return Err(SettError::Io(e));
                }
                tracing::warn!(
                    started = id,
                    wanted = writers,
                    error = %e,
                    "writer pool truncated"
                );
                break;
            }
        }
        Ok(())
    })
    .map_err(|_| SettError::Store("batch writer thread panicked".into()))?;
    drop(result_tx);

    if let Err(e) = spawned {
        // No writer ran, so no chunk was attempted
        drop(work_rx);
        return Err(e);
    }

    let mut reported = 0;
    let mut failures = Vec::new();
    for (index, len, outcome) in result_rx.iter() {
        reported += 1;
        if let Err(error) = outcome {
            failures.push(ChunkFailure {
                index,
                items: len,
                error,
            });
        }
    }

    if reported != bounds.len() {
        return Err(SettError::Store(format!(
            "only {} of {} batch chunks reported back",
            reported,
            bounds.len()
        )));
    }

    Ok(failures)
}

/// Write one chunk inside its own read-write transaction
fn write_chunk<S: KvStore>(store: &S, codec: &KeyCodec, chunk: &[BatchItem]) -> Result<()> {
    store.update(|txn| {
        for (key, value) in chunk {
            txn.set(&codec.encode(key), value)?;
        }
        Ok(())
    })
}

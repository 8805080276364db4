//! Tests for batch sessions
//!
//! These tests verify:
//! - Empty flushes are rejected
//! - Chunking and full write-through of accumulated items
//! - The accumulator is cleared by every flush
//! - Failed chunks are reported while the others commit
//! - Bounded writer pools, including the default one

#[path = "../common/mod.rs"]
mod common;

use std::num::NonZeroUsize;
use std::thread;

use common::{memory_sett, memory_sett_with, FaultyStore};
use sett::{Config, FlushReport, Sett, SettError};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn small_chunk_config(chunk_size: usize) -> Config {
    Config::builder().chunk_size(chunk_size).build()
}

// =============================================================================
// Accumulation Tests
// =============================================================================

#[test]
fn test_flush_empty_batch() {
    let sett = memory_sett();
    let table = sett.table("t").unwrap();
    let mut batch = table.batch();

    assert!(batch.is_empty());
    assert!(matches!(batch.flush(), Err(SettError::EmptyBatch)));
}

#[test]
fn test_batchup_accumulates() {
    let sett = memory_sett();
    let table = sett.table("t").unwrap();
    let mut batch = table.batch();

    batch.batchup("k1", "v1");
    batch.batchup("k2", "v2");

    assert_eq!(batch.len(), 2);
    // Nothing is written before flush
    assert!(table.scan_all().unwrap().is_empty());
}

#[test]
fn test_flush_small_batch() {
    let sett = memory_sett();
    let table = sett.default_table().unwrap();
    let mut batch = table.batch();

    for i in 1..=5 {
        batch.batchup(format!("key{i}"), format!("val{i}"));
    }
    let report = batch.flush().unwrap();

    assert_eq!(
        report,
        FlushReport {
            items: 5,
            chunks: 1,
            writers: 1
        }
    );
    for i in 1..=5 {
        assert_eq!(
            table.get(format!("key{i}")).unwrap(),
            format!("val{i}").into_bytes()
        );
    }
}

#[test]
fn test_flush_into_named_table() {
    let sett = memory_sett();
    let table = sett.table("batch").unwrap();
    let mut batch = table.batch();

    batch.batchup("key1", "val1");
    batch.batchup("filterkey", "filterval");
    batch.flush().unwrap();

    assert_eq!(table.scan_all().unwrap().len(), 2);
    assert!(sett.default_table().unwrap().get("key1").unwrap_err().is_not_found());
}

// =============================================================================
// Chunking Tests
// =============================================================================

#[test]
fn test_flush_1200_items_in_three_chunks() {
    let sett = memory_sett_with(small_chunk_config(500));
    let table = sett.table("bulk").unwrap();
    let mut batch = table.batch();

    for i in 0..1200 {
        batch.batchup(format!("key{i:04}"), format!("value{i}"));
    }
    let report = batch.flush().unwrap();

    assert_eq!(report.items, 1200);
    assert_eq!(report.chunks, 3);
    assert!(report.writers >= 1 && report.writers <= 3);
    assert!(batch.is_empty());

    let scanned = table.scan_all().unwrap();
    assert_eq!(scanned.len(), 1200);
    for i in 0..1200 {
        assert_eq!(
            table.get(format!("key{i:04}")).unwrap(),
            format!("value{i}").into_bytes()
        );
    }

    // Accumulator is empty again
    assert!(matches!(batch.flush(), Err(SettError::EmptyBatch)));
}

#[test]
fn test_flush_with_bounded_writers() {
    let config = Config::builder().chunk_size(10).max_writers(2).build();
    let sett = memory_sett_with(config);
    let table = sett.table("pool").unwrap();
    let mut batch = table.batch();

    for i in 0..95 {
        batch.batchup(format!("k{i:03}"), "v");
    }
    let report = batch.flush().unwrap();

    assert_eq!(report.chunks, 10);
    assert_eq!(report.writers, 2);
    assert_eq!(table.scan_all().unwrap().len(), 95);
}

#[test]
fn test_default_pool_is_bounded_by_parallelism() {
    let sett = memory_sett_with(small_chunk_config(1));
    let table = sett.table("wide").unwrap();
    let mut batch = table.batch();

    for i in 0..200_000 {
        batch.batchup(format!("k{i:06}"), "v");
    }
    let report = batch.flush().unwrap();

    let parallelism = thread::available_parallelism().map_or(4, NonZeroUsize::get);
    assert_eq!(report.items, 200_000);
    assert_eq!(report.chunks, 200_000);
    assert!(report.writers <= parallelism);
    assert_eq!(table.scan_all().unwrap().len(), 200_000);
}

#[test]
fn test_session_reusable_after_flush() {
    let sett = memory_sett();
    let table = sett.table("t").unwrap();
    let mut batch = table.batch();

    batch.batchup("a", "1");
    batch.flush().unwrap();
    batch.batchup("b", "2");
    batch.flush().unwrap();

    assert_eq!(table.scan_all().unwrap().len(), 2);
}

#[test]
fn test_later_duplicate_in_chunk_wins() {
    let sett = memory_sett();
    let table = sett.table("t").unwrap();
    let mut batch = table.batch();

    batch.batchup("k", "first");
    batch.batchup("k", "second");
    batch.flush().unwrap();

    assert_eq!(table.get("k").unwrap(), b"second".to_vec());
}

#[test]
fn test_flush_on_redb() {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::builder()
        .data_dir(temp_dir.path())
        .chunk_size(100)
        .build();
    let sett = Sett::open(config).unwrap();
    let table = sett.table("disk").unwrap();
    let mut batch = table.batch();

    for i in 0..450 {
        batch.batchup(format!("key{i:03}"), format!("value{i}"));
    }
    let report = batch.flush().unwrap();

    assert_eq!(report.chunks, 5);
    assert_eq!(table.scan_all().unwrap().len(), 450);
}

// =============================================================================
// Error Aggregation Tests
// =============================================================================

#[test]
fn test_failed_chunk_is_reported() {
    let store = FaultyStore::poison_suffix(b"poison");
    let sett = Sett::with_store(store, small_chunk_config(10)).unwrap();
    let table = sett.table("t").unwrap();
    let mut batch = table.batch();

    // 30 items, 3 chunks; the poisoned key lands in chunk 1 (items 10..20)
    for i in 0..30 {
        if i == 15 {
            batch.batchup("poison", "x");
        } else {
            batch.batchup(format!("key{i:02}"), "v");
        }
    }

    let err = batch.flush().unwrap_err();

    let batch_err = match err {
        SettError::Batch(batch_err) => batch_err,
        other => panic!("expected Batch error, got {other:?}"),
    };
    assert_eq!(batch_err.total_chunks, 3);
    assert_eq!(batch_err.failures.len(), 1);
    assert_eq!(batch_err.failures[0].index, 1);
    assert_eq!(batch_err.failures[0].items, 10);
    assert_eq!(batch_err.failed_items(), 10);
    assert!(matches!(batch_err.failures[0].error, SettError::Store(_)));

    // Accumulator is cleared even on failure
    assert!(batch.is_empty());

    // The other chunks committed, the failed one left nothing behind
    let scanned = table.scan_all().unwrap();
    assert_eq!(scanned.len(), 20);
    for i in 0..10 {
        assert!(scanned.contains_key(format!("key{i:02}").as_bytes()));
    }
    for i in 20..30 {
        assert!(scanned.contains_key(format!("key{i:02}").as_bytes()));
    }
    for i in 10..20 {
        assert!(!scanned.contains_key(format!("key{i:02}").as_bytes()));
    }
}

#[test]
fn test_every_failed_chunk_is_reported() {
    let store = FaultyStore::poison_suffix(b"poison");
    let sett = Sett::with_store(store, small_chunk_config(2)).unwrap();
    let table = sett.table("t").unwrap();
    let mut batch = table.batch();

    batch.batchup("a-poison", "x");
    batch.batchup("b", "x");
    batch.batchup("c", "x");
    batch.batchup("d", "x");
    batch.batchup("e", "x");
    batch.batchup("f-poison", "x");

    match batch.flush() {
        Err(SettError::Batch(batch_err)) => {
            let indexes: Vec<usize> = batch_err.failures.iter().map(|f| f.index).collect();
            assert_eq!(indexes, vec![0, 2]);
            assert_eq!(batch_err.total_chunks, 3);
        }
        other => panic!("expected Batch error, got {other:?}"),
    }

    assert_eq!(table.scan_all().unwrap().len(), 2);
}

#[test]
fn test_flush_after_close() {
    let sett = memory_sett();
    let table = sett.table("t").unwrap();
    let mut batch = table.batch();
    batch.batchup("k", "v");

    sett.close().unwrap();

    assert!(matches!(batch.flush(), Err(SettError::Closed)));
}

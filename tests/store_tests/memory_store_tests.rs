//! Tests for MemoryStore

use sett::{KvStore, MemoryStore};

use super::*;

#[test]
fn test_memory_set_get_delete() {
    check_set_get_delete(&MemoryStore::new());
}

#[test]
fn test_memory_abort_discards_writes() {
    check_abort_discards_writes(&MemoryStore::new());
}

#[test]
fn test_memory_prefix_visit() {
    check_prefix_visit(&MemoryStore::new());
}

#[test]
fn test_memory_visitor_error_stops_scan() {
    check_visitor_error_stops_scan(&MemoryStore::new());
}

#[test]
fn test_memory_entry_count() {
    let store = MemoryStore::new();
    assert!(store.is_empty());

    store
        .update(|txn| {
            txn.set(b"k1", b"v")?;
            txn.set(b"k2", b"v")?;
            txn.delete(b"k1")
        })
        .unwrap();

    assert_eq!(store.entry_count(), 1);
}

#[test]
fn test_memory_empty_prefix_visits_everything() {
    let store = MemoryStore::new();
    store
        .update(|txn| {
            txn.set(b"x", b"1")?;
            txn.set(b"y", b"2")
        })
        .unwrap();

    let count = store
        .view(|txn| {
            let mut count = 0;
            txn.scan_prefix(b"", &mut |_, _| {
                count += 1;
                Ok(())
            })?;
            Ok(count)
        })
        .unwrap();

    assert_eq!(count, 2);
}

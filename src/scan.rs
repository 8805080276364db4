//! Scan engine
//!
//! Prefix-bounded iteration over one table.
//!
//! ## Algorithm
//! 1. Build the scan prefix: the table prefix, plus the sub-filter if given
//! 2. Open one read-only transaction and seek to the prefix
//! 3. Walk forward while physical keys keep the prefix
//! 4. Strip exactly the table prefix to recover each logical key

use std::collections::BTreeMap;

use crate::codec::KeyCodec;
use crate::error::Result;
use crate::store::{KvStore, ReadTxn};

/// Logical key → value for every matching entry of a table
pub type ScanResult = BTreeMap<Vec<u8>, Vec<u8>>;

/// Collect all entries of the table whose logical key starts with `filter`
///
/// An empty map (not an error) is returned when nothing matches.
pub(crate) fn scan<S: KvStore>(
    store: &S,
    codec: &KeyCodec,
    filter: Option<&[u8]>,
) -> Result<ScanResult> {
    let prefix = codec.scan_prefix(filter);

    store.view(|txn| {
        let mut result = ScanResult::new();
        txn.scan_prefix(&prefix, &mut |physical, value| {
            if let Some(key) = codec.decode(physical) {
                result.insert(key.to_vec(), value.to_vec());
            }
            Ok(())
        })?;
        Ok(result)
    })
}

/// Collect the physical keys of every entry in the table
///
/// The visit finishes (and its iterator is released) before the caller
/// gets the list, so the keys can be deleted afterwards.
pub(crate) fn collect_keys(txn: &dyn ReadTxn, codec: &KeyCodec) -> Result<Vec<Vec<u8>>> {
    let mut keys = Vec::new();
    txn.scan_prefix(codec.prefix(), &mut |physical, _| {
        keys.push(physical.to_vec());
        Ok(())
    })?;
    Ok(keys)
}

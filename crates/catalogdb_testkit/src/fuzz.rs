//! Fuzz testing harnesses for CatalogDB.
//!
//! This module provides fuzz targets that can be used with cargo-fuzz
//! or other fuzzing frameworks.

use crate::fixtures::{sample_product, TestStore};
use catalogdb_codec::{deserialize, serialize, split_records};
use catalogdb_core::CoreError;

/// Fuzz target for record decoding.
///
/// Arbitrary bytes either decode into records that encode back to an
/// equivalent record, or fail with an error. It never panics.
pub fn fuzz_record_decode(data: &[u8]) {
    for raw in split_records(data) {
        if let Ok(product) = raw.decode() {
            let reencoded = serialize(&product);
            let decoded = deserialize(&reencoded, raw.line).expect("Re-encoded record must decode");
            assert_eq!(decoded, product, "Roundtrip mismatch");
        }
    }
}

/// Fuzz target for repository reads and writes over arbitrary file bytes.
///
/// Reads never fail on bad records. A write either succeeds or leaves the
/// file exactly as it was.
pub fn fuzz_store_text(data: &[u8]) {
    let store = TestStore::with_bytes(data);

    let products = store.get_all().expect("Reads skip bad records");
    let before = store.bytes();

    match store.add(sample_product("Fuzz")) {
        Ok(added) => {
            let after = store.get_all().expect("Read after add");
            assert_eq!(after.len(), products.len() + 1);
            assert!(after.contains(&added));
        }
        Err(CoreError::InvariantViolation { .. }) => {
            assert_eq!(store.bytes(), before, "Rejected add changed the file");
        }
        Err(err) => panic!("Unexpected error: {err}"),
    }

    let result = store.execute_batch(|batch| batch.add(sample_product("Batch Fuzz")));
    if result.is_err() {
        assert!(
            store.stray_files().is_empty(),
            "Rejected batch left files behind"
        );
    }
}

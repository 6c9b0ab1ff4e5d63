//! Property-based tests for `upsert_records`.
//!
//! # Invariants tested
//!
//! - **Idempotence:** upserting a batch twice leaves the same documents as
//!   upserting it once.
//! - **Key identity:** at most one document exists per distinct key, and it
//!   equals the last record written with that key.
//! - **Missing-key skip:** records lacking a key field are never stored.

use std::collections::HashMap;

use pitlane_core::test_support::MemoryDocumentStore;
use pitlane_core::{Record, UniqueKey, upsert_records};
use proptest::prelude::*;
use serde_json::json;

/// Generate lap records drawn from a small key space so collisions are common.
///
/// Roughly one in eight records omits its lap number.
fn lap_strategy() -> impl Strategy<Value = Record> {
    (1u32..3, 1u32..4, prop::option::weighted(0.875, 1u32..4), 60_000u32..120_000).prop_map(
        |(session_key, driver_number, lap_number, millis)| {
            let mut record = Record::new();
            record.insert("session_key", session_key);
            record.insert("driver_number", driver_number);
            if let Some(lap) = lap_number {
                record.insert("lap_number", lap);
            }
            record.insert("lap_millis", millis);
            record
        },
    )
}

fn batch_strategy() -> impl Strategy<Value = Vec<Record>> {
    prop::collection::vec(lap_strategy(), 0..40)
}

fn upsert_laps(store: &mut MemoryDocumentStore, batch: &[Record]) {
    upsert_records(store, batch, "laps", &UniqueKey::lap()).expect("memory store accepts writes");
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    /// Property: a second identical upsert changes nothing.
    #[test]
    fn upsert_is_idempotent(batch in batch_strategy()) {
        let mut once = MemoryDocumentStore::default();
        upsert_laps(&mut once, &batch);

        let mut twice = MemoryDocumentStore::default();
        upsert_laps(&mut twice, &batch);
        upsert_laps(&mut twice, &batch);

        prop_assert_eq!(once.documents("laps"), twice.documents("laps"));
    }

    /// Property: one document per key, equal to the last record with that key.
    #[test]
    fn last_write_wins_per_key(batch in batch_strategy()) {
        let mut store = MemoryDocumentStore::default();
        upsert_laps(&mut store, &batch);

        let key = UniqueKey::lap();
        let mut expected: HashMap<String, Record> = HashMap::new();
        for record in &batch {
            if let Ok(lookup) = key.lookup_key(record) {
                expected.insert(lookup.canonical(), record.clone());
            }
        }

        let stored = store.documents("laps");
        prop_assert_eq!(stored.len(), expected.len());
        for document in stored {
            let lookup = key.lookup_key(&document).expect("stored documents carry their key");
            prop_assert_eq!(Some(&document), expected.get(&lookup.canonical()));
        }
    }

    /// Property: records without a lap number never reach the store.
    #[test]
    fn incomplete_records_are_never_stored(batch in batch_strategy()) {
        let mut store = MemoryDocumentStore::default();
        let report = upsert_records(&mut store, &batch, "laps", &UniqueKey::lap())
            .expect("memory store accepts writes");

        let incomplete = batch.iter().filter(|record| record.get("lap_number").is_none()).count();
        prop_assert_eq!(report.skipped.len(), incomplete);
        prop_assert_eq!(report.processed, batch.len());
        prop_assert!(store
            .documents("laps")
            .iter()
            .all(|document| document.get("lap_number").is_some()));
        prop_assert_eq!(store.write_count(), batch.len() - incomplete);
    }
}

#[test]
fn upsert_scenario_from_timing_feed() {
    let mut store = MemoryDocumentStore::default();
    let first = Record::try_from(json!({"session_key": 1, "driver_number": 44, "lap_number": 1, "lap_time": 90.1}))
        .expect("object payload");
    let second = Record::try_from(json!({"session_key": 1, "driver_number": 44, "lap_number": 1, "lap_time": 89.9}))
        .expect("object payload");

    upsert_laps(&mut store, &[first]);
    upsert_laps(&mut store, &[second.clone()]);

    assert_eq!(store.documents("laps"), vec![second]);
}

//! Behavioural tests for `upsert_records`.

use std::cell::RefCell;

use pitlane_core::test_support::MemoryDocumentStore;
use pitlane_core::{Record, UniqueKey, UpsertReport, upsert_records};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use serde_json::{Value, json};

#[derive(Debug, Default)]
struct UpsertWorld {
    store: RefCell<MemoryDocumentStore>,
    reports: RefCell<Vec<UpsertReport>>,
}

impl UpsertWorld {
    fn upsert(&self, records: &[Record], collection: &str, key: &UniqueKey) {
        let report = upsert_records(&mut *self.store.borrow_mut(), records, collection, key)
            .expect("memory store accepts writes");
        self.reports.borrow_mut().push(report);
    }
}

#[fixture]
fn world() -> UpsertWorld {
    UpsertWorld::default()
}

fn record(value: Value) -> Record {
    Record::try_from(value).expect("object payload")
}

fn lap(lap_time: f64) -> Record {
    record(json!({
        "session_key": 1,
        "driver_number": 44,
        "lap_number": 1,
        "lap_time": lap_time,
    }))
}

fn driver_batch() -> Vec<Record> {
    vec![
        record(json!({"session_key": 9476, "driver_number": 1, "name_acronym": "VER"})),
        record(json!({"session_key": 9476, "driver_number": 16, "name_acronym": "LEC"})),
        record(json!({"session_key": 9476, "driver_number": 1, "name_acronym": "VER", "team_name": "Red Bull Racing"})),
    ]
}

// --- Given steps ---

#[given("an empty document store")]
fn empty_store(#[from(world)] world: &UpsertWorld) {
    assert!(world.store.borrow().is_empty(), "store should start empty");
}

// --- When steps ---

#[when("a lap with a time of 90.1 seconds is upserted")]
fn upsert_first_lap(#[from(world)] world: &UpsertWorld) {
    world.upsert(&[lap(90.1)], "laps", &UniqueKey::lap());
}

#[when("the same lap with a time of 89.9 seconds is upserted")]
fn upsert_second_lap(#[from(world)] world: &UpsertWorld) {
    world.upsert(&[lap(89.9)], "laps", &UniqueKey::lap());
}

#[when("a driver record without a session key is upserted")]
fn upsert_orphan_driver(#[from(world)] world: &UpsertWorld) {
    world.upsert(
        &[record(json!({"driver_number": 1}))],
        "drivers",
        &UniqueKey::driver(),
    );
}

#[when("the same driver batch is upserted twice")]
fn upsert_batch_twice(#[from(world)] world: &UpsertWorld) {
    let batch = driver_batch();
    world.upsert(&batch, "drivers", &UniqueKey::driver());
    world.upsert(&batch, "drivers", &UniqueKey::driver());
}

// --- Then steps ---

#[then("the laps collection holds a single lap timed at 89.9 seconds")]
fn single_lap_remains(#[from(world)] world: &UpsertWorld) {
    let laps = world.store.borrow().documents("laps");
    assert_eq!(laps.len(), 1, "expected exactly one lap document");
    assert_eq!(laps[0].get("lap_time"), Some(&json!(89.9)));
}

#[then("no driver document is written")]
fn no_driver_written(#[from(world)] world: &UpsertWorld) {
    assert_eq!(world.store.borrow().len("drivers"), 0);
    assert_eq!(world.store.borrow().write_count(), 0);
}

#[then("the driver record is reported as skipped")]
fn driver_reported_skipped(#[from(world)] world: &UpsertWorld) {
    let reports = world.reports.borrow();
    let report = reports.last().expect("an upsert should have run");
    assert_eq!(report.processed, 1, "skipped records still count as processed");
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].field, "session_key");
}

#[then("the drivers collection matches a single upsert of the batch")]
fn batch_is_idempotent(#[from(world)] world: &UpsertWorld) {
    let mut reference = MemoryDocumentStore::default();
    upsert_records(&mut reference, &driver_batch(), "drivers", &UniqueKey::driver())
        .expect("memory store accepts writes");

    assert_eq!(
        world.store.borrow().documents("drivers"),
        reference.documents("drivers")
    );
    assert_eq!(world.store.borrow().len("drivers"), 2);
}

// --- Scenario registrations ---

macro_rules! register_scenario {
    ($fn_name:ident, $title:literal) => {
        #[scenario(path = "tests/features/upsert.feature", name = $title)]
        fn $fn_name(world: UpsertWorld) {
            let _ = world;
        }
    };
}

register_scenario!(replacing_a_lap, "replacing a lap with a newer timing");
register_scenario!(skipping_orphan_driver, "skipping a driver without a session key");
register_scenario!(repeating_a_batch, "repeating a batch leaves the collection unchanged");

//! Idempotent persistence of fetched records.

use log::{info, warn};

use crate::{DocumentStore, MissingKeyError, Record, StoreError, UniqueKey, WriteOutcome};

/// Outcome of an [`upsert_records`] call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpsertReport {
    /// Records visited, including skipped ones.
    pub processed: usize,
    /// Records written as new documents.
    pub inserted: usize,
    /// Records that replaced an existing document.
    pub replaced: usize,
    /// Records discarded because a unique key field was missing.
    pub skipped: Vec<MissingKeyError>,
}

impl UpsertReport {
    /// Number of records written to the store.
    #[must_use]
    pub const fn written(&self) -> usize {
        self.inserted + self.replaced
    }

    fn record_outcome(&mut self, outcome: WriteOutcome) {
        match outcome {
            WriteOutcome::Inserted => self.inserted += 1,
            WriteOutcome::Replaced => self.replaced += 1,
        }
    }
}

/// Write each record into `collection`, replacing any document with the same
/// unique key values or inserting a new one.
///
/// Records are visited in input order and written one at a time. A record
/// lacking any field of `unique_key` is logged, reported in
/// [`UpsertReport::skipped`], and never written. Store failures abort the
/// call.
///
/// # Examples
///
/// ```
/// use pitlane_core::test_support::MemoryDocumentStore;
/// use pitlane_core::{Record, UniqueKey, upsert_records};
/// use serde_json::json;
///
/// let mut store = MemoryDocumentStore::default();
/// let first = Record::try_from(json!({"session_key": 1, "driver_number": 44, "lap_number": 1, "lap_time": 90.1}))
///     .expect("object");
/// let second = Record::try_from(json!({"session_key": 1, "driver_number": 44, "lap_number": 1, "lap_time": 89.9}))
///     .expect("object");
///
/// upsert_records(&mut store, &[first], "laps", &UniqueKey::lap())?;
/// upsert_records(&mut store, &[second.clone()], "laps", &UniqueKey::lap())?;
///
/// assert_eq!(store.documents("laps"), vec![second]);
/// # Ok::<(), pitlane_core::StoreError>(())
/// ```
pub fn upsert_records<S>(
    store: &mut S,
    records: &[Record],
    collection: &str,
    unique_key: &UniqueKey,
) -> Result<UpsertReport, StoreError>
where
    S: DocumentStore + ?Sized,
{
    let mut report = UpsertReport::default();

    for record in records {
        report.processed += 1;
        let key = match unique_key.lookup_key(record) {
            Ok(key) => key,
            Err(missing) => {
                warn!("skipping record without unique key for '{collection}': {missing}");
                report.skipped.push(missing);
                continue;
            }
        };
        let outcome = store.replace_or_insert(collection, &key, record)?;
        report.record_outcome(outcome);
    }

    info!(
        "{} records processed in collection '{collection}' ({} inserted, {} replaced, {} skipped)",
        report.processed,
        report.inserted,
        report.replaced,
        report.skipped.len()
    );
    Ok(report)
}

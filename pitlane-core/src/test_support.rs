//! In-memory `DocumentStore` and scripted `RecordSource` used by unit and
//! behaviour tests.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};

use crate::{
    DocumentStore, FetchError, LookupKey, QueryParams, Record, RecordSource, StoreError,
    WriteOutcome,
};

/// In-memory `DocumentStore` keyed by collection and canonical lookup key.
///
/// Documents keep their first-insertion position so assertions can compare
/// whole collections as vectors.
#[derive(Debug, Default, Clone)]
pub struct MemoryDocumentStore {
    collections: BTreeMap<String, Vec<(String, Record)>>,
    writes: usize,
}

impl MemoryDocumentStore {
    /// Documents currently stored in `collection`.
    #[must_use]
    pub fn documents(&self, collection: &str) -> Vec<Record> {
        self.collections
            .get(collection)
            .map(|entries| entries.iter().map(|(_, record)| record.clone()).collect())
            .unwrap_or_default()
    }

    /// Number of documents in `collection`.
    #[must_use]
    pub fn len(&self, collection: &str) -> usize {
        self.collections.get(collection).map_or(0, Vec::len)
    }

    /// Whether every collection is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.collections.values().all(Vec::is_empty)
    }

    /// Names of collections that have received at least one document.
    #[must_use]
    pub fn collection_names(&self) -> Vec<String> {
        self.collections.keys().cloned().collect()
    }

    /// Total number of successful writes.
    #[must_use]
    pub const fn write_count(&self) -> usize {
        self.writes
    }
}

impl DocumentStore for MemoryDocumentStore {
    fn replace_or_insert(
        &mut self,
        collection: &str,
        key: &LookupKey,
        record: &Record,
    ) -> Result<WriteOutcome, StoreError> {
        let canonical = key.canonical();
        let entries = self.collections.entry(collection.to_owned()).or_default();
        self.writes += 1;
        if let Some(slot) = entries.iter_mut().find(|(existing, _)| *existing == canonical) {
            slot.1 = record.clone();
            return Ok(WriteOutcome::Replaced);
        }
        entries.push((canonical, record.clone()));
        Ok(WriteOutcome::Inserted)
    }
}

/// Scripted `RecordSource` returning pre-configured responses per endpoint.
///
/// Endpoints without a configured response yield an empty batch. Every call
/// is recorded so tests can assert on ordering and parameters.
///
/// # Example
///
/// ```
/// use pitlane_core::test_support::StubRecordSource;
/// use pitlane_core::{FetchError, QueryParams, Record, RecordSource};
/// use serde_json::json;
///
/// let session = Record::try_from(json!({"session_key": 9476})).expect("object");
/// let source = StubRecordSource::default()
///     .with_records("sessions", vec![session.clone()])
///     .with_error(
///         "laps",
///         FetchError::Network {
///             url: "https://example.org/laps".to_owned(),
///             message: "connection refused".to_owned(),
///         },
///     );
///
/// assert_eq!(source.fetch("sessions", &QueryParams::new()), Ok(vec![session]));
/// assert!(source.fetch("laps", &QueryParams::new()).is_err());
/// assert_eq!(source.fetch("drivers", &QueryParams::new()), Ok(Vec::new()));
/// assert_eq!(source.calls().len(), 3);
/// ```
#[derive(Debug, Default, Clone)]
pub struct StubRecordSource {
    responses: HashMap<String, Result<Vec<Record>, FetchError>>,
    calls: RefCell<Vec<(String, QueryParams)>>,
}

impl StubRecordSource {
    /// Respond to `endpoint` with `records`.
    #[must_use]
    pub fn with_records(mut self, endpoint: impl Into<String>, records: Vec<Record>) -> Self {
        self.responses.insert(endpoint.into(), Ok(records));
        self
    }

    /// Respond to `endpoint` with `error`.
    #[must_use]
    pub fn with_error(mut self, endpoint: impl Into<String>, error: FetchError) -> Self {
        self.responses.insert(endpoint.into(), Err(error));
        self
    }

    /// Calls received so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<(String, QueryParams)> {
        self.calls.borrow().clone()
    }

    /// Endpoints requested so far, in order.
    #[must_use]
    pub fn endpoints(&self) -> Vec<String> {
        self.calls
            .borrow()
            .iter()
            .map(|(endpoint, _)| endpoint.clone())
            .collect()
    }
}

impl RecordSource for StubRecordSource {
    fn fetch(&self, endpoint: &str, params: &QueryParams) -> Result<Vec<Record>, FetchError> {
        self.calls
            .borrow_mut()
            .push((endpoint.to_owned(), params.clone()));
        self.responses
            .get(endpoint)
            .cloned()
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}

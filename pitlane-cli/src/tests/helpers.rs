//! Test helpers for scripted API responses and temporary document stores.

use super::*;
use crate::collect::{CollectBackends, CollectConfig, DefaultCollectBackends};
use camino::Utf8PathBuf;
use pitlane_core::test_support::StubRecordSource;
use pitlane_core::{DocumentStore, FetchError, Record, RecordSource};
use serde_json::{Value, json};
use tempfile::TempDir;

/// Backends serving scripted records and opening the configured store.
pub(super) struct StubSourceBackends {
    pub(super) source: StubRecordSource,
}

impl CollectBackends for StubSourceBackends {
    fn source(&self, _config: &CollectConfig) -> Result<Box<dyn RecordSource>, CliError> {
        Ok(Box::new(self.source.clone()))
    }

    fn store(&self, config: &CollectConfig) -> Result<Box<dyn DocumentStore>, CliError> {
        DefaultCollectBackends.store(config)
    }
}

/// Temporary directory holding a SQLite database file.
pub(super) struct StoreWorkspace {
    _dir: TempDir,
    db_path: Utf8PathBuf,
}

impl StoreWorkspace {
    pub(super) fn new() -> Self {
        let dir = TempDir::new().expect("tempdir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 workspace");
        Self {
            _dir: dir,
            db_path: root.join("openf1.db"),
        }
    }

    pub(super) fn uri(&self) -> String {
        format!("sqlite://{}", self.db_path)
    }

    #[cfg(feature = "store-sqlite")]
    pub(super) fn open(&self) -> pitlane_data::store::SqliteDocumentStore {
        pitlane_data::store::SqliteDocumentStore::open(&self.db_path).expect("database should open")
    }
}

pub(super) fn record(value: Value) -> Record {
    Record::try_from(value).expect("object payload")
}

/// One race session with two drivers and three laps.
pub(super) fn served_source() -> StubRecordSource {
    StubRecordSource::default()
        .with_records(
            "sessions",
            vec![record(json!({"session_key": 9476, "meeting_key": 1230, "session_name": "Race"}))],
        )
        .with_records(
            "drivers",
            vec![
                record(json!({"session_key": 9476, "driver_number": 1, "name_acronym": "VER"})),
                record(json!({"session_key": 9476, "driver_number": 11, "name_acronym": "PER"})),
            ],
        )
        .with_records(
            "laps",
            vec![
                record(json!({"session_key": 9476, "driver_number": 1, "lap_number": 1})),
                record(json!({"session_key": 9476, "driver_number": 1, "lap_number": 2})),
                record(json!({"session_key": 9476, "driver_number": 11, "lap_number": 1})),
            ],
        )
}

pub(super) fn failing_endpoint(source: StubRecordSource, endpoint: &str) -> StubRecordSource {
    source.with_error(
        endpoint,
        FetchError::Http {
            url: format!("https://api.openf1.org/v1/{endpoint}"),
            status: 502,
            message: "bad gateway".to_owned(),
        },
    )
}

//! Facade crate for the Pitlane motorsport collector.
//!
//! This crate re-exports the core domain types and the HTTP source, and
//! exposes the document store backends behind feature flags.

#![forbid(unsafe_code)]

pub use pitlane_core::{
    CollectError, CollectionPlan, CollectionReport, Collector, DocumentStore, FetchError,
    FetchFailurePolicy, LookupKey, MissingKeyError, QueryParams, Record, RecordSource,
    RunParameters, Stage, StageReport, StoreError, UniqueKey, UpsertReport, WriteOutcome,
    upsert_records,
};

pub use pitlane_data::http::{HttpRecordSource, HttpRecordSourceConfig, SourceBuildError};
pub use pitlane_data::store::{OpenStoreError, StoreLocation, open_document_store};

#[cfg(feature = "store-sqlite")]
pub use pitlane_data::store::{SqliteDocumentStore, SqliteStoreError};

#[cfg(feature = "store-mongodb")]
pub use pitlane_data::store::{MongoDocumentStore, MongoStoreError};

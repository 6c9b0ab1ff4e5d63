//! Core domain types for the Pitlane collector.
//!
//! Records fetched from the OpenF1 API are schema-less JSON objects. This
//! crate defines how they are identified ([`UniqueKey`], [`LookupKey`]), the
//! seams to the outside world ([`RecordSource`], [`DocumentStore`]), the
//! idempotent [`upsert_records`] operation, and the [`Collector`] that
//! sequences fetches and writes.
//!
//! Adapters for HTTP and concrete databases live in `pitlane-data`.
#![forbid(unsafe_code)]

mod collector;
mod key;
mod record;
mod source;
mod store;
mod upsert;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use collector::{
    CollectError, CollectionPlan, CollectionReport, Collector, DEFAULT_MEETING_KEY,
    DEFAULT_SESSION_KEY, DEFAULT_YEAR, FetchFailurePolicy, RunParameters, Stage, StageReport,
};
pub use key::{LookupKey, MissingKeyError, UniqueKey, UniqueKeyError};
pub use record::{NotAnObject, Record};
pub use source::{FetchError, QueryParams, RecordSource};
pub use store::{DocumentStore, StoreError, WriteOutcome};
pub use upsert::{UpsertReport, upsert_records};

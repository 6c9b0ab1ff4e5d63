//! Sequencing of fetch and upsert stages.
//!
//! A [`CollectionPlan`] lists the stages to run; the [`Collector`] executes
//! them one after another against a [`RecordSource`] and a
//! [`DocumentStore`]. The standard OpenF1 plan covers sessions, drivers, and
//! laps for a single meeting and session.

use log::{error, info};
use thiserror::Error;

use crate::{
    DocumentStore, FetchError, QueryParams, RecordSource, StoreError, UniqueKey, UpsertReport,
    upsert_records,
};

/// Season year collected when none is configured.
pub const DEFAULT_YEAR: u16 = 2024;
/// Meeting collected when none is configured (2024 Saudi Arabian Grand Prix).
pub const DEFAULT_MEETING_KEY: u32 = 1230;
/// Session collected when none is configured (its race session).
pub const DEFAULT_SESSION_KEY: u32 = 9476;

/// Identifiers selecting which slice of the API to collect.
///
/// # Examples
///
/// ```
/// use pitlane_core::RunParameters;
///
/// let monza = RunParameters::new(2023, 1219, 9159);
/// assert_eq!(monza.session_key, 9159);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunParameters {
    /// Championship season, used to filter sessions.
    pub year: u16,
    /// Meeting (race weekend) identifier, used to filter sessions.
    pub meeting_key: u32,
    /// Session identifier, used to filter drivers and laps.
    pub session_key: u32,
}

impl RunParameters {
    /// Construct run parameters.
    #[must_use]
    pub const fn new(year: u16, meeting_key: u32, session_key: u32) -> Self {
        Self {
            year,
            meeting_key,
            session_key,
        }
    }
}

impl Default for RunParameters {
    fn default() -> Self {
        Self::new(DEFAULT_YEAR, DEFAULT_MEETING_KEY, DEFAULT_SESSION_KEY)
    }
}

/// What the collector does when a fetch fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FetchFailurePolicy {
    /// Log the failure, treat the batch as empty, and run the next stage.
    #[default]
    Continue,
    /// Stop at the first failed fetch and return [`CollectError::Fetch`].
    Abort,
}

/// One fetch-then-upsert step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stage {
    /// API endpoint name, e.g. `laps`.
    pub endpoint: String,
    /// Query parameters sent with the fetch.
    pub params: QueryParams,
    /// Target collection name.
    pub collection: String,
    /// Fields identifying a document within the collection.
    pub unique_key: UniqueKey,
}

impl Stage {
    /// Construct a stage.
    #[must_use]
    pub fn new(
        endpoint: impl Into<String>,
        params: QueryParams,
        collection: impl Into<String>,
        unique_key: UniqueKey,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            params,
            collection: collection.into(),
            unique_key,
        }
    }
}

/// Ordered list of stages executed by a [`Collector`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectionPlan {
    stages: Vec<Stage>,
}

impl CollectionPlan {
    /// Build a plan from explicit stages.
    #[must_use]
    pub const fn new(stages: Vec<Stage>) -> Self {
        Self { stages }
    }

    /// The sessions, drivers, and laps stages for `params`.
    ///
    /// # Examples
    ///
    /// ```
    /// use pitlane_core::{CollectionPlan, RunParameters};
    ///
    /// let plan = CollectionPlan::openf1(&RunParameters::default());
    /// let endpoints: Vec<_> = plan.stages().iter().map(|s| s.endpoint.as_str()).collect();
    /// assert_eq!(endpoints, ["sessions", "drivers", "laps"]);
    /// ```
    #[must_use]
    pub fn openf1(params: &RunParameters) -> Self {
        let by_session = QueryParams::new().with("session_key", params.session_key);
        Self::new(vec![
            Stage::new(
                "sessions",
                QueryParams::new()
                    .with("year", params.year)
                    .with("meeting_key", params.meeting_key),
                "sessions",
                UniqueKey::session(),
            ),
            Stage::new("drivers", by_session.clone(), "drivers", UniqueKey::driver()),
            Stage::new("laps", by_session, "laps", UniqueKey::lap()),
        ])
    }

    /// Stages in execution order.
    #[must_use]
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }
}

/// Outcome of a single stage.
#[derive(Debug, Clone, PartialEq)]
pub struct StageReport {
    /// Endpoint that was fetched.
    pub endpoint: String,
    /// Collection that was written.
    pub collection: String,
    /// Records returned by the fetch; zero when it failed.
    pub fetched: usize,
    /// The suppressed fetch failure, if any.
    pub fetch_error: Option<FetchError>,
    /// Upsert counters for the stage.
    pub upsert: UpsertReport,
}

/// Outcome of a full [`Collector::run`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollectionReport {
    /// Per-stage reports in execution order.
    pub stages: Vec<StageReport>,
}

impl CollectionReport {
    /// Stages whose fetch failed and was suppressed.
    pub fn failed_fetches(&self) -> impl Iterator<Item = &StageReport> {
        self.stages.iter().filter(|stage| stage.fetch_error.is_some())
    }

    /// Records written across all stages.
    #[must_use]
    pub fn written(&self) -> usize {
        self.stages.iter().map(|stage| stage.upsert.written()).sum()
    }

    /// Records skipped for missing keys across all stages.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.stages.iter().map(|stage| stage.upsert.skipped.len()).sum()
    }
}

/// Errors returned by [`Collector::run`].
#[derive(Debug, Error)]
pub enum CollectError {
    /// A fetch failed under [`FetchFailurePolicy::Abort`].
    #[error("fetching '{endpoint}' failed: {source}")]
    Fetch {
        /// Endpoint that failed.
        endpoint: String,
        /// Underlying fetch error.
        #[source]
        source: FetchError,
    },
    /// The store rejected a write.
    #[error("writing collection '{collection}' failed: {source}")]
    Store {
        /// Collection being written.
        collection: String,
        /// Underlying store error.
        #[source]
        source: StoreError,
    },
}

/// Runs a [`CollectionPlan`] against a record source and a document store.
///
/// # Examples
///
/// ```
/// use pitlane_core::test_support::{MemoryDocumentStore, StubRecordSource};
/// use pitlane_core::{CollectionPlan, Collector, Record, RunParameters};
/// use serde_json::json;
///
/// let session = Record::try_from(json!({"session_key": 9476, "session_name": "Race"}))
///     .expect("object");
/// let source = StubRecordSource::default().with_records("sessions", vec![session]);
/// let mut collector = Collector::new(source, MemoryDocumentStore::default());
///
/// let report = collector.run(&CollectionPlan::openf1(&RunParameters::default()))?;
/// assert_eq!(report.stages.len(), 3);
/// assert_eq!(collector.store().len("sessions"), 1);
/// # Ok::<(), pitlane_core::CollectError>(())
/// ```
#[derive(Debug)]
pub struct Collector<S, D> {
    source: S,
    store: D,
    policy: FetchFailurePolicy,
}

impl<S, D> Collector<S, D>
where
    S: RecordSource,
    D: DocumentStore,
{
    /// Create a collector with the default [`FetchFailurePolicy::Continue`].
    #[must_use]
    pub fn new(source: S, store: D) -> Self {
        Self {
            source,
            store,
            policy: FetchFailurePolicy::default(),
        }
    }

    /// Set the fetch failure policy.
    #[must_use]
    pub fn with_policy(mut self, policy: FetchFailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Borrow the record source.
    pub const fn source(&self) -> &S {
        &self.source
    }

    /// Borrow the document store.
    pub const fn store(&self) -> &D {
        &self.store
    }

    /// Consume the collector and return its source and store.
    pub fn into_parts(self) -> (S, D) {
        (self.source, self.store)
    }

    /// Execute every stage of `plan` in order.
    pub fn run(&mut self, plan: &CollectionPlan) -> Result<CollectionReport, CollectError> {
        let mut report = CollectionReport::default();
        for stage in plan.stages() {
            report.stages.push(self.run_stage(stage)?);
        }
        Ok(report)
    }

    /// Fetch `stage.endpoint` and upsert the result into `stage.collection`.
    ///
    /// Under [`FetchFailurePolicy::Continue`] a failed fetch is logged and
    /// the upsert runs with zero records.
    pub fn run_stage(&mut self, stage: &Stage) -> Result<StageReport, CollectError> {
        let (records, fetch_error) = match self.source.fetch(&stage.endpoint, &stage.params) {
            Ok(records) => {
                info!("{} records fetched from '{}'", records.len(), stage.endpoint);
                (records, None)
            }
            Err(source) => {
                error!("failed to fetch '{}': {source}", stage.endpoint);
                if self.policy == FetchFailurePolicy::Abort {
                    return Err(CollectError::Fetch {
                        endpoint: stage.endpoint.clone(),
                        source,
                    });
                }
                (Vec::new(), Some(source))
            }
        };

        let upsert = upsert_records(
            &mut self.store,
            &records,
            &stage.collection,
            &stage.unique_key,
        )
        .map_err(|source| CollectError::Store {
            collection: stage.collection.clone(),
            source,
        })?;

        Ok(StageReport {
            endpoint: stage.endpoint.clone(),
            collection: stage.collection.clone(),
            fetched: records.len(),
            fetch_error,
            upsert,
        })
    }
}

//! Collect command implementation for the Pitlane CLI.

use std::io::Write;
use std::time::Duration;

use clap::Parser;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use pitlane_core::{
    CollectionPlan, CollectionReport, Collector, DEFAULT_MEETING_KEY, DEFAULT_SESSION_KEY,
    DEFAULT_YEAR, DocumentStore, FetchFailurePolicy, RecordSource, RunParameters,
};
use pitlane_data::http::{DEFAULT_BASE_URL, DEFAULT_USER_AGENT, HttpRecordSource, HttpRecordSourceConfig};
use pitlane_data::store::{StoreLocation, open_document_store};
use serde::{Deserialize, Serialize};

use crate::{
    ARG_ABORT_ON_FETCH_ERROR, ARG_API_BASE_URL, ARG_DATABASE, ARG_MEETING_KEY, ARG_MONGO_URI,
    ARG_SESSION_KEY, ARG_TIMEOUT_SECS, ARG_USER_AGENT, ARG_YEAR, CliError, ENV_DATABASE,
    ENV_MONGO_URI_FALLBACK, ENV_TIMEOUT_SECS, ENV_USER_AGENT,
};

/// Store URI used when neither configuration nor `MONGO_URI` names one.
pub(crate) const DEFAULT_MONGO_URI: &str = "mongodb://localhost:27017";
/// Database receiving the collections.
pub(crate) const DEFAULT_DATABASE: &str = "db_openf1_data";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// CLI arguments for the `collect` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "collect",
    long_about = "Fetch the sessions, drivers, and laps for one OpenF1 meeting \
                 and session, then upsert them into the document store. \
                 Options can come from CLI flags, configuration files, or \
                 environment variables.",
    about = "Collect OpenF1 sessions, drivers, and laps"
)]
#[ortho_config(prefix = "PITLANE")]
pub(crate) struct CollectArgs {
    /// Document store URI (`mongodb://`, `mongodb+srv://`, `sqlite://path`,
    /// or `sqlite::memory:`). Falls back to `MONGO_URI`.
    #[arg(long = ARG_MONGO_URI, value_name = "uri")]
    #[serde(default)]
    pub(crate) mongo_uri: Option<String>,
    /// Database receiving the collections.
    #[arg(long = ARG_DATABASE, value_name = "name")]
    #[serde(default)]
    pub(crate) database: Option<String>,
    /// Base URL of the OpenF1 API.
    #[arg(long = ARG_API_BASE_URL, value_name = "url")]
    #[serde(default)]
    pub(crate) api_base_url: Option<String>,
    /// Request timeout in seconds.
    #[arg(long = ARG_TIMEOUT_SECS, value_name = "seconds")]
    #[serde(default)]
    pub(crate) timeout_secs: Option<u64>,
    /// User agent sent with API requests.
    #[arg(long = ARG_USER_AGENT, value_name = "agent")]
    #[serde(default)]
    pub(crate) user_agent: Option<String>,
    /// Championship year used to select sessions.
    #[arg(long = ARG_YEAR, value_name = "year")]
    #[serde(default)]
    pub(crate) year: Option<u16>,
    /// Meeting (race weekend) key used to select sessions.
    #[arg(long = ARG_MEETING_KEY, value_name = "key")]
    #[serde(default)]
    pub(crate) meeting_key: Option<u32>,
    /// Session key used to select drivers and laps.
    #[arg(long = ARG_SESSION_KEY, value_name = "key")]
    #[serde(default)]
    pub(crate) session_key: Option<u32>,
    /// Stop at the first failed fetch instead of continuing.
    #[arg(long = ARG_ABORT_ON_FETCH_ERROR)]
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub(crate) abort_on_fetch_error: bool,
}

impl CollectArgs {
    pub(crate) fn into_config(self) -> Result<CollectConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        let resolved = merged.with_store_fallback(|name| std::env::var(name).ok());
        CollectConfig::try_from(resolved)
    }

    /// Fill an unset store URI from the unprefixed `MONGO_URI` variable.
    pub(crate) fn with_store_fallback(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if self.mongo_uri.is_none() {
            self.mongo_uri = lookup(ENV_MONGO_URI_FALLBACK);
        }
        self
    }
}

/// Resolved `collect` command configuration.
#[derive(Debug, Clone)]
pub(crate) struct CollectConfig {
    /// Where documents are written.
    pub(crate) store: StoreLocation,
    /// Database receiving the collections.
    pub(crate) database: String,
    /// HTTP source settings.
    pub(crate) source: HttpRecordSourceConfig,
    /// Year, meeting, and session selecting the records.
    pub(crate) params: RunParameters,
    /// Reaction to a failed fetch.
    pub(crate) policy: FetchFailurePolicy,
}

impl TryFrom<CollectArgs> for CollectConfig {
    type Error = CliError;

    fn try_from(args: CollectArgs) -> Result<Self, Self::Error> {
        let uri = args.mongo_uri.unwrap_or_else(|| DEFAULT_MONGO_URI.to_owned());
        let store = StoreLocation::parse(&uri).map_err(|source| CliError::InvalidStoreUri {
            field: ARG_MONGO_URI,
            source,
        })?;

        let database = args.database.unwrap_or_else(|| DEFAULT_DATABASE.to_owned());
        require_non_blank(&database, ARG_DATABASE, ENV_DATABASE)?;

        let timeout_secs = args.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS);
        if timeout_secs == 0 {
            return Err(CliError::InvalidArgument {
                field: ARG_TIMEOUT_SECS,
                env: ENV_TIMEOUT_SECS,
                reason: "must be at least one second".to_owned(),
            });
        }

        let user_agent = args
            .user_agent
            .unwrap_or_else(|| DEFAULT_USER_AGENT.to_owned());
        require_non_blank(&user_agent, ARG_USER_AGENT, ENV_USER_AGENT)?;

        let source = HttpRecordSourceConfig::new(
            args.api_base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_owned()),
        )
        .with_timeout(Duration::from_secs(timeout_secs))
        .with_user_agent(user_agent);

        let params = RunParameters::new(
            args.year.unwrap_or(DEFAULT_YEAR),
            args.meeting_key.unwrap_or(DEFAULT_MEETING_KEY),
            args.session_key.unwrap_or(DEFAULT_SESSION_KEY),
        );
        let policy = if args.abort_on_fetch_error {
            FetchFailurePolicy::Abort
        } else {
            FetchFailurePolicy::Continue
        };

        Ok(Self {
            store,
            database,
            source,
            params,
            policy,
        })
    }
}

fn require_non_blank(value: &str, field: &'static str, env: &'static str) -> Result<(), CliError> {
    if value.trim().is_empty() {
        Err(CliError::InvalidArgument {
            field,
            env,
            reason: "must not be empty".to_owned(),
        })
    } else {
        Ok(())
    }
}

/// Builds the record source and document store for a collect invocation.
pub(crate) trait CollectBackends {
    fn source(&self, config: &CollectConfig) -> Result<Box<dyn RecordSource>, CliError>;
    fn store(&self, config: &CollectConfig) -> Result<Box<dyn DocumentStore>, CliError>;
}

/// Backends talking to the configured API and document store.
pub(crate) struct DefaultCollectBackends;

impl CollectBackends for DefaultCollectBackends {
    fn source(&self, config: &CollectConfig) -> Result<Box<dyn RecordSource>, CliError> {
        let source = HttpRecordSource::with_config(config.source.clone()).map_err(|source| {
            CliError::BuildRecordSource {
                base_url: config.source.base_url.clone(),
                source,
            }
        })?;
        Ok(Box::new(source))
    }

    fn store(&self, config: &CollectConfig) -> Result<Box<dyn DocumentStore>, CliError> {
        open_document_store(&config.store, &config.database).map_err(|source| {
            CliError::OpenStore {
                location: config.store.to_string(),
                source,
            }
        })
    }
}

pub(crate) fn run_collect(args: CollectArgs) -> Result<CollectionReport, CliError> {
    let mut stdout = std::io::stdout().lock();
    run_collect_with(args, &DefaultCollectBackends, &mut stdout)
}

pub(crate) fn run_collect_with(
    args: CollectArgs,
    backends: &dyn CollectBackends,
    writer: &mut dyn Write,
) -> Result<CollectionReport, CliError> {
    let config = args.into_config()?;
    execute_collect(&config, backends, writer)
}

pub(crate) fn execute_collect(
    config: &CollectConfig,
    backends: &dyn CollectBackends,
    writer: &mut dyn Write,
) -> Result<CollectionReport, CliError> {
    let RunParameters {
        year,
        meeting_key,
        session_key,
    } = config.params;
    log::info!("Collecting OpenF1 data for {year}, meeting {meeting_key}, session {session_key}");
    log::info!(
        "Writing to {} (database {})",
        config.store,
        config.database
    );

    let source = backends.source(config)?;
    let store = backends.store(config)?;
    let mut collector = Collector::new(source, store).with_policy(config.policy);
    let report = collector.run(&CollectionPlan::openf1(&config.params))?;

    write_summary(writer, &report)?;
    Ok(report)
}

fn write_summary(writer: &mut dyn Write, report: &CollectionReport) -> Result<(), CliError> {
    let failed = report.failed_fetches().count();
    let mut line = format!(
        "[SUCESSO] All data processed and stored: {} documents written",
        report.written()
    );
    let skipped = report.skipped();
    if skipped > 0 {
        line.push_str(&format!(", {skipped} records skipped"));
    }
    if failed > 0 {
        line.push_str(&format!(", {failed} fetches failed"));
    }
    writeln!(writer, "{line}").map_err(CliError::WriteSummary)
}

#[cfg(test)]
pub(crate) fn config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<CollectConfig, CliError> {
    let merged = CollectArgs::merge_from_layers(layers).map_err(CliError::from)?;
    CollectConfig::try_from(merged)
}

//! Error types emitted by the Pitlane CLI.

use std::error::Error as StdError;
use std::sync::Arc;

use pitlane_core::CollectError;
use pitlane_data::http::SourceBuildError;
use pitlane_data::store::OpenStoreError;
use thiserror::Error;

/// Errors emitted by the Pitlane CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// A merged option holds a value the collector cannot use.
    #[error("invalid {field}: {reason} (set --{field} or {env})")]
    InvalidArgument {
        field: &'static str,
        env: &'static str,
        reason: String,
    },
    /// The document store URI could not be interpreted.
    #[error("invalid --{field}: {source}")]
    InvalidStoreUri {
        field: &'static str,
        #[source]
        source: OpenStoreError,
    },
    /// Installing the log subscriber failed.
    #[error("failed to initialise logging: {0}")]
    Logging(#[source] Box<dyn StdError + Send + Sync>),
    /// Constructing the HTTP record source failed.
    #[error("failed to build record source for {base_url:?}: {source}")]
    BuildRecordSource {
        base_url: String,
        #[source]
        source: SourceBuildError,
    },
    /// Opening the document store failed.
    #[error("failed to open document store {location}: {source}")]
    OpenStore {
        location: String,
        #[source]
        source: OpenStoreError,
    },
    /// The collection run stopped early.
    #[error("collection failed: {0}")]
    Collect(#[from] CollectError),
    /// Writing the run summary failed.
    #[error("failed to write run summary: {0}")]
    WriteSummary(#[source] std::io::Error),
}

/// Render `err` followed by any source errors not already in its message.
pub(crate) fn describe(err: &CliError) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}

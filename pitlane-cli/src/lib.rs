//! Command-line interface for the Pitlane OpenF1 collector.
#![forbid(unsafe_code)]

use clap::{Parser, Subcommand};

mod collect;
mod error;
mod logging;

use collect::CollectArgs;
pub use error::CliError;

pub(crate) const ARG_MONGO_URI: &str = "mongo-uri";
pub(crate) const ARG_DATABASE: &str = "database";
pub(crate) const ARG_API_BASE_URL: &str = "api-base-url";
pub(crate) const ARG_TIMEOUT_SECS: &str = "timeout-secs";
pub(crate) const ARG_USER_AGENT: &str = "user-agent";
pub(crate) const ARG_YEAR: &str = "year";
pub(crate) const ARG_MEETING_KEY: &str = "meeting-key";
pub(crate) const ARG_SESSION_KEY: &str = "session-key";
pub(crate) const ARG_ABORT_ON_FETCH_ERROR: &str = "abort-on-fetch-error";
pub(crate) const ENV_DATABASE: &str = "PITLANE_CMDS_COLLECT_DATABASE";
pub(crate) const ENV_TIMEOUT_SECS: &str = "PITLANE_CMDS_COLLECT_TIMEOUT_SECS";
pub(crate) const ENV_USER_AGENT: &str = "PITLANE_CMDS_COLLECT_USER_AGENT";
/// Unprefixed variable consulted when no store URI was configured.
pub(crate) const ENV_MONGO_URI_FALLBACK: &str = "MONGO_URI";

/// Run the Pitlane CLI with the current process arguments and environment.
///
/// Failures after logging is initialised are also logged at `error` level.
///
/// # Errors
///
/// Returns [`CliError`] when argument parsing, configuration, or collection
/// fails.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    logging::init()?;
    let outcome = match cli.command {
        Command::Collect(args) => collect::run_collect(args).map(drop),
    };
    if let Err(err) = &outcome {
        log::error!("{}", error::describe(err));
    }
    outcome
}

#[derive(Debug, Parser)]
#[command(
    name = "pitlane",
    about = "Collect OpenF1 motorsport data into a document store",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Fetch sessions, drivers, and laps and upsert them into the store.
    Collect(CollectArgs),
}

#[cfg(test)]
mod tests;

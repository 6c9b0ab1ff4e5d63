//! Entry point for the command-line interface.
#![forbid(unsafe_code)]

use std::process::ExitCode;

use pitlane_cli::CliError;

fn main() -> ExitCode {
    match pitlane_cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(CliError::ArgumentParsing(err)) => err.exit(),
        Err(CliError::Logging(err)) => {
            eprintln!("pitlane: failed to initialise logging: {err}");
            ExitCode::FAILURE
        }
        // Already reported through the log subscriber.
        Err(_) => ExitCode::FAILURE,
    }
}

//! Status-line logging for the CLI.
//!
//! Library crates log through the `log` facade. The CLI installs a
//! `tracing-subscriber` formatter that bridges those records and prints each
//! event to standard output as `[INFO] message`. `RUST_LOG` selects the
//! verbosity; the default is `info`.

use std::fmt;

use tracing::{Event, Level, Subscriber};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;

use crate::CliError;

const DEFAULT_DIRECTIVE: &str = "info";

/// Event formatter producing `[LEVEL] message` lines.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct StatusLineFormat;

impl<S, N> FormatEvent<S, N> for StatusLineFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        write!(writer, "[{}] ", level_tag(*event.metadata().level()))?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Four-letter tag printed in front of each status line.
pub(crate) fn level_tag(level: Level) -> &'static str {
    match level {
        Level::ERROR => "ERRO",
        Level::WARN => "WARN",
        Level::INFO => "INFO",
        Level::DEBUG => "DEBG",
        _ => "TRCE",
    }
}

/// Install the global subscriber and the `log` bridge.
pub(crate) fn init() -> Result<(), CliError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stdout)
        .event_format(StatusLineFormat)
        .try_init()
        .map_err(CliError::Logging)
}

//! Log setup: console output plus a timestamped log file per run

use std::fmt;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::Local;
use tracing::{Event, Subscriber};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;

use crate::error::CliError;

/// Plain `SEVERITY: message` lines
struct SeverityFormat;

impl<S, N> FormatEvent<S, N> for SeverityFormat
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
        write!(writer, "{}: ", event.metadata().level())?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Log file name for a command, e.g. `data-exporter-logs-20240131.0915.txt`
pub fn log_file_name(command: &str, timestamp: &str) -> String {
    format!("{command}-exporter-logs-{timestamp}.txt")
}

/// Install the console and file layers, returning the log file path
pub fn init(command: &str, log_dir: &Path) -> Result<PathBuf, CliError> {
    fs::create_dir_all(log_dir).map_err(|source| CliError::LogFile {
        path: log_dir.to_path_buf(),
        source,
    })?;
    let timestamp = Local::now().format("%Y%m%d.%H%M").to_string();
    let path = log_dir.join(log_file_name(command, &timestamp));
    let file = File::options()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(|source| CliError::LogFile {
            path: path.clone(),
            source,
        })?;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact();
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .event_format(SeverityFormat);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .init();
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_file_name() {
        assert_eq!(
            log_file_name("users", "20240131.0915"),
            "users-exporter-logs-20240131.0915.txt"
        );
    }
}

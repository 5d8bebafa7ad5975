//! Log file setup
//!
//! Every run appends to one file per day under the configured directory,
//! `sim<YYYY-MM-DD>.log` in simulation mode and `<YYYY-MM-DD>.log` otherwise.
//! Lines carry a bracketed level prefix followed by a local timestamp:
//!
//! ```text
//! [INFO]:  2024/06/01 12:00:00.000123 Fetched a total of 250 users
//! [TRACE]: 2024/06/01 12:00:00.000456 --> Status 200 OK
//! ```
//!
//! Debug and trace events share the `[TRACE]` prefix. In verbose mode trace
//! lines are written to the file and info-and-above lines are mirrored to
//! stderr.

use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{Local, NaiveDate};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::format::{self, FormatEvent, FormatFields};
use tracing_subscriber::fmt::FmtContext;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{EnvFilter, Layer};

use crate::constants::{env as env_constants, logging};
use crate::errors::LogError;

/// Path of the log file for a given day
pub fn log_file_path(dir: &Path, simulation: bool, date: NaiveDate) -> PathBuf {
    let prefix = if simulation {
        logging::SIMULATION_PREFIX
    } else {
        ""
    };
    dir.join(format!(
        "{}{}.{}",
        prefix,
        date.format(logging::FILE_DATE_FORMAT),
        logging::EXTENSION
    ))
}

/// Create the log directory if needed and open today's file for appending
pub fn open_log_file(dir: &Path, simulation: bool) -> Result<(File, PathBuf), LogError> {
    fs::create_dir_all(dir).map_err(|source| LogError::CreateDir {
        path: dir.to_path_buf(),
        source,
    })?;

    let path = log_file_path(dir, simulation, Local::now().date_naive());
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(|source| LogError::OpenFile {
            path: path.clone(),
            source,
        })?;

    Ok((file, path))
}

/// Install the global subscriber writing to today's log file
///
/// Returns the path of the file being written.
pub fn init(dir: &Path, simulation: bool, verbose: bool) -> Result<PathBuf, LogError> {
    let (file, path) = open_log_file(dir, simulation)?;
    let filter = build_filter(verbose)?;

    tracing::subscriber::set_global_default(build_subscriber(file, verbose, filter))
        .map_err(|e| LogError::AlreadyInitialized(e.to_string()))?;

    Ok(path)
}

/// Filter from `STASH_USERS_LOG`, or the verbosity default
fn build_filter(verbose: bool) -> Result<EnvFilter, LogError> {
    match std::env::var(env_constants::LOG_FILTER) {
        Ok(directives) => {
            EnvFilter::try_new(directives).map_err(|e| LogError::InvalidFilter(e.to_string()))
        }
        Err(_) => Ok(EnvFilter::new(default_directives(verbose))),
    }
}

fn default_directives(verbose: bool) -> &'static str {
    if verbose {
        "info,stash_users=trace"
    } else {
        "info"
    }
}

/// Subscriber writing bracketed lines to `file`, mirrored to stderr when verbose
pub fn build_subscriber(
    file: File,
    verbose: bool,
    filter: EnvFilter,
) -> impl Subscriber + Send + Sync + 'static {
    let file_layer = tracing_subscriber::fmt::layer()
        .event_format(BracketFormat)
        .with_ansi(false)
        .with_writer(Mutex::new(file));

    let console_layer = verbose.then(|| {
        tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr)
            .with_filter(LevelFilter::INFO)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(console_layer)
}

/// Prefix written before the timestamp of every line
pub fn level_prefix(level: &Level) -> &'static str {
    match *level {
        Level::ERROR => "[ERROR]: ",
        Level::WARN => "[WARN]:  ",
        Level::INFO => "[INFO]:  ",
        Level::DEBUG | Level::TRACE => "[TRACE]: ",
    }
}

/// `[LEVEL]: <timestamp> <message>` line format
#[derive(Debug, Clone, Copy, Default)]
pub struct BracketFormat;

impl<S, N> FormatEvent<S, N> for BracketFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: format::Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        write!(
            writer,
            "{}{} ",
            level_prefix(event.metadata().level()),
            Local::now().format(logging::LINE_TIMESTAMP_FORMAT)
        )?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

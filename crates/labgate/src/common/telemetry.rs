#![expect(clippy::print_stderr, reason = "Tracing not initialized yet")]

//! Tracing setup for the daemon and the CLI.
//!
//! Logs go to stderr by default. `LABGATE_LOG` names a file instead, and
//! `LABGATE_LOG_ROTATE` rolls it hourly or daily for long-running gateways.

use std::io::IsTerminal;
use std::path::Path;
use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::RollingFileAppender;
use tracing_appender::rolling::Rotation;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

pub const LOG_FILE_ENV: &str = "LABGATE_LOG";
pub const LOG_FORMAT_ENV: &str = "LABGATE_LOG_FORMAT";
pub const LOG_STREAM_ENV: &str = "LABGATE_LOG_STREAM";
pub const LOG_ROTATE_ENV: &str = "LABGATE_LOG_ROTATE";

/// Keeps the non-blocking file writer alive until the process exits.
#[derive(Debug)]
pub struct TelemetryGuard {
    _guard: Option<WorkerGuard>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum LogRotation {
    Never,
    Hourly,
    Daily,
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum LogTarget {
    Stderr,
    Stdout,
    File { path: PathBuf, rotation: LogRotation },
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct TelemetryConfig {
    format: LogFormat,
    target: LogTarget,
}

impl TelemetryConfig {
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let format = match read(LOG_FORMAT_ENV).map(|v| v.to_lowercase()).as_deref() {
            Some("json") => LogFormat::Json,
            _ => LogFormat::Text,
        };
        let rotation = match read(LOG_ROTATE_ENV).map(|v| v.to_lowercase()).as_deref() {
            Some("hourly") => LogRotation::Hourly,
            Some("daily") => LogRotation::Daily,
            _ => LogRotation::Never,
        };
        let target = match read(LOG_FILE_ENV) {
            Some(path) => LogTarget::File {
                path: PathBuf::from(path),
                rotation,
            },
            None => match read(LOG_STREAM_ENV).map(|v| v.to_lowercase()).as_deref() {
                Some("stdout") => LogTarget::Stdout,
                _ => LogTarget::Stderr,
            },
        };
        Self { format, target }
    }
}

pub fn init_tracing(default_level: &str) -> TelemetryGuard {
    let config = TelemetryConfig::from_lookup(|key| std::env::var(key).ok());
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let (writer, guard, ansi) = open_writer(&config.target);

    // Session tasks run inside a `session` span; JSON lines carry its id.
    let subscriber: Box<dyn tracing::Subscriber + Send + Sync> = match config.format {
        LogFormat::Json => Box::new(
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_ansi(false)
                .json()
                .with_current_span(true)
                .with_span_list(false)
                .with_writer(writer)
                .finish(),
        ),
        LogFormat::Text => Box::new(
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_thread_names(true)
                .with_ansi(ansi)
                .with_writer(writer)
                .finish(),
        ),
    };

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        return TelemetryGuard { _guard: None };
    }
    TelemetryGuard { _guard: guard }
}

fn open_writer(target: &LogTarget) -> (BoxMakeWriter, Option<WorkerGuard>, bool) {
    match target {
        LogTarget::Stdout => (
            BoxMakeWriter::new(std::io::stdout),
            None,
            std::io::stdout().is_terminal(),
        ),
        LogTarget::Stderr => stderr_writer(),
        LogTarget::File { path, rotation } => match file_appender(path, *rotation) {
            Ok(appender) => {
                let (non_blocking, guard) = tracing_appender::non_blocking(appender);
                (BoxMakeWriter::new(non_blocking), Some(guard), false)
            }
            Err(err) => {
                eprintln!(
                    "Warning: failed to open log file {}: {}",
                    path.display(),
                    err
                );
                stderr_writer()
            }
        },
    }
}

fn stderr_writer() -> (BoxMakeWriter, Option<WorkerGuard>, bool) {
    (
        BoxMakeWriter::new(std::io::stderr),
        None,
        std::io::stderr().is_terminal(),
    )
}

/// With `Never` the file keeps the exact configured name; rotated files get
/// a date suffix.
fn file_appender(
    path: &Path,
    rotation: LogRotation,
) -> Result<RollingFileAppender, tracing_appender::rolling::InitError> {
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let prefix = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "labgate.log".to_string());
    let rotation = match rotation {
        LogRotation::Never => Rotation::NEVER,
        LogRotation::Hourly => Rotation::HOURLY,
        LogRotation::Daily => Rotation::DAILY,
    };
    RollingFileAppender::builder()
        .rotation(rotation)
        .filename_prefix(prefix)
        .build(directory)
}

//! Structured JSONL logging plus human-readable stderr output.
//!
//! - **JSONL to file** (`~/.stack/logs/stack.jsonl`) for later inspection
//! - **Pretty to stderr** for whoever launched the daemon
//!
//! ```rust,ignore
//! let _guard = stack_capture::logging::init();
//! tracing::info!(event_type = "app_start", "stack started");
//! ```

use std::fs::{self, OpenOptions};
use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing::Subscriber;
use tracing_subscriber::layer::{Layer, SubscriberExt};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

const LOG_FILE_NAME: &str = "stack.jsonl";

/// Guard that must be kept alive for the duration of the program.
/// Dropping it flushes and closes the log file.
pub struct LoggingGuard {
    _file_guard: Option<WorkerGuard>,
}

/// Initialize the dual-output logging system.
///
/// If the log file cannot be opened, only the stderr layer is installed.
pub fn init() -> LoggingGuard {
    let log_dir = get_log_dir();
    if let Err(e) = fs::create_dir_all(&log_dir) {
        eprintln!("[LOGGING] Failed to create log directory: {}", e);
    }

    let log_path = log_dir.join(LOG_FILE_NAME);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let file = OpenOptions::new().create(true).append(true).open(&log_path);

    let file_guard = match file {
        Ok(file) => {
            // Non-blocking writer so a slow disk never stalls the UI thread
            let (non_blocking_file, guard) = tracing_appender::non_blocking(file);

            let json_layer = fmt::layer()
                .json()
                .with_writer(non_blocking_file)
                .with_timer(fmt::time::UtcTime::rfc_3339())
                .with_target(true)
                .with_level(true)
                .with_thread_ids(false)
                .with_thread_names(false)
                .with_file(false)
                .with_line_number(false)
                .with_span_events(FmtSpan::NONE);

            tracing_subscriber::registry()
                .with(env_filter)
                .with(json_layer)
                .with(stderr_layer())
                .init();
            Some(guard)
        }
        Err(e) => {
            eprintln!("[LOGGING] Failed to open log file {}: {}", log_path.display(), e);
            tracing_subscriber::registry()
                .with(env_filter)
                .with(stderr_layer())
                .init();
            None
        }
    };

    tracing::info!(
        event_type = "app_lifecycle",
        action = "started",
        log_path = %log_path.display(),
        "Application logging initialized"
    );

    LoggingGuard {
        _file_guard: file_guard,
    }
}

/// Compact human-readable layer for stderr. Built per subscriber stack since
/// the layer type depends on the layers beneath it.
fn stderr_layer<S>() -> impl Layer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .with_target(true)
        .with_level(true)
        .with_thread_ids(false)
        .compact()
}

/// Get the log directory path (~/.stack/logs/)
fn get_log_dir() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".stack").join("logs"))
        .unwrap_or_else(|| std::env::temp_dir().join("stack-logs"))
}

/// Get the path to the JSONL log file
pub fn log_path() -> PathBuf {
    get_log_dir().join(LOG_FILE_NAME)
}

/// Category-tagged log line.
///
/// Prefer tracing macros directly when there are structured fields to attach.
pub fn log(category: &str, message: &str) {
    tracing::info!(category = category, legacy = true, "{}", message);
}

/// Debug-level variant of [`log`], compiled out of release builds.
#[cfg(debug_assertions)]
pub fn log_debug(category: &str, message: &str) {
    tracing::debug!(category = category, legacy = true, "{}", message);
}

#[cfg(not(debug_assertions))]
pub fn log_debug(_category: &str, _message: &str) {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_path_is_jsonl_under_stack_dir() {
        let path = log_path();
        assert_eq!(path.file_name().and_then(|n| n.to_str()), Some("stack.jsonl"));
        assert!(path.parent().is_some());
    }

    #[test]
    fn stderr_layer_stacks_with_and_without_file_layer() {
        use tracing_subscriber::Registry;

        let file_backed = Registry::default()
            .with(EnvFilter::new("info"))
            .with(fmt::layer().json().with_writer(std::io::sink))
            .with(stderr_layer());
        let stderr_only = Registry::default()
            .with(EnvFilter::new("info"))
            .with(stderr_layer());

        tracing::subscriber::with_default(file_backed, || tracing::info!("file and stderr"));
        tracing::subscriber::with_default(stderr_only, || tracing::info!("stderr only"));
    }
}

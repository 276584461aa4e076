//! Structured JSONL logging plus human-readable stderr output.
//!
//! Dual-output logging in the same shape the rest of the tooling expects:
//! - **JSONL to file** (`<data dir>/logotheme/logotheme.jsonl`) - structured,
//!   machine-parseable
//! - **Pretty to stderr** - human-readable for developers
//!
//! # Usage
//!
//! ```rust,ignore
//! use logotheme::logging;
//!
//! // Initialize logging - MUST keep guard alive for duration of program
//! let _guard = logging::init();
//!
//! tracing::info!(event_type = "extraction", cluster_count = 3, "Palette extracted");
//! ```

use std::fs::{self, OpenOptions};
use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Guard that must be kept alive for the duration of the program.
/// Dropping this guard flushes and closes the log file.
pub struct LoggingGuard {
    _file_guard: Option<WorkerGuard>,
}

fn log_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("logotheme")
}

/// Initialize the dual-output logging system.
///
/// Returns a guard that must be kept alive for the duration of the program.
/// If the log file cannot be opened, logging falls back to stderr only.
pub fn init() -> LoggingGuard {
    let dir = log_dir();
    if let Err(e) = fs::create_dir_all(&dir) {
        eprintln!("[LOGGING] Failed to create log directory: {}", e);
    }
    let log_path = dir.join("logotheme.jsonl");

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .ok();

    // Environment filter - default to info, allow override via RUST_LOG
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,image=warn"));

    // Pretty layer for stderr (human developers)
    let pretty_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .with_target(true)
        .with_level(true)
        .with_thread_ids(false)
        .compact();

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(pretty_layer);

    let file_guard = match file {
        Some(file) => {
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
            registry.with(json_layer).init();
            Some(guard)
        }
        None => {
            eprintln!(
                "[LOGGING] Could not open {}, logging to stderr only",
                log_path.display()
            );
            registry.init();
            None
        }
    };

    tracing::debug!(
        event_type = "lifecycle",
        log_path = %log_path.display(),
        "Logging initialized"
    );

    LoggingGuard {
        _file_guard: file_guard,
    }
}

//! CEFR level classification for English text, per word and per sentence.
//!
//! The core is pure: [`services::classify`] takes text and an immutable
//! [`services::LevelMap`] snapshot. Building the map (files, LLM calls) is the
//! job of [`services::lexicon`] and [`services::lexicon_builder`].

pub mod error;
pub mod models;
pub mod services;

pub use error::{ClassifyError, ConfigError, LexiconError};
pub use models::{ClassificationResult, ClassifiedWord, LevelTag, Sentence, WordLevel};
pub use services::{classify, classify_with_options, ClassifyOptions, LevelMap};

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

const LOG_PREFIX: &str = "cefr_";
const LOGS_TO_KEEP: usize = 30;

fn env_truthy(name: &str) -> bool {
    matches!(
        std::env::var(name).as_deref(),
        Ok("1") | Ok("true") | Ok("TRUE")
    )
}

/// Initialize logging: console plus a per-session log file.
///
/// `CEFR_DISABLE_FILE_LOG=1` keeps it console-only, `CEFR_LOG_DIR` overrides
/// the log directory, `RUST_LOG` the filter (default `info`). Safe to call
/// more than once; later calls are no-ops.
pub fn init_logging() {
    static INIT: OnceLock<()> = OnceLock::new();
    if INIT.set(()).is_err() {
        return;
    }

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if env_truthy("CEFR_DISABLE_FILE_LOG") {
        init_console_only_logging(env_filter);
        info!("File logging disabled via CEFR_DISABLE_FILE_LOG");
        return;
    }

    let logs_dir = match std::env::var("CEFR_LOG_DIR") {
        Ok(p) if !p.trim().is_empty() => PathBuf::from(p),
        _ => get_logs_dir(),
    };

    if let Err(e) = fs::create_dir_all(&logs_dir) {
        eprintln!("Failed to create logs directory: {}", e);
        init_console_only_logging(env_filter);
        info!("Falling back to console-only logging (log dir not writable)");
        return;
    }

    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    let log_filename = format!("{}{}.log", LOG_PREFIX, timestamp);

    let file_appender = rolling::never(&logs_dir, &log_filename);
    let (file_writer, file_guard) = tracing_appender::non_blocking(file_appender);
    let _ = LOG_GUARD.set(file_guard);

    let file_layer = fmt::layer()
        .with_writer(file_writer)
        .with_ansi(false)
        .with_target(true)
        .with_file(true)
        .with_line_number(true);

    // stdout carries command output, so the console layer writes to stderr.
    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(cfg!(debug_assertions))
        .with_target(true);

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(console_layer)
        .try_init();

    info!(
        log_file = %logs_dir.join(&log_filename).display(),
        version = env!("CARGO_PKG_VERSION"),
        "logging.initialized"
    );

    if !env_truthy("CEFR_DISABLE_LOG_CLEANUP") {
        std::thread::spawn(move || {
            cleanup_old_logs(&logs_dir, LOGS_TO_KEEP);
        });
    }
}

fn get_logs_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("cefr-grader").join("logs"))
        .unwrap_or_else(|| PathBuf::from("logs"))
}

fn cleanup_old_logs(logs_dir: &Path, keep: usize) {
    let mut entries: Vec<_> = match fs::read_dir(logs_dir) {
        Ok(rd) => rd.filter_map(|e| e.ok()).collect(),
        Err(_) => return,
    };

    entries.retain(|e| {
        let name = e.file_name().to_string_lossy().to_string();
        name.starts_with(LOG_PREFIX) && name.ends_with(".log")
    });

    if entries.len() <= keep {
        return;
    }

    entries.sort_by_key(|e| {
        e.metadata()
            .and_then(|m| m.modified())
            .unwrap_or(std::time::SystemTime::UNIX_EPOCH)
    });

    let remove_count = entries.len().saturating_sub(keep);
    for entry in entries.into_iter().take(remove_count) {
        let _ = fs::remove_file(entry.path());
    }
}

fn init_console_only_logging(env_filter: EnvFilter) {
    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(cfg!(debug_assertions))
        .with_target(true);

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .try_init();
}

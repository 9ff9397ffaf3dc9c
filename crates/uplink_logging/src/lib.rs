//! Logging bootstrap for uplink front ends.
//!
//! One daily log file per app under `uplink_home()/logs`, plus stderr.

use anyhow::{Context, Result};
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

const DEFAULT_LOG_FILTER: &str = "uplink=info";
const MAX_LOG_FILES: usize = 5;

pub struct LogConfig<'a> {
    pub app_name: &'a str,
    /// Mirror the file filter on stderr.
    pub verbose: bool,
    /// Only warnings and errors on stderr (e.g. while a GUI owns the terminal).
    pub quiet: bool,
}

/// Install file and stderr logging.
///
/// Keep the returned guard alive for the life of the program; dropping it
/// flushes and stops the file writer.
pub fn init_logging(config: LogConfig<'_>) -> Result<WorkerGuard> {
    let log_dir = uplink::config::ensure_logs_dir().context("Failed to create logs directory")?;
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender(&log_dir, config.app_name)?);

    let file_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let console_filter = match console_directive(&config) {
        Some(directive) => EnvFilter::new(directive),
        None => file_filter.clone(),
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(file_writer)
                .with_ansi(false)
                .with_filter(file_filter),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_filter(console_filter),
        )
        .try_init()
        .context("A global tracing subscriber is already installed")?;

    Ok(guard)
}

/// Stderr filter; `None` means "same as the file".
fn console_directive(config: &LogConfig<'_>) -> Option<&'static str> {
    if config.verbose {
        None
    } else if config.quiet {
        Some("warn")
    } else {
        Some(DEFAULT_LOG_FILTER)
    }
}

fn file_appender(dir: &Path, app_name: &str) -> Result<RollingFileAppender> {
    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(log_file_prefix(app_name))
        .filename_suffix("log")
        .max_log_files(MAX_LOG_FILES)
        .build(dir)
        .with_context(|| format!("Failed to open log file in {}", dir.display()))
}

fn log_file_prefix(app_name: &str) -> String {
    app_name
        .chars()
        .map(|ch| match ch {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '_' => ch,
            _ => '_',
        })
        .collect()
}

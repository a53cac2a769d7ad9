//! Tracing subscriber setup.
//!
//! Filter precedence: SLIDEFORGE_LOG > `[log] level` > `warn`. Output goes to
//! stderr so stdout stays reserved for transcript and JSON output, or to
//! `[log] file` through a non-blocking writer.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::LogConfig;

pub const LOG_ENV: &str = "SLIDEFORGE_LOG";

const DEFAULT_DIRECTIVE: &str = "warn";

/// Keeps the background log writer alive. Drop it last so buffered lines
/// are flushed.
#[must_use]
pub struct LogGuard {
    _worker: Option<WorkerGuard>,
}

fn filter_directive(env_value: Option<String>, configured: Option<&str>) -> String {
    env_value
        .filter(|v| !v.trim().is_empty())
        .or_else(|| {
            configured
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        })
        .unwrap_or_else(|| DEFAULT_DIRECTIVE.to_string())
}

/// Installs the global subscriber.
///
/// # Errors
/// Returns an error if the filter directive is invalid, the log file cannot
/// be opened, or a subscriber is already installed.
pub fn init(config: &LogConfig) -> Result<LogGuard> {
    let directive = filter_directive(std::env::var(LOG_ENV).ok(), config.level.as_deref());
    let filter = EnvFilter::try_new(&directive)
        .with_context(|| format!("Invalid log filter: {directive}"))?;

    let Some(path) = &config.file else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()
            .context("Failed to install log subscriber")?;
        return Ok(LogGuard { _worker: None });
    };

    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let file_name = path
        .file_name()
        .with_context(|| format!("Log file path has no file name: {}", path.display()))?;
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create log directory {}", dir.display()))?;

    let (writer, worker) = tracing_appender::non_blocking(tracing_appender::rolling::never(
        dir, file_name,
    ));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false),
        )
        .try_init()
        .context("Failed to install log subscriber")?;

    Ok(LogGuard {
        _worker: Some(worker),
    })
}

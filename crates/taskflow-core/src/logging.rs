//! Tracing subscriber setup.
//!
//! The TUI owns the terminal, so diagnostics go to a file when one is given
//! (`--log-file` or `TASKFLOW_LOG`). Otherwise a stderr layer is installed
//! that stays silent unless `RUST_LOG` asks for output.
//!
//! Keep the returned [`LogGuard`] alive until exit so buffered lines flush.

use std::path::Path;

use anyhow::{Context, Result};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

pub const LOG_ENV: &str = "TASKFLOW_LOG";

pub struct LogGuard {
    _file_guard: Option<tracing_appender::non_blocking::WorkerGuard>,
}

fn env_filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

/// Installs the global subscriber.
///
/// # Errors
/// Returns an error if the log directory cannot be created or a subscriber is
/// already installed.
pub fn init(log_file: Option<&Path>) -> Result<LogGuard> {
    let Some(path) = log_file else {
        tracing_subscriber::registry()
            .with(env_filter("off"))
            .with(fmt::layer().with_writer(std::io::stderr))
            .try_init()
            .context("install tracing subscriber")?;
        return Ok(LogGuard { _file_guard: None });
    };

    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)
        .with_context(|| format!("create log directory {}", dir.display()))?;
    let file_name = path
        .file_name()
        .with_context(|| format!("log path has no file name: {}", path.display()))?;

    let file_appender = tracing_appender::rolling::never(dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(env_filter("info"))
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .try_init()
        .context("install tracing subscriber")?;

    Ok(LogGuard {
        _file_guard: Some(guard),
    })
}

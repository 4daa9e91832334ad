//! Runtime execution modes.
//!
//! - `headless`: plain log lines on stdout
//! - `tui`: full-screen terminal UI (optional feature)

pub mod headless;

use anyhow::Result;
use taskflow_core::config::RunConfiguration;
use taskflow_core::core::summary::RunSummary;
use tokio_util::sync::CancellationToken;

/// Width of the post-run report table.
pub const REPORT_WIDTH: u16 = 80;

#[cfg(feature = "tui")]
pub async fn run_tui(config: RunConfiguration, cancel: CancellationToken) -> Result<RunSummary> {
    use crate::cli::{APP_NAME, APP_VERSION, TAGLINE};

    let app = taskflow_tui::AppInfo {
        name: APP_NAME,
        version: APP_VERSION,
        tagline: TAGLINE,
    };
    let report = taskflow_tui::run_tui(config, app, cancel).await?;
    report.print(REPORT_WIDTH)?;
    Ok(report.summary)
}

#[cfg(not(feature = "tui"))]
pub async fn run_tui(_config: RunConfiguration, _cancel: CancellationToken) -> Result<RunSummary> {
    anyhow::bail!("TUI support is disabled in this build (feature \"tui\"). Use --headless.");
}

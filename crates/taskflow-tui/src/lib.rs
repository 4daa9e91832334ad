//! Full-screen TUI for taskflow runs.

pub mod common;
pub mod input;
pub mod render;
pub mod report;
pub mod runtime;
pub mod splash;
pub mod terminal;

use anyhow::Result;
pub use report::RunReport;
pub use runtime::TuiRenderer;
pub use splash::AppInfo;
use taskflow_core::config::RunConfiguration;
use taskflow_core::core::driver::LoopDriver;
use taskflow_core::core::events::FrameRenderer;
use taskflow_core::core::interrupt;
use taskflow_core::core::summary::RunSummary;
use taskflow_core::core::viewport::Viewport;
use tokio_util::sync::CancellationToken;

use crate::input::KeyListener;

/// Runs the configured loops full-screen and returns the post-run report.
///
/// The terminal is restored before this returns, also on error.
///
/// # Errors
/// Returns an error if the terminal cannot be set up or a frame fails to draw.
pub async fn run_tui(
    config: RunConfiguration,
    app: AppInfo,
    cancel: CancellationToken,
) -> Result<RunReport> {
    let viewport = terminal::viewport();
    let mut renderer = TuiRenderer::new(app)?;
    let keys = KeyListener::spawn()?;

    let result = drive(config, viewport, &mut renderer, cancel).await;

    keys.stop();
    drop(renderer);
    result
}

/// Runs the driver against `renderer`, then holds the last frame.
///
/// The hold ends early on cancellation, or on a further interrupt after a
/// cancelled run.
///
/// # Errors
/// Returns an error if the configuration is invalid or rendering fails.
pub async fn drive<R: FrameRenderer>(
    config: RunConfiguration,
    viewport: Viewport,
    renderer: R,
    cancel: CancellationToken,
) -> Result<RunReport> {
    let mut driver = LoopDriver::new(config, viewport, renderer, cancel.clone())?;
    let summary = driver.run().await?;
    hold_last_frame(&summary, &cancel).await;
    Ok(RunReport::from_log(summary, driver.log()))
}

async fn hold_last_frame(summary: &RunSummary, cancel: &CancellationToken) {
    let hold = tokio::time::sleep(runtime::hold_duration(summary));
    if summary.cancelled {
        // The token is already spent; the next interrupt ends the hold instead of exiting.
        interrupt::reset();
        tokio::select! {
            () = interrupt::wait_for_interrupt() => {}
            () = hold => {}
        }
    } else {
        tokio::select! {
            () = cancel.cancelled() => {}
            () = hold => {}
        }
    }
}

//! Headless mode: prints log lines as they are appended, then the report.

use std::io::{self, Write};
use std::time::Duration;

use anyhow::{Context, Result};
use taskflow_core::config::RunConfiguration;
use taskflow_core::core::driver::LoopDriver;
use taskflow_core::core::events::{FrameRenderer, FrameSnapshot, ProgressEvent};
use taskflow_core::core::summary::RunSummary;
use taskflow_core::core::viewport::{LEVEL_COLUMN_WIDTH, TIME_COLUMN_WIDTH, Viewport};
use taskflow_core::log::{MessageLog, format_hms};
use tokio_util::sync::CancellationToken;

/// Renderer that writes each newly appended log line once.
pub struct LinePrinter<W: Write> {
    out: W,
    printed: u64,
}

impl<W: Write> LinePrinter<W> {
    pub fn new(out: W) -> Self {
        Self { out, printed: 0 }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> FrameRenderer for LinePrinter<W> {
    fn render(&mut self, _event: &ProgressEvent, frame: &FrameSnapshot<'_>) -> Result<()> {
        let total = frame.log.total_appended();
        let fresh = usize::try_from(total.saturating_sub(self.printed)).unwrap_or(usize::MAX);
        let time_width = usize::from(TIME_COLUMN_WIDTH);
        let level_width = usize::from(LEVEL_COLUMN_WIDTH);

        for line in frame.log.tail(fresh) {
            if line.continuation {
                writeln!(self.out, "{:time_width$} {:level_width$} {}", "", "", line.text)?;
            } else {
                writeln!(
                    self.out,
                    "{} {:<level_width$} {}",
                    format_hms(line.elapsed),
                    line.level.label(),
                    line.text
                )?;
            }
        }
        self.printed = total;
        self.out.flush().context("flush log output")
    }
}

/// Runs without a splash screen, printing to stdout.
///
/// # Errors
/// Returns an error if the configuration is rejected or stdout fails.
pub async fn run(config: RunConfiguration, cancel: CancellationToken) -> Result<RunSummary> {
    let config = config.with_splash_delay(Duration::ZERO)?;
    let mut printer = LinePrinter::new(io::stdout());
    let mut driver = LoopDriver::new(config, Viewport::default(), &mut printer, cancel)?;
    let summary = driver.run().await?;
    print_report(&summary, driver.log())?;
    Ok(summary)
}

#[cfg(feature = "tui")]
fn print_report(summary: &RunSummary, log: &MessageLog) -> Result<()> {
    taskflow_tui::RunReport::from_log(summary.clone(), log).print(super::REPORT_WIDTH)
}

#[cfg(not(feature = "tui"))]
fn print_report(summary: &RunSummary, _log: &MessageLog) -> Result<()> {
    let mut stdout = io::stdout().lock();
    writeln!(stdout)?;
    writeln!(stdout, "Execution Summary")?;
    write!(stdout, "{summary}")?;
    writeln!(stdout)?;
    Ok(())
}

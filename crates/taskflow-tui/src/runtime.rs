//! Frame renderer backed by a ratatui terminal.
//!
//! The driver calls `render` after every mutation. High-frequency events are
//! drawn at most once per [`FRAME_DURATION`]; everything else draws
//! immediately so phase changes are never skipped.

use std::io::Stdout;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, anyhow};
use ratatui::Terminal;
use ratatui::backend::{Backend, CrosstermBackend};
use taskflow_core::core::events::{FrameRenderer, FrameSnapshot, ProgressEvent, RunPhase};
use taskflow_core::core::interrupt;
use taskflow_core::core::summary::RunSummary;

use crate::splash::AppInfo;
use crate::{render, splash, terminal};

/// Target frame rate (60fps = ~16ms per frame).
pub const FRAME_DURATION: Duration = Duration::from_millis(16);

/// How long the last frame stays up after a completed run.
pub const COMPLETED_HOLD: Duration = Duration::from_secs(1);
pub const CANCELLED_HOLD: Duration = Duration::from_millis(500);

pub fn hold_duration(summary: &RunSummary) -> Duration {
    if summary.cancelled {
        CANCELLED_HOLD
    } else {
        COMPLETED_HOLD
    }
}

pub struct TuiRenderer<B: Backend> {
    terminal: Terminal<B>,
    app: AppInfo,
    last_draw: Option<Instant>,
    frames_drawn: u64,
    /// Restore the real terminal on drop.
    owns_terminal: bool,
}

impl TuiRenderer<CrosstermBackend<Stdout>> {
    /// Takes over the terminal (raw mode, alternate screen).
    ///
    /// # Errors
    /// Returns an error if the terminal cannot be set up.
    pub fn new(app: AppInfo) -> Result<Self> {
        // Set up panic hook BEFORE entering alternate screen
        terminal::install_panic_hook();
        interrupt::set_restore_hook(|| {
            let _ = terminal::restore_terminal();
        });

        let terminal = terminal::setup_terminal().context("Failed to setup terminal")?;
        Ok(Self {
            terminal,
            app,
            last_draw: None,
            frames_drawn: 0,
            owns_terminal: true,
        })
    }
}

impl<B: Backend> TuiRenderer<B> {
    /// Wraps an existing terminal without touching global terminal state.
    pub fn with_terminal(terminal: Terminal<B>, app: AppInfo) -> Self {
        Self {
            terminal,
            app,
            last_draw: None,
            frames_drawn: 0,
            owns_terminal: false,
        }
    }

    pub fn terminal(&self) -> &Terminal<B> {
        &self.terminal
    }

    pub fn frames_drawn(&self) -> u64 {
        self.frames_drawn
    }

    fn should_draw(&self, event: &ProgressEvent) -> bool {
        !event.is_high_frequency()
            || self
                .last_draw
                .is_none_or(|last| last.elapsed() >= FRAME_DURATION)
    }

    fn draw(&mut self, snapshot: &FrameSnapshot<'_>) -> Result<()> {
        let app = &self.app;
        self.terminal
            .draw(|frame| match snapshot.phase {
                RunPhase::Splash => splash::render(frame, app),
                _ => render::render(frame, app, snapshot),
            })
            .map_err(|e| anyhow!("Failed to draw frame: {e}"))?;
        self.last_draw = Some(Instant::now());
        self.frames_drawn += 1;
        Ok(())
    }
}

impl<B: Backend> FrameRenderer for TuiRenderer<B> {
    fn render(&mut self, event: &ProgressEvent, frame: &FrameSnapshot<'_>) -> Result<()> {
        if self.should_draw(event) {
            self.draw(frame)?;
        }
        Ok(())
    }
}

impl<B: Backend> Drop for TuiRenderer<B> {
    fn drop(&mut self) {
        if self.owns_terminal {
            let _ = terminal::restore_terminal();
        }
    }
}

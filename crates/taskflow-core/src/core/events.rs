//! Progress events and the renderer contract.
//!
//! The driver calls [`FrameRenderer::render`] after every state mutation,
//! in strict loop order. The renderer gets shared references only; it may
//! throttle its own redraws but never mutates driver state.

use anyhow::Result;

use super::summary::RunSummary;
use crate::log::MessageLog;
use crate::progress::ProgressSnapshot;

/// Driver lifecycle: `Splash → Running → Summary → Done`.
///
/// `Cancelled` is terminal and reachable from `Splash` or `Running`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Splash,
    Running,
    Summary,
    Done,
    Cancelled,
}

impl RunPhase {
    /// Human-readable status for status bars.
    pub fn status_label(self) -> &'static str {
        match self {
            RunPhase::Splash => "Starting",
            RunPhase::Running => "Running",
            RunPhase::Summary | RunPhase::Done => "Completed",
            RunPhase::Cancelled => "Cancelled",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            RunPhase::Summary | RunPhase::Done | RunPhase::Cancelled
        )
    }
}

/// What changed since the previous render. Indices are zero-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressEvent {
    SplashShown,
    RunStarted,
    /// Inner axis was reset for a new outer iteration.
    OuterStarted { outer: u32 },
    MiddleStarted { outer: u32, middle: u32 },
    InnerAdvanced { outer: u32, middle: u32, inner: u32 },
    /// The inner loop stopped early, skipping `remaining` steps.
    EarlyTermination {
        outer: u32,
        middle: u32,
        inner: u32,
        remaining: u32,
    },
    OuterAdvanced { outer: u32 },
    Completed,
    Cancelled,
}

impl ProgressEvent {
    /// High-frequency events that a throttled renderer may skip drawing.
    pub fn is_high_frequency(&self) -> bool {
        matches!(
            self,
            ProgressEvent::InnerAdvanced { .. } | ProgressEvent::MiddleStarted { .. }
        )
    }
}

/// Immutable view of everything a frame needs.
#[derive(Debug, Clone, Copy)]
pub struct FrameSnapshot<'a> {
    pub phase: RunPhase,
    pub progress: &'a ProgressSnapshot,
    pub log: &'a MessageLog,
    pub early_terminations: u64,
    /// Present once the run reached `Summary` or `Cancelled`.
    pub summary: Option<&'a RunSummary>,
}

/// Paints frames. Implemented outside the core (TUI, headless, tests).
pub trait FrameRenderer {
    /// Called after every state mutation. Must return quickly relative to
    /// the base sleep.
    ///
    /// # Errors
    /// Returns an error if drawing fails; the driver stops the run.
    fn render(&mut self, event: &ProgressEvent, frame: &FrameSnapshot<'_>) -> Result<()>;
}

impl<R: FrameRenderer + ?Sized> FrameRenderer for &mut R {
    fn render(&mut self, event: &ProgressEvent, frame: &FrameSnapshot<'_>) -> Result<()> {
        (**self).render(event, frame)
    }
}

/// Renderer that draws nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullRenderer;

impl FrameRenderer for NullRenderer {
    fn render(&mut self, _event: &ProgressEvent, _frame: &FrameSnapshot<'_>) -> Result<()> {
        Ok(())
    }
}

//! The nested-loop state machine.
//!
//! `LoopDriver` walks outer → middle → inner iterations, mutating the dual
//! progress display and the message log, and hands a frame snapshot to the
//! renderer after each mutation. It is the only writer of that state.
//!
//! Suspension happens only at the splash delay and at the simulated work
//! sleep inside the innermost loop. Cancellation is checked at both, and
//! again before each middle iteration.

use std::time::Duration;

use anyhow::Result;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::events::{FrameRenderer, FrameSnapshot, ProgressEvent, RunPhase};
use super::summary::RunSummary;
use super::viewport::Viewport;
use crate::config::{ConfigError, RunConfiguration};
use crate::log::{LogLevel, MessageLog, format_hms};
use crate::progress::DualProgressDisplay;

/// Inner steps between "Processing batch" messages.
const BATCH_SIZE: u32 = 5;
/// Middle iterations between "Initializing sub-task group" messages.
const GROUP_MESSAGE_EVERY: u32 = 3;

/// Rolls the per-step early termination check.
pub fn roll_early_exit<G: Rng>(rng: &mut G, probability: f64) -> bool {
    rng.random_bool(probability)
}

/// Draws a sleep multiplier uniformly from `[min, max]`.
pub fn jitter_factor<G: Rng>(rng: &mut G, (min, max): (f64, f64)) -> f64 {
    if min >= max {
        return min;
    }
    rng.random_range(min..=max)
}

#[derive(Debug, Default, Clone, Copy)]
struct Counters {
    outer_completed: u64,
    middle_completed: u64,
    inner_steps: u64,
    early_terminations: u64,
}

/// Whether the run should keep going after a suspension point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Resume {
    Continue,
    Cancelled,
}

pub struct LoopDriver<R, G = StdRng> {
    config: RunConfiguration,
    display: DualProgressDisplay,
    log: MessageLog,
    renderer: R,
    rng: G,
    cancel: CancellationToken,
    phase: RunPhase,
    counters: Counters,
    run_started: Option<Instant>,
    summary: Option<RunSummary>,
}

impl<R: FrameRenderer> LoopDriver<R, StdRng> {
    /// Creates a driver whose RNG is seeded from the configuration, or from
    /// the OS when no seed is set.
    ///
    /// # Errors
    /// Returns `ConfigError` if the configuration cannot form valid totals.
    pub fn new(
        config: RunConfiguration,
        viewport: Viewport,
        renderer: R,
        cancel: CancellationToken,
    ) -> Result<Self, ConfigError> {
        let rng = match config.seed() {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self::with_rng(config, viewport, renderer, rng, cancel)
    }
}

impl<R: FrameRenderer, G: Rng> LoopDriver<R, G> {
    /// Creates a driver with an explicit random source.
    ///
    /// # Errors
    /// Returns `ConfigError` if the configuration cannot form valid totals.
    pub fn with_rng(
        config: RunConfiguration,
        viewport: Viewport,
        renderer: R,
        rng: G,
        cancel: CancellationToken,
    ) -> Result<Self, ConfigError> {
        let display =
            DualProgressDisplay::new(u64::from(config.outer_count()), config.inner_budget())?;
        let log = MessageLog::new(config.log_capacity(), viewport.log_wrap_width());

        Ok(Self {
            config,
            display,
            log,
            renderer,
            rng,
            cancel,
            phase: RunPhase::Splash,
            counters: Counters::default(),
            run_started: None,
            summary: None,
        })
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    pub fn log(&self) -> &MessageLog {
        &self.log
    }

    pub fn display(&self) -> &DualProgressDisplay {
        &self.display
    }

    pub fn summary(&self) -> Option<&RunSummary> {
        self.summary.as_ref()
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    pub fn into_renderer(self) -> R {
        self.renderer
    }

    /// Runs the whole state machine to `Done` or `Cancelled`.
    ///
    /// Returns the final summary; `summary.cancelled` tells the two apart.
    ///
    /// # Errors
    /// Returns an error if the renderer fails or the driver was already run.
    pub async fn run(&mut self) -> Result<RunSummary> {
        if self.phase != RunPhase::Splash {
            anyhow::bail!("run already finished ({:?})", self.phase);
        }

        self.emit(ProgressEvent::SplashShown)?;
        if self.suspend(self.config.splash_delay()).await == Resume::Cancelled {
            return self.finish_cancelled();
        }

        self.phase = RunPhase::Running;
        self.run_started = Some(Instant::now());
        info!(
            outer = self.config.outer_count(),
            middle = self.config.middle_count(),
            inner = self.config.inner_max(),
            "run started"
        );
        self.log.push(
            LogLevel::Start,
            &format!(
                "Beginning main task execution with {} iterations",
                self.config.outer_count()
            ),
        );
        self.log.push(
            LogLevel::Info,
            &format!(
                "Configuration: {} middle loops, up to {} inner iterations each",
                self.config.middle_count(),
                self.config.inner_max()
            ),
        );
        self.emit(ProgressEvent::RunStarted)?;

        for outer in 0..self.config.outer_count() {
            if self.run_outer(outer).await? == Resume::Cancelled {
                return self.finish_cancelled();
            }
        }

        self.finish_completed()
    }

    async fn run_outer(&mut self, outer: u32) -> Result<Resume> {
        let outer_count = self.config.outer_count();
        let middle_count = self.config.middle_count();
        let inner_max = self.config.inner_max();

        self.display
            .begin_outer_iteration(self.config.inner_budget())?;
        self.log.push(
            LogLevel::Start,
            &format!(
                "Outer iteration {}/{outer_count} started - Processing {middle_count} sub-tasks with {inner_max} steps each",
                outer + 1
            ),
        );
        self.log.push(
            LogLevel::Start,
            &format!("Starting middle loop batch for outer iteration {}", outer + 1),
        );
        self.emit(ProgressEvent::OuterStarted { outer })?;

        for middle in 0..middle_count {
            if self.cancel.is_cancelled() {
                return Ok(Resume::Cancelled);
            }
            if middle % GROUP_MESSAGE_EVERY == 0 {
                self.log.push(
                    LogLevel::Progress,
                    &format!(
                        "Middle loop [{}.{}]: Initializing sub-task group {}/{middle_count}",
                        outer + 1,
                        middle + 1,
                        middle + 1
                    ),
                );
            }
            self.emit(ProgressEvent::MiddleStarted { outer, middle })?;

            if self.run_inner(outer, middle).await? == Resume::Cancelled {
                return Ok(Resume::Cancelled);
            }
            self.counters.middle_completed += 1;
        }

        self.display.advance_outer();
        self.counters.outer_completed += 1;
        self.log.push(
            LogLevel::Complete,
            &format!("Completed all middle iterations for outer {}", outer + 1),
        );

        let done = outer + 1;
        if done % (outer_count / 10).max(1) == 0 {
            let pct = f64::from(done) / f64::from(outer_count) * 100.0;
            self.log.push(
                LogLevel::Complete,
                &format!(
                    "Milestone reached: {pct:.0}% of outer iterations complete ({done}/{outer_count})"
                ),
            );
        }
        self.emit(ProgressEvent::OuterAdvanced { outer })?;
        Ok(Resume::Continue)
    }

    async fn run_inner(&mut self, outer: u32, middle: u32) -> Result<Resume> {
        let inner_max = self.config.inner_max();

        for inner in 0..inner_max {
            let delay = self
                .config
                .base_sleep()
                .mul_f64(jitter_factor(&mut self.rng, self.config.jitter()));
            if self.suspend(delay).await == Resume::Cancelled {
                return Ok(Resume::Cancelled);
            }

            self.counters.inner_steps += 1;
            let position = format!("{}.{}.{}", outer + 1, middle + 1, inner + 1);
            if inner > 0 && inner % BATCH_SIZE == 0 {
                self.log.push(
                    LogLevel::Progress,
                    &format!(
                        "Inner loop [{position}]: Processing batch {}...",
                        inner / BATCH_SIZE + 1
                    ),
                );
            } else {
                self.log.push(
                    LogLevel::Info,
                    &format!("Inner loop [{position}]: Step {}/{inner_max} done", inner + 1),
                );
            }
            self.display.advance_inner(1);
            debug!(outer, middle, inner, ?delay, "inner step");
            self.emit(ProgressEvent::InnerAdvanced {
                outer,
                middle,
                inner,
            })?;

            if roll_early_exit(&mut self.rng, self.config.early_exit_probability()) {
                let remaining = inner_max - inner - 1;
                self.counters.early_terminations += 1;
                // Fill the skipped steps so the inner bar still reaches 100%.
                self.display.advance_inner(u64::from(remaining));
                self.log.push(
                    LogLevel::Warning,
                    &format!(
                        "Early exit at [{position}] - Condition met, skipping {remaining} remaining iterations"
                    ),
                );
                debug!(outer, middle, inner, remaining, "early termination");
                self.emit(ProgressEvent::EarlyTermination {
                    outer,
                    middle,
                    inner,
                    remaining,
                })?;
                break;
            }
        }

        Ok(Resume::Continue)
    }

    /// Sleeps for `duration` unless cancellation arrives first.
    async fn suspend(&self, duration: Duration) -> Resume {
        if self.cancel.is_cancelled() {
            return Resume::Cancelled;
        }
        tokio::select! {
            biased;
            () = self.cancel.cancelled() => Resume::Cancelled,
            () = tokio::time::sleep(duration) => Resume::Continue,
        }
    }

    fn build_summary(&self, cancelled: bool) -> RunSummary {
        RunSummary {
            total_elapsed: self
                .run_started
                .map_or(Duration::ZERO, |start| start.elapsed()),
            outer_iterations_completed: self.counters.outer_completed,
            middle_iterations_completed: self.counters.middle_completed,
            inner_steps_executed: self.counters.inner_steps,
            early_terminations: self.counters.early_terminations,
            max_inner_steps: self.config.max_inner_steps(),
            cancelled,
        }
    }

    fn finish_completed(&mut self) -> Result<RunSummary> {
        self.log
            .push(LogLevel::Complete, "All outer iterations completed successfully!");

        let summary = self.build_summary(false);
        self.log.push(
            LogLevel::Summary,
            &format!(
                "Finished in {}: {} outer iterations, {} inner steps, {} early exits",
                format_hms(summary.total_elapsed),
                summary.outer_iterations_completed,
                summary.inner_steps_executed,
                summary.early_terminations
            ),
        );
        info!(
            elapsed = ?summary.total_elapsed,
            inner_steps = summary.inner_steps_executed,
            early_terminations = summary.early_terminations,
            "run completed"
        );

        self.phase = RunPhase::Summary;
        self.summary = Some(summary.clone());
        self.emit(ProgressEvent::Completed)?;
        self.phase = RunPhase::Done;
        Ok(summary)
    }

    /// Freezes progress where it stands and records a partial summary.
    fn finish_cancelled(&mut self) -> Result<RunSummary> {
        let summary = self.build_summary(true);
        warn!(
            outer_completed = summary.outer_iterations_completed,
            inner_steps = summary.inner_steps_executed,
            "run cancelled"
        );
        self.log
            .push(LogLevel::Warning, "Operation cancelled by user");

        self.phase = RunPhase::Cancelled;
        self.summary = Some(summary.clone());
        self.emit(ProgressEvent::Cancelled)?;
        Ok(summary)
    }

    fn emit(&mut self, event: ProgressEvent) -> Result<()> {
        let progress = self.display.snapshot();
        let frame = FrameSnapshot {
            phase: self.phase,
            progress: &progress,
            log: &self.log,
            early_terminations: self.counters.early_terminations,
            summary: self.summary.as_ref(),
        };
        self.renderer.render(&event, &frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::ProgressSnapshot;

    /// Records every event with the progress it was rendered with.
    #[derive(Default)]
    struct RecordingRenderer {
        frames: Vec<(ProgressEvent, RunPhase, ProgressSnapshot)>,
        cancel_on: Option<(ProgressEvent, CancellationToken)>,
    }

    impl RecordingRenderer {
        fn count(&self, pred: impl Fn(&ProgressEvent) -> bool) -> usize {
            self.frames.iter().filter(|(e, _, _)| pred(e)).count()
        }
    }

    impl FrameRenderer for RecordingRenderer {
        fn render(&mut self, event: &ProgressEvent, frame: &FrameSnapshot<'_>) -> Result<()> {
            assert!(frame.progress.inner.completed <= frame.progress.inner.total);
            assert!(frame.progress.outer.completed <= frame.progress.outer.total);
            assert!(frame.log.len() <= frame.log.capacity());
            self.frames
                .push((*event, frame.phase, frame.progress.clone()));
            if let Some((trigger, token)) = &self.cancel_on
                && trigger == event
            {
                token.cancel();
            }
            Ok(())
        }
    }

    fn config(outer: u32, middle: u32, inner: u32, p: f64) -> RunConfiguration {
        RunConfiguration::new(outer, middle, inner, 0.01)
            .unwrap()
            .with_early_exit_probability(p)
            .unwrap()
            .with_splash_delay(Duration::ZERO)
            .unwrap()
            .with_seed(Some(7))
    }

    fn driver(
        config: RunConfiguration,
        renderer: RecordingRenderer,
        cancel: CancellationToken,
    ) -> LoopDriver<RecordingRenderer> {
        LoopDriver::new(config, Viewport::default(), renderer, cancel).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_end_to_end_without_early_exit() {
        let mut driver = driver(
            config(2, 1, 3, 0.0),
            RecordingRenderer::default(),
            CancellationToken::new(),
        );
        let summary = driver.run().await.unwrap();

        let rec = driver.renderer();
        let inner = rec.count(|e| matches!(e, ProgressEvent::InnerAdvanced { .. }));
        let outer = rec.count(|e| matches!(e, ProgressEvent::OuterAdvanced { .. }));
        assert_eq!(inner, 6);
        assert_eq!(outer, 2);
        assert_eq!(summary.outer_iterations_completed, 2);
        assert_eq!(summary.inner_steps_executed, 6);
        assert_eq!(summary.early_terminations, 0);
        assert!(!summary.cancelled);
        assert_eq!(driver.phase(), RunPhase::Done);

        let (first, _, _) = rec.frames.first().unwrap();
        let (last, last_phase, _) = rec.frames.last().unwrap();
        assert_eq!(*first, ProgressEvent::SplashShown);
        assert_eq!(*last, ProgressEvent::Completed);
        assert_eq!(*last_phase, RunPhase::Summary);
    }

    #[tokio::test(start_paused = true)]
    async fn test_events_follow_loop_order() {
        let mut driver = driver(
            config(2, 2, 2, 0.0),
            RecordingRenderer::default(),
            CancellationToken::new(),
        );
        driver.run().await.unwrap();

        let positions: Vec<(u32, u32, u32)> = driver
            .renderer()
            .frames
            .iter()
            .filter_map(|(e, _, _)| match e {
                ProgressEvent::InnerAdvanced {
                    outer,
                    middle,
                    inner,
                } => Some((*outer, *middle, *inner)),
                _ => None,
            })
            .collect();
        let mut sorted = positions.clone();
        sorted.sort_unstable();
        assert_eq!(positions, sorted);
        assert_eq!(positions.len(), 8);
    }

    #[tokio::test(start_paused = true)]
    async fn test_outer_count_reached_with_early_exits() {
        let mut driver = driver(
            config(5, 3, 20, 0.3),
            RecordingRenderer::default(),
            CancellationToken::new(),
        );
        let summary = driver.run().await.unwrap();

        assert_eq!(summary.outer_iterations_completed, 5);
        assert_eq!(summary.middle_iterations_completed, 15);
        assert!(summary.early_terminations > 0);
        assert!(summary.inner_steps_executed < summary.max_inner_steps);
        assert_eq!(driver.display().outer().completed(), 5);

        let early = driver
            .renderer()
            .count(|e| matches!(e, ProgressEvent::EarlyTermination { .. }));
        assert_eq!(early as u64, summary.early_terminations);
    }

    #[tokio::test(start_paused = true)]
    async fn test_inner_axis_resets_every_outer_iteration() {
        let mut driver = driver(
            config(4, 2, 3, 0.0),
            RecordingRenderer::default(),
            CancellationToken::new(),
        );
        driver.run().await.unwrap();

        let frames = &driver.renderer().frames;
        let starts: Vec<&ProgressSnapshot> = frames
            .iter()
            .filter(|(e, _, _)| matches!(e, ProgressEvent::OuterStarted { .. }))
            .map(|(_, _, p)| p)
            .collect();
        assert_eq!(starts.len(), 4);
        for progress in starts {
            assert_eq!(progress.inner.completed, 0);
            assert!(progress.inner.percent.abs() < f64::EPSILON);
            assert_eq!(progress.inner.total, 6);
        }

        // Every outer iteration ends with a full inner bar.
        for (_, _, progress) in frames
            .iter()
            .filter(|(e, _, _)| matches!(e, ProgressEvent::OuterAdvanced { .. }))
        {
            assert_eq!(progress.inner.completed, progress.inner.total);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_mid_run() {
        let cancel = CancellationToken::new();
        let renderer = RecordingRenderer {
            cancel_on: Some((ProgressEvent::OuterStarted { outer: 1 }, cancel.clone())),
            ..RecordingRenderer::default()
        };
        let mut driver = driver(config(10, 1, 3, 0.0), renderer, cancel);
        let summary = driver.run().await.unwrap();

        assert!(summary.cancelled);
        assert_eq!(summary.outer_iterations_completed, 1);
        assert!(summary.outer_iterations_completed < 10);
        assert_eq!(summary.inner_steps_executed, 3);
        assert_eq!(driver.phase(), RunPhase::Cancelled);

        let frames = &driver.renderer().frames;
        let signal_at = frames
            .iter()
            .position(|(e, _, _)| *e == ProgressEvent::OuterStarted { outer: 1 })
            .unwrap();
        let after = &frames[signal_at + 1..];
        assert_eq!(after.len(), 1);
        assert_eq!(after[0].0, ProgressEvent::Cancelled);
        assert_eq!(after[0].1, RunPhase::Cancelled);
        // Progress is frozen where the signal was observed.
        assert_eq!(after[0].2, frames[signal_at].2);

        let last = driver.log().snapshot().last().unwrap();
        assert_eq!(last.text, "Operation cancelled by user");
        assert_eq!(last.level, LogLevel::Warning);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_while_sleeping() {
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(25)).await;
            token.cancel();
        });

        let mut driver = driver(config(1, 1, 20, 0.0), RecordingRenderer::default(), cancel);
        let summary = driver.run().await.unwrap();

        assert!(summary.cancelled);
        assert!(summary.inner_steps_executed > 0);
        assert!(summary.inner_steps_executed < 20);
        assert_eq!(driver.phase(), RunPhase::Cancelled);

        let rec = driver.renderer();
        assert_eq!(rec.count(|e| *e == ProgressEvent::Cancelled), 1);
        let (last, last_phase, _) = rec.frames.last().unwrap();
        assert_eq!(*last, ProgressEvent::Cancelled);
        assert_eq!(*last_phase, RunPhase::Cancelled);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_during_splash() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let mut driver = driver(config(3, 1, 1, 0.0), RecordingRenderer::default(), cancel);
        let summary = driver.run().await.unwrap();

        assert!(summary.cancelled);
        assert_eq!(summary.outer_iterations_completed, 0);
        assert_eq!(summary.total_elapsed, Duration::ZERO);
        let events: Vec<ProgressEvent> =
            driver.renderer().frames.iter().map(|(e, _, _)| *e).collect();
        assert_eq!(
            events,
            vec![ProgressEvent::SplashShown, ProgressEvent::Cancelled]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_twice_is_an_error() {
        let mut driver = driver(
            config(1, 1, 1, 0.0),
            RecordingRenderer::default(),
            CancellationToken::new(),
        );
        driver.run().await.unwrap();
        assert!(driver.run().await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_same_seed_same_run() {
        let run = |seed| async move {
            let config = config(3, 2, 10, 0.2).with_seed(Some(seed));
            let mut driver = driver(config, RecordingRenderer::default(), CancellationToken::new());
            driver.run().await.unwrap();
            driver
                .renderer()
                .frames
                .iter()
                .map(|(e, _, _)| *e)
                .collect::<Vec<_>>()
        };
        assert_eq!(run(11).await, run(11).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_log_messages_describe_run() {
        let mut driver = driver(
            config(1, 1, 6, 0.0),
            RecordingRenderer::default(),
            CancellationToken::new(),
        );
        driver.run().await.unwrap();

        let messages: Vec<String> = driver
            .log()
            .recent_messages(usize::MAX)
            .into_iter()
            .map(|m| m.text)
            .collect();
        assert!(messages[0].starts_with("Beginning main task execution with 1 iterations"));
        assert!(messages.iter().any(|m| m.contains("Processing batch 2")));
        assert!(messages.iter().any(|m| m.starts_with("Milestone reached: 100%")));
        assert!(
            messages
                .iter()
                .any(|m| m == "All outer iterations completed successfully!")
        );
    }

    #[test]
    fn test_early_exit_rate_matches_probability() {
        let mut rng = StdRng::seed_from_u64(42);
        let trials = 100_000;
        let hits = (0..trials)
            .filter(|_| roll_early_exit(&mut rng, 0.03))
            .count();
        let rate = hits as f64 / f64::from(trials);
        assert!((rate - 0.03).abs() < 0.003, "rate {rate}");
    }

    #[test]
    fn test_jitter_within_bounds() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..1000 {
            let f = jitter_factor(&mut rng, (0.5, 1.5));
            assert!((0.5..=1.5).contains(&f));
        }
        assert!((jitter_factor(&mut rng, (1.0, 1.0)) - 1.0).abs() < f64::EPSILON);
    }
}

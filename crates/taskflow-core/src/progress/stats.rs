//! Completion and timing state for one progress axis.

use std::time::Duration;

use tokio::time::Instant;

use crate::config::ConfigError;

/// Tracks `completed / total` and wall-clock time for one axis.
///
/// Invariant: `completed <= total` and `total >= 1`.
#[derive(Debug, Clone)]
pub struct StatsTracker {
    label: String,
    total: u64,
    completed: u64,
    start_time: Option<Instant>,
    finished: bool,
}

impl StatsTracker {
    /// Creates an unstarted tracker.
    ///
    /// # Errors
    /// Returns `ConfigError::ZeroTotal` if `total` is 0.
    pub fn new(label: impl Into<String>, total: u64) -> Result<Self, ConfigError> {
        let label = label.into();
        if total == 0 {
            return Err(ConfigError::ZeroTotal { label });
        }
        Ok(Self {
            label,
            total,
            completed: 0,
            start_time: None,
            finished: false,
        })
    }

    /// Records the start time. Later calls have no effect.
    pub fn start(&mut self) {
        if self.start_time.is_none() {
            self.start_time = Some(Instant::now());
        }
    }

    /// Adds `n` to `completed`, clamped to `total`.
    ///
    /// Starts the clock if it is not running yet. Once finished, further
    /// advances are ignored.
    pub fn advance(&mut self, n: u64) {
        if self.finished {
            return;
        }
        self.start();
        self.completed = self.completed.saturating_add(n).min(self.total);
        self.finished = self.completed == self.total;
    }

    /// Begins a new span with a fresh total.
    ///
    /// # Errors
    /// Returns `ConfigError::ZeroTotal` if `new_total` is 0; the tracker is
    /// left unchanged in that case.
    pub fn reset(&mut self, new_total: u64) -> Result<(), ConfigError> {
        if new_total == 0 {
            return Err(ConfigError::ZeroTotal {
                label: self.label.clone(),
            });
        }
        self.total = new_total;
        self.completed = 0;
        self.start_time = None;
        self.finished = false;
        Ok(())
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn completed(&self) -> u64 {
        self.completed
    }

    pub fn remaining(&self) -> u64 {
        self.total - self.completed
    }

    pub fn is_started(&self) -> bool {
        self.start_time.is_some()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Fraction complete in `[0, 1]`.
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.completed as f64 / self.total as f64
    }

    /// Time since `start()`, or zero if not started.
    pub fn elapsed(&self) -> Duration {
        self.start_time
            .map_or(Duration::ZERO, |start| start.elapsed())
    }

    /// Observed completion rate in units per second.
    ///
    /// Returns 0 when nothing has completed or no time has passed.
    pub fn rate(&self) -> f64 {
        let secs = self.elapsed().as_secs_f64();
        if secs <= 0.0 {
            return 0.0;
        }
        self.completed as f64 / secs
    }

    /// Estimated time to finish at `rate` units per second.
    ///
    /// `None` means unknown: the tracker has not started or `rate <= 0`.
    pub fn eta(&self, rate: f64) -> Option<Duration> {
        if !self.is_started() || rate.is_nan() || rate <= 0.0 {
            return None;
        }
        Duration::try_from_secs_f64(self.remaining() as f64 / rate).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_total_rejected() {
        assert!(matches!(
            StatsTracker::new("outer", 0),
            Err(ConfigError::ZeroTotal { .. })
        ));
        let mut tracker = StatsTracker::new("inner", 3).unwrap();
        assert!(tracker.reset(0).is_err());
        assert_eq!(tracker.total(), 3);
    }

    #[test]
    fn test_advance_clamps_and_finishes() {
        let mut tracker = StatsTracker::new("inner", 5).unwrap();
        tracker.advance(3);
        assert_eq!(tracker.completed(), 3);
        assert!(!tracker.is_finished());

        tracker.advance(10);
        assert_eq!(tracker.completed(), 5);
        assert!(tracker.is_finished());

        tracker.advance(1);
        assert_eq!(tracker.completed(), 5);
    }

    #[test]
    fn test_percent() {
        let mut tracker = StatsTracker::new("outer", 4).unwrap();
        assert!(tracker.percent().abs() < f64::EPSILON);
        tracker.advance(1);
        assert!((tracker.percent() - 0.25).abs() < f64::EPSILON);
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_is_idempotent() {
        let mut tracker = StatsTracker::new("outer", 4).unwrap();
        assert_eq!(tracker.elapsed(), Duration::ZERO);

        tracker.start();
        tokio::time::advance(Duration::from_secs(2)).await;
        tracker.start();
        assert_eq!(tracker.elapsed(), Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_clears_progress_and_clock() {
        let mut tracker = StatsTracker::new("inner", 2).unwrap();
        tracker.advance(2);
        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(tracker.is_finished());

        tracker.reset(6).unwrap();
        assert_eq!(tracker.completed(), 0);
        assert_eq!(tracker.total(), 6);
        assert!(!tracker.is_started());
        assert!(!tracker.is_finished());
        assert_eq!(tracker.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_and_eta() {
        let mut tracker = StatsTracker::new("outer", 10).unwrap();
        assert_eq!(tracker.eta(1.0), None);

        tracker.start();
        tokio::time::advance(Duration::from_secs(2)).await;
        tracker.advance(4);

        assert!((tracker.rate() - 2.0).abs() < 1e-9);
        assert_eq!(tracker.eta(tracker.rate()), Some(Duration::from_secs(3)));
        assert_eq!(tracker.eta(0.0), None);
        assert_eq!(tracker.eta(-1.0), None);
    }
}

//! Two independently timed progress axes.
//!
//! The outer axis spans the whole run with a fixed total. The inner axis
//! covers one outer iteration and is reset at the start of every iteration,
//! because its total depends on the middle/inner counts of that iteration.

use std::time::Duration;

use super::stats::StatsTracker;
use crate::config::ConfigError;

pub const OUTER_LABEL: &str = "Outer Loop Progress";
pub const INNER_LABEL: &str = "Inner Loop Progress";

/// Render-ready view of one axis.
#[derive(Debug, Clone, PartialEq)]
pub struct AxisSnapshot {
    pub label: String,
    pub completed: u64,
    pub total: u64,
    /// Fraction complete in `[0, 1]`.
    pub percent: f64,
    pub elapsed: Duration,
    pub rate: f64,
    /// `None` while unknown (not started or no measurable rate yet).
    pub eta: Option<Duration>,
}

impl AxisSnapshot {
    fn of(tracker: &StatsTracker) -> Self {
        let rate = tracker.rate();
        Self {
            label: tracker.label().to_string(),
            completed: tracker.completed(),
            total: tracker.total(),
            percent: tracker.percent(),
            elapsed: tracker.elapsed(),
            rate,
            eta: tracker.eta(rate),
        }
    }
}

/// Both axes at one instant.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressSnapshot {
    pub outer: AxisSnapshot,
    pub inner: AxisSnapshot,
}

#[derive(Debug)]
pub struct DualProgressDisplay {
    outer: StatsTracker,
    inner: StatsTracker,
}

impl DualProgressDisplay {
    /// # Errors
    /// Returns `ConfigError::ZeroTotal` if either total is 0.
    pub fn new(outer_total: u64, inner_total: u64) -> Result<Self, ConfigError> {
        Ok(Self {
            outer: StatsTracker::new(OUTER_LABEL, outer_total)?,
            inner: StatsTracker::new(INNER_LABEL, inner_total)?,
        })
    }

    /// Starts the outer clock on first use and opens a fresh inner span.
    ///
    /// # Errors
    /// Returns `ConfigError::ZeroTotal` if `inner_total` is 0.
    pub fn begin_outer_iteration(&mut self, inner_total: u64) -> Result<(), ConfigError> {
        self.outer.start();
        self.inner.reset(inner_total)?;
        self.inner.start();
        Ok(())
    }

    pub fn advance_outer(&mut self) {
        self.outer.advance(1);
    }

    pub fn advance_inner(&mut self, n: u64) {
        self.inner.advance(n);
    }

    pub fn outer(&self) -> &StatsTracker {
        &self.outer
    }

    pub fn inner(&self) -> &StatsTracker {
        &self.inner
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            outer: AxisSnapshot::of(&self.outer),
            inner: AxisSnapshot::of(&self.inner),
        }
    }
}

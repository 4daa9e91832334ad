//! End-of-run statistics.

use std::fmt;
use std::time::Duration;

use crate::log::format_hms;

/// Immutable record of a finished (or cancelled) run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub total_elapsed: Duration,
    pub outer_iterations_completed: u64,
    pub middle_iterations_completed: u64,
    pub inner_steps_executed: u64,
    pub early_terminations: u64,
    /// `outer × middle × inner`: the step count with no early exits.
    pub max_inner_steps: u64,
    pub cancelled: bool,
}

impl RunSummary {
    /// Executed inner steps as a percentage of the maximum possible.
    pub fn efficiency_percent(&self) -> f64 {
        if self.max_inner_steps == 0 {
            return 0.0;
        }
        self.inner_steps_executed as f64 / self.max_inner_steps as f64 * 100.0
    }

    /// Average inner steps per second, `None` if no time elapsed.
    pub fn steps_per_second(&self) -> Option<f64> {
        let secs = self.total_elapsed.as_secs_f64();
        (secs > 0.0).then(|| self.inner_steps_executed as f64 / secs)
    }

    /// `(metric, value)` rows in display order.
    pub fn rows(&self) -> Vec<(&'static str, String)> {
        let mut rows = vec![
            ("Total Execution Time", format_hms(self.total_elapsed)),
            (
                "Outer Iterations Completed",
                self.outer_iterations_completed.to_string(),
            ),
            (
                "Middle Iterations Completed",
                self.middle_iterations_completed.to_string(),
            ),
            (
                "Inner Iterations Completed",
                self.inner_steps_executed.to_string(),
            ),
            ("Early Terminations", self.early_terminations.to_string()),
            (
                "Iteration Efficiency",
                format!("{:.1}%", self.efficiency_percent()),
            ),
        ];
        if let Some(rate) = self.steps_per_second() {
            rows.push(("Avg Iterations/Second", format!("{rate:.2}")));
        }
        if self.cancelled {
            rows.push(("Status", "Cancelled".to_string()));
        }
        rows
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (metric, value) in self.rows() {
            writeln!(f, "{metric:<30} {value:>12}")?;
        }
        Ok(())
    }
}

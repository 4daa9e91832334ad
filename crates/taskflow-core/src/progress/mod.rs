//! Progress tracking: per-axis stats and the dual outer/inner display.

pub mod display;
pub mod stats;

pub use display::{AxisSnapshot, DualProgressDisplay, ProgressSnapshot};
pub use stats::StatsTracker;

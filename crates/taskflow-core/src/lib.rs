//! Core taskflow library (config, progress tracking, message log, driver).

pub mod config;
pub mod core;
pub mod log;
pub mod logging;
pub mod progress;

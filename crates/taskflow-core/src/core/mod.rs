//! Core module: the run state machine and its surroundings.
//!
//! - `driver`: nested-loop state machine
//! - `events`: progress events and the renderer trait
//! - `interrupt`: Ctrl+C / terminate signal handling
//! - `summary`: end-of-run statistics
//! - `viewport`: frame geometry shared with renderers

pub mod driver;
pub mod events;
pub mod interrupt;
pub mod summary;
pub mod viewport;

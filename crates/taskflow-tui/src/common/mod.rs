//! Helpers shared across rendering paths.

pub mod text;

pub use text::{format_eta, truncate_with_ellipsis};

//! Scrolling message log.

pub mod message_log;
pub mod wrap;

pub use message_log::{LogLevel, LogLine, LogMessage, MessageLog, format_hms};
pub use wrap::wrap_text;

//! Text utilities for TUI rendering.

use std::time::Duration;

use taskflow_core::log::format_hms;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Truncates a string with an ellipsis if it exceeds `max_width` columns.
pub fn truncate_with_ellipsis(text: &str, max_width: usize) -> String {
    if text.width() <= max_width {
        return text.to_string();
    }
    if max_width <= 1 {
        return "…".to_string();
    }
    let mut truncated = String::new();
    let mut used = 0;
    for ch in text.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w + 1 > max_width {
            break;
        }
        used += w;
        truncated.push(ch);
    }
    truncated.push('…');
    truncated
}

/// `HH:MM:SS`, or `--:--:--` while the ETA is unknown.
pub fn format_eta(eta: Option<Duration>) -> String {
    eta.map_or_else(|| "--:--:--".to_string(), format_hms)
}

//! Bounded, order-preserving log of wrapped display lines.

use std::collections::VecDeque;
use std::collections::vec_deque;
use std::fmt;
use std::time::Duration;

use tokio::time::Instant;

use super::wrap::wrap_text;

/// Narrowest wrap width accepted; fits any single double-width character.
pub const MIN_WRAP_WIDTH: usize = 2;

/// Severity/category of a log entry, shown in its own column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogLevel {
    Info,
    Start,
    Progress,
    Complete,
    Warning,
    Summary,
}

impl LogLevel {
    pub fn label(self) -> &'static str {
        match self {
            LogLevel::Info => "INFO",
            LogLevel::Start => "START",
            LogLevel::Progress => "PROGRESS",
            LogLevel::Complete => "COMPLETE",
            LogLevel::Warning => "WARNING",
            LogLevel::Summary => "SUMMARY",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One stored (already wrapped) line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    /// Time since the log was created.
    pub elapsed: Duration,
    pub level: LogLevel,
    pub text: String,
    /// True for the second and later segments of a wrapped message.
    pub continuation: bool,
}

/// A whole message, re-joined from its stored lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogMessage {
    pub elapsed: Duration,
    pub level: LogLevel,
    pub text: String,
}

/// Fixed-capacity FIFO of wrapped lines.
///
/// Invariants: `len() <= capacity()` and every line is at most `width()`
/// columns wide. The oldest lines go first when capacity is exceeded.
#[derive(Debug)]
pub struct MessageLog {
    lines: VecDeque<LogLine>,
    capacity: usize,
    width: usize,
    created: Instant,
    appended: u64,
}

impl MessageLog {
    /// Creates an empty log. `capacity` is raised to 1 and `width` to
    /// [`MIN_WRAP_WIDTH`] if smaller.
    pub fn new(capacity: usize, width: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            lines: VecDeque::with_capacity(capacity),
            capacity,
            width: width.max(MIN_WRAP_WIDTH),
            created: Instant::now(),
            appended: 0,
        }
    }

    /// Appends an `Info` message.
    pub fn append(&mut self, text: &str) -> usize {
        self.push(LogLevel::Info, text)
    }

    /// Wraps `text` and appends each segment as a line, evicting the oldest
    /// lines past capacity. Returns the number of segments produced.
    pub fn push(&mut self, level: LogLevel, text: &str) -> usize {
        let elapsed = self.created.elapsed();
        let sanitized = sanitize(text);
        let segments = wrap_text(&sanitized, self.width);
        let count = segments.len();

        for (i, text) in segments.into_iter().enumerate() {
            self.lines.push_back(LogLine {
                elapsed,
                level,
                text,
                continuation: i > 0,
            });
        }
        self.appended += count as u64;

        while self.lines.len() > self.capacity {
            self.lines.pop_front();
        }
        count
    }

    /// Stored lines, oldest first.
    pub fn snapshot(&self) -> vec_deque::Iter<'_, LogLine> {
        self.lines.iter()
    }

    /// The most recent `n` lines (or all of them), oldest first.
    pub fn tail(&self, n: usize) -> vec_deque::Iter<'_, LogLine> {
        self.lines.range(self.lines.len().saturating_sub(n)..)
    }

    /// The most recent `n` messages, re-joined from wrapped lines.
    ///
    /// A message whose head was evicted is returned from its first
    /// surviving line.
    pub fn recent_messages(&self, n: usize) -> Vec<LogMessage> {
        let mut messages: Vec<LogMessage> = Vec::new();
        let mut pending: Vec<&LogLine> = Vec::new();

        for line in self.lines.iter().rev() {
            if messages.len() == n {
                break;
            }
            pending.push(line);
            if !line.continuation {
                let text = pending
                    .iter()
                    .rev()
                    .map(|l| l.text.as_str())
                    .collect::<Vec<_>>()
                    .join(" ");
                messages.push(LogMessage {
                    elapsed: line.elapsed,
                    level: line.level,
                    text,
                });
                pending.clear();
            }
        }

        if messages.len() < n
            && let Some(first) = pending.last()
        {
            let text = pending
                .iter()
                .rev()
                .map(|l| l.text.as_str())
                .collect::<Vec<_>>()
                .join(" ");
            messages.push(LogMessage {
                elapsed: first.elapsed,
                level: first.level,
                text,
            });
        }

        messages.reverse();
        messages
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Lines ever stored, including evicted ones.
    pub fn total_appended(&self) -> u64 {
        self.appended
    }
}

/// Removes control characters other than newline and tab, so stored text
/// cannot carry terminal sequences.
fn sanitize(text: &str) -> std::borrow::Cow<'_, str> {
    let strip = |c: char| c.is_control() && c != '\n' && c != '\t';
    if text.contains(strip) {
        std::borrow::Cow::Owned(text.chars().filter(|&c| !strip(c)).collect())
    } else {
        std::borrow::Cow::Borrowed(text)
    }
}

/// Formats a duration as `HH:MM:SS`.
pub fn format_hms(duration: Duration) -> String {
    let total = duration.as_secs();
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

#[cfg(test)]
mod tests {
    use unicode_width::UnicodeWidthStr;

    use super::*;

    fn texts(log: &MessageLog) -> Vec<String> {
        log.snapshot().map(|l| l.text.clone()).collect()
    }

    #[test]
    fn test_append_preserves_order() {
        let mut log = MessageLog::new(10, 40);
        log.append("first");
        log.push(LogLevel::Warning, "second");
        assert_eq!(texts(&log), vec!["first", "second"]);
        assert_eq!(log.snapshot().nth(1).unwrap().level, LogLevel::Warning);
    }

    #[test]
    fn test_capacity_evicts_oldest_first() {
        let capacity = 5;
        let extra = 3;
        let mut log = MessageLog::new(capacity, 40);
        for i in 0..capacity + extra {
            log.append(&format!("line {i}"));
            assert!(log.len() <= capacity);
        }

        let kept = texts(&log);
        assert_eq!(kept.len(), capacity);
        for i in 0..extra {
            assert!(!kept.contains(&format!("line {i}")));
        }
        assert_eq!(kept.first().unwrap(), "line 3");
        assert_eq!(kept.last().unwrap(), "line 7");
        assert_eq!(log.total_appended(), 8);
    }

    #[test]
    fn test_long_message_wraps_into_lines() {
        let mut log = MessageLog::new(10, 10);
        let count = log.push(LogLevel::Progress, "alpha beta gamma delta");
        assert_eq!(count, 3);
        assert_eq!(texts(&log), vec!["alpha beta", "gamma", "delta"]);

        let flags: Vec<bool> = log.snapshot().map(|l| l.continuation).collect();
        assert_eq!(flags, vec![false, true, true]);
        assert!(log.snapshot().all(|l| l.text.width() <= log.width()));
    }

    #[test]
    fn test_wrapped_message_can_be_partially_evicted() {
        let mut log = MessageLog::new(2, 10);
        log.append("alpha beta gamma delta");
        assert_eq!(texts(&log), vec!["gamma", "delta"]);
    }

    #[test]
    fn test_tail() {
        let mut log = MessageLog::new(10, 20);
        for i in 0..4 {
            log.append(&format!("m{i}"));
        }
        let tail: Vec<&str> = log.tail(2).map(|l| l.text.as_str()).collect();
        assert_eq!(tail, vec!["m2", "m3"]);
        assert_eq!(log.tail(100).count(), 4);
    }

    #[test]
    fn test_recent_messages_rejoins_wrapped_lines() {
        let mut log = MessageLog::new(20, 10);
        log.append("one");
        log.push(LogLevel::Complete, "alpha beta gamma");
        log.append("two");

        let recent = log.recent_messages(2);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].text, "alpha beta gamma");
        assert_eq!(recent[0].level, LogLevel::Complete);
        assert_eq!(recent[1].text, "two");

        assert_eq!(log.recent_messages(10).len(), 3);
    }

    #[test]
    fn test_escape_characters_stripped() {
        let mut log = MessageLog::new(5, 40);
        log.append("\x1b[31mred");
        assert_eq!(texts(&log), vec!["[31mred"]);
    }

    #[test]
    fn test_control_characters_stripped() {
        let mut log = MessageLog::new(5, 2);
        log.append("a\u{7}\u{7}\u{7}b\r\u{7f}");
        assert_eq!(texts(&log), vec!["ab"]);
        log.append("x\ty");
        assert_eq!(log.snapshot().last().unwrap().text, "y");
        assert!(log.snapshot().all(|l| l.text.width() <= log.width()));
    }

    #[test]
    fn test_minimums_applied() {
        let log = MessageLog::new(0, 0);
        assert_eq!(log.capacity(), 1);
        assert_eq!(log.width(), MIN_WRAP_WIDTH);
    }

    #[test]
    fn test_format_hms() {
        assert_eq!(format_hms(Duration::from_secs(0)), "00:00:00");
        assert_eq!(format_hms(Duration::from_secs(3725)), "01:02:05");
    }
}

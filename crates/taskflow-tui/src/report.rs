//! Plain-text report printed after the run.

use std::io::Write;

use anyhow::{Context, Result};
use comfy_table::{CellAlignment, ContentArrangement, Table};
use taskflow_core::core::summary::RunSummary;
use taskflow_core::log::{LogMessage, MessageLog, format_hms};

/// Messages shown under "Recent Log Messages".
pub const RECENT_MESSAGE_COUNT: usize = 10;

/// Final summary plus the tail of the message log.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub summary: RunSummary,
    pub recent: Vec<LogMessage>,
}

impl RunReport {
    pub fn from_log(summary: RunSummary, log: &MessageLog) -> Self {
        Self {
            summary,
            recent: log.recent_messages(RECENT_MESSAGE_COUNT),
        }
    }

    pub fn summary_table(&self, max_width: u16) -> Table {
        let mut table = Table::new();
        table.set_width(max_width);
        table.set_content_arrangement(ContentArrangement::Dynamic);
        table.set_header(vec!["Metric", "Value"]);
        for (metric, value) in self.summary.rows() {
            table.add_row(vec![metric.to_string(), value]);
        }
        if let Some(column) = table.column_mut(1) {
            column.set_cell_alignment(CellAlignment::Right);
        }
        table
    }

    pub fn render(&self, max_width: u16) -> String {
        let mut out = String::from("Execution Summary\n");
        out.push_str(&self.summary_table(max_width).to_string());
        out.push_str("\n\nRecent Log Messages\n");
        for message in &self.recent {
            out.push_str(&format!(
                "  {} [{}] {}\n",
                format_hms(message.elapsed),
                message.level,
                message.text
            ));
        }
        out
    }

    /// Writes the report to stdout.
    ///
    /// # Errors
    /// Returns an error if stdout cannot be written.
    pub fn print(&self, max_width: u16) -> Result<()> {
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout)?;
        write!(stdout, "{}", self.render(max_width)).context("write report")?;
        writeln!(stdout)?;
        stdout.flush().context("flush report")
    }
}

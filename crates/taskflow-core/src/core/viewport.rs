//! Screen geometry shared by the driver (log sizing) and the renderer.
//!
//! Frame layout, top to bottom: header, progress panel, log panel, footer.
//! The log panel takes whatever rows remain.

pub const MIN_WIDTH: u16 = 80;
pub const MIN_HEIGHT: u16 = 24;

pub const HEADER_ROWS: u16 = 3;
/// Borders plus two axes of (gauge, details) separated by a spacer row.
pub const PROGRESS_ROWS: u16 = 7;
pub const FOOTER_ROWS: u16 = 3;
pub const LOG_BORDER_ROWS: u16 = 2;

/// `HH:MM:SS`
pub const TIME_COLUMN_WIDTH: u16 = 8;
/// Widest level label (`PROGRESS`).
pub const LEVEL_COLUMN_WIDTH: u16 = 8;
/// Left/right border plus one column of padding on each side.
pub const LOG_PANEL_CHROME: u16 = 4;
/// Columns the log panel spends before message text starts.
pub const LOG_PREFIX_COLUMNS: u16 = TIME_COLUMN_WIDTH + 1 + LEVEL_COLUMN_WIDTH + 1;

/// Terminal size in cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u16,
    pub height: u16,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: MIN_WIDTH,
            height: MIN_HEIGHT,
        }
    }
}

impl Viewport {
    pub fn new(width: u16, height: u16) -> Self {
        Self { width, height }
    }

    pub fn is_below_minimum(&self) -> bool {
        self.width < MIN_WIDTH || self.height < MIN_HEIGHT
    }

    /// Columns available to message text in the log panel.
    pub fn log_wrap_width(&self) -> usize {
        self.width
            .saturating_sub(LOG_PANEL_CHROME + LOG_PREFIX_COLUMNS)
            .max(1) as usize
    }

    /// Visible rows inside the log panel.
    pub fn log_rows(&self) -> usize {
        self.height
            .saturating_sub(HEADER_ROWS + PROGRESS_ROWS + FOOTER_ROWS + LOG_BORDER_ROWS)
            .max(1) as usize
    }
}

//! Main frame: header, progress panel, log panel, footer.

use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Gauge, Paragraph};
use taskflow_core::core::events::{FrameSnapshot, RunPhase};
use taskflow_core::core::viewport::{
    FOOTER_ROWS, HEADER_ROWS, LEVEL_COLUMN_WIDTH, LOG_BORDER_ROWS, PROGRESS_ROWS,
    TIME_COLUMN_WIDTH,
};
use taskflow_core::log::{LogLevel, LogLine, format_hms};
use taskflow_core::progress::AxisSnapshot;
use unicode_width::UnicodeWidthStr;

use crate::common::{format_eta, truncate_with_ellipsis};
use crate::splash::AppInfo;

const BORDER: Color = Color::Blue;

pub fn level_color(level: LogLevel) -> Color {
    match level {
        LogLevel::Info => Color::White,
        LogLevel::Start => Color::Cyan,
        LogLevel::Progress => Color::Blue,
        LogLevel::Complete => Color::Green,
        LogLevel::Warning => Color::Yellow,
        LogLevel::Summary => Color::Magenta,
    }
}

fn panel(title: &str) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(BORDER))
        .title(title)
}

/// Renders one running/summary frame.
pub fn render(frame: &mut Frame<'_>, app: &AppInfo, snapshot: &FrameSnapshot<'_>) {
    let [header, progress, log, footer] = Layout::vertical([
        Constraint::Length(HEADER_ROWS),
        Constraint::Length(PROGRESS_ROWS),
        Constraint::Min(LOG_BORDER_ROWS + 1),
        Constraint::Length(FOOTER_ROWS),
    ])
    .areas(frame.area());

    render_header(frame, header, app);
    render_progress(frame, progress, snapshot);
    render_log(frame, log, snapshot);
    render_footer(frame, footer, snapshot);
}

fn render_header(frame: &mut Frame<'_>, area: Rect, app: &AppInfo) {
    let title = Line::from(vec![
        Span::styled(
            format!(" {} ", app.name),
            Style::default()
                .fg(Color::White)
                .bg(Color::Blue)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!(" v{} ", app.version),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(" | ", Style::default().add_modifier(Modifier::DIM)),
        Span::styled(app.tagline, Style::default().add_modifier(Modifier::ITALIC)),
    ]);
    frame.render_widget(Paragraph::new(title).block(panel("")), area);
}

fn render_progress(frame: &mut Frame<'_>, area: Rect, snapshot: &FrameSnapshot<'_>) {
    let block = panel(" Progress ");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let [outer_gauge, outer_details, _, inner_gauge, inner_details] =
        Layout::vertical([Constraint::Length(1); 5]).areas(inner);

    render_axis(
        frame,
        outer_gauge,
        outer_details,
        &snapshot.progress.outer,
        Color::Green,
    );
    render_axis(
        frame,
        inner_gauge,
        inner_details,
        &snapshot.progress.inner,
        Color::Cyan,
    );
}

fn render_axis(
    frame: &mut Frame<'_>,
    gauge_area: Rect,
    details_area: Rect,
    axis: &AxisSnapshot,
    color: Color,
) {
    let gauge = Gauge::default()
        .gauge_style(Style::default().fg(color).bg(Color::Black))
        .ratio(axis.percent.clamp(0.0, 1.0))
        .label(format!(
            "{}  {:.1}%  {}/{}",
            axis.label,
            axis.percent * 100.0,
            axis.completed,
            axis.total
        ));
    frame.render_widget(gauge, gauge_area);

    let details = format!(
        "Elapsed: {} | ETA: {} | Rate: {:.2}/s",
        format_hms(axis.elapsed),
        format_eta(axis.eta),
        axis.rate
    );
    frame.render_widget(
        Paragraph::new(details).style(Style::default().add_modifier(Modifier::DIM)),
        details_area,
    );
}

fn render_log(frame: &mut Frame<'_>, area: Rect, snapshot: &FrameSnapshot<'_>) {
    let block = panel(" Messages ");
    let inner = block.inner(area).inner(ratatui::layout::Margin::new(1, 0));
    frame.render_widget(block, area);

    let rows = usize::from(inner.height);
    let text_width = usize::from(inner.width)
        .saturating_sub(usize::from(TIME_COLUMN_WIDTH + LEVEL_COLUMN_WIDTH + 2));

    let mut lines: Vec<Line<'_>> = snapshot
        .log
        .tail(rows)
        .map(|line| log_line(line, text_width))
        .collect();
    // Pad to fill so stale rows never show through.
    lines.resize_with(rows, Line::default);

    frame.render_widget(Paragraph::new(lines), inner);
}

fn log_line(line: &LogLine, text_width: usize) -> Line<'static> {
    let time_width = usize::from(TIME_COLUMN_WIDTH);
    let level_width = usize::from(LEVEL_COLUMN_WIDTH);
    let (time, level) = if line.continuation {
        (" ".repeat(time_width), " ".repeat(level_width))
    } else {
        (
            format_hms(line.elapsed),
            format!("{:<level_width$}", line.level.label()),
        )
    };
    let text = truncate_with_ellipsis(&line.text, text_width);
    let pad = text_width.saturating_sub(text.width());

    Line::from(vec![
        Span::styled(time, Style::default().add_modifier(Modifier::DIM)),
        Span::raw(" "),
        Span::styled(
            level,
            Style::default()
                .fg(level_color(line.level))
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" "),
        Span::raw(text),
        Span::raw(" ".repeat(pad)),
    ])
}

fn render_footer(frame: &mut Frame<'_>, area: Rect, snapshot: &FrameSnapshot<'_>) {
    let status = snapshot.phase.status_label();
    let status_color = if snapshot.phase == RunPhase::Running {
        Color::Green
    } else {
        Color::Yellow
    };
    let dim = Style::default().add_modifier(Modifier::DIM);
    let outer = &snapshot.progress.outer;

    let mut spans = vec![
        Span::styled("Status: ", Style::default().add_modifier(Modifier::BOLD)),
        Span::styled(
            status,
            Style::default()
                .fg(status_color)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(" | ", dim),
        Span::styled(
            format!("Outer: {}/{}", outer.completed, outer.total),
            Style::default().fg(Color::Cyan),
        ),
        Span::styled(" | ", dim),
        Span::styled(
            format!("Early Exits: {}", snapshot.early_terminations),
            Style::default().fg(Color::Yellow),
        ),
    ];
    if !snapshot.phase.is_terminal() {
        spans.push(Span::styled(" | ", dim));
        spans.push(Span::styled(
            "Press Ctrl+C to cancel",
            dim.add_modifier(Modifier::ITALIC),
        ));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)).block(panel("")), area);
}

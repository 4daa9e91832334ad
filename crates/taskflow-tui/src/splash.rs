//! Splash screen shown before the run starts.

use ratatui::Frame;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

const LOGO: [&str; 5] = [
    r"  _____         _    _____ _                 ",
    r" |_   _|_ _ ___| | _|  ___| | _____      __  ",
    r"   | |/ _` / __| |/ / |_  | |/ _ \ \ /\ / /  ",
    r"   | | (_| \__ \   <|  _| | | (_) \ V  V /   ",
    r"   |_|\__,_|___/_|\_\_|   |_|\___/ \_/\_/    ",
];

/// Name, version and tagline shown by the splash screen and the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppInfo {
    pub name: &'static str,
    pub version: &'static str,
    pub tagline: &'static str,
}

fn splash_lines(app: &AppInfo) -> Vec<Line<'static>> {
    let logo_style = Style::default()
        .fg(Color::Cyan)
        .add_modifier(Modifier::BOLD);
    let mut lines: Vec<Line<'static>> = LOGO
        .iter()
        .map(|row| Line::styled(*row, logo_style))
        .collect();
    lines.push(Line::default());
    lines.push(Line::styled(
        format!("Version {}", app.version),
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
    ));
    lines.push(Line::styled(
        app.tagline,
        Style::default().add_modifier(Modifier::ITALIC),
    ));
    lines.push(Line::default());
    lines.push(Line::styled(
        "Initializing...",
        Style::default().add_modifier(Modifier::DIM),
    ));
    lines
}

/// Centers a `width × height` rect inside `area`, clamped to it.
fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

pub fn render(frame: &mut Frame<'_>, app: &AppInfo) {
    let lines = splash_lines(app);
    let content_width = lines.iter().map(Line::width).max().unwrap_or(0);
    let width = u16::try_from(content_width).unwrap_or(u16::MAX).saturating_add(8);
    let height = u16::try_from(lines.len()).unwrap_or(u16::MAX).saturating_add(4);
    let area = centered(frame.area(), width, height);

    frame.render_widget(Clear, area);
    let panel = Paragraph::new(lines).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(format!(" {} ", app.name)),
    );
    frame.render_widget(panel, area);
}

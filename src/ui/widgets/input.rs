// src/ui/widgets/input.rs
use crate::app::{App, AppState};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph},
};

/// Renders the target URL input box. The cursor is shown only while typing.
pub fn render_input(frame: &mut Frame, app: &App, area: Rect) {
    let title = match app.state {
        AppState::Idle => "Target URL (e.g. https://example.com)",
        _ => "Target URL",
    };
    let style = match app.state {
        AppState::Idle => Style::default().fg(Color::Yellow),
        _ => Style::default().fg(Color::DarkGray),
    };
    let input_paragraph = Paragraph::new(app.input.as_str())
        .block(Block::default().borders(Borders::ALL).title(title))
        .style(style);
    frame.render_widget(input_paragraph, area);

    if app.state == AppState::Idle && !app.show_disclaimer {
        let cursor_x = area.x + app.input.chars().count() as u16 + 1;
        frame.set_cursor_position((cursor_x.min(area.right().saturating_sub(2)), area.y + 1));
    }
}

// src/ui/widgets/summary.rs

use super::analysis_view::severity_style;
use crate::app::{App, AppState};
use ratatui::{
    prelude::*,
    text::Line,
    widgets::{Block, Borders, Gauge, Paragraph},
};
use strum::IntoEnumIterator;
use webvuln_scanner::core::models::Severity;

/// Renders the summary widget: overall score, an animated gauge and the
/// number of findings per severity. Nothing is drawn until a scan finishes.
///
/// # Arguments
/// * `frame` - The `Frame` used for rendering the UI.
/// * `app` - The application state holding the computed `ScanSummary`.
/// * `area` - The `Rect` defining the drawable area for this widget.
pub fn render_summary(frame: &mut Frame, app: &App, area: Rect) {
    let summary_container = Block::default().borders(Borders::ALL).title("Summary");
    frame.render_widget(summary_container, area);

    let summary_chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3), // Score & Rating
            Constraint::Length(1), // Gauge
            Constraint::Length(1),
            Constraint::Length(7), // Issues per severity
            Constraint::Min(0),    // Target
        ])
        .split(area);

    if app.state != AppState::Finished {
        return;
    }

    // --- Score & Rating Section ---
    let (rating_text, rating_style) = match app.summary.score {
        90..=100 => ("Excellent", Style::default().fg(Color::Green)),
        75..=89 => ("Good", Style::default().fg(Color::Cyan)),
        50..=74 => ("Needs Improvement", Style::default().fg(Color::Yellow)),
        _ => ("Poor", Style::default().fg(Color::Red)),
    };
    let score_line = Line::from(format!("{}/100 ({})", app.summary.score, rating_text)).style(rating_style);
    let score_text = Text::from(vec![Line::from("Security Score".bold()), score_line]);
    frame.render_widget(Paragraph::new(score_text).alignment(Alignment::Center), summary_chunks[0]);

    let score_gauge = Gauge::default()
        .percent(app.displayed_score as u16)
        .label("")
        .style(Style::default().fg(if app.displayed_score >= 80 {
            Color::Green
        } else if app.displayed_score >= 50 {
            Color::Yellow
        } else {
            Color::Red
        }));
    frame.render_widget(score_gauge, summary_chunks[1]);

    // --- Issues Section ---
    let counts = app.summary.counts;
    let mut issue_lines: Vec<Line> = Severity::iter()
        .rev()
        .map(|severity| {
            Line::from(vec![
                Span::raw(format!("{:<10}", format!("{}:", capitalize(&severity.to_string())))),
                Span::styled(counts.count(severity).to_string(), severity_style(severity)),
            ])
        })
        .collect();
    issue_lines.push(Line::from(vec![
        Span::raw(format!("{:<10}", "Total:")),
        Span::styled(counts.total_issues.to_string(), Style::default().bold()),
    ]));
    let issues_block = Block::default().title("ISSUES FOUND".bold());
    frame.render_widget(Paragraph::new(issue_lines).block(issues_block), summary_chunks[3]);

    if let Some(report) = &app.scan_report {
        let target_text = Text::from(vec![
            Line::from("TARGET".bold()),
            Line::from(report.url.as_str()).fg(Color::Cyan),
            Line::from(report.timestamp.format("%Y-%m-%d %H:%M:%S UTC").to_string()).fg(Color::DarkGray),
        ]);
        frame.render_widget(Paragraph::new(target_text), summary_chunks[4]);
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

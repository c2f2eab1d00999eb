// src/ui/widgets/analysis_view.rs

use crate::app::{App, AppState, SPINNER_CHARS};
use ratatui::{
    prelude::*,
    text::Line,
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
};
use webvuln_scanner::core::models::{Finding, Severity};

pub fn severity_style(severity: Severity) -> Style {
    match severity {
        Severity::Critical => Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        Severity::High => Style::default().fg(Color::LightRed),
        Severity::Medium => Style::default().fg(Color::Yellow),
        Severity::Low => Style::default().fg(Color::Cyan),
        Severity::Info => Style::default().fg(Color::Gray),
    }
}

pub fn render_analysis_view(frame: &mut Frame, app: &mut App, area: Rect) {
    let main_block = Block::default()
        .borders(Borders::ALL)
        .title("Findings (Navigate with ↑ ↓)");

    match app.state {
        AppState::Idle => {
            let p = Paragraph::new("Scan results will appear here...").alignment(Alignment::Center);
            frame.render_widget(p.block(main_block), area);
            return;
        }
        AppState::Scanning => {
            let spinner_char = SPINNER_CHARS[app.spinner_frame];
            let p = Paragraph::new(Line::from(vec![
                Span::styled(format!("{} ", spinner_char), Style::default().fg(Color::Cyan)),
                Span::raw(format!("Scanning {}... Please wait.", app.input.trim())),
            ]))
            .alignment(Alignment::Center);
            frame.render_widget(p.block(main_block), area);
            return;
        }
        AppState::Failed => {
            let message = app
                .scan_error
                .as_ref()
                .map(|e| e.message.clone())
                .unwrap_or_else(|| "Unknown error".to_string());
            let text = Text::from(vec![
                Line::from(""),
                Line::from("SCAN FAILED".bold().fg(Color::Red)),
                Line::from(""),
                Line::from(message),
            ]);
            let p = Paragraph::new(text)
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: true });
            frame.render_widget(p.block(main_block), area);
            return;
        }
        AppState::Finished => {}
    }

    let inner_area = main_block.inner(area);
    frame.render_widget(main_block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(45), Constraint::Min(0)])
        .split(inner_area);

    let items: Vec<ListItem> = app
        .findings()
        .iter()
        .map(|f| {
            ListItem::new(Line::from(vec![
                Span::styled(
                    format!("{:<9}", f.severity.to_string().to_uppercase()),
                    severity_style(f.severity),
                ),
                Span::styled(format!("[{}] ", f.category), Style::default().fg(Color::DarkGray)),
                Span::raw(f.title.clone()),
            ]))
        })
        .collect();

    let findings_list = List::new(items)
        .highlight_style(Style::new().bg(Color::DarkGray).add_modifier(Modifier::BOLD));
    frame.render_stateful_widget(findings_list, chunks[0], &mut app.analysis_list_state);

    let detail_block = Block::default().borders(Borders::TOP).title("Details");
    match app.selected_finding() {
        Some(finding) => {
            let p = Paragraph::new(detail_text(finding))
                .wrap(Wrap { trim: true })
                .block(detail_block);
            frame.render_widget(p, chunks[1]);
        }
        None => render_placeholder_details(frame, app, detail_block, chunks[1]),
    }
}

fn detail_text(finding: &Finding) -> Text<'_> {
    let mut lines = vec![
        Line::from(vec![
            Span::styled(finding.severity.to_string().to_uppercase(), severity_style(finding.severity)),
            Span::raw(format!("  {}", finding.category)),
        ]),
        Line::from(""),
        Line::from("WHAT IT IS:".yellow().bold()),
        Line::from(finding.description.as_str()),
        Line::from(""),
        Line::from("IMPACT:".yellow().bold()),
        Line::from(finding.impact.as_str()),
        Line::from(""),
        Line::from("HOW TO FIX:".yellow().bold()),
        Line::from(finding.recommendation.as_str()),
    ];
    if let Some(details) = &finding.details {
        lines.push(Line::from(""));
        lines.push(Line::from("EVIDENCE:".yellow().bold()));
        lines.push(Line::from(details.as_str()));
    }
    Text::from(lines)
}

fn render_placeholder_details(frame: &mut Frame, app: &App, block: Block, area: Rect) {
    let placeholder_text = if app.findings().is_empty() {
        Text::from(vec![
            Line::from(""),
            Line::from("✓ NO ISSUES FOUND".bold().fg(Color::Green)),
            Line::from(""),
            Line::from("None of the probes reported a finding for this target."),
        ])
    } else {
        Text::from("Select an item above to see details.")
    };

    let p = Paragraph::new(placeholder_text)
        .alignment(Alignment::Center)
        .block(block);
    frame.render_widget(p, area);
}

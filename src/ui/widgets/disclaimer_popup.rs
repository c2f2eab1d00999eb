// src/ui/widgets/disclaimer_popup.rs

use ratatui::{
    prelude::*,
    text::Line,
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

/// Renders the authorization disclaimer on top of the UI. It stays until the
/// user acknowledges it with Enter.
pub fn render_disclaimer_popup(frame: &mut Frame, area: Rect) {
    let disclaimer_text = Text::from(vec![
        Line::from("AUTHORIZED TESTING ONLY".bold().yellow()),
        Line::from(""),
        Line::from("This scanner sends injection payloads, enumerates paths and files, and probes TCP ports on the target you enter."),
        Line::from(""),
        Line::from("Only scan systems you own or have explicit, written permission to test. Unauthorized scanning is illegal in many jurisdictions."),
        Line::from(""),
        Line::from("By continuing you confirm that:"),
        Line::from("1. You are authorized to test every target you scan."),
        Line::from("2. You accept responsibility for the traffic this tool generates."),
        Line::from("3. The authors assume NO liability for misuse or damage."),
        Line::from(""),
        Line::from("Press ".bold() + "Enter".bold().yellow() + " to Acknowledge and Continue".bold()),
    ]);

    let block = Block::default()
        .title("Disclaimer")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Red));

    let popup_area = centered_rect(70, 70, area);
    let popup = Paragraph::new(disclaimer_text)
        .block(block)
        .wrap(Wrap { trim: true })
        .alignment(Alignment::Center);

    // Clear first so the report underneath does not bleed through.
    frame.render_widget(Clear, popup_area);
    frame.render_widget(popup, popup_area);
}

/// A `Rect` of the given percentages centered within `r`.
fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let [_, middle, _] = Layout::vertical([
        Constraint::Percentage((100 - percent_y) / 2),
        Constraint::Percentage(percent_y),
        Constraint::Percentage((100 - percent_y) / 2),
    ])
    .areas(r);

    let [_, center, _] = Layout::horizontal([
        Constraint::Percentage((100 - percent_x) / 2),
        Constraint::Percentage(percent_x),
        Constraint::Percentage((100 - percent_x) / 2),
    ])
    .areas(middle);
    center
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn popup_is_centered() {
        let area = Rect::new(0, 0, 100, 50);
        let popup = centered_rect(70, 70, area);
        assert_eq!(popup.width, 70);
        assert_eq!(popup.x, 15);
        assert!(popup.y > 0);
    }
}

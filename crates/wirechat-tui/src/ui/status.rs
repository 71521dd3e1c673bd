//! Status bar
//!
//! Displays the lifecycle phase and the latest notice or status message.

use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
};
use wirechat_app::{LinkState, Phase};

use crate::App;

/// Render the status bar.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let phase = match (app.phase(), app.link().map(|link| link.state)) {
        (Phase::Chatting, _) => Span::styled(
            format!("chatting as {}", app.identity().unwrap_or_default()),
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        ),
        (Phase::AwaitingIdentity, Some(LinkState::Connecting)) => {
            Span::styled("connecting...", Style::default().fg(Color::Yellow))
        },
        (Phase::AwaitingIdentity, Some(_)) => {
            Span::styled("joining...", Style::default().fg(Color::Yellow))
        },
        (phase, _) => Span::styled(phase.to_string(), Style::default().fg(Color::Cyan)),
    };

    let detail = match (app.notice(), app.status_message()) {
        (Some(notice), _) => Span::styled(format!(" | {notice}"), Style::default().fg(Color::Red)),
        (None, Some(message)) => {
            Span::styled(format!(" | {message}"), Style::default().fg(Color::Gray))
        },
        (None, None) => Span::raw(""),
    };

    let status_line = Line::from(vec![Span::raw(" "), phase, detail]);

    let paragraph =
        Paragraph::new(status_line).style(Style::default().bg(Color::DarkGray).fg(Color::White));

    frame.render_widget(paragraph, area);
}

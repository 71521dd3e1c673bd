//! Blocking notice popup
//!
//! Shown over the whole screen until the operator presses Enter.

use ratatui::{
    Frame,
    layout::{Constraint, Flex, Layout, Rect},
    style::{Color, Modifier, Style},
    text::Line,
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

use crate::App;

const POPUP_WIDTH_PERCENT: u16 = 60;
const POPUP_HEIGHT: u16 = 6;

/// Render the current notice centered in `area`.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let Some(notice) = app.notice() else {
        return;
    };

    let popup = centered(area);
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Notice ")
        .border_style(Style::default().fg(Color::Red));

    let text = vec![
        Line::from(notice.to_string()),
        Line::from(""),
        Line::styled("Press Enter to continue", Style::default().add_modifier(Modifier::DIM)),
    ];
    let paragraph = Paragraph::new(text).block(block).wrap(Wrap { trim: true });

    frame.render_widget(Clear, popup);
    frame.render_widget(paragraph, popup);
}

fn centered(area: Rect) -> Rect {
    let [row] = Layout::vertical([Constraint::Length(POPUP_HEIGHT)]).flex(Flex::Center).areas(area);
    let [popup] = Layout::horizontal([Constraint::Percentage(POPUP_WIDTH_PERCENT)])
        .flex(Flex::Center)
        .areas(row);
    popup
}

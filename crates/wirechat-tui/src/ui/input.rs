//! Input line
//!
//! Displays the input buffer with cursor, or the phase's prompt when empty.

use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};
use unicode_width::UnicodeWidthChar;
use wirechat_app::Phase;

use crate::App;

const PROMPT_WIDTH: u16 = 3; // "> "
const INPUT_LINE_OFFSET_Y: u16 = 1; // inside top border
const RIGHT_PADDING: u16 = 1; // inside right border

/// Render the input line.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let input = app.input();
    let block = Block::default().borders(Borders::ALL).title(title(app.phase()));

    let line = if input.is_empty() {
        Line::from(vec![
            Span::raw("> "),
            Span::styled(app.phase().prompt(), Style::default().fg(Color::DarkGray)),
        ])
    } else {
        Line::from(format!("> {}", input.text()))
    };
    let paragraph = Paragraph::new(line).style(Style::default().fg(Color::White)).block(block);

    frame.render_widget(paragraph, area);

    if app.is_awaiting_acknowledgement() {
        return;
    }

    let available_width = area.width.saturating_sub(PROMPT_WIDTH + RIGHT_PADDING);
    let cursor_offset = cursor_column(input.text(), input.cursor()).min(available_width);

    let cursor_x = area.x.saturating_add(PROMPT_WIDTH).saturating_add(cursor_offset);
    let cursor_y = area.y.saturating_add(INPUT_LINE_OFFSET_Y);
    let max_x = area.x.saturating_add(area.width).saturating_sub(RIGHT_PADDING);
    let cursor_x = cursor_x.min(max_x);

    frame.set_cursor_position((cursor_x, cursor_y));
}

fn title(phase: Phase) -> &'static str {
    match phase {
        Phase::AwaitingEndpoint => " Server URL ",
        Phase::AwaitingIdentity => " Name ",
        Phase::Chatting => " Message ",
    }
}

/// Display columns taken by the first `cursor` characters of `text`.
fn cursor_column(text: &str, cursor: usize) -> u16 {
    let width: usize = text.chars().take(cursor).map(|c| c.width().unwrap_or(0)).sum();
    u16::try_from(width).unwrap_or(u16::MAX)
}

//! Transcript area
//!
//! Displays chat lines and system notices, newest at the bottom.

use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem},
};
use wirechat_app::{LineKind, Phase};

use crate::App;

const BORDER_SIZE: u16 = 2;

/// Render the transcript.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let title = app
        .endpoint()
        .map_or_else(|| " wirechat ".to_string(), |endpoint| format!(" {endpoint} "));
    let block = Block::default().borders(Borders::ALL).title(title);

    let transcript = app.transcript();
    let items: Vec<ListItem> = if transcript.is_empty() {
        vec![ListItem::new(Line::from(Span::styled(
            hint(app.phase()),
            Style::default().fg(Color::DarkGray),
        )))]
    } else {
        transcript.entries().map(|(kind, line)| ListItem::new(styled(kind, line))).collect()
    };

    let visible_height = area.height.saturating_sub(BORDER_SIZE) as usize;
    let skip = items.len().saturating_sub(visible_height);
    let visible_items: Vec<_> = items.into_iter().skip(skip).collect();

    frame.render_widget(List::new(visible_items).block(block), area);
}

fn hint(phase: Phase) -> &'static str {
    match phase {
        Phase::AwaitingEndpoint => "Enter a ws:// or wss:// server URL to connect",
        Phase::AwaitingIdentity => "Choose a display name",
        Phase::Chatting => "No messages yet",
    }
}

fn styled(kind: LineKind, line: &str) -> Line<'_> {
    match kind {
        LineKind::Notice => Line::from(Span::styled(
            line,
            Style::default().fg(Color::Yellow).add_modifier(Modifier::ITALIC),
        )),
        LineKind::Sent { label_len } => match line.split_at_checked(label_len) {
            Some((label, rest)) => Line::from(vec![
                Span::styled(label, Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)),
                Span::raw(rest),
            ]),
            None => Line::from(line),
        },
        LineKind::Received => Line::from(line),
    }
}

//! Terminal driver for the TUI.
//!
//! Implements the [`Driver`] trait for terminal I/O using crossterm for
//! keyboard events and ratatui for rendering. Connections are WebSocket
//! [`Link`]s whose notifications funnel into one channel.

use std::{
    collections::BTreeMap,
    io::{self, Stdout, stdout},
    time::Duration,
};

use crossterm::{
    ExecutableCommand,
    event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use futures::StreamExt;
use ratatui::{Terminal, backend::CrosstermBackend};
use thiserror::Error;
use tokio::sync::mpsc;
use wirechat_app::{App, AppEvent, Driver, Endpoint, HandleId, KeyInput, LinkEvent};
use wirechat_client::transport::{Link, TransportConfig, TransportError};

use crate::ui;

/// Interval between ticks when nothing else happens.
const TICK_INTERVAL: Duration = Duration::from_millis(100);

/// Buffered link notifications before connection tasks wait.
const LINK_EVENT_CAPACITY: usize = 64;

/// Terminal driver errors.
#[derive(Debug, Error)]
pub enum TerminalError {
    /// I/O error from terminal operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Transport error.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// No connection exists under this handle.
    #[error("no connection for {0}")]
    UnknownHandle(HandleId),
}

/// Terminal driver implementing the [`Driver`] trait.
///
/// Handles terminal I/O (crossterm), rendering (ratatui), and the WebSocket
/// links the App asks for. Every link reports into the same channel so its
/// notifications interleave with keyboard input in arrival order.
pub struct TerminalDriver {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    event_stream: EventStream,
    links: BTreeMap<HandleId, Link>,
    link_tx: mpsc::Sender<LinkEvent>,
    link_rx: mpsc::Receiver<LinkEvent>,
    transport: TransportConfig,
}

impl TerminalDriver {
    /// Enter raw mode and the alternate screen.
    pub fn new(transport: TransportConfig) -> Result<Self, TerminalError> {
        enable_raw_mode()?;
        stdout().execute(EnterAlternateScreen)?;

        let backend = CrosstermBackend::new(stdout());
        let terminal = Terminal::new(backend)?;
        let (link_tx, link_rx) = mpsc::channel(LINK_EVENT_CAPACITY);

        Ok(Self {
            terminal,
            event_stream: EventStream::new(),
            links: BTreeMap::new(),
            link_tx,
            link_rx,
            transport,
        })
    }

    /// Convert a crossterm key event to `KeyInput`.
    fn convert_key(event: KeyEvent) -> Option<KeyInput> {
        if event.modifiers.contains(KeyModifiers::CONTROL) {
            return match event.code {
                KeyCode::Char('c') => Some(KeyInput::Interrupt),
                _ => None,
            };
        }

        match event.code {
            KeyCode::Char(c) => Some(KeyInput::Char(c)),
            KeyCode::Enter => Some(KeyInput::Enter),
            KeyCode::Backspace => Some(KeyInput::Backspace),
            KeyCode::Delete => Some(KeyInput::Delete),
            KeyCode::Esc => Some(KeyInput::Esc),
            KeyCode::Left => Some(KeyInput::Left),
            KeyCode::Right => Some(KeyInput::Right),
            KeyCode::Home => Some(KeyInput::Home),
            KeyCode::End => Some(KeyInput::End),
            _ => None,
        }
    }

    fn convert_terminal_event(event: Event) -> AppEvent {
        match event {
            Event::Key(key) if key.kind == KeyEventKind::Press => {
                Self::convert_key(key).map_or(AppEvent::Tick, AppEvent::Key)
            },
            Event::Resize(cols, rows) => AppEvent::Resize(cols, rows),
            _ => AppEvent::Tick,
        }
    }
}

impl Driver for TerminalDriver {
    type Error = TerminalError;

    async fn poll_event(&mut self) -> Result<Option<AppEvent>, Self::Error> {
        tokio::select! {
            biased;

            // Terminal events
            maybe_event = self.event_stream.next() => {
                match maybe_event {
                    Some(Ok(event)) => Ok(Some(Self::convert_terminal_event(event))),
                    Some(Err(e)) => Err(TerminalError::Io(e)),
                    None => Ok(None),
                }
            }

            // Connection notifications
            Some(event) = self.link_rx.recv() => {
                if let LinkEvent::Closed { handle, .. } = &event {
                    self.links.remove(handle);
                }
                Ok(Some(AppEvent::Link(event)))
            }

            // Tick timeout
            () = tokio::time::sleep(TICK_INTERVAL) => {
                Ok(Some(AppEvent::Tick))
            }
        }
    }

    fn open(&mut self, handle: HandleId, endpoint: &Endpoint) -> Result<(), Self::Error> {
        let link = Link::open(handle, endpoint, &self.transport, self.link_tx.clone())?;
        if let Some(mut previous) = self.links.insert(handle, link) {
            previous.close();
        }
        Ok(())
    }

    async fn send(&mut self, handle: HandleId, text: String) -> Result<(), Self::Error> {
        let link = self.links.get(&handle).ok_or(TerminalError::UnknownHandle(handle))?;
        link.send(text).await?;
        Ok(())
    }

    fn close(&mut self, handle: HandleId) {
        if let Some(mut link) = self.links.remove(&handle) {
            link.close();
        }
    }

    fn is_open(&self, handle: HandleId) -> bool {
        self.links.get(&handle).is_some_and(Link::is_live)
    }

    fn render(&mut self, app: &App) -> Result<(), Self::Error> {
        self.terminal.draw(|frame| {
            ui::render(frame, app);
        })?;
        Ok(())
    }

    fn stop(&mut self) {
        for (_, mut link) in std::mem::take(&mut self.links) {
            link.close();
        }
    }
}

impl Drop for TerminalDriver {
    fn drop(&mut self) {
        self.stop();
        let _ = disable_raw_mode();
        let _ = stdout().execute(LeaveAlternateScreen);
    }
}

//! Application state machine.
//!
//! This module defines the [`App`] state machine, the connection controller
//! of the chat client. It owns the lifecycle phase, the single connection
//! handle, the transcript and the pending input line, completely decoupled
//! from I/O.
//!
//! This is a pure state machine: it consumes [`crate::AppEvent`] inputs and
//! produces [`crate::AppAction`] instructions for the runtime to execute.
//!
//! # Responsibilities
//!
//! - Interprets each submitted line by phase: endpoint, display name or chat.
//! - Opens, identifies on, and tears down exactly one connection at a time.
//! - Treats transport readiness and session acceptance as separate steps:
//!   `Opened` only triggers sending the name, the server's reply decides.
//! - Discards notifications from handles it no longer owns.

use wirechat_client::{CloseCause, Endpoint, HandleId, LinkEvent, ServerLine};

use crate::{
    ActiveLink, AppAction, AppConfig, AppEvent, ChatError, InputLine, KeyInput, LineKind,
    LinkState, Phase, Transcript,
    command::{self, Command},
};

/// Transcript notice for a connection that failed or broke.
pub const CLOSED_NOTICE: &str = "connection closed";

/// Transcript notice for a connection the server closed.
pub const CLOSED_BY_SERVER_NOTICE: &str = "connection closed by server";

/// Application state machine.
///
/// Pure state machine that processes events and produces actions.
/// No I/O dependencies - fully testable in simulation.
#[derive(Debug, Clone)]
pub struct App {
    /// Controller configuration.
    config: AppConfig,
    /// Lifecycle phase.
    phase: Phase,
    /// Validated server URL. `None` in `AwaitingEndpoint`.
    endpoint: Option<Endpoint>,
    /// Display name of the current or last attempt. `None` if none.
    identity: Option<String>,
    /// The one connection this controller owns. `None` if none.
    link: Option<ActiveLink>,
    /// Most recently allocated handle.
    last_handle: HandleId,
    /// Rendered chat lines and notices.
    transcript: Transcript,
    /// Uncommitted input.
    input: InputLine,
    /// Most recent operator-facing error. `None` if none.
    notice: Option<ChatError>,
    /// Transient status message. `None` if no message.
    status_message: Option<String>,
    /// Terminal dimensions (columns, rows).
    terminal_size: (u16, u16),
}

impl Default for App {
    fn default() -> Self {
        Self::new(AppConfig::default())
    }
}

impl App {
    /// Create a new App in `AwaitingEndpoint`.
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            phase: Phase::AwaitingEndpoint,
            endpoint: None,
            identity: None,
            link: None,
            last_handle: HandleId::default(),
            transcript: Transcript::new(),
            input: InputLine::new(),
            notice: None,
            status_message: None,
            terminal_size: (80, 24),
        }
    }

    /// Process an event and return actions.
    pub fn handle(&mut self, event: AppEvent) -> Vec<AppAction> {
        match event {
            AppEvent::Key(key) => self.handle_key(key),
            AppEvent::Line(line) => self.enter_line(&line),
            AppEvent::Exit => self.exit(),
            AppEvent::Quit => self.quit(),
            AppEvent::Tick => vec![],
            AppEvent::Resize(cols, rows) => {
                self.terminal_size = (cols, rows);
                vec![AppAction::Render]
            },
            AppEvent::Link(event) => self.handle_link_event(event),
            AppEvent::SetupFailed { handle, reason } => self.handle_setup_failed(handle, reason),
        }
    }

    /// Interpret a line according to the current phase.
    ///
    /// - `AwaitingEndpoint`: validate as an absolute URL and advance.
    /// - `AwaitingIdentity`: record the name and request a new connection. The
    ///   name is sent only once the connection reports it is open.
    /// - `Chatting`: send the line verbatim and append it to the transcript.
    ///
    /// Blank names and blank chat lines are ignored.
    pub fn submit_line(&mut self, text: &str) -> Vec<AppAction> {
        match self.phase {
            Phase::AwaitingEndpoint => self.submit_endpoint(text),
            Phase::AwaitingIdentity => self.submit_identity(text),
            Phase::Chatting => self.submit_chat(text),
        }
    }

    /// Close any connection and reset to `AwaitingEndpoint`, clearing the
    /// transcript, endpoint, identity and pending input. Idempotent.
    pub fn exit(&mut self) -> Vec<AppAction> {
        let mut actions = Vec::new();
        if let Some(link) = self.link.take() {
            tracing::info!(handle = %link.handle, "operator exit, closing connection");
            actions.push(AppAction::Close { handle: link.handle });
        }

        self.phase = Phase::AwaitingEndpoint;
        self.endpoint = None;
        self.identity = None;
        self.transcript.clear();
        self.input.clear();
        self.notice = None;
        self.status_message = None;

        actions.push(AppAction::Render);
        actions
    }

    /// Exit, then stop the application.
    pub fn quit(&mut self) -> Vec<AppAction> {
        let mut actions = self.exit();
        actions.retain(|action| *action != AppAction::Render);
        actions.push(AppAction::Quit);
        actions
    }

    /// Set a status message to display to the operator.
    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = Some(message.into());
    }

    /// `true` if handling `event` now would send a chat line.
    ///
    /// Lets the runtime drop a submission when the transport has already gone
    /// away but its close notification has not been processed yet.
    pub fn would_send(&self, event: &AppEvent) -> bool {
        if self.phase != Phase::Chatting {
            return false;
        }

        let line = match event {
            AppEvent::Key(KeyInput::Enter) if !self.is_blocked() => self.input.text(),
            AppEvent::Line(line) => line.as_str(),
            _ => return false,
        };

        matches!(command::parse(line), Command::Line(text) if !text.trim().is_empty())
    }

    fn handle_key(&mut self, key: KeyInput) -> Vec<AppAction> {
        match key {
            KeyInput::Esc | KeyInput::Interrupt => self.quit(),
            KeyInput::Enter if self.is_blocked() => {
                self.notice = None;
                vec![AppAction::Render]
            },
            _ if self.is_blocked() => vec![],
            KeyInput::Enter => {
                let line = self.input.text().to_owned();
                self.enter_line(&line)
            },
            other => {
                if self.input.apply(other) {
                    vec![AppAction::Render]
                } else {
                    vec![]
                }
            },
        }
    }

    /// Handle reserved commands, submit everything else.
    fn enter_line(&mut self, line: &str) -> Vec<AppAction> {
        match command::parse(line) {
            Command::Exit => self.exit(),
            Command::Help => {
                self.input.clear();
                self.status_message = Some(command::help_text());
                vec![AppAction::Render]
            },
            Command::Line(text) => self.submit_line(text),
        }
    }

    fn submit_endpoint(&mut self, text: &str) -> Vec<AppAction> {
        match Endpoint::parse(text) {
            Ok(endpoint) => {
                tracing::info!(%endpoint, "endpoint accepted");
                self.endpoint = Some(endpoint);
                self.input.clear();
                self.notice = None;
                self.status_message = None;
                self.phase = Phase::AwaitingIdentity;
            },
            Err(e) => {
                tracing::debug!("endpoint rejected: {e}");
                self.notice = Some(ChatError::InvalidEndpoint(e));
            },
        }
        vec![AppAction::Render]
    }

    fn submit_identity(&mut self, text: &str) -> Vec<AppAction> {
        let name = text.trim();
        if name.is_empty() {
            return vec![];
        }

        let Some(endpoint) = self.endpoint.clone() else {
            tracing::warn!("awaiting identity without an endpoint, resetting");
            return self.exit();
        };

        let mut actions = Vec::new();

        // Resubmitting while an attempt is in flight replaces that attempt.
        if let Some(previous) = self.link.take() {
            tracing::debug!(handle = %previous.handle, "superseding pending connection");
            actions.push(AppAction::Close { handle: previous.handle });
        }

        let handle = self.allocate_handle();
        tracing::info!(%handle, %endpoint, name, "opening connection");

        self.identity = Some(name.to_string());
        self.link = Some(ActiveLink::connecting(handle));
        self.input.clear();
        self.notice = None;
        self.status_message = Some(format!("Connecting to {endpoint}..."));

        actions.push(AppAction::Open { handle, endpoint });
        actions.push(AppAction::Render);
        actions
    }

    fn submit_chat(&mut self, text: &str) -> Vec<AppAction> {
        if text.trim().is_empty() {
            return vec![];
        }

        let Some(link) = self.link.filter(|link| link.state == LinkState::Accepted) else {
            tracing::warn!("chatting without an accepted connection, dropping line");
            return vec![];
        };

        let label = self.config.self_label.as_deref().or(self.identity.as_deref()).unwrap_or("");
        let kind = LineKind::Sent { label_len: label.len() };
        self.transcript.push(kind, format!("{label}: {text}"));
        self.input.clear();

        vec![AppAction::Send { handle: link.handle, text: text.to_string() }, AppAction::Render]
    }

    fn handle_link_event(&mut self, event: LinkEvent) -> Vec<AppAction> {
        let Some(link) = self.link.filter(|link| link.handle == event.handle()) else {
            return Self::handle_stale(event);
        };

        match event {
            LinkEvent::Opened { .. } => self.on_opened(link),
            LinkEvent::Received { text, .. } => self.on_received(link, text),
            LinkEvent::Closed { cause, .. } => self.on_closed(link, cause),
        }
    }

    /// Events for handles this controller no longer owns never touch state.
    /// A late `Opened` means a connection is live that nobody owns: close it.
    fn handle_stale(event: LinkEvent) -> Vec<AppAction> {
        match event {
            LinkEvent::Opened { handle } => {
                tracing::debug!(%handle, "stale connection opened, closing it");
                vec![AppAction::Close { handle }]
            },
            LinkEvent::Received { handle, .. } | LinkEvent::Closed { handle, .. } => {
                tracing::debug!(%handle, "ignoring event for stale connection");
                vec![]
            },
        }
    }

    fn on_opened(&mut self, link: ActiveLink) -> Vec<AppAction> {
        let handle = link.handle;
        if link.state != LinkState::Connecting {
            tracing::warn!(%handle, state = ?link.state, "duplicate open notification");
            return vec![];
        }

        let Some(identity) = self.identity.clone() else {
            tracing::warn!(%handle, "connection opened without an identity, closing");
            self.link = None;
            return vec![AppAction::Close { handle }, AppAction::Render];
        };

        tracing::debug!(%handle, "connection open, sending identity");
        self.link = Some(ActiveLink { handle, state: LinkState::AwaitingAcceptance });
        self.status_message = Some(format!("Joining as {identity}..."));

        vec![AppAction::Send { handle, text: identity }, AppAction::Render]
    }

    fn on_received(&mut self, link: ActiveLink, text: String) -> Vec<AppAction> {
        let handle = link.handle;
        match link.state {
            LinkState::Connecting => {
                tracing::warn!(%handle, "message before open notification, ignoring");
                vec![]
            },
            LinkState::AwaitingAcceptance => match ServerLine::parse(&text) {
                ServerLine::Rejected { reason } => {
                    tracing::info!(%handle, %reason, "server rejected identity");
                    self.link = None;
                    self.identity = None;
                    self.phase = Phase::AwaitingIdentity;
                    self.status_message = None;
                    self.notice = Some(ChatError::ServerRejected { reason });
                    vec![AppAction::Close { handle }, AppAction::Render]
                },
                ServerLine::Text(_) => {
                    tracing::info!(%handle, "identity accepted");
                    self.link = Some(ActiveLink { handle, state: LinkState::Accepted });
                    self.phase = Phase::Chatting;
                    self.status_message = None;
                    self.notice = None;
                    vec![AppAction::Render]
                },
            },
            LinkState::Accepted => {
                self.transcript.push(LineKind::Received, text);
                vec![AppAction::Render]
            },
        }
    }

    /// Any close of the owned handle is a full reset to the first phase.
    fn on_closed(&mut self, link: ActiveLink, cause: CloseCause) -> Vec<AppAction> {
        tracing::info!(handle = %link.handle, %cause, phase = %self.phase, "connection closed");

        let notice = if cause.is_remote() { CLOSED_BY_SERVER_NOTICE } else { CLOSED_NOTICE };
        self.transcript.push(LineKind::Notice, notice);

        self.link = None;
        self.endpoint = None;
        self.identity = None;
        self.phase = Phase::AwaitingEndpoint;
        self.status_message = None;
        self.notice = Some(ChatError::ConnectionLost { cause });

        vec![AppAction::Render]
    }

    fn handle_setup_failed(&mut self, handle: HandleId, reason: String) -> Vec<AppAction> {
        let owned = self
            .link
            .is_some_and(|link| link.handle == handle && link.state == LinkState::Connecting);
        if !owned {
            tracing::debug!(%handle, "ignoring setup failure for stale connection");
            return vec![];
        }

        tracing::warn!(%handle, %reason, "connection setup failed");
        self.link = None;
        self.identity = None;
        self.status_message = None;
        self.notice = Some(ChatError::ConnectionSetupFailed { reason });

        vec![AppAction::Render]
    }

    fn allocate_handle(&mut self) -> HandleId {
        self.last_handle = self.last_handle.next();
        self.last_handle
    }

    fn is_blocked(&self) -> bool {
        self.notice.as_ref().is_some_and(ChatError::is_blocking)
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Validated endpoint. `None` in `AwaitingEndpoint`.
    pub fn endpoint(&self) -> Option<&Endpoint> {
        self.endpoint.as_ref()
    }

    /// Display name of the current attempt. `None` if none.
    pub fn identity(&self) -> Option<&str> {
        self.identity.as_deref()
    }

    /// The owned connection. `None` if none.
    pub fn link(&self) -> Option<ActiveLink> {
        self.link
    }

    /// Handle of the owned connection. `None` if none.
    pub fn current_handle(&self) -> Option<HandleId> {
        self.link.map(|link| link.handle)
    }

    /// Transcript lines.
    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Pending input line.
    pub fn input(&self) -> &InputLine {
        &self.input
    }

    /// Most recent operator-facing error. `None` if none.
    pub fn notice(&self) -> Option<&ChatError> {
        self.notice.as_ref()
    }

    /// `true` while a blocking notice awaits acknowledgement.
    pub fn is_awaiting_acknowledgement(&self) -> bool {
        self.is_blocked()
    }

    /// Transient status message. `None` if no message.
    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }

    /// Terminal dimensions (columns, rows).
    pub fn terminal_size(&self) -> (u16, u16) {
        self.terminal_size
    }

    /// Controller configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}

//! Observable application state types.
//!
//! This module defines the data structures that represent the application's
//! current view of the session, such as [`Phase`] and [`Transcript`].
//!
//! These structures serve as the "View Model" for the presentation layer.
//! They expose what is needed for rendering without exposing the transport.

use std::fmt;

use wirechat_client::HandleId;

/// Position in the connect → identify → chat lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Phase {
    /// Waiting for the operator to enter a server URL.
    #[default]
    AwaitingEndpoint,
    /// Endpoint known, waiting for a display name or for the server to
    /// accept it.
    AwaitingIdentity,
    /// Name accepted, exchanging chat lines.
    Chatting,
}

impl Phase {
    /// Prompt shown in the input line for this phase.
    pub fn prompt(self) -> &'static str {
        match self {
            Self::AwaitingEndpoint => "wss://server...",
            Self::AwaitingIdentity => "Your name",
            Self::Chatting => "Type a message...",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::AwaitingEndpoint => "awaiting endpoint",
            Self::AwaitingIdentity => "awaiting identity",
            Self::Chatting => "chatting",
        };
        f.write_str(name)
    }
}

/// Progress of the single owned connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkState {
    /// Open requested, transport not ready yet.
    Connecting,
    /// Transport open and identity sent, waiting for the server's reply.
    AwaitingAcceptance,
    /// Server accepted the identity.
    Accepted,
}

/// The connection currently owned by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveLink {
    /// Identifier its events carry.
    pub handle: HandleId,
    /// Handshake progress.
    pub state: LinkState,
}

impl ActiveLink {
    /// A link that has just been requested.
    pub fn connecting(handle: HandleId) -> Self {
        Self { handle, state: LinkState::Connecting }
    }
}

/// Where a transcript line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineKind {
    /// Sent by this client, prefixed with its label.
    Sent {
        /// Byte length of the label at the start of the line.
        label_len: usize,
    },
    /// Received from the server, verbatim.
    Received,
    /// Produced by the client itself.
    Notice,
}

/// Ordered log of rendered chat lines and system notices.
///
/// Append-only during a session; only a full reset clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transcript {
    lines: Vec<String>,
    kinds: Vec<LineKind>,
}

impl Transcript {
    /// Create an empty transcript.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a line.
    pub fn push(&mut self, kind: LineKind, line: impl Into<String>) {
        self.lines.push(line.into());
        self.kinds.push(kind);
    }

    /// All lines in order.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// All lines in order, with their origin.
    pub fn entries(&self) -> impl Iterator<Item = (LineKind, &str)> {
        self.kinds.iter().copied().zip(self.lines.iter().map(String::as_str))
    }

    /// Most recent line. `None` if empty.
    pub fn last(&self) -> Option<&str> {
        self.lines.last().map(String::as_str)
    }

    /// Number of lines.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// `true` if no lines were appended since the last reset.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub(crate) fn clear(&mut self) {
        self.lines.clear();
        self.kinds.clear();
    }
}

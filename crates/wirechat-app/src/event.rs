//! Application input events.
//!
//! This module defines [`AppEvent`], the complete set of inputs that drive the
//! [`crate::App`] state machine.
//!
//! Events originate from two distinct sources:
//! - Operator interactions (keys, submitted lines, exit) and system ticks.
//! - Connection notifications delivered by the transport.

use wirechat_client::{HandleId, LinkEvent};

use crate::KeyInput;

/// Events processed by the App state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// Keyboard input editing the pending line.
    Key(KeyInput),

    /// A complete line from an opaque input source. Reserved commands are
    /// honored, everything else is submitted.
    Line(String),

    /// Operator exit: close any connection and reset to the first phase.
    Exit,

    /// Operator quit: exit, then stop the application.
    Quit,

    /// Periodic tick.
    Tick,

    /// Terminal resize (columns, rows).
    Resize(u16, u16),

    /// Notification from a connection.
    Link(LinkEvent),

    /// The driver could not construct the connection requested by
    /// [`crate::AppAction::Open`].
    SetupFailed {
        /// Handle that failed to open.
        handle: HandleId,
        /// Driver diagnostic.
        reason: String,
    },
}

impl From<LinkEvent> for AppEvent {
    fn from(event: LinkEvent) -> Self {
        Self::Link(event)
    }
}

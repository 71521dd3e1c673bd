//! Connection identity and notifications.
//!
//! Every connection attempt gets a fresh [`HandleId`]. Transports tag each
//! [`LinkEvent`] with the handle it belongs to, so a consumer can recognize
//! and discard notifications from a connection it has already given up on.
//!
//! Per handle, events arrive as `Opened`, then `Received` in arrival order,
//! then at most one terminal `Closed`. Nothing follows `Closed`.

use std::fmt;

/// Identifier of one connection attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct HandleId(u64);

impl HandleId {
    /// Wrap a raw identifier.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw identifier.
    pub const fn get(self) -> u64 {
        self.0
    }

    /// The identifier following this one.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

impl fmt::Display for HandleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Why a connection ended.
///
/// A connection closed by this side reports nothing, so there is no local
/// cause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseCause {
    /// The server closed the connection or the stream ended.
    Remote,
    /// Connection failed or broke.
    Error(String),
}

impl CloseCause {
    /// `true` if the server initiated the close.
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Remote)
    }
}

impl fmt::Display for CloseCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Remote => f.write_str("closed by server"),
            Self::Error(reason) => write!(f, "{reason}"),
        }
    }
}

/// Notification delivered by a connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkEvent {
    /// Transport is ready to carry messages.
    Opened {
        /// Connection the event belongs to.
        handle: HandleId,
    },

    /// One text line from the server.
    Received {
        /// Connection the event belongs to.
        handle: HandleId,
        /// Line content, verbatim.
        text: String,
    },

    /// Connection ended. Terminal.
    Closed {
        /// Connection the event belongs to.
        handle: HandleId,
        /// Why it ended.
        cause: CloseCause,
    },
}

impl LinkEvent {
    /// Connection the event belongs to.
    pub fn handle(&self) -> HandleId {
        match self {
            Self::Opened { handle } | Self::Received { handle, .. } | Self::Closed { handle, .. } => {
                *handle
            },
        }
    }
}

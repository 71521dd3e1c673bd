//! Application side-effects and intents.
//!
//! This module defines the [`AppAction`] enum, which represents instructions
//! produced by the [`crate::App`] state machine for the runtime to execute.

use wirechat_client::{Endpoint, HandleId};

/// Actions produced by the App state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppAction {
    /// Render the UI.
    Render,

    /// Quit the application.
    Quit,

    /// Construct a new connection.
    Open {
        /// Identifier the connection's events must carry.
        handle: HandleId,
        /// Server to connect to.
        endpoint: Endpoint,
    },

    /// Send one text line.
    Send {
        /// Connection to send on.
        handle: HandleId,
        /// Line content, verbatim.
        text: String,
    },

    /// Close a connection. Closing an unknown or closed handle is a no-op.
    Close {
        /// Connection to close.
        handle: HandleId,
    },
}

//! Operator-facing error kinds.
//!
//! None of these is fatal. Each resolves into a well-defined phase and is kept
//! as the controller's current notice until superseded.

use thiserror::Error;
use wirechat_client::{CloseCause, EndpointError};

/// Errors surfaced to the operator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChatError {
    /// Submitted endpoint is not a usable absolute URL. No state changed.
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(#[from] EndpointError),

    /// Connection could not be constructed. Phase stays `AwaitingIdentity`.
    #[error("connection setup failed: {reason}")]
    ConnectionSetupFailed {
        /// Driver diagnostic.
        reason: String,
    },

    /// Server answered the display name with an `ERROR:` line.
    #[error("server rejected the name: {reason}")]
    ServerRejected {
        /// Reason text following the prefix.
        reason: String,
    },

    /// Connection closed without an operator exit. Full reset.
    #[error("connection lost: {cause}")]
    ConnectionLost {
        /// Why the connection ended.
        cause: CloseCause,
    },
}

impl ChatError {
    /// Blocking notices must be acknowledged before more input is accepted.
    pub fn is_blocking(&self) -> bool {
        matches!(self, Self::ServerRejected { .. })
    }
}

//! Observable state snapshots for invariant checking.
//!
//! Snapshots capture the observable state of the system at a point in time.
//! Invariants operate on snapshots rather than live state to ensure
//! consistent, atomic checks.

use std::collections::BTreeSet;

use wirechat_app::{ActiveLink, App, HandleId, Phase};

/// Snapshot of the entire system state.
///
/// Contains observable state from one or more clients for invariant checking.
#[derive(Debug, Clone, Default)]
pub struct SystemSnapshot {
    /// Per-client state snapshots.
    pub clients: Vec<ClientSnapshot>,
}

impl SystemSnapshot {
    /// Create an empty snapshot (no clients).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Create a snapshot with a single client.
    pub fn single(client: ClientSnapshot) -> Self {
        Self { clients: vec![client] }
    }

    /// Create a snapshot from multiple clients.
    pub fn from_clients(clients: Vec<ClientSnapshot>) -> Self {
        Self { clients }
    }

    /// Add a client snapshot.
    pub fn add_client(&mut self, client: ClientSnapshot) {
        self.clients.push(client);
    }
}

/// Snapshot of a single client's observable state.
///
/// Controller fields come from the [`App`]; `live_handles` and
/// `closing_handles` come from the transport the App drives.
#[derive(Debug, Clone, Default)]
pub struct ClientSnapshot {
    /// Client identifier.
    pub id: u64,
    /// Lifecycle phase.
    pub phase: Phase,
    /// Whether an endpoint is stored.
    pub has_endpoint: bool,
    /// Whether an identity is stored.
    pub has_identity: bool,
    /// The connection the App owns. `None` if none.
    pub link: Option<ActiveLink>,
    /// Handles the transport considers connecting or open.
    pub live_handles: BTreeSet<HandleId>,
    /// Handles whose close notification is queued but not yet processed.
    pub closing_handles: BTreeSet<HandleId>,
    /// Transcript lines.
    pub transcript: Vec<String>,
    /// Transcript at the previous check. `None` on the first check.
    pub previous_transcript: Option<Vec<String>>,
}

impl ClientSnapshot {
    /// Create a new client snapshot in the initial state.
    pub fn new(id: u64) -> Self {
        Self { id, ..Default::default() }
    }

    /// Capture controller state from an App.
    pub fn from_app(id: u64, app: &App) -> Self {
        Self {
            id,
            phase: app.phase(),
            has_endpoint: app.endpoint().is_some(),
            has_identity: app.identity().is_some(),
            link: app.link(),
            transcript: app.transcript().lines().to_vec(),
            ..Default::default()
        }
    }

    /// Set the transport's live handles.
    pub fn with_live_handles(mut self, handles: impl IntoIterator<Item = HandleId>) -> Self {
        self.live_handles.extend(handles);
        self
    }

    /// Set the handles with an unprocessed close notification.
    pub fn with_closing_handles(mut self, handles: impl IntoIterator<Item = HandleId>) -> Self {
        self.closing_handles.extend(handles);
        self
    }

    /// Set the transcript observed at the previous check.
    pub fn with_previous_transcript(mut self, transcript: Option<Vec<String>>) -> Self {
        self.previous_transcript = transcript;
        self
    }

    /// Handle of the owned connection. `None` if none.
    pub fn owned_handle(&self) -> Option<HandleId> {
        self.link.map(|link| link.handle)
    }
}

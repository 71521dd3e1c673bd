//! Scripted chat server.
//!
//! `SimPeer` is the server side of the wire protocol as pure, synchronous
//! logic: the first line of a connection is the display name, answered with
//! a greeting or an `ERROR:` rejection; every later line is relayed to all
//! other joined connections as `"{name}: {line}"`.
//!
//! It performs no I/O. Callers feed it connection events and route the
//! returned [`PeerOutput`]s, which lets the same logic sit behind the
//! in-memory [`crate::SimNetwork`] or behind a real WebSocket listener.

use std::collections::{BTreeMap, BTreeSet};

use wirechat_client::ERROR_PREFIX;

/// Server-side connection identifier.
pub type PeerId = u64;

/// Notice sent to every connection before a shutdown.
pub const SHUTDOWN_NOTICE: &str = "server shutting down, you will be disconnected";

/// Instruction produced by the server for its transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeerOutput {
    /// Send a text line to one connection.
    Deliver {
        /// Recipient.
        to: PeerId,
        /// Line to send.
        text: String,
    },
    /// Close one connection.
    Close {
        /// Connection to close.
        peer: PeerId,
    },
}

#[derive(Debug, Default)]
struct Session {
    name: Option<String>,
}

/// In-memory chat server.
#[derive(Debug, Default)]
pub struct SimPeer {
    reserved: BTreeSet<String>,
    sessions: BTreeMap<PeerId, Session>,
    next_id: PeerId,
}

impl SimPeer {
    /// Create a server with no reserved names.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a server that rejects the given names.
    pub fn with_reserved_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { reserved: names.into_iter().map(Into::into).collect(), ..Self::default() }
    }

    /// Accept a new connection.
    pub fn connect(&mut self) -> PeerId {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        self.sessions.insert(id, Session::default());
        tracing::debug!(peer = id, "peer connected");
        id
    }

    /// Handle one inbound text line from `peer`.
    pub fn receive(&mut self, peer: PeerId, text: &str) -> Vec<PeerOutput> {
        let Some(session) = self.sessions.get(&peer) else {
            tracing::debug!(peer, "line from unknown peer");
            return vec![];
        };

        match session.name.clone() {
            None => self.join(peer, text),
            Some(name) => self.relay(peer, &name, text),
        }
    }

    /// Forget a connection the client closed.
    pub fn disconnect(&mut self, peer: PeerId) {
        if let Some(session) = self.sessions.remove(&peer) {
            tracing::debug!(peer, name = ?session.name, "peer disconnected");
        }
    }

    /// Close a connection from the server side.
    pub fn kick(&mut self, peer: PeerId) -> Vec<PeerOutput> {
        if self.sessions.remove(&peer).is_some() {
            vec![PeerOutput::Close { peer }]
        } else {
            vec![]
        }
    }

    /// Notify and close every connection.
    pub fn shutdown(&mut self) -> Vec<PeerOutput> {
        let sessions = std::mem::take(&mut self.sessions);
        let mut outputs = Vec::with_capacity(sessions.len() * 2);
        for peer in sessions.into_keys() {
            outputs.push(PeerOutput::Deliver { to: peer, text: SHUTDOWN_NOTICE.to_string() });
            outputs.push(PeerOutput::Close { peer });
        }
        outputs
    }

    /// Names of joined connections, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.sessions.values().filter_map(|s| s.name.as_deref()).collect();
        names.sort_unstable();
        names
    }

    /// Number of open connections, joined or not.
    pub fn connection_count(&self) -> usize {
        self.sessions.len()
    }

    fn join(&mut self, peer: PeerId, text: &str) -> Vec<PeerOutput> {
        let name = text.trim();
        let reason = if name.is_empty() {
            Some("empty name")
        } else if self.reserved.contains(name) || self.names().contains(&name) {
            Some("name taken")
        } else {
            None
        };

        if let Some(reason) = reason {
            tracing::debug!(peer, name, reason, "rejecting peer");
            self.sessions.remove(&peer);
            return vec![
                PeerOutput::Deliver { to: peer, text: format!("{ERROR_PREFIX} {reason}") },
                PeerOutput::Close { peer },
            ];
        }

        if let Some(session) = self.sessions.get_mut(&peer) {
            session.name = Some(name.to_string());
        }
        vec![PeerOutput::Deliver { to: peer, text: format!("hi {name}") }]
    }

    fn relay(&self, from: PeerId, name: &str, text: &str) -> Vec<PeerOutput> {
        self.sessions
            .iter()
            .filter(|(id, session)| **id != from && session.name.is_some())
            .map(|(id, _)| PeerOutput::Deliver { to: *id, text: format!("{name}: {text}") })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn joined(peer: &mut SimPeer, name: &str) -> PeerId {
        let id = peer.connect();
        let _ = peer.receive(id, name);
        id
    }

    #[test]
    fn first_line_is_the_name() {
        let mut peer = SimPeer::new();
        let id = peer.connect();

        let outputs = peer.receive(id, "Ana");

        assert_eq!(outputs, vec![PeerOutput::Deliver { to: id, text: "hi Ana".into() }]);
        assert_eq!(peer.names(), ["Ana"]);
    }

    #[test]
    fn taken_name_is_rejected_and_closed() {
        let mut peer = SimPeer::with_reserved_names(["admin"]);
        let _ = joined(&mut peer, "Ana");

        for name in ["admin", "Ana", "  "] {
            let id = peer.connect();
            let outputs = peer.receive(id, name);

            assert!(
                matches!(&outputs[..], [PeerOutput::Deliver { text, .. }, PeerOutput::Close { .. }]
                    if text.starts_with(ERROR_PREFIX)),
                "{name:?}: {outputs:?}"
            );
        }
        assert_eq!(peer.connection_count(), 1);
    }

    #[test]
    fn lines_are_relayed_to_others_only() {
        let mut peer = SimPeer::new();
        let ana = joined(&mut peer, "Ana");
        let beto = joined(&mut peer, "Beto");
        let pending = peer.connect();

        let outputs = peer.receive(ana, "hola");

        assert_eq!(outputs, vec![PeerOutput::Deliver { to: beto, text: "Ana: hola".into() }]);
        assert_ne!(pending, beto);
    }

    #[test]
    fn shutdown_notifies_then_closes_everyone() {
        let mut peer = SimPeer::new();
        let ana = joined(&mut peer, "Ana");

        let outputs = peer.shutdown();

        assert_eq!(outputs, vec![
            PeerOutput::Deliver { to: ana, text: SHUTDOWN_NOTICE.into() },
            PeerOutput::Close { peer: ana }
        ]);
        assert_eq!(peer.connection_count(), 0);
    }

    #[test]
    fn name_is_free_again_after_disconnect() {
        let mut peer = SimPeer::new();
        let ana = joined(&mut peer, "Ana");
        peer.disconnect(ana);

        let again = peer.connect();
        let outputs = peer.receive(again, "Ana");

        assert_eq!(outputs, vec![PeerOutput::Deliver { to: again, text: "hi Ana".into() }]);
    }
}

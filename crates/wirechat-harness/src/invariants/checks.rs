//! Standard invariant checks.
//!
//! These invariants capture behavioral properties that must always hold.
//! They verify WHAT must be true, not specific test scenarios.

use wirechat_app::{LinkState, Phase};

use super::{Invariant, InvariantKind, InvariantResult, SystemSnapshot, Violation};

/// At most one connection is live, and it is the one the App owns.
///
/// A live handle the App no longer references is a leaked connection: its
/// lines would be sent or received with nobody tracking them.
pub struct SingleLiveLink;

impl Invariant for SingleLiveLink {
    fn kind(&self) -> InvariantKind {
        InvariantKind::SingleLiveLink
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        for client in &state.clients {
            if client.live_handles.len() > 1 {
                return Err(Violation {
                    invariant: self.kind(),
                    message: format!(
                        "client {}: {} live handles {:?}",
                        client.id,
                        client.live_handles.len(),
                        client.live_handles
                    ),
                });
            }

            if let Some(live) = client.live_handles.first()
                && client.owned_handle() != Some(*live)
            {
                return Err(Violation {
                    invariant: self.kind(),
                    message: format!(
                        "client {}: live handle {} not owned (owned {:?})",
                        client.id,
                        live,
                        client.owned_handle()
                    ),
                });
            }
        }
        Ok(())
    }
}

/// Phase, endpoint, identity and link agree with each other.
///
/// - `AwaitingEndpoint`: nothing stored, nothing owned
/// - `AwaitingIdentity`: endpoint stored; an owned link is not yet accepted
///   and has an identity
/// - `Chatting`: endpoint and identity stored, owned link accepted
pub struct PhaseConsistency;

impl Invariant for PhaseConsistency {
    fn kind(&self) -> InvariantKind {
        InvariantKind::PhaseConsistency
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        for client in &state.clients {
            let problem = match client.phase {
                Phase::AwaitingEndpoint => {
                    if client.has_endpoint || client.has_identity || client.link.is_some() {
                        Some("stale session data")
                    } else {
                        None
                    }
                },
                Phase::AwaitingIdentity => match client.link {
                    _ if !client.has_endpoint => Some("no endpoint"),
                    Some(link) if link.state == LinkState::Accepted => Some("link already accepted"),
                    Some(_) if !client.has_identity => Some("link without identity"),
                    _ => None,
                },
                Phase::Chatting => match client.link {
                    _ if !client.has_endpoint || !client.has_identity => {
                        Some("missing endpoint or identity")
                    },
                    Some(link) if link.state == LinkState::Accepted => None,
                    _ => Some("no accepted link"),
                },
            };

            if let Some(problem) = problem {
                return Err(Violation {
                    invariant: self.kind(),
                    message: format!(
                        "client {} in {}: {problem} (endpoint {}, identity {}, link {:?})",
                        client.id, client.phase, client.has_endpoint, client.has_identity, client.link
                    ),
                });
            }
        }
        Ok(())
    }
}

/// The transcript only grows between checks, unless it was fully reset.
pub struct TranscriptAppendOnly;

impl Invariant for TranscriptAppendOnly {
    fn kind(&self) -> InvariantKind {
        InvariantKind::TranscriptAppendOnly
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        for client in &state.clients {
            let Some(previous) = &client.previous_transcript else {
                continue;
            };

            if !client.transcript.is_empty() && !client.transcript.starts_with(previous) {
                return Err(Violation {
                    invariant: self.kind(),
                    message: format!(
                        "client {}: transcript {:?} does not extend {:?}",
                        client.id, client.transcript, previous
                    ),
                });
            }
        }
        Ok(())
    }
}

/// `Chatting` implies the owned connection is live, or its close is queued.
///
/// The App can only learn about a close by processing the notification, so a
/// queued close is the one window where chatting over a dead link is allowed.
pub struct ChattingHasLiveLink;

impl Invariant for ChattingHasLiveLink {
    fn kind(&self) -> InvariantKind {
        InvariantKind::ChattingHasLiveLink
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        for client in &state.clients {
            if client.phase != Phase::Chatting {
                continue;
            }

            let live = client.owned_handle().is_some_and(|handle| {
                client.live_handles.contains(&handle) || client.closing_handles.contains(&handle)
            });

            if !live {
                return Err(Violation {
                    invariant: self.kind(),
                    message: format!(
                        "client {}: chatting on {:?} but live handles are {:?}",
                        client.id,
                        client.owned_handle(),
                        client.live_handles
                    ),
                });
            }
        }
        Ok(())
    }
}

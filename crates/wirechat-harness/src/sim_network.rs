//! In-memory network between simulation drivers and a [`SimPeer`].
//!
//! Each [`crate::SimDriver`] attached to a `SimNetwork` gets its connections
//! served by the shared server. Deliveries are synchronous: a line sent by
//! one client is queued at its recipients before `send` returns, so every run
//! with the same inputs produces the same interleaving.
//!
//! Faults are injected from a seeded RNG, never from wall-clock timing.

#![allow(clippy::disallowed_types, reason = "Synchronous locking operations only")]

use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use wirechat_app::{CloseCause, HandleId, LinkEvent};

use crate::{
    sim_driver::DriverState,
    sim_peer::{PeerId, PeerOutput, SimPeer},
};

/// Seeded fault injection settings.
#[derive(Debug, Clone, Copy)]
pub struct FaultConfig {
    /// RNG seed. Same seed, same faults.
    pub seed: u64,
    /// Chance that the server drops a connection after handling a line.
    pub kick_probability: f64,
    /// Chance that an open is refused.
    pub refuse_probability: f64,
}

impl FaultConfig {
    /// No faults.
    pub fn none(seed: u64) -> Self {
        Self { seed, kick_probability: 0.0, refuse_probability: 0.0 }
    }
}

struct FaultInjector {
    rng: ChaCha8Rng,
    kick_probability: f64,
    refuse_probability: f64,
}

impl FaultInjector {
    fn new(config: FaultConfig) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            kick_probability: config.kick_probability.clamp(0.0, 1.0),
            refuse_probability: config.refuse_probability.clamp(0.0, 1.0),
        }
    }

    fn kick(&mut self) -> bool {
        self.rng.gen_bool(self.kick_probability)
    }

    fn refuse(&mut self) -> bool {
        self.rng.gen_bool(self.refuse_probability)
    }
}

type ClientId = u64;

#[derive(Default)]
struct NetworkState {
    peer: SimPeer,
    clients: BTreeMap<ClientId, Arc<Mutex<DriverState>>>,
    routes: BTreeMap<PeerId, (ClientId, HandleId)>,
    connections: BTreeMap<(ClientId, HandleId), PeerId>,
    next_client: ClientId,
    refusing: bool,
    faults: Option<FaultInjector>,
}

impl NetworkState {
    fn deliver(&self, client: ClientId, event: LinkEvent) {
        if let Some(state) = self.clients.get(&client) {
            state.lock().unwrap_or_else(PoisonError::into_inner).deliver(event);
        }
    }

    fn route(&mut self, outputs: Vec<PeerOutput>) {
        for output in outputs {
            match output {
                PeerOutput::Deliver { to, text } => {
                    if let Some(&(client, handle)) = self.routes.get(&to) {
                        self.deliver(client, LinkEvent::Received { handle, text });
                    }
                },
                PeerOutput::Close { peer } => {
                    if let Some((client, handle)) = self.routes.remove(&peer) {
                        self.connections.remove(&(client, handle));
                        let cause = CloseCause::Remote;
                        self.deliver(client, LinkEvent::Closed { handle, cause });
                    }
                },
            }
        }
    }

    fn should_refuse(&mut self) -> bool {
        self.refusing || self.faults.as_mut().is_some_and(FaultInjector::refuse)
    }

    fn should_kick(&mut self) -> bool {
        self.faults.as_mut().is_some_and(FaultInjector::kick)
    }
}

/// Shared in-memory network. Cheap to clone.
#[derive(Clone, Default)]
pub struct SimNetwork {
    inner: Arc<Mutex<NetworkState>>,
}

impl SimNetwork {
    /// Create a network served by `peer`.
    pub fn new(peer: SimPeer) -> Self {
        let state = NetworkState { peer, ..NetworkState::default() };
        Self { inner: Arc::new(Mutex::new(state)) }
    }

    /// Enable seeded fault injection.
    #[must_use]
    pub fn with_faults(self, config: FaultConfig) -> Self {
        self.lock().faults = Some(FaultInjector::new(config));
        self
    }

    fn lock(&self) -> MutexGuard<'_, NetworkState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn attach(&self, state: Arc<Mutex<DriverState>>) -> ClientId {
        let mut net = self.lock();
        net.next_client = net.next_client.wrapping_add(1);
        let id = net.next_client;
        net.clients.insert(id, state);
        id
    }

    pub(crate) fn open(&self, client: ClientId, handle: HandleId) {
        let mut net = self.lock();
        if net.should_refuse() {
            tracing::debug!(client, %handle, "refusing connection");
            let cause = CloseCause::Error("connection refused".into());
            net.deliver(client, LinkEvent::Closed { handle, cause });
            return;
        }

        let peer = net.peer.connect();
        net.routes.insert(peer, (client, handle));
        net.connections.insert((client, handle), peer);
        net.deliver(client, LinkEvent::Opened { handle });
    }

    pub(crate) fn send(&self, client: ClientId, handle: HandleId, text: &str) {
        let mut net = self.lock();
        let Some(&peer) = net.connections.get(&(client, handle)) else {
            tracing::debug!(client, %handle, "send on unrouted connection");
            return;
        };

        let mut outputs = net.peer.receive(peer, text);
        if net.should_kick() {
            tracing::debug!(client, %handle, "injecting server-side close");
            outputs.extend(net.peer.kick(peer));
        }
        net.route(outputs);
    }

    pub(crate) fn close(&self, client: ClientId, handle: HandleId) {
        let mut net = self.lock();
        if let Some(peer) = net.connections.remove(&(client, handle)) {
            net.routes.remove(&peer);
            net.peer.disconnect(peer);
        }
    }

    /// Close every connection of `client` from the server side.
    pub fn kick(&self, client: ClientId) {
        let mut net = self.lock();
        let peers: Vec<PeerId> = net
            .connections
            .iter()
            .filter(|((owner, _), _)| *owner == client)
            .map(|(_, peer)| *peer)
            .collect();

        let mut outputs = Vec::new();
        for peer in peers {
            outputs.extend(net.peer.kick(peer));
        }
        net.route(outputs);
    }

    /// Shut the server down: notify and close everyone.
    pub fn shutdown(&self) {
        let mut net = self.lock();
        let outputs = net.peer.shutdown();
        net.route(outputs);
    }

    /// Refuse (or accept again) new connections.
    pub fn set_refusing(&self, refusing: bool) {
        self.lock().refusing = refusing;
    }

    /// Names joined on the server, sorted.
    pub fn names(&self) -> Vec<String> {
        self.lock().peer.names().into_iter().map(str::to_string).collect()
    }

    /// Number of connections the server holds.
    pub fn connection_count(&self) -> usize {
        self.lock().peer.connection_count()
    }
}

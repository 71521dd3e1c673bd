//! Simulation driver implementing the Driver trait.
//!
//! `SimDriver` provides the same interface as the terminal driver but for
//! deterministic testing. It implements [`Driver`] so the same
//! [`wirechat_app::Runtime`] orchestration code runs in both production and
//! simulation.
//!
//! Connection notifications come from test injection or, when attached to a
//! [`SimNetwork`], from the simulated server. They are queued ahead of
//! operator input, modelling a network that is faster than typing.

#![allow(clippy::disallowed_types, reason = "Synchronous locking operations only")]

use std::{
    collections::{BTreeMap, BTreeSet, VecDeque},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use wirechat_app::{App, AppEvent, Driver, Endpoint, HandleId, KeyInput, LinkEvent};

use crate::{
    SimNetwork,
    invariants::{ClientSnapshot, InvariantRegistry},
};

/// Error type for simulation driver.
#[derive(Debug, Clone)]
pub struct SimDriverError(pub String);

impl std::fmt::Display for SimDriverError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SimDriverError: {}", self.0)
    }
}

impl std::error::Error for SimDriverError {}

/// Transport-side state of one simulated connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SimLinkState {
    Connecting,
    Open,
    Closed,
}

/// Shared state for event injection.
///
/// This allows injection from outside async contexts, and delivery from a
/// [`SimNetwork`] that several drivers share.
#[derive(Debug, Default)]
pub(crate) struct DriverState {
    input_events: VecDeque<AppEvent>,
    link_events: VecDeque<LinkEvent>,
    links: BTreeMap<HandleId, SimLinkState>,
    sent: Vec<(HandleId, String)>,
    close_requests: Vec<HandleId>,
    open_failures: VecDeque<String>,
    last_transcript: Option<Vec<String>>,
    renders: usize,
    stopped: bool,
}

impl DriverState {
    /// Deliver a transport notification the way a real link would: nothing
    /// arrives for a handle after it closed.
    pub(crate) fn deliver(&mut self, event: LinkEvent) {
        let handle = event.handle();
        match self.links.get(&handle) {
            Some(SimLinkState::Connecting | SimLinkState::Open) => self.enqueue(event),
            Some(SimLinkState::Closed) | None => {
                tracing::debug!(%handle, "dropping delivery for closed link");
            },
        }
    }

    /// Queue a notification, updating transport state for known handles.
    fn enqueue(&mut self, event: LinkEvent) {
        let handle = event.handle();
        let next = match (&event, self.links.get(&handle)) {
            (LinkEvent::Opened { .. }, Some(SimLinkState::Connecting)) => Some(SimLinkState::Open),
            (LinkEvent::Closed { .. }, Some(SimLinkState::Connecting | SimLinkState::Open)) => {
                Some(SimLinkState::Closed)
            },
            _ => None,
        };
        if let Some(next) = next {
            self.links.insert(handle, next);
        }
        self.link_events.push_back(event);
    }

    fn is_live(&self, handle: HandleId) -> bool {
        matches!(self.links.get(&handle), Some(SimLinkState::Connecting | SimLinkState::Open))
    }
}

/// Simulation driver for deterministic testing.
///
/// Implements [`Driver`] trait so the same [`wirechat_app::Runtime`]
/// orchestration code runs in both production TUI and simulation tests.
///
/// Clones share state, so a test can keep a probe after handing the driver
/// to a runtime.
#[derive(Clone)]
pub struct SimDriver {
    id: u64,
    state: Arc<Mutex<DriverState>>,
    network: Option<SimNetwork>,
    invariants: Option<Arc<InvariantRegistry>>,
}

impl Default for SimDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl SimDriver {
    /// Create a standalone simulation driver. Link notifications must be
    /// injected by the test.
    pub fn new() -> Self {
        Self { id: 0, state: Arc::default(), network: None, invariants: None }
    }

    /// Create a driver whose connections are served by `network`.
    pub fn connected_to(network: &SimNetwork) -> Self {
        let state = Arc::new(Mutex::new(DriverState::default()));
        let id = network.attach(Arc::clone(&state));
        Self { id, state, network: Some(network.clone()), invariants: None }
    }

    /// Enable invariant checking on every render.
    #[must_use]
    pub fn with_invariants(mut self, registry: InvariantRegistry) -> Self {
        self.invariants = Some(Arc::new(registry));
        self
    }

    /// Client identifier within its network (0 when standalone).
    pub fn id(&self) -> u64 {
        self.id
    }

    fn lock(&self) -> MutexGuard<'_, DriverState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Inject an `AppEvent` as operator input.
    pub fn inject_event(&self, event: AppEvent) {
        self.lock().input_events.push_back(event);
    }

    /// Inject a submitted line.
    pub fn inject_line(&self, line: &str) {
        self.inject_event(AppEvent::Line(line.to_string()));
    }

    /// Inject typed text followed by Enter.
    pub fn inject_typed(&self, text: &str) {
        let mut state = self.lock();
        state.input_events.extend(text.chars().map(|c| AppEvent::Key(KeyInput::Char(c))));
        state.input_events.push_back(AppEvent::Key(KeyInput::Enter));
    }

    /// Inject a tick event.
    pub fn inject_tick(&self) {
        self.inject_event(AppEvent::Tick);
    }

    /// Inject a link notification, ahead of operator input.
    ///
    /// Unlike network delivery this never drops the event, so tests can
    /// replay late notifications for handles that are already closed.
    pub fn inject_link(&self, event: LinkEvent) {
        self.lock().enqueue(event);
    }

    /// Make the next `open` fail during construction.
    pub fn fail_next_open(&self, reason: impl Into<String>) {
        self.lock().open_failures.push_back(reason.into());
    }

    /// Kill a link without queuing its close notification yet.
    pub fn sever(&self, handle: HandleId) {
        let mut state = self.lock();
        if state.is_live(handle) {
            state.links.insert(handle, SimLinkState::Closed);
        }
    }

    /// Take all captured outgoing lines.
    pub fn take_sent(&self) -> Vec<(HandleId, String)> {
        std::mem::take(&mut self.lock().sent)
    }

    /// Outgoing lines captured so far, without handles.
    pub fn sent_texts(&self) -> Vec<String> {
        self.lock().sent.iter().map(|(_, text)| text.clone()).collect()
    }

    /// Every `close` call received, in order.
    pub fn close_requests(&self) -> Vec<HandleId> {
        self.lock().close_requests.clone()
    }

    /// Handles the transport considers connecting or open.
    pub fn live_handles(&self) -> BTreeSet<HandleId> {
        let state = self.lock();
        state.links.keys().copied().filter(|h| state.is_live(*h)).collect()
    }

    /// Number of render calls.
    pub fn render_count(&self) -> usize {
        self.lock().renders
    }

    /// Whether `stop` was called.
    pub fn is_stopped(&self) -> bool {
        self.lock().stopped
    }

    /// Check if there are pending events to process.
    pub fn has_pending(&self) -> bool {
        let state = self.lock();
        !state.input_events.is_empty() || !state.link_events.is_empty()
    }

    /// Create a snapshot from App and transport state for invariant checking.
    pub fn snapshot(&self, app: &App) -> ClientSnapshot {
        let state = self.lock();
        let live = state.links.keys().copied().filter(|h| state.is_live(*h));
        let closing = state.link_events.iter().filter_map(|event| match event {
            LinkEvent::Closed { handle, .. } => Some(*handle),
            LinkEvent::Opened { .. } | LinkEvent::Received { .. } => None,
        });

        ClientSnapshot::from_app(self.id, app)
            .with_live_handles(live)
            .with_closing_handles(closing)
            .with_previous_transcript(state.last_transcript.clone())
    }

    /// Check invariants against App state.
    pub fn check_invariants(&self, app: &App, context: &str) {
        if let Some(ref registry) = self.invariants {
            let snapshot = crate::SystemSnapshot::single(self.snapshot(app));
            registry.assert_all(&snapshot, context);
        }
        self.lock().last_transcript = Some(app.transcript().lines().to_vec());
    }
}

impl Driver for SimDriver {
    type Error = SimDriverError;

    async fn poll_event(&mut self) -> Result<Option<AppEvent>, Self::Error> {
        let mut state = self.lock();

        if let Some(event) = state.link_events.pop_front() {
            return Ok(Some(AppEvent::Link(event)));
        }
        Ok(state.input_events.pop_front())
    }

    fn open(&mut self, handle: HandleId, endpoint: &Endpoint) -> Result<(), Self::Error> {
        {
            let mut state = self.lock();
            if let Some(reason) = state.open_failures.pop_front() {
                return Err(SimDriverError(reason));
            }
            if !matches!(endpoint.scheme(), "ws" | "wss") {
                return Err(SimDriverError(format!("unsupported scheme: {}", endpoint.scheme())));
            }
            state.links.insert(handle, SimLinkState::Connecting);
        }

        if let Some(network) = &self.network {
            network.open(self.id, handle);
        }
        Ok(())
    }

    async fn send(&mut self, handle: HandleId, text: String) -> Result<(), Self::Error> {
        {
            let mut state = self.lock();
            if state.links.get(&handle) != Some(&SimLinkState::Open) {
                return Err(SimDriverError(format!("{handle} is not open")));
            }
            state.sent.push((handle, text.clone()));
        }

        if let Some(network) = &self.network {
            network.send(self.id, handle, &text);
        }
        Ok(())
    }

    fn close(&mut self, handle: HandleId) {
        let was_live = {
            let mut state = self.lock();
            state.close_requests.push(handle);
            let was_live = state.is_live(handle);
            if was_live {
                state.links.insert(handle, SimLinkState::Closed);
            }
            was_live
        };

        if was_live && let Some(network) = &self.network {
            network.close(self.id, handle);
        }
    }

    fn is_open(&self, handle: HandleId) -> bool {
        self.lock().links.get(&handle) == Some(&SimLinkState::Open)
    }

    fn render(&mut self, app: &App) -> Result<(), Self::Error> {
        self.lock().renders += 1;
        self.check_invariants(app, "after render");
        Ok(())
    }

    fn stop(&mut self) {
        let live: Vec<_> = self.live_handles().into_iter().collect();
        for handle in live {
            self.close(handle);
        }
        self.lock().stopped = true;
    }
}

//! WebSocket transport for the client.
//!
//! Provides [`Link`], one WebSocket connection driven by its own task. This is
//! a thin layer that just moves text lines: opening, reading and closing are
//! reported as [`LinkEvent`]s on a channel supplied by the caller, so a single
//! consumer observes every notification in order. Session logic stays in the
//! application state machine.

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::{sync::mpsc, task::AbortHandle};
use tokio_tungstenite::{connect_async, tungstenite::Message};

use crate::{CloseCause, Endpoint, HandleId, LinkEvent};

/// Time allowed for the WebSocket handshake to complete.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Capacity of the outbound line queue.
pub const DEFAULT_OUTBOUND_CAPACITY: usize = 32;

/// Transport errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Endpoint scheme cannot be carried over WebSocket.
    #[error("unsupported scheme {scheme:?}, expected ws or wss")]
    UnsupportedScheme {
        /// Scheme of the rejected endpoint.
        scheme: String,
    },

    /// No async runtime is available to drive the connection.
    #[error("no async runtime available: {0}")]
    NoRuntime(String),

    /// Link is closed or its task has exited.
    #[error("link {0} is closed")]
    Closed(HandleId),
}

/// Transport configuration.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Timeout for the WebSocket handshake.
    pub connect_timeout: Duration,
    /// Outbound queue capacity per link.
    pub outbound_capacity: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            outbound_capacity: DEFAULT_OUTBOUND_CAPACITY,
        }
    }
}

/// Install the process-wide TLS crypto provider used for `wss` endpoints.
///
/// Safe to call more than once.
pub fn install_crypto_provider() {
    if rustls::crypto::ring::default_provider().install_default().is_err() {
        tracing::debug!("TLS crypto provider already installed");
    }
}

/// Commands from the link handle to its task.
#[derive(Debug)]
enum Outbound {
    Text(String),
    Close,
}

/// Handle to a single WebSocket connection.
///
/// Construction is synchronous and never blocks on the network: the
/// handshake runs on a spawned task which reports [`LinkEvent::Opened`] once
/// the connection is usable.
pub struct Link {
    handle: HandleId,
    to_task: mpsc::Sender<Outbound>,
    abort_handle: AbortHandle,
    closed: bool,
}

impl Link {
    /// Start connecting to `endpoint`, reporting progress on `events`.
    ///
    /// # Errors
    ///
    /// - [`TransportError::UnsupportedScheme`] if the endpoint is not `ws`/`wss`
    /// - [`TransportError::NoRuntime`] if called outside a tokio runtime
    pub fn open(
        handle: HandleId,
        endpoint: &Endpoint,
        config: &TransportConfig,
        events: mpsc::Sender<LinkEvent>,
    ) -> Result<Self, TransportError> {
        let scheme = endpoint.scheme();
        if scheme != "ws" && scheme != "wss" {
            return Err(TransportError::UnsupportedScheme { scheme: scheme.to_string() });
        }

        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| TransportError::NoRuntime(e.to_string()))?;

        let (to_task, from_handle) = mpsc::channel(config.outbound_capacity.max(1));
        let url = endpoint.as_str().to_string();
        let task = runtime.spawn(run_link(
            handle,
            url,
            config.connect_timeout,
            from_handle,
            events,
        ));

        tracing::debug!(%handle, %endpoint, "link opening");

        Ok(Self { handle, to_task, abort_handle: task.abort_handle(), closed: false })
    }

    /// Identifier of this connection.
    pub fn handle(&self) -> HandleId {
        self.handle
    }

    /// `true` until the link is closed locally or its task exits.
    pub fn is_live(&self) -> bool {
        !self.closed && !self.to_task.is_closed()
    }

    /// Queue a text line for the server.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Closed`] if the link is no longer live.
    pub async fn send(&self, text: String) -> Result<(), TransportError> {
        if self.closed {
            return Err(TransportError::Closed(self.handle));
        }
        self.to_task.send(Outbound::Text(text)).await.map_err(|_| TransportError::Closed(self.handle))
    }

    /// Close the connection. Idempotent.
    ///
    /// A link that is still connecting is abandoned. A locally closed link
    /// emits no further events.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;

        if self.to_task.try_send(Outbound::Close).is_err() {
            self.abort_handle.abort();
        }
        tracing::debug!(handle = %self.handle, "link closed locally");
    }
}

impl Drop for Link {
    fn drop(&mut self) {
        self.close();
    }
}

/// Deliver an event. Returns `false` once nobody is listening.
async fn emit(events: &mpsc::Sender<LinkEvent>, event: LinkEvent) -> bool {
    events.send(event).await.is_ok()
}

/// Drive one connection from handshake to close.
async fn run_link(
    handle: HandleId,
    url: String,
    connect_timeout: Duration,
    mut from_handle: mpsc::Receiver<Outbound>,
    events: mpsc::Sender<LinkEvent>,
) {
    // Nothing is queued before `Opened`, so any command here is a close.
    let connected = tokio::select! {
        result = tokio::time::timeout(connect_timeout, connect_async(url.as_str())) => result,
        _ = from_handle.recv() => {
            tracing::debug!(%handle, "closed while connecting");
            return;
        }
    };

    let mut socket = match connected {
        Ok(Ok((socket, _response))) => socket,
        Ok(Err(e)) => {
            tracing::warn!(%handle, %url, "connect failed: {e}");
            emit(&events, LinkEvent::Closed { handle, cause: CloseCause::Error(e.to_string()) })
                .await;
            return;
        },
        Err(_) => {
            tracing::warn!(%handle, %url, "connect timed out after {connect_timeout:?}");
            let reason = format!("connect timed out after {connect_timeout:?}");
            emit(&events, LinkEvent::Closed { handle, cause: CloseCause::Error(reason) }).await;
            return;
        },
    };

    tracing::info!(%handle, %url, "link open");
    if !emit(&events, LinkEvent::Opened { handle }).await {
        return;
    }

    loop {
        tokio::select! {
            incoming = socket.next() => {
                let event = match incoming {
                    Some(Ok(Message::Text(text))) => {
                        LinkEvent::Received { handle, text: text.as_str().to_owned() }
                    },
                    Some(Ok(Message::Binary(data))) => LinkEvent::Received {
                        handle,
                        text: String::from_utf8_lossy(&data).into_owned(),
                    },
                    Some(Ok(Message::Close(_))) | None => {
                        tracing::info!(%handle, "link closed by server");
                        emit(&events, LinkEvent::Closed { handle, cause: CloseCause::Remote }).await;
                        return;
                    },
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => {
                        tracing::warn!(%handle, "link read failed: {e}");
                        let cause = CloseCause::Error(e.to_string());
                        emit(&events, LinkEvent::Closed { handle, cause }).await;
                        return;
                    },
                };

                if !emit(&events, event).await {
                    return;
                }
            }

            command = from_handle.recv() => match command {
                Some(Outbound::Text(text)) => {
                    if let Err(e) = socket.send(Message::Text(text.into())).await {
                        tracing::warn!(%handle, "link write failed: {e}");
                        let cause = CloseCause::Error(e.to_string());
                        emit(&events, LinkEvent::Closed { handle, cause }).await;
                        return;
                    }
                },
                Some(Outbound::Close) | None => {
                    if let Err(e) = socket.close(None).await {
                        tracing::debug!(%handle, "close handshake failed: {e}");
                    }
                    return;
                },
            },
        }
    }
}

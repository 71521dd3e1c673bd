//! Driver trait for abstracting I/O operations.
//!
//! The [`Driver`] trait decouples the application runtime from specific I/O
//! implementations. Each frontend implements the trait to provide
//! platform-specific I/O, while the generic [`crate::Runtime`] handles all
//! orchestration.

use std::future::Future;

use wirechat_client::{Endpoint, HandleId};

use crate::{App, AppEvent};

/// Abstracts I/O operations for the application runtime.
///
/// Implementations provide platform-specific I/O while the generic
/// [`Runtime`](crate::Runtime) handles orchestration logic. This ensures
/// the same orchestration code runs in production TUI and simulation.
///
/// # Implementations
///
/// - **TUI**: Uses crossterm for terminal events, WebSocket links for transport
/// - **Simulation**: Scripted events and an in-memory peer
///
/// # Connection notifications
///
/// Connections report `Opened`, `Received` and `Closed` as
/// [`AppEvent::Link`] values from [`poll_event`](Driver::poll_event), tagged
/// with the handle they were opened under. A handle yields at most one
/// `Closed`, and none after [`close`](Driver::close).
pub trait Driver: Send {
    /// Platform-specific error type.
    type Error: std::error::Error + Send + 'static;

    /// Wait for the next event.
    ///
    /// Returns `None` once no further events will ever arrive.
    ///
    /// # Errors
    ///
    /// Returns an error if the event source fails.
    fn poll_event(&mut self) -> impl Future<Output = Result<Option<AppEvent>, Self::Error>> + Send;

    /// Start connecting to `endpoint` under `handle`.
    ///
    /// Returns once the attempt is underway. Success or failure of the
    /// connection itself is reported through events.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot even be constructed.
    fn open(&mut self, handle: HandleId, endpoint: &Endpoint) -> Result<(), Self::Error>;

    /// Send one text line over the connection with this handle.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection is not open.
    fn send(
        &mut self,
        handle: HandleId,
        text: String,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Close the connection with this handle. Unknown handles are ignored.
    fn close(&mut self, handle: HandleId);

    /// `true` if the connection with this handle can still carry lines.
    fn is_open(&self, handle: HandleId) -> bool;

    /// Render the application state.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering fails.
    fn render(&mut self, app: &App) -> Result<(), Self::Error>;

    /// Close every connection and clean up resources.
    fn stop(&mut self);
}

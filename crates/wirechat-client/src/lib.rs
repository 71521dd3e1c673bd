//! Client
//!
//! Protocol-facing building blocks for the wirechat client: validated server
//! endpoints, the line-oriented wire convention, and the notifications a
//! connection delivers back to the application.
//!
//! # Components
//!
//! - [`Endpoint`]: Validated absolute URL of the chat server
//! - [`ServerLine`]: Typed classification of a server text line
//! - [`HandleId`]: Identifier of one connection attempt
//! - [`LinkEvent`]: Notifications produced by a connection
//!
//! # Transport (optional)
//!
//! With the `transport` feature enabled, this crate also provides:
//! - [`transport::Link`]: A single WebSocket connection driven by a task
//! - [`transport::TransportConfig`]: Connection tuning

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod endpoint;
mod link;
mod protocol;

#[cfg(feature = "transport")]
pub mod transport;

pub use endpoint::{Endpoint, EndpointError};
pub use link::{CloseCause, HandleId, LinkEvent};
pub use protocol::{ERROR_PREFIX, ServerLine};

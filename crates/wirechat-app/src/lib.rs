//! Application layer for wirechat
//!
//! Pure state machine and generic runtime for the chat client's connection
//! lifecycle, enabling deterministic simulation testing with the same code
//! that runs in production.
//!
//! # Components
//!
//! - [`App`]: Connection controller (phases, handle ownership, transcript)
//! - [`Driver`]: Trait for platform-specific I/O abstraction
//! - [`Runtime`]: Generic orchestration loop using Driver
//!
//! # Lifecycle
//!
//! ```text
//!                  valid URL               acceptance reply
//! AwaitingEndpoint ────────> AwaitingIdentity ───────────────> Chatting
//!        ^                    │    ^                              │
//!        │                    │    └── ERROR: reply / setup fail  │
//!        └──── handle closed ─┴──────── handle closed / exit ─────┘
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod action;
mod app;
pub mod command;
mod config;
mod driver;
mod error;
mod event;
mod input;
mod runtime;
mod state;

pub use action::AppAction;
pub use app::{App, CLOSED_BY_SERVER_NOTICE, CLOSED_NOTICE};
pub use config::AppConfig;
pub use driver::Driver;
pub use error::ChatError;
pub use event::AppEvent;
pub use input::{InputLine, KeyInput};
pub use runtime::Runtime;
pub use state::{ActiveLink, LineKind, LinkState, Phase, Transcript};
pub use wirechat_client::{CloseCause, Endpoint, EndpointError, HandleId, LinkEvent};

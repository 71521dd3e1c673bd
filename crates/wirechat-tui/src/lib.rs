//! Terminal UI for wirechat
//!
//! A thin shell over [`wirechat_app::Driver`] that provides terminal and
//! WebSocket I/O. All lifecycle logic lives in the generic
//! [`wirechat_app::Runtime`].
//!
//! This crate only handles terminal rendering and connection plumbing.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod terminal;
pub mod ui;

pub use terminal::{TerminalDriver, TerminalError};
pub use wirechat_app::{App, AppAction, AppConfig, AppEvent, Driver, KeyInput, Runtime};

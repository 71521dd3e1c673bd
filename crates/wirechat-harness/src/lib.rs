//! Deterministic simulation harness for wirechat client testing.
//!
//! In-memory implementations of the [`wirechat_app::Driver`] trait and of the
//! chat server for deterministic, reproducible testing of the connection
//! lifecycle, including server rejections, remote closes and refused
//! connections.
//!
//! # Invariant Testing
//!
//! The `invariants` module provides behavioral testing through invariant
//! checks. Invariants verify WHAT must be true across all execution paths, not
//! specific scenarios. Use [`InvariantRegistry::standard()`] for the
//! connection lifecycle invariants.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod invariants;
pub mod scenario;
pub mod sim_driver;
pub mod sim_network;
pub mod sim_peer;

pub use invariants::{
    ChattingHasLiveLink, ClientSnapshot, Invariant, InvariantKind, InvariantRegistry,
    InvariantResult, PhaseConsistency, SingleLiveLink, SystemSnapshot, TranscriptAppendOnly,
    Violation,
};
pub use scenario::SimClient;
pub use sim_driver::{SimDriver, SimDriverError};
pub use sim_network::{FaultConfig, SimNetwork};
pub use sim_peer::{PeerId, PeerOutput, SHUTDOWN_NOTICE, SimPeer};

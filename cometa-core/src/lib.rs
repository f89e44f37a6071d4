//! Connection and messaging engine for the Cometa device client.
//!
//! Wires together the wire protocol (`cometa-protocol`) and the transport
//! layer into the stateful pieces: the ensemble selector, the three-step
//! handshake, and the long-lived session with its receive loop and
//! heartbeat loop.

pub mod auth;
pub mod ensemble;
pub mod handshake;
pub mod heartbeat;
pub mod receive_loop;
pub mod reconnect;
pub mod session;
pub mod transport;

pub use session::{Callback, Session};

//! # Cometa
//!
//! Device-side client for the Cometa cloud relay: subscribes a device to an
//! application, exchanges messages over a long-lived connection, and keeps
//! that connection alive across relay restarts and transient network loss.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! # async fn example() -> Result<(), cometa_common::error::ReplyCode> {
//! cometa::init("dev-1", "dev-key-1", None)?;
//!
//! let session = cometa::Client::builder()
//!     .app_name("my_app")
//!     .app_key("my_app_key")
//!     .subscribe()
//!     .await?;
//!
//! session
//!     .bind_callback(Some(std::sync::Arc::new(|msg: &[u8]| {
//!         Some(format!("got {} bytes", msg.len()).into_bytes())
//!     })))
//!     .await;
//!
//! session.send(b"hello").await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`cometa_common`] — shared config, constants, and error types.
//! - [`cometa_protocol`] — the chunked-transfer wire codec and the HTTP/1
//!   response reader used during the handshake.
//! - [`cometa_core`] — ensemble selection, the handshake, and the session's
//!   receive/heartbeat loops.
//! - This crate — [`init`], [`Client`], and the [`cometa_core::session::Session`]
//!   handle re-exported as [`Session`].

pub mod client;
pub mod config;
mod device;

pub use client::{Client, ClientBuilder};
pub use cometa_common::config::{AppServerConfig, TlsConfig, TransportConfig};
pub use cometa_common::error::{CometaError, ReplyCode, Result};
pub use cometa_core::session::{Callback, Session};
pub use device::init;

/// Commonly used types, for `use cometa::prelude::*;`.
pub mod prelude {
    pub use crate::{Client, ReplyCode, Session};
}

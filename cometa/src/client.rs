//! Builder-driven client for subscribing a device to the relay.
//!
//! # Example
//!
//! ```rust,no_run
//! # async fn example() -> Result<(), cometa_common::error::ReplyCode> {
//! cometa::init("dev-1", "dev-key-1", Some("linux_client".into()))?;
//!
//! let session = cometa::Client::builder()
//!     .app_name("my_app")
//!     .app_key("my_app_key")
//!     .subscribe()
//!     .await?;
//!
//! session.send(b"hello").await?;
//! # Ok(())
//! # }
//! ```

use crate::config::ClientConfig;
use crate::device;
use cometa_common::config::{AppServerConfig, TransportConfig};
use cometa_common::error::ReplyCode;
use cometa_core::session::Session;
use std::sync::Arc;

/// Entry point for subscribing the process-wide device to the relay.
///
/// [`cometa::init`](crate::init) must have been called first.
#[derive(Debug, Default)]
pub struct Client;

/// Builder for a subscription, collecting the `subscribe` parameters.
#[derive(Debug, Default)]
pub struct ClientBuilder {
    config: ClientConfig,
}

impl Client {
    /// Start building a subscription.
    #[must_use]
    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }
}

impl ClientBuilder {
    /// Set the application name registered with the relay.
    #[must_use]
    pub fn app_name(mut self, name: impl Into<String>) -> Self {
        self.config.app_name = name.into();
        self
    }

    /// Set the application key.
    #[must_use]
    pub fn app_key(mut self, key: impl Into<String>) -> Self {
        self.config.app_key = key.into();
        self
    }

    /// Enable two-way authentication mode against the given app server.
    ///
    /// When unset, the device subscribes in one-way mode: handshake step 2
    /// is skipped entirely.
    #[must_use]
    pub fn app_server(
        mut self,
        name: impl Into<String>,
        port: u16,
        auth_endpoint: impl Into<String>,
    ) -> Self {
        self.config.app_server = Some(AppServerConfig {
            name: name.into(),
            port,
            auth_endpoint: auth_endpoint.into(),
        });
        self
    }

    /// Use TLS-over-TCP for the relay connection instead of plain TCP.
    #[must_use]
    pub fn transport(mut self, transport: TransportConfig) -> Self {
        self.config.transport = transport;
        self
    }

    /// Override the relay port (defaults to the transport's standard port).
    #[must_use]
    pub fn relay_port(mut self, port: u16) -> Self {
        self.config.relay_port = Some(port);
        self
    }

    /// Runs the handshake and starts the session's receive and heartbeat
    /// loops, returning a live [`Session`].
    ///
    /// # Errors
    ///
    /// Returns [`ReplyCode::ParError`] if [`crate::init`] hasn't been called
    /// or required fields are missing; otherwise maps handshake/connection
    /// failures the same way [`Session::last_error`] would.
    pub async fn subscribe(self) -> Result<Arc<Session>, ReplyCode> {
        self.config.validate().map_err(|_| ReplyCode::ParError)?;
        let identity = device::identity()?.clone();
        let relay_port = self.config.resolved_relay_port();
        let transport = self.config.transport.clone();
        let subscribe = self.config.into_subscribe_config();

        Session::subscribe(identity, subscribe, transport, relay_port)
            .await
            .map_err(ReplyCode::from)
    }
}

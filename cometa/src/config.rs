//! Configuration types for the Cometa device client.
//!
//! [`ClientConfig`] is the caller-facing counterpart of
//! `cometa_common::config::SubscribeConfig`: it carries everything
//! [`crate::ClientBuilder`] needs to assemble a subscription, plus the
//! transport and port selection left up to the caller.

use cometa_common::config::{AppServerConfig, SubscribeConfig, TransportConfig};
use cometa_common::constants::{PORT_HTTP, PORT_TLS};
use cometa_common::error::{CometaError, Result};

/// Configuration for [`crate::Client`].
///
/// Use [`crate::ClientBuilder`] for ergonomic construction.
#[derive(Debug, Clone, Default)]
pub struct ClientConfig {
    /// Application name registered with the relay.
    pub app_name: String,
    /// Application key.
    pub app_key: String,
    /// App-server triple; present only in two-way authentication mode.
    pub app_server: Option<AppServerConfig>,
    /// Plain TCP or TLS-over-TCP.
    pub transport: TransportConfig,
    /// Relay port. Defaults to [`PORT_HTTP`] for plain TCP and [`PORT_TLS`]
    /// for TLS when left unset.
    pub relay_port: Option<u16>,
}

impl ClientConfig {
    /// Validate the configuration, matching `cometa_subscribe`'s rules.
    pub fn validate(&self) -> Result<()> {
        if self.app_name.is_empty() {
            return Err(CometaError::Parameter("app_name is required".into()));
        }
        if self.app_key.is_empty() {
            return Err(CometaError::Parameter("app_key is required".into()));
        }
        Ok(())
    }

    /// The relay port to use: the caller's override, or the transport's
    /// default.
    #[must_use]
    pub fn resolved_relay_port(&self) -> u16 {
        self.relay_port.unwrap_or(match self.transport {
            TransportConfig::Tcp => PORT_HTTP,
            TransportConfig::Tls(_) => PORT_TLS,
        })
    }

    pub(crate) fn into_subscribe_config(self) -> SubscribeConfig {
        SubscribeConfig {
            app_name: self.app_name,
            app_key: self.app_key,
            app_server: self.app_server,
        }
    }
}

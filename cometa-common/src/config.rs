//! Configuration types for the Cometa device client.

use crate::constants::{DEFAULT_HEARTBEAT_SECS, DEVICE_ID_LEN, DEVICE_KEY_LEN, PLATFORM_LEN};
use crate::error::{CometaError, Result};
use std::path::PathBuf;

/// The device's identity and credentials, set once at `init` time and
/// immutable for the life of the process (spec §3, invariant (c)).
#[derive(Debug, Clone)]
pub struct DeviceIdentity {
    /// Device id (≤ 32 bytes).
    pub device_id: String,
    /// Device key (≤ 32 bytes).
    pub device_key: String,
    /// Optional platform description (≤ 64 bytes).
    pub platform: Option<String>,
}

impl DeviceIdentity {
    /// Build and validate a new identity, matching `cometa_init`'s rules:
    /// both id and key are required and length-capped; platform is optional.
    pub fn new(
        device_id: impl Into<String>,
        device_key: impl Into<String>,
        platform: Option<String>,
    ) -> Result<Self> {
        let device_id = device_id.into();
        let device_key = device_key.into();

        if device_id.is_empty() || device_id.len() > DEVICE_ID_LEN {
            return Err(CometaError::Parameter(format!(
                "device_id must be 1-{DEVICE_ID_LEN} bytes, got {}",
                device_id.len()
            )));
        }
        if device_key.is_empty() || device_key.len() > DEVICE_KEY_LEN {
            return Err(CometaError::Parameter(format!(
                "device_key must be 1-{DEVICE_KEY_LEN} bytes, got {}",
                device_key.len()
            )));
        }
        if let Some(ref p) = platform {
            if p.len() > PLATFORM_LEN {
                return Err(CometaError::Parameter(format!(
                    "platform must be at most {PLATFORM_LEN} bytes, got {}",
                    p.len()
                )));
            }
        }

        Ok(Self {
            device_id,
            device_key,
            platform,
        })
    }
}

/// The app-server triple used in two-way authentication mode (spec §4.4).
/// All three fields are required together; the device runs in one-way mode
/// (skipping handshake step 2) only when the caller supplies none of them.
#[derive(Debug, Clone)]
pub struct AppServerConfig {
    /// App-server hostname or IP.
    pub name: String,
    /// App-server port.
    pub port: u16,
    /// Path of the authentication endpoint on the app server.
    pub auth_endpoint: String,
}

/// The caller-supplied subscription parameters.
#[derive(Debug, Clone)]
pub struct SubscribeConfig {
    /// Application name registered with the relay.
    pub app_name: String,
    /// Application key.
    pub app_key: String,
    /// App-server triple, if running in two-way authentication mode.
    pub app_server: Option<AppServerConfig>,
}

impl SubscribeConfig {
    /// `true` when the app-server triple is present (two-way mode).
    pub fn is_two_way(&self) -> bool {
        self.app_server.is_some()
    }
}

/// TLS configuration for the relay connection.
#[derive(Debug, Clone, Default)]
pub struct TlsConfig {
    /// Path to a CA bundle to trust in addition to the system store.
    /// Defaults to `rootcert.pem` in the working directory when unset.
    pub ca_bundle_path: Option<PathBuf>,
}

/// Transport selection for the relay connection.
#[derive(Debug, Clone, Default)]
pub enum TransportConfig {
    /// Plain TCP, no encryption.
    #[default]
    Tcp,
    /// TLS over TCP, verified against `CERT_VERIFY_HOST`.
    Tls(TlsConfig),
}

/// Heartbeat timing, negotiated during the handshake (spec §4.4, Open
/// Question (a)): starts at the default and is overwritten once the relay's
/// step-3 response is parsed.
#[derive(Debug, Clone, Copy)]
pub struct HeartbeatConfig {
    /// Heartbeat period in seconds.
    pub period_secs: u64,
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self {
            period_secs: DEFAULT_HEARTBEAT_SECS,
        }
    }
}

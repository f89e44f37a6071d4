//! Common types, errors and configuration for the Cometa device client.

pub mod config;
pub mod constants;
pub mod error;

pub use config::{
    AppServerConfig, DeviceIdentity, HeartbeatConfig, SubscribeConfig, TlsConfig, TransportConfig,
};
pub use constants::{
    API_HOST, CA_BUNDLE_FILE, CERT_VERIFY_HOST, DEFAULT_HEARTBEAT_SECS, DEVICE_ID_LEN,
    DEVICE_KEY_LEN, ENSEMBLE_HOST, HEARTBEAT_BYTE, MAX_SEND_LEN, MESSAGE_LEN, PLATFORM_LEN,
    PORT_HTTP, PORT_LEGACY, PORT_TLS, UPSTREAM_MARKER,
};
pub use error::{CometaError, ReplyCode, Result};

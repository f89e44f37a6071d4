//! Protocol hosts, ports, and size limits for the Cometa relay.
//!
//! Use these constants instead of magic numbers so defaults stay consistent
//! across the core library and the example device program.

/// DNS name for the relay ensemble; resolves to every relay instance.
pub const ENSEMBLE_HOST: &str = "ensemble.cometa.io";

/// `Host` header value sent on every handshake request (relay and app
/// server alike; this is a logical identity, not a DNS name to connect to).
pub const API_HOST: &str = "api.cometa.io";

/// Fixed hostname verified against the TLS peer certificate. Deliberately
/// independent of the ensemble member's IP: ensemble members are chosen by
/// address, but certificate identity is a logical service name.
pub const CERT_VERIFY_HOST: &str = "service.cometa.io";

/// Legacy plaintext relay port.
pub const PORT_LEGACY: u16 = 7007;

/// Current plaintext relay port.
pub const PORT_HTTP: u16 = 80;

/// TLS relay port. (The original C source has a `"433"` typo; 443 is correct.)
pub const PORT_TLS: u16 = 443;

/// Default location of the bundled CA file, relative to the process's
/// working directory.
pub const CA_BUNDLE_FILE: &str = "rootcert.pem";

/// Maximum size of the send/receive buffer, and the basis for the maximum
/// user payload (`MESSAGE_LEN - 12`).
pub const MESSAGE_LEN: usize = 32768;

/// Maximum payload a caller may hand to `send`.
pub const MAX_SEND_LEN: usize = MESSAGE_LEN - 12;

/// Maximum length of a device id, in bytes.
pub const DEVICE_ID_LEN: usize = 32;

/// Maximum length of a device key, in bytes.
pub const DEVICE_KEY_LEN: usize = 32;

/// Maximum length of the platform string, in bytes.
pub const PLATFORM_LEN: usize = 64;

/// Default heartbeat period in seconds, used until the relay's step-3
/// response supplies one.
pub const DEFAULT_HEARTBEAT_SECS: u64 = 60;

/// One-byte heartbeat payload sent by the device.
pub const HEARTBEAT_BYTE: u8 = 0x06;

/// One-byte marker prepended to upstream, non-response device messages.
pub const UPSTREAM_MARKER: u8 = 0x07;

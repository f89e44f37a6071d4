//! Process-wide device identity.
//!
//! The C source keeps a single mutable global `device` struct, set once by
//! `cometa_init` and read by every subsequent call. `once_cell::sync::OnceCell`
//! gives the same "write-once, read-many, no process-global mutable state"
//! shape without a raw global or a lock on the read path.

use cometa_common::config::DeviceIdentity;
use cometa_common::error::ReplyCode;
use once_cell::sync::OnceCell;

static DEVICE: OnceCell<DeviceIdentity> = OnceCell::new();

/// Sets the process-wide device identity. Argument order: device id,
/// then device key, then the optional platform string.
///
/// May be called at most once per process; a second call returns
/// [`ReplyCode::ParError`], matching `cometa_init`'s "already initialized"
/// rejection.
///
/// The broken-pipe policy the C source installs here (`libc::signal(SIGPIPE,
/// SIG_IGN)`) has no Rust counterpart to install: the standard runtime
/// already ignores `SIGPIPE` before `main` runs (see
/// `cometa_core::transport`'s module doc for the full rationale), so there
/// is nothing left for `init` to do on that front.
pub fn init(
    device_id: impl Into<String>,
    device_key: impl Into<String>,
    platform: Option<String>,
) -> Result<(), ReplyCode> {
    let identity =
        DeviceIdentity::new(device_id, device_key, platform).map_err(|_| ReplyCode::ParError)?;
    DEVICE.set(identity).map_err(|_| ReplyCode::ParError)
}

/// Returns the process-wide identity, or `ReplyCode::ParError` if `init`
/// hasn't been called yet.
pub(crate) fn identity() -> Result<&'static DeviceIdentity, ReplyCode> {
    DEVICE.get().ok_or(ReplyCode::ParError)
}

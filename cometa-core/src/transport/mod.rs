//! Transport layer: plain TCP or TLS-over-TCP byte streams to the relay.
//!
//! The process-wide broken-pipe policy — a write to a peer that has reset
//! the connection must return an error, not kill the process — is a no-op
//! here: Rust's standard runtime already
//! installs `SIG_IGN` for `SIGPIPE` before `main` runs, so writes to a
//! closed socket surface as `io::Error` the normal way. There's nothing to
//! configure, and reinstalling the handler via `libc::signal` would need
//! `unsafe`, which this workspace's lints forbid for behavior we already
//! have for free.

pub mod socket_tuning;
pub mod tcp;
pub mod tls;

use cometa_common::config::TransportConfig;
use std::io;
use std::net::SocketAddr;
use std::pin::Pin;
use tokio::io::{AsyncRead, AsyncWrite};

/// A connected byte stream to the relay, either plain TCP or TLS-over-TCP.
pub trait AsyncStream: AsyncRead + AsyncWrite + Send + Unpin {}
impl<T: AsyncRead + AsyncWrite + Send + Unpin> AsyncStream for T {}

pub type BoxedStream = Pin<Box<dyn AsyncStream>>;

/// Connects to `addr` using the transport selected by `config`.
pub async fn connect(config: &TransportConfig, addr: SocketAddr) -> io::Result<BoxedStream> {
    match config {
        TransportConfig::Tcp => tcp::connect(addr).await,
        TransportConfig::Tls(tls_config) => tls::connect(addr, tls_config).await,
    }
}

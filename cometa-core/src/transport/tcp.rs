//! Plain TCP transport.

use super::socket_tuning::configure_socket_silent;
use super::BoxedStream;
use std::io;
use std::net::SocketAddr;
use tokio::net::TcpStream;

/// Connects to `addr` over plain TCP, applying the same socket tuning as
/// the TLS path.
pub async fn connect(addr: SocketAddr) -> io::Result<BoxedStream> {
    let stream = TcpStream::connect(addr).await?;
    configure_socket_silent(&stream);
    Ok(Box::pin(stream))
}

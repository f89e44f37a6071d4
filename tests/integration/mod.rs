#![allow(clippy::unwrap_used, clippy::expect_used)]

//! End-to-end scenarios against a mock relay and a mock application server.
//! These exercise the same paths `cometa-cli` drives, two layers down: the
//! handshake directly (bypassing ensemble DNS, which isn't reachable in a
//! test sandbox) and full sessions against a loopback-bound single-member
//! mock ensemble.
//!
//! Both mocks are built on plain `tokio::net::TcpListener` and speak only
//! as much HTTP/1 and chunked framing as the handshake needs, by hand.

mod handshake_test;
mod parameter_test;
mod reconnect_test;

use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::net::SocketAddr;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// Binds a fresh loopback listener on an OS-assigned port.
pub async fn bind_loopback() -> (TcpListener, SocketAddr) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind loopback listener");
    let addr = listener.local_addr().expect("listener local_addr");
    (listener, addr)
}

/// Reads bytes off `stream` until the request headers are complete. Returns
/// the raw head text; callers that need the query string parse it by hand,
/// the same way the relay and app server would see an identical request.
pub async fn read_request_head(stream: &mut TcpStream) -> String {
    let mut buf = Vec::with_capacity(512);
    loop {
        let mut chunk = [0u8; 512];
        let n = stream.read(&mut chunk).await.expect("read request head");
        assert!(n > 0, "connection closed before the request head completed");
        buf.extend_from_slice(&chunk[..n]);
        if buf.windows(4).any(|w| w == b"\r\n\r\n") {
            break;
        }
    }
    String::from_utf8(buf).expect("request head is valid utf-8")
}

/// Writes a plain (non-chunked) HTTP/1 response: status line, a
/// `Content-Length` header sized to `body`, then the body.
pub async fn write_http_response(stream: &mut TcpStream, status_line: &str, body: &str) {
    let response = format!(
        "HTTP/1.1 {status_line}\r\nContent-Length: {}\r\n\r\n{body}",
        body.len()
    );
    stream
        .write_all(response.as_bytes())
        .await
        .expect("write http response");
}

/// Writes one chunked-transfer frame in `cometa_protocol::ChunkCodec`'s
/// wire format: `<hex-len>\r\n<payload>\r\n`.
pub async fn write_chunk_frame(stream: &mut TcpStream, payload: &[u8]) {
    let head = format!("{:x}\r\n", payload.len());
    stream
        .write_all(head.as_bytes())
        .await
        .expect("write chunk head");
    stream
        .write_all(payload)
        .await
        .expect("write chunk payload");
    stream
        .write_all(b"\r\n")
        .await
        .expect("write chunk trailer");
}

/// Reads one chunked-transfer frame off `stream` in the same format, for
/// mocks that need to observe the device's step-3 signature submit.
pub async fn read_chunk_frame(stream: &mut TcpStream) -> Vec<u8> {
    let mut len_line = Vec::new();
    loop {
        let mut byte = [0u8; 1];
        stream
            .read_exact(&mut byte)
            .await
            .expect("read chunk length byte");
        if byte[0] == b'\n' {
            break;
        }
        if byte[0] != b'\r' {
            len_line.push(byte[0]);
        }
    }
    let text = std::str::from_utf8(&len_line).expect("chunk length is utf-8");
    let len = usize::from_str_radix(text.trim(), 16).expect("chunk length is valid hex");
    let mut payload = vec![0u8; len];
    stream
        .read_exact(&mut payload)
        .await
        .expect("read chunk payload");
    let mut trailer = [0u8; 2];
    stream
        .read_exact(&mut trailer)
        .await
        .expect("read chunk trailer");
    payload
}

/// Relay side of handshake step 1: reads the subscribe request and replies
/// with a one-line plain-text challenge. Returns the request head, for
/// callers that want to assert on the query string.
pub async fn relay_subscribe_step(stream: &mut TcpStream, challenge: &str) -> String {
    let head = read_request_head(stream).await;
    write_http_response(stream, "200 OK", &format!("ok\n{challenge}")).await;
    head
}

/// App-server side of handshake step 2 on the success path: computes a
/// real HMAC-SHA256 signature over the challenge and replies with the
/// success body shape.
pub async fn app_server_auth_step(
    stream: &mut TcpStream,
    app_key: &str,
    app_secret: &[u8],
    challenge: &str,
) -> String {
    let _head = read_request_head(stream).await;
    let mut mac = Hmac::<Sha256>::new_from_slice(app_secret).expect("hmac accepts any key length");
    mac.update(challenge.as_bytes());
    let digest = hex::encode(mac.finalize().into_bytes());
    let signature = format!("{app_key}:{digest}");
    let body = format!(r#"{{"response":200,"signature":"{signature}"}}"#);
    write_http_response(stream, "200 OK", &body).await;
    signature
}

/// App-server side of handshake step 2 on the key-mismatch path (the
/// sentinel rejection string).
pub async fn app_server_key_mismatch_step(stream: &mut TcpStream) {
    let _head = read_request_head(stream).await;
    let body = r#"{"response":403,"signature":"Application key mismatch."}"#;
    write_http_response(stream, "200 OK", body).await;
}

/// Relay side of a one-way handshake's step 3: no signature to read, just
/// the final chunked result frame.
pub async fn relay_finish_one_way(stream: &mut TcpStream, heartbeat_secs: u64) {
    let body = format!(r#"{{"status":"200","heartbeat":"{heartbeat_secs}"}}"#);
    write_chunk_frame(stream, body.as_bytes()).await;
}

/// Relay side of a two-way handshake's step 3: reads the device's signature
/// submit frame, then sends the final chunked result frame. Returns the
/// signature it observed.
pub async fn relay_finish_two_way(stream: &mut TcpStream, heartbeat_secs: u64) -> Vec<u8> {
    let signature = read_chunk_frame(stream).await;
    relay_finish_one_way(stream, heartbeat_secs).await;
    signature
}

/// Relay side of a rejected handshake: the step-3 result body contains
/// `"403"`.
pub async fn relay_finish_rejected(stream: &mut TcpStream) {
    write_chunk_frame(stream, b"403 Forbidden").await;
}

/// Accepts `cometa_core::ensemble::select_fastest`'s probe connection (no
/// data exchanged, dropped immediately) followed by the real handshake
/// connection `transport::connect` opens against the winning candidate.
/// Every `Session::subscribe_for_test` call or reconnect against a
/// single-member mock ensemble produces exactly this pair.
pub async fn accept_after_probe(listener: &TcpListener) -> TcpStream {
    let (probe, _) = listener.accept().await.expect("accept ensemble probe");
    drop(probe);
    let (stream, _) = listener.accept().await.expect("accept handshake connection");
    stream
}

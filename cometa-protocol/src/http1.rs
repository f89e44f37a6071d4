//! Incremental HTTP/1 response reader used during the relay/app-server
//! handshake. The relay's handshake responses are plain, non-chunked
//! HTTP: read until headers are complete, then read the body per
//! `Content-Length`.

use std::io;
use tokio::io::{AsyncRead, AsyncReadExt};

/// A fully parsed HTTP/1 response: status code and body bytes.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

/// Reads one HTTP/1 response off `stream`, parsing headers incrementally
/// with `httparse` and then reading the body per `Content-Length` (defaults
/// to 0 when absent, matching the relay's short status-only replies).
pub async fn read_response<S>(stream: &mut S) -> io::Result<HttpResponse>
where
    S: AsyncRead + Unpin,
{
    let mut buf = Vec::with_capacity(1024);
    let (status, headers_end, content_length) = loop {
        let mut chunk = [0u8; 1024];
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "connection closed before headers completed",
            ));
        }
        buf.extend_from_slice(&chunk[..n]);

        let mut headers_storage = [httparse::EMPTY_HEADER; 32];
        let mut resp = httparse::Response::new(&mut headers_storage);
        match resp
            .parse(&buf)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, format!("bad HTTP response: {e}")))?
        {
            httparse::Status::Complete(headers_end) => {
                let status = resp.code.ok_or_else(|| {
                    io::Error::new(io::ErrorKind::InvalidData, "HTTP response missing status")
                })?;
                let content_length = resp
                    .headers
                    .iter()
                    .find(|h| h.name.eq_ignore_ascii_case("content-length"))
                    .and_then(|h| std::str::from_utf8(h.value).ok())
                    .and_then(|v| v.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                break (status, headers_end, content_length);
            }
            httparse::Status::Partial => continue,
        }
    };

    let mut body = buf.split_off(headers_end);
    while body.len() < content_length {
        let mut chunk = [0u8; 1024];
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        body.extend_from_slice(&chunk[..n]);
    }
    body.truncate(content_length);

    Ok(HttpResponse { status, body })
}

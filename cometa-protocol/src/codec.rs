//! HTTP/1.1 chunked-transfer framing, repurposed for full-duplex device
//! messaging over one persistent connection.
//!
//! Wire format: `<hex-length>\r\n<payload>\r\n`, hex length lowercase and
//! without leading zeros (matching printf `%x`). The heartbeat is the one
//! exception: the legacy, LF-terminated two-byte form `"2\n\x06\n"`. The
//! upstream marker (`0x07`) is part of the payload, not the framing — it
//! counts toward the hex length.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use cometa_common::constants::{HEARTBEAT_BYTE, MESSAGE_LEN, UPSTREAM_MARKER};
use std::io;
use tokio_util::codec::{Decoder, Encoder};

/// The legacy heartbeat frame: length "2", LF, the heartbeat byte, LF.
const HEARTBEAT_FRAME: &[u8] = b"2\n\x06\n";

/// Frames the device writes to the relay.
#[derive(Debug, Clone)]
pub enum OutgoingChunk {
    /// The legacy LF-terminated heartbeat frame.
    Heartbeat,
    /// A response to a relay-initiated request. Carries no upstream marker.
    Response(Bytes),
    /// A device-originated message that is not a response to a request.
    /// Framed with the `0x07` upstream marker prepended to the payload.
    Upstream(Bytes),
}

#[derive(Debug, Clone)]
enum DecodeState {
    /// Waiting for the length line, terminated by the first LF.
    LenLine,
    /// Waiting for `len` bytes of payload.
    Body { len: usize },
    /// Body consumed; waiting for the trailing CRLF/LF. Oversized frames
    /// carry no payload here — they are drained but never delivered (the
    /// fixed oversized-frame handling: always drain the declared length so
    /// the connection never desyncs).
    Trailer { payload: Option<Bytes> },
}

impl Default for DecodeState {
    fn default() -> Self {
        DecodeState::LenLine
    }
}

/// Decodes inbound chunks into raw payload bytes; encodes outbound chunks
/// from [`OutgoingChunk`]s. One instance per session, wrapping the raw
/// transport stream in a `tokio_util::codec::Framed`.
#[derive(Debug, Clone, Default)]
pub struct ChunkCodec {
    state: DecodeState,
}

impl ChunkCodec {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Decoder for ChunkCodec {
    type Item = Bytes;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Bytes>, io::Error> {
        loop {
            match &self.state {
                DecodeState::LenLine => {
                    let Some(nl) = src.iter().position(|&b| b == b'\n') else {
                        return Ok(None);
                    };
                    let line = src.split_to(nl + 1);
                    let trimmed = trim_line_ending(&line[..line.len() - 1]);
                    let text = std::str::from_utf8(trimmed).map_err(|_| {
                        io::Error::new(io::ErrorKind::InvalidData, "chunk length not valid utf-8")
                    })?;
                    let len = usize::from_str_radix(text.trim(), 16).map_err(|_| {
                        io::Error::new(
                            io::ErrorKind::InvalidData,
                            format!("chunk length not valid hex: {text:?}"),
                        )
                    })?;
                    if len > MESSAGE_LEN {
                        tracing::warn!(len, max = MESSAGE_LEN, "oversized chunk, skipping");
                    }
                    self.state = DecodeState::Body { len };
                }
                DecodeState::Body { len } => {
                    let len = *len;
                    if src.len() < len {
                        src.reserve(len - src.len());
                        return Ok(None);
                    }
                    let body = src.split_to(len);
                    let payload = (len <= MESSAGE_LEN).then(|| body.freeze());
                    self.state = DecodeState::Trailer { payload };
                }
                DecodeState::Trailer { .. } => {
                    let Some(consumed) = try_consume_trailer(src) else {
                        return Ok(None);
                    };
                    if !consumed {
                        return Err(io::Error::new(
                            io::ErrorKind::InvalidData,
                            "chunk missing trailing LF",
                        ));
                    }
                    let DecodeState::Trailer { payload } =
                        std::mem::replace(&mut self.state, DecodeState::LenLine)
                    else {
                        unreachable!()
                    };
                    if let Some(payload) = payload {
                        return Ok(Some(payload));
                    }
                    // Oversized frame drained; resume reading the next one.
                }
            }
        }
    }
}

/// Strips a trailing `\r` from a length-line slice that has already had its
/// terminating `\n` removed.
fn trim_line_ending(line: &[u8]) -> &[u8] {
    if let Some((&b'\r', rest)) = line.split_last() {
        rest
    } else {
        line
    }
}

/// Consumes the trailing CRLF or LF after a chunk body. Returns `None` if
/// more data is needed, `Some(false)` if not yet fully present (unreachable
/// given the single-byte lookahead below, kept for clarity), `Some(true)`
/// once the trailer has been consumed.
fn try_consume_trailer(src: &mut BytesMut) -> Option<bool> {
    if src.is_empty() {
        return None;
    }
    if src[0] == b'\r' {
        if src.len() < 2 {
            return None;
        }
        if src[1] != b'\n' {
            return Some(false);
        }
        src.advance(2);
        return Some(true);
    }
    if src[0] == b'\n' {
        src.advance(1);
        return Some(true);
    }
    Some(false)
}

impl Encoder<OutgoingChunk> for ChunkCodec {
    type Error = io::Error;

    fn encode(&mut self, chunk: OutgoingChunk, dst: &mut BytesMut) -> Result<(), io::Error> {
        match chunk {
            OutgoingChunk::Heartbeat => {
                debug_assert_eq!(HEARTBEAT_FRAME[2], HEARTBEAT_BYTE);
                dst.reserve(HEARTBEAT_FRAME.len());
                dst.extend_from_slice(HEARTBEAT_FRAME);
            }
            OutgoingChunk::Response(payload) => write_chunk(dst, &payload),
            OutgoingChunk::Upstream(payload) => {
                dst.reserve(payload.len() + 1 + 16);
                let hex_len = format!("{:x}", payload.len() + 1);
                dst.extend_from_slice(hex_len.as_bytes());
                dst.extend_from_slice(b"\r\n");
                dst.put_u8(UPSTREAM_MARKER);
                dst.extend_from_slice(&payload);
                dst.extend_from_slice(b"\r\n");
            }
        }
        Ok(())
    }
}

fn write_chunk(dst: &mut BytesMut, payload: &[u8]) {
    dst.reserve(payload.len() + 16);
    let hex_len = format!("{:x}", payload.len());
    dst.extend_from_slice(hex_len.as_bytes());
    dst.extend_from_slice(b"\r\n");
    dst.extend_from_slice(payload);
    dst.extend_from_slice(b"\r\n");
}

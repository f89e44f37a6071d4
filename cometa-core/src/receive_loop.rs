//! The per-session dispatch loop.
//!
//! `ChunkCodec::decode` already implements the framing state machine
//! (length line, body, trailer); this loop is what happens once a full
//! payload comes out of it: hand it to the bound callback, then write
//! whatever the callback returns (or an empty body, if nothing is bound)
//! back as the response.

use crate::session::Session;
use cometa_common::error::ReplyCode;
use cometa_protocol::{ChunkCodec, OutgoingChunk};
use futures::stream::SplitStream;
use futures::{SinkExt, StreamExt};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::codec::Framed;

use crate::transport::BoxedStream;

type ReadHalf = SplitStream<Framed<BoxedStream, ChunkCodec>>;

/// Reads relay-initiated messages until the connection ends, dispatching
/// each to the bound callback and writing its response. On disconnect this
/// loop just marks the session and returns; reconnection is the heartbeat
/// loop's job, not this one's.
pub(crate) async fn run(session: Arc<Session>, mut read_half: ReadHalf) {
    loop {
        let payload = match read_half.next().await {
            Some(Ok(payload)) => payload,
            Some(Err(e)) => {
                tracing::warn!(error = %e, "receive loop: decode error, disconnecting");
                mark_disconnected(&session).await;
                return;
            }
            None => {
                tracing::debug!("receive loop: relay closed the connection");
                mark_disconnected(&session).await;
                return;
            }
        };

        let response = {
            let callback = session.callback.lock().await;
            callback.as_ref().and_then(|cb| cb(&payload))
        };
        let response_bytes = response.map(bytes::Bytes::from).unwrap_or_default();

        let mut write_half = session.write_half.lock().await;
        let sent = write_half
            .send(OutgoingChunk::Response(response_bytes))
            .await;
        drop(write_half);

        if let Err(e) = sent {
            tracing::warn!(error = %e, "receive loop: failed to write response, disconnecting");
            mark_disconnected(&session).await;
            return;
        }
    }
}

async fn mark_disconnected(session: &Arc<Session>) {
    session.set_last_error(ReplyCode::NetError);
    session.disconnected.store(true, Ordering::Relaxed);
    tokio::time::sleep(Duration::from_secs(1)).await;
}

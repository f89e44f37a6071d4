//! The per-session heartbeat loop.
//!
//! Writes the fixed heartbeat frame on the negotiated period, and owns
//! reconnection: when the receive loop marks the session disconnected (or
//! a heartbeat write itself fails), this loop reruns the handshake with a
//! jittered backoff between attempts, replacing only the receive loop.
//! Holds a `Weak<Session>` so the session can be dropped (via `shutdown`)
//! without this loop keeping it alive.

use crate::reconnect::{Backoff, BackoffConfig};
use crate::session::Session;
use cometa_common::error::ReplyCode;
use cometa_protocol::OutgoingChunk;
use futures::SinkExt;
use std::sync::atomic::Ordering;
use std::sync::Weak;

pub(crate) async fn run(session: Weak<Session>) {
    let mut backoff = Backoff::new(BackoffConfig::default());

    loop {
        let Some(strong) = session.upgrade() else {
            return;
        };

        if strong.disconnected.load(Ordering::Relaxed) {
            match strong.reconnect().await {
                Ok(()) => backoff.reset(),
                Err(e) => {
                    let delay = backoff.next_delay();
                    tracing::warn!(error = %e, attempt = backoff.attempts(), delay = ?delay, "reconnect failed, backing off");
                    drop(strong);
                    tokio::time::sleep(delay).await;
                    continue;
                }
            }
        }

        let period = strong.heartbeat_period();
        drop(strong);
        tokio::time::sleep(period).await;

        let Some(strong) = session.upgrade() else {
            return;
        };

        let mut write_half = strong.write_half.lock().await;
        let sent = write_half.send(OutgoingChunk::Heartbeat).await;
        drop(write_half);

        if let Err(e) = sent {
            tracing::warn!(error = %e, "heartbeat write failed, marking disconnected");
            strong.set_last_error(ReplyCode::NetError);
            strong.disconnected.store(true, Ordering::Relaxed);
        }

        drop(strong);
    }
}
